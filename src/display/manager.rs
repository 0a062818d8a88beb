/*
 *  display/manager.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display manager - slot scheduler, fades and the system message
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::sync::Arc;
use std::time::{Duration, Instant};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use log::{debug, info, warn};

use crate::display::error::DisplayError;
use crate::display::fade::Fade;
use crate::display::slot::{Slot, SlotInfo, SlotState};
use crate::display::traits::LedMatrix;
use crate::gfx::{CanvasGfx, FrameBuffer, Gfx};
use crate::plugin::plugins::SysMsgPlugin;
use crate::plugin::{tag, Plugin};
use crate::widget::{ProgressBar, Widget, WidgetArena, WidgetId};

/// Upper bound of display slots
pub const MAX_SLOTS: usize = 16;

/// How long `show_sys_msg` keeps a message on screen
pub const DEFAULT_SYS_MSG_DURATION: Duration = Duration::from_secs(4);

/// Scheduler tuning
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub slots: usize,
    /// Default time a slot stays on screen
    pub slot_duration: Duration,
    /// Number of frames a fade takes, 0 disables fading
    pub fade_steps: u32,
    pub fps: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { slots: 6, slot_duration: Duration::from_secs(30), fade_steps: 8, fps: 25 }
    }
}

struct SysMsg {
    plugin: Arc<SysMsgPlugin>,
    until: Option<Instant>,
}

/// Display manager
///
/// Owns the matrix and the slots. Exactly one non-empty slot is on screen;
/// every other installed plugin still gets `process()` each tick. All of
/// this runs on the main loop, plugins guard their own state.
pub struct DisplayMgr {
    matrix: Box<dyn LedMatrix>,
    frame: FrameBuffer,
    slots: Vec<Slot>,
    active: Option<usize>,
    slot_started: Instant,
    default_duration: Duration,
    fade_steps: u32,
    fade: Option<Fade>,
    sys_msg: SysMsg,
    /// Widgets owned by the scheduler itself
    system: WidgetArena,
    progress: Option<WidgetId>,
    frame_interval: Duration,
}

/// Render a slot into `target`: plugin content first, system widgets on top
fn render_slot(slot: &Slot, system: &mut WidgetArena, target: &mut FrameBuffer) {
    target.clear_color(Rgb888::BLACK);
    if let Some(plugin) = slot.plugin.as_ref() {
        let mut view = CanvasGfx::new(target, slot.canvas.bounds());
        plugin.update(&mut view);
    }
    slot.canvas.update(system, target);
}

impl DisplayMgr {
    pub fn new(matrix: Box<dyn LedMatrix>, config: &SchedulerConfig) -> Self {
        let (width, height) = matrix.dimensions();
        let count = config.slots.clamp(1, MAX_SLOTS);
        if count != config.slots {
            warn!("slot count {} out of range, using {}", config.slots, count);
        }
        let fps = config.fps.max(1);
        Self {
            matrix,
            frame: FrameBuffer::new(width, height),
            slots: (0..count).map(|_| Slot::new(width, height)).collect(),
            active: None,
            slot_started: Instant::now(),
            default_duration: config.slot_duration,
            fade_steps: config.fade_steps,
            fade: None,
            sys_msg: SysMsg { plugin: SysMsgPlugin::create(), until: None },
            system: WidgetArena::new(),
            progress: None,
            frame_interval: Duration::from_millis(1000 / fps as u64),
        }
    }

    /// Initialize the matrix and switch every LED off
    pub fn init(&mut self) -> Result<(), DisplayError> {
        self.matrix.init()?;
        if self.matrix.capabilities().supports_brightness {
            self.matrix.set_brightness(u8::MAX)?;
        }
        self.matrix.clear()?;
        let (w, h) = self.matrix.dimensions();
        info!("display {}x{} ready, {} slots", w, h, self.slots.len());
        Ok(())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.frame.width(), self.frame.height())
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Index of the slot on screen
    pub fn active_slot(&self) -> Option<usize> {
        self.active
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Last composed frame
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    pub fn is_slot_empty(&self, slot: usize) -> bool {
        self.slots.get(slot).map(Slot::is_empty).unwrap_or(false)
    }

    pub fn find_empty_slot(&self) -> Option<usize> {
        self.slots.iter().position(Slot::is_empty)
    }

    /// Slot hosting the plugin with `uid`
    pub fn slot_of(&self, uid: u16) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.plugin.as_ref().is_some_and(|p| p.uid() == uid))
    }

    pub fn plugin_in(&self, slot: usize) -> Option<Arc<dyn Plugin>> {
        self.slots.get(slot).and_then(|s| s.plugin.clone())
    }

    /// Put a started plugin into a slot, the first free one if none given
    ///
    /// The plugin goes on screen right away if nothing else is.
    pub fn install_plugin(&mut self, plugin: Arc<dyn Plugin>, slot: Option<usize>) -> Result<usize, DisplayError> {
        let idx = match slot {
            Some(idx) if idx >= self.slots.len() => return Err(DisplayError::InvalidSlot(idx)),
            Some(idx) if !self.slots[idx].is_empty() => return Err(DisplayError::SlotOccupied(idx)),
            Some(idx) => idx,
            None => self.find_empty_slot().ok_or(DisplayError::NoFreeSlot)?,
        };
        info!("{} installed in slot {}", tag(plugin.as_ref()), idx);
        let entry = &mut self.slots[idx];
        entry.plugin = Some(plugin);
        entry.state = SlotState::Inactive;
        if self.active.is_none() {
            self.switch_to(idx, false);
        }
        Ok(idx)
    }

    /// Take a plugin out of its slot; the next slot goes on screen if it was visible
    pub fn uninstall_plugin(&mut self, uid: u16) -> Option<Arc<dyn Plugin>> {
        let idx = self.slot_of(uid)?;
        let slot = &mut self.slots[idx];
        let plugin = slot.plugin.take()?;
        let was_active = slot.state == SlotState::Active;
        slot.state = SlotState::Empty;
        slot.duration = None;
        if was_active {
            plugin.inactive();
            self.active = None;
            self.fade = None;
            if let Some(next) = self.next_slot(idx) {
                self.switch_to(next, false);
            }
        }
        info!("{} removed from slot {}", tag(plugin.as_ref()), idx);
        Some(plugin)
    }

    /// Put a specific slot on screen
    pub fn activate_slot(&mut self, slot: usize) -> Result<(), DisplayError> {
        match self.slots.get(slot) {
            None => Err(DisplayError::InvalidSlot(slot)),
            Some(s) if s.is_empty() => Err(DisplayError::SlotEmpty(slot)),
            Some(_) => {
                let fade = self.fade_steps > 0;
                self.switch_to(slot, fade);
                Ok(())
            }
        }
    }

    /// Rotate to the next installed plugin now; false if there is none
    pub fn activate_next_slot(&mut self) -> bool {
        let Some(current) = self.active else {
            return false;
        };
        match self.next_slot(current) {
            Some(next) if next != current => {
                let fade = self.fade_steps > 0;
                self.switch_to(next, fade);
                true
            }
            _ => false,
        }
    }

    /// Per slot on-screen time, None restores the default
    pub fn set_slot_duration(&mut self, slot: usize, duration: Option<Duration>) -> Result<(), DisplayError> {
        let entry = self.slots.get_mut(slot).ok_or(DisplayError::InvalidSlot(slot))?;
        entry.duration = duration;
        Ok(())
    }

    pub fn slot_states(&self) -> Vec<SlotInfo> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| SlotInfo {
                index,
                state: slot.state,
                type_name: slot.plugin.as_ref().map(|p| p.type_name().to_string()),
                uid: slot.plugin.as_ref().map(|p| p.uid()),
                alias: slot.plugin.as_ref().map(|p| p.alias()).unwrap_or_default(),
                duration_secs: slot.duration.map(|d| d.as_secs()),
            })
            .collect()
    }

    /// Text scroll pause of the system message
    pub fn set_scroll_pause(&mut self, pause: Duration) {
        self.sys_msg.plugin.set_scroll_pause(pause);
    }

    /// Full screen message for the default duration
    pub fn show_sys_msg(&mut self, msg: &str) {
        self.show_sys_msg_for(msg, DEFAULT_SYS_MSG_DURATION);
    }

    pub fn show_sys_msg_for(&mut self, msg: &str, duration: Duration) {
        info!("system message: {}", msg);
        self.sys_msg.plugin.show(msg);
        self.sys_msg.plugin.active(&mut self.frame);
        self.sys_msg.until = Some(Instant::now() + duration);
    }

    pub fn clear_sys_msg(&mut self) {
        if self.sys_msg.until.take().is_some() {
            self.sys_msg.plugin.inactive();
        }
    }

    pub fn is_sys_msg_visible(&self) -> bool {
        self.sys_msg.until.is_some()
    }

    /// Text of the last system message
    pub fn sys_msg(&self) -> String {
        self.sys_msg.plugin.message()
    }

    /// Cooperative wait, the display keeps running
    ///
    /// Ticks the scheduler and sleeps one frame interval at a time, so other
    /// threads get the CPU while the caller waits.
    pub fn delay(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        loop {
            self.process();
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep((deadline - now).min(self.frame_interval));
        }
    }

    /// Show a progress bar on the bottom rows of slot 0
    pub fn begin_progress(&mut self) {
        if self.progress.is_some() {
            return;
        }
        let mut bar = ProgressBar::new();
        let height = self.frame.height() as i32;
        bar.move_to(0, height - 2);
        let id = self.system.insert(bar);
        self.slots[0].canvas.add_widget(id);
        self.progress = Some(id);
        debug!("progress bar shown");
    }

    pub fn update_progress(&mut self, percent: u8) {
        if let Some(bar) = self.progress.and_then(|id| self.system.get_as_mut::<ProgressBar>(id)) {
            bar.set_progress(percent);
        }
    }

    pub fn progress(&self) -> Option<u8> {
        self.progress.and_then(|id| self.system.get_as::<ProgressBar>(id)).map(ProgressBar::progress)
    }

    pub fn end_progress(&mut self) {
        if let Some(id) = self.progress.take() {
            self.slots[0].canvas.remove_widget(id);
            self.system.remove(id);
            debug!("progress bar removed");
        }
    }

    /// One scheduler tick: housekeeping, rotation, composition and output
    pub fn process(&mut self) {
        for plugin in self.slots.iter().filter_map(|s| s.plugin.as_ref()) {
            plugin.process();
        }

        if self.sys_msg.until.is_some_and(|until| Instant::now() >= until) {
            self.clear_sys_msg();
        }

        if self.sys_msg.until.is_some() {
            self.frame.clear_color(Rgb888::BLACK);
            self.sys_msg.plugin.update(&mut self.frame);
            if self.progress.is_some() {
                self.slots[0].canvas.update(&mut self.system, &mut self.frame);
            }
        } else {
            self.check_rotation();
            self.compose();
        }

        if let Err(e) = self.matrix.show(&self.frame) {
            warn!("frame not shown: {}", e);
        }
    }

    fn compose(&mut self) {
        if let Some(fade) = self.fade.as_mut() {
            if fade.next_frame(&mut self.frame) {
                return;
            }
            self.fade = None;
        }
        match self.active {
            Some(idx) => render_slot(&self.slots[idx], &mut self.system, &mut self.frame),
            None => {
                self.frame.clear_color(Rgb888::BLACK);
                if self.progress.is_some() {
                    self.slots[0].canvas.update(&mut self.system, &mut self.frame);
                }
            }
        }
    }

    fn check_rotation(&mut self) {
        let Some(current) = self.active else {
            return;
        };
        if self.fade.is_some() {
            return;
        }
        let duration = self.slots[current].duration.unwrap_or(self.default_duration);
        if self.slot_started.elapsed() < duration {
            return;
        }
        match self.next_slot(current) {
            Some(next) if next != current => {
                let fade = self.fade_steps > 0;
                self.switch_to(next, fade);
            }
            _ => self.slot_started = Instant::now(),
        }
    }

    /// Next non-empty slot after `from`, wrapping; may return `from` itself
    fn next_slot(&self, from: usize) -> Option<usize> {
        let count = self.slots.len();
        (1..=count).map(|step| (from + step) % count).find(|&idx| !self.slots[idx].is_empty())
    }

    fn switch_to(&mut self, next: usize, fade: bool) {
        if let Some(current) = self.active {
            if current == next {
                self.slot_started = Instant::now();
                return;
            }
            let outgoing = &mut self.slots[current];
            outgoing.state = SlotState::Inactive;
            if let Some(plugin) = outgoing.plugin.as_ref() {
                plugin.inactive();
            }
        }

        // last frame shown is the start of the fade
        let from = fade.then(|| self.frame.clone());

        let incoming = &mut self.slots[next];
        incoming.state = SlotState::Active;
        if let Some(plugin) = incoming.plugin.as_ref() {
            let mut view = CanvasGfx::new(&mut self.frame, incoming.canvas.bounds());
            plugin.active(&mut view);
            debug!("{} active in slot {}", tag(plugin.as_ref()), next);
        }
        self.active = Some(next);
        self.slot_started = Instant::now();

        self.fade = None;
        if let Some(from) = from {
            let (w, h) = self.dimensions();
            let mut to = FrameBuffer::new(w, h);
            render_slot(&self.slots[next], &mut self.system, &mut to);
            self.fade = Some(Fade::new(from, to, self.fade_steps));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::MockMatrix;
    use crate::plugin::PluginCore;
    use parking_lot::Mutex;

    /// Fills its slot with one color and records lifecycle calls
    struct Solid {
        core: PluginCore,
        color: Rgb888,
        calls: Mutex<Vec<&'static str>>,
    }

    impl Solid {
        fn new(uid: u16, color: Rgb888) -> Arc<Self> {
            Arc::new(Self { core: PluginCore::new("Solid", uid), color, calls: Mutex::new(Vec::new()) })
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().clone()
        }
    }

    impl Plugin for Solid {
        fn core(&self) -> &PluginCore {
            &self.core
        }

        fn active(&self, _gfx: &mut dyn Gfx) {
            self.calls.lock().push("active");
        }

        fn inactive(&self) {
            self.calls.lock().push("inactive");
        }

        fn process(&self) {
            self.calls.lock().push("process");
        }

        fn update(&self, gfx: &mut dyn Gfx) {
            gfx.fill_screen(self.color);
        }
    }

    fn manager(fade_steps: u32) -> DisplayMgr {
        let config = SchedulerConfig { slots: 3, slot_duration: Duration::from_secs(3600), fade_steps, fps: 100 };
        DisplayMgr::new(Box::new(MockMatrix::new(4, 2)), &config)
    }

    #[test]
    fn test_first_install_goes_on_screen() {
        let mut mgr = manager(0);
        let a = Solid::new(1, Rgb888::RED);
        assert_eq!(mgr.install_plugin(a.clone(), None).ok(), Some(0));
        assert_eq!(mgr.active_slot(), Some(0));
        assert_eq!(a.calls(), vec!["active"]);
        mgr.process();
        assert_eq!(mgr.frame().get_pixel(3, 1), Some(Rgb888::RED));
    }

    #[test]
    fn test_install_slot_checks() {
        let mut mgr = manager(0);
        assert!(mgr.install_plugin(Solid::new(1, Rgb888::RED), Some(1)).is_ok());
        assert!(matches!(
            mgr.install_plugin(Solid::new(2, Rgb888::RED), Some(1)),
            Err(DisplayError::SlotOccupied(1))
        ));
        assert!(matches!(
            mgr.install_plugin(Solid::new(3, Rgb888::RED), Some(7)),
            Err(DisplayError::InvalidSlot(7))
        ));
        assert_eq!(mgr.install_plugin(Solid::new(4, Rgb888::RED), None).ok(), Some(0));
        assert_eq!(mgr.install_plugin(Solid::new(5, Rgb888::RED), None).ok(), Some(2));
        assert!(matches!(mgr.install_plugin(Solid::new(6, Rgb888::RED), None), Err(DisplayError::NoFreeSlot)));
    }

    #[test]
    fn test_exactly_one_active_and_all_processed() {
        let mut mgr = manager(0);
        let a = Solid::new(1, Rgb888::RED);
        let b = Solid::new(2, Rgb888::BLUE);
        mgr.install_plugin(a.clone(), None).ok();
        mgr.install_plugin(b.clone(), None).ok();
        mgr.process();
        let active = mgr.slot_states().iter().filter(|s| s.state == SlotState::Active).count();
        assert_eq!(active, 1);
        assert!(b.calls().contains(&"process"));
        assert!(!b.calls().contains(&"active"));
        assert_eq!(mgr.frame().get_pixel(0, 0), Some(Rgb888::RED));
    }

    #[test]
    fn test_next_slot_calls_inactive_then_active() {
        let mut mgr = manager(0);
        let a = Solid::new(1, Rgb888::RED);
        let b = Solid::new(2, Rgb888::BLUE);
        mgr.install_plugin(a.clone(), None).ok();
        mgr.install_plugin(b.clone(), Some(2)).ok();
        assert!(mgr.activate_next_slot());
        assert_eq!(mgr.active_slot(), Some(2));
        assert_eq!(a.calls().last(), Some(&"inactive"));
        assert_eq!(b.calls().last(), Some(&"active"));
        // wraps around
        assert!(mgr.activate_next_slot());
        assert_eq!(mgr.active_slot(), Some(0));
    }

    #[test]
    fn test_single_plugin_does_not_rotate() {
        let mut mgr = manager(0);
        mgr.install_plugin(Solid::new(1, Rgb888::RED), None).ok();
        assert!(!mgr.activate_next_slot());
        assert_eq!(mgr.active_slot(), Some(0));
    }

    #[test]
    fn test_rotation_timer_with_fade() {
        let mut mgr = manager(2);
        mgr.install_plugin(Solid::new(1, Rgb888::new(0, 0, 0)), None).ok();
        mgr.install_plugin(Solid::new(2, Rgb888::new(200, 0, 0)), None).ok();
        assert!(mgr.set_slot_duration(0, Some(Duration::ZERO)).is_ok());
        mgr.process();
        assert_eq!(mgr.active_slot(), Some(1));
        // first fade step half way
        assert_eq!(mgr.frame().get_pixel(0, 0), Some(Rgb888::new(100, 0, 0)));
        mgr.process();
        assert_eq!(mgr.frame().get_pixel(0, 0), Some(Rgb888::new(200, 0, 0)));
        mgr.process();
        assert!(!mgr.is_fading());
    }

    #[test]
    fn test_uninstall_active_moves_on() {
        let mut mgr = manager(4);
        let a = Solid::new(1, Rgb888::RED);
        mgr.install_plugin(a.clone(), None).ok();
        mgr.install_plugin(Solid::new(2, Rgb888::GREEN), None).ok();
        assert!(mgr.uninstall_plugin(1).is_some());
        assert_eq!(a.calls().last(), Some(&"inactive"));
        assert_eq!(mgr.active_slot(), Some(1));
        assert!(!mgr.is_fading());
        assert!(mgr.uninstall_plugin(1).is_none());
        assert!(mgr.uninstall_plugin(2).is_some());
        assert_eq!(mgr.active_slot(), None);
        assert!(mgr.is_slot_empty(0));
    }

    #[test]
    fn test_sys_msg_overrides_and_expires() {
        let mut mgr = manager(0);
        mgr.install_plugin(Solid::new(1, Rgb888::BLUE), None).ok();
        mgr.show_sys_msg_for("Hi", Duration::from_millis(20));
        mgr.process();
        assert!(mgr.is_sys_msg_visible());
        assert_ne!(mgr.frame().get_pixel(3, 1), Some(Rgb888::BLUE));
        mgr.delay(Duration::from_millis(40));
        assert!(!mgr.is_sys_msg_visible());
        assert_eq!(mgr.frame().get_pixel(3, 1), Some(Rgb888::BLUE));
    }

    #[test]
    fn test_progress_bar_lifecycle() {
        let mut mgr = manager(0);
        mgr.begin_progress();
        mgr.update_progress(50);
        assert_eq!(mgr.progress(), Some(50));
        mgr.process();
        // left half of the bottom row filled
        assert_eq!(mgr.frame().get_pixel(0, 1), Some(Rgb888::GREEN));
        assert_ne!(mgr.frame().get_pixel(3, 1), Some(Rgb888::GREEN));
        mgr.end_progress();
        assert_eq!(mgr.progress(), None);
    }
}
