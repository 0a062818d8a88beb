/*
 *  plugin/plugins/date_time.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Date and time plugin - alternates between local time and date
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

use std::fmt::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use chrono::{DateTime, Local};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::fs::FileSystem;
use crate::gfx::{Canvas, Gfx};
use crate::plugin::{config_store, Plugin, PluginCore, PluginLock};
use crate::widget::{TextWidget, Widget, WidgetArena, WidgetId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct DateTimeConfig {
    time_format: String,
    date_format: String,
    time_secs: u64,
    date_secs: u64,
}

impl Default for DateTimeConfig {
    fn default() -> Self {
        Self {
            time_format: "%H:%M".to_string(),
            date_format: "%d.%m.".to_string(),
            time_secs: 10,
            date_secs: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Time,
    Date,
}

struct DateTimeState {
    arena: WidgetArena,
    text_id: WidgetId,
    canvas: Option<Canvas>,
    config: DateTimeConfig,
    phase: Phase,
    phase_start: Option<Instant>,
}

pub struct DateTimePlugin {
    core: PluginCore,
    state: PluginLock<DateTimeState>,
}

impl DateTimePlugin {
    pub const TYPE_NAME: &'static str = "DateTimePlugin";

    pub fn new(uid: u16) -> Self {
        let mut arena = WidgetArena::new();
        let text_id = arena.insert(TextWidget::new(""));
        Self {
            core: PluginCore::new(Self::TYPE_NAME, uid),
            state: PluginLock::new(DateTimeState {
                arena,
                text_id,
                canvas: None,
                config: DateTimeConfig::default(),
                phase: Phase::Time,
                phase_start: None,
            }),
        }
    }

    pub fn create(uid: u16) -> Arc<dyn Plugin> {
        Arc::new(Self::new(uid))
    }

    /// Current text, for inspection
    pub fn shown(&self) -> String {
        self.state.with(|s| s.arena.get_as::<TextWidget>(s.text_id).map(|w| w.str().to_string()).unwrap_or_default())
    }

    fn refresh(&self, now: DateTime<Local>, tick: Instant) {
        self.state.with(|s| {
            let start = *s.phase_start.get_or_insert(tick);
            let hold = match s.phase {
                Phase::Time => s.config.time_secs,
                Phase::Date => s.config.date_secs,
            };
            if tick.duration_since(start) >= Duration::from_secs(hold) {
                s.phase = match s.phase {
                    Phase::Time if s.config.date_secs > 0 => Phase::Date,
                    _ => Phase::Time,
                };
                s.phase_start = Some(tick);
            }
            let format = match s.phase {
                Phase::Time => &s.config.time_format,
                Phase::Date => &s.config.date_format,
            };
            let mut text = String::new();
            if write!(text, "{}", now.format(format)).is_err() {
                text = "--:--".to_string();
            }
            if let Some(w) = s.arena.get_as_mut::<TextWidget>(s.text_id) {
                w.set_str(text);
            }
        });
    }
}

impl Plugin for DateTimePlugin {
    fn core(&self) -> &PluginCore {
        &self.core
    }

    fn start(&self, fs: &Arc<dyn FileSystem>) {
        match config_store::load_or_create::<DateTimeConfig>(fs.as_ref(), self.uid()) {
            Ok(cfg) => self.state.with(|s| s.config = cfg),
            Err(e) => warn!("[{}/{}] configuration unavailable: {}", Self::TYPE_NAME, self.uid(), e),
        }
    }

    fn active(&self, gfx: &mut dyn Gfx) {
        let (w, h) = (gfx.width(), gfx.height());
        self.state.with(|s| {
            if s.canvas.is_none() {
                let mut canvas = Canvas::new(w, h, 0, 0);
                canvas.add_widget(s.text_id);
                if let Some(text) = s.arena.get_mut(s.text_id) {
                    text.move_to(2, 1);
                }
                s.canvas = Some(canvas);
            }
            // always start with the time
            s.phase = Phase::Time;
            s.phase_start = None;
        });
        self.refresh(Local::now(), Instant::now());
    }

    fn process(&self) {
        self.refresh(Local::now(), Instant::now());
    }

    fn set_scroll_pause(&self, pause: Duration) {
        self.state.with(|s| {
            if let Some(w) = s.arena.get_as_mut::<TextWidget>(s.text_id) {
                w.set_scroll_pause(pause);
            }
        });
    }

    fn update(&self, gfx: &mut dyn Gfx) {
        self.state.with(|s| {
            gfx.fill_screen(Rgb888::BLACK);
            if let Some(canvas) = s.canvas.as_ref() {
                canvas.update(&mut s.arena, gfx);
            }
        });
    }
}
