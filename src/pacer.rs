/*
 *  pacer.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Main loop pacing
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

use std::time::{Duration, Instant};

/// Fixed rate tick source for the cooperative main loop
///
/// A late tick does not try to catch up; the next deadline is scheduled
/// from the moment the late tick ran.
pub struct Pacer {
    next_deadline: Instant,
    frame: Duration,
}

impl Pacer {
    pub fn new(target_fps: u32) -> Self {
        Self { next_deadline: Instant::now(), frame: Self::frame_for(target_fps) }
    }

    fn frame_for(fps: u32) -> Duration {
        Duration::from_micros(1_000_000 / fps.max(1) as u64)
    }

    #[inline]
    pub fn set_fps(&mut self, fps: u32) {
        self.frame = Self::frame_for(fps);
    }

    pub fn frame(&self) -> Duration {
        self.frame
    }

    /// True once the deadline passed; schedules the next one
    #[inline]
    pub fn should_tick(&mut self) -> bool {
        let now = Instant::now();
        if now >= self.next_deadline {
            self.next_deadline = now + self.frame;
            true
        } else {
            false
        }
    }

    /// Sleep until the next deadline is due, then take it
    pub fn wait(&mut self) {
        let now = Instant::now();
        if self.next_deadline > now {
            std::thread::sleep(self.next_deadline - now);
        }
        self.should_tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_is_immediate() {
        let mut pacer = Pacer::new(10);
        assert!(pacer.should_tick());
        assert!(!pacer.should_tick());
        assert_eq!(pacer.frame(), Duration::from_millis(100));
    }

    #[test]
    fn test_wait_blocks_one_frame() {
        let mut pacer = Pacer::new(50);
        pacer.wait();
        let start = Instant::now();
        pacer.wait();
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_zero_fps_clamped() {
        let mut pacer = Pacer::new(1);
        pacer.set_fps(0);
        assert_eq!(pacer.frame(), Duration::from_secs(1));
    }
}
