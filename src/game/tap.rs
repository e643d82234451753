//! Tap capture: any non-ignored key press becomes a timestamped tap.

use crate::input::{InputInterface, MAX_KEYBOARD_KEYS};
use std::collections::VecDeque;

/// Queue of tap timestamps (seconds of level time). Filled during the
/// frame's input-poll phase and drained synchronously in the same frame's
/// discrete update; nothing survives across frames unless left undrained
/// on purpose (the rearm taps in Fail/Win).
pub struct TapQueue {
    taps: VecDeque<f64>,
    ignore_key: [bool; MAX_KEYBOARD_KEYS],
    time_seconds: f64,
    active: bool,
}

impl Default for TapQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TapQueue {
    pub fn new() -> Self {
        Self {
            taps: VecDeque::new(),
            ignore_key: [false; MAX_KEYBOARD_KEYS],
            time_seconds: 0.0,
            active: true,
        }
    }

    /// Excludes a keycode from tap detection (system keys, function rows).
    pub fn ignore_key(&mut self, keycode: u8) {
        self.ignore_key[keycode as usize] = true;
    }

    /// Advances the queue's clock. Tap timestamps are taken from this.
    pub fn tick(&mut self, delta_seconds: f64) {
        self.time_seconds += delta_seconds;
    }

    /// Scans the input device for fresh key-down edges and records a tap
    /// for each.
    pub fn poll(&mut self, input: &dyn InputInterface) {
        if !self.active {
            return;
        }
        for keycode in 0..MAX_KEYBOARD_KEYS {
            if self.ignore_key[keycode] {
                continue;
            }
            if input.was_key_just_pressed(keycode as u8) {
                self.push_tap();
            }
        }
    }

    /// Records a synthetic tap (autoplay uses this).
    pub fn push_tap(&mut self) {
        if !self.active {
            return;
        }
        self.taps.push_back(self.time_seconds);
    }

    /// Pops the oldest pending tap, if any.
    pub fn pop_if_tap(&mut self) -> Option<f64> {
        self.taps.pop_front()
    }

    pub fn pop_all(&mut self) {
        self.taps.clear();
    }

    pub fn pending(&self) -> usize {
        self.taps.len()
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        if !active {
            self.taps.clear();
        }
    }

    pub fn toggle_active(&mut self) {
        let active = self.active;
        self.set_active(!active);
    }
}
