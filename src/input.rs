/// Narrow seam to the external input device. The core polls key-down edges
/// once per frame during the tap-capture phase; held-state tracking and the
/// actual device live on the other side.
pub trait InputInterface {
    /// True if the key transitioned to pressed since the last poll.
    fn was_key_just_pressed(&self, keycode: u8) -> bool;
}

pub const MAX_KEYBOARD_KEYS: usize = 256;

/// Scripted input for tests: a set of keycodes that read as freshly
/// pressed until cleared.
#[derive(Default)]
pub struct ScriptedInput {
    pressed: std::cell::RefCell<Vec<u8>>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, keycode: u8) {
        self.pressed.borrow_mut().push(keycode);
    }

    pub fn clear(&self) {
        self.pressed.borrow_mut().clear();
    }
}

impl InputInterface for ScriptedInput {
    fn was_key_just_pressed(&self, keycode: u8) -> bool {
        self.pressed.borrow().contains(&keycode)
    }
}
