use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Keys the core knows how to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Space,
    C,
    Escape,
}

impl Key {
    pub const ALL: [Key; 7] = [
        Key::Left,
        Key::Right,
        Key::Up,
        Key::Down,
        Key::Space,
        Key::C,
        Key::Escape,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Key::Left => "left",
            Key::Right => "right",
            Key::Up => "up",
            Key::Down => "down",
            Key::Space => "space",
            Key::C => "c",
            Key::Escape => "escape",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown key name '{0}'")]
pub struct UnknownKey(pub String);

impl FromStr for Key {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Key::ALL
            .into_iter()
            .find(|k| k.name() == lower)
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

/// Input collaborator as seen by the scene: level and edge queries only.
pub trait InputSource {
    /// Whether `key` is currently held down.
    fn is_held(&self, key: Key) -> bool;
    /// Whether `key` went down during the current frame.
    fn was_pressed(&self, key: Key) -> bool;
}

/// Frame-based keyboard state fed by a platform event loop or a script.
///
/// Call [`KeyboardState::begin_frame`] once per frame before feeding events;
/// it clears the per-frame press edges while keeping held keys.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    held: HashSet<Key>,
    pressed: HashSet<Key>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_frame(&mut self) {
        self.pressed.clear();
    }

    /// Record a key-down event. Auto-repeat of an already held key is not an edge.
    pub fn press(&mut self, key: Key) {
        if self.held.insert(key) {
            self.pressed.insert(key);
            tracing::trace!(key = key.name(), "key down");
        }
    }

    pub fn release(&mut self, key: Key) {
        if self.held.remove(&key) {
            tracing::trace!(key = key.name(), "key up");
        }
    }

    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn held_keys(&self) -> &HashSet<Key> {
        &self.held
    }
}

impl InputSource for KeyboardState {
    fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    fn was_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }
}
