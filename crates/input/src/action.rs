use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::keyboard::{InputSource, Key};

/// A gameplay action the scene consumes. The scene never asks about raw keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    MoveLeft,
    MoveRight,
    Jump,
    /// Invert the map and gravity.
    Invert,
    ToggleDebugCamera,
}

/// Action → key table.
///
/// BTreeMap keeps the serialized form stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyBindings(BTreeMap<Action, Key>);

impl Default for KeyBindings {
    fn default() -> Self {
        Self(BTreeMap::from([
            (Action::MoveLeft, Key::Left),
            (Action::MoveRight, Key::Right),
            (Action::Jump, Key::Up),
            (Action::Invert, Key::Down),
            (Action::ToggleDebugCamera, Key::C),
        ]))
    }
}

impl KeyBindings {
    pub fn key_for(&self, action: Action) -> Option<Key> {
        self.0.get(&action).copied()
    }

    pub fn bind(&mut self, action: Action, key: Key) {
        self.0.insert(action, key);
    }

    /// Whether the bound key is held. Unbound actions are never active.
    pub fn is_active(&self, input: &impl InputSource, action: Action) -> bool {
        self.key_for(action).is_some_and(|k| input.is_held(k))
    }

    /// Whether the bound key went down this frame.
    pub fn triggered(&self, input: &impl InputSource, action: Action) -> bool {
        self.key_for(action).is_some_and(|k| input.was_pressed(k))
    }
}
