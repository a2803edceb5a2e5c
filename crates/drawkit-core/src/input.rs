//! Pointer and keyboard events delivered to the canvas engine.
//!
//! Every event carries the time it happened so throttling and debouncing
//! depend only on the event stream.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
pub use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
pub use std::time::Instant;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// No modifier held.
    pub const NONE: Modifiers = Modifiers { shift: false, ctrl: false, alt: false, meta: false };
    /// Shift only.
    pub const SHIFT: Modifiers = Modifiers { shift: true, ctrl: false, alt: false, meta: false };
    /// Ctrl only.
    pub const CTRL: Modifiers = Modifiers { shift: false, ctrl: true, alt: false, meta: false };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A pointer sample in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: Point,
    pub button: MouseButton,
    /// Whether the primary button is held.
    pub pressed: bool,
    pub modifiers: Modifiers,
    pub time: Instant,
}

impl PointerEvent {
    /// Unpressed, unmodified left-button event.
    pub fn new(position: Point, time: Instant) -> Self {
        Self { position, button: MouseButton::Left, pressed: false, modifiers: Modifiers::NONE, time }
    }

    /// Set whether the button is held.
    pub fn pressed(mut self, pressed: bool) -> Self {
        self.pressed = pressed;
        self
    }

    /// Replace the held modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Button the event refers to.
    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }
}

/// Keys the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Escape,
    Enter,
    Delete,
    Backspace,
    Char(char),
}

impl Key {
    /// Parse a DOM-style key name ("Escape", "Enter", "a", ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Escape" | "Esc" => Some(Key::Escape),
            "Enter" | "Return" => Some(Key::Enter),
            "Delete" | "Del" => Some(Key::Delete),
            "Backspace" => Some(Key::Backspace),
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Key::Char(c)),
                    _ => None,
                }
            }
        }
    }

    /// True for `Char(c)` matching `c` case-insensitively.
    pub fn is_char(&self, c: char) -> bool {
        matches!(self, Key::Char(k) if k.eq_ignore_ascii_case(&c))
    }
}

/// A key press.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyInput {
    pub key: Key,
    pub modifiers: Modifiers,
    pub time: Instant,
}

impl KeyInput {
    /// Key press without modifiers.
    pub fn new(key: Key, time: Instant) -> Self {
        Self { key, modifiers: Modifiers::NONE, time }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Ctrl/Cmd + `c`.
    pub fn is_shortcut(&self, c: char) -> bool {
        self.modifiers.command() && self.key.is_char(c)
    }
}

/// Drops events arriving less than `interval` after the last accepted one.
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    /// Throttle letting one event through per `interval`.
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// Returns true and records `now` when enough time has elapsed.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Let the next event through regardless of timing.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
