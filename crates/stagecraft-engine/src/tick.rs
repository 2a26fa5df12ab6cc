//! Fixed-timestep configuration and player input.
//!
//! Playback advances in fixed ticks of [`TickConfig::fixed_dt`] seconds. Input
//! arrives as DOM-style key codes (`"ArrowLeft"`, `"KeyA"`, `"Space"`) and is
//! mapped to game [`Action`]s through the project's control bindings.
//!
//! ```
//! use stagecraft_engine::tick::{Action, InputState, KeyBindings};
//! use stagecraft_project::template::default_settings;
//!
//! let bindings = KeyBindings::from_controls(&default_settings().controls);
//! let mut input = InputState::default();
//! input.key_down("KeyD");
//!
//! assert!(bindings.is_active(Action::MoveRight, &input));
//! assert!(!bindings.is_active(Action::Jump, &input));
//! ```

use std::collections::BTreeSet;

use stagecraft_project::model::ControlBindings;

/// Key that dismisses the game-over and win overlays.
pub const RESTART_KEY: &str = "Space";

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Configuration for the playback tick.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Fixed time step in seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
    /// Headless mode: no presentation, tick as fast as the host calls.
    pub headless: bool,
}

impl Default for TickConfig {
    /// Defaults to 60 Hz, headless off.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            headless: false,
        }
    }
}

impl TickConfig {
    /// 60 Hz headless configuration for tests and tools.
    pub fn headless() -> Self {
        Self {
            headless: true,
            ..Default::default()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.fixed_dt.is_finite() && self.fixed_dt > 0.0
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Keys currently held, plus keys pressed since the last tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    held: BTreeSet<String>,
    pressed: BTreeSet<String>,
}

impl InputState {
    pub fn key_down(&mut self, code: &str) {
        if self.held.insert(code.to_owned()) {
            self.pressed.insert(code.to_owned());
        }
    }

    pub fn key_up(&mut self, code: &str) {
        self.held.remove(code);
    }

    pub fn is_held(&self, code: &str) -> bool {
        self.held.contains(code)
    }

    /// Whether `code` went down since the last [`end_frame`](Self::end_frame).
    pub fn just_pressed(&self, code: &str) -> bool {
        self.pressed.contains(code)
    }

    /// Forget edge-triggered presses. Held keys stay held.
    pub fn end_frame(&mut self) {
        self.pressed.clear();
    }

    /// Release everything.
    pub fn clear(&mut self) {
        self.held.clear();
        self.pressed.clear();
    }
}

/// Game-level actions bound to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Jump,
    Interact,
}

/// Key codes bound to each [`Action`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyBindings {
    move_left: Vec<String>,
    move_right: Vec<String>,
    jump: Vec<String>,
    interact: Vec<String>,
}

impl KeyBindings {
    pub fn from_controls(controls: &ControlBindings) -> Self {
        Self {
            move_left: controls.move_left.clone(),
            move_right: controls.move_right.clone(),
            jump: controls.jump.clone(),
            interact: controls.interact.clone(),
        }
    }

    pub fn keys(&self, action: Action) -> &[String] {
        match action {
            Action::MoveLeft => &self.move_left,
            Action::MoveRight => &self.move_right,
            Action::Jump => &self.jump,
            Action::Interact => &self.interact,
        }
    }

    /// True when any key bound to `action` is held.
    pub fn is_active(&self, action: Action, input: &InputState) -> bool {
        self.keys(action).iter().any(|k| input.is_held(k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_is_edge_triggered() {
        let mut input = InputState::default();
        input.key_down("Space");
        assert!(input.just_pressed("Space"));
        input.end_frame();
        assert!(!input.just_pressed("Space"));
        assert!(input.is_held("Space"));

        input.key_down("Space");
        assert!(!input.just_pressed("Space"), "auto-repeat is not a new press");
        input.key_up("Space");
        input.key_down("Space");
        assert!(input.just_pressed("Space"));
    }

    #[test]
    fn default_config_is_sixty_hertz() {
        let config = TickConfig::default();
        assert!((config.fixed_dt - 1.0 / 60.0).abs() < f64::EPSILON);
        assert!(config.is_valid());
        assert!(!TickConfig { fixed_dt: 0.0, headless: true }.is_valid());
    }
}
