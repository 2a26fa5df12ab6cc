//! Heads-up display text, end-of-game overlays and the damage flash.

use serde::Serialize;
use stagecraft_project::model::GameSettings;

/// How long the damage flash lasts, in seconds.
pub const FLASH_DURATION: f64 = 0.2;

/// Damage flash colour.
pub const FLASH_COLOR: (u8, u8, u8) = (255, 0, 0);

/// Remaining flash time below this counts as expired. Repeated subtraction of
/// the tick step leaves rounding residue.
const FLASH_EPSILON: f64 = 1e-9;

/// Render a number the way the editor displays it: integral values without
/// a fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Message shown over a paused game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Overlay {
    GameOver,
    Won,
}

impl Overlay {
    pub fn text(self) -> &'static str {
        match self {
            Overlay::GameOver => "GAME OVER\n\nPress SPACE to Restart",
            Overlay::Won => "YOU WIN!\n\nPress SPACE to Restart",
        }
    }
}

/// Full-screen colour flash that fades out over [`FLASH_DURATION`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Flash {
    remaining: f64,
}

impl Flash {
    pub fn trigger(&mut self) {
        self.remaining = FLASH_DURATION;
    }

    pub fn decay(&mut self, dt: f64) {
        self.remaining -= dt;
        if self.remaining <= FLASH_EPSILON {
            self.remaining = 0.0;
        }
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    pub fn color(&self) -> (u8, u8, u8) {
        FLASH_COLOR
    }

    /// Current opacity in `[0, 1]`.
    pub fn intensity(&self) -> f64 {
        self.remaining / FLASH_DURATION
    }
}

/// Score and lives text plus overlay state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Hud {
    score_label: Option<String>,
    lives_enabled: bool,
    pub score_text: Option<String>,
    pub lives_text: Option<String>,
    pub overlay: Option<Overlay>,
    pub flash: Flash,
}

impl Hud {
    pub fn new(settings: &GameSettings) -> Self {
        Self {
            score_label: settings
                .scoring
                .enabled
                .then(|| settings.scoring.label.clone()),
            lives_enabled: settings.lives.enabled,
            ..Default::default()
        }
    }

    /// Refresh the score and lives strings. Disabled elements stay `None`.
    pub fn update(&mut self, score: f64, lives: f64) {
        self.score_text = self
            .score_label
            .as_ref()
            .map(|label| format!("{label}: {}", format_number(score)));
        self.lives_text = self
            .lives_enabled
            .then(|| format!("Lives: {}", format_number(lives)));
    }

    pub fn overlay_text(&self) -> Option<&'static str> {
        self.overlay.map(Overlay::text)
    }
}
