//! Viewport scrolling.

use serde::Serialize;
use stagecraft_project::model::{Bounds, CameraMode, CameraSettings};

/// Fraction of the remaining distance the camera covers each tick when
/// following the player.
pub const FOLLOW_LERP: f64 = 0.1;

/// The visible window onto the level. `scroll_x`/`scroll_y` are the world
/// coordinates of the viewport's top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Camera {
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(skip)]
    mode: CameraMode,
    #[serde(skip)]
    bounds: Option<Bounds>,
}

impl Camera {
    pub fn new(settings: &CameraSettings, width: f64, height: f64) -> Self {
        Self {
            scroll_x: 0.0,
            scroll_y: 0.0,
            width,
            height,
            mode: settings.mode,
            bounds: settings.bounds,
        }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    /// Ease the viewport towards being centred on `(x, y)`. Only moves in
    /// follow-player mode.
    pub fn follow(&mut self, x: f64, y: f64) {
        if self.mode != CameraMode::FollowPlayer {
            return;
        }
        let target_x = x - self.width / 2.0;
        let target_y = y - self.height / 2.0;
        self.scroll_x += (target_x - self.scroll_x) * FOLLOW_LERP;
        self.scroll_y += (target_y - self.scroll_y) * FOLLOW_LERP;
        self.clamp_to_bounds();
    }

    fn clamp_to_bounds(&mut self) {
        let Some(b) = self.bounds else { return };
        let max_x = (b.x + b.width - self.width).max(b.x);
        let max_y = (b.y + b.height - self.height).max(b.y);
        self.scroll_x = self.scroll_x.clamp(b.x, max_x);
        self.scroll_y = self.scroll_y.clamp(b.y, max_y);
    }
}
