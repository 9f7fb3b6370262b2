use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_HIGHLIGHT_LERP_SPEED, DEFAULT_HIGHLIGHT_SCALE};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Scale multiplier while hovered.
    pub scale_up: f64,
    /// Easing rate toward the target scale, per second.
    pub lerp_speed: f64,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            scale_up: DEFAULT_HIGHLIGHT_SCALE,
            lerp_speed: DEFAULT_HIGHLIGHT_LERP_SPEED,
        }
    }
}

/// Hover feedback: an eased scale bump plus an outline flag.
#[derive(Clone, Copy, Debug)]
pub struct Highlight {
    config: HighlightConfig,
    hovered: bool,
    scale: f64,
}

impl Highlight {
    pub fn new(config: HighlightConfig) -> Self {
        Self {
            config,
            hovered: false,
            scale: 1.0,
        }
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    pub fn hovered(&self) -> bool {
        self.hovered
    }

    /// Outline and tint are shown exactly while hovered.
    pub fn outline_visible(&self) -> bool {
        self.hovered
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Snap back to rest without easing.
    pub fn reset(&mut self) {
        self.hovered = false;
        self.scale = 1.0;
    }

    /// Ease toward the target scale using unscaled `dt`.
    pub fn tick(&mut self, dt: f64) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let target = if self.hovered {
            self.config.scale_up
        } else {
            1.0
        };
        let t = (dt * self.config.lerp_speed).clamp(0.0, 1.0);
        self.scale += (target - self.scale) * t;
    }
}
