use serde::{Deserialize, Serialize};

use crate::constants::EPSILON;
use crate::vector::{Vec2, Vec3};

/// Maps world points to 2D view coordinates for UI event payloads.
pub trait ViewProjector {
    /// `None` when the point cannot be projected (behind the viewer).
    fn world_to_screen(&self, point: Vec3) -> Option<Vec2>;

    fn screen_center(&self) -> Vec2;
}

/// Simple pinhole camera looking along `forward`, +y up, origin at the
/// bottom-left of a `width` x `height` pixel view.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinholeProjector {
    pub eye: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    /// Focal length in pixels.
    pub focal_px: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for PinholeProjector {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 1.5, 0.0),
            forward: Vec3::FORWARD,
            up: Vec3::UP,
            focal_px: 1000.0,
            width: 1920.0,
            height: 1080.0,
        }
    }
}

impl ViewProjector for PinholeProjector {
    fn world_to_screen(&self, point: Vec3) -> Option<Vec2> {
        let forward = self.forward.try_normalize()?;
        // right = up x forward keeps +x to the viewer's right for a +z forward
        let right = self.up.cross(forward).try_normalize()?;
        let up = forward.cross(right);

        let rel = point - self.eye;
        let depth = rel.dot(forward);
        if depth < EPSILON {
            return None;
        }
        let center = self.screen_center();
        Some(Vec2::new(
            center.x + rel.dot(right) / depth * self.focal_px,
            center.y + rel.dot(up) / depth * self.focal_px,
        ))
    }

    fn screen_center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }
}
