//! Recorded gaze traces and blink injection for replay.

use std::path::Path;

use anyhow::{Context, Result, bail};
use gaze_core::{SceneConfig, TrackerReading, Vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

/// One recorded frame. Either `direction` or `tile` aims the gaze; `tile`
/// looks at the center of the n-th tile of the current layout.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TraceFrame {
    pub dt: f64,
    #[serde(default = "default_true")]
    pub tracking: bool,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub origin: Option<Vec3>,
    #[serde(default)]
    pub direction: Option<Vec3>,
    #[serde(default)]
    pub tile: Option<usize>,
    /// Play this frame this many times in a row.
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

fn default_true() -> bool {
    true
}

fn default_confidence() -> f64 {
    1.0
}

fn default_repeat() -> u32 {
    1
}

impl TraceFrame {
    /// Concrete tracker reading for a grid of `tiles` laid out by `scene`.
    pub fn reading(&self, scene: &SceneConfig, tiles: usize) -> Result<TrackerReading> {
        let origin = self.origin.unwrap_or(scene.viewer.eye);
        let direction = match (self.direction, self.tile) {
            (Some(direction), _) => direction,
            (None, Some(index)) => {
                let cells = scene.layout.cells(tiles);
                let Some(cell) = cells.get(index) else {
                    bail!("frame aims at tile {index} but the grid has {tiles} tiles");
                };
                let Some(target) = scene.surface.to_world(cell.center()) else {
                    bail!("surface frame is degenerate");
                };
                target - origin
            }
            (None, None) => bail!("frame needs either a direction or a tile"),
        };
        Ok(TrackerReading {
            tracking: self.tracking,
            confidence: self.confidence,
            origin,
            direction,
        })
    }
}

pub fn load_trace(path: &Path) -> Result<Vec<TraceFrame>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read trace {}", path.display()))?;
    let frames: Vec<TraceFrame> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse trace {}", path.display()))?;
    tracing::debug!("loaded {} trace frames from {}", frames.len(), path.display());
    Ok(frames)
}

/// Randomly zeroes tracker confidence to simulate blinks.
pub struct BlinkInjector {
    rng: SmallRng,
    rate: f64,
}

impl BlinkInjector {
    pub fn new(rate: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Self {
            rng,
            rate: if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 },
        }
    }

    pub fn apply(&mut self, mut reading: TrackerReading) -> TrackerReading {
        if self.rate > 0.0 && self.rng.random_bool(self.rate) {
            reading.confidence = 0.0;
        }
        reading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let json = r#"[
            {"dt": 0.5, "tile": 1},
            {"dt": 0.1, "direction": {"x": 0, "y": 1, "z": 0}, "repeat": 3}
        ]"#;
        let frames: Vec<TraceFrame> = serde_json::from_str(json).unwrap();
        assert!(frames[0].tracking);
        assert_eq!(frames[0].confidence, 1.0);
        assert_eq!(frames[0].repeat, 1);
        assert_eq!(frames[1].repeat, 3);
    }

    #[test]
    fn test_tile_aim_hits_cell_center() {
        let scene = SceneConfig::default();
        let frame = TraceFrame {
            dt: 0.1,
            tracking: true,
            confidence: 1.0,
            origin: None,
            direction: None,
            tile: Some(2),
            repeat: 1,
        };
        let reading = frame.reading(&scene, 3).unwrap();
        assert_eq!(reading.origin, scene.viewer.eye);
        let cell = scene.layout.cells(3)[2];
        let target = scene.surface.to_world(cell.center()).unwrap();
        assert_eq!(reading.origin + reading.direction, target);
    }

    #[test]
    fn test_bad_aim_is_error() {
        let scene = SceneConfig::default();
        let mut frame = TraceFrame {
            dt: 0.1,
            tracking: true,
            confidence: 1.0,
            origin: None,
            direction: None,
            tile: None,
            repeat: 1,
        };
        assert!(frame.reading(&scene, 3).is_err());
        frame.tile = Some(5);
        assert!(frame.reading(&scene, 3).is_err());
    }

    #[test]
    fn test_blink_rate_extremes() {
        let reading = TrackerReading {
            tracking: true,
            confidence: 0.9,
            origin: Vec3::ZERO,
            direction: Vec3::FORWARD,
        };
        let mut never = BlinkInjector::new(0.0, Some(7));
        let mut always = BlinkInjector::new(1.0, Some(7));
        for _ in 0..50 {
            assert_eq!(never.apply(reading).confidence, 0.9);
            assert_eq!(always.apply(reading).confidence, 0.0);
        }
    }

    #[test]
    fn test_blinks_are_seeded() {
        let reading = TrackerReading {
            tracking: true,
            confidence: 1.0,
            origin: Vec3::ZERO,
            direction: Vec3::FORWARD,
        };
        let run = |seed| {
            let mut b = BlinkInjector::new(0.3, Some(seed));
            (0..64).map(|_| b.apply(reading).confidence).collect::<Vec<_>>()
        };
        assert_eq!(run(11), run(11));
    }
}
