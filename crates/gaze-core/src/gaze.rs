use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MIN_CONFIDENCE;
use crate::latch::ProblemLatch;
use crate::vector::{Ray, Vec3};

/// Contract of the eye-tracking hardware/SDK.
pub trait GazeTracker {
    /// True when the headset supports eye tracking and the user allowed it.
    fn tracking_enabled(&self) -> bool;

    /// SDK confidence in the current reading, 0..1.
    fn confidence(&self) -> f64;

    /// World-space eye pose as (origin, forward).
    fn pose(&self) -> (Vec3, Vec3);
}

/// One frame of gaze input. Produced fresh every tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GazeSample {
    pub origin: Vec3,
    pub direction: Vec3,
    pub valid: bool,
    pub confidence: f64,
}

impl GazeSample {
    pub fn invalid(confidence: f64) -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::ZERO,
            valid: false,
            confidence,
        }
    }

    /// The gaze ray, if the sample is usable.
    pub fn ray(&self) -> Option<Ray> {
        if !self.valid {
            return None;
        }
        Ray::new(self.origin, self.direction)
    }
}

/// Why a sample could not be produced. Only persistent conditions are
/// latched and logged; low confidence is a normal transient.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceProblem {
    NoTracker,
    TrackingDisabled,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeConfig {
    /// Samples below this confidence are treated as blinks / off-FOV.
    pub min_confidence: f64,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

/// Confidence-filtered gaze ray provider.
pub struct GazeSource {
    tracker: Option<Box<dyn GazeTracker>>,
    min_confidence: f64,
    latch: ProblemLatch<SourceProblem>,
}

impl GazeSource {
    pub fn new(tracker: Option<Box<dyn GazeTracker>>, config: GazeConfig) -> Self {
        Self {
            tracker,
            min_confidence: config.min_confidence.clamp(0.0, 1.0),
            latch: ProblemLatch::new(),
        }
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    /// Read the tracker. Never fails: missing hardware yields an invalid sample.
    pub fn sample(&mut self) -> GazeSample {
        let Some(tracker) = self.tracker.as_ref() else {
            if self.latch.raise(SourceProblem::NoTracker) {
                tracing::warn!("gaze source has no tracker bound; gaze input is inert");
            }
            return GazeSample::invalid(0.0);
        };

        if !tracker.tracking_enabled() {
            if self.latch.raise(SourceProblem::TrackingDisabled) {
                tracing::warn!(
                    "eye tracking is disabled (check headset permission and eye tracking setting)"
                );
            }
            return GazeSample::invalid(0.0);
        }

        let confidence = tracker.confidence();
        // NaN fails this comparison too
        if !(confidence >= self.min_confidence) {
            return GazeSample::invalid(confidence.clamp(0.0, 1.0));
        }

        if self.latch.clear() {
            tracing::info!("eye tracking signal recovered");
        }

        let (origin, direction) = tracker.pose();
        GazeSample {
            origin,
            direction,
            valid: true,
            confidence: confidence.min(1.0),
        }
    }
}

/// Raw tracker state for one frame, as recorded in traces.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackerReading {
    #[serde(default = "default_tracking")]
    pub tracking: bool,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    pub origin: Vec3,
    pub direction: Vec3,
}

fn default_tracking() -> bool {
    true
}

fn default_confidence() -> f64 {
    1.0
}

impl Default for TrackerReading {
    fn default() -> Self {
        Self {
            tracking: false,
            confidence: 0.0,
            origin: Vec3::ZERO,
            direction: Vec3::FORWARD,
        }
    }
}

/// Tracker fed from outside the pipeline, one reading per tick.
///
/// The pipeline owns the boxed tracker; the caller keeps a [`TrackerFeed`]
/// to push the next reading before each tick.
pub struct ScriptedTracker {
    reading: Rc<Cell<TrackerReading>>,
}

/// Writer half of a [`ScriptedTracker`].
#[derive(Clone)]
pub struct TrackerFeed {
    reading: Rc<Cell<TrackerReading>>,
}

impl ScriptedTracker {
    /// Create a tracker and the feed that drives it.
    pub fn channel() -> (Self, TrackerFeed) {
        let reading = Rc::new(Cell::new(TrackerReading::default()));
        (
            Self {
                reading: Rc::clone(&reading),
            },
            TrackerFeed { reading },
        )
    }
}

impl TrackerFeed {
    pub fn push(&self, reading: TrackerReading) {
        self.reading.set(reading);
    }

    pub fn current(&self) -> TrackerReading {
        self.reading.get()
    }
}

impl GazeTracker for ScriptedTracker {
    fn tracking_enabled(&self) -> bool {
        self.reading.get().tracking
    }

    fn confidence(&self) -> f64 {
        self.reading.get().confidence
    }

    fn pose(&self) -> (Vec3, Vec3) {
        let r = self.reading.get();
        (r.origin, r.direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(tracking: bool, confidence: f64) -> TrackerReading {
        TrackerReading {
            tracking,
            confidence,
            origin: Vec3::ZERO,
            direction: Vec3::FORWARD,
        }
    }

    fn scripted() -> (GazeSource, TrackerFeed) {
        let (tracker, feed) = ScriptedTracker::channel();
        (
            GazeSource::new(Some(Box::new(tracker)), GazeConfig::default()),
            feed,
        )
    }

    #[test]
    fn test_missing_tracker_is_invalid() {
        let mut source = GazeSource::new(None, GazeConfig::default());
        for _ in 0..3 {
            let s = source.sample();
            assert!(!s.valid);
            assert!(s.ray().is_none());
        }
        assert_eq!(source.latch.current(), Some(SourceProblem::NoTracker));
    }

    #[test]
    fn test_tracking_disabled_is_invalid() {
        let (mut source, feed) = scripted();
        feed.push(reading(false, 1.0));
        assert!(!source.sample().valid);
        assert_eq!(source.latch.current(), Some(SourceProblem::TrackingDisabled));
    }

    #[test]
    fn test_low_confidence_is_invalid_but_not_latched() {
        let (mut source, feed) = scripted();
        feed.push(reading(true, 0.59));
        let s = source.sample();
        assert!(!s.valid);
        assert!((s.confidence - 0.59).abs() < 1e-12);
        assert_eq!(source.latch.current(), None);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let (mut source, feed) = scripted();
        feed.push(reading(true, 0.6));
        assert!(source.sample().valid);
    }

    #[test]
    fn test_nan_confidence_is_invalid() {
        let (mut source, feed) = scripted();
        feed.push(reading(true, f64::NAN));
        assert!(!source.sample().valid);
    }

    #[test]
    fn test_good_sample_clears_latch() {
        let (mut source, feed) = scripted();
        feed.push(reading(false, 1.0));
        source.sample();
        feed.push(reading(true, 0.9));
        let s = source.sample();
        assert!(s.valid);
        assert!(s.ray().is_some());
        assert_eq!(source.latch.current(), None);
    }

    #[test]
    fn test_zero_direction_gives_no_ray() {
        let (mut source, feed) = scripted();
        feed.push(TrackerReading {
            direction: Vec3::ZERO,
            ..reading(true, 1.0)
        });
        let s = source.sample();
        assert!(s.valid);
        assert!(s.ray().is_none());
    }

    #[test]
    fn test_reading_serde_defaults() {
        let json = r#"{"origin":{"x":0,"y":0,"z":0},"direction":{"x":0,"y":0,"z":1}}"#;
        let r: TrackerReading = serde_json::from_str(json).unwrap();
        assert!(r.tracking);
        assert_eq!(r.confidence, 1.0);
    }
}
