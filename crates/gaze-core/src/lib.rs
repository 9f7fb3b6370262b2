//! Gaze-driven dwell selection for a spatial video gallery.
//!
//! Each tick an eye-tracking sample becomes a world-space ray, the ray is
//! resolved to at most one gallery tile (UI surface first, tile colliders as
//! fallback), a debouncer turns the per-tick answer into enter/exit
//! transitions, and the focused tile runs a two-phase dwell timer that
//! commits a selection once gaze has rested on it long enough.
//!
//! Zero I/O: trackers, surfaces, collision worlds and projectors are traits,
//! and time only advances through `tick(dt)`.

pub mod constants;
pub mod debounce;
pub mod dwell;
pub mod gaze;
pub mod grid;
pub mod highlight;
pub mod latch;
pub mod layout;
pub mod physics;
pub mod pipeline;
pub mod projector;
pub mod resolver;
pub mod scene;
pub mod surface;
pub mod tile;
pub mod vector;

pub use constants::{
    DEFAULT_FILL_SECS, DEFAULT_MAX_DISTANCE, DEFAULT_MIN_CONFIDENCE, DEFAULT_PRE_HOLD_SECS,
    EPSILON, MIN_FILL_SECS,
};
pub use debounce::{GazePointer, GazeReceiver, GazeTarget, SelectionDebouncer, Transition};
pub use dwell::{DwellConfig, DwellEngine, DwellEvent, DwellPhase, FillIndicator, RearmPolicy};
pub use gaze::{
    GazeConfig, GazeSample, GazeSource, GazeTracker, ScriptedTracker, TrackerFeed, TrackerReading,
};
pub use grid::{GridEvent, TileGrid};
pub use highlight::{Highlight, HighlightConfig};
pub use latch::ProblemLatch;
pub use layout::GridLayout;
pub use physics::{
    BoxCollider, ColliderId, ColliderSet, CollisionHit, CollisionWorld, LayerMask,
    TriggerInteraction,
};
pub use pipeline::{GazePipeline, PipelineConfig, SelectionHandler, TickReport};
pub use projector::{PinholeProjector, ViewProjector};
pub use resolver::{HitResolver, HitTier, PlaneMissPolicy, Resolution, ResolverConfig};
pub use scene::{Scene, SceneConfig};
pub use surface::{Canvas, Element, ElementId, SurfaceFrame, UiSurface};
pub use tile::{ContentItem, Tile, TileId};
pub use vector::{Plane, Ray, Rect, Vec2, Vec3};
