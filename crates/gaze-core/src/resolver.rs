//! Two-tier gaze hit resolution.
//!
//! The planar tier intersects the gaze ray with the UI surface plane and
//! hit-tests the 2D element tree. The volumetric tier casts against 3D
//! colliders and only runs when the planar tier produced no tile. A planar
//! tile always wins; the volumetric result is never used as a cross-check.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_DISTANCE;
use crate::debounce::GazePointer;
use crate::latch::ProblemLatch;
use crate::physics::{CollisionWorld, LayerMask, TriggerInteraction};
use crate::projector::ViewProjector;
use crate::surface::{SurfaceFrame, UiSurface};
use crate::tile::TileId;
use crate::vector::{Plane, Ray, Vec2, Vec3};

/// What a plane hit that lands on no tile means for the volumetric tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaneMissPolicy {
    /// Plane hit without a tile is a full miss; no physics cast this tick.
    #[default]
    Absorb,
    /// Continue to the physics cast as if the plane had been missed.
    FallThrough,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub max_distance: f64,
    pub layer_mask: LayerMask,
    pub plane_miss: PlaneMissPolicy,
    /// Log the resolved tile every tick at debug level.
    pub log_hits: bool,
    /// View size used for the cursor when no projector is configured.
    pub screen_size: [f64; 2],
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
            layer_mask: LayerMask::ALL,
            plane_miss: PlaneMissPolicy::default(),
            log_hits: false,
            screen_size: [1920.0, 1080.0],
        }
    }
}

/// Which tier produced a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitTier {
    Surface,
    Volume,
}

/// Outcome of one resolve call.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub tile: Option<TileId>,
    /// Tier that answered; `None` when nothing was hit at all.
    pub tier: Option<HitTier>,
    pub pointer: GazePointer,
}

impl Resolution {
    pub fn miss(cursor: Vec2) -> Self {
        Self {
            tile: None,
            tier: None,
            pointer: GazePointer {
                cursor,
                point: None,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ResolverProblem {
    NoTargets,
    NoSurface,
    NoCollisionWorld,
}

pub struct HitResolver {
    surface: Option<Box<dyn UiSurface>>,
    plane: Option<Plane>,
    world: Option<Box<dyn CollisionWorld>>,
    projector: Option<Box<dyn ViewProjector>>,
    config: ResolverConfig,
    latch: ProblemLatch<ResolverProblem>,
}

impl HitResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            surface: None,
            plane: None,
            world: None,
            projector: None,
            config,
            latch: ProblemLatch::new(),
        }
    }

    pub fn with_surface(mut self, surface: Box<dyn UiSurface>) -> Self {
        self.set_surface(Some(surface));
        self
    }

    pub fn with_collision_world(mut self, world: Box<dyn CollisionWorld>) -> Self {
        self.world = Some(world);
        self
    }

    pub fn with_projector(mut self, projector: Box<dyn ViewProjector>) -> Self {
        self.projector = Some(projector);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn set_surface(&mut self, surface: Option<Box<dyn UiSurface>>) {
        self.surface = surface;
        self.rebuild_plane();
    }

    pub fn set_collision_world(&mut self, world: Option<Box<dyn CollisionWorld>>) {
        self.world = world;
    }

    /// Recompute the cached surface plane after the surface moved.
    pub fn rebuild_plane(&mut self) {
        self.plane = self.surface.as_ref().and_then(|s| s.frame().plane());
        if self.surface.is_some() && self.plane.is_none() {
            tracing::warn!("UI surface has a degenerate frame; planar gaze hits disabled");
        }
    }

    /// Move the surface and refresh the cached plane in one step.
    pub fn move_surface(&mut self, frame: SurfaceFrame) {
        if let Some(surface) = self.surface.as_mut() {
            surface.set_frame(frame);
        }
        self.rebuild_plane();
    }

    /// Screen-space center used as the cursor when nothing is hit.
    pub fn screen_center(&self) -> Vec2 {
        match self.projector.as_ref() {
            Some(p) => p.screen_center(),
            None => Vec2::new(self.config.screen_size[0] * 0.5, self.config.screen_size[1] * 0.5),
        }
    }

    fn project(&self, point: Vec3) -> Option<Vec2> {
        self.projector.as_ref()?.world_to_screen(point)
    }

    fn check_dependencies(&mut self) {
        let problem = match (self.surface.is_some(), self.world.is_some()) {
            (true, true) => None,
            (false, false) => Some(ResolverProblem::NoTargets),
            (false, true) => Some(ResolverProblem::NoSurface),
            (true, false) => Some(ResolverProblem::NoCollisionWorld),
        };
        match problem {
            Some(p) if self.latch.raise(p) => match p {
                ResolverProblem::NoTargets => {
                    tracing::warn!(
                        "no UI surface or collision world configured; gaze hits are inert"
                    )
                }
                ResolverProblem::NoSurface => {
                    tracing::info!("no UI surface configured; using collider hits only")
                }
                ResolverProblem::NoCollisionWorld => {
                    tracing::info!("no collision world configured; volumetric fallback disabled")
                }
            },
            Some(_) => {}
            None => {
                self.latch.clear();
            }
        }
    }

    /// Resolve `ray` to the tile under it, if any, within `max_distance`.
    pub fn resolve(&mut self, ray: &Ray, max_distance: f64) -> Resolution {
        self.check_dependencies();

        let mut cursor = self.screen_center();

        if let Some(hit) = self.resolve_planar(ray, max_distance) {
            match hit {
                PlanarHit::Tile(resolution) => return resolution,
                PlanarHit::Empty(resolution) => {
                    if self.config.plane_miss == PlaneMissPolicy::Absorb {
                        return resolution;
                    }
                    cursor = resolution.pointer.cursor;
                }
            }
        }

        if let Some(resolution) = self.resolve_volumetric(ray, max_distance) {
            return resolution;
        }

        Resolution::miss(cursor)
    }

    fn resolve_planar(&self, ray: &Ray, max_distance: f64) -> Option<PlanarHit> {
        let surface = self.surface.as_ref()?;
        let plane = self.plane?;
        let t = plane.raycast(ray)?;
        if t < 0.0 || t > max_distance {
            return None;
        }

        let point = ray.at(t);
        let local = surface.frame().to_local(point)?;
        let tile = surface
            .hit_test(local)
            .first()
            .and_then(|&element| surface.owning_tile(element));

        let resolution = Resolution {
            tile,
            tier: Some(HitTier::Surface),
            pointer: GazePointer {
                cursor: self.project(point).unwrap_or(local),
                point: Some(point),
            },
        };
        Some(match tile {
            Some(_) => PlanarHit::Tile(resolution),
            None => PlanarHit::Empty(resolution),
        })
    }

    fn resolve_volumetric(&self, ray: &Ray, max_distance: f64) -> Option<Resolution> {
        let world = self.world.as_ref()?;
        let hit = world.raycast(
            ray,
            max_distance,
            self.config.layer_mask,
            TriggerInteraction::Collide,
        )?;
        Some(Resolution {
            tile: world.owning_tile(hit.collider),
            tier: Some(HitTier::Volume),
            pointer: GazePointer {
                cursor: self
                    .project(hit.point)
                    .unwrap_or_else(|| self.screen_center()),
                point: Some(hit.point),
            },
        })
    }
}

enum PlanarHit {
    Tile(Resolution),
    Empty(Resolution),
}
