//! Per-tick driver: sample -> resolve -> debounce -> dwell -> commit.

use serde::{Deserialize, Serialize};

use crate::debounce::{GazePointer, SelectionDebouncer, Transition};
use crate::dwell::DwellConfig;
use crate::gaze::{GazeConfig, GazeSample, GazeSource, GazeTracker};
use crate::grid::{GridEvent, TileGrid};
use crate::highlight::HighlightConfig;
use crate::resolver::{HitResolver, Resolution, ResolverConfig};
use crate::scene::SceneConfig;
use crate::tile::{ContentItem, TileId};

/// Receives committed selections (e.g. to launch playback).
pub trait SelectionHandler {
    fn on_selected(&mut self, item: &ContentItem);
}

impl<F: FnMut(&ContentItem)> SelectionHandler for F {
    fn on_selected(&mut self, item: &ContentItem) {
        self(item)
    }
}

/// All tunables of the pipeline, grouped the way the settings file is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub gaze: GazeConfig,
    pub resolver: ResolverConfig,
    pub dwell: DwellConfig,
    pub highlight: HighlightConfig,
    pub scene: SceneConfig,
}

/// Everything that happened during one tick.
#[derive(Clone, Debug, Serialize)]
pub struct TickReport {
    pub sample: GazeSample,
    pub resolution: Resolution,
    pub transition: Transition,
    pub events: Vec<GridEvent>,
}

impl TickReport {
    pub fn commits(&self) -> impl Iterator<Item = &ContentItem> {
        self.events.iter().filter_map(|e| match e {
            GridEvent::Committed { item, .. } => Some(item),
            GridEvent::FillStarted { .. } => None,
        })
    }
}

pub struct GazePipeline {
    source: GazeSource,
    resolver: HitResolver,
    debouncer: SelectionDebouncer,
    grid: TileGrid,
    scene: Option<SceneConfig>,
    on_select: Option<Box<dyn SelectionHandler>>,
    enabled: bool,
}

impl GazePipeline {
    pub fn new(source: GazeSource, resolver: HitResolver, grid: TileGrid) -> Self {
        Self {
            source,
            resolver,
            debouncer: SelectionDebouncer::new(),
            grid,
            scene: None,
            on_select: None,
            enabled: true,
        }
    }

    /// Standard gallery wiring: canvas, tile colliders and viewer projector
    /// all derived from `config.scene` and rebuilt with the grid.
    pub fn from_config(
        tracker: Option<Box<dyn GazeTracker>>,
        config: &PipelineConfig,
        items: &[ContentItem],
    ) -> Self {
        let source = GazeSource::new(tracker, config.gaze);
        let resolver =
            HitResolver::new(config.resolver).with_projector(Box::new(config.scene.viewer));
        let grid = TileGrid::build(items, config.dwell, config.highlight);
        let mut pipeline = Self::new(source, resolver, grid);
        pipeline.install_scene(config.scene);
        pipeline
    }

    pub fn with_selection_handler(mut self, handler: impl SelectionHandler + 'static) -> Self {
        self.on_select = Some(Box::new(handler));
        self
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn current_tile(&self) -> Option<TileId> {
        self.debouncer.current()
    }

    /// Build canvas and colliders for the current grid and hand them to the
    /// resolver. Remembered so grid rebuilds refresh the scene too.
    pub fn install_scene(&mut self, scene: SceneConfig) {
        let built = scene.build(&self.grid);
        self.resolver.set_surface(Some(Box::new(built.canvas)));
        self.resolver.set_collision_world(Some(Box::new(built.colliders)));
        self.scene = Some(scene);
    }

    /// Replace all tiles with new ones built from `items`.
    pub fn rebuild_grid(&mut self, items: &[ContentItem]) {
        let pointer = self.idle_pointer();
        self.debouncer.clear(&pointer, &mut self.grid);
        self.grid.rebuild(items);
        if let Some(scene) = self.scene {
            self.install_scene(scene);
        }
    }

    /// Hide or show the gallery. Hiding releases the selection and leaves no
    /// dwell or indicator running; ticks are ignored until re-enabled.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        if !enabled {
            let pointer = self.idle_pointer();
            self.debouncer.clear(&pointer, &mut self.grid);
            self.grid.disable_all();
        }
        self.enabled = enabled;
    }

    fn idle_pointer(&self) -> GazePointer {
        GazePointer {
            cursor: self.resolver.screen_center(),
            point: None,
        }
    }

    /// Run one frame with unscaled `dt` seconds since the previous one.
    pub fn tick(&mut self, dt: f64) -> TickReport {
        if !self.enabled {
            return TickReport {
                sample: GazeSample::invalid(0.0),
                resolution: Resolution::miss(self.resolver.screen_center()),
                transition: Transition::default(),
                events: Vec::new(),
            };
        }

        let sample = self.source.sample();
        let resolution = match sample.ray() {
            Some(ray) => {
                let max_distance = self.resolver.config().max_distance;
                self.resolver.resolve(&ray, max_distance)
            }
            None => Resolution::miss(self.resolver.screen_center()),
        };

        if self.resolver.config().log_hits {
            let name = resolution
                .tile
                .and_then(|id| self.grid.get(id))
                .map(|t| t.content().display_name().to_string());
            tracing::debug!("gaze hit: {}", name.as_deref().unwrap_or("(none)"));
        }

        let transition = self
            .debouncer
            .update(resolution.tile, &resolution.pointer, &mut self.grid);
        let events = self.grid.tick(dt, transition.enter);

        for event in &events {
            if let GridEvent::Committed { item, .. } = event {
                self.dispatch(item);
            }
        }

        debug_assert!(self.grid.active_dwell_count() <= 1);

        TickReport {
            sample,
            resolution,
            transition,
            events,
        }
    }

    fn dispatch(&mut self, item: &ContentItem) {
        if !item.has_media() {
            tracing::warn!("selected item '{}' has no media id; ignoring", item.title);
            return;
        }
        tracing::info!("selected {} (media id {})", item.title, item.media_id);
        if let Some(handler) = self.on_select.as_mut() {
            handler.on_selected(item);
        }
    }
}
