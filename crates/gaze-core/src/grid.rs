use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::debounce::{GazeReceiver, GazeTarget};
use crate::dwell::{DwellConfig, DwellEvent};
use crate::highlight::HighlightConfig;
use crate::tile::{ContentItem, Tile, TileId};

/// Dwell milestones surfaced by a grid tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GridEvent {
    FillStarted { tile: TileId },
    Committed { tile: TileId, item: ContentItem },
}

/// The set of live tiles, in content order.
pub struct TileGrid {
    tiles: Vec<Tile>,
    index: HashMap<TileId, usize>,
    dwell: DwellConfig,
    highlight: HighlightConfig,
}

impl TileGrid {
    pub fn new(dwell: DwellConfig, highlight: HighlightConfig) -> Self {
        Self {
            tiles: Vec::new(),
            index: HashMap::new(),
            dwell,
            highlight,
        }
    }

    /// Build a grid and populate it from `items`.
    pub fn build(items: &[ContentItem], dwell: DwellConfig, highlight: HighlightConfig) -> Self {
        let mut grid = Self::new(dwell, highlight);
        grid.rebuild(items);
        grid
    }

    /// Tear down every existing tile, then create one tile per usable item.
    /// Items without a media id are skipped.
    pub fn rebuild(&mut self, items: &[ContentItem]) {
        self.teardown();

        for item in items {
            if !item.has_media() {
                tracing::warn!("skipping catalog item '{}' with empty media id", item.title);
                continue;
            }
            let tile = Tile::new(item.clone(), self.dwell, self.highlight);
            self.index.insert(tile.id(), self.tiles.len());
            self.tiles.push(tile);
        }
        tracing::debug!("grid built with {} tiles", self.tiles.len());
    }

    /// Disable and drop all tiles.
    pub fn teardown(&mut self) {
        for tile in &mut self.tiles {
            tile.disable();
        }
        self.tiles.clear();
        self.index.clear();
    }

    /// Disable all tiles but keep them (view hidden).
    pub fn disable_all(&mut self) {
        for tile in &mut self.tiles {
            tile.disable();
        }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.index.get(&id).map(|&i| &self.tiles[i])
    }

    pub fn get_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.index.get(&id).map(|&i| &mut self.tiles[i])
    }

    /// Tiles currently in PreHold or Filling. Never more than one when the
    /// grid is driven through a debouncer.
    pub fn active_dwell_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.engine().is_dwelling()).count()
    }

    /// Advance every tile by `dt`. `skip` names a tile entered this tick,
    /// whose dwell starts counting from the next tick.
    pub fn tick(&mut self, dt: f64, skip: Option<TileId>) -> Vec<GridEvent> {
        let mut events = Vec::new();
        for tile in &mut self.tiles {
            if Some(tile.id()) == skip {
                continue;
            }
            match tile.tick(dt) {
                Some(DwellEvent::FillStarted) => {
                    events.push(GridEvent::FillStarted { tile: tile.id() })
                }
                Some(DwellEvent::Committed) => events.push(GridEvent::Committed {
                    tile: tile.id(),
                    item: tile.content().clone(),
                }),
                None => {}
            }
        }
        events
    }
}

impl GazeReceiver for TileGrid {
    fn target_mut(&mut self, id: TileId) -> Option<&mut dyn GazeTarget> {
        self.get_mut(id).map(|t| t as &mut dyn GazeTarget)
    }
}
