//! Builds the hit-testable scene (UI canvas + tile colliders) for a grid.

use serde::{Deserialize, Serialize};

use crate::constants::TILE_COLLIDER_THICKNESS;
use crate::grid::TileGrid;
use crate::layout::GridLayout;
use crate::physics::{BoxCollider, ColliderSet};
use crate::projector::PinholeProjector;
use crate::surface::{Canvas, Element, SurfaceFrame};
use crate::vector::{Rect, Vec3};

/// Height of the title strip at the bottom of each tile, as a share of the cell.
const TITLE_STRIP: f64 = 0.2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub surface: SurfaceFrame,
    pub layout: GridLayout,
    /// Collision layer the tile colliders live on.
    pub tile_layer: u8,
    pub viewer: PinholeProjector,
}

/// Canvas and colliders for one grid build.
pub struct Scene {
    pub canvas: Canvas,
    pub colliders: ColliderSet,
    pub cells: Vec<Rect>,
}

impl SceneConfig {
    /// Lay out `grid` on the canvas. Each tile gets a root element carrying
    /// its identity, thumbnail and title children, a passive progress ring,
    /// and a thin trigger collider matching its rect.
    pub fn build(&self, grid: &TileGrid) -> Scene {
        let mut canvas = Canvas::new(self.surface);
        let mut colliders = ColliderSet::new();
        let cells = self.layout.cells(grid.len());

        canvas.add(Element::new("panel", self.layout.bounds(grid.len())).z(-1));

        for (tile, rect) in grid.tiles().iter().zip(&cells) {
            let name = tile.content().display_name();
            let root = canvas.add(Element::new(name, *rect).tile(tile.id()));
            canvas.add(Element::new(&format!("{name}/thumbnail"), *rect).z(1).parent(root));
            let title = Rect::from_origin_size(
                rect.min.x,
                rect.min.y,
                rect.width(),
                rect.height() * TITLE_STRIP,
            );
            canvas.add(Element::new(&format!("{name}/title"), title).z(3).parent(root));
            canvas.add(
                Element::new(&format!("{name}/progress"), *rect)
                    .z(2)
                    .parent(root)
                    .passive(),
            );

            if let Some(collider) = self.tile_collider(rect) {
                colliders.add(collider.on_layer(self.tile_layer).trigger().owned_by(tile.id()));
            }
        }

        Scene {
            canvas,
            colliders,
            cells,
        }
    }

    /// World-space box matching `rect` on the surface.
    fn tile_collider(&self, rect: &Rect) -> Option<BoxCollider> {
        let (right, up, forward) = self.surface.axes()?;
        let center = self.surface.to_world(rect.center())?;
        let size = Vec3::new(
            rect.width() * self.surface.scale,
            rect.height() * self.surface.scale,
            TILE_COLLIDER_THICKNESS,
        );
        Some(BoxCollider {
            center,
            axes: [right, up, forward],
            half_extents: [size.x * 0.5, size.y * 0.5, size.z * 0.5],
            ..BoxCollider::axis_aligned(center, size)
        })
    }
}
