use serde::{Deserialize, Serialize};

use crate::vector::Rect;

/// Row-major grid of equally sized cells, centered on the surface origin.
/// All sizes are in surface-local units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    pub columns: usize,
    pub cell_width: f64,
    pub cell_height: f64,
    pub spacing: f64,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: 3,
            cell_width: 400.0,
            cell_height: 225.0,
            spacing: 40.0,
        }
    }
}

impl GridLayout {
    fn columns(&self) -> usize {
        self.columns.max(1)
    }

    pub fn rows(&self, count: usize) -> usize {
        count.div_ceil(self.columns())
    }

    /// Bounding rect of the whole grid for `count` cells.
    pub fn bounds(&self, count: usize) -> Rect {
        let cols = self.columns().min(count.max(1));
        let rows = self.rows(count).max(1);
        let width = cols as f64 * self.cell_width + (cols - 1) as f64 * self.spacing;
        let height = rows as f64 * self.cell_height + (rows - 1) as f64 * self.spacing;
        Rect::from_origin_size(-width * 0.5, -height * 0.5, width, height)
    }

    /// Cell rects for `count` items; first row at the top, left to right.
    pub fn cells(&self, count: usize) -> Vec<Rect> {
        let bounds = self.bounds(count);
        let cols = self.columns();
        (0..count)
            .map(|i| {
                let col = (i % cols) as f64;
                let row = (i / cols) as f64;
                let x = bounds.min.x + col * (self.cell_width + self.spacing);
                let top = bounds.max.y - row * (self.cell_height + self.spacing);
                Rect::from_origin_size(x, top - self.cell_height, self.cell_width, self.cell_height)
            })
            .collect()
    }
}
