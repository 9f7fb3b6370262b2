//! Planar UI surfaces: world-space placement plus a 2D element tree.

use serde::{Deserialize, Serialize};

use crate::tile::TileId;
use crate::vector::{Plane, Rect, Vec2, Vec3};

/// World placement of a flat UI surface.
///
/// `forward` is the surface normal (pointing away from the viewer), `right`
/// the surface's local +x axis. Local +y is `forward x right`. Local units
/// are converted to world units by `scale`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceFrame {
    pub position: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub scale: f64,
}

impl Default for SurfaceFrame {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.5, 2.0),
            forward: Vec3::FORWARD,
            right: Vec3::RIGHT,
            scale: 0.001,
        }
    }
}

impl SurfaceFrame {
    pub fn plane(&self) -> Option<Plane> {
        Plane::new(self.forward, self.position)
    }

    /// Orthonormal (right, up, forward). `None` when the axes are degenerate.
    pub fn axes(&self) -> Option<(Vec3, Vec3, Vec3)> {
        let forward = self.forward.try_normalize()?;
        // Re-orthogonalize right against forward.
        let right = (self.right - forward * self.right.dot(forward)).try_normalize()?;
        let up = forward.cross(right);
        Some((right, up, forward))
    }

    /// World point -> surface-local 2D coordinates.
    pub fn to_local(&self, world: Vec3) -> Option<Vec2> {
        let (right, up, _) = self.axes()?;
        if !(self.scale > 0.0) {
            return None;
        }
        let d = world - self.position;
        Some(Vec2::new(d.dot(right) / self.scale, d.dot(up) / self.scale))
    }

    /// Surface-local 2D coordinates -> world point on the plane.
    pub fn to_world(&self, local: Vec2) -> Option<Vec3> {
        let (right, up, _) = self.axes()?;
        Some(self.position + right * (local.x * self.scale) + up * (local.y * self.scale))
    }
}

/// Index of an element inside its surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u32);

/// Contract of the UI layer used by the planar hit tier.
pub trait UiSurface {
    fn frame(&self) -> SurfaceFrame;

    fn set_frame(&mut self, frame: SurfaceFrame);

    /// Elements under `point`, top-most first.
    fn hit_test(&self, point: Vec2) -> Vec<ElementId>;

    /// Walk up the containment hierarchy from `element` to its owning tile.
    fn owning_tile(&self, element: ElementId) -> Option<TileId>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    pub rect: Rect,
    /// Draw order; higher is on top.
    pub z: i32,
    pub parent: Option<ElementId>,
    /// Set on the root element of a tile.
    pub tile: Option<TileId>,
    /// Elements that do not block gaze (e.g. the progress ring) set this false.
    pub raycast_target: bool,
}

impl Element {
    pub fn new(name: &str, rect: Rect) -> Self {
        Self {
            name: name.to_string(),
            rect,
            z: 0,
            parent: None,
            tile: None,
            raycast_target: true,
        }
    }

    pub fn z(mut self, z: i32) -> Self {
        self.z = z;
        self
    }

    pub fn parent(mut self, parent: ElementId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn tile(mut self, tile: TileId) -> Self {
        self.tile = Some(tile);
        self
    }

    pub fn passive(mut self) -> Self {
        self.raycast_target = false;
        self
    }
}

/// In-memory world-space canvas of rectangular elements.
#[derive(Clone, Debug, Default)]
pub struct Canvas {
    frame: SurfaceFrame,
    elements: Vec<Element>,
}

impl Canvas {
    pub fn new(frame: SurfaceFrame) -> Self {
        Self {
            frame,
            elements: Vec::new(),
        }
    }

    pub fn add(&mut self, element: Element) -> ElementId {
        let id = ElementId(self.elements.len() as u32);
        self.elements.push(element);
        id
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }
}

impl UiSurface for Canvas {
    fn frame(&self) -> SurfaceFrame {
        self.frame
    }

    fn set_frame(&mut self, frame: SurfaceFrame) {
        self.frame = frame;
    }

    fn hit_test(&self, point: Vec2) -> Vec<ElementId> {
        let mut hits: Vec<(usize, i32)> = self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.raycast_target && e.rect.contains(point))
            .map(|(i, e)| (i, e.z))
            .collect();
        // Higher z first; among equal z, later siblings draw on top.
        hits.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));
        hits.into_iter().map(|(i, _)| ElementId(i as u32)).collect()
    }

    fn owning_tile(&self, element: ElementId) -> Option<TileId> {
        let mut cursor = Some(element);
        // Bounded walk: a malformed parent cycle cannot loop forever.
        for _ in 0..=self.elements.len() {
            let e = self.element(cursor?)?;
            if let Some(tile) = e.tile {
                return Some(tile);
            }
            cursor = e.parent;
        }
        None
    }
}
