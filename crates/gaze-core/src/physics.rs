//! Volumetric hit tier: ray casts against oriented box colliders.

use serde::{Deserialize, Serialize};

use crate::constants::EPSILON;
use crate::tile::TileId;
use crate::vector::{Ray, Vec3};

/// Bit set of collision layers a ray cast may hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: Self = Self(!0);
    pub const NONE: Self = Self(0);

    pub fn layer(layer: u8) -> Self {
        Self(1u32.checked_shl(layer as u32).unwrap_or(0))
    }

    pub fn contains(self, layer: u8) -> bool {
        self.0 & Self::layer(layer).0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Whether trigger volumes take part in a ray cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerInteraction {
    #[default]
    Collide,
    Ignore,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColliderId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollisionHit {
    pub collider: ColliderId,
    pub point: Vec3,
    pub distance: f64,
}

/// Contract of the physics layer used by the volumetric fallback.
pub trait CollisionWorld {
    /// Nearest hit along `ray` within `max_distance` on a layer in `mask`.
    fn raycast(
        &self,
        ray: &Ray,
        max_distance: f64,
        mask: LayerMask,
        triggers: TriggerInteraction,
    ) -> Option<CollisionHit>;

    /// Walk up from a collider to the tile that owns it.
    fn owning_tile(&self, collider: ColliderId) -> Option<TileId>;
}

/// Oriented box collider.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxCollider {
    pub center: Vec3,
    /// Orthonormal local axes.
    pub axes: [Vec3; 3],
    pub half_extents: [f64; 3],
    pub layer: u8,
    pub is_trigger: bool,
    pub tile: Option<TileId>,
}

impl BoxCollider {
    pub fn axis_aligned(center: Vec3, size: Vec3) -> Self {
        Self {
            center,
            axes: [Vec3::RIGHT, Vec3::UP, Vec3::FORWARD],
            half_extents: [size.x * 0.5, size.y * 0.5, size.z * 0.5],
            layer: 0,
            is_trigger: false,
            tile: None,
        }
    }

    pub fn on_layer(mut self, layer: u8) -> Self {
        self.layer = layer;
        self
    }

    pub fn trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }

    pub fn owned_by(mut self, tile: TileId) -> Self {
        self.tile = Some(tile);
        self
    }

    /// Slab test in the box's local frame. Returns the entry distance, or 0
    /// when the origin is inside the box.
    pub fn intersect(&self, ray: &Ray) -> Option<f64> {
        let rel = ray.origin - self.center;
        let mut t_min = 0.0_f64;
        let mut t_max = f64::INFINITY;

        for (axis, &half) in self.axes.iter().zip(self.half_extents.iter()) {
            let o = rel.dot(*axis);
            let d = ray.direction.dot(*axis);
            if d.abs() < EPSILON {
                if o.abs() > half {
                    return None;
                }
                continue;
            }
            let t1 = (-half - o) / d;
            let t2 = (half - o) / d;
            let (near, far) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
            t_min = t_min.max(near);
            t_max = t_max.min(far);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

/// Flat list of box colliders.
#[derive(Clone, Debug, Default)]
pub struct ColliderSet {
    colliders: Vec<BoxCollider>,
}

impl ColliderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, collider: BoxCollider) -> ColliderId {
        let id = ColliderId(self.colliders.len() as u32);
        self.colliders.push(collider);
        id
    }

    pub fn get(&self, id: ColliderId) -> Option<&BoxCollider> {
        self.colliders.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }
}

impl CollisionWorld for ColliderSet {
    fn raycast(
        &self,
        ray: &Ray,
        max_distance: f64,
        mask: LayerMask,
        triggers: TriggerInteraction,
    ) -> Option<CollisionHit> {
        self.colliders
            .iter()
            .enumerate()
            .filter(|(_, c)| mask.contains(c.layer))
            .filter(|(_, c)| !(c.is_trigger && triggers == TriggerInteraction::Ignore))
            .filter_map(|(i, c)| {
                let t = c.intersect(ray)?;
                (t <= max_distance).then_some((i, t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, t)| CollisionHit {
                collider: ColliderId(i as u32),
                point: ray.at(t),
                distance: t,
            })
    }

    fn owning_tile(&self, collider: ColliderId) -> Option<TileId> {
        self.get(collider)?.tile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn forward_ray() -> Ray {
        Ray::new(Vec3::ZERO, Vec3::FORWARD).unwrap()
    }

    #[test]
    fn test_layer_mask() {
        assert!(LayerMask::ALL.contains(31));
        assert!(!LayerMask::NONE.contains(0));
        assert!(LayerMask::layer(5).contains(5));
        assert!(!LayerMask::layer(5).contains(4));
        assert_eq!(LayerMask::layer(40), LayerMask::NONE);
    }

    #[test]
    fn test_box_hit_distance() {
        let b = BoxCollider::axis_aligned(Vec3::new(0.0, 0.0, 5.0), Vec3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(b.intersect(&forward_ray()).unwrap(), 4.5);
    }

    #[test]
    fn test_box_miss_and_behind() {
        let off = BoxCollider::axis_aligned(Vec3::new(3.0, 0.0, 5.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(off.intersect(&forward_ray()).is_none());
        let behind = BoxCollider::axis_aligned(Vec3::new(0.0, 0.0, -5.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(behind.intersect(&forward_ray()).is_none());
    }

    #[test]
    fn test_origin_inside_box() {
        let b = BoxCollider::axis_aligned(Vec3::ZERO, Vec3::new(2.0, 2.0, 2.0));
        assert_eq!(b.intersect(&forward_ray()), Some(0.0));
    }

    #[test]
    fn test_nearest_wins() {
        let a = TileId::new();
        let b = TileId::new();
        let mut set = ColliderSet::new();
        let slab = Vec3::new(1.0, 1.0, 0.01);
        set.add(BoxCollider::axis_aligned(Vec3::new(0.0, 0.0, 8.0), slab).owned_by(b));
        let near = set.add(BoxCollider::axis_aligned(Vec3::new(0.0, 0.0, 3.0), slab).owned_by(a));

        let hit = set
            .raycast(&forward_ray(), 10.0, LayerMask::ALL, TriggerInteraction::Collide)
            .unwrap();
        assert_eq!(hit.collider, near);
        assert_eq!(set.owning_tile(hit.collider), Some(a));
        assert_relative_eq!(hit.point.z, 2.995, epsilon = 1e-9);
    }

    #[test]
    fn test_max_distance_and_mask() {
        let mut set = ColliderSet::new();
        let unit = Vec3::new(1.0, 1.0, 1.0);
        set.add(BoxCollider::axis_aligned(Vec3::new(0.0, 0.0, 5.0), unit).on_layer(3));
        let ray = forward_ray();
        let collide = TriggerInteraction::Collide;
        assert!(set.raycast(&ray, 4.0, LayerMask::ALL, collide).is_none());
        assert!(set.raycast(&ray, 10.0, LayerMask::layer(2), collide).is_none());
        assert!(set.raycast(&ray, 10.0, LayerMask::layer(3), collide).is_some());
    }

    #[test]
    fn test_triggers() {
        let mut set = ColliderSet::new();
        let unit = Vec3::new(1.0, 1.0, 1.0);
        set.add(BoxCollider::axis_aligned(Vec3::new(0.0, 0.0, 5.0), unit).trigger());
        let ray = forward_ray();
        assert!(set.raycast(&ray, 10.0, LayerMask::ALL, TriggerInteraction::Collide).is_some());
        assert!(set.raycast(&ray, 10.0, LayerMask::ALL, TriggerInteraction::Ignore).is_none());
    }

    #[test]
    fn test_oriented_box() {
        // Box rotated 90 degrees about y: its local x runs along world z.
        let b = BoxCollider {
            center: Vec3::new(0.0, 0.0, 5.0),
            axes: [Vec3::FORWARD, Vec3::UP, -Vec3::RIGHT],
            half_extents: [2.0, 0.5, 0.1],
            layer: 0,
            is_trigger: false,
            tile: None,
        };
        assert_relative_eq!(b.intersect(&forward_ray()).unwrap(), 3.0);
        let side = Ray::new(Vec3::new(0.5, 0.0, 5.0), Vec3::FORWARD).unwrap();
        assert!(b.intersect(&side).is_none());
    }
}
