use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::constants::EPSILON;

/// Point or direction in world space.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PartialEq for Vec3 {
    fn eq(&self, other: &Self) -> bool {
        (self.x - other.x).abs() < EPSILON
            && (self.y - other.y).abs() < EPSILON
            && (self.z - other.z).abs() < EPSILON
    }
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const RIGHT: Self = Self::new(1.0, 0.0, 0.0);
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);
    pub const FORWARD: Self = Self::new(0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit-length copy. Returns `None` for near-zero vectors.
    pub fn try_normalize(self) -> Option<Self> {
        let len = self.length();
        if len < EPSILON || !len.is_finite() {
            return None;
        }
        Some(self * (1.0 / len))
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn from_array(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Point on a 2D surface or screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in surface-local 2D coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + width, y + height),
        }
    }

    /// Inclusive on all edges.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }
}

/// A half-line from `origin` along unit `direction`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Build a ray, normalizing the direction. `None` for a degenerate direction.
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        if !origin.is_finite() {
            return None;
        }
        let direction = direction.try_normalize()?;
        Some(Self { origin, direction })
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Infinite plane through `point` with unit `normal`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vec3,
    pub point: Vec3,
}

impl Plane {
    pub fn new(normal: Vec3, point: Vec3) -> Option<Self> {
        Some(Self {
            normal: normal.try_normalize()?,
            point,
        })
    }

    /// Signed ray parameter of the intersection. `None` when the ray runs
    /// parallel to the plane. Negative values mean the plane is behind the origin.
    pub fn raycast(&self, ray: &Ray) -> Option<f64> {
        let denom = ray.direction.dot(self.normal);
        if denom.abs() < EPSILON {
            return None;
        }
        Some((self.point - ray.origin).dot(self.normal) / denom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cross_right_handed() {
        assert_eq!(Vec3::RIGHT.cross(Vec3::UP), Vec3::FORWARD);
    }

    #[test]
    fn test_normalize_zero() {
        assert!(Vec3::ZERO.try_normalize().is_none());
        let n = Vec3::new(3.0, 0.0, 4.0).try_normalize().unwrap();
        assert_relative_eq!(n.length(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ray_rejects_degenerate() {
        assert!(Ray::new(Vec3::ZERO, Vec3::ZERO).is_none());
        assert!(Ray::new(Vec3::new(f64::NAN, 0.0, 0.0), Vec3::FORWARD).is_none());
    }

    #[test]
    fn test_plane_raycast_front() {
        let plane = Plane::new(Vec3::FORWARD, Vec3::new(0.0, 0.0, 2.0)).unwrap();
        let ray = Ray::new(Vec3::ZERO, Vec3::FORWARD).unwrap();
        assert_relative_eq!(plane.raycast(&ray).unwrap(), 2.0);
    }

    #[test]
    fn test_plane_raycast_behind_is_negative() {
        let plane = Plane::new(Vec3::FORWARD, Vec3::new(0.0, 0.0, -2.0)).unwrap();
        let ray = Ray::new(Vec3::ZERO, Vec3::FORWARD).unwrap();
        assert!(plane.raycast(&ray).unwrap() < 0.0);
    }

    #[test]
    fn test_plane_raycast_parallel() {
        let plane = Plane::new(Vec3::FORWARD, Vec3::new(0.0, 0.0, 2.0)).unwrap();
        let ray = Ray::new(Vec3::ZERO, Vec3::RIGHT).unwrap();
        assert!(plane.raycast(&ray).is_none());
    }

    #[test]
    fn test_rect_contains_edges() {
        let r = Rect::from_origin_size(0.0, 0.0, 2.0, 1.0);
        assert!(r.contains(Vec2::new(0.0, 0.0)));
        assert!(r.contains(Vec2::new(2.0, 1.0)));
        assert!(!r.contains(Vec2::new(2.01, 0.5)));
        assert_eq!(r.center(), Vec2::new(1.0, 0.5));
    }
}
