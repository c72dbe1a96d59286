//! Ray type and operations

use crate::core::types::Vec3;
use super::aabb::Aabb;

/// Direction components smaller than this are treated as parallel to the axis
pub const PARALLEL_EPSILON: f32 = 1e-8;

/// A ray defined by origin and direction
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray (direction should be normalized)
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Get point along ray at parameter t
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray-AABB intersection using the slab method.
    ///
    /// Returns `Some((t_near, t_far))` with `t_near` clamped to zero when the
    /// origin is inside. Axis-parallel components are handled without
    /// producing NaN: the ray hits that slab for all `t` when the origin lies
    /// inside it and never otherwise.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> Option<(f32, f32)> {
        if !self.origin.is_finite() || !self.direction.is_finite() {
            return None;
        }

        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            let o = self.origin[axis];
            let d = self.direction[axis];
            let (lo, hi) = (aabb.min[axis], aabb.max[axis]);

            if d.abs() < PARALLEL_EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let t1 = (lo - o) * inv;
            let t2 = (hi - o) * inv;
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
        }

        if t_near <= t_far && t_far >= 0.0 {
            Some((t_near.max(0.0), t_far))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(ray.at(5.0), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_intersects_aabb_hit() {
        let ray = Ray::new(Vec3::new(-2.0, 0.5, 0.5), Vec3::X);
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let (t_near, t_far) = ray.intersects_aabb(&aabb).unwrap();
        assert!((t_near - 2.0).abs() < 0.001);
        assert!((t_far - 3.0).abs() < 0.001);
    }

    #[test]
    fn test_intersects_aabb_miss() {
        let ray = Ray::new(Vec3::new(-2.0, 5.0, 0.5), Vec3::X);
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(ray.intersects_aabb(&aabb).is_none());
    }

    #[test]
    fn test_intersects_aabb_inside() {
        let ray = Ray::new(Vec3::splat(0.5), Vec3::X);
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let (t_near, _) = ray.intersects_aabb(&aabb).unwrap();
        assert_eq!(t_near, 0.0); // Inside, so t_near clamped to 0
    }

    #[test]
    fn test_behind_origin() {
        let ray = Ray::new(Vec3::new(2.0, 0.5, 0.5), Vec3::X);
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(ray.intersects_aabb(&aabb).is_none());
    }

    #[test]
    fn test_parallel_ray_on_face() {
        // Origin lies exactly on the y = 0 face, direction has no y component
        let ray = Ray::new(Vec3::new(-1.0, 0.0, 0.5), Vec3::X);
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let (t_near, t_far) = ray.intersects_aabb(&aabb).unwrap();
        assert!(t_near.is_finite() && t_far.is_finite());
        assert!((t_near - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_direction() {
        let ray = Ray::new(Vec3::ZERO, Vec3::splat(f32::NAN));
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(ray.intersects_aabb(&aabb).is_none());
    }
}
