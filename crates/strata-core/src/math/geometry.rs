// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Geometric volumes used for culling, sorting and picking.
//!
//! [`Aabb`] doubles as the on-disk bounds record of a mesh subset, so it is
//! `#[repr(C)]` and `Pod`: six `f32`s, minimum corner first.

use super::{Mat4, Vec2, Vec3, Vec4, EPSILON};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Aabb {
    /// The corner with the smallest coordinates on all axes.
    pub min: Vec3,
    /// The corner with the largest coordinates on all axes.
    pub max: Vec3,
}

impl Aabb {
    /// An empty box: `min` is `+inf` and `max` is `-inf`, so including any
    /// point or merging any valid box yields that point or box.
    pub const EMPTY: Self = Self {
        min: Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
        max: Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    /// Creates a box from two corners given in any order.
    #[inline]
    pub fn from_min_max(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// The tightest box around `points`, or [`Aabb::EMPTY`] for no points.
    pub fn from_points(points: &[Vec3]) -> Self {
        points
            .iter()
            .fold(Self::EMPTY, |acc, p| acc.merged_with_point(*p))
    }

    /// `true` when no point has been included yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// The center point. Meaningless for an empty box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Full size on each axis.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Grows the box in place to include `p`.
    #[inline]
    pub fn include(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// A copy of the box grown to include `p`.
    #[inline]
    pub fn merged_with_point(&self, p: Vec3) -> Self {
        let mut out = *self;
        out.include(p);
        out
    }

    /// The smallest box enclosing both boxes.
    #[inline]
    pub fn merge(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Whether the boxes overlap; touching counts as overlapping.
    #[inline]
    pub fn intersects_aabb(&self, other: &Aabb) -> bool {
        (self.min.x <= other.max.x && self.max.x >= other.min.x)
            && (self.min.y <= other.max.y && self.max.y >= other.min.y)
            && (self.min.z <= other.max.z && self.max.z >= other.min.z)
    }

    /// The eight corners of the box.
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// The axis-aligned box enclosing this box after an affine transform.
    ///
    /// An empty box stays empty.
    pub fn transform(&self, m: &Mat4) -> Self {
        if self.is_empty() {
            return *self;
        }
        // Arvo: accumulate the extremes of each matrix term separately.
        let mut min = m.translation();
        let mut max = min;
        for col in 0..3 {
            let axis = m.cols[col].truncate();
            for row in 0..3 {
                let a = axis[row] * self.min[col];
                let b = axis[row] * self.max[col];
                min[row] += a.min(b);
                max[row] += a.max(b);
            }
        }
        Self { min, max }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// A plane `dot(normal, p) + d = 0`. Points with a positive signed distance
/// are on the normal's side.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Plane {
    /// Unit normal.
    pub normal: Vec3,
    /// Signed offset.
    pub d: f32,
}

impl Plane {
    /// Builds a plane from `(a, b, c, d)` coefficients, normalizing them.
    pub fn from_coefficients(v: Vec4) -> Self {
        let n = v.truncate();
        let len = n.length();
        if len < EPSILON {
            return Self {
                normal: n,
                d: v.w,
            };
        }
        Self {
            normal: n * (1.0 / len),
            d: v.w / len,
        }
    }

    /// A plane through `point` facing `normal`.
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            d: -normal.dot(point),
        }
    }

    /// Signed distance from the plane.
    #[inline]
    pub fn distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.d
    }

    /// `true` when the whole box lies on the negative side.
    #[inline]
    pub fn is_box_outside(&self, bounds: &Aabb) -> bool {
        // The corner furthest along the normal.
        let positive = Vec3::new(
            if self.normal.x >= 0.0 { bounds.max.x } else { bounds.min.x },
            if self.normal.y >= 0.0 { bounds.max.y } else { bounds.min.y },
            if self.normal.z >= 0.0 { bounds.max.z } else { bounds.min.z },
        );
        self.distance(positive) < 0.0
    }
}

/// The six planes of a camera's view volume, normals pointing inwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClippingFrustum {
    /// Left, right, bottom, top, near, far.
    pub planes: [Plane; 6],
}

impl ClippingFrustum {
    /// Index of the near plane in [`ClippingFrustum::planes`].
    pub const NEAR: usize = 4;

    /// Extracts the planes of a `[0, 1]`-depth view-projection matrix, then
    /// replaces its near plane with `near_plane`.
    pub fn new(view_projection: &Mat4, near_plane: Plane) -> Self {
        let r0 = view_projection.row(0);
        let r1 = view_projection.row(1);
        let r2 = view_projection.row(2);
        let r3 = view_projection.row(3);
        let mut planes = [
            Plane::from_coefficients(r3 + r0),
            Plane::from_coefficients(r3 - r0),
            Plane::from_coefficients(r3 + r1),
            Plane::from_coefficients(r3 - r1),
            Plane::from_coefficients(r2),
            Plane::from_coefficients(r3 - r2),
        ];
        planes[Self::NEAR] = near_plane;
        Self { planes }
    }

    /// `false` only when the box is entirely outside at least one plane.
    pub fn intersects_aabb(&self, bounds: &Aabb) -> bool {
        if bounds.is_empty() {
            return false;
        }
        !self.planes.iter().any(|p| p.is_box_outside(bounds))
    }
}

/// A half-line used for picking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point in world space.
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

/// Where a [`Ray`] hit a box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Squared world-space distance from the ray origin to the hit.
    pub ray_length_squared: f32,
    /// Hit position relative to the box's XY extent, each in `[0, 1]`.
    pub relative_xy: Vec2,
    /// Hit position in world space.
    pub position: Vec3,
}

impl Ray {
    /// Creates a ray, normalizing `direction`.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Intersects the ray with `bounds` placed in the world by
    /// `global_transform`, using the slab method in the box's local space.
    ///
    /// Returns `None` on a miss, when the box is behind the origin, or when
    /// the transform cannot be inverted.
    pub fn intersect_aabb(&self, global_transform: &Mat4, bounds: &Aabb) -> Option<RayHit> {
        if bounds.is_empty() {
            return None;
        }
        let to_local = global_transform.inverse()?;
        let origin = to_local.transform_point(self.origin);
        let direction = to_local.transform_vector(self.direction);

        let mut t_min = f32::MIN;
        let mut t_max = f32::MAX;
        for axis in 0..3 {
            let (lo, hi) = (bounds.min[axis], bounds.max[axis]);
            let (o, d) = (origin[axis], direction[axis]);
            let (near, far) = if d > EPSILON {
                ((lo - o) / d, (hi - o) / d)
            } else if d < -EPSILON {
                ((hi - o) / d, (lo - o) / d)
            } else if o < lo || o > hi {
                // Parallel to this slab and outside of it.
                return None;
            } else {
                (f32::MIN, f32::MAX)
            };
            t_min = t_min.max(near);
            t_max = t_max.min(far);
            if t_min > t_max || t_max < 0.0 {
                return None;
            }
        }

        let local_hit = origin + direction * t_min;
        let position = global_transform.transform_point(local_hit);
        let extent = bounds.size();
        let rel = |value: f32, lo: f32, range: f32| {
            if range.abs() < EPSILON {
                0.0
            } else {
                (value - lo) / range
            }
        };
        Some(RayHit {
            ray_length_squared: (self.origin - position).length_squared(),
            relative_xy: Vec2::new(
                rel(local_hit.x, bounds.min.x, extent.x),
                rel(local_hit.y, bounds.min.y, extent.y),
            ),
            position,
        })
    }

    /// The point where the ray meets `plane`, if it does so in front of the
    /// origin.
    pub fn intersect_plane(&self, plane: &Plane) -> Option<Vec3> {
        let denom = plane.normal.dot(self.direction);
        if denom.abs() < EPSILON {
            return None;
        }
        let t = -plane.distance(self.origin) / denom;
        if t < 0.0 {
            return None;
        }
        Some(self.origin + self.direction * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{approx_eq, Quaternion, FRAC_PI_2};
    use approx::assert_abs_diff_eq;

    fn unit_box() -> Aabb {
        Aabb::from_min_max(Vec3::new(-1.0, -1.0, -1.0), Vec3::ONE)
    }

    #[test]
    fn test_empty_box_absorbs_first_point() {
        let mut b = Aabb::EMPTY;
        assert!(b.is_empty());
        b.include(Vec3::new(1.0, 2.0, 3.0));
        assert!(!b.is_empty());
        assert_eq!(b.min, b.max);
    }

    #[test]
    fn test_from_points() {
        let b = Aabb::from_points(&[Vec3::new(1.0, 5.0, -2.0), Vec3::new(-3.0, 0.0, 4.0)]);
        assert_eq!(b.min, Vec3::new(-3.0, 0.0, -2.0));
        assert_eq!(b.max, Vec3::new(1.0, 5.0, 4.0));
        assert!(Aabb::from_points(&[]).is_empty());
    }

    #[test]
    fn test_transform_translates_and_rotates() {
        let b = Aabb::from_min_max(Vec3::ZERO, Vec3::new(2.0, 1.0, 1.0));
        let m = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0))
            * Mat4::from_quat(Quaternion::from_axis_angle(Vec3::Z, FRAC_PI_2));
        let t = b.transform(&m);
        assert_abs_diff_eq!(t.min, Vec3::new(9.0, 0.0, 0.0), epsilon = 1e-4);
        assert_abs_diff_eq!(t.max, Vec3::new(10.0, 2.0, 1.0), epsilon = 1e-4);
        assert!(Aabb::EMPTY.transform(&m).is_empty());
    }

    #[test]
    fn test_plane_box_classification() {
        let plane = Plane::from_point_normal(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert!(plane.is_box_outside(&unit_box()));
        let plane = Plane::from_point_normal(Vec3::ZERO, Vec3::Z);
        assert!(!plane.is_box_outside(&unit_box()));
    }

    #[test]
    fn test_frustum_culls_box_behind_camera() {
        let vp = Mat4::perspective_rh_zo(FRAC_PI_2, 1.0, 0.1, 100.0).expect("projection");
        let near = Plane::from_point_normal(Vec3::new(0.0, 0.0, -0.1), Vec3::FORWARD);
        let frustum = ClippingFrustum::new(&vp, near);

        let in_front = unit_box().transform(&Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0)));
        let behind = unit_box().transform(&Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0)));
        let far_left = unit_box().transform(&Mat4::from_translation(Vec3::new(-50.0, 0.0, -10.0)));
        assert!(frustum.intersects_aabb(&in_front));
        assert!(!frustum.intersects_aabb(&behind));
        assert!(!frustum.intersects_aabb(&far_left));
    }

    #[test]
    fn test_ray_hits_transformed_box() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::FORWARD);
        let m = Mat4::from_translation(Vec3::new(0.0, 0.0, -2.0));
        let hit = ray.intersect_aabb(&m, &unit_box()).expect("ray should hit");
        // Front face sits at z = -1 in world space.
        assert!(approx_eq(hit.ray_length_squared, 121.0));
        assert_abs_diff_eq!(hit.relative_xy.x, 0.5);
        assert_abs_diff_eq!(hit.relative_xy.y, 0.5);
    }

    #[test]
    fn test_ray_misses_box_behind_origin() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::FORWARD);
        assert!(ray.intersect_aabb(&Mat4::IDENTITY, &unit_box()).is_none());
        let ray = Ray::new(Vec3::new(5.0, 0.0, 10.0), Vec3::FORWARD);
        assert!(ray.intersect_aabb(&Mat4::IDENTITY, &unit_box()).is_none());
    }

    #[test]
    fn test_ray_plane_intersection() {
        let ray = Ray::new(Vec3::new(1.0, 2.0, 5.0), Vec3::FORWARD);
        let plane = Plane::from_point_normal(Vec3::ZERO, Vec3::Z);
        assert_eq!(ray.intersect_plane(&plane), Some(Vec3::new(1.0, 2.0, 0.0)));
    }
}
