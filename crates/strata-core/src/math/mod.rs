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

//! Provides the mathematics primitives used by the renderer core.
//!
//! Vectors, matrices and quaternions for node transforms, plus the geometric
//! volumes (bounding boxes, rays, planes, clipping frusta) the preparation
//! pipeline needs for culling, sorting and picking.
//!
//! Matrices are column-major and follow a right-handed convention with a
//! `[0, 1]` clip-space depth range. Cameras look down their local `-Z` axis.

/// A small constant for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;

pub use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// The factor to convert degrees to radians (PI / 180.0).
pub const DEG_TO_RAD: f32 = PI / 180.0;

pub mod color;
pub mod geometry;
pub mod matrix;
pub mod quaternion;
pub mod rect;
pub mod vector;

pub use self::color::LinearRgba;
pub use self::geometry::{Aabb, ClippingFrustum, Plane, Ray, RayHit};
pub use self::matrix::Mat4;
pub use self::quaternion::Quaternion;
pub use self::rect::Rect;
pub use self::vector::{Vec2, Vec3, Vec4};

/// Converts an angle from degrees to radians.
///
/// ```
/// use strata_core::math::{degrees_to_radians, PI};
/// assert_eq!(degrees_to_radians(180.0), PI);
/// ```
#[inline]
pub fn degrees_to_radians(degrees: f32) -> f32 {
    degrees * DEG_TO_RAD
}

/// Checks if two floats are approximately equal within [`EPSILON`].
#[inline]
pub fn approx_eq(a: f32, b: f32) -> bool {
    approx::abs_diff_eq!(a, b, epsilon = EPSILON)
}

/// Returns `true` if `a` and `b` are equal up to a relative tolerance.
///
/// Used for opacity checks where a value "exactly 1.0" must tolerate the
/// rounding introduced by multiplying parent and material opacities.
#[inline]
pub fn fuzzy_eq(a: f32, b: f32) -> bool {
    approx::relative_eq!(a, b, epsilon = EPSILON, max_relative = 1e-5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrees_to_radians() {
        assert!(approx_eq(degrees_to_radians(90.0), FRAC_PI_2));
        assert!(approx_eq(degrees_to_radians(0.0), 0.0));
    }

    #[test]
    fn test_fuzzy_eq_tolerates_product_rounding() {
        let opacity = 0.1_f32 * 10.0;
        assert!(fuzzy_eq(opacity, 1.0));
        assert!(!fuzzy_eq(0.99, 1.0));
    }
}
