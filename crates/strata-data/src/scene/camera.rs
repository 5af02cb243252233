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

//! Camera nodes and the per-frame matrices derived from them.

use strata_core::math::{ClippingFrustum, Mat4, Plane, Rect, Vec3};

/// Defines the type of camera projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionType {
    /// Perspective projection with field of view.
    Perspective {
        /// The vertical field of view in radians.
        fov_y_radians: f32,
    },
    /// Orthographic projection. The view volume matches the layer viewport
    /// in pixels, scaled by `zoom`.
    Orthographic {
        /// Magnification applied to the viewport extent.
        zoom: f32,
    },
}

/// The projection parameters of a camera node.
///
/// The aspect ratio is not stored: it always follows the viewport of the
/// layer the camera renders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraNode {
    /// The type of projection (perspective or orthographic).
    pub projection: ProjectionType,
    /// The distance to the near clipping plane.
    pub z_near: f32,
    /// The distance to the far clipping plane.
    pub z_far: f32,
    /// Whether renderables outside the view volume may be culled.
    pub enable_frustum_clipping: bool,
}

impl CameraNode {
    /// Creates a new perspective camera.
    pub fn new_perspective(fov_y_radians: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            projection: ProjectionType::Perspective { fov_y_radians },
            z_near,
            z_far,
            enable_frustum_clipping: true,
        }
    }

    /// Creates a new orthographic camera.
    pub fn new_orthographic(z_near: f32, z_far: f32) -> Self {
        Self {
            projection: ProjectionType::Orthographic { zoom: 1.0 },
            z_near,
            z_far,
            enable_frustum_clipping: true,
        }
    }

    /// The projection matrix for a viewport. `None` when the viewport has no
    /// area or the clip planes are degenerate.
    pub fn projection_matrix(&self, viewport: &Rect) -> Option<Mat4> {
        if !viewport.has_area() {
            return None;
        }
        match self.projection {
            ProjectionType::Perspective { fov_y_radians } => Mat4::perspective_rh_zo(
                fov_y_radians,
                viewport.width / viewport.height,
                self.z_near,
                self.z_far,
            ),
            ProjectionType::Orthographic { zoom } => {
                let zoom = if zoom > 0.0 { zoom } else { 1.0 };
                let half_width = viewport.width / (2.0 * zoom);
                let half_height = viewport.height / (2.0 * zoom);
                Mat4::orthographic_rh_zo(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.z_near,
                    self.z_far,
                )
            }
        }
    }

    /// Everything the preparation pipeline needs from the camera this frame.
    pub fn frame_state(&self, global_transform: &Mat4, viewport: &Rect) -> Option<CameraFrame> {
        let projection = self.projection_matrix(viewport)?;
        let view = global_transform.inverse()?;
        let view_projection = projection * view;
        let position = global_transform.translation();
        let forward = global_transform.transform_vector(Vec3::FORWARD).normalize();
        let near_plane = Plane::from_point_normal(position + forward * self.z_near, forward);
        Some(CameraFrame {
            projection,
            view,
            view_projection,
            position,
            forward,
            frustum: ClippingFrustum::new(&view_projection, near_plane),
            enable_frustum_clipping: self.enable_frustum_clipping,
        })
    }
}

impl Default for CameraNode {
    /// A 60 degree perspective camera clipping at 10 and 5000 units.
    fn default() -> Self {
        Self::new_perspective(60.0_f32.to_radians(), 10.0, 5000.0)
    }
}

/// Camera matrices resolved for one frame and one viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    /// View to clip space.
    pub projection: Mat4,
    /// World to view space.
    pub view: Mat4,
    /// World to clip space.
    pub view_projection: Mat4,
    /// World-space position.
    pub position: Vec3,
    /// World-space unit viewing direction.
    pub forward: Vec3,
    /// View volume with the near plane placed at `z_near`.
    pub frustum: ClippingFrustum,
    /// Copied from the camera node.
    pub enable_frustum_clipping: bool,
}

impl CameraFrame {
    /// Signed distance of `point` along the viewing direction. Front to back
    /// sorting orders by this value.
    #[inline]
    pub fn depth_of(&self, point: Vec3) -> f32 {
        (point - self.position).dot(self.forward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::math::{approx_eq, Aabb};

    #[test]
    fn test_projection_follows_viewport_aspect() {
        let camera = CameraNode::default();
        let wide = camera
            .projection_matrix(&Rect::new(0.0, 0.0, 200.0, 100.0))
            .unwrap();
        let square = camera
            .projection_matrix(&Rect::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        assert!(approx_eq(wide.cols[0].x * 2.0, square.cols[0].x));
        assert!(camera.projection_matrix(&Rect::default()).is_none());
    }

    #[test]
    fn test_frame_state_at_origin_looks_down_negative_z() {
        let camera = CameraNode::new_perspective(90.0_f32.to_radians(), 1.0, 100.0);
        let frame = camera
            .frame_state(&Mat4::IDENTITY, &Rect::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        assert_eq!(frame.position, Vec3::ZERO);
        assert_eq!(frame.forward, Vec3::FORWARD);
        assert!(approx_eq(frame.depth_of(Vec3::new(3.0, 1.0, -10.0)), 10.0));

        let ahead = Aabb::from_min_max(Vec3::new(-1.0, -1.0, -11.0), Vec3::new(1.0, 1.0, -9.0));
        let behind = Aabb::from_min_max(Vec3::new(-1.0, -1.0, 9.0), Vec3::new(1.0, 1.0, 11.0));
        assert!(frame.frustum.intersects_aabb(&ahead));
        assert!(!frame.frustum.intersects_aabb(&behind));
    }
}
