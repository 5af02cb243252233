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

//! Picking and projection against prepared layers.
//!
//! All screen positions are presentation coordinates with the origin at the
//! bottom-left corner, like layer viewports.

use super::agent::{layer_run, RenderAgent};
use strata_core::math::{Plane, Ray, Rect, Vec2, Vec3};
use strata_core::renderer::RenderError;
use strata_data::allocators::FrameHandle;
use strata_data::scene::{CameraFrame, NodeId, SceneGraph};
use strata_lanes::render_lane::{LayerRenderPreparationData, RenderableFlags, RenderableObject};

/// A pick request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickQuery {
    /// Size of the presentation the layers were placed in.
    pub viewport_dims: Vec2,
    /// The picked point.
    pub mouse: Vec2,
    /// Also pick the active layers following the layer among its siblings.
    pub pick_siblings: bool,
    /// Ignore the pickable flag of renderables.
    pub pick_everything: bool,
}

impl PickQuery {
    /// Picks pickable renderables of a single layer.
    pub fn new(viewport_dims: Vec2, mouse: Vec2) -> Self {
        Self {
            viewport_dims,
            mouse,
            pick_siblings: false,
            pick_everything: false,
        }
    }
}

/// A renderable under the picked point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    /// Layer the renderable belongs to.
    pub layer: NodeId,
    /// Node the renderable came from.
    pub node: NodeId,
    /// The renderable, valid until the next frame begins.
    pub renderable: FrameHandle<RenderableObject>,
    /// Squared distance from the near plane to the hit.
    pub ray_length_squared: f32,
    /// Hit position relative to the renderable's XY bounds.
    pub relative_xy: Vec2,
    /// World-space hit position.
    pub position: Vec3,
}

/// Hits of a pick, closest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickResult {
    /// Every hit, sorted by distance. Equal distances keep draw list order.
    pub hits: Vec<PickHit>,
}

impl PickResult {
    /// The closest hit.
    pub fn closest(&self) -> Option<&PickHit> {
        self.hits.first()
    }

    /// Nothing was hit.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// The world-space ray through `point` of `viewport`, starting on the near
/// plane. `None` when the camera matrices cannot be inverted.
pub(crate) fn ray_through(camera: &CameraFrame, viewport: &Rect, point: Vec2) -> Option<Ray> {
    let ndc = viewport.to_normalized_relative(point);
    let inverse = camera.view_projection.inverse()?;
    let near = inverse.project_point(Vec3::new(ndc.x, ndc.y, 0.0));
    let far = inverse.project_point(Vec3::new(ndc.x, ndc.y, 1.0));
    Some(Ray::new(near, far - near))
}

impl RenderAgent {
    /// Finds the renderables under `query.mouse`.
    ///
    /// The layer must have been prepared this frame. Following siblings
    /// that were not prepared, or have no camera, are skipped.
    pub fn pick(
        &self,
        graph: &SceneGraph,
        layer: NodeId,
        instance: u32,
        query: &PickQuery,
    ) -> Result<PickResult, RenderError> {
        let presentation = Rect::from_size(query.viewport_dims);
        let mut hits = Vec::new();
        for id in layer_run(graph, layer, query.pick_siblings)? {
            let primary = id == layer;
            let (data, camera) = match self.prepared_view(id, instance) {
                Ok(view) => view,
                Err(err) if primary => return Err(err),
                Err(_) => continue,
            };
            let Some(layer_node) = graph.node(id).and_then(|n| n.as_layer()) else {
                continue;
            };
            let viewport = layer_node.placement.viewport(&presentation);
            if !viewport.contains(query.mouse) {
                continue;
            }
            let Some(ray) = ray_through(camera, &viewport, query.mouse) else {
                if primary {
                    return Err(RenderError::DegenerateProjection);
                }
                continue;
            };

            let handles = data.opaque_objects().iter().chain(data.transparent_objects());
            for &handle in handles {
                let Some(object) = self.renderable(handle) else {
                    continue;
                };
                if !query.pick_everything && !object.flags.contains(RenderableFlags::PICKABLE) {
                    continue;
                }
                if let Some(hit) = ray.intersect_aabb(&object.global_transform, &object.bounds) {
                    hits.push(PickHit {
                        layer: id,
                        node: object.node,
                        renderable: handle,
                        ray_length_squared: hit.ray_length_squared,
                        relative_xy: hit.relative_xy,
                        position: hit.position,
                    });
                }
            }
        }
        hits.sort_by(|a, b| a.ray_length_squared.total_cmp(&b.ray_length_squared));
        log::trace!("Pick on layer {:?} hit {} renderables", layer, hits.len());
        Ok(PickResult { hits })
    }

    /// Projects a world position into the layer's viewport. `z` holds the
    /// normalized depth.
    pub fn project_position(
        &self,
        layer: NodeId,
        instance: u32,
        position: Vec3,
    ) -> Result<Vec3, RenderError> {
        let (data, camera) = self.prepared_view(layer, instance)?;
        let ndc = camera.view_projection.project_point(position);
        let xy = prepared_viewport(data).from_normalized_relative(Vec2::new(ndc.x, ndc.y));
        Ok(Vec3::new(xy.x, xy.y, ndc.z))
    }

    /// The world position under `point` at normalized `depth`.
    pub fn unproject_with_depth(
        &self,
        layer: NodeId,
        instance: u32,
        point: Vec2,
        depth: f32,
    ) -> Result<Vec3, RenderError> {
        let (data, camera) = self.prepared_view(layer, instance)?;
        let ndc = prepared_viewport(data).to_normalized_relative(point);
        let inverse = camera
            .view_projection
            .inverse()
            .ok_or(RenderError::DegenerateProjection)?;
        Ok(inverse.project_point(Vec3::new(ndc.x, ndc.y, depth)))
    }

    /// Moves `position` under `point` while keeping it on the plane facing
    /// the camera. Returns `position` unchanged when the plane is not in
    /// front of the camera.
    pub fn unproject_to_position(
        &self,
        layer: NodeId,
        instance: u32,
        point: Vec2,
        position: Vec3,
    ) -> Result<Vec3, RenderError> {
        let (data, camera) = self.prepared_view(layer, instance)?;
        let ray = ray_through(camera, &prepared_viewport(data), point)
            .ok_or(RenderError::DegenerateProjection)?;
        let plane = Plane::from_point_normal(position, -camera.forward);
        Ok(ray.intersect_plane(&plane).unwrap_or(position))
    }

    fn prepared_view(
        &self,
        layer: NodeId,
        instance: u32,
    ) -> Result<(&LayerRenderPreparationData, &CameraFrame), RenderError> {
        let data = self
            .layer_data(layer, instance)
            .filter(|d| d.is_prepared())
            .ok_or(RenderError::NotPrepared { layer: layer.0 })?;
        let camera = data
            .camera_frame()
            .ok_or(RenderError::NoCamera { layer: layer.0 })?;
        Ok((data, camera))
    }
}

fn prepared_viewport(data: &LayerRenderPreparationData) -> Rect {
    data.result().map(|r| r.viewport).unwrap_or_default()
}
