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

//! Per-layer render preparation.
//!
//! A [`LayerRenderPreparationData`] is owned by the render agent for each
//! layer it draws. Once per frame it walks the layer's subtree and turns the
//! scene into sorted lists of [`RenderableObject`]s: it places the viewport,
//! collects lights and the layer's shader features, picks a camera, resolves
//! materials and images, and buckets the results into an opaque list drawn
//! front to back and a transparent list drawn back to front.
//!
//! Preparation is idempotent within a frame. The agent calls
//! [`LayerRenderPreparationData::reset_for_frame`] when a new frame begins.

use super::collaborators::Collaborators;
use super::flags::{LayerPreparationFlags, RenderableFlags};
use super::light_scope::LightScopes;
use super::material_preparation::{
    ensure_texture, prepare_custom_material, prepare_default_material, resolve_material,
    LightingInputs, MaterialResolveError,
};
use super::renderable::{
    CustomMaterialRenderable, FrameAllocator, PathRenderable, RenderableKind, RenderableObject,
    SubsetRenderable, TextRenderable,
};
use super::result::LayerRenderPreparationResult;
use ahash::AHashSet;
use strata_core::asset::{Material, MaterialId};
use strata_core::math::{Aabb, Mat4, Rect, Vec2, Vec3};
use strata_core::renderer::features;
use strata_core::renderer::{
    DrawMode, LightProperties, RenderSubset, RendererSettings, ShaderFeature, ShaderFeatureSet,
    TessellationMode,
};
use strata_data::allocators::FrameHandle;
use strata_data::scene::{
    CameraFrame, LayerNode, ModelNode, NodeId, NodeKind, PathNode, PathType, SceneGraph, TextNode,
};

/// Everything a layer preparation borrows from its caller for one call.
pub struct PrepareContext<'c, 'a> {
    /// Services the pipeline calls out to.
    pub collaborators: &'c mut Collaborators<'a>,
    /// Renderer tunables.
    pub settings: &'c RendererSettings,
    /// Arenas the renderables of this frame are allocated in.
    pub frame: &'c mut FrameAllocator,
    /// Scale of the presentation relative to its design size. Passed to
    /// offscreen and text renderers.
    pub presentation_scale: Vec2,
}

impl<'c, 'a> PrepareContext<'c, 'a> {
    /// A context with a unit presentation scale.
    pub fn new(
        collaborators: &'c mut Collaborators<'a>,
        settings: &'c RendererSettings,
        frame: &'c mut FrameAllocator,
    ) -> Self {
        Self {
            collaborators,
            settings,
            frame,
            presentation_scale: Vec2::ONE,
        }
    }

    /// Sets the presentation scale.
    pub fn with_presentation_scale(mut self, scale: Vec2) -> Self {
        self.presentation_scale = scale;
        self
    }
}

/// Collaborators that may be missing, for one-shot diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Service {
    CustomMaterials,
    Paths,
    Text,
}

impl Service {
    fn name(self) -> &'static str {
        match self {
            Service::CustomMaterials => "custom material system",
            Service::Paths => "path manager",
            Service::Text => "text renderer",
        }
    }
}

/// Global state of a node captured before its kind is prepared.
struct NodeInfo {
    id: NodeId,
    transform: Mat4,
    opacity: f32,
    pickable: bool,
    changed: bool,
}

/// A drawable before culling, opacity classification and camera math.
struct Drawable {
    bounds: Aabb,
    opacity: f32,
    flags: RenderableFlags,
    dirty: bool,
    kind: RenderableKind,
}

/// Renderables collected during one preparation.
struct Batch<'f> {
    camera: &'f CameraFrame,
    feature_hash: u64,
    objects: Vec<RenderableObject>,
    used_materials: AHashSet<MaterialId>,
    requires_stencil: bool,
}

impl Batch<'_> {
    fn push(&mut self, info: &NodeInfo, drawable: Drawable, settings: &RendererSettings) {
        let Drawable {
            bounds,
            mut opacity,
            mut flags,
            dirty,
            kind,
        } = drawable;

        let has_bounds = !bounds.is_empty();
        if has_bounds && settings.enable_frustum_culling && self.camera.enable_frustum_clipping {
            let world_bounds = bounds.transform(&info.transform);
            if !self.camera.frustum.intersects_aabb(&world_bounds) {
                opacity = 0.0;
            }
        }

        if opacity < settings.minimum_render_opacity {
            flags |= RenderableFlags::COMPLETELY_TRANSPARENT | RenderableFlags::HAS_TRANSPARENCY;
        } else if opacity < 1.0 {
            flags |= RenderableFlags::HAS_TRANSPARENCY;
        }
        if info.pickable {
            flags |= RenderableFlags::PICKABLE;
        }
        if dirty || info.changed {
            flags |= RenderableFlags::DIRTY;
        }

        let world_center = if has_bounds {
            info.transform.transform_point(bounds.center())
        } else {
            info.transform.translation()
        };
        self.objects.push(RenderableObject {
            node: info.id,
            flags,
            bounds,
            global_transform: info.transform,
            world_center,
            model_view_projection: self.camera.view_projection * info.transform,
            opacity,
            camera_distance: self.camera.depth_of(world_center),
            kind,
        });
    }
}

/// Applies a model's tessellation settings to a mesh subset.
fn tessellated_subset(
    source: &RenderSubset,
    model: &ModelNode,
    wireframe_mode: bool,
) -> RenderSubset {
    let mut subset = source.clone();
    if model.tessellation != TessellationMode::None {
        subset.primitive = DrawMode::Patches;
        subset.edge_tessellation = model.edge_tessellation;
        subset.inner_tessellation = model.inner_tessellation;
        subset.wireframe = wireframe_mode;
    }
    subset
}

/// Cached preparation state of one layer.
#[derive(Debug)]
pub struct LayerRenderPreparationData {
    layer: NodeId,
    features: ShaderFeatureSet,

    // Subtree snapshot, rebuilt when the graph structure changes. Both lists
    // are in reverse depth-first order.
    structure_generation: Option<u64>,
    renderable_nodes: Vec<NodeId>,
    camera_and_light_nodes: Vec<NodeId>,
    light_scopes: LightScopes,

    // Per-frame light state.
    lights: Vec<NodeId>,
    global_lights: Vec<NodeId>,
    light_directions: Vec<Vec3>,
    layer_has_probe: bool,

    camera_frame: Option<CameraFrame>,
    opaque: Vec<FrameHandle<RenderableObject>>,
    transparent: Vec<FrameHandle<RenderableObject>>,
    result: Option<LayerRenderPreparationResult>,

    // What the previous preparation saw, for dirty tracking.
    last_viewport: Option<Rect>,
    last_camera: Option<NodeId>,
    last_feature_hash: Option<u64>,
    progressive_aa_pass_index: u32,

    // One-shot diagnostics.
    light_overflow_logged: bool,
    // Reset every frame.
    node_light_overflow_logged: bool,
    missing_camera_logged: bool,
    logged_materials: AHashSet<MaterialId>,
    logged_meshes: AHashSet<String>,
    logged_services: AHashSet<Service>,
}

impl LayerRenderPreparationData {
    /// Empty preparation state for `layer`.
    pub fn new(layer: NodeId) -> Self {
        Self {
            layer,
            features: ShaderFeatureSet::default(),
            structure_generation: None,
            renderable_nodes: Vec::new(),
            camera_and_light_nodes: Vec::new(),
            light_scopes: LightScopes::new(),
            lights: Vec::new(),
            global_lights: Vec::new(),
            light_directions: Vec::new(),
            layer_has_probe: false,
            camera_frame: None,
            opaque: Vec::new(),
            transparent: Vec::new(),
            result: None,
            last_viewport: None,
            last_camera: None,
            last_feature_hash: None,
            progressive_aa_pass_index: 0,
            light_overflow_logged: false,
            node_light_overflow_logged: false,
            missing_camera_logged: false,
            logged_materials: AHashSet::new(),
            logged_meshes: AHashSet::new(),
            logged_services: AHashSet::new(),
        }
    }

    /// The layer node this state belongs to.
    pub fn layer(&self) -> NodeId {
        self.layer
    }

    /// Whether the layer was prepared this frame.
    pub fn is_prepared(&self) -> bool {
        self.result.is_some()
    }

    /// The result of this frame's preparation.
    pub fn result(&self) -> Option<&LayerRenderPreparationResult> {
        self.result.as_ref()
    }

    /// Forgets this frame's preparation. Cached state survives.
    pub fn reset_for_frame(&mut self) {
        self.result = None;
        self.opaque.clear();
        self.transparent.clear();
    }

    /// Prepares the layer for the current frame, or returns the result of
    /// an earlier call this frame.
    pub fn prepare_for_render(
        &mut self,
        graph: &mut SceneGraph,
        presentation: Rect,
        ctx: &mut PrepareContext<'_, '_>,
    ) -> &LayerRenderPreparationResult {
        let result = match self.result.take() {
            Some(result) => result,
            None => self.prepare(graph, presentation, ctx),
        };
        self.result.insert(result)
    }

    /// Opaque renderables, front to back.
    pub fn opaque_objects(&self) -> &[FrameHandle<RenderableObject>] {
        debug_assert!(self.is_prepared(), "layer {:?} was not prepared", self.layer);
        &self.opaque
    }

    /// Transparent renderables, back to front.
    pub fn transparent_objects(&self) -> &[FrameHandle<RenderableObject>] {
        debug_assert!(self.is_prepared(), "layer {:?} was not prepared", self.layer);
        &self.transparent
    }

    /// The layer's shader features, sorted by name.
    pub fn features(&mut self) -> &[ShaderFeature] {
        self.features.features()
    }

    /// The layer's feature set.
    pub fn feature_set(&self) -> &ShaderFeatureSet {
        &self.features
    }

    /// Active lights of the layer, in depth-first order.
    pub fn lights(&self) -> &[NodeId] {
        &self.lights
    }

    /// World direction of every light node under the layer, active or not.
    pub fn light_directions(&self) -> &[Vec3] {
        &self.light_directions
    }

    /// Camera matrices of this frame.
    pub fn camera_frame(&self) -> Option<&CameraFrame> {
        self.camera_frame.as_ref()
    }

    /// Current progressive anti-aliasing pass.
    pub fn progressive_aa_pass_index(&self) -> u32 {
        self.progressive_aa_pass_index
    }

    /// Moves to the next progressive pass when the layer still has one
    /// below `max_passes`. Returns whether it advanced.
    pub fn advance_progressive_aa(&mut self, max_passes: u32) -> bool {
        let limit = self
            .result
            .as_ref()
            .map_or(0, |r| r.max_aa_pass_index)
            .min(max_passes);
        if self.progressive_aa_pass_index < limit {
            self.progressive_aa_pass_index += 1;
            true
        } else {
            false
        }
    }

    fn prepare(
        &mut self,
        graph: &mut SceneGraph,
        presentation: Rect,
        ctx: &mut PrepareContext<'_, '_>,
    ) -> LayerRenderPreparationResult {
        self.opaque.clear();
        self.transparent.clear();
        self.node_light_overflow_logged = false;
        let nodes_changed = graph.calculate_global_variables(self.layer);

        let Some(layer_node) = graph.node(self.layer) else {
            return LayerRenderPreparationResult::empty(self.layer, presentation);
        };
        let Some(layer) = layer_node.as_layer().cloned() else {
            return LayerRenderPreparationResult::empty(self.layer, presentation);
        };
        let layer_active = layer_node.is_globally_active();
        let layer_changed = layer_node.changed();

        let viewport = layer.placement.viewport(&presentation);
        let mut result = LayerRenderPreparationResult {
            layer: self.layer,
            viewport,
            scissor: viewport.intersection(&presentation),
            presentation_viewport: presentation,
            camera: None,
            flags: LayerPreparationFlags::NONE,
            max_aa_pass_index: layer.progressive_aa.max_aa_pass_index(),
        };
        result
            .flags
            .set(LayerPreparationFlags::LAYER_DATA_DIRTY, layer_changed);
        if !layer_active || !result.is_visible() {
            return result;
        }

        let mut was_dirty = nodes_changed || self.last_viewport != Some(viewport);
        self.last_viewport = Some(viewport);

        let generation = graph.structure_generation();
        if self.structure_generation != Some(generation) {
            self.rebuild_node_lists(graph);
            self.structure_generation = Some(generation);
            was_dirty = true;
        }

        was_dirty |= self.collect_lights(graph, ctx.settings);
        was_dirty |= self.update_features(graph, &layer, ctx);

        let camera = self.select_camera(graph, &layer, &viewport);
        let camera_id = camera.map(|(id, _)| id);
        was_dirty |= self.last_camera != camera_id;
        self.last_camera = camera_id;
        self.camera_frame = camera.map(|(_, frame)| frame);
        result.camera = camera_id;

        match camera {
            Some((_, frame)) => {
                let feature_hash = self.features.hash_value();
                let mut batch = Batch {
                    camera: &frame,
                    feature_hash,
                    objects: Vec::new(),
                    used_materials: AHashSet::new(),
                    requires_stencil: false,
                };
                self.prepare_renderables(graph, &mut batch, ctx);
                was_dirty |= batch
                    .objects
                    .iter()
                    .any(|o| o.flags.contains(RenderableFlags::DIRTY));
                result.flags.set(
                    LayerPreparationFlags::REQUIRES_STENCIL_BUFFER,
                    batch.requires_stencil,
                );
                for id in &batch.used_materials {
                    if let Some(material) = graph.materials.get_mut(*id) {
                        material.clear_dirty();
                    }
                }
                self.bucket(batch.objects, layer.enable_depth_test, ctx.frame);
            }
            None => {
                if !self.missing_camera_logged {
                    log::warn!(
                        "Layer {:?} has no usable camera, nothing will be drawn",
                        self.layer
                    );
                    self.missing_camera_logged = true;
                }
            }
        }

        let ssao = layer.ssao_enabled();
        let flags = &mut result.flags;
        flags.set(LayerPreparationFlags::WAS_DIRTY, was_dirty);
        flags.set(
            LayerPreparationFlags::REQUIRES_DEPTH_TEXTURE,
            ssao || layer.ssdo_enabled(),
        );
        flags.set(LayerPreparationFlags::REQUIRES_SSAO_PASS, ssao);
        flags.set(
            LayerPreparationFlags::SHOULD_RENDER_TO_TEXTURE,
            layer.should_render_to_texture(),
        );

        if was_dirty {
            self.progressive_aa_pass_index = 0;
        }
        log::trace!(
            "Prepared layer {:?}: {} opaque, {} transparent, dirty: {}",
            self.layer,
            self.opaque.len(),
            self.transparent.len(),
            was_dirty
        );
        result
    }

    fn rebuild_node_lists(&mut self, graph: &SceneGraph) {
        self.renderable_nodes.clear();
        self.camera_and_light_nodes.clear();
        for id in graph.depth_first(self.layer).into_iter().skip(1) {
            let Some(node) = graph.node(id) else { continue };
            match node.kind {
                NodeKind::Model(_) | NodeKind::Text(_) | NodeKind::Path(_) => {
                    self.renderable_nodes.push(id)
                }
                NodeKind::Camera(_) | NodeKind::Light(_) => self.camera_and_light_nodes.push(id),
                NodeKind::Group | NodeKind::Layer(_) => {}
            }
        }
        self.renderable_nodes.reverse();
        self.camera_and_light_nodes.reverse();
        self.light_scopes.rebuild(graph, self.layer);
        log::debug!(
            "Rebuilt node lists of layer {:?}: {} renderables, {} cameras and lights",
            self.layer,
            self.renderable_nodes.len(),
            self.camera_and_light_nodes.len()
        );
    }

    /// Returns whether the set of lights or their scoping changed.
    fn collect_lights(&mut self, graph: &SceneGraph, settings: &RendererSettings) -> bool {
        let previous = std::mem::take(&mut self.lights);
        self.global_lights.clear();
        self.light_directions.clear();

        let mut scoped = Vec::new();
        for &id in self.camera_and_light_nodes.iter().rev() {
            let Some(node) = graph.node(id) else { continue };
            let Some(light) = node.as_light() else { continue };
            self.light_directions.push(node.global_direction());
            if !node.is_globally_active() {
                continue;
            }
            self.lights.push(id);
            scoped.push((id, light.scope));
            if light.scope.is_none() {
                self.global_lights.push(id);
            }
        }

        let max_lights = settings.effective_max_lights() as usize;
        if self.global_lights.len() > max_lights && !self.light_overflow_logged {
            log::error!(
                "Layer {:?} has {} lights, only the first {} are used",
                self.layer,
                self.global_lights.len(),
                max_lights
            );
            self.light_overflow_logged = true;
        }

        let scopes_changed = self.light_scopes.update(&scoped);
        scopes_changed || previous != self.lights
    }

    /// Returns whether the features or the probe textures changed.
    fn update_features(
        &mut self,
        graph: &mut SceneGraph,
        layer: &LayerNode,
        ctx: &mut PrepareContext<'_, '_>,
    ) -> bool {
        let scale = ctx.presentation_scale;
        let probe = layer
            .light_probe
            .and_then(|id| ensure_texture(&mut graph.images, id, false, ctx.collaborators, scale));
        let probe2 = match (probe, layer.light_probe2) {
            (Some(_), Some(id)) => {
                ensure_texture(&mut graph.images, id, false, ctx.collaborators, scale)
            }
            _ => None,
        };
        let reloaded = probe.is_some_and(|(_, r)| r) || probe2.is_some_and(|(_, r)| r);
        self.layer_has_probe = probe.is_some();

        self.features
            .set(features::CG_LIGHTING, !self.lights.is_empty());
        self.features.set(features::LIGHT_PROBE, probe.is_some());
        self.features.set(features::LIGHT_PROBE_2, probe2.is_some());
        self.features.set(
            features::IBL_FOV,
            probe.is_some() && layer.probe_fov < 180.0,
        );
        self.features.set(features::SSAO, layer.ssao_enabled());
        self.features.set(features::SSDO, layer.ssdo_enabled());
        self.features.set(features::SSM, false);

        let hash = self.features.hash_value();
        let changed = self.last_feature_hash != Some(hash);
        self.last_feature_hash = Some(hash);
        changed || reloaded
    }

    fn select_camera(
        &self,
        graph: &SceneGraph,
        layer: &LayerNode,
        viewport: &Rect,
    ) -> Option<(NodeId, CameraFrame)> {
        let usable = |id: NodeId| {
            let node = graph.node(id)?;
            if !node.is_globally_active() {
                return None;
            }
            let frame = node
                .as_camera()?
                .frame_state(node.global_transform(), viewport)?;
            Some((id, frame))
        };
        if let Some(camera) = layer.camera.and_then(usable) {
            return Some(camera);
        }
        self.camera_and_light_nodes
            .iter()
            .rev()
            .find_map(|&id| usable(id))
    }

    /// Lights affecting `node`: unscoped lights first, then the lights
    /// scoped to one of its ancestors, capped at the key limit.
    fn node_lights(
        &mut self,
        graph: &SceneGraph,
        node: NodeId,
        max_lights: usize,
    ) -> (Vec<NodeId>, Vec<LightProperties>) {
        let mut ids: Vec<NodeId> = self
            .global_lights
            .iter()
            .chain(self.light_scopes.lights_for(node))
            .copied()
            .collect();
        // Global overflow is already reported by `collect_lights`.
        if ids.len() > max_lights
            && self.global_lights.len() <= max_lights
            && !self.node_light_overflow_logged
        {
            log::error!(
                "Node {:?} of layer {:?} is reached by {} lights, only the first {} are used",
                node,
                self.layer,
                ids.len(),
                max_lights
            );
            self.node_light_overflow_logged = true;
        }
        ids.truncate(max_lights);
        let properties = ids
            .iter()
            .filter_map(|&id| graph.node(id)?.as_light().map(|l| l.properties))
            .collect();
        (ids, properties)
    }

    fn prepare_renderables(
        &mut self,
        graph: &mut SceneGraph,
        batch: &mut Batch<'_>,
        ctx: &mut PrepareContext<'_, '_>,
    ) {
        let nodes = std::mem::take(&mut self.renderable_nodes);
        for &id in &nodes {
            let Some(node) = graph.node(id) else { continue };
            if !node.is_globally_active() {
                continue;
            }
            let info = NodeInfo {
                id,
                transform: *node.global_transform(),
                opacity: node.global_opacity(),
                pickable: node.pickable,
                changed: node.changed(),
            };
            match node.kind.clone() {
                NodeKind::Model(model) => self.prepare_model(graph, &info, &model, batch, ctx),
                NodeKind::Text(text) => self.prepare_text(&info, &text, batch, ctx),
                NodeKind::Path(path) => self.prepare_path(graph, &info, &path, batch, ctx),
                _ => {}
            }
        }
        self.renderable_nodes = nodes;
    }

    fn prepare_model(
        &mut self,
        graph: &mut SceneGraph,
        info: &NodeInfo,
        model: &ModelNode,
        batch: &mut Batch<'_>,
        ctx: &mut PrepareContext<'_, '_>,
    ) {
        let Some(mesh) = ctx.collaborators.buffer_manager.load_mesh(&model.mesh_path) else {
            if self.logged_meshes.insert(model.mesh_path.clone()) {
                log::warn!(
                    "Failed to load mesh '{}' of node {:?}",
                    model.mesh_path,
                    info.id
                );
            }
            return;
        };

        let max_lights = ctx.settings.effective_max_lights() as usize;
        let (light_ids, lights) = self.node_lights(graph, info.id, max_lights);
        let lighting = LightingInputs {
            feature_set_hash: batch.feature_hash,
            lights: &lights,
            layer_has_probe: self.layer_has_probe,
            presentation_scale: ctx.presentation_scale,
        };

        for (index, source) in mesh.subsets.iter().enumerate() {
            let Some(material_id) = model.material_for_subset(index) else {
                continue;
            };
            let depth = ctx.settings.max_material_reference_depth;
            let resolved = match resolve_material(&graph.materials, material_id, depth) {
                Ok(resolved) => resolved,
                Err(err) => {
                    self.report_material(material_id, err);
                    continue;
                }
            };
            batch.used_materials.insert(resolved.id);
            batch.used_materials.extend(resolved.via.iter().copied());

            let subset = tessellated_subset(source, model, ctx.settings.wireframe_mode);
            let materials = &graph.materials;
            let images = &mut graph.images;
            let (prepared, custom, system_dirty) = match materials.get(resolved.id) {
                Some(Material::Default(material)) => {
                    let prepared = prepare_default_material(
                        material,
                        info.opacity,
                        &lighting,
                        images,
                        ctx.collaborators,
                        &mut ctx.frame.images,
                    );
                    (prepared, false, false)
                }
                Some(Material::Custom(material)) => {
                    if ctx.collaborators.custom_materials.is_none() {
                        self.report_missing(Service::CustomMaterials);
                        continue;
                    }
                    let prepared = prepare_custom_material(
                        material,
                        info.opacity,
                        &lighting,
                        images,
                        ctx.collaborators,
                        &mut ctx.frame.images,
                    );
                    let system_dirty = ctx
                        .collaborators
                        .custom_materials
                        .as_deref_mut()
                        .is_some_and(|system| {
                            system.prepare_for_render(model, &subset, material, true)
                        });
                    (prepared, true, system_dirty)
                }
                _ => continue,
            };

            let mut shader_key = prepared.shader_key;
            let skinned = subset.joint_count > 0;
            shader_key.set_tessellation(model.tessellation);
            shader_key.set_wireframe(subset.wireframe);
            shader_key.set_skinning(skinned);

            let mut flags = prepared.flags;
            flags.set(RenderableFlags::SKINNED, skinned);
            flags.set(RenderableFlags::LIT, shader_key.has_lighting());

            let bounds = subset.bounds;
            let kind = if custom {
                RenderableKind::CustomMaterial(CustomMaterialRenderable {
                    subset,
                    material: resolved.id,
                    shader_key,
                    first_image: prepared.first_image,
                    lights: light_ids.clone(),
                })
            } else {
                RenderableKind::Subset(SubsetRenderable {
                    subset,
                    material: resolved.id,
                    shader_key,
                    first_image: prepared.first_image,
                    lights: light_ids.clone(),
                })
            };
            let drawable = Drawable {
                bounds,
                opacity: prepared.opacity,
                flags,
                dirty: prepared.dirty || resolved.references_dirty || system_dirty,
                kind,
            };
            batch.push(info, drawable, ctx.settings);
        }
    }

    fn prepare_text(
        &mut self,
        info: &NodeInfo,
        text: &TextNode,
        batch: &mut Batch<'_>,
        ctx: &mut PrepareContext<'_, '_>,
    ) {
        let Some(renderer) = ctx.collaborators.text.as_deref_mut() else {
            self.report_missing(Service::Text);
            return;
        };
        let scale = ctx.presentation_scale;
        let Some(rendered) = renderer.render_text(text, scale.x.max(scale.y)) else {
            return;
        };

        let (offset, half) = (rendered.text_offset, rendered.text_scale);
        let bounds = Aabb::from_min_max(
            Vec3::new(offset.x - half.x, offset.y - half.y, 0.0),
            Vec3::new(offset.x + half.x, offset.y + half.y, 0.0),
        );
        let drawable = Drawable {
            bounds,
            opacity: info.opacity * text.color.a,
            flags: RenderableFlags::HAS_TRANSPARENCY | RenderableFlags::PICKABLE,
            dirty: false,
            kind: RenderableKind::Text(TextRenderable {
                texture: rendered.texture,
                text_scale: half,
                text_offset: offset,
            }),
        };
        batch.push(info, drawable, ctx.settings);
    }

    fn prepare_path(
        &mut self,
        graph: &mut SceneGraph,
        info: &NodeInfo,
        path: &PathNode,
        batch: &mut Batch<'_>,
        ctx: &mut PrepareContext<'_, '_>,
    ) {
        let Some(paths) = ctx.collaborators.paths.as_deref_mut() else {
            self.report_missing(Service::Paths);
            return;
        };
        let path_dirty = paths.prepare_for_render(info.id, path);
        let bounds = paths.bounds(info.id, path);
        let painted = path.path_type == PathType::Painted;
        batch.requires_stencil |= painted;

        let max_lights = ctx.settings.effective_max_lights() as usize;
        let (_, lights) = self.node_lights(graph, info.id, max_lights);
        let lighting = LightingInputs {
            feature_set_hash: batch.feature_hash,
            lights: &lights,
            layer_has_probe: self.layer_has_probe,
            presentation_scale: ctx.presentation_scale,
        };

        for (is_stroke, material) in path.passes() {
            let Some(material_id) = material else { continue };
            let depth = ctx.settings.max_material_reference_depth;
            let resolved = match resolve_material(&graph.materials, material_id, depth) {
                Ok(resolved) => resolved,
                Err(err) => {
                    self.report_material(material_id, err);
                    continue;
                }
            };
            let Some(Material::Default(material)) = graph.materials.get(resolved.id) else {
                log::debug!("Path {:?} needs a built-in material", info.id);
                continue;
            };
            batch.used_materials.insert(resolved.id);
            batch.used_materials.extend(resolved.via.iter().copied());

            let prepared = prepare_default_material(
                material,
                info.opacity,
                &lighting,
                &mut graph.images,
                ctx.collaborators,
                &mut ctx.frame.images,
            );
            let mut flags = prepared.flags;
            flags.set(RenderableFlags::LIT, prepared.shader_key.has_lighting());
            let drawable = Drawable {
                bounds,
                opacity: prepared.opacity,
                flags,
                dirty: prepared.dirty || path_dirty || resolved.references_dirty,
                kind: RenderableKind::Path(PathRenderable {
                    is_stroke,
                    painted,
                    material: resolved.id,
                    shader_key: prepared.shader_key,
                    first_image: prepared.first_image,
                }),
            };
            batch.push(info, drawable, ctx.settings);
        }
    }

    /// Splits the renderables into the two draw lists and sorts them.
    fn bucket(
        &mut self,
        objects: Vec<RenderableObject>,
        depth_test: bool,
        frame: &mut FrameAllocator,
    ) {
        let mut opaque = Vec::new();
        let mut transparent = Vec::new();
        for object in objects {
            let distance = object.camera_distance;
            let blended = !depth_test || object.flags.has_transparency();
            let handle = frame.renderables.alloc(object);
            if blended {
                transparent.push((distance, handle));
            } else {
                opaque.push((distance, handle));
            }
        }
        opaque.sort_by(|a, b| a.0.total_cmp(&b.0));
        transparent.sort_by(|a, b| b.0.total_cmp(&a.0));
        self.opaque.extend(opaque.into_iter().map(|(_, h)| h));
        self.transparent.extend(transparent.into_iter().map(|(_, h)| h));
    }

    fn report_material(&mut self, id: MaterialId, err: MaterialResolveError) {
        match err {
            MaterialResolveError::Missing(_) => {
                log::debug!("Layer {:?}: {}", self.layer, err);
            }
            MaterialResolveError::Cycle(_) | MaterialResolveError::TooDeep(_) => {
                if self.logged_materials.insert(id) {
                    log::warn!("Layer {:?}: skipping material {:?}: {}", self.layer, id, err);
                }
            }
        }
    }

    fn report_missing(&mut self, service: Service) {
        if self.logged_services.insert(service) {
            log::warn!(
                "Layer {:?} has nodes that need a {}, none was provided",
                self.layer,
                service.name()
            );
        }
    }
}
