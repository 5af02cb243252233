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

//! Defines the RenderAgent, the orchestrator of the renderer core.

use super::draw::{DrawCommand, ProgramLookup};
use ahash::AHashMap;
use strata_core::math::{Rect, Vec2};
use strata_core::renderer::{RenderError, RendererSettings, ShaderProgramCache};
use strata_data::allocators::FrameHandle;
use strata_data::scene::{NodeId, SceneGraph};
use strata_lanes::render_lane::{
    Collaborators, FrameAllocator, LayerRenderPreparationData, PrepareContext, RenderableFlags,
    RenderableKind, RenderableObject,
};

/// Key of the render data cache: a layer and the instance it is drawn for.
pub type LayerInstance = (NodeId, u32);

/// The agent responsible for preparing and ordering everything a frame
/// draws.
///
/// Single-threaded: one agent per renderer context, driven by the thread
/// that owns it.
#[derive(Debug, Default)]
pub struct RenderAgent {
    // Tunables shared by every layer.
    settings: RendererSettings,
    // Arenas the renderables of the current frame live in.
    frame: FrameAllocator,
    // Render data per layer instance, created on first use and dropped only
    // on explicit release.
    layers: AHashMap<LayerInstance, LayerRenderPreparationData>,
    // Programs already looked up through the shader cache.
    programs: ProgramLookup,
    // Frames begun since the agent was created.
    frame_count: u64,
}

impl RenderAgent {
    /// An agent with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// An agent with the given settings.
    pub fn with_settings(settings: RendererSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// The active settings.
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// Replaces the settings. Takes effect at the next preparation.
    pub fn set_settings(&mut self, settings: RendererSettings) {
        self.settings = settings;
    }

    /// Starts a new frame: drops every renderable of the previous frame and
    /// forgets all preparations.
    pub fn begin_frame(&mut self) {
        self.frame.reset();
        for data in self.layers.values_mut() {
            data.reset_for_frame();
        }
        self.frame_count += 1;
    }

    /// Frames begun so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Prepares `layer`, and with `render_siblings` every active layer that
    /// follows it among its siblings, for this frame.
    ///
    /// Layers are prepared last to first. Returns whether any of them
    /// changed since its previous preparation.
    pub fn prepare_layer_for_render(
        &mut self,
        graph: &mut SceneGraph,
        layer: NodeId,
        viewport_size: Vec2,
        render_siblings: bool,
        instance: u32,
        collaborators: &mut Collaborators<'_>,
    ) -> Result<bool, RenderError> {
        let layers = layer_run(graph, layer, render_siblings)?;
        let presentation = Rect::from_size(viewport_size);

        let mut was_dirty = false;
        for &id in layers.iter().rev() {
            let data = self
                .layers
                .entry((id, instance))
                .or_insert_with(|| LayerRenderPreparationData::new(id));
            let mut ctx = PrepareContext::new(collaborators, &self.settings, &mut self.frame);
            was_dirty |= data
                .prepare_for_render(graph, presentation, &mut ctx)
                .was_dirty();
        }
        Ok(was_dirty)
    }

    /// Render data of a layer instance.
    pub fn layer_data(
        &self,
        layer: NodeId,
        instance: u32,
    ) -> Option<&LayerRenderPreparationData> {
        self.layers.get(&(layer, instance))
    }

    /// Resolves a renderable handle of the current frame.
    pub fn renderable(&self, handle: FrameHandle<RenderableObject>) -> Option<&RenderableObject> {
        self.frame.renderables.get(handle)
    }

    /// The arenas of the current frame.
    pub fn frame(&self) -> &FrameAllocator {
        &self.frame
    }

    /// Builds the draw list of a prepared layer: opaque objects front to
    /// back, then transparent objects back to front.
    ///
    /// Completely transparent objects are left out, as are objects whose
    /// program failed to compile. Each call advances progressive
    /// anti-aliasing by one pass.
    pub fn render_layer(
        &mut self,
        graph: &SceneGraph,
        layer: NodeId,
        instance: u32,
        shaders: &mut dyn ShaderProgramCache,
    ) -> Result<Vec<DrawCommand>, RenderError> {
        let not_prepared = RenderError::NotPrepared { layer: layer.0 };
        let data = self
            .layers
            .get_mut(&(layer, instance))
            .ok_or_else(|| not_prepared.clone())?;
        let Some(result) = data.result() else {
            return Err(not_prepared);
        };
        if !result.is_visible() {
            return Ok(Vec::new());
        }

        let features = data.features().to_vec();
        let passes = [
            (data.opaque_objects(), false),
            (data.transparent_objects(), true),
        ];
        let mut draws = Vec::with_capacity(passes[0].0.len() + passes[1].0.len());
        for (handles, blended) in passes {
            for &handle in handles {
                let Some(object) = self.frame.renderables.get(handle) else {
                    continue;
                };
                if object.flags.contains(RenderableFlags::COMPLETELY_TRANSPARENT) {
                    continue;
                }
                let program = match &object.kind {
                    RenderableKind::Text(_) => None,
                    _ => {
                        let Some(key) = object.shader_cache_key(&graph.materials, &features)
                        else {
                            continue;
                        };
                        match self.programs.fetch(key, shaders) {
                            Some(program) => Some(program),
                            None => continue,
                        }
                    }
                };
                draws.push(DrawCommand {
                    node: object.node,
                    renderable: handle,
                    program,
                    blended,
                });
            }
        }

        data.advance_progressive_aa(self.settings.max_progressive_aa_passes);
        log::trace!("Layer {:?} issues {} draws", layer, draws.len());
        Ok(draws)
    }

    /// Drops the cached render data of a layer instance. Returns whether
    /// there was any.
    pub fn release_layer_render_resources(&mut self, layer: NodeId, instance: u32) -> bool {
        let released = self.layers.remove(&(layer, instance)).is_some();
        if released {
            log::debug!("Released render data of layer {:?} instance {}", layer, instance);
        }
        released
    }

    /// Number of cached layer instances.
    pub fn cached_layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Number of shader cache keys looked up so far.
    pub fn cached_program_count(&self) -> usize {
        self.programs.len()
    }

    /// Forgets every looked up program, for instance after shaders were
    /// reloaded.
    pub fn invalidate_shader_programs(&mut self) {
        self.programs.clear();
    }
}

/// `layer` followed, when asked, by the active layers after it among its
/// siblings.
pub(crate) fn layer_run(
    graph: &SceneGraph,
    layer: NodeId,
    with_siblings: bool,
) -> Result<Vec<NodeId>, RenderError> {
    let is_layer = |id: NodeId| graph.node(id).is_some_and(|n| n.as_layer().is_some());
    if !is_layer(layer) {
        return Err(RenderError::NotALayer { node: layer.0 });
    }
    let mut run = vec![layer];
    if with_siblings {
        let mut next = graph.next_sibling(layer);
        while let Some(id) = next {
            if is_layer(id) && graph.node(id).is_some_and(|n| n.active) {
                run.push(id);
            }
            next = graph.next_sibling(id);
        }
    }
    Ok(run)
}
