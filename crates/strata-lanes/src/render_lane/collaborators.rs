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

//! Collaborators the render lane calls into while preparing a layer.
//!
//! Mesh and texture loading, offscreen textures and shader compilation are
//! defined in `strata_core::renderer::traits`. The traits here need scene
//! node types and therefore live with the lane.

use strata_core::asset::{CustomMaterial, TextureData};
use strata_core::math::{Aabb, Vec2};
use strata_core::renderer::{BufferManager, OffscreenRenderManager, RenderSubset};
use strata_data::scene::{ModelNode, NodeId, PathNode, TextNode};

/// Runs the command lists of shader-driven materials.
pub trait CustomMaterialSystem {
    /// Prepares `material` for drawing `subset` of `model`. Returns whether
    /// anything the draw depends on changed.
    fn prepare_for_render(
        &mut self,
        model: &ModelNode,
        subset: &RenderSubset,
        material: &CustomMaterial,
        clear_dirty_flags: bool,
    ) -> bool;
}

/// Tessellates paths and tracks their bounds.
pub trait PathManager {
    /// Updates the tessellation of the path on `node`. Returns whether it
    /// changed.
    fn prepare_for_render(&mut self, node: NodeId, path: &PathNode) -> bool;

    /// Object-space bounds of the tessellated path.
    fn bounds(&self, node: NodeId, path: &PathNode) -> Aabb;
}

/// A text block rendered into a texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextTexture {
    /// The texture holding the glyphs.
    pub texture: TextureData,
    /// Half extent of the text quad in object space.
    pub text_scale: Vec2,
    /// Center of the text quad in object space.
    pub text_offset: Vec2,
    /// The texture rows are stored top-down.
    pub flip_y: bool,
}

/// Renders text nodes into textures, caching them by content.
pub trait TextRenderer {
    /// Renders `text` at `scale_factor` pixels per unit. `None` when nothing
    /// could be rendered.
    fn render_text(&mut self, text: &TextNode, scale_factor: f32) -> Option<TextTexture>;
}

/// Everything a layer preparation may call out to. Only the buffer manager
/// is required; nodes needing a missing collaborator are skipped.
pub struct Collaborators<'a> {
    /// Loads meshes and textures.
    pub buffer_manager: &'a mut dyn BufferManager,
    /// Produces textures for images backed by an offscreen renderer.
    pub offscreen: Option<&'a mut dyn OffscreenRenderManager>,
    /// Prepares custom materials.
    pub custom_materials: Option<&'a mut dyn CustomMaterialSystem>,
    /// Tessellates paths.
    pub paths: Option<&'a mut dyn PathManager>,
    /// Renders text.
    pub text: Option<&'a mut dyn TextRenderer>,
}

impl<'a> Collaborators<'a> {
    /// Collaborators with only a buffer manager.
    pub fn new(buffer_manager: &'a mut dyn BufferManager) -> Self {
        Self {
            buffer_manager,
            offscreen: None,
            custom_materials: None,
            paths: None,
            text: None,
        }
    }

    /// Adds an offscreen render manager.
    pub fn with_offscreen(mut self, offscreen: &'a mut dyn OffscreenRenderManager) -> Self {
        self.offscreen = Some(offscreen);
        self
    }

    /// Adds a custom material system.
    pub fn with_custom_materials(mut self, system: &'a mut dyn CustomMaterialSystem) -> Self {
        self.custom_materials = Some(system);
        self
    }

    /// Adds a path manager.
    pub fn with_paths(mut self, paths: &'a mut dyn PathManager) -> Self {
        self.paths = Some(paths);
        self
    }

    /// Adds a text renderer.
    pub fn with_text(mut self, text: &'a mut dyn TextRenderer) -> Self {
        self.text = Some(text);
        self
    }
}
