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

//! Per-frame renderable objects.
//!
//! Renderables are created during layer preparation and live in a
//! [`FrameAllocator`] until the next frame begins. They refer back to the
//! persistent scene data by id and carry everything computed for this frame.

use super::flags::RenderableFlags;
use strata_core::asset::{ImageId, Material, MaterialId, TextureData};
use strata_core::math::{Aabb, Mat4, Vec2, Vec3};
use strata_core::renderer::{
    ImageKeyFlags, ImageMapSlot, RenderSubset, ShaderCacheKey, ShaderFeature, ShaderKey,
    TessellationMode,
};
use strata_data::allocators::{FrameArena, FrameHandle};
use strata_data::scene::{MaterialStore, NodeId};

/// A texture resolved for one material slot. Images of a material form a
/// chain through `next`, in slot order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableImage {
    /// The slot the image is bound to.
    pub slot: ImageMapSlot,
    /// The scene image.
    pub image: ImageId,
    /// The loaded texture.
    pub texture: TextureData,
    /// Key bits derived from the image and its texture.
    pub key_flags: ImageKeyFlags,
    /// UV transform.
    pub texture_transform: Mat4,
    /// Next image of the same material.
    pub next: Option<FrameHandle<RenderableImage>>,
}

/// A mesh subset drawn with the built-in material.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsetRenderable {
    /// The draw range, with tessellation applied.
    pub subset: RenderSubset,
    /// The resolved material.
    pub material: MaterialId,
    /// Permutation key of the material.
    pub shader_key: ShaderKey,
    /// Head of the image chain.
    pub first_image: Option<FrameHandle<RenderableImage>>,
    /// Lights reflected in the key, in key order.
    pub lights: Vec<NodeId>,
}

/// A mesh subset drawn with a shader-driven material.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomMaterialRenderable {
    /// The draw range, with tessellation applied.
    pub subset: RenderSubset,
    /// The resolved material.
    pub material: MaterialId,
    /// Permutation key of the material.
    pub shader_key: ShaderKey,
    /// Head of the image chain.
    pub first_image: Option<FrameHandle<RenderableImage>>,
    /// Lights reflected in the key, in key order.
    pub lights: Vec<NodeId>,
}

/// One pass of a path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathRenderable {
    /// Outline pass when `true`, interior pass otherwise.
    pub is_stroke: bool,
    /// Painted paths go through the stencil buffer.
    pub painted: bool,
    /// The resolved material.
    pub material: MaterialId,
    /// Permutation key of the material.
    pub shader_key: ShaderKey,
    /// Head of the image chain.
    pub first_image: Option<FrameHandle<RenderableImage>>,
}

/// A text block rendered into a texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextRenderable {
    /// The glyph texture.
    pub texture: TextureData,
    /// Half extent of the text quad.
    pub text_scale: Vec2,
    /// Center of the text quad.
    pub text_offset: Vec2,
}

/// What a renderable draws.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderableKind {
    /// Built-in material mesh subset.
    Subset(SubsetRenderable),
    /// Custom material mesh subset.
    CustomMaterial(CustomMaterialRenderable),
    /// Path pass.
    Path(PathRenderable),
    /// Text quad.
    Text(TextRenderable),
}

/// An object ready to be sorted, drawn and picked.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableObject {
    /// The scene node the object was produced from.
    pub node: NodeId,
    /// State flags.
    pub flags: RenderableFlags,
    /// Object-space bounds.
    pub bounds: Aabb,
    /// Object to world transform.
    pub global_transform: Mat4,
    /// World-space center of the bounds.
    pub world_center: Vec3,
    /// Object to clip transform.
    pub model_view_projection: Mat4,
    /// Effective opacity: node, material, and culling.
    pub opacity: f32,
    /// Signed distance of the center along the camera direction.
    pub camera_distance: f32,
    /// The drawable.
    pub kind: RenderableKind,
}

impl RenderableObject {
    /// The shader key of the object, if it is drawn with a generated
    /// program.
    pub fn shader_key(&self) -> Option<&ShaderKey> {
        match &self.kind {
            RenderableKind::Subset(s) => Some(&s.shader_key),
            RenderableKind::CustomMaterial(c) => Some(&c.shader_key),
            RenderableKind::Path(p) => Some(&p.shader_key),
            RenderableKind::Text(_) => None,
        }
    }

    /// The material the object is drawn with.
    pub fn material(&self) -> Option<MaterialId> {
        match &self.kind {
            RenderableKind::Subset(s) => Some(s.material),
            RenderableKind::CustomMaterial(c) => Some(c.material),
            RenderableKind::Path(p) => Some(p.material),
            RenderableKind::Text(_) => None,
        }
    }

    /// Head of the image chain.
    pub fn first_image(&self) -> Option<FrameHandle<RenderableImage>> {
        match &self.kind {
            RenderableKind::Subset(s) => s.first_image,
            RenderableKind::CustomMaterial(c) => c.first_image,
            RenderableKind::Path(p) => p.first_image,
            RenderableKind::Text(_) => None,
        }
    }

    /// The key selecting the compiled program for this object. `None` for
    /// text, which the text renderer draws itself, and for custom
    /// materials that are no longer in the store.
    pub fn shader_cache_key(
        &self,
        materials: &MaterialStore,
        features: &[ShaderFeature],
    ) -> Option<ShaderCacheKey> {
        let (material_path, material_define, subset) = match &self.kind {
            RenderableKind::Subset(s) => (String::new(), String::new(), Some(&s.subset)),
            RenderableKind::CustomMaterial(c) => match materials.get(c.material)? {
                Material::Custom(custom) => (
                    custom.shader_path.clone(),
                    custom.shader_define.clone(),
                    Some(&c.subset),
                ),
                _ => return None,
            },
            RenderableKind::Path(p) => {
                let define = if p.painted { "painted" } else { "geometry" };
                ("path".to_owned(), define.to_owned(), None)
            }
            RenderableKind::Text(_) => return None,
        };
        let material_key = *self.shader_key()?;
        Some(ShaderCacheKey {
            material_path,
            material_define,
            features: features.to_vec(),
            tess_mode: material_key.tessellation(),
            wireframe: subset.is_some_and(|s| s.wireframe),
            material_key,
        })
    }

    /// Tessellation mode the object is drawn with.
    pub fn tessellation(&self) -> TessellationMode {
        self.shader_key()
            .map_or(TessellationMode::None, ShaderKey::tessellation)
    }
}

/// The per-frame arenas renderables and their image chains live in.
#[derive(Debug, Default)]
pub struct FrameAllocator {
    /// Renderable objects of every prepared layer.
    pub renderables: FrameArena<RenderableObject>,
    /// Image chains of those objects.
    pub images: FrameArena<RenderableImage>,
}

impl FrameAllocator {
    /// Creates empty arenas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops everything allocated this frame. Handles handed out before
    /// stop resolving.
    pub fn reset(&mut self) {
        self.renderables.reset();
        self.images.reset();
    }

    /// Follows an image chain from its head.
    pub fn image_chain(
        &self,
        first: Option<FrameHandle<RenderableImage>>,
    ) -> impl Iterator<Item = &RenderableImage> + '_ {
        let mut next = first;
        std::iter::from_fn(move || {
            let image = self.images.get(next?)?;
            next = image.next;
            Some(image)
        })
    }
}
