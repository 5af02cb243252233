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

//! Material definitions consumed by the preparation pipeline.
//!
//! A scene node refers to materials by [`MaterialId`]. A material is one of
//! three closed variants: the built-in [`DefaultMaterial`], a shader-driven
//! [`CustomMaterial`], or a [`ReferencedMaterial`] that forwards to another
//! material (and may, in broken content, form a cycle).

use super::image::ImageId;
use crate::math::{LinearRgba, Vec3};
use crate::renderer::shader_key::ImageMapSlot;
use serde::{Deserialize, Serialize};

/// Index of a [`Material`] in its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

/// Where lighting is evaluated for a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MaterialLighting {
    /// Unlit.
    NoLighting,
    /// Per-vertex lighting.
    VertexLighting,
    /// Per-fragment lighting.
    #[default]
    FragmentLighting,
}

/// How a material is composited over what is already drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// Regular alpha blending.
    #[default]
    Normal,
    /// Screen blending.
    Screen,
    /// Multiply blending.
    Multiply,
    /// Overlay blending.
    Overlay,
    /// Color burn.
    ColorBurn,
    /// Color dodge.
    ColorDodge,
}

/// Specular reflection model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum SpecularModel {
    /// Blinn-Phong style highlight.
    #[default]
    Default = 0,
    /// GGX microfacet model.
    KGgx = 1,
    /// Ward anisotropic model.
    KWard = 2,
}

/// The built-in physically-inspired material.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultMaterial {
    /// Lighting evaluation mode.
    pub lighting: MaterialLighting,
    /// Composition mode.
    pub blend_mode: BlendMode,
    /// Base color.
    pub diffuse_color: LinearRgba,
    /// Emissive color.
    pub emissive_color: Vec3,
    /// Emissive strength.
    pub emissive_power: f32,
    /// Tint applied to specular reflections.
    pub specular_tint: LinearRgba,
    /// Strength of specular reflections. At or below `0.01` specular is off.
    pub specular_amount: f32,
    /// Surface roughness.
    pub specular_roughness: f32,
    /// Specular model.
    pub specular_model: SpecularModel,
    /// Fresnel exponent; `0` disables fresnel.
    pub fresnel_power: f32,
    /// Index of refraction.
    pub ior: f32,
    /// Material opacity, multiplied into the node's global opacity.
    pub opacity: f32,
    /// Bump map strength.
    pub bump_amount: f32,
    /// Displacement map strength.
    pub displace_amount: f32,
    /// Translucency falloff.
    pub translucent_falloff: f32,
    /// Diffuse light wrap.
    pub diffuse_light_wrap: f32,
    /// Multiply the diffuse color by the mesh's vertex colors.
    pub vertex_colors: bool,
    /// Texture maps, one per [`ImageMapSlot`].
    pub maps: [Option<ImageId>; ImageMapSlot::COUNT],
    /// Per-material light probe overriding the layer's.
    pub light_probe: Option<ImageId>,
    /// Set whenever a property changed since the last preparation.
    pub dirty: bool,
}

impl DefaultMaterial {
    /// The texture bound to `slot`.
    #[inline]
    pub fn map(&self, slot: ImageMapSlot) -> Option<ImageId> {
        self.maps[slot as usize]
    }

    /// Binds (or unbinds) a texture and marks the material dirty.
    pub fn set_map(&mut self, slot: ImageMapSlot, image: Option<ImageId>) {
        self.maps[slot as usize] = image;
        self.dirty = true;
    }

    /// Whether specular reflections contribute at all.
    #[inline]
    pub fn is_specular_enabled(&self) -> bool {
        self.specular_amount > 0.01
    }

    /// Whether the fresnel term contributes at all.
    #[inline]
    pub fn is_fresnel_enabled(&self) -> bool {
        self.fresnel_power > 0.0
    }
}

impl Default for DefaultMaterial {
    fn default() -> Self {
        Self {
            lighting: MaterialLighting::FragmentLighting,
            blend_mode: BlendMode::Normal,
            diffuse_color: LinearRgba::WHITE,
            emissive_color: Vec3::ONE,
            emissive_power: 0.0,
            specular_tint: LinearRgba::WHITE,
            specular_amount: 0.0,
            specular_roughness: 0.0,
            specular_model: SpecularModel::Default,
            fresnel_power: 0.0,
            ior: 0.2,
            opacity: 1.0,
            bump_amount: 0.0,
            displace_amount: 0.0,
            translucent_falloff: 0.0,
            diffuse_light_wrap: 0.0,
            vertex_colors: false,
            maps: [None; ImageMapSlot::COUNT],
            light_probe: None,
            dirty: true,
        }
    }
}

/// A material whose shading is provided by an external shader.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomMaterial {
    /// Path of the shader source, part of the program cache key.
    pub shader_path: String,
    /// Preprocessor defines of the shader, part of the program cache key.
    pub shader_define: String,
    /// Lighting evaluation mode.
    pub lighting: MaterialLighting,
    /// The shader blends with what is behind it.
    pub has_transparency: bool,
    /// The shader samples the already rendered scene.
    pub has_refraction: bool,
    /// Re-prepare every frame, regardless of `dirty`.
    pub always_dirty: bool,
    /// Displacement map.
    pub displacement_map: Option<ImageId>,
    /// Indirect lightmap.
    pub lightmap_indirect: Option<ImageId>,
    /// Radiance lightmap.
    pub lightmap_radiance: Option<ImageId>,
    /// Shadow lightmap.
    pub lightmap_shadow: Option<ImageId>,
    /// Per-material light probe overriding the layer's.
    pub light_probe: Option<ImageId>,
    /// Set whenever a property changed since the last preparation.
    pub dirty: bool,
}

impl CustomMaterial {
    /// A dirty material using the shader at `path`.
    pub fn new(shader_path: impl Into<String>) -> Self {
        Self {
            shader_path: shader_path.into(),
            shader_define: String::new(),
            lighting: MaterialLighting::FragmentLighting,
            has_transparency: false,
            has_refraction: false,
            always_dirty: false,
            displacement_map: None,
            lightmap_indirect: None,
            lightmap_radiance: None,
            lightmap_shadow: None,
            light_probe: None,
            dirty: true,
        }
    }
}

/// A material that forwards to another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReferencedMaterial {
    /// The material this one stands for.
    pub referenced: Option<MaterialId>,
    /// Set when the reference changed.
    pub dirty: bool,
}

/// Any material a subset can be drawn with.
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    /// The built-in material.
    Default(DefaultMaterial),
    /// A shader-driven material.
    Custom(CustomMaterial),
    /// An indirection to another material.
    Referenced(ReferencedMaterial),
}

impl Material {
    /// Whether the material changed since it was last prepared.
    pub fn is_dirty(&self) -> bool {
        match self {
            Material::Default(m) => m.dirty,
            Material::Custom(m) => m.dirty || m.always_dirty,
            Material::Referenced(m) => m.dirty,
        }
    }

    /// Marks the material as prepared.
    pub fn clear_dirty(&mut self) {
        match self {
            Material::Default(m) => m.dirty = false,
            Material::Custom(m) => m.dirty = false,
            Material::Referenced(m) => m.dirty = false,
        }
    }
}

impl From<DefaultMaterial> for Material {
    fn from(value: DefaultMaterial) -> Self {
        Material::Default(value)
    }
}

impl From<CustomMaterial> for Material {
    fn from(value: CustomMaterial) -> Self {
        Material::Custom(value)
    }
}

impl From<ReferencedMaterial> for Material {
    fn from(value: ReferencedMaterial) -> Self {
        Material::Referenced(value)
    }
}
