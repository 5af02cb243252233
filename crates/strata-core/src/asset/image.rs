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

//! Image assets sampled by materials.
//!
//! An [`Image`] describes *how* a texture is mapped onto a surface; the
//! texture itself is produced lazily by the buffer manager (or an offscreen
//! renderer) and cached on the image as [`TextureData`].

use crate::math::{Mat4, Quaternion, Vec2, Vec3};
use crate::renderer::enums::{TextureFormat, TextureSwizzleMode};
use serde::{Deserialize, Serialize};

/// Index of an [`Image`] in its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageId(pub u32);

/// An opaque handle to a GPU texture owned by the buffer manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureHandle(pub u64);

/// How an image is projected onto a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MappingMode {
    /// Regular UV mapping.
    #[default]
    Normal,
    /// Spherical environment reflection.
    Environment,
    /// Image-based lighting probe.
    LightProbe,
}

/// Properties of a loaded texture that influence shader generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureFlags {
    bits: u32,
}

impl TextureFlags {
    /// No flags.
    pub const NONE: Self = Self { bits: 0 };
    /// At least one texel is not fully opaque.
    pub const HAS_TRANSPARENCY: Self = Self { bits: 1 << 0 };
    /// The texture rows are stored bottom-up and UVs must be flipped.
    pub const INVERT_UV: Self = Self { bits: 1 << 1 };
    /// Color channels are premultiplied by alpha.
    pub const PRE_MULTIPLIED: Self = Self { bits: 1 << 2 };

    /// Creates flags from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks whether every bit of `other` is set.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Checks if no flag is set.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl std::ops::BitOr for TextureFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for TextureFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// A texture as returned by the buffer manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureData {
    /// The GPU texture.
    pub handle: TextureHandle,
    /// Pixel format of the texture.
    pub format: TextureFormat,
    /// Transparency / orientation flags.
    pub flags: TextureFlags,
}

impl TextureData {
    /// Whether the texture needs blending.
    #[inline]
    pub fn has_transparency(&self) -> bool {
        self.flags.contains(TextureFlags::HAS_TRANSPARENCY)
    }

    /// The channel remapping a shader needs to sample this format.
    pub fn swizzle_mode(&self) -> TextureSwizzleMode {
        match self.format {
            TextureFormat::Luminance8 => TextureSwizzleMode::L8ToR8,
            TextureFormat::Alpha8 => TextureSwizzleMode::A8ToR8,
            TextureFormat::LuminanceAlpha8 => TextureSwizzleMode::L8A8ToRg8,
            _ => TextureSwizzleMode::NoSwizzle,
        }
    }
}

/// A texture reference with its placement on the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    /// Path the buffer manager loads the texture from.
    pub image_path: String,
    /// When set, the texture is produced by this offscreen renderer instead.
    pub offscreen_renderer_id: Option<String>,
    /// Projection of the image.
    pub mapping_mode: MappingMode,
    /// UV scale.
    pub scale: Vec2,
    /// UV offset.
    pub position: Vec2,
    /// UV rotation, in degrees.
    pub rotation_uv: f32,
    /// UV pivot.
    pub pivot: Vec2,
    /// Loaded texture, if any.
    pub texture_data: Option<TextureData>,
    /// Set when the path or any mapping parameter changed.
    pub dirty: bool,
}

impl Image {
    /// A dirty image pointing at `path`, not yet loaded.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            image_path: path.into(),
            offscreen_renderer_id: None,
            mapping_mode: MappingMode::Normal,
            scale: Vec2::ONE,
            position: Vec2::ZERO,
            rotation_uv: 0.0,
            pivot: Vec2::ZERO,
            texture_data: None,
            dirty: true,
        }
    }

    /// The UV transform derived from scale, position, pivot and rotation.
    pub fn texture_transform(&self) -> Mat4 {
        let pivot = Vec3::new(self.pivot.x, self.pivot.y, 0.0);
        let rotation = Quaternion::from_axis_angle(Vec3::Z, self.rotation_uv.to_radians());
        Mat4::from_translation(Vec3::new(self.position.x, self.position.y, 0.0))
            * Mat4::from_translation(pivot)
            * Mat4::from_quat(rotation)
            * Mat4::from_scale(Vec3::new(self.scale.x, self.scale.y, 1.0))
            * Mat4::from_translation(-pivot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::approx_eq;

    #[test]
    fn test_texture_flags() {
        let flags = TextureFlags::HAS_TRANSPARENCY | TextureFlags::INVERT_UV;
        assert!(flags.contains(TextureFlags::INVERT_UV));
        assert!(!flags.contains(TextureFlags::PRE_MULTIPLIED));
        assert!(TextureFlags::NONE.is_empty());
    }

    #[test]
    fn test_swizzle_follows_format() {
        let mut tex = TextureData {
            format: TextureFormat::Luminance8,
            ..Default::default()
        };
        assert_eq!(tex.swizzle_mode(), TextureSwizzleMode::L8ToR8);
        tex.format = TextureFormat::Rgba8;
        assert_eq!(tex.swizzle_mode(), TextureSwizzleMode::NoSwizzle);
    }

    #[test]
    fn test_texture_transform_scales_around_pivot() {
        let mut image = Image::new("maps/brick.png");
        image.scale = Vec2::new(2.0, 2.0);
        image.pivot = Vec2::new(0.5, 0.5);
        let p = image.texture_transform().transform_point(Vec3::new(0.5, 0.5, 0.0));
        assert!(approx_eq(p.x, 0.5));
        assert!(approx_eq(p.y, 0.5));
        let p = image.texture_transform().transform_point(Vec3::new(1.0, 0.5, 0.0));
        assert!(approx_eq(p.x, 1.5));
    }
}
