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

//! The bit-packed shader permutation key.
//!
//! Every material preparation produces a [`ShaderKey`]: the hash of the
//! layer's feature set plus 256 bits describing lighting, per-light and
//! per-image permutations. Two preparations of the same configuration yield
//! bit-identical keys, which makes the key usable as a program cache key.
//!
//! Each property occupies a fixed bit range described by a [`KeyBits`]:
//!
//! | Property | Bits |
//! |---|---|
//! | lighting, IBL | 1 each |
//! | light count | 3 |
//! | per-light positional / area / shadow | 7 each |
//! | specular, fresnel, vertex colors | 1 each |
//! | specular model | 2 |
//! | per-image flags | 16 × 5 |
//! | per-image swizzle | 16 × 3 |
//! | tessellation | 2 |
//! | wireframe, skinning | 1 each |

use crate::asset::SpecularModel;
use crate::renderer::enums::{TessellationMode, TextureSwizzleMode};

/// Hard cap on lights reflected in a key.
pub const MAX_KEY_LIGHTS: u32 = 7;

const KEY_WORDS: usize = 8;

/// A bit range inside [`ShaderKey::data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBits {
    /// First bit.
    pub offset: u32,
    /// Number of bits, at most 32.
    pub width: u32,
}

impl KeyBits {
    const fn new(offset: u32, width: u32) -> Self {
        Self { offset, width }
    }

    const fn end(self) -> u32 {
        self.offset + self.width
    }

    const fn after(prev: KeyBits, width: u32) -> Self {
        Self::new(prev.end(), width)
    }

    /// The `index`-th element of an array property whose elements are
    /// `self.width` wide.
    const fn element(self, index: u32) -> Self {
        Self::new(self.offset + index * self.width, self.width)
    }

    fn get(self, data: &[u32; KEY_WORDS]) -> u32 {
        let mut value = 0;
        for i in 0..self.width {
            let bit = self.offset + i;
            if data[(bit / 32) as usize] & (1 << (bit % 32)) != 0 {
                value |= 1 << i;
            }
        }
        value
    }

    fn set(self, data: &mut [u32; KEY_WORDS], value: u32) {
        for i in 0..self.width {
            let bit = self.offset + i;
            let word = &mut data[(bit / 32) as usize];
            if value & (1 << i) != 0 {
                *word |= 1 << (bit % 32);
            } else {
                *word &= !(1 << (bit % 32));
            }
        }
    }
}

const HAS_LIGHTING: KeyBits = KeyBits::new(0, 1);
const HAS_IBL: KeyBits = KeyBits::after(HAS_LIGHTING, 1);
const LIGHT_COUNT: KeyBits = KeyBits::after(HAS_IBL, 3);
const LIGHT_POSITIONAL: KeyBits = KeyBits::after(LIGHT_COUNT, 1);
const LIGHT_AREA: KeyBits = KeyBits::new(LIGHT_POSITIONAL.offset + MAX_KEY_LIGHTS, 1);
const LIGHT_SHADOW: KeyBits = KeyBits::new(LIGHT_AREA.offset + MAX_KEY_LIGHTS, 1);
const SPECULAR_ENABLED: KeyBits = KeyBits::new(LIGHT_SHADOW.offset + MAX_KEY_LIGHTS, 1);
const FRESNEL_ENABLED: KeyBits = KeyBits::after(SPECULAR_ENABLED, 1);
const VERTEX_COLORS: KeyBits = KeyBits::after(FRESNEL_ENABLED, 1);
const SPECULAR_MODEL: KeyBits = KeyBits::after(VERTEX_COLORS, 2);
const IMAGE_MAPS: KeyBits = KeyBits::after(SPECULAR_MODEL, 5);
const SWIZZLES: KeyBits = KeyBits::new(IMAGE_MAPS.offset + 5 * ImageMapSlot::COUNT as u32, 3);
const TESSELLATION: KeyBits = KeyBits::new(SWIZZLES.offset + 3 * ImageMapSlot::COUNT as u32, 2);
const WIREFRAME: KeyBits = KeyBits::after(TESSELLATION, 1);
const SKINNING: KeyBits = KeyBits::after(WIREFRAME, 1);

const _: () = assert!(SKINNING.end() as usize <= KEY_WORDS * 32);

/// The image slots a material can sample, in preparation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum ImageMapSlot {
    /// First diffuse layer.
    Diffuse0 = 0,
    /// Second diffuse layer.
    Diffuse1,
    /// Third diffuse layer.
    Diffuse2,
    /// Emissive map.
    Emissive,
    /// Second emissive map.
    Emissive2,
    /// Specular reflection map.
    Specular,
    /// Roughness map.
    Roughness,
    /// Opacity map.
    Opacity,
    /// Bump map.
    Bump,
    /// Specular amount map.
    SpecularAmount,
    /// Normal map.
    Normal,
    /// Displacement map.
    Displacement,
    /// Translucency map.
    Translucency,
    /// Indirect lightmap.
    LightmapIndirect,
    /// Radiance lightmap.
    LightmapRadiance,
    /// Shadow lightmap.
    LightmapShadow,
}

impl ImageMapSlot {
    /// Number of slots.
    pub const COUNT: usize = 16;

    /// All slots in preparation order.
    pub const ALL: [ImageMapSlot; Self::COUNT] = [
        ImageMapSlot::Diffuse0,
        ImageMapSlot::Diffuse1,
        ImageMapSlot::Diffuse2,
        ImageMapSlot::Emissive,
        ImageMapSlot::Emissive2,
        ImageMapSlot::Specular,
        ImageMapSlot::Roughness,
        ImageMapSlot::Opacity,
        ImageMapSlot::Bump,
        ImageMapSlot::SpecularAmount,
        ImageMapSlot::Normal,
        ImageMapSlot::Displacement,
        ImageMapSlot::Translucency,
        ImageMapSlot::LightmapIndirect,
        ImageMapSlot::LightmapRadiance,
        ImageMapSlot::LightmapShadow,
    ];

    /// Slots whose texture alpha makes the surface transparent.
    pub fn alpha_affects_transparency(self) -> bool {
        matches!(
            self,
            ImageMapSlot::Diffuse0
                | ImageMapSlot::Diffuse1
                | ImageMapSlot::Diffuse2
                | ImageMapSlot::Opacity
                | ImageMapSlot::Translucency
        )
    }
}

/// The five per-image key bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ImageKeyFlags {
    bits: u32,
}

impl ImageKeyFlags {
    /// Slot unused.
    pub const NONE: Self = Self { bits: 0 };
    /// A texture is bound.
    pub const ENABLED: Self = Self { bits: 1 << 0 };
    /// Sampled as an environment map.
    pub const ENV_MAP: Self = Self { bits: 1 << 1 };
    /// Sampled as a light probe.
    pub const LIGHT_PROBE: Self = Self { bits: 1 << 2 };
    /// Flip the V coordinate.
    pub const INVERT_UV: Self = Self { bits: 1 << 3 };
    /// Texture has premultiplied alpha.
    pub const PREMULTIPLIED: Self = Self { bits: 1 << 4 };

    /// Creates flags from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits: bits & 0x1f }
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

impl std::ops::BitOr for ImageKeyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for ImageKeyFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// A shader permutation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ShaderKey {
    /// Hash of the sorted feature set the key was derived from.
    pub feature_set_hash: u64,
    /// Packed property bits.
    pub data: [u32; KEY_WORDS],
}

impl ShaderKey {
    /// An all-zero key for the given feature set hash.
    pub fn new(feature_set_hash: u64) -> Self {
        Self {
            feature_set_hash,
            data: [0; KEY_WORDS],
        }
    }

    /// Reads a raw property.
    #[inline]
    pub fn get(&self, bits: KeyBits) -> u32 {
        bits.get(&self.data)
    }

    fn set_flag(&mut self, bits: KeyBits, on: bool) {
        bits.set(&mut self.data, on as u32);
    }

    fn flag(&self, bits: KeyBits) -> bool {
        bits.get(&self.data) != 0
    }

    /// Lighting on/off.
    pub fn set_lighting(&mut self, on: bool) {
        self.set_flag(HAS_LIGHTING, on);
    }

    /// Whether lighting is on.
    pub fn has_lighting(&self) -> bool {
        self.flag(HAS_LIGHTING)
    }

    /// Image-based lighting on/off.
    pub fn set_ibl(&mut self, on: bool) {
        self.set_flag(HAS_IBL, on);
    }

    /// Whether image-based lighting is on.
    pub fn has_ibl(&self) -> bool {
        self.flag(HAS_IBL)
    }

    /// Sets the light count, clamped to [`MAX_KEY_LIGHTS`].
    pub fn set_light_count(&mut self, count: u32) {
        LIGHT_COUNT.set(&mut self.data, count.min(MAX_KEY_LIGHTS));
    }

    /// Number of lights in the key.
    pub fn light_count(&self) -> u32 {
        LIGHT_COUNT.get(&self.data)
    }

    /// Marks light `index` as positional (anything but directional).
    /// Indices past the cap are ignored.
    pub fn set_light_positional(&mut self, index: u32, on: bool) {
        if index < MAX_KEY_LIGHTS {
            self.set_flag(LIGHT_POSITIONAL.element(index), on);
        }
    }

    /// Whether light `index` is positional.
    pub fn light_positional(&self, index: u32) -> bool {
        index < MAX_KEY_LIGHTS && self.flag(LIGHT_POSITIONAL.element(index))
    }

    /// Marks light `index` as an area light.
    pub fn set_light_area(&mut self, index: u32, on: bool) {
        if index < MAX_KEY_LIGHTS {
            self.set_flag(LIGHT_AREA.element(index), on);
        }
    }

    /// Whether light `index` is an area light.
    pub fn light_area(&self, index: u32) -> bool {
        index < MAX_KEY_LIGHTS && self.flag(LIGHT_AREA.element(index))
    }

    /// Marks light `index` as shadow casting.
    pub fn set_light_shadow(&mut self, index: u32, on: bool) {
        if index < MAX_KEY_LIGHTS {
            self.set_flag(LIGHT_SHADOW.element(index), on);
        }
    }

    /// Whether light `index` casts shadows.
    pub fn light_shadow(&self, index: u32) -> bool {
        index < MAX_KEY_LIGHTS && self.flag(LIGHT_SHADOW.element(index))
    }

    /// Specular on/off.
    pub fn set_specular_enabled(&mut self, on: bool) {
        self.set_flag(SPECULAR_ENABLED, on);
    }

    /// Whether specular is on.
    pub fn specular_enabled(&self) -> bool {
        self.flag(SPECULAR_ENABLED)
    }

    /// Fresnel on/off.
    pub fn set_fresnel_enabled(&mut self, on: bool) {
        self.set_flag(FRESNEL_ENABLED, on);
    }

    /// Whether fresnel is on.
    pub fn fresnel_enabled(&self) -> bool {
        self.flag(FRESNEL_ENABLED)
    }

    /// Vertex colors on/off.
    pub fn set_vertex_colors_enabled(&mut self, on: bool) {
        self.set_flag(VERTEX_COLORS, on);
    }

    /// Whether vertex colors are used.
    pub fn vertex_colors_enabled(&self) -> bool {
        self.flag(VERTEX_COLORS)
    }

    /// Sets the specular model.
    pub fn set_specular_model(&mut self, model: SpecularModel) {
        SPECULAR_MODEL.set(&mut self.data, model as u32);
    }

    /// The specular model.
    pub fn specular_model(&self) -> SpecularModel {
        match SPECULAR_MODEL.get(&self.data) {
            1 => SpecularModel::KGgx,
            2 => SpecularModel::KWard,
            _ => SpecularModel::Default,
        }
    }

    /// Replaces the flags of one image slot.
    pub fn set_image_flags(&mut self, slot: ImageMapSlot, flags: ImageKeyFlags) {
        IMAGE_MAPS
            .element(slot as u32)
            .set(&mut self.data, flags.bits());
    }

    /// The flags of one image slot.
    pub fn image_flags(&self, slot: ImageMapSlot) -> ImageKeyFlags {
        ImageKeyFlags::from_bits(IMAGE_MAPS.element(slot as u32).get(&self.data))
    }

    /// Sets the channel swizzle of one image slot.
    pub fn set_swizzle(&mut self, slot: ImageMapSlot, mode: TextureSwizzleMode) {
        SWIZZLES.element(slot as u32).set(&mut self.data, mode as u32);
    }

    /// The channel swizzle of one image slot.
    pub fn swizzle(&self, slot: ImageMapSlot) -> TextureSwizzleMode {
        match SWIZZLES.element(slot as u32).get(&self.data) {
            1 => TextureSwizzleMode::L8ToR8,
            2 => TextureSwizzleMode::A8ToR8,
            3 => TextureSwizzleMode::L8A8ToRg8,
            4 => TextureSwizzleMode::L16ToR16,
            _ => TextureSwizzleMode::NoSwizzle,
        }
    }

    /// Sets the tessellation mode.
    pub fn set_tessellation(&mut self, mode: TessellationMode) {
        TESSELLATION.set(&mut self.data, mode as u32);
    }

    /// The tessellation mode.
    pub fn tessellation(&self) -> TessellationMode {
        match TESSELLATION.get(&self.data) {
            1 => TessellationMode::Linear,
            2 => TessellationMode::Phong,
            3 => TessellationMode::NPatch,
            _ => TessellationMode::None,
        }
    }

    /// Wireframe on/off.
    pub fn set_wireframe(&mut self, on: bool) {
        self.set_flag(WIREFRAME, on);
    }

    /// Whether wireframe is on.
    pub fn wireframe(&self) -> bool {
        self.flag(WIREFRAME)
    }

    /// Skinning on/off.
    pub fn set_skinning(&mut self, on: bool) {
        self.set_flag(SKINNING, on);
    }

    /// Whether skinning is on.
    pub fn skinning(&self) -> bool {
        self.flag(SKINNING)
    }
}
