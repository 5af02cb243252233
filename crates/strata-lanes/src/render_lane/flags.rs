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

//! Bit sets describing renderables and prepared layers.

/// State of one renderable object after preparation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderableFlags {
    bits: u32,
}

impl RenderableFlags {
    /// No flags.
    pub const NONE: Self = Self { bits: 0 };
    /// Drawn with blending, back to front.
    pub const HAS_TRANSPARENCY: Self = Self { bits: 1 << 0 };
    /// Opacity fell under the render threshold. Still pickable, never drawn.
    pub const COMPLETELY_TRANSPARENT: Self = Self { bits: 1 << 1 };
    /// Samples the scene rendered behind it.
    pub const HAS_REFRACTION: Self = Self { bits: 1 << 2 };
    /// Something the draw depends on changed since the last frame.
    pub const DIRTY: Self = Self { bits: 1 << 3 };
    /// Picking may return the object's node.
    pub const PICKABLE: Self = Self { bits: 1 << 4 };
    /// Carries per-vertex skinning data.
    pub const SKINNED: Self = Self { bits: 1 << 5 };
    /// Has at least one light in its key.
    pub const LIT: Self = Self { bits: 1 << 6 };

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

    /// Sets or clears the bits of `other`.
    pub fn set(&mut self, other: Self, on: bool) {
        if on {
            self.bits |= other.bits;
        } else {
            self.bits &= !other.bits;
        }
    }

    /// Whether the object blends with what is behind it.
    #[inline]
    pub fn has_transparency(&self) -> bool {
        self.contains(Self::HAS_TRANSPARENCY)
    }

    /// Whether the object is skipped when drawing.
    #[inline]
    pub fn is_completely_transparent(&self) -> bool {
        self.contains(Self::COMPLETELY_TRANSPARENT)
    }
}

impl std::ops::BitOr for RenderableFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for RenderableFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// What a layer preparation found out about the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LayerPreparationFlags {
    bits: u32,
}

impl LayerPreparationFlags {
    /// No flags.
    pub const NONE: Self = Self { bits: 0 };
    /// A node, material, light, image or camera changed. Progressive
    /// anti-aliasing restarts.
    pub const WAS_DIRTY: Self = Self { bits: 1 << 0 };
    /// The layer's own properties changed.
    pub const LAYER_DATA_DIRTY: Self = Self { bits: 1 << 1 };
    /// A depth prepass is needed by a screen-space effect.
    pub const REQUIRES_DEPTH_TEXTURE: Self = Self { bits: 1 << 2 };
    /// Ambient occlusion runs after the depth prepass.
    pub const REQUIRES_SSAO_PASS: Self = Self { bits: 1 << 3 };
    /// Painted paths fill through the stencil buffer.
    pub const REQUIRES_STENCIL_BUFFER: Self = Self { bits: 1 << 4 };
    /// The layer is rendered offscreen, then composited.
    pub const SHOULD_RENDER_TO_TEXTURE: Self = Self { bits: 1 << 5 };

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

    /// Sets or clears the bits of `other`.
    pub fn set(&mut self, other: Self, on: bool) {
        if on {
            self.bits |= other.bits;
        } else {
            self.bits &= !other.bits;
        }
    }
}

impl std::ops::BitOr for LayerPreparationFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}
