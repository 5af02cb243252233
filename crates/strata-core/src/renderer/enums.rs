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

//! Backend-agnostic enumerations shared by the mesh format and the renderer.
//!
//! The numeric values of [`ComponentType`], [`DrawMode`] and [`Winding`] are
//! part of the binary mesh format and must never change.

use serde::{Deserialize, Serialize};

/// The scalar type of a vertex attribute component or an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum ComponentType {
    /// Not set.
    #[default]
    Unknown = 0,
    /// `u8`.
    U8 = 1,
    /// `i8`.
    I8 = 2,
    /// `u16`.
    U16 = 3,
    /// `i16`.
    I16 = 4,
    /// `u32`.
    U32 = 5,
    /// `i32`.
    I32 = 6,
    /// `u64`.
    U64 = 7,
    /// `i64`.
    I64 = 8,
    /// Half-precision float.
    F16 = 9,
    /// `f32`.
    F32 = 10,
    /// `f64`.
    F64 = 11,
}

impl ComponentType {
    /// Size of one component in bytes; `0` for [`ComponentType::Unknown`].
    pub const fn size_in_bytes(self) -> u32 {
        match self {
            ComponentType::Unknown => 0,
            ComponentType::U8 | ComponentType::I8 => 1,
            ComponentType::U16 | ComponentType::I16 | ComponentType::F16 => 2,
            ComponentType::U32 | ComponentType::I32 | ComponentType::F32 => 4,
            ComponentType::U64 | ComponentType::I64 | ComponentType::F64 => 8,
        }
    }

    /// Whether this type may be used for an index buffer.
    pub const fn is_index_type(self) -> bool {
        matches!(
            self,
            ComponentType::U8
                | ComponentType::I8
                | ComponentType::U16
                | ComponentType::I16
                | ComponentType::U32
                | ComponentType::I32
        )
    }
}

impl TryFrom<u32> for ComponentType {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, u32> {
        Ok(match value {
            0 => ComponentType::Unknown,
            1 => ComponentType::U8,
            2 => ComponentType::I8,
            3 => ComponentType::U16,
            4 => ComponentType::I16,
            5 => ComponentType::U32,
            6 => ComponentType::I32,
            7 => ComponentType::U64,
            8 => ComponentType::I64,
            9 => ComponentType::F16,
            10 => ComponentType::F32,
            11 => ComponentType::F64,
            other => return Err(other),
        })
    }
}

/// Primitive assembly mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum DrawMode {
    /// Not set.
    Unknown = 0,
    /// Independent points.
    Points = 1,
    /// Connected line strip.
    LineStrip = 2,
    /// Closed line loop.
    LineLoop = 3,
    /// Independent lines.
    Lines = 4,
    /// Triangle strip.
    TriangleStrip = 5,
    /// Triangle fan.
    TriangleFan = 6,
    /// Independent triangles.
    #[default]
    Triangles = 7,
    /// Tessellation patches.
    Patches = 8,
}

impl TryFrom<u32> for DrawMode {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, u32> {
        Ok(match value {
            0 => DrawMode::Unknown,
            1 => DrawMode::Points,
            2 => DrawMode::LineStrip,
            3 => DrawMode::LineLoop,
            4 => DrawMode::Lines,
            5 => DrawMode::TriangleStrip,
            6 => DrawMode::TriangleFan,
            7 => DrawMode::Triangles,
            8 => DrawMode::Patches,
            other => return Err(other),
        })
    }
}

/// Front-face winding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum Winding {
    /// Not set.
    Unknown = 0,
    /// Clockwise front faces.
    Clockwise = 1,
    /// Counter-clockwise front faces.
    #[default]
    CounterClockwise = 2,
}

impl TryFrom<u32> for Winding {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, u32> {
        Ok(match value {
            0 => Winding::Unknown,
            1 => Winding::Clockwise,
            2 => Winding::CounterClockwise,
            other => return Err(other),
        })
    }
}

/// Pixel format of a loaded texture, as far as shader generation cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureFormat {
    /// Single-channel 8-bit luminance.
    Luminance8,
    /// Two-channel 8-bit luminance + alpha.
    LuminanceAlpha8,
    /// Single-channel 8-bit alpha.
    Alpha8,
    /// Single-channel 8-bit red.
    R8,
    /// Two-channel 8-bit.
    Rg8,
    /// Three-channel 8-bit.
    Rgb8,
    /// Four-channel 8-bit.
    #[default]
    Rgba8,
    /// Four-channel half float.
    Rgba16F,
    /// Four-channel float.
    Rgba32F,
}

/// How a texture's channels are remapped when the backend lacks the
/// original format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum TextureSwizzleMode {
    /// Sample channels as stored.
    #[default]
    NoSwizzle = 0,
    /// Luminance stored in red.
    L8ToR8 = 1,
    /// Alpha stored in red.
    A8ToR8 = 2,
    /// Luminance + alpha stored in red + green.
    L8A8ToRg8 = 3,
    /// 16-bit luminance stored in red.
    L16ToR16 = 4,
}

/// Tessellation applied to a model's subsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum TessellationMode {
    /// No tessellation.
    #[default]
    None = 0,
    /// Flat subdivision.
    Linear = 1,
    /// Phong tessellation.
    Phong = 2,
    /// Curved PN-triangles.
    NPatch = 3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_type_codes_are_stable() {
        assert_eq!(ComponentType::F32 as u32, 10);
        assert_eq!(ComponentType::try_from(3), Ok(ComponentType::U16));
        assert_eq!(ComponentType::try_from(42), Err(42));
    }

    #[test]
    fn test_component_sizes() {
        assert_eq!(ComponentType::U16.size_in_bytes(), 2);
        assert_eq!(ComponentType::F64.size_in_bytes(), 8);
        assert_eq!(ComponentType::Unknown.size_in_bytes(), 0);
        assert!(ComponentType::U32.is_index_type());
        assert!(!ComponentType::F32.is_index_type());
    }

    #[test]
    fn test_draw_mode_and_winding_codes() {
        assert_eq!(DrawMode::try_from(7), Ok(DrawMode::Triangles));
        assert_eq!(Winding::try_from(2), Ok(Winding::CounterClockwise));
        assert!(Winding::try_from(3).is_err());
    }
}
