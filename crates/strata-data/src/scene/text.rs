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

//! Text nodes. Glyph layout and rasterization belong to the text renderer.

use strata_core::math::LinearRgba;

/// Horizontal alignment of a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextAlignment {
    /// Flush left.
    Left,
    /// Centered.
    #[default]
    Center,
    /// Flush right.
    Right,
}

/// A block of text drawn as a textured quad.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    /// The string to draw.
    pub text: String,
    /// Font family name.
    pub font: String,
    /// Size in points.
    pub font_size: f32,
    /// Text color. Its alpha multiplies the node opacity.
    pub color: LinearRgba,
    /// Horizontal alignment.
    pub alignment: TextAlignment,
    /// Extra spacing between glyphs.
    pub tracking: f32,
    /// Extra spacing between lines.
    pub leading: f32,
}

impl TextNode {
    /// White text in the default font.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: "TitilliumWeb-Regular".to_owned(),
            font_size: 24.0,
            color: LinearRgba::WHITE,
            alignment: TextAlignment::Center,
            tracking: 0.0,
            leading: 0.0,
        }
    }
}
