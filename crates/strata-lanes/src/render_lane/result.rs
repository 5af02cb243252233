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

//! The summary a layer preparation hands to the frame renderer.

use super::flags::LayerPreparationFlags;
use strata_core::math::Rect;
use strata_data::scene::NodeId;

/// Outcome of preparing one layer for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRenderPreparationResult {
    /// The prepared layer.
    pub layer: NodeId,
    /// Layer viewport inside the presentation, bottom-left origin.
    pub viewport: Rect,
    /// Layer viewport clipped to the presentation.
    pub scissor: Rect,
    /// The presentation the layer was placed in.
    pub presentation_viewport: Rect,
    /// Camera the layer renders with, when one is usable.
    pub camera: Option<NodeId>,
    /// Dirty and pass requirement flags.
    pub flags: LayerPreparationFlags,
    /// Last progressive anti-aliasing pass index, 0 when disabled.
    pub max_aa_pass_index: u32,
}

impl LayerRenderPreparationResult {
    /// A result for a layer that draws nothing this frame.
    pub fn empty(layer: NodeId, presentation_viewport: Rect) -> Self {
        Self {
            layer,
            viewport: Rect::default(),
            scissor: Rect::default(),
            presentation_viewport,
            camera: None,
            flags: LayerPreparationFlags::NONE,
            max_aa_pass_index: 0,
        }
    }

    /// The layer covers part of the presentation.
    pub fn is_visible(&self) -> bool {
        self.viewport.has_area() && self.scissor.has_area()
    }

    /// Something changed since the previous frame.
    pub fn was_dirty(&self) -> bool {
        self.flags.contains(LayerPreparationFlags::WAS_DIRTY)
    }

    /// The layer's own properties changed.
    pub fn layer_data_dirty(&self) -> bool {
        self.flags.contains(LayerPreparationFlags::LAYER_DATA_DIRTY)
    }

    /// A depth prepass is needed.
    pub fn requires_depth_texture(&self) -> bool {
        self.flags.contains(LayerPreparationFlags::REQUIRES_DEPTH_TEXTURE)
    }

    /// Ambient occlusion runs.
    pub fn requires_ssao_pass(&self) -> bool {
        self.flags.contains(LayerPreparationFlags::REQUIRES_SSAO_PASS)
    }

    /// Painted paths need a stencil buffer.
    pub fn requires_stencil_buffer(&self) -> bool {
        self.flags.contains(LayerPreparationFlags::REQUIRES_STENCIL_BUFFER)
    }

    /// The layer is rendered offscreen first.
    pub fn should_render_to_texture(&self) -> bool {
        self.flags.contains(LayerPreparationFlags::SHOULD_RENDER_TO_TEXTURE)
    }
}
