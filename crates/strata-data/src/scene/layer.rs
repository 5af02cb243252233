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

//! Layer nodes: independent render targets stacked in the presentation.

use super::node::NodeId;
use strata_core::asset::ImageId;
use strata_core::math::Rect;

/// Unit of a placement value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerUnits {
    /// Percentage of the presentation viewport.
    #[default]
    Percent,
    /// Absolute pixels.
    Pixels,
}

/// Which two of left/width/right place a layer horizontally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizontalFields {
    /// `left` and `width`.
    #[default]
    LeftWidth,
    /// `left` and `right`.
    LeftRight,
    /// `width` and `right`.
    WidthRight,
}

/// Which two of top/height/bottom place a layer vertically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalFields {
    /// `top` and `height`.
    #[default]
    TopHeight,
    /// `top` and `bottom`.
    TopBottom,
    /// `height` and `bottom`.
    HeightBottom,
}

/// A placement value with its unit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayerValue {
    /// The number.
    pub value: f32,
    /// What the number measures.
    pub units: LayerUnits,
}

impl LayerValue {
    /// A percentage of the presentation size.
    pub const fn percent(value: f32) -> Self {
        Self {
            value,
            units: LayerUnits::Percent,
        }
    }

    /// An absolute size in pixels.
    pub const fn pixels(value: f32) -> Self {
        Self {
            value,
            units: LayerUnits::Pixels,
        }
    }

    fn resolve(&self, extent: f32) -> f32 {
        match self.units {
            LayerUnits::Percent => self.value * 0.01 * extent,
            LayerUnits::Pixels => self.value,
        }
    }
}

/// Where a layer sits in the presentation viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerPlacement {
    /// Selects the horizontal fields used.
    pub horizontal: HorizontalFields,
    /// Distance from the left edge.
    pub left: LayerValue,
    /// Layer width.
    pub width: LayerValue,
    /// Distance from the right edge.
    pub right: LayerValue,
    /// Selects the vertical fields used.
    pub vertical: VerticalFields,
    /// Distance from the top edge.
    pub top: LayerValue,
    /// Layer height.
    pub height: LayerValue,
    /// Distance from the bottom edge.
    pub bottom: LayerValue,
}

impl Default for LayerPlacement {
    /// Covers the whole presentation.
    fn default() -> Self {
        Self {
            horizontal: HorizontalFields::LeftWidth,
            left: LayerValue::percent(0.0),
            width: LayerValue::percent(100.0),
            right: LayerValue::percent(0.0),
            vertical: VerticalFields::TopHeight,
            top: LayerValue::percent(0.0),
            height: LayerValue::percent(100.0),
            bottom: LayerValue::percent(0.0),
        }
    }
}

impl LayerPlacement {
    /// The layer viewport inside `presentation`, snapped to whole pixels.
    /// The origin is the bottom-left corner.
    pub fn viewport(&self, presentation: &Rect) -> Rect {
        let (pw, ph) = (presentation.width, presentation.height);
        let (x, width) = match self.horizontal {
            HorizontalFields::LeftWidth => (self.left.resolve(pw), self.width.resolve(pw)),
            HorizontalFields::LeftRight => {
                let left = self.left.resolve(pw);
                (left, pw - left - self.right.resolve(pw))
            }
            HorizontalFields::WidthRight => {
                let width = self.width.resolve(pw);
                (pw - width - self.right.resolve(pw), width)
            }
        };
        let (y, height) = match self.vertical {
            VerticalFields::TopHeight => {
                let height = self.height.resolve(ph);
                (ph - self.top.resolve(ph) - height, height)
            }
            VerticalFields::TopBottom => {
                let bottom = self.bottom.resolve(ph);
                (bottom, ph - self.top.resolve(ph) - bottom)
            }
            VerticalFields::HeightBottom => (self.bottom.resolve(ph), self.height.resolve(ph)),
        };
        let x = (presentation.x + x).round();
        let y = (presentation.y + y).round();
        Rect::new(x, y, width.round().max(0.0), height.round().max(0.0))
    }
}

/// Progressive anti-aliasing quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum AaMode {
    /// No accumulation.
    #[default]
    NoAa = 0,
    /// Supersampling, accumulated over two passes.
    Ssaa = 1,
    /// Two samples.
    X2 = 2,
    /// Four samples.
    X4 = 4,
    /// Eight samples.
    X8 = 8,
}

impl AaMode {
    /// Last progressive pass index for this mode, 0 when there is none.
    pub fn max_aa_pass_index(self) -> u32 {
        match self {
            AaMode::NoAa => 0,
            mode => (mode as u32 + 1).min(9),
        }
    }
}

/// Per-layer rendering options.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerNode {
    /// Where the layer sits in the presentation.
    pub placement: LayerPlacement,
    /// Camera to render with. The first active camera under the layer when
    /// `None`.
    pub camera: Option<NodeId>,
    /// Opaque objects use depth testing and front to back ordering.
    pub enable_depth_test: bool,
    /// Progressive anti-aliasing.
    pub progressive_aa: AaMode,
    /// Ambient occlusion strength, in percent.
    pub ao_strength: f32,
    /// Ambient occlusion sampling distance.
    pub ao_distance: f32,
    /// Screen-space shadow strength, in percent.
    pub shadow_strength: f32,
    /// Screen-space shadow distance.
    pub shadow_distance: f32,
    /// Image-based lighting probe.
    pub light_probe: Option<ImageId>,
    /// Second probe blended with the first.
    pub light_probe2: Option<ImageId>,
    /// Field of view of the probe, in degrees.
    pub probe_fov: f32,
    /// Render into an offscreen texture before compositing.
    pub render_to_texture: bool,
}

impl Default for LayerNode {
    fn default() -> Self {
        Self {
            placement: LayerPlacement::default(),
            camera: None,
            enable_depth_test: true,
            progressive_aa: AaMode::NoAa,
            ao_strength: 0.0,
            ao_distance: 5.0,
            shadow_strength: 0.0,
            shadow_distance: 10.0,
            light_probe: None,
            light_probe2: None,
            probe_fov: 180.0,
            render_to_texture: false,
        }
    }
}

impl LayerNode {
    /// Whether screen-space ambient occlusion runs.
    pub fn ssao_enabled(&self) -> bool {
        self.ao_strength > 0.0 && self.ao_distance > 0.0
    }

    /// Whether screen-space directional occlusion runs.
    pub fn ssdo_enabled(&self) -> bool {
        self.shadow_strength > 0.0 && self.shadow_distance > 0.0
    }

    /// Whether the layer needs its own texture.
    pub fn should_render_to_texture(&self) -> bool {
        self.render_to_texture || self.progressive_aa.max_aa_pass_index() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRESENTATION: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

    #[test]
    fn test_default_placement_covers_presentation() {
        assert_eq!(LayerPlacement::default().viewport(&PRESENTATION), PRESENTATION);
    }

    #[test]
    fn test_pixel_and_percent_placement() {
        let placement = LayerPlacement {
            horizontal: HorizontalFields::LeftRight,
            left: LayerValue::pixels(100.0),
            right: LayerValue::percent(25.0),
            vertical: VerticalFields::TopHeight,
            top: LayerValue::pixels(50.0),
            height: LayerValue::percent(50.0),
            ..Default::default()
        };
        assert_eq!(
            placement.viewport(&PRESENTATION),
            Rect::new(100.0, 250.0, 500.0, 300.0)
        );
    }

    #[test]
    fn test_width_right_and_height_bottom() {
        let placement = LayerPlacement {
            horizontal: HorizontalFields::WidthRight,
            width: LayerValue::pixels(200.0),
            right: LayerValue::pixels(10.0),
            vertical: VerticalFields::HeightBottom,
            height: LayerValue::pixels(100.0),
            bottom: LayerValue::pixels(20.0),
            ..Default::default()
        };
        assert_eq!(
            placement.viewport(&Rect::new(5.0, 5.0, 800.0, 600.0)),
            Rect::new(595.0, 25.0, 200.0, 100.0)
        );
    }

    #[test]
    fn test_aa_pass_caps() {
        assert_eq!(AaMode::NoAa.max_aa_pass_index(), 0);
        assert_eq!(AaMode::Ssaa.max_aa_pass_index(), 2);
        assert_eq!(AaMode::X2.max_aa_pass_index(), 3);
        assert_eq!(AaMode::X4.max_aa_pass_index(), 5);
        assert_eq!(AaMode::X8.max_aa_pass_index(), 9);

        let layer = LayerNode {
            progressive_aa: AaMode::X4,
            ..Default::default()
        };
        assert!(layer.should_render_to_texture());
        assert!(!LayerNode::default().should_render_to_texture());
    }
}
