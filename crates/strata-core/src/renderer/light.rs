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

//! Light sources as seen by the preparation pipeline.
//!
//! Only the properties that influence shader selection or per-frame light
//! bookkeeping live here. Where the light sits in the scene, and which
//! sub-tree it is scoped to, is owned by the scene graph.

use crate::math::LinearRgba;
use serde::{Deserialize, Serialize};

/// The shape of a light source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LightType {
    /// Infinitely distant light with parallel rays, like the sun.
    #[default]
    Directional,
    /// Omni-directional light emitted from a single point.
    Point,
    /// Rectangular emitter with a width and height.
    Area,
}

/// The parameters of a light source.
///
/// # Examples
///
/// ```
/// use strata_core::renderer::light::{LightProperties, LightType};
///
/// let lamp = LightProperties {
///     light_type: LightType::Point,
///     cast_shadow: true,
///     ..Default::default()
/// };
/// assert!(lamp.casts_shadow_map());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightProperties {
    /// The shape of the light.
    pub light_type: LightType,
    /// Diffuse color.
    pub diffuse_color: LinearRgba,
    /// Specular color.
    pub specular_color: LinearRgba,
    /// Ambient contribution.
    pub ambient_color: LinearRgba,
    /// Overall brightness multiplier, in percent.
    pub brightness: f32,
    /// Linear distance attenuation.
    pub linear_fade: f32,
    /// Quadratic distance attenuation.
    pub exponential_fade: f32,
    /// Width of an area light.
    pub area_width: f32,
    /// Height of an area light.
    pub area_height: f32,
    /// Whether the light wants a shadow map.
    pub cast_shadow: bool,
    /// Depth bias applied when sampling the shadow map.
    pub shadow_bias: f32,
    /// Darkness of the shadow, in percent.
    pub shadow_factor: f32,
    /// Shadow map resolution exponent.
    pub shadow_map_resolution: u32,
    /// Far clip of the shadow camera.
    pub shadow_map_far: f32,
    /// Field of view of the shadow camera, in degrees.
    pub shadow_map_fov: f32,
    /// Soft shadow filter width.
    pub shadow_filter: f32,
}

impl LightProperties {
    /// Directional lights have no position.
    #[inline]
    pub fn is_directional(&self) -> bool {
        self.light_type == LightType::Directional
    }

    /// Whether this is an area light.
    #[inline]
    pub fn is_area(&self) -> bool {
        self.light_type == LightType::Area
    }

    /// Area lights never render shadow maps, whatever `cast_shadow` says.
    #[inline]
    pub fn casts_shadow_map(&self) -> bool {
        self.cast_shadow && !self.is_area()
    }
}

impl Default for LightProperties {
    fn default() -> Self {
        Self {
            light_type: LightType::Directional,
            diffuse_color: LinearRgba::WHITE,
            specular_color: LinearRgba::WHITE,
            ambient_color: LinearRgba::BLACK,
            brightness: 100.0,
            linear_fade: 0.0,
            exponential_fade: 0.0,
            area_width: 0.0,
            area_height: 0.0,
            cast_shadow: false,
            shadow_bias: 0.0,
            shadow_factor: 5.0,
            shadow_map_resolution: 9,
            shadow_map_far: 5000.0,
            shadow_map_fov: 90.0,
            shadow_filter: 35.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_light_never_casts_shadow_map() {
        let area = LightProperties {
            light_type: LightType::Area,
            cast_shadow: true,
            ..Default::default()
        };
        assert!(area.is_area());
        assert!(!area.casts_shadow_map());
    }

    #[test]
    fn test_default_light_is_directional() {
        let light = LightProperties::default();
        assert!(light.is_directional());
        assert!(!light.casts_shadow_map());
    }
}
