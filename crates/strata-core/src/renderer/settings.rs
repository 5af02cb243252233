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

//! Runtime tunables of the renderer core.

use super::shader_key::MAX_KEY_LIGHTS;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Settings a host application may load from its own configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Lights reflected in a shader key per layer. Clamped to the key's cap.
    pub max_lights_per_layer: u32,
    /// Below this effective opacity a renderable is never drawn.
    pub minimum_render_opacity: f32,
    /// Number of progressive anti-aliasing passes accumulated when idle.
    pub max_progressive_aa_passes: u32,
    /// Longest referenced-material chain followed before giving up.
    pub max_material_reference_depth: u32,
    /// Draw tessellated subsets as wireframes.
    pub wireframe_mode: bool,
    /// Force the opacity of renderables outside the camera frustum to zero.
    pub enable_frustum_culling: bool,
}

impl RendererSettings {
    /// Parses settings from RON. Missing fields take their default value.
    pub fn from_ron_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self =
            ron::from_str(text).map_err(|e| SettingsError::InvalidFormat(e.to_string()))?;
        Ok(settings.sanitized())
    }

    /// Serializes the settings to human-readable RON.
    pub fn to_ron_string(&self) -> Result<String, SettingsError> {
        let pretty_config = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        ron::ser::to_string_pretty(self, pretty_config)
            .map_err(|e| SettingsError::InvalidFormat(e.to_string()))
    }

    /// Light cap actually applied to shader keys.
    #[inline]
    pub fn effective_max_lights(&self) -> u32 {
        self.max_lights_per_layer.min(MAX_KEY_LIGHTS)
    }

    fn sanitized(mut self) -> Self {
        if self.max_lights_per_layer > MAX_KEY_LIGHTS {
            log::warn!(
                "max_lights_per_layer {} exceeds the shader key cap, using {}",
                self.max_lights_per_layer,
                MAX_KEY_LIGHTS
            );
        }
        self.max_lights_per_layer = self.effective_max_lights();
        self.max_material_reference_depth = self.max_material_reference_depth.max(1);
        self
    }
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            max_lights_per_layer: MAX_KEY_LIGHTS,
            minimum_render_opacity: 0.01,
            max_progressive_aa_passes: 8,
            max_material_reference_depth: 32,
            wireframe_mode: false,
            enable_frustum_culling: true,
        }
    }
}

/// An error raised while reading or writing [`RendererSettings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// The text is not valid RON for the settings structure.
    InvalidFormat(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::InvalidFormat(msg) => write!(f, "Invalid renderer settings: {msg}"),
        }
    }
}

impl std::error::Error for SettingsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let settings =
            RendererSettings::from_ron_str("(wireframe_mode: true, max_lights_per_layer: 20)")
                .expect("valid settings");
        assert!(settings.wireframe_mode);
        assert_eq!(settings.max_lights_per_layer, MAX_KEY_LIGHTS);
        assert_eq!(settings.max_progressive_aa_passes, 8);
        assert!(settings.enable_frustum_culling);
    }

    #[test]
    fn test_ron_round_trip() {
        let settings = RendererSettings {
            minimum_render_opacity: 0.05,
            ..Default::default()
        };
        let text = settings.to_ron_string().expect("serializable");
        assert_eq!(RendererSettings::from_ron_str(&text), Ok(settings));
    }

    #[test]
    fn test_invalid_ron_is_reported() {
        let err = RendererSettings::from_ron_str("(wireframe_mode: 3").unwrap_err();
        assert!(matches!(err, SettingsError::InvalidFormat(_)));
    }
}
