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

//! Identity of a compiled shader program.

use super::enums::TessellationMode;
use super::features::ShaderFeature;
use super::shader_key::ShaderKey;

/// An opaque handle to a compiled program owned by the shader cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderProgramId(pub u64);

/// Everything that selects a shader program.
///
/// Two renderables whose cache keys compare equal share a program, whatever
/// else differs between them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderCacheKey {
    /// Shader source path; empty for the built-in material.
    pub material_path: String,
    /// Extra preprocessor defines of a custom material.
    pub material_define: String,
    /// The layer's sorted feature set.
    pub features: Vec<ShaderFeature>,
    /// Tessellation mode of the subset.
    pub tess_mode: TessellationMode,
    /// Whether the subset is drawn as wireframe.
    pub wireframe: bool,
    /// The material permutation key.
    pub material_key: ShaderKey,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashSet;

    fn key(path: &str, material_key: ShaderKey) -> ShaderCacheKey {
        ShaderCacheKey {
            material_path: path.to_owned(),
            material_define: String::new(),
            features: vec![ShaderFeature {
                name: "STRATA_ENABLE_SSAO".to_owned(),
                enabled: true,
            }],
            tess_mode: TessellationMode::None,
            wireframe: false,
            material_key,
        }
    }

    #[test]
    fn test_equal_keys_deduplicate() {
        let mut set = AHashSet::new();
        set.insert(key("", ShaderKey::new(1)));
        set.insert(key("", ShaderKey::new(1)));
        assert_eq!(set.len(), 1);
        set.insert(key("custom.glsl", ShaderKey::new(1)));
        let mut lit = ShaderKey::new(1);
        lit.set_lighting(true);
        set.insert(key("", lit));
        assert_eq!(set.len(), 3);
    }
}
