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

//! Named preprocessor features and the per-layer feature set.
//!
//! Features are layer-wide switches (SSAO, light probes, ...) that select
//! shader variants alongside the per-material [`ShaderKey`]. A set is kept in
//! insertion order while it is edited and sorted by name on demand, so two
//! sets with the same contents hash identically.
//!
//! [`ShaderKey`]: crate::renderer::ShaderKey

use std::hash::{Hash, Hasher};

/// Any light in the layer contributes.
pub const CG_LIGHTING: &str = "STRATA_ENABLE_CG_LIGHTING";
/// The layer has a light probe.
pub const LIGHT_PROBE: &str = "STRATA_ENABLE_LIGHT_PROBE";
/// The layer has a second light probe blended over the first.
pub const LIGHT_PROBE_2: &str = "STRATA_ENABLE_LIGHT_PROBE_2";
/// The light probe has a restricted field of view.
pub const IBL_FOV: &str = "STRATA_ENABLE_IBL_FOV";
/// Screen-space ambient occlusion.
pub const SSAO: &str = "STRATA_ENABLE_SSAO";
/// Screen-space directional occlusion.
pub const SSDO: &str = "STRATA_ENABLE_SSDO";
/// Shadow mapping.
pub const SSM: &str = "STRATA_ENABLE_SSM";

/// One named boolean.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderFeature {
    /// Preprocessor name.
    pub name: String,
    /// Value.
    pub enabled: bool,
}

/// An editable set of named features with a lazily computed hash.
///
/// ```
/// use strata_core::renderer::features::{ShaderFeatureSet, SSAO, SSDO};
///
/// let mut a = ShaderFeatureSet::default();
/// a.set(SSAO, true);
/// a.set(SSDO, false);
/// let mut b = ShaderFeatureSet::default();
/// b.set(SSDO, false);
/// b.set(SSAO, true);
/// assert_eq!(a.hash_value(), b.hash_value());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShaderFeatureSet {
    features: Vec<ShaderFeature>,
    sorted: bool,
    hash: Option<u64>,
}

impl ShaderFeatureSet {
    /// Inserts `name` or updates its value.
    pub fn set(&mut self, name: &str, enabled: bool) {
        match self.features.iter_mut().find(|f| f.name == name) {
            Some(feature) => {
                if feature.enabled != enabled {
                    feature.enabled = enabled;
                    self.hash = None;
                }
            }
            None => {
                self.features.push(ShaderFeature {
                    name: name.to_owned(),
                    enabled,
                });
                self.sorted = false;
                self.hash = None;
            }
        }
    }

    /// Whether `name` is present and enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.features.iter().any(|f| f.name == name && f.enabled)
    }

    /// Removes every feature.
    pub fn clear(&mut self) {
        self.features.clear();
        self.sorted = true;
        self.hash = None;
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// The features, sorted by name.
    pub fn features(&mut self) -> &[ShaderFeature] {
        if !self.sorted {
            self.features.sort_by(|a, b| a.name.cmp(&b.name));
            self.sorted = true;
        }
        &self.features
    }

    /// A hash of the sorted set, stable across insertion orders and frames.
    pub fn hash_value(&mut self) -> u64 {
        if let Some(hash) = self.hash {
            return hash;
        }
        let mut hasher = ahash::AHasher::default();
        self.features().hash(&mut hasher);
        let hash = hasher.finish();
        self.hash = Some(hash);
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_updates_in_place() {
        let mut set = ShaderFeatureSet::default();
        set.set(SSAO, true);
        set.set(SSAO, false);
        assert_eq!(set.len(), 1);
        assert!(!set.is_enabled(SSAO));
    }

    #[test]
    fn test_features_are_sorted() {
        let mut set = ShaderFeatureSet::default();
        set.set(SSM, false);
        set.set(CG_LIGHTING, true);
        set.set(LIGHT_PROBE, true);
        let names: Vec<_> = set.features().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec![CG_LIGHTING, LIGHT_PROBE, SSM]);
    }

    #[test]
    fn test_hash_tracks_values() {
        let mut set = ShaderFeatureSet::default();
        set.set(SSAO, true);
        let first = set.hash_value();
        set.set(SSAO, false);
        assert_ne!(first, set.hash_value());
        set.set(SSAO, true);
        assert_eq!(first, set.hash_value());
    }

    #[test]
    fn test_clear_resets_hash() {
        let mut set = ShaderFeatureSet::default();
        let empty = set.hash_value();
        set.set(SSDO, true);
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.hash_value(), empty);
    }
}
