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

//! Model nodes: a mesh drawn with one material per subset.

use strata_core::asset::MaterialId;
use strata_core::renderer::TessellationMode;

/// A mesh instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelNode {
    /// Path the buffer manager loads the mesh from.
    pub mesh_path: String,
    /// Material of each subset. Subsets past the end reuse the last one.
    pub materials: Vec<MaterialId>,
    /// Tessellation applied to every subset.
    pub tessellation: TessellationMode,
    /// Outer tessellation factor.
    pub edge_tessellation: f32,
    /// Inner tessellation factor.
    pub inner_tessellation: f32,
}

impl ModelNode {
    /// A model loading `mesh_path`, drawn with `materials`.
    pub fn new(mesh_path: impl Into<String>, materials: Vec<MaterialId>) -> Self {
        Self {
            mesh_path: mesh_path.into(),
            materials,
            tessellation: TessellationMode::None,
            edge_tessellation: 4.0,
            inner_tessellation: 4.0,
        }
    }

    /// The material of subset `index`.
    pub fn material_for_subset(&self, index: usize) -> Option<MaterialId> {
        self.materials
            .get(index)
            .or_else(|| self.materials.last())
            .copied()
    }
}
