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

//! The renderer-side view of a loaded mesh.
//!
//! A [`RenderMesh`] is what the buffer manager hands to the preparation
//! pipeline: per-subset bounds, ranges and primitive modes. The vertex and
//! index bytes live wherever the buffer manager uploaded them.

use crate::math::Aabb;
use crate::renderer::enums::{DrawMode, Winding};

/// One drawable range of a mesh, normally bound to one material.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSubset {
    /// Subset name, used to match materials.
    pub name: String,
    /// Number of items (indices, or vertices for non-indexed meshes) to draw.
    pub count: u32,
    /// First item to draw.
    pub offset: u32,
    /// Object-space bounds computed when the mesh was built.
    pub bounds: Aabb,
    /// Primitive mode used when this subset is drawn.
    pub primitive: DrawMode,
    /// Outer tessellation factor, when tessellated.
    pub edge_tessellation: f32,
    /// Inner tessellation factor, when tessellated.
    pub inner_tessellation: f32,
    /// Whether the subset is drawn as a wireframe.
    pub wireframe: bool,
    /// Number of skinning joints affecting this subset.
    pub joint_count: u32,
}

impl RenderSubset {
    /// A subset with default tessellation settings.
    pub fn new(name: impl Into<String>, count: u32, offset: u32, bounds: Aabb) -> Self {
        Self {
            name: name.into(),
            count,
            offset,
            bounds,
            primitive: DrawMode::Triangles,
            edge_tessellation: 1.0,
            inner_tessellation: 1.0,
            wireframe: false,
            joint_count: 0,
        }
    }
}

/// A mesh ready to be drawn.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderMesh {
    /// Drawable ranges, in material order.
    pub subsets: Vec<RenderSubset>,
    /// Draw mode of the mesh as authored.
    pub draw_mode: DrawMode,
    /// Winding order of front faces.
    pub winding: Winding,
}

impl RenderMesh {
    /// Union of the bounds of every subset.
    pub fn bounds(&self) -> Aabb {
        self.subsets
            .iter()
            .fold(Aabb::EMPTY, |acc, s| acc.merge(&s.bounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn test_mesh_bounds_merge_subsets() {
        let mesh = RenderMesh {
            subsets: vec![
                RenderSubset::new("a", 3, 0, Aabb::from_min_max(Vec3::ZERO, Vec3::ONE)),
                RenderSubset::new("b", 3, 3, Aabb::from_min_max(-Vec3::ONE, Vec3::ZERO)),
            ],
            ..Default::default()
        };
        let b = mesh.bounds();
        assert_eq!(b.min, -Vec3::ONE);
        assert_eq!(b.max, Vec3::ONE);
        assert!(RenderMesh::default().bounds().is_empty());
    }
}
