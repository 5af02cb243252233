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

//! On-disk records of the mesh format.
//!
//! Every record is `#[repr(C)]`, little-endian and viewed through `bytemuck`.
//! Sizes are part of the format and are checked at compile time below.
//!
//! A single-mesh file is a [`MeshDataHeader`] followed by `size_in_bytes`
//! bytes holding a [`Mesh`] record and its trailing sections. A multi-mesh
//! file is a sequence of single-mesh files followed by a trailer: the
//! [`MeshMultiEntry`] array, then a [`MeshMultiHeader`] as the last 16 bytes.

use super::offset_ref::OffsetDataRef;
use bytemuck::{Pod, Zeroable};
use std::mem::size_of;
use strata_core::math::Aabb;
use strata_core::renderer::{ComponentType, DrawMode, Winding};

/// Magic number of a single-mesh header (`-929005747` as a signed integer).
pub const MESH_FILE_ID: u32 = (-929005747i32) as u32;
/// Version written by this crate.
pub const CURRENT_MESH_VERSION: u16 = 3;
/// Magic number of a multi-mesh trailer.
pub const MULTI_FILE_ID: u32 = 555777497;
/// Version of the multi-mesh trailer.
pub const MULTI_VERSION: u32 = 1;
/// Subset count meaning "every remaining item".
pub const ALL_REMAINING_ITEMS: u32 = u32::MAX;

/// Describes one vertex attribute inside the interleaved vertex data.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct VertexBufferEntry {
    /// Offset of the NUL-terminated attribute name, `0` when unnamed.
    pub name_offset: u32,
    /// [`ComponentType`] code.
    pub component_type: u32,
    /// Components per item (1 to 4).
    pub num_components: u32,
    /// Byte offset of the attribute inside one vertex.
    pub first_item_offset: u32,
}

impl VertexBufferEntry {
    /// The component type, `None` for an unknown code.
    pub fn component_type(&self) -> Option<ComponentType> {
        ComponentType::try_from(self.component_type).ok()
    }

    /// Bytes taken by one item of this attribute.
    pub fn item_size(&self) -> u32 {
        self.component_type()
            .map_or(0, |t| t.size_in_bytes())
            .saturating_mul(self.num_components)
    }
}

/// Interleaved vertex data with its attribute table.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct VertexBuffer {
    /// Attribute table, in shader binding order.
    pub entries: OffsetDataRef<VertexBufferEntry>,
    /// Bytes per vertex.
    pub stride: u32,
    /// Raw vertex bytes.
    pub data: OffsetDataRef<u8>,
}

/// Index data. Empty means subsets index the vertex buffer directly.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct IndexBuffer {
    /// [`ComponentType`] code of one index.
    pub component_type: u32,
    /// Raw index bytes.
    pub data: OffsetDataRef<u8>,
}

impl IndexBuffer {
    /// The index type, `None` for an unknown code.
    pub fn component_type(&self) -> Option<ComponentType> {
        ComponentType::try_from(self.component_type).ok()
    }

    /// Number of indices.
    pub fn index_count(&self) -> u32 {
        match self.component_type().map(|t| t.size_in_bytes()) {
            Some(size) if size > 0 => self.data.size / size,
            _ => 0,
        }
    }
}

/// A drawable range of the mesh.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct MeshSubset {
    /// Item count, or [`ALL_REMAINING_ITEMS`].
    pub count: u32,
    /// First item, in items rather than bytes.
    pub offset: u32,
    /// Bounds computed when the subset was built.
    pub bounds: Aabb,
    /// UTF-16 name including its trailing NUL; empty when unnamed.
    pub name: OffsetDataRef<u16>,
}

impl MeshSubset {
    /// Whether the subset stores an explicit count.
    #[inline]
    pub fn has_count(&self) -> bool {
        self.count != ALL_REMAINING_ITEMS
    }
}

/// Subset record of format version 1, which had no names.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct MeshSubsetV1 {
    /// Item count, or [`ALL_REMAINING_ITEMS`].
    pub count: u32,
    /// First item.
    pub offset: u32,
    /// Bounds.
    pub bounds: Aabb,
}

/// A skeleton joint. Parents are referenced by id.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Joint {
    /// Identifier of the joint.
    pub joint_id: i32,
    /// Identifier of the parent joint, negative for roots.
    pub parent_id: i32,
    /// Column-major inverse bind pose.
    pub inverse_bind_pose: [f32; 16],
    /// Column-major local-to-global bone space transform.
    pub local_to_global_bone_space: [f32; 16],
}

/// The current top-level mesh record.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Mesh {
    /// Vertex data.
    pub vertex_buffer: VertexBuffer,
    /// Index data.
    pub index_buffer: IndexBuffer,
    /// Drawable ranges.
    pub subsets: OffsetDataRef<MeshSubset>,
    /// Skeleton.
    pub joints: OffsetDataRef<Joint>,
    /// [`DrawMode`] code.
    pub draw_mode: u32,
    /// [`Winding`] code.
    pub winding: u32,
}

impl Mesh {
    /// The draw mode, falling back to triangles for unknown codes.
    pub fn draw_mode(&self) -> DrawMode {
        DrawMode::try_from(self.draw_mode).unwrap_or_default()
    }

    /// The winding, falling back to counter-clockwise for unknown codes.
    pub fn winding(&self) -> Winding {
        Winding::try_from(self.winding).unwrap_or_default()
    }
}

/// Mesh record of format version 2: named subsets, no joints.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct MeshV2 {
    /// Vertex data.
    pub vertex_buffer: VertexBuffer,
    /// Index data.
    pub index_buffer: IndexBuffer,
    /// Drawable ranges.
    pub subsets: OffsetDataRef<MeshSubset>,
    /// [`DrawMode`] code.
    pub draw_mode: u32,
    /// [`Winding`] code.
    pub winding: u32,
}

/// Mesh record of format version 1: unnamed subsets, no joints.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct MeshV1 {
    /// Vertex data.
    pub vertex_buffer: VertexBuffer,
    /// Index data.
    pub index_buffer: IndexBuffer,
    /// Drawable ranges.
    pub subsets: OffsetDataRef<MeshSubsetV1>,
    /// [`DrawMode`] code.
    pub draw_mode: u32,
    /// [`Winding`] code.
    pub winding: u32,
}

/// Header preceding every serialized single mesh.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct MeshDataHeader {
    /// Must be [`MESH_FILE_ID`].
    pub file_id: u32,
    /// Format version, 1 to [`CURRENT_MESH_VERSION`].
    pub file_version: u16,
    /// Reserved.
    pub header_flags: u16,
    /// Bytes of mesh record plus sections that follow the header.
    pub size_in_bytes: u32,
}

impl MeshDataHeader {
    /// A header for a current-version mesh of `size_in_bytes` bytes.
    pub fn current(size_in_bytes: u32) -> Self {
        Self {
            file_id: MESH_FILE_ID,
            file_version: CURRENT_MESH_VERSION,
            header_flags: 0,
            size_in_bytes,
        }
    }
}

/// Location of one mesh in a multi-mesh file.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct MeshMultiEntry {
    /// Absolute file offset of the mesh's [`MeshDataHeader`].
    pub mesh_offset: u64,
    /// Identifier of the mesh, unique in the file.
    pub mesh_id: u32,
    /// Always zero.
    pub padding: u32,
}

/// The last 16 bytes of a multi-mesh file.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct MeshMultiHeader {
    /// Must be [`MULTI_FILE_ID`].
    pub file_id: u32,
    /// Must be [`MULTI_VERSION`].
    pub version: u32,
    /// Entry count; the stored offset is always zero and never read.
    pub entries: OffsetDataRef<MeshMultiEntry>,
}

impl MeshMultiHeader {
    /// Whether the magic number and version identify a trailer.
    pub fn is_valid(&self) -> bool {
        self.file_id == MULTI_FILE_ID && self.version == MULTI_VERSION
    }
}

const _: () = {
    assert!(size_of::<VertexBufferEntry>() == 16);
    assert!(size_of::<VertexBuffer>() == 20);
    assert!(size_of::<IndexBuffer>() == 12);
    assert!(size_of::<MeshSubset>() == 40);
    assert!(size_of::<MeshSubsetV1>() == 32);
    assert!(size_of::<Joint>() == 136);
    assert!(size_of::<Mesh>() == 56);
    assert!(size_of::<MeshV2>() == 48);
    assert!(size_of::<MeshV1>() == 48);
    assert!(size_of::<MeshDataHeader>() == 12);
    assert!(size_of::<MeshMultiEntry>() == 16);
    assert!(size_of::<MeshMultiHeader>() == 16);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_matches_signed_magic() {
        assert_eq!(MESH_FILE_ID as i32, -929005747);
        assert_eq!(MESH_FILE_ID.to_le_bytes(), (-929005747i32).to_le_bytes());
    }

    #[test]
    fn test_subset_sentinel() {
        let subset = MeshSubset {
            count: ALL_REMAINING_ITEMS,
            ..Default::default()
        };
        assert!(!subset.has_count());
    }

    #[test]
    fn test_index_count_from_type() {
        let ib = IndexBuffer {
            component_type: ComponentType::U16 as u32,
            data: OffsetDataRef::new(64, 12),
        };
        assert_eq!(ib.index_count(), 6);
        assert_eq!(IndexBuffer::default().index_count(), 0);
    }

    #[test]
    fn test_unknown_codes_fall_back() {
        let mesh = Mesh {
            draw_mode: 99,
            winding: 42,
            ..Default::default()
        };
        assert_eq!(mesh.draw_mode(), DrawMode::Triangles);
        assert_eq!(mesh.winding(), Winding::CounterClockwise);
    }
}
