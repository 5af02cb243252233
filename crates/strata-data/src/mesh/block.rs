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

//! A mesh and all of its sections in one contiguous allocation.

use super::error::MeshError;
use super::format::{IndexBuffer, Joint, Mesh, MeshSubset, VertexBuffer, VertexBufferEntry};
use super::offset_ref::OffsetDataRef;
use std::fmt;
use std::mem::size_of;
use strata_core::renderer::{ComponentType, RenderMesh, RenderSubset};

/// Size of the [`Mesh`] record at the start of every block.
pub const MESH_RECORD_SIZE: u32 = size_of::<Mesh>() as u32;

/// A current-format mesh: the [`Mesh`] record at offset 0 followed by the
/// sections its [`OffsetDataRef`]s point into.
///
/// The storage is a `Vec<u32>`, so the block always starts on a 4-byte
/// boundary and every 4-byte-aligned section can be borrowed in place.
/// Blocks are only created by the codec, the migration path or the builder,
/// all of which guarantee that every reference lies inside the block.
#[derive(Clone, PartialEq, Eq)]
pub struct MeshBlock {
    words: Vec<u32>,
    len: usize,
}

impl fmt::Debug for MeshBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshBlock")
            .field("len", &self.len)
            .field("mesh", self.mesh())
            .finish()
    }
}

impl MeshBlock {
    /// A zero-filled block of `len` bytes.
    pub(crate) fn zeroed(len: usize) -> Self {
        debug_assert!(len >= MESH_RECORD_SIZE as usize);
        Self {
            words: vec![0; len.div_ceil(4)],
            len,
        }
    }

    /// A block holding a copy of `bytes`.
    pub(crate) fn from_bytes(bytes: &[u8]) -> Self {
        let mut block = Self::zeroed(bytes.len());
        block.as_bytes_mut().copy_from_slice(bytes);
        block
    }

    /// The raw bytes of the block.
    pub fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice(&self.words)[..self.len]
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut(&mut self.words)[..self.len]
    }

    /// Size of the block in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`: a block holds at least its mesh record.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The top-level record.
    pub fn mesh(&self) -> &Mesh {
        bytemuck::from_bytes(&self.as_bytes()[..MESH_RECORD_SIZE as usize])
    }

    pub(crate) fn set_mesh(&mut self, mesh: &Mesh) {
        self.as_bytes_mut()[..MESH_RECORD_SIZE as usize].copy_from_slice(bytemuck::bytes_of(mesh));
    }

    /// The vertex attribute table.
    pub fn vertex_entries(&self) -> &[VertexBufferEntry] {
        self.mesh().vertex_buffer.entries.slice(self.as_bytes())
    }

    /// Name of attribute `index`; empty when the attribute is unnamed.
    /// `None` when the index is out of range or the name is not UTF-8.
    pub fn entry_name(&self, index: usize) -> Option<&str> {
        let entry = self.vertex_entries().get(index)?;
        if entry.name_offset == 0 {
            return Some("");
        }
        let tail = self.as_bytes().get(entry.name_offset as usize..)?;
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        std::str::from_utf8(&tail[..end]).ok()
    }

    /// Index of the first attribute called `name`.
    pub fn entry_index(&self, name: &str) -> Option<usize> {
        (0..self.vertex_entries().len()).find(|&i| self.entry_name(i) == Some(name))
    }

    /// Bytes per vertex.
    pub fn stride(&self) -> u32 {
        self.mesh().vertex_buffer.stride
    }

    /// The interleaved vertex bytes.
    pub fn vertex_data(&self) -> &[u8] {
        self.mesh().vertex_buffer.data.bytes(self.as_bytes())
    }

    /// Number of whole vertices in the vertex data.
    pub fn vertex_count(&self) -> u32 {
        match self.stride() {
            0 => 0,
            stride => self.mesh().vertex_buffer.data.size / stride,
        }
    }

    /// The index type, `None` when there is no index buffer.
    pub fn index_type(&self) -> Option<ComponentType> {
        let ib = &self.mesh().index_buffer;
        if ib.data.is_empty() {
            None
        } else {
            ib.component_type()
        }
    }

    /// The raw index bytes.
    pub fn index_data(&self) -> &[u8] {
        self.mesh().index_buffer.data.bytes(self.as_bytes())
    }

    /// The drawable ranges.
    pub fn subsets(&self) -> &[MeshSubset] {
        self.mesh().subsets.slice(self.as_bytes())
    }

    /// Name of subset `index`, without its trailing NUL.
    pub fn subset_name(&self, index: usize) -> String {
        let Some(subset) = self.subsets().get(index) else {
            return String::new();
        };
        let units = subset.name.slice(self.as_bytes());
        let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
        String::from_utf16_lossy(&units[..end])
    }

    /// The skeleton.
    pub fn joints(&self) -> &[Joint] {
        self.mesh().joints.slice(self.as_bytes())
    }

    /// Number of items a subset draws, resolving the "all remaining" count
    /// against the index buffer or, without one, the vertex buffer.
    pub fn resolved_count(&self, subset: &MeshSubset) -> u32 {
        if subset.has_count() {
            return subset.count;
        }
        let total = match self.index_type() {
            Some(_) => self.mesh().index_buffer.index_count(),
            None => self.vertex_count(),
        };
        total.saturating_sub(subset.offset)
    }

    /// The renderer-side description of this mesh.
    pub fn to_render_mesh(&self) -> RenderMesh {
        let mesh = self.mesh();
        let joint_count = mesh.joints.size;
        let subsets = self
            .subsets()
            .iter()
            .enumerate()
            .map(|(i, subset)| {
                let mut out = RenderSubset::new(
                    self.subset_name(i),
                    self.resolved_count(subset),
                    subset.offset,
                    subset.bounds,
                );
                out.primitive = mesh.draw_mode();
                out.joint_count = joint_count;
                out
            })
            .collect();
        RenderMesh {
            subsets,
            draw_mode: mesh.draw_mode(),
            winding: mesh.winding(),
        }
    }
}

impl Default for MeshBlock {
    /// A block holding an empty mesh record.
    fn default() -> Self {
        let mut block = Self::zeroed(MESH_RECORD_SIZE as usize);
        block.set_mesh(&Mesh {
            draw_mode: strata_core::renderer::DrawMode::Triangles as u32,
            winding: strata_core::renderer::Winding::CounterClockwise as u32,
            ..Default::default()
        });
        block
    }
}

/// Places sections one after another behind the mesh record, each starting
/// on a 4-byte boundary. Empty sections take no space and get offset 0.
pub(crate) struct BlockLayout {
    cursor: u32,
}

impl BlockLayout {
    pub(crate) fn new() -> Self {
        Self {
            cursor: MESH_RECORD_SIZE,
        }
    }

    /// Reserves `bytes` bytes and returns their offset.
    pub(crate) fn reserve(&mut self, bytes: u32) -> Result<u32, MeshError> {
        if bytes == 0 {
            return Ok(0);
        }
        let at = self.cursor;
        self.cursor = at
            .checked_add(bytes)
            .and_then(|end| end.checked_add(3))
            .map(|end| end & !3)
            .ok_or(MeshError::SizeOverflow)?;
        Ok(at)
    }

    /// Reserves room for `count` items of `T`.
    pub(crate) fn reserve_items<T>(&mut self, count: u32) -> Result<OffsetDataRef<T>, MeshError> {
        let bytes = count
            .checked_mul(size_of::<T>() as u32)
            .ok_or(MeshError::SizeOverflow)?;
        Ok(OffsetDataRef::new(self.reserve(bytes)?, count))
    }

    /// Bytes needed for the record and every reserved section.
    pub(crate) fn total(&self) -> u32 {
        self.cursor
    }
}

/// Owned or borrowed pieces of a mesh, packed into a fresh [`MeshBlock`] in
/// one place so every producer lays blocks out the same way: vertex data,
/// entries, entry names, index data, subsets, subset names, joints.
pub(crate) struct MeshSections<'a> {
    /// Attribute descriptors with their names (no NUL). `name_offset` is
    /// ignored and rewritten.
    pub entries: Vec<(VertexBufferEntry, &'a [u8])>,
    pub stride: u32,
    pub vertex_data: &'a [u8],
    pub index_type: u32,
    pub index_data: &'a [u8],
    /// Subsets with their UTF-16 names, NUL included when non-empty.
    /// `name` is ignored and rewritten.
    pub subsets: Vec<(MeshSubset, Vec<u16>)>,
    pub joints: &'a [Joint],
    pub draw_mode: u32,
    pub winding: u32,
}

impl MeshSections<'_> {
    pub(crate) fn pack(&self) -> Result<MeshBlock, MeshError> {
        let len_u32 = |len: usize| u32::try_from(len).map_err(|_| MeshError::SizeOverflow);

        let mut layout = BlockLayout::new();
        let vertex_data = layout.reserve_items::<u8>(len_u32(self.vertex_data.len())?)?;
        let entries = layout.reserve_items::<VertexBufferEntry>(len_u32(self.entries.len())?)?;
        let mut name_offsets = Vec::with_capacity(self.entries.len());
        for (_, name) in &self.entries {
            let with_nul = len_u32(name.len())?
                .checked_add(1)
                .ok_or(MeshError::SizeOverflow)?;
            name_offsets.push(if name.is_empty() {
                0
            } else {
                layout.reserve(with_nul)?
            });
        }
        let index_data = layout.reserve_items::<u8>(len_u32(self.index_data.len())?)?;
        let subsets = layout.reserve_items::<MeshSubset>(len_u32(self.subsets.len())?)?;
        let mut subset_names = Vec::with_capacity(self.subsets.len());
        for (_, name) in &self.subsets {
            subset_names.push(layout.reserve_items::<u16>(len_u32(name.len())?)?);
        }
        let joints = layout.reserve_items::<Joint>(len_u32(self.joints.len())?)?;

        let mut block = MeshBlock::zeroed(layout.total() as usize);
        let bytes = block.as_bytes_mut();

        vertex_data.slice_mut(bytes).copy_from_slice(self.vertex_data);
        for (i, ((entry, name), &name_offset)) in
            self.entries.iter().zip(&name_offsets).enumerate()
        {
            entries.slice_mut(bytes)[i] = VertexBufferEntry {
                name_offset,
                ..*entry
            };
            if name_offset != 0 {
                let at = name_offset as usize;
                bytes[at..at + name.len()].copy_from_slice(name);
            }
        }
        index_data.slice_mut(bytes).copy_from_slice(self.index_data);
        for (i, ((subset, name), &name_ref)) in self.subsets.iter().zip(&subset_names).enumerate() {
            subsets.slice_mut(bytes)[i] = MeshSubset {
                name: name_ref,
                ..*subset
            };
            name_ref.slice_mut(bytes).copy_from_slice(name);
        }
        joints.slice_mut(bytes).copy_from_slice(self.joints);

        block.set_mesh(&Mesh {
            vertex_buffer: VertexBuffer {
                entries,
                stride: self.stride,
                data: vertex_data,
            },
            index_buffer: IndexBuffer {
                component_type: self.index_type,
                data: index_data,
            },
            subsets,
            joints,
            draw_mode: self.draw_mode,
            winding: self.winding,
        });
        Ok(block)
    }
}
