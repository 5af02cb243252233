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

//! Migration of version 1 and 2 meshes to the current layout.
//!
//! Legacy records are parsed in place with the shared traversal, then every
//! section is copied into a freshly laid out block. This is the only place
//! a loaded mesh gets new offsets.

use super::block::{MeshBlock, MeshSections};
use super::error::MeshError;
use super::format::{MeshSubset, MeshSubsetV1, MeshV1, MeshV2, VertexBufferEntry};
use super::serializer::{c_string, read_stream, MeshRecord, SubsetRecord};

/// A legacy top-level record.
pub(crate) trait LegacyMesh: MeshRecord {
    fn draw_mode(&self) -> u32;
    fn winding(&self) -> u32;
}

/// A legacy subset record.
pub(crate) trait LegacySubset: SubsetRecord {
    /// Range and bounds, with no name.
    fn geometry(&self) -> MeshSubset;
}

impl LegacyMesh for MeshV2 {
    fn draw_mode(&self) -> u32 {
        self.draw_mode
    }

    fn winding(&self) -> u32 {
        self.winding
    }
}

impl LegacyMesh for MeshV1 {
    fn draw_mode(&self) -> u32 {
        self.draw_mode
    }

    fn winding(&self) -> u32 {
        self.winding
    }
}

impl LegacySubset for MeshSubset {
    fn geometry(&self) -> MeshSubset {
        MeshSubset {
            name: Default::default(),
            ..*self
        }
    }
}

impl LegacySubset for MeshSubsetV1 {
    fn geometry(&self) -> MeshSubset {
        MeshSubset {
            count: self.count,
            offset: self.offset,
            bounds: self.bounds,
            name: Default::default(),
        }
    }
}

/// Parses `buf` as a legacy mesh of layout `M` and rebuilds it as a
/// current-format block. Entries, vertex and index bytes are copied
/// verbatim. Subset names are kept when `M` has them and left empty
/// otherwise.
pub(crate) fn migrate<M>(buf: &mut [u8]) -> Result<MeshBlock, MeshError>
where
    M: LegacyMesh,
    M::Subset: LegacySubset,
{
    let mut old: M = read_stream(buf)?;
    let (draw_mode, winding) = (old.draw_mode(), old.winding());
    let parts = old.parts();
    let base: &[u8] = buf;

    let entry_span = parts.vertex_buffer.entries;
    let entries: Vec<(VertexBufferEntry, &[u8])> = (0..entry_span.size)
        .map(|i| {
            let entry = entry_span.read(base, i);
            (entry, c_string(base, entry.name_offset))
        })
        .collect();

    let subset_span = *parts.subsets;
    let subsets: Vec<(MeshSubset, Vec<u16>)> = (0..subset_span.size)
        .map(|i| {
            let mut subset = subset_span.read(base, i);
            let name = match subset.name_mut() {
                Some(name) => (0..name.size).map(|u| name.read(base, u)).collect(),
                None => Vec::new(),
            };
            (subset.geometry(), name)
        })
        .collect();

    log::debug!(
        "Migrating a legacy mesh with {} entries and {} subsets",
        entry_span.size,
        subset_span.size
    );

    MeshSections {
        entries,
        stride: parts.vertex_buffer.stride,
        vertex_data: parts.vertex_buffer.data.bytes(base),
        index_type: parts.index_buffer.component_type,
        index_data: parts.index_buffer.data.bytes(base),
        subsets,
        joints: &[],
        draw_mode,
        winding,
    }
    .pack()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::format::{IndexBuffer, VertexBuffer};
    use crate::mesh::offset_ref::OffsetDataRef;
    use crate::mesh::serializer::{streamify_mesh, ByteCounter};
    use std::mem::size_of;
    use strata_core::math::{Aabb, Vec3};
    use strata_core::renderer::ComponentType;

    /// A v2 stream: record, one unnamed entry, 12 bytes of vertex data,
    /// 3 u16 indices and one subset named "ab".
    fn v2_stream() -> Vec<u8> {
        let mut out = Vec::new();
        let record = MeshV2 {
            vertex_buffer: VertexBuffer {
                entries: OffsetDataRef::new(0, 1),
                stride: 12,
                data: OffsetDataRef::new(0, 12),
            },
            index_buffer: IndexBuffer {
                component_type: ComponentType::U16 as u32,
                data: OffsetDataRef::new(0, 6),
            },
            subsets: OffsetDataRef::new(0, 1),
            draw_mode: 7,
            winding: 2,
        };
        out.extend_from_slice(bytemuck::bytes_of(&record)); // 48
        out.extend_from_slice(bytemuck::bytes_of(&VertexBufferEntry {
            name_offset: 0,
            component_type: ComponentType::F32 as u32,
            num_components: 3,
            first_item_offset: 0,
        })); // 64
        out.extend_from_slice(&[0; 4]); // 68
        out.extend_from_slice(&1u32.to_le_bytes());
        out.push(0); // 73
        out.extend_from_slice(&[0; 3]); // 76
        out.extend_from_slice(bytemuck::cast_slice(&[1.0f32, 2.0, 3.0])); // 88
        out.extend_from_slice(&[0; 4]); // 92
        out.extend_from_slice(bytemuck::cast_slice(&[0u16, 0, 0])); // 98
        out.extend_from_slice(&[0; 2]); // 100
        out.extend_from_slice(bytemuck::bytes_of(&MeshSubset {
            count: 3,
            offset: 0,
            bounds: Aabb::from_min_max(Vec3::ZERO, Vec3::ONE),
            name: OffsetDataRef::new(0, 3),
        })); // 140
        out.extend_from_slice(&[0; 4]); // 144
        out.extend_from_slice(bytemuck::cast_slice(&[u16::from(b'a'), u16::from(b'b'), 0]));
        out.extend_from_slice(&[0; 2]); // 152
        out
    }

    #[test]
    fn test_v2_stream_size_matches_counter() {
        let mut stream = v2_stream();
        let mut record: MeshV2 = read_stream(&mut stream).unwrap();
        let mut counter = ByteCounter::new(&stream, size_of::<MeshV2>());
        streamify_mesh(&mut record, &mut counter);
        assert_eq!(counter.total().unwrap() as usize, stream.len());
    }

    #[test]
    fn test_v2_migration_keeps_names_and_data() {
        let block = migrate::<MeshV2>(&mut v2_stream()).unwrap();
        assert_eq!(block.subsets().len(), 1);
        assert_eq!(block.subset_name(0), "ab");
        assert_eq!(block.subsets()[0].count, 3);
        assert_eq!(block.entry_name(0), Some(""));
        assert_eq!(block.vertex_data(), bytemuck::cast_slice(&[1.0f32, 2.0, 3.0]));
        assert_eq!(block.index_type(), Some(ComponentType::U16));
        assert!(block.joints().is_empty());
    }

    #[test]
    fn test_truncated_legacy_stream_is_corrupt() {
        let mut stream = v2_stream();
        stream.truncate(120);
        assert!(matches!(
            migrate::<MeshV2>(&mut stream),
            Err(MeshError::Corrupt(_))
        ));
    }
}
