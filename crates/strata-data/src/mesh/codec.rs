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

//! Reading and writing single meshes.
//!
//! A saved mesh is a [`MeshDataHeader`] followed by `size_in_bytes` bytes:
//! the [`Mesh`] record, then its sections in stream order. Versions 1 and 2
//! are still readable and are migrated to the current layout on load.

use super::block::{MeshBlock, MESH_RECORD_SIZE};
use super::error::MeshError;
use super::format::{Mesh, MeshDataHeader, MeshV1, MeshV2, CURRENT_MESH_VERSION, MESH_FILE_ID};
use super::legacy;
use super::serializer;
use std::io::{self, Read, Write};
use std::mem::size_of;

/// Fills `buf` completely, reporting how far it got when the input ends.
fn read_fully<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<(), MeshError> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(MeshError::Truncated {
                    expected: buf.len() as u64,
                    actual: filled as u64,
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Reads and validates a [`MeshDataHeader`].
pub(crate) fn read_header<R: Read>(input: &mut R) -> Result<MeshDataHeader, MeshError> {
    let mut raw = [0u8; size_of::<MeshDataHeader>()];
    read_fully(input, &mut raw)?;
    let header: MeshDataHeader = bytemuck::pod_read_unaligned(&raw);

    if header.file_id != MESH_FILE_ID {
        return Err(MeshError::InvalidFileId(header.file_id));
    }
    if header.file_version == 0 || header.file_version > CURRENT_MESH_VERSION {
        return Err(MeshError::UnsupportedVersion(header.file_version));
    }
    if header.size_in_bytes < MESH_RECORD_SIZE {
        return Err(MeshError::SizeTooSmall(header.size_in_bytes));
    }
    Ok(header)
}

impl MeshBlock {
    /// Writes the mesh with its header and returns the number of bytes
    /// written.
    ///
    /// The stream is measured first with the same traversal that writes it,
    /// so the header's size always matches what follows.
    pub fn save<W: Write>(&self, out: &mut W) -> Result<u32, MeshError> {
        let size = serializer::count_stream_bytes(self.as_bytes())?;
        let header = MeshDataHeader::current(size);
        out.write_all(bytemuck::bytes_of(&header))?;
        out.write_all(bytemuck::bytes_of(self.mesh()))?;
        let written = serializer::write_stream(self.as_bytes(), &mut *out)?;
        debug_assert_eq!(written, size as u64);

        (size as u64 + size_of::<MeshDataHeader>() as u64)
            .try_into()
            .map_err(|_| MeshError::SizeOverflow)
    }

    /// Reads one mesh written by [`MeshBlock::save`], or by an older version
    /// of the format.
    pub fn load<R: Read>(input: &mut R) -> Result<MeshBlock, MeshError> {
        let header = read_header(input)?;

        let expected = header.size_in_bytes as u64;
        let mut data = Vec::new();
        input.take(expected).read_to_end(&mut data)?;
        if (data.len() as u64) < expected {
            return Err(MeshError::Truncated {
                expected,
                actual: data.len() as u64,
            });
        }

        let block = match header.file_version {
            CURRENT_MESH_VERSION => {
                serializer::read_stream::<Mesh>(&mut data)?;
                MeshBlock::from_bytes(&data)
            }
            2 => legacy::migrate::<MeshV2>(&mut data)?,
            1 => legacy::migrate::<MeshV1>(&mut data)?,
            other => return Err(MeshError::UnsupportedVersion(other)),
        };
        validate_entries(&block)?;
        Ok(block)
    }

    /// [`MeshBlock::load`] for callers that treat a bad mesh as "no mesh".
    /// The failure is logged.
    pub fn load_opt<R: Read>(input: &mut R) -> Option<MeshBlock> {
        match Self::load(input) {
            Ok(block) => Some(block),
            Err(e) => {
                log::warn!("Failed to load mesh: {e}");
                None
            }
        }
    }
}

fn validate_entries(block: &MeshBlock) -> Result<(), MeshError> {
    let stride = block.stride();
    let fits_stride = |e: &super::format::VertexBufferEntry| {
        e.first_item_offset
            .checked_add(e.item_size())
            .is_some_and(|end| end <= stride)
    };
    if stride > 0 && !block.vertex_entries().iter().all(fits_stride) {
        return Err(MeshError::Corrupt("vertex attribute exceeds the stride"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::builder::{MeshBuilder, MeshBuilderEntry};
    use std::io::Cursor;
    use strata_core::renderer::ComponentType;

    fn triangle() -> MeshBlock {
        let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let mut builder = MeshBuilder::new();
        assert!(builder.set_vertex_buffer(&[MeshBuilderEntry::new(
            "attr_pos",
            bytemuck::cast_slice(&positions),
            ComponentType::F32,
            3,
        )]));
        builder.add_mesh_subset("tri", 3, 0, 0);
        builder.get_mesh().unwrap().clone()
    }

    #[test]
    fn test_save_reports_header_and_body() {
        let block = triangle();
        let mut out = Vec::new();
        let written = block.save(&mut out).unwrap();
        assert_eq!(written as usize, out.len());

        let header: MeshDataHeader = bytemuck::pod_read_unaligned(&out[..12]);
        assert_eq!(header.file_id, MESH_FILE_ID);
        assert_eq!(header.file_version, CURRENT_MESH_VERSION);
        assert_eq!(header.size_in_bytes as usize, out.len() - 12);
    }

    #[test]
    fn test_load_rejects_bad_magic() {
        let mut out = Vec::new();
        triangle().save(&mut out).unwrap();
        out[0] ^= 0xff;
        let err = MeshBlock::load(&mut Cursor::new(out)).unwrap_err();
        assert!(matches!(err, MeshError::InvalidFileId(_)));
    }

    #[test]
    fn test_load_rejects_future_version() {
        let mut out = Vec::new();
        triangle().save(&mut out).unwrap();
        out[4..6].copy_from_slice(&4u16.to_le_bytes());
        let err = MeshBlock::load(&mut Cursor::new(&out)).unwrap_err();
        assert!(matches!(err, MeshError::UnsupportedVersion(4)));

        out[4..6].copy_from_slice(&0u16.to_le_bytes());
        let err = MeshBlock::load(&mut Cursor::new(&out)).unwrap_err();
        assert!(matches!(err, MeshError::UnsupportedVersion(0)));
    }

    #[test]
    fn test_load_rejects_small_size() {
        let header = MeshDataHeader::current(40);
        let mut input = Cursor::new(bytemuck::bytes_of(&header).to_vec());
        assert!(matches!(
            MeshBlock::load(&mut input),
            Err(MeshError::SizeTooSmall(40))
        ));
    }

    #[test]
    fn test_load_reports_truncation() {
        let mut out = Vec::new();
        triangle().save(&mut out).unwrap();
        let full = out.len() as u64 - 12;
        out.truncate(70);
        match MeshBlock::load(&mut Cursor::new(out)) {
            Err(MeshError::Truncated { expected, actual }) => {
                assert_eq!(expected, full);
                assert_eq!(actual, 58);
            }
            other => panic!("expected truncation, got {other:?}"),
        }

        let err = MeshBlock::load(&mut Cursor::new(vec![1u8, 2, 3])).unwrap_err();
        assert!(matches!(
            err,
            MeshError::Truncated {
                expected: 12,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_load_opt_swallows_errors() {
        assert!(MeshBlock::load_opt(&mut Cursor::new(Vec::new())).is_none());
        let mut out = Vec::new();
        triangle().save(&mut out).unwrap();
        assert!(MeshBlock::load_opt(&mut Cursor::new(out)).is_some());
    }

    #[test]
    fn test_stored_offsets_are_ignored() {
        let block = triangle();
        let mut out = Vec::new();
        block.save(&mut out).unwrap();
        // Scramble the vertex data offset in the stored record.
        out[12 + 12..12 + 16].copy_from_slice(&9999u32.to_le_bytes());
        let loaded = MeshBlock::load(&mut Cursor::new(out)).unwrap();
        assert_eq!(loaded.vertex_data(), block.vertex_data());
    }
}
