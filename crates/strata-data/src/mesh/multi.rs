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

//! Several meshes in one file.
//!
//! Meshes are stored back to back as in a single-mesh file and a trailer
//! closes the file: the entry table followed by a [`MeshMultiHeader`]. The
//! trailer is always the last bytes of the file, so every append writes the
//! new mesh over the old trailer and then a new trailer after it.

use super::block::MeshBlock;
use super::error::MeshError;
use super::format::{MeshMultiEntry, MeshMultiHeader, MULTI_FILE_ID, MULTI_VERSION};
use super::offset_ref::OffsetDataRef;
use std::io::{Read, Seek, SeekFrom, Write};
use std::mem::size_of;

const HEADER_SIZE: u64 = size_of::<MeshMultiHeader>() as u64;
const ENTRY_SIZE: u64 = size_of::<MeshMultiEntry>() as u64;

/// A parsed multi-mesh trailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiTrailer {
    /// One entry per stored mesh, in append order.
    pub entries: Vec<MeshMultiEntry>,
    /// Where mesh data ends and the trailer begins.
    pub data_end: u64,
}

impl MultiTrailer {
    /// The entry with the largest id.
    pub fn latest(&self) -> Option<&MeshMultiEntry> {
        self.entries.iter().max_by_key(|e| e.mesh_id)
    }

    /// The entry with id `mesh_id`.
    pub fn find(&self, mesh_id: u32) -> Option<&MeshMultiEntry> {
        self.entries.iter().find(|e| e.mesh_id == mesh_id)
    }

    /// Largest stored id, 0 for an empty file.
    pub fn highest_id(&self) -> u32 {
        self.latest().map_or(0, |e| e.mesh_id)
    }
}

/// Reads the trailer, `None` when the stream is not a multi-mesh file.
pub fn read_trailer<S: Read + Seek>(stream: &mut S) -> Result<Option<MultiTrailer>, MeshError> {
    let len = stream.seek(SeekFrom::End(0))?;
    if len < HEADER_SIZE {
        return Ok(None);
    }
    stream.seek(SeekFrom::Start(len - HEADER_SIZE))?;
    let mut raw = [0u8; size_of::<MeshMultiHeader>()];
    stream.read_exact(&mut raw)?;
    let header: MeshMultiHeader = bytemuck::pod_read_unaligned(&raw);
    if !header.is_valid() {
        return Ok(None);
    }

    let table_len = header.entries.size as u64 * ENTRY_SIZE;
    let data_end = len
        .checked_sub(HEADER_SIZE + table_len)
        .ok_or(MeshError::Corrupt("multi-mesh entry table exceeds the file"))?;
    stream.seek(SeekFrom::Start(data_end))?;
    let mut table = vec![0u8; table_len as usize];
    stream.read_exact(&mut table)?;
    let entries: Vec<MeshMultiEntry> = table
        .chunks_exact(ENTRY_SIZE as usize)
        .map(bytemuck::pod_read_unaligned)
        .collect();

    if entries.iter().any(|e| e.mesh_offset >= data_end) {
        return Err(MeshError::Corrupt("multi-mesh entry points past the mesh data"));
    }
    Ok(Some(MultiTrailer { entries, data_end }))
}

/// Whether the stream ends with a valid multi-mesh trailer.
pub fn is_multi<S: Read + Seek>(stream: &mut S) -> bool {
    matches!(read_trailer(stream), Ok(Some(_)))
}

/// Largest mesh id stored in the stream, 0 when it holds none.
pub fn highest_multi_id<S: Read + Seek>(stream: &mut S) -> Result<u32, MeshError> {
    Ok(read_trailer(stream)?.map_or(0, |t| t.highest_id()))
}

impl MeshBlock {
    /// Appends the mesh to a multi-mesh stream and returns its id.
    ///
    /// With `mesh_id == 0` the id is one more than the largest stored id.
    /// An explicit id must not be in use yet. A stream that is not a
    /// multi-mesh file yet is turned into one, keeping its current bytes.
    pub fn save_multi<S: Read + Write + Seek>(
        &self,
        stream: &mut S,
        mesh_id: u32,
    ) -> Result<u32, MeshError> {
        let (mut entries, data_end) = match read_trailer(stream)? {
            Some(trailer) => (trailer.entries, trailer.data_end),
            None => (Vec::new(), stream.seek(SeekFrom::End(0))?),
        };

        let mesh_id = if mesh_id == 0 {
            entries
                .iter()
                .map(|e| e.mesh_id)
                .max()
                .unwrap_or(0)
                .checked_add(1)
                .ok_or(MeshError::SizeOverflow)?
        } else if entries.iter().any(|e| e.mesh_id == mesh_id) {
            return Err(MeshError::DuplicateMeshId(mesh_id));
        } else {
            mesh_id
        };

        stream.seek(SeekFrom::Start(data_end))?;
        let written = self.save(stream)?;
        entries.push(MeshMultiEntry {
            mesh_offset: data_end,
            mesh_id,
            padding: 0,
        });

        let header = MeshMultiHeader {
            file_id: MULTI_FILE_ID,
            version: MULTI_VERSION,
            entries: OffsetDataRef::new(
                0,
                u32::try_from(entries.len()).map_err(|_| MeshError::SizeOverflow)?,
            ),
        };
        stream.write_all(bytemuck::cast_slice(&entries))?;
        stream.write_all(bytemuck::bytes_of(&header))?;
        stream.flush()?;

        log::debug!(
            "Appended mesh {mesh_id} ({written} bytes) at offset {data_end}, {} meshes stored",
            entries.len()
        );
        Ok(mesh_id)
    }

    /// Reads mesh `mesh_id` from a multi-mesh stream, or the one with the
    /// largest id when `mesh_id == 0`.
    pub fn load_multi<S: Read + Seek>(stream: &mut S, mesh_id: u32) -> Result<MeshBlock, MeshError> {
        let trailer = read_trailer(stream)?.ok_or(MeshError::NotMulti)?;
        let entry = if mesh_id == 0 {
            trailer.latest()
        } else {
            trailer.find(mesh_id)
        }
        .ok_or(MeshError::MeshIdNotFound(mesh_id))?;

        stream.seek(SeekFrom::Start(entry.mesh_offset))?;
        MeshBlock::load(&mut stream.take(trailer.data_end - entry.mesh_offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_empty_stream_is_not_multi() {
        let mut stream = Cursor::new(Vec::new());
        assert!(!is_multi(&mut stream));
        assert_eq!(highest_multi_id(&mut stream).unwrap(), 0);
        assert!(matches!(
            MeshBlock::load_multi(&mut stream, 0),
            Err(MeshError::NotMulti)
        ));
    }

    #[test]
    fn test_ids_increase_and_latest_wins() {
        let mut stream = Cursor::new(Vec::new());
        let block = MeshBlock::default();
        assert_eq!(block.save_multi(&mut stream, 0).unwrap(), 1);
        assert_eq!(block.save_multi(&mut stream, 0).unwrap(), 2);
        assert_eq!(block.save_multi(&mut stream, 10).unwrap(), 10);
        assert_eq!(block.save_multi(&mut stream, 0).unwrap(), 11);
        assert!(is_multi(&mut stream));
        assert_eq!(highest_multi_id(&mut stream).unwrap(), 11);

        let trailer = read_trailer(&mut stream).unwrap().unwrap();
        assert_eq!(trailer.entries.len(), 4);
        assert_eq!(
            stream.get_ref().len() as u64,
            trailer.data_end + 4 * ENTRY_SIZE + HEADER_SIZE
        );
    }

    #[test]
    fn test_duplicate_explicit_id_is_rejected() {
        let mut stream = Cursor::new(Vec::new());
        let block = MeshBlock::default();
        block.save_multi(&mut stream, 5).unwrap();
        assert!(matches!(
            block.save_multi(&mut stream, 5),
            Err(MeshError::DuplicateMeshId(5))
        ));
    }

    #[test]
    fn test_missing_id_is_reported() {
        let mut stream = Cursor::new(Vec::new());
        MeshBlock::default().save_multi(&mut stream, 0).unwrap();
        assert!(matches!(
            MeshBlock::load_multi(&mut stream, 3),
            Err(MeshError::MeshIdNotFound(3))
        ));
        assert!(MeshBlock::load_multi(&mut stream, 1).is_ok());
    }
}
