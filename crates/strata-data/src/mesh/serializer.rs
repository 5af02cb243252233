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

//! The single traversal behind counting, writing and reading mesh streams.
//!
//! [`streamify_mesh`] is the only definition of which sections a mesh stream
//! holds and in which order. It is generic over a [`MeshSerializer`]
//! strategy, and the three strategies ([`ByteCounter`], [`StreamWriter`],
//! [`StreamReader`]) only decide what happens to the bytes. Field order:
//!
//! 1. vertex entries, then each entry name
//! 2. vertex data
//! 3. index data
//! 4. subsets, then each subset name (when the layout has names)
//! 5. joints (when the layout has joints)
//!
//! Every section is followed by `4 - (position % 4)` bytes of zero padding,
//! so a section ending on a boundary still gets four. Positions count from
//! the start of the mesh record.

use super::error::MeshError;
use super::format::{
    IndexBuffer, Joint, Mesh, MeshSubset, MeshSubsetV1, MeshV1, MeshV2, VertexBuffer,
    VertexBufferEntry,
};
use super::offset_ref::OffsetDataRef;
use bytemuck::Pod;
use std::io::{self, Write};
use std::mem::size_of;

/// What a strategy does with each piece of the traversal.
pub(crate) trait MeshSerializer {
    /// The block the traversal reads records from.
    fn base(&self) -> &[u8];

    /// Handles one variable-length section.
    fn streamify_block<T: Pod>(&mut self, span: &mut OffsetDataRef<T>);

    /// Handles one NUL-terminated name stored as `u32` length + bytes.
    fn streamify_string(&mut self, name_offset: &mut u32);

    /// Pads to the next 4-byte boundary.
    fn align(&mut self);

    /// Receives a record after the traversal visited it.
    fn store<T: Pod>(&mut self, _at: usize, _record: &T) {}
}

/// The fields of a top-level mesh record the traversal visits.
pub(crate) struct MeshParts<'a, S> {
    pub vertex_buffer: &'a mut VertexBuffer,
    pub index_buffer: &'a mut IndexBuffer,
    pub subsets: &'a mut OffsetDataRef<S>,
    pub joints: Option<&'a mut OffsetDataRef<Joint>>,
}

/// A top-level mesh record of some format version.
pub(crate) trait MeshRecord: Pod {
    type Subset: SubsetRecord;

    fn parts(&mut self) -> MeshParts<'_, Self::Subset>;
}

/// A subset record of some format version.
pub(crate) trait SubsetRecord: Pod {
    fn name_mut(&mut self) -> Option<&mut OffsetDataRef<u16>>;
}

impl MeshRecord for Mesh {
    type Subset = MeshSubset;

    fn parts(&mut self) -> MeshParts<'_, MeshSubset> {
        MeshParts {
            vertex_buffer: &mut self.vertex_buffer,
            index_buffer: &mut self.index_buffer,
            subsets: &mut self.subsets,
            joints: Some(&mut self.joints),
        }
    }
}

impl MeshRecord for MeshV2 {
    type Subset = MeshSubset;

    fn parts(&mut self) -> MeshParts<'_, MeshSubset> {
        MeshParts {
            vertex_buffer: &mut self.vertex_buffer,
            index_buffer: &mut self.index_buffer,
            subsets: &mut self.subsets,
            joints: None,
        }
    }
}

impl MeshRecord for MeshV1 {
    type Subset = MeshSubsetV1;

    fn parts(&mut self) -> MeshParts<'_, MeshSubsetV1> {
        MeshParts {
            vertex_buffer: &mut self.vertex_buffer,
            index_buffer: &mut self.index_buffer,
            subsets: &mut self.subsets,
            joints: None,
        }
    }
}

impl SubsetRecord for MeshSubset {
    fn name_mut(&mut self) -> Option<&mut OffsetDataRef<u16>> {
        Some(&mut self.name)
    }
}

impl SubsetRecord for MeshSubsetV1 {
    fn name_mut(&mut self) -> Option<&mut OffsetDataRef<u16>> {
        None
    }
}

/// Visits every record of `span` as stored in the strategy's base block.
fn for_each_record<S, T, F>(s: &mut S, span: OffsetDataRef<T>, mut visit: F)
where
    S: MeshSerializer,
    T: Pod,
    F: FnMut(&mut S, &mut T),
{
    if !span.fits(s.base().len()) {
        return;
    }
    for i in 0..span.size {
        let at = span.offset as usize + i as usize * size_of::<T>();
        let mut record = span.read(s.base(), i);
        visit(s, &mut record);
        s.store(at, &record);
    }
}

/// Walks every section of `mesh` in stream order.
pub(crate) fn streamify_mesh<M: MeshRecord, S: MeshSerializer>(mesh: &mut M, s: &mut S) {
    let parts = mesh.parts();

    s.streamify_block(&mut parts.vertex_buffer.entries);
    s.align();
    for_each_record(s, parts.vertex_buffer.entries, |s, entry: &mut VertexBufferEntry| {
        s.streamify_string(&mut entry.name_offset);
        s.align();
    });

    s.streamify_block(&mut parts.vertex_buffer.data);
    s.align();

    s.streamify_block(&mut parts.index_buffer.data);
    s.align();

    s.streamify_block(parts.subsets);
    s.align();
    for_each_record(s, *parts.subsets, |s, subset: &mut M::Subset| {
        if let Some(name) = subset.name_mut() {
            s.streamify_block(name);
            s.align();
        }
    });

    if let Some(joints) = parts.joints {
        s.streamify_block(joints);
        s.align();
    }
}

/// The bytes of the NUL-terminated string at `offset`, without the NUL.
pub(crate) fn c_string(base: &[u8], offset: u32) -> &[u8] {
    if offset == 0 {
        return &[];
    }
    let tail = base.get(offset as usize..).unwrap_or(&[]);
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    &tail[..end]
}

fn padding(position: u64) -> u64 {
    4 - position % 4
}

/// Dry run: measures the stream without producing it.
pub(crate) struct ByteCounter<'a> {
    base: &'a [u8],
    position: u64,
}

impl<'a> ByteCounter<'a> {
    pub(crate) fn new(base: &'a [u8], record_size: usize) -> Self {
        Self {
            base,
            position: record_size as u64,
        }
    }

    /// Size of record plus stream, checked against the format's `u32` field.
    pub(crate) fn total(&self) -> Result<u32, MeshError> {
        u32::try_from(self.position).map_err(|_| MeshError::SizeOverflow)
    }
}

impl MeshSerializer for ByteCounter<'_> {
    fn base(&self) -> &[u8] {
        self.base
    }

    fn streamify_block<T: Pod>(&mut self, span: &mut OffsetDataRef<T>) {
        self.position += span.size as u64 * size_of::<T>() as u64;
    }

    fn streamify_string(&mut self, name_offset: &mut u32) {
        let len = c_string(self.base, *name_offset).len() as u64 + 1;
        self.position += 4 + len;
    }

    fn align(&mut self) {
        self.position += padding(self.position);
    }
}

/// Writes the stream of a current-format block.
pub(crate) struct StreamWriter<'a, W: Write> {
    base: &'a [u8],
    out: W,
    position: u64,
    error: Option<io::Error>,
}

impl<'a, W: Write> StreamWriter<'a, W> {
    pub(crate) fn new(base: &'a [u8], out: W, record_size: usize) -> Self {
        Self {
            base,
            out,
            position: record_size as u64,
            error: None,
        }
    }

    fn emit(&mut self, bytes: &[u8]) {
        if self.error.is_some() {
            return;
        }
        match self.out.write_all(bytes) {
            Ok(()) => self.position += bytes.len() as u64,
            Err(err) => self.error = Some(err),
        }
    }

    /// Position reached, or the first write error.
    pub(crate) fn finish(self) -> Result<u64, MeshError> {
        match self.error {
            Some(err) => Err(MeshError::Io(err)),
            None => Ok(self.position),
        }
    }
}

impl<W: Write> MeshSerializer for StreamWriter<'_, W> {
    fn base(&self) -> &[u8] {
        self.base
    }

    fn streamify_block<T: Pod>(&mut self, span: &mut OffsetDataRef<T>) {
        let bytes = span.bytes(self.base);
        self.emit(bytes);
    }

    fn streamify_string(&mut self, name_offset: &mut u32) {
        let name = c_string(self.base, *name_offset);
        let len = name.len() as u32 + 1;
        self.emit(&len.to_le_bytes());
        self.emit(name);
        self.emit(&[0]);
    }

    fn align(&mut self) {
        const ZEROS: [u8; 4] = [0; 4];
        let pad = padding(self.position) as usize;
        self.emit(&ZEROS[..pad]);
    }
}

/// Walks a loaded buffer, pointing every reference at the section that
/// follows in the stream. Stored sizes are trusted, stored offsets are not.
pub(crate) struct StreamReader<'a> {
    buf: &'a mut [u8],
    position: usize,
    failure: Option<&'static str>,
}

impl<'a> StreamReader<'a> {
    fn new(buf: &'a mut [u8], record_size: usize) -> Self {
        Self {
            buf,
            position: record_size,
            failure: None,
        }
    }

    fn fail(&mut self, reason: &'static str) {
        if self.failure.is_none() {
            self.failure = Some(reason);
        }
    }
}

impl MeshSerializer for StreamReader<'_> {
    fn base(&self) -> &[u8] {
        self.buf
    }

    fn streamify_block<T: Pod>(&mut self, span: &mut OffsetDataRef<T>) {
        if self.failure.is_some() || span.is_empty() {
            *span = OffsetDataRef::EMPTY;
            return;
        }
        let end = span
            .byte_len()
            .and_then(|len| self.position.checked_add(len as usize));
        match end {
            Some(end) if end <= self.buf.len() => {
                span.offset = self.position as u32;
                self.position = end;
            }
            _ => {
                *span = OffsetDataRef::EMPTY;
                self.fail("section exceeds the mesh block");
            }
        }
    }

    fn streamify_string(&mut self, name_offset: &mut u32) {
        *name_offset = 0;
        if self.failure.is_some() {
            return;
        }
        let Some(prefix) = self.buf.get(self.position..self.position + 4) else {
            self.fail("string length exceeds the mesh block");
            return;
        };
        let len = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        let start = self.position + 4;
        match start.checked_add(len) {
            Some(end) if end <= self.buf.len() => {
                if len > 0 {
                    *name_offset = start as u32;
                }
                self.position = end;
            }
            _ => self.fail("string exceeds the mesh block"),
        }
    }

    fn align(&mut self) {
        if self.failure.is_some() {
            return;
        }
        self.position += padding(self.position as u64) as usize;
        if self.position > self.buf.len() {
            self.fail("padding exceeds the mesh block");
        }
    }

    fn store<T: Pod>(&mut self, at: usize, record: &T) {
        let bytes = bytemuck::bytes_of(record);
        self.buf[at..at + bytes.len()].copy_from_slice(bytes);
    }
}

/// Size of record plus stream for the current-format mesh in `base`.
pub(crate) fn count_stream_bytes(base: &[u8]) -> Result<u32, MeshError> {
    let mut mesh: Mesh = bytemuck::pod_read_unaligned(&base[..size_of::<Mesh>()]);
    let mut counter = ByteCounter::new(base, size_of::<Mesh>());
    streamify_mesh(&mut mesh, &mut counter);
    counter.total()
}

/// Writes the stream (everything after the record) of the mesh in `base`.
/// Returns the final position, record included.
pub(crate) fn write_stream<W: Write>(base: &[u8], out: W) -> Result<u64, MeshError> {
    let mut mesh: Mesh = bytemuck::pod_read_unaligned(&base[..size_of::<Mesh>()]);
    let mut writer = StreamWriter::new(base, out, size_of::<Mesh>());
    streamify_mesh(&mut mesh, &mut writer);
    writer.finish()
}

/// Parses a loaded buffer in place as a record of layout `M` followed by
/// its stream. On success every reference of the record, and of the records
/// it points to, is relative to the start of `buf`.
pub(crate) fn read_stream<M: MeshRecord>(buf: &mut [u8]) -> Result<M, MeshError> {
    let record_size = size_of::<M>();
    if buf.len() < record_size {
        return Err(MeshError::SizeTooSmall(buf.len() as u32));
    }
    let mut record: M = bytemuck::pod_read_unaligned(&buf[..record_size]);
    let mut reader = StreamReader::new(buf, record_size);
    streamify_mesh(&mut record, &mut reader);
    if let Some(reason) = reader.failure {
        return Err(MeshError::Corrupt(reason));
    }
    buf[..record_size].copy_from_slice(bytemuck::bytes_of(&record));
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::block::{BlockLayout, MeshBlock};
    use strata_core::renderer::ComponentType;

    /// A block with one named F32x3 entry, 2 vertices and one named subset.
    fn sample_block() -> MeshBlock {
        let mut layout = BlockLayout::new();
        let entries = layout.reserve_items::<VertexBufferEntry>(1).unwrap();
        let name_at = layout.reserve(9).unwrap();
        let data = layout.reserve_items::<u8>(24).unwrap();
        let subsets = layout.reserve_items::<MeshSubset>(1).unwrap();
        let subset_name = layout.reserve_items::<u16>(3).unwrap();

        let mut block = MeshBlock::zeroed(layout.total() as usize);
        let bytes = block.as_bytes_mut();
        entries.slice_mut(bytes)[0] = VertexBufferEntry {
            name_offset: name_at,
            component_type: ComponentType::F32 as u32,
            num_components: 3,
            first_item_offset: 0,
        };
        bytes[name_at as usize..name_at as usize + 9].copy_from_slice(b"position\0");
        data.slice_mut(bytes).copy_from_slice(bytemuck::cast_slice(&[
            0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0,
        ]));
        subsets.slice_mut(bytes)[0] = MeshSubset {
            count: 2,
            offset: 0,
            bounds: Default::default(),
            name: subset_name,
        };
        subset_name
            .slice_mut(bytes)
            .copy_from_slice(&[u16::from(b'a'), u16::from(b'b'), 0]);
        block.set_mesh(&Mesh {
            vertex_buffer: VertexBuffer {
                entries,
                stride: 12,
                data,
            },
            subsets,
            ..Default::default()
        });
        block
    }

    #[test]
    fn test_counter_matches_writer() {
        let block = sample_block();
        let counted = count_stream_bytes(block.as_bytes()).unwrap();
        let mut out = Vec::new();
        let written = write_stream(block.as_bytes(), &mut out).unwrap();
        assert_eq!(counted as u64, written);
        assert_eq!(out.len() as u64 + size_of::<Mesh>() as u64, written);
    }

    #[test]
    fn test_stream_layout() {
        let block = sample_block();
        let mut out = Vec::new();
        write_stream(block.as_bytes(), &mut out).unwrap();
        // 56 record + 16 entries -> 72, padded to 76.
        assert_eq!(&out[16..20], &[0, 0, 0, 0]);
        // Name: length 9 incl. NUL, then bytes.
        assert_eq!(&out[20..24], &9u32.to_le_bytes());
        assert_eq!(&out[24..33], b"position\0");
    }

    #[test]
    fn test_reader_relocates_references() {
        let block = sample_block();
        let mut stream = bytemuck::bytes_of(block.mesh()).to_vec();
        write_stream(block.as_bytes(), &mut stream).unwrap();

        let mesh: Mesh = read_stream(&mut stream).unwrap();
        let loaded = MeshBlock::from_bytes(&stream);
        assert_eq!(loaded.mesh(), &mesh);
        assert_eq!(loaded.entry_name(0), Some("position"));
        assert_eq!(loaded.vertex_data(), block.vertex_data());
        assert_eq!(loaded.subset_name(0), "ab");
        assert_eq!(mesh.vertex_buffer.entries.offset, 56);
    }

    #[test]
    fn test_reader_rejects_truncated_stream() {
        let block = sample_block();
        let mut stream = bytemuck::bytes_of(block.mesh()).to_vec();
        write_stream(block.as_bytes(), &mut stream).unwrap();
        stream.truncate(100);
        assert!(matches!(
            read_stream::<Mesh>(&mut stream),
            Err(MeshError::Corrupt(_))
        ));
    }
}
