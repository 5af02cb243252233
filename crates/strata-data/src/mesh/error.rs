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

//! Errors raised by the mesh codec and builder.

use thiserror::Error;

/// Everything that can go wrong reading, writing or packing a mesh.
#[derive(Debug, Error)]
pub enum MeshError {
    /// The underlying stream failed.
    #[error("mesh stream error: {0}")]
    Io(#[from] std::io::Error),
    /// The header does not start with the mesh magic number.
    #[error("invalid mesh file id 0x{0:08X}")]
    InvalidFileId(u32),
    /// The header names a version this crate cannot read.
    #[error("unsupported mesh version {0}")]
    UnsupportedVersion(u16),
    /// The header announces fewer bytes than a mesh record needs.
    #[error("mesh size {0} is smaller than a mesh record")]
    SizeTooSmall(u32),
    /// The stream ended before the announced size was read.
    #[error("mesh data truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes announced.
        expected: u64,
        /// Bytes available.
        actual: u64,
    },
    /// A section does not fit inside the mesh block.
    #[error("corrupt mesh data: {0}")]
    Corrupt(&'static str),
    /// A size or offset does not fit the format's 32-bit fields.
    #[error("mesh section sizes overflow 32 bits")]
    SizeOverflow,
    /// The stream has no multi-mesh trailer.
    #[error("stream is not a multi-mesh file")]
    NotMulti,
    /// The multi-mesh file holds no mesh with this id.
    #[error("mesh id {0} not found in multi-mesh file")]
    MeshIdNotFound(u32),
    /// The multi-mesh file already holds a mesh with this id.
    #[error("mesh id {0} already present in multi-mesh file")]
    DuplicateMeshId(u32),
}
