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

//! The relocatable binary mesh format.
//!
//! A mesh is one contiguous [`MeshBlock`]: a [`Mesh`] record at offset 0 and
//! every variable-length section behind it, addressed by [`OffsetDataRef`]s
//! relative to the start of the block. Copying the block anywhere keeps it
//! valid.

mod block;
mod builder;
mod codec;
mod error;
mod format;
mod legacy;
mod multi;
mod offset_ref;
mod serializer;

pub use block::{MeshBlock, MESH_RECORD_SIZE};
pub use builder::{MeshBuilder, MeshBuilderEntry, NO_BOUNDS_ENTRY};
pub use error::MeshError;
pub use format::*;
pub use multi::{highest_multi_id, is_multi, read_trailer, MultiTrailer};
pub use offset_ref::OffsetDataRef;
