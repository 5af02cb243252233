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

use crate::asset::TextureData;
use crate::renderer::RenderMesh;
use std::sync::Arc;

/// Loads and caches GPU-side mesh and texture resources by path.
///
/// Both operations are fallible in the "nothing to draw" sense: a missing or
/// corrupt asset yields `None` and the preparation pipeline skips whatever
/// depended on it.
pub trait BufferManager {
    /// Returns the mesh stored at `path`, loading it on first use.
    fn load_mesh(&mut self, path: &str) -> Option<Arc<RenderMesh>>;

    /// Returns the texture stored at `path`, loading it on first use.
    ///
    /// When `scan_for_transparency` is set the implementation must inspect
    /// the texels and report transparency through the returned flags.
    fn load_render_image(&mut self, path: &str, scan_for_transparency: bool)
        -> Option<TextureData>;
}
