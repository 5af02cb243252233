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

//! Draw lists handed to the frame renderer.

use ahash::AHashMap;
use strata_core::renderer::{ShaderCacheKey, ShaderProgramCache, ShaderProgramId};
use strata_data::allocators::FrameHandle;
use strata_data::scene::NodeId;
use strata_lanes::render_lane::RenderableObject;

/// One draw of a prepared renderable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCommand {
    /// The scene node the renderable came from.
    pub node: NodeId,
    /// The renderable, valid until the next frame begins.
    pub renderable: FrameHandle<RenderableObject>,
    /// Program to draw with. `None` for text, drawn by the text renderer.
    pub program: Option<ShaderProgramId>,
    /// The draw blends with what is already in the target.
    pub blended: bool,
}

/// Programs looked up so far, compile failures included, so a broken
/// permutation is neither recompiled nor reported every frame.
#[derive(Debug, Default)]
pub(crate) struct ProgramLookup {
    programs: AHashMap<ShaderCacheKey, Option<ShaderProgramId>>,
}

impl ProgramLookup {
    pub(crate) fn fetch(
        &mut self,
        key: ShaderCacheKey,
        shaders: &mut dyn ShaderProgramCache,
    ) -> Option<ShaderProgramId> {
        if let Some(program) = self.programs.get(&key) {
            return *program;
        }
        let program = shaders.compile_or_fetch(&key);
        if program.is_none() {
            let source = if key.material_path.is_empty() {
                "built-in material"
            } else {
                key.material_path.as_str()
            };
            log::error!(
                "Failed to compile shader program for {} (key {:?})",
                source,
                key.material_key
            );
        }
        self.programs.insert(key, program);
        program
    }

    pub(crate) fn len(&self) -> usize {
        self.programs.len()
    }

    pub(crate) fn clear(&mut self) {
        self.programs.clear();
    }
}
