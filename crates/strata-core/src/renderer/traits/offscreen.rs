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
use crate::math::Vec2;

/// The texture produced by an offscreen renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffscreenResult {
    /// The rendered texture.
    pub texture: TextureData,
    /// The content does not cover the whole texture opaquely.
    pub has_transparency: bool,
    /// Colors are premultiplied by alpha.
    pub has_premultiplied_alpha: bool,
}

/// Renders sub-presentations into textures that images can sample.
pub trait OffscreenRenderManager {
    /// Renders (or fetches the cached result of) the renderer registered
    /// under `id` at the given presentation scale.
    fn render_texture(&mut self, id: &str, presentation_scale: Vec2) -> Option<OffscreenResult>;
}
