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

//! The render preparation lane: turns a layer of the scene graph into sorted
//! draw lists for the frame renderer.

mod collaborators;
mod flags;
mod layer_preparation;
mod light_scope;
mod material_preparation;
mod renderable;
mod result;

pub use collaborators::*;
pub use flags::*;
pub use layer_preparation::*;
pub use light_scope::*;
pub use material_preparation::{
    generate_lighting_key, prepare_custom_material, prepare_default_material, resolve_material,
    LightingInputs, MaterialResolveError, PreparedMaterial, ResolvedMaterial,
};
pub use renderable::*;
pub use result::*;
