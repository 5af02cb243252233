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

//! Backend-agnostic rendering contracts of the Strata renderer core.
//!
//! This module defines the vocabulary shared by the mesh codec, the
//! preparation lanes and the render agent: format enums, the renderer-side
//! mesh, lights, the shader permutation key and feature set, the traits the
//! core consumes from GPU-facing collaborators, and the error types.
//!
//! Nothing here talks to a graphics API. A backend implements the traits in
//! [`traits`] and receives [`ShaderCacheKey`]s and draw ranges back.

pub mod enums;
pub mod error;
pub mod features;
pub mod light;
pub mod mesh;
pub mod program;
pub mod settings;
pub mod shader_key;
pub mod traits;

pub use self::enums::*;
pub use self::error::RenderError;
pub use self::features::{ShaderFeature, ShaderFeatureSet};
pub use self::light::{LightProperties, LightType};
pub use self::mesh::{RenderMesh, RenderSubset};
pub use self::program::{ShaderCacheKey, ShaderProgramId};
pub use self::settings::{RendererSettings, SettingsError};
pub use self::shader_key::{ImageKeyFlags, ImageMapSlot, KeyBits, ShaderKey, MAX_KEY_LIGHTS};
pub use self::traits::{BufferManager, OffscreenRenderManager, OffscreenResult, ShaderProgramCache};
