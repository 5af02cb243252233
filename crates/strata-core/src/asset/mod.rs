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

//! Asset definitions shared between the scene graph and the renderer.
//!
//! Materials and images are plain data here. The stores that own them live
//! with the scene graph in `strata-data`; loading the GPU side of an image is
//! the buffer manager's job.

mod image;
mod material;

pub use image::*;
pub use material::*;
