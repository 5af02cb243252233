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

//! # Strata Data
//!
//! Data layouts and allocators of the Strata renderer: the relocatable
//! binary mesh format with its codec and builder, the per-frame arena
//! renderables live in, and the scene graph snapshot the preparation lanes
//! walk every frame.

#![warn(missing_docs)]

pub mod allocators;
pub mod mesh;
pub mod scene;
