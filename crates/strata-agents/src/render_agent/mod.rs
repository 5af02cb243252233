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

//! The **[A]gent** of the renderer core.
//!
//! The agent decides which layers are prepared, keeps their render data
//! alive across frames and hands the frame renderer draw lists in the
//! order they must be issued. The per-frame work itself lives in
//! `strata_lanes::render_lane`.

mod agent;
mod draw;
mod picking;

pub use agent::*;
pub use draw::*;
pub use picking::*;
