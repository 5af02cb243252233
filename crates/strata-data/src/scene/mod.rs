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

//! The scene snapshot the preparation pipeline walks every frame.
//!
//! This is a minimal retained graph: an arena of nodes with local transforms
//! and a closed [`NodeKind`], plus the material and image stores. Globals are
//! derived on demand by [`SceneGraph::calculate_global_variables`].

mod camera;
mod graph;
mod layer;
mod light;
mod model;
mod node;
mod path;
mod store;
mod text;

pub use camera::{CameraFrame, CameraNode, ProjectionType};
pub use graph::SceneGraph;
pub use layer::{
    AaMode, HorizontalFields, LayerNode, LayerPlacement, LayerUnits, LayerValue, VerticalFields,
};
pub use light::LightNode;
pub use model::ModelNode;
pub use node::{Node, NodeId, NodeKind};
pub use path::{PaintStyle, PathNode, PathType};
pub use store::{ImageStore, MaterialStore};
pub use text::{TextAlignment, TextNode};
