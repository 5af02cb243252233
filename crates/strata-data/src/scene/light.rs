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

//! Light nodes.

use super::node::NodeId;
use strata_core::renderer::LightProperties;

/// A light placed in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightNode {
    /// Shading parameters.
    pub properties: LightProperties,
    /// When set, the light only affects the sub-tree rooted at this node.
    pub scope: Option<NodeId>,
}

impl LightNode {
    /// An unscoped light.
    pub fn new(properties: LightProperties) -> Self {
        Self {
            properties,
            scope: None,
        }
    }

    /// A light restricted to the sub-tree under `scope`.
    pub fn scoped(properties: LightProperties, scope: NodeId) -> Self {
        Self {
            properties,
            scope: Some(scope),
        }
    }
}
