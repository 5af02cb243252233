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

//! Error types returned by the renderer orchestrator.

use std::fmt;

/// An error from a renderer entry point that needs a prepared layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The node passed as a layer is not a layer.
    NotALayer {
        /// Raw index of the offending node.
        node: u32,
    },
    /// The layer has not been prepared for the current frame.
    NotPrepared {
        /// Raw index of the layer node.
        layer: u32,
    },
    /// The layer has no active camera.
    NoCamera {
        /// Raw index of the layer node.
        layer: u32,
    },
    /// The camera's view-projection matrix cannot be inverted.
    DegenerateProjection,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NotALayer { node } => write!(f, "Node {node} is not a layer"),
            RenderError::NotPrepared { layer } => {
                write!(f, "Layer {layer} was not prepared for this frame")
            }
            RenderError::NoCamera { layer } => write!(f, "Layer {layer} has no active camera"),
            RenderError::DegenerateProjection => {
                write!(f, "Camera view-projection matrix is not invertible")
            }
        }
    }
}

impl std::error::Error for RenderError {}
