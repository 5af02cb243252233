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

//! Scene nodes and their kinds.

use super::camera::CameraNode;
use super::layer::LayerNode;
use super::light::LightNode;
use super::model::ModelNode;
use super::path::PathNode;
use super::text::TextNode;
use strata_core::math::{Mat4, Quaternion, Vec3};

/// Index of a node in its [`SceneGraph`](super::SceneGraph). Ids are never
/// reused, so caches keyed by them cannot alias a later node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// What a node is.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A plain transform.
    Group,
    /// The root of an independently rendered layer.
    Layer(Box<LayerNode>),
    /// A camera.
    Camera(CameraNode),
    /// A light source.
    Light(LightNode),
    /// A mesh instance.
    Model(ModelNode),
    /// A text block.
    Text(TextNode),
    /// A path.
    Path(PathNode),
}

impl NodeKind {
    /// Whether the node produces renderables.
    pub fn is_renderable(&self) -> bool {
        matches!(self, NodeKind::Model(_) | NodeKind::Text(_) | NodeKind::Path(_))
    }
}

/// One node of the scene.
///
/// Local properties are public. Mutating them through
/// [`SceneGraph::node_mut`](super::SceneGraph::node_mut) marks the node dirty,
/// and the global values are recomputed by
/// [`SceneGraph::calculate_global_variables`](super::SceneGraph::calculate_global_variables).
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Display name.
    pub name: String,
    /// Translation relative to the parent.
    pub position: Vec3,
    /// Rotation relative to the parent.
    pub rotation: Quaternion,
    /// Scale relative to the parent.
    pub scale: Vec3,
    /// Local point the node rotates and scales around.
    pub pivot: Vec3,
    /// Opacity in `[0, 1]`, multiplied down the tree.
    pub local_opacity: f32,
    /// Inactive nodes and their sub-trees are skipped.
    pub active: bool,
    /// Whether picking may return this node.
    pub pickable: bool,
    /// What the node is.
    pub kind: NodeKind,

    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) dirty: bool,
    pub(crate) changed: bool,
    pub(crate) global_transform: Mat4,
    pub(crate) global_opacity: f32,
    pub(crate) globally_active: bool,
}

impl Node {
    /// A dirty, active, pickable node at the origin.
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            position: Vec3::ZERO,
            rotation: Quaternion::IDENTITY,
            scale: Vec3::ONE,
            pivot: Vec3::ZERO,
            local_opacity: 1.0,
            active: true,
            pickable: true,
            kind,
            parent: None,
            children: Vec::new(),
            dirty: true,
            changed: true,
            global_transform: Mat4::IDENTITY,
            global_opacity: 1.0,
            globally_active: true,
        }
    }

    /// Sets the local translation.
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Sets the local opacity.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.local_opacity = opacity;
        self
    }

    /// The local transform.
    pub fn local_transform(&self) -> Mat4 {
        Mat4::from_trs_pivot(self.position, self.rotation, self.scale, self.pivot)
    }

    /// The parent node.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Direct children, in order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Local to world transform.
    pub fn global_transform(&self) -> &Mat4 {
        &self.global_transform
    }

    /// Product of the opacities from the root down to this node.
    pub fn global_opacity(&self) -> f32 {
        self.global_opacity
    }

    /// Whether this node and all its ancestors are active.
    pub fn is_globally_active(&self) -> bool {
        self.globally_active
    }

    /// Whether the last global update changed this node.
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Whether local properties changed since the last global update.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// World-space position of the node's origin.
    pub fn global_position(&self) -> Vec3 {
        self.global_transform.translation()
    }

    /// World-space unit direction of the node's local `-Z` axis.
    pub fn global_direction(&self) -> Vec3 {
        self.global_transform
            .transform_vector(Vec3::FORWARD)
            .normalize()
    }

    /// The layer data of a layer node.
    pub fn as_layer(&self) -> Option<&LayerNode> {
        match &self.kind {
            NodeKind::Layer(layer) => Some(layer),
            _ => None,
        }
    }

    /// The camera data of a camera node.
    pub fn as_camera(&self) -> Option<&CameraNode> {
        match &self.kind {
            NodeKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    /// The light data of a light node.
    pub fn as_light(&self) -> Option<&LightNode> {
        match &self.kind {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }
}
