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

//! The node arena and its tree operations.

use super::node::{Node, NodeId};
use super::store::{ImageStore, MaterialStore};
use strata_core::math::Mat4;

/// A scene: a forest of [`Node`]s plus the materials and images they use.
///
/// Nodes live in an arena indexed by [`NodeId`]. Every structural edit (add,
/// remove, reparent) bumps [`SceneGraph::structure_generation`], which lets
/// per-layer caches tell when their traversal order is stale.
#[derive(Debug, Default, Clone)]
pub struct SceneGraph {
    nodes: Vec<Option<Node>>,
    roots: Vec<NodeId>,
    structure_generation: u64,
    /// Materials referenced by models and paths.
    pub materials: MaterialStore,
    /// Images referenced by materials and layers.
    pub images: ImageStore,
}

impl SceneGraph {
    /// An empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node without a parent.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = self.insert(node);
        self.roots.push(id);
        id
    }

    /// Adds a node as the last child of `parent`. `None` when the parent
    /// does not exist.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> Option<NodeId> {
        if !self.contains(parent) {
            return None;
        }
        node.parent = Some(parent);
        let id = self.insert(node);
        self.slot_mut(parent)?.children.push(id);
        Some(id)
    }

    fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(node));
        self.structure_generation += 1;
        id
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    /// Whether `id` names a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// The node with id `id`.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Mutable access to a node. The node is marked dirty.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let node = self.slot_mut(id)?;
        node.dirty = true;
        Some(node)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Whether the scene has no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Nodes without a parent, in insertion order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Counter bumped by every structural edit.
    pub fn structure_generation(&self) -> u64 {
        self.structure_generation
    }

    /// Moves `child` under `parent`, or to the roots with `None`. Refuses to
    /// create a cycle.
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> bool {
        if !self.contains(child) {
            return false;
        }
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return false;
            }
            let mut cursor = Some(parent);
            while let Some(id) = cursor {
                if id == child {
                    log::warn!("Refusing to parent node {child:?} under its own descendant");
                    return false;
                }
                cursor = self.node(id).and_then(Node::parent);
            }
        }

        self.detach(child);
        match parent {
            Some(parent) => {
                if let Some(p) = self.slot_mut(parent) {
                    p.children.push(child);
                }
            }
            None => self.roots.push(child),
        }
        if let Some(node) = self.slot_mut(child) {
            node.parent = parent;
            node.dirty = true;
        }
        self.structure_generation += 1;
        true
    }

    fn detach(&mut self, id: NodeId) {
        let parent = self.node(id).and_then(Node::parent);
        match parent.and_then(|p| self.slot_mut(p)) {
            Some(p) => p.children.retain(|&c| c != id),
            None => self.roots.retain(|&r| r != id),
        }
    }

    /// Removes a node and its whole sub-tree.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.detach(id);
        for removed in self.depth_first(id) {
            self.nodes[removed.0 as usize] = None;
        }
        self.structure_generation += 1;
        true
    }

    /// The node after `id` among its parent's children (or among the roots).
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = match self.node(id)?.parent {
            Some(parent) => self.node(parent)?.children(),
            None => self.roots.as_slice(),
        };
        let at = siblings.iter().position(|&s| s == id)?;
        siblings.get(at + 1).copied()
    }

    /// `root` and its descendants in depth-first pre-order.
    pub fn depth_first(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            order.push(id);
            stack.extend(node.children.iter().rev());
        }
        order
    }

    /// Recomputes global transform, opacity and activity of `root` and its
    /// sub-tree. Only dirty nodes and their descendants are recomputed.
    /// Returns whether any node changed.
    pub fn calculate_global_variables(&mut self, root: NodeId) -> bool {
        let inherited = match self.node(root).and_then(Node::parent).and_then(|p| self.node(p)) {
            Some(parent) => (parent.global_transform, parent.global_opacity, parent.globally_active),
            None => (Mat4::IDENTITY, 1.0, true),
        };

        let mut any_changed = false;
        let mut stack = vec![(root, inherited, false)];
        while let Some((id, (transform, opacity, active), parent_changed)) = stack.pop() {
            let Some(node) = self.slot_mut(id) else {
                continue;
            };
            let changed = node.dirty || parent_changed;
            if changed {
                node.global_transform = transform * node.local_transform();
                node.global_opacity = opacity * node.local_opacity.clamp(0.0, 1.0);
                node.globally_active = active && node.active;
            }
            node.dirty = false;
            node.changed = changed;
            any_changed |= changed;

            let globals = (node.global_transform, node.global_opacity, node.globally_active);
            for &child in node.children.iter().rev() {
                stack.push((child, globals, changed));
            }
        }
        any_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NodeKind;
    use strata_core::math::{approx_eq, Vec3};

    fn group(name: &str) -> Node {
        Node::new(name, NodeKind::Group)
    }

    #[test]
    fn test_globals_follow_parents() {
        let mut graph = SceneGraph::new();
        let root = graph.add_node(group("root").with_position(Vec3::new(1.0, 0.0, 0.0)).with_opacity(0.5));
        let child = graph
            .add_child(root, group("child").with_position(Vec3::new(0.0, 2.0, 0.0)).with_opacity(0.5))
            .unwrap();

        assert!(graph.calculate_global_variables(root));
        let node = graph.node(child).unwrap();
        assert_eq!(node.global_position(), Vec3::new(1.0, 2.0, 0.0));
        assert!(approx_eq(node.global_opacity(), 0.25));

        assert!(!graph.calculate_global_variables(root));
        assert!(!graph.node(child).unwrap().changed());

        graph.node_mut(root).unwrap().active = false;
        assert!(graph.calculate_global_variables(root));
        assert!(!graph.node(child).unwrap().is_globally_active());
    }

    #[test]
    fn test_reparent_rejects_cycles() {
        let mut graph = SceneGraph::new();
        let a = graph.add_node(group("a"));
        let b = graph.add_child(a, group("b")).unwrap();
        let generation = graph.structure_generation();
        assert!(!graph.set_parent(a, Some(b)));
        assert_eq!(graph.structure_generation(), generation);

        let c = graph.add_node(group("c"));
        assert!(graph.set_parent(b, Some(c)));
        assert_eq!(graph.node(c).unwrap().children(), &[b]);
        assert!(graph.node(a).unwrap().children().is_empty());
    }

    #[test]
    fn test_remove_drops_subtree() {
        let mut graph = SceneGraph::new();
        let a = graph.add_node(group("a"));
        let b = graph.add_child(a, group("b")).unwrap();
        let c = graph.add_child(b, group("c")).unwrap();
        assert!(graph.remove_node(b));
        assert!(!graph.contains(c));
        assert_eq!(graph.len(), 1);
        assert!(graph.node(a).unwrap().children().is_empty());
    }

    #[test]
    fn test_siblings_and_traversal() {
        let mut graph = SceneGraph::new();
        let a = graph.add_node(group("a"));
        let b = graph.add_child(a, group("b")).unwrap();
        let c = graph.add_child(a, group("c")).unwrap();
        let d = graph.add_child(b, group("d")).unwrap();
        let l1 = graph.add_node(group("l1"));
        assert_eq!(graph.next_sibling(b), Some(c));
        assert_eq!(graph.next_sibling(c), None);
        assert_eq!(graph.next_sibling(a), Some(l1));
        assert_eq!(graph.depth_first(a), vec![a, b, d, c]);
    }
}
