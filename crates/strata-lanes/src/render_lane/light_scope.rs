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

//! Incremental assignment of scoped lights to renderable nodes.
//!
//! A scoped light only lights the sub-tree under its scope node. Sub-trees
//! are contiguous ranges of depth-first indices, so the renderables a scope
//! covers are found with a binary search. Light lists are only patched for
//! lights whose scope changed since the previous frame.

use ahash::AHashMap;
use std::ops::Range;
use strata_data::scene::{NodeId, SceneGraph};

/// Depth-first ranges of a layer and the scoped lights of each renderable.
#[derive(Debug, Default)]
pub struct LightScopes {
    ranges: AHashMap<NodeId, Range<u32>>,
    renderables: Vec<(u32, NodeId)>,
    previous: AHashMap<NodeId, Option<NodeId>>,
    assigned: AHashMap<NodeId, Vec<NodeId>>,
}

impl LightScopes {
    /// Creates empty bookkeeping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes depth-first indices under `root` and forgets every
    /// assignment. The next [`update`](Self::update) patches all scoped
    /// lights from scratch.
    pub fn rebuild(&mut self, graph: &SceneGraph, root: NodeId) {
        let order = graph.depth_first(root);
        let position: AHashMap<NodeId, usize> =
            order.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        // Reverse pre-order visits children before their parent.
        let mut sizes = vec![1u32; order.len()];
        for (i, &id) in order.iter().enumerate().rev() {
            let parent = graph.node(id).and_then(|n| n.parent());
            if let Some(&p) = parent.as_ref().and_then(|p| position.get(p)) {
                sizes[p] += sizes[i];
            }
        }

        self.ranges.clear();
        self.renderables.clear();
        for (i, &id) in order.iter().enumerate() {
            let start = i as u32;
            self.ranges.insert(id, start..start + sizes[i]);
            if graph.node(id).is_some_and(|n| n.kind.is_renderable()) {
                self.renderables.push((start, id));
            }
        }
        self.previous.clear();
        self.assigned.clear();
    }

    /// Depth-first index of `node`, if it is under the layer.
    pub fn dfs_index(&self, node: NodeId) -> Option<u32> {
        self.ranges.get(&node).map(|r| r.start)
    }

    /// Whether `node` is `scope` or one of its descendants.
    pub fn is_in_scope(&self, node: NodeId, scope: NodeId) -> bool {
        match (self.dfs_index(node), self.ranges.get(&scope)) {
            (Some(index), Some(range)) => range.contains(&index),
            _ => false,
        }
    }

    fn renderables_in(&self, scope: NodeId) -> &[(u32, NodeId)] {
        let Some(range) = self.ranges.get(&scope) else {
            return &[];
        };
        let start = self.renderables.partition_point(|(i, _)| *i < range.start);
        let end = self.renderables.partition_point(|(i, _)| *i < range.end);
        &self.renderables[start..end]
    }

    /// Applies this frame's active lights and their scopes. Returns whether
    /// any renderable's light list changed.
    pub fn update(&mut self, lights: &[(NodeId, Option<NodeId>)]) -> bool {
        let current: AHashMap<NodeId, Option<NodeId>> = lights.iter().copied().collect();
        let mut changed = false;

        let stale: Vec<(NodeId, NodeId)> = self
            .previous
            .iter()
            .filter_map(|(&light, &old)| {
                let old = old?;
                (current.get(&light) != Some(&Some(old))).then_some((light, old))
            })
            .collect();
        for (light, old_scope) in stale {
            let nodes: Vec<NodeId> = self.renderables_in(old_scope).iter().map(|&(_, n)| n).collect();
            for node in nodes {
                if let Some(list) = self.assigned.get_mut(&node) {
                    list.retain(|&l| l != light);
                }
            }
            changed = true;
        }

        for &(light, scope) in lights {
            let before = self.previous.get(&light).copied().flatten();
            let Some(scope) = scope else {
                continue;
            };
            if before == Some(scope) {
                continue;
            }
            let nodes: Vec<NodeId> = self.renderables_in(scope).iter().map(|&(_, n)| n).collect();
            for node in nodes {
                self.assigned.entry(node).or_default().push(light);
            }
            changed = true;
        }

        if changed {
            let ranges = &self.ranges;
            for list in self.assigned.values_mut() {
                list.sort_by_key(|l| ranges.get(l).map_or(u32::MAX, |r| r.start));
                list.dedup();
            }
            log::trace!("Light scopes patched for {} lights", lights.len());
        }
        self.previous = current;
        changed
    }

    /// Scoped lights reaching `node`, in depth-first order.
    pub fn lights_for(&self, node: NodeId) -> &[NodeId] {
        self.assigned.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::renderer::LightProperties;
    use strata_data::scene::{LightNode, ModelNode, Node, NodeKind};

    struct Scene {
        graph: SceneGraph,
        root: NodeId,
        left: NodeId,
        left_model: NodeId,
        right_model: NodeId,
        light: NodeId,
    }

    fn scene() -> Scene {
        let mut graph = SceneGraph::new();
        let root = graph.add_node(Node::new("root", NodeKind::Group));
        let left = graph.add_child(root, Node::new("left", NodeKind::Group)).unwrap();
        let model = || NodeKind::Model(ModelNode::new("mesh", Vec::new()));
        let left_model = graph.add_child(left, Node::new("lm", model())).unwrap();
        let right = graph.add_child(root, Node::new("right", NodeKind::Group)).unwrap();
        let right_model = graph.add_child(right, Node::new("rm", model())).unwrap();
        let light = graph
            .add_child(
                root,
                Node::new("light", NodeKind::Light(LightNode::new(LightProperties::default()))),
            )
            .unwrap();
        Scene {
            graph,
            root,
            left,
            left_model,
            right_model,
            light,
        }
    }

    #[test]
    fn test_ranges_cover_subtrees() {
        let s = scene();
        let mut scopes = LightScopes::new();
        scopes.rebuild(&s.graph, s.root);
        assert_eq!(scopes.dfs_index(s.root), Some(0));
        assert!(scopes.is_in_scope(s.left_model, s.left));
        assert!(!scopes.is_in_scope(s.right_model, s.left));
        assert!(scopes.is_in_scope(s.right_model, s.root));
        assert!(scopes.is_in_scope(s.left, s.left));
    }

    #[test]
    fn test_scope_changes_patch_light_lists() {
        let s = scene();
        let mut scopes = LightScopes::new();
        scopes.rebuild(&s.graph, s.root);

        assert!(scopes.update(&[(s.light, Some(s.left))]));
        assert_eq!(scopes.lights_for(s.left_model), &[s.light]);
        assert!(scopes.lights_for(s.right_model).is_empty());

        // Same scope: nothing to patch.
        assert!(!scopes.update(&[(s.light, Some(s.left))]));

        // Widening the scope reaches both models, once each.
        assert!(scopes.update(&[(s.light, Some(s.root))]));
        assert_eq!(scopes.lights_for(s.left_model), &[s.light]);
        assert_eq!(scopes.lights_for(s.right_model), &[s.light]);

        // An unscoped or vanished light leaves no scoped entries behind.
        assert!(scopes.update(&[(s.light, None)]));
        assert!(scopes.lights_for(s.left_model).is_empty());
        assert!(!scopes.update(&[]));
    }

    #[test]
    fn test_rebuild_forgets_assignments() {
        let s = scene();
        let mut scopes = LightScopes::new();
        scopes.rebuild(&s.graph, s.root);
        scopes.update(&[(s.light, Some(s.left))]);
        scopes.rebuild(&s.graph, s.root);
        assert!(scopes.lights_for(s.left_model).is_empty());
        assert!(scopes.update(&[(s.light, Some(s.left))]));
        assert_eq!(scopes.lights_for(s.left_model), &[s.light]);
    }
}
