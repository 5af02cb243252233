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

//! Integration tests for the RenderAgent: preparation across layers, draw
//! list ordering and shader program lookups.

use std::sync::Arc;
use strata_agents::render_agent::{DrawCommand, RenderAgent};
use strata_core::asset::{CustomMaterial, DefaultMaterial, MaterialId, TextureData};
use strata_core::math::{Aabb, Vec2, Vec3};
use strata_core::renderer::{
    BufferManager, RenderError, RenderMesh, RenderSubset, ShaderCacheKey, ShaderProgramCache,
    ShaderProgramId,
};
use strata_data::scene::{CameraNode, ModelNode, Node, NodeId, NodeKind, SceneGraph, TextNode};
use strata_lanes::render_lane::{
    Collaborators, CustomMaterialSystem, TextRenderer, TextTexture,
};

const VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);

// --- Mock collaborators ---

struct Quads;

impl BufferManager for Quads {
    fn load_mesh(&mut self, _path: &str) -> Option<Arc<RenderMesh>> {
        let bounds = Aabb::from_min_max(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0));
        Some(Arc::new(RenderMesh {
            subsets: vec![RenderSubset::new("quad", 6, 0, bounds)],
            ..Default::default()
        }))
    }

    fn load_render_image(&mut self, _path: &str, _scan: bool) -> Option<TextureData> {
        None
    }
}

/// Compiles everything except custom shaders named `broken.glsl`.
#[derive(Default)]
struct Programs {
    compiles: Vec<ShaderCacheKey>,
}

impl ShaderProgramCache for Programs {
    fn compile_or_fetch(&mut self, key: &ShaderCacheKey) -> Option<ShaderProgramId> {
        self.compiles.push(key.clone());
        (key.material_path != "broken.glsl").then(|| ShaderProgramId(self.compiles.len() as u64))
    }
}

struct PassThrough;

impl CustomMaterialSystem for PassThrough {
    fn prepare_for_render(
        &mut self,
        _model: &ModelNode,
        _subset: &RenderSubset,
        _material: &CustomMaterial,
        _clear_dirty_flags: bool,
    ) -> bool {
        false
    }
}

struct Glyphs;

impl TextRenderer for Glyphs {
    fn render_text(&mut self, _text: &TextNode, _scale_factor: f32) -> Option<TextTexture> {
        Some(TextTexture {
            texture: TextureData::default(),
            text_scale: Vec2::ONE,
            text_offset: Vec2::ZERO,
            flip_y: false,
        })
    }
}

// --- Scene helpers ---

fn add_layer(graph: &mut SceneGraph) -> NodeId {
    let layer = graph.add_node(Node::new("layer", NodeKind::Layer(Box::default())));
    let camera = CameraNode::new_perspective(60.0_f32.to_radians(), 0.1, 1000.0);
    graph
        .add_child(
            layer,
            Node::new("camera", NodeKind::Camera(camera)).with_position(Vec3::new(0.0, 0.0, 10.0)),
        )
        .expect("layer exists");
    layer
}

fn add_quad(graph: &mut SceneGraph, layer: NodeId, material: MaterialId, z: f32, opacity: f32) -> NodeId {
    let model = ModelNode::new("quad", vec![material]);
    let node = Node::new("quad", NodeKind::Model(model))
        .with_position(Vec3::new(0.0, 0.0, z))
        .with_opacity(opacity);
    graph.add_child(layer, node).expect("layer exists")
}

fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

fn prepare(agent: &mut RenderAgent, graph: &mut SceneGraph, layer: NodeId) -> bool {
    init_logger();
    let mut buffers = Quads;
    let mut collaborators = Collaborators::new(&mut buffers);
    agent
        .prepare_layer_for_render(graph, layer, VIEWPORT, false, 0, &mut collaborators)
        .expect("layer is valid")
}

fn drawn_nodes(draws: &[DrawCommand]) -> Vec<(NodeId, bool)> {
    draws.iter().map(|d| (d.node, d.blended)).collect()
}

#[test]
fn test_draw_list_is_opaque_front_to_back_then_transparent_back_to_front() -> anyhow::Result<()> {
    // Create a layer with two opaque and two translucent quads
    let mut graph = SceneGraph::new();
    let layer = add_layer(&mut graph);
    let material = graph.materials.add(DefaultMaterial::default());
    let far_opaque = add_quad(&mut graph, layer, material, 0.0, 1.0);
    let near_opaque = add_quad(&mut graph, layer, material, 2.0, 1.0);
    let far_glass = add_quad(&mut graph, layer, material, -1.0, 0.5);
    let near_glass = add_quad(&mut graph, layer, material, 3.0, 0.5);

    // Prepare and render
    let mut agent = RenderAgent::new();
    agent.begin_frame();
    assert!(prepare(&mut agent, &mut graph, layer));
    let mut programs = Programs::default();
    let draws = agent.render_layer(&graph, layer, 0, &mut programs)?;

    assert_eq!(
        drawn_nodes(&draws),
        vec![
            (near_opaque, false),
            (far_opaque, false),
            (far_glass, true),
            (near_glass, true),
        ]
    );
    assert!(draws.iter().all(|d| d.program.is_some()));
    // Every quad shares one permutation
    assert_eq!(programs.compiles.len(), 1);
    Ok(())
}

#[test]
fn test_completely_transparent_objects_are_not_drawn() -> anyhow::Result<()> {
    let mut graph = SceneGraph::new();
    let layer = add_layer(&mut graph);
    let material = graph.materials.add(DefaultMaterial::default());
    let visible = add_quad(&mut graph, layer, material, 0.0, 1.0);
    add_quad(&mut graph, layer, material, 1.0, 0.001);

    let mut agent = RenderAgent::new();
    agent.begin_frame();
    prepare(&mut agent, &mut graph, layer);

    // The faint quad is still prepared, only its draw is dropped
    let data = agent.layer_data(layer, 0).expect("prepared");
    assert_eq!(data.transparent_objects().len(), 1);

    let draws = agent.render_layer(&graph, layer, 0, &mut Programs::default())?;
    assert_eq!(drawn_nodes(&draws), vec![(visible, false)]);
    Ok(())
}

#[test]
fn test_text_is_drawn_without_a_shader_program() -> anyhow::Result<()> {
    let mut graph = SceneGraph::new();
    let layer = add_layer(&mut graph);
    let label = graph
        .add_child(layer, Node::new("label", NodeKind::Text(TextNode::new("Score"))))
        .expect("layer exists");

    let mut agent = RenderAgent::new();
    agent.begin_frame();
    let mut buffers = Quads;
    let mut glyphs = Glyphs;
    let mut collaborators = Collaborators::new(&mut buffers).with_text(&mut glyphs);
    agent.prepare_layer_for_render(&mut graph, layer, VIEWPORT, false, 0, &mut collaborators)?;

    let mut programs = Programs::default();
    let draws = agent.render_layer(&graph, layer, 0, &mut programs)?;
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].node, label);
    assert_eq!(draws[0].program, None);
    assert!(draws[0].blended);
    assert!(programs.compiles.is_empty());
    Ok(())
}

#[test]
fn test_failed_programs_are_skipped_and_not_recompiled() -> anyhow::Result<()> {
    let mut graph = SceneGraph::new();
    let layer = add_layer(&mut graph);
    let broken = graph.materials.add(CustomMaterial::new("broken.glsl"));
    let plain = graph.materials.add(DefaultMaterial::default());
    add_quad(&mut graph, layer, broken, 0.0, 1.0);
    let drawn = add_quad(&mut graph, layer, plain, 1.0, 1.0);

    let mut agent = RenderAgent::new();
    let mut programs = Programs::default();
    for _ in 0..3 {
        agent.begin_frame();
        let mut buffers = Quads;
        let mut system = PassThrough;
        let mut collaborators =
            Collaborators::new(&mut buffers).with_custom_materials(&mut system);
        agent.prepare_layer_for_render(&mut graph, layer, VIEWPORT, false, 0, &mut collaborators)?;

        let draws = agent.render_layer(&graph, layer, 0, &mut programs)?;
        assert_eq!(drawn_nodes(&draws), vec![(drawn, false)]);
    }

    // One lookup per permutation, failures included
    assert_eq!(programs.compiles.len(), 2);
    assert_eq!(agent.cached_program_count(), 2);

    agent.invalidate_shader_programs();
    assert_eq!(agent.cached_program_count(), 0);
    agent.render_layer(&graph, layer, 0, &mut programs)?;
    assert_eq!(programs.compiles.len(), 4);
    Ok(())
}

#[test]
fn test_siblings_are_prepared_and_released_per_instance() -> anyhow::Result<()> {
    // Create three root layers, the last one inactive
    let mut graph = SceneGraph::new();
    let first = add_layer(&mut graph);
    let second = add_layer(&mut graph);
    let hidden = add_layer(&mut graph);
    graph.node_mut(hidden).expect("exists").active = false;

    let mut agent = RenderAgent::new();
    agent.begin_frame();
    let mut buffers = Quads;
    let mut collaborators = Collaborators::new(&mut buffers);
    agent.prepare_layer_for_render(&mut graph, first, VIEWPORT, true, 0, &mut collaborators)?;
    agent.prepare_layer_for_render(&mut graph, first, VIEWPORT, false, 1, &mut collaborators)?;
    drop(collaborators);

    assert_eq!(agent.cached_layer_count(), 3);
    assert!(agent.layer_data(second, 0).is_some_and(|d| d.is_prepared()));
    assert!(agent.layer_data(second, 1).is_none());
    assert!(agent.layer_data(hidden, 0).is_none());

    assert!(agent.release_layer_render_resources(first, 1));
    assert!(!agent.release_layer_render_resources(first, 1));
    assert_eq!(agent.cached_layer_count(), 2);
    Ok(())
}

#[test]
fn test_unchanged_scene_is_not_dirty_on_the_next_frame() {
    let mut graph = SceneGraph::new();
    let layer = add_layer(&mut graph);
    let material = graph.materials.add(DefaultMaterial::default());
    let quad = add_quad(&mut graph, layer, material, 0.0, 1.0);

    let mut agent = RenderAgent::new();
    agent.begin_frame();
    assert!(prepare(&mut agent, &mut graph, layer));
    agent.begin_frame();
    assert!(!prepare(&mut agent, &mut graph, layer));

    // Moving a node makes the layer dirty again
    graph.node_mut(quad).expect("exists").position = Vec3::new(0.5, 0.0, 0.0);
    agent.begin_frame();
    assert!(prepare(&mut agent, &mut graph, layer));
    assert_eq!(agent.frame_count(), 3);
}

#[test]
fn test_render_requires_a_prepared_layer() {
    let mut graph = SceneGraph::new();
    let layer = add_layer(&mut graph);
    let camera = graph.node(layer).expect("exists").children()[0];
    let mut agent = RenderAgent::new();
    let mut programs = Programs::default();

    assert_eq!(
        agent.render_layer(&graph, layer, 0, &mut programs),
        Err(RenderError::NotPrepared { layer: layer.0 })
    );

    agent.begin_frame();
    prepare(&mut agent, &mut graph, layer);
    assert!(agent.render_layer(&graph, layer, 0, &mut programs).is_ok());

    // A new frame forgets the preparation but keeps the cache entry
    agent.begin_frame();
    assert_eq!(
        agent.render_layer(&graph, layer, 0, &mut programs),
        Err(RenderError::NotPrepared { layer: layer.0 })
    );
    assert_eq!(agent.cached_layer_count(), 1);

    let mut buffers = Quads;
    let mut collaborators = Collaborators::new(&mut buffers);
    assert_eq!(
        agent.prepare_layer_for_render(&mut graph, camera, VIEWPORT, false, 0, &mut collaborators),
        Err(RenderError::NotALayer { node: camera.0 })
    );
}
