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

//! Integration tests for layer preparation with text, paths, custom
//! materials and offscreen images.

use approx::assert_relative_eq;
use std::sync::Arc;
use strata_core::asset::{
    CustomMaterial, DefaultMaterial, Image, Material, MaterialId, ReferencedMaterial, TextureData,
    TextureFlags, TextureHandle,
};
use strata_core::math::{Aabb, Rect, Vec2, Vec3};
use strata_core::renderer::{
    BufferManager, ImageKeyFlags, ImageMapSlot, OffscreenRenderManager, OffscreenResult,
    RenderMesh, RenderSubset, RendererSettings,
};
use strata_data::scene::{
    CameraNode, ModelNode, Node, NodeId, NodeKind, PaintStyle, PathNode, SceneGraph, TextNode,
};
use strata_lanes::render_lane::{
    Collaborators, CustomMaterialSystem, FrameAllocator, LayerRenderPreparationData,
    LayerRenderPreparationResult, PathManager, PrepareContext, RenderableFlags, RenderableKind,
    RenderableObject, TextRenderer, TextTexture,
};

const PRESENTATION: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

// --- Mock collaborators ---

struct Quads;

impl BufferManager for Quads {
    fn load_mesh(&mut self, path: &str) -> Option<Arc<RenderMesh>> {
        (path == "quad").then(|| {
            let bounds = Aabb::from_min_max(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0));
            Arc::new(RenderMesh {
                subsets: vec![RenderSubset::new("quad", 6, 0, bounds)],
                ..Default::default()
            })
        })
    }

    fn load_render_image(&mut self, path: &str, _scan: bool) -> Option<TextureData> {
        Some(TextureData {
            handle: TextureHandle(path.len() as u64),
            ..Default::default()
        })
    }
}

#[derive(Default)]
struct Offscreen {
    renders: Vec<String>,
}

impl OffscreenRenderManager for Offscreen {
    fn render_texture(&mut self, id: &str, _scale: Vec2) -> Option<OffscreenResult> {
        self.renders.push(id.to_owned());
        Some(OffscreenResult {
            texture: TextureData::default(),
            has_transparency: true,
            has_premultiplied_alpha: true,
        })
    }
}

#[derive(Default)]
struct ShaderMaterials {
    prepared: Vec<(String, bool)>,
}

impl CustomMaterialSystem for ShaderMaterials {
    fn prepare_for_render(
        &mut self,
        _model: &ModelNode,
        _subset: &RenderSubset,
        material: &CustomMaterial,
        clear_dirty_flags: bool,
    ) -> bool {
        self.prepared
            .push((material.shader_path.clone(), clear_dirty_flags));
        false
    }
}

#[derive(Default)]
struct Paths {
    prepared: usize,
}

impl PathManager for Paths {
    fn prepare_for_render(&mut self, _node: NodeId, _path: &PathNode) -> bool {
        self.prepared += 1;
        false
    }

    fn bounds(&self, _node: NodeId, _path: &PathNode) -> Aabb {
        Aabb::from_min_max(Vec3::new(-2.0, -2.0, 0.0), Vec3::new(2.0, 2.0, 0.0))
    }
}

struct Glyphs;

impl TextRenderer for Glyphs {
    fn render_text(&mut self, text: &TextNode, _scale_factor: f32) -> Option<TextTexture> {
        (!text.text.is_empty()).then(|| TextTexture {
            texture: TextureData::default(),
            text_scale: Vec2::new(2.0, 1.0),
            text_offset: Vec2::new(0.5, 0.0),
            flip_y: false,
        })
    }
}

// --- Scene helpers ---

struct Scene {
    graph: SceneGraph,
    layer: NodeId,
}

impl Scene {
    fn new() -> Self {
        let mut graph = SceneGraph::new();
        let layer = graph.add_node(Node::new("layer", NodeKind::Layer(Box::default())));
        let camera = CameraNode::new_perspective(60.0_f32.to_radians(), 0.1, 1000.0);
        graph
            .add_child(
                layer,
                Node::new("camera", NodeKind::Camera(camera))
                    .with_position(Vec3::new(0.0, 0.0, 10.0)),
            )
            .expect("layer exists");
        Self { graph, layer }
    }

    fn add(&mut self, node: Node) -> NodeId {
        self.graph.add_child(self.layer, node).expect("layer exists")
    }

    fn add_quad(&mut self, material: MaterialId) -> NodeId {
        let model = ModelNode::new("quad", vec![material]);
        self.add(Node::new("quad", NodeKind::Model(model)))
    }
}

fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

fn prepare(
    data: &mut LayerRenderPreparationData,
    scene: &mut Scene,
    collaborators: &mut Collaborators<'_>,
    frame: &mut FrameAllocator,
) -> LayerRenderPreparationResult {
    init_logger();
    let settings = RendererSettings::default();
    let mut ctx = PrepareContext::new(collaborators, &settings, frame);
    data.prepare_for_render(&mut scene.graph, PRESENTATION, &mut ctx)
        .clone()
}

fn objects<'f>(
    frame: &'f FrameAllocator,
    data: &LayerRenderPreparationData,
) -> Vec<&'f RenderableObject> {
    data.opaque_objects()
        .iter()
        .chain(data.transparent_objects())
        .filter_map(|h| frame.renderables.get(*h))
        .collect()
}

#[test]
fn test_text_is_transparent_and_always_pickable() {
    let mut scene = Scene::new();
    let mut label = Node::new("label", NodeKind::Text(TextNode::new("Hello")));
    label.pickable = false;
    let label = scene.add(label);
    scene.add(Node::new("empty", NodeKind::Text(TextNode::new(""))));

    let mut data = LayerRenderPreparationData::new(scene.layer);
    let mut frame = FrameAllocator::new();
    let mut buffers = Quads;
    let mut glyphs = Glyphs;
    let mut collaborators = Collaborators::new(&mut buffers).with_text(&mut glyphs);
    prepare(&mut data, &mut scene, &mut collaborators, &mut frame);

    // The empty text renders nothing and is skipped
    assert!(data.opaque_objects().is_empty());
    assert_eq!(data.transparent_objects().len(), 1);

    let text = objects(&frame, &data)[0];
    assert_eq!(text.node, label);
    assert!(text.flags.contains(RenderableFlags::PICKABLE));
    assert!(text.flags.has_transparency());
    assert!(matches!(text.kind, RenderableKind::Text(_)));
    assert_relative_eq!(text.bounds.min.x, -1.5);
    assert_relative_eq!(text.bounds.max.x, 2.5);
    assert_relative_eq!(text.bounds.max.y, 1.0);
}

#[test]
fn test_painted_path_needs_stencil_and_fills_before_stroking() {
    let mut scene = Scene::new();
    let fill = scene.graph.materials.add(DefaultMaterial::default());
    let stroke = scene.graph.materials.add(DefaultMaterial::default());
    let path = PathNode::painted(PaintStyle::FillAndStroke, Some(fill), Some(stroke));
    scene.add(Node::new("path", NodeKind::Path(path)));

    let mut data = LayerRenderPreparationData::new(scene.layer);
    let mut frame = FrameAllocator::new();
    let mut buffers = Quads;
    let mut paths = Paths::default();
    let mut collaborators = Collaborators::new(&mut buffers).with_paths(&mut paths);
    let result = prepare(&mut data, &mut scene, &mut collaborators, &mut frame);
    drop(collaborators);

    assert!(result.requires_stencil_buffer());
    assert_eq!(paths.prepared, 1);

    let passes: Vec<(bool, MaterialId)> = objects(&frame, &data)
        .iter()
        .filter_map(|o| match &o.kind {
            RenderableKind::Path(p) => Some((p.is_stroke, p.material)),
            _ => None,
        })
        .collect();
    assert_eq!(passes, vec![(false, fill), (true, stroke)]);
}

#[test]
fn test_paths_are_skipped_without_a_path_manager() {
    let mut scene = Scene::new();
    let material = scene.graph.materials.add(DefaultMaterial::default());
    scene.add(Node::new("path", NodeKind::Path(PathNode::geometry(material))));

    let mut data = LayerRenderPreparationData::new(scene.layer);
    let mut frame = FrameAllocator::new();
    let mut buffers = Quads;
    let mut collaborators = Collaborators::new(&mut buffers);
    let result = prepare(&mut data, &mut scene, &mut collaborators, &mut frame);

    assert!(!result.requires_stencil_buffer());
    assert!(objects(&frame, &data).is_empty());
}

#[test]
fn test_custom_material_is_prepared_by_its_system() {
    let mut scene = Scene::new();
    let mut glass = CustomMaterial::new("shaders/glass.glsl");
    glass.has_refraction = true;
    let glass = scene.graph.materials.add(glass);
    scene.add_quad(glass);

    let mut data = LayerRenderPreparationData::new(scene.layer);
    let mut frame = FrameAllocator::new();
    let mut buffers = Quads;
    let mut system = ShaderMaterials::default();
    let mut collaborators = Collaborators::new(&mut buffers).with_custom_materials(&mut system);
    prepare(&mut data, &mut scene, &mut collaborators, &mut frame);
    drop(collaborators);

    assert_eq!(system.prepared, vec![("shaders/glass.glsl".to_owned(), true)]);
    assert!(data.opaque_objects().is_empty());

    let object = objects(&frame, &data)[0];
    assert!(object.flags.contains(RenderableFlags::HAS_REFRACTION));
    let key = object
        .shader_cache_key(&scene.graph.materials, data.features())
        .expect("custom materials have a program");
    assert_eq!(key.material_path, "shaders/glass.glsl");
}

#[test]
fn test_custom_material_without_system_is_skipped() {
    let mut scene = Scene::new();
    let material = scene.graph.materials.add(CustomMaterial::new("shaders/water.glsl"));
    scene.add_quad(material);

    let mut data = LayerRenderPreparationData::new(scene.layer);
    let mut frame = FrameAllocator::new();
    let mut buffers = Quads;
    let mut collaborators = Collaborators::new(&mut buffers);
    prepare(&mut data, &mut scene, &mut collaborators, &mut frame);

    assert!(objects(&frame, &data).is_empty());
}

#[test]
fn test_offscreen_image_makes_material_transparent() {
    let mut scene = Scene::new();
    let mut image = Image::new("");
    image.offscreen_renderer_id = Some("minimap".to_owned());
    let image = scene.graph.images.add(image);
    let mut material = DefaultMaterial::default();
    material.set_map(ImageMapSlot::Diffuse0, Some(image));
    let material = scene.graph.materials.add(material);
    scene.add_quad(material);

    let mut data = LayerRenderPreparationData::new(scene.layer);
    let mut frame = FrameAllocator::new();
    let mut buffers = Quads;
    let mut offscreen = Offscreen::default();
    let mut collaborators = Collaborators::new(&mut buffers).with_offscreen(&mut offscreen);
    prepare(&mut data, &mut scene, &mut collaborators, &mut frame);
    drop(collaborators);

    assert_eq!(offscreen.renders, vec!["minimap".to_owned()]);
    assert_eq!(data.transparent_objects().len(), 1);

    let object = objects(&frame, &data)[0];
    let key = object.shader_key().expect("mesh key");
    let flags = key.image_flags(ImageMapSlot::Diffuse0);
    assert!(flags.contains(ImageKeyFlags::ENABLED));
    assert!(flags.contains(ImageKeyFlags::PREMULTIPLIED));

    let chain: Vec<_> = frame.image_chain(object.first_image()).collect();
    assert_eq!(chain.len(), 1);
    assert!(chain[0].texture.flags.contains(TextureFlags::HAS_TRANSPARENCY));
}

#[test]
fn test_self_referencing_material_is_skipped() {
    let mut scene = Scene::new();
    let looped = scene.graph.materials.add(ReferencedMaterial::default());
    if let Some(Material::Referenced(r)) = scene.graph.materials.get_mut(looped) {
        r.referenced = Some(looped);
    }
    let plain = scene.graph.materials.add(DefaultMaterial::default());
    scene.add_quad(looped);
    let drawn = scene.add_quad(plain);

    let mut data = LayerRenderPreparationData::new(scene.layer);
    let mut frame = FrameAllocator::new();
    let mut buffers = Quads;
    let mut collaborators = Collaborators::new(&mut buffers);
    for _ in 0..2 {
        frame.reset();
        data.reset_for_frame();
        prepare(&mut data, &mut scene, &mut collaborators, &mut frame);
        let nodes: Vec<NodeId> = objects(&frame, &data).iter().map(|o| o.node).collect();
        assert_eq!(nodes, vec![drawn]);
    }
}

#[test]
fn test_shader_cache_key_is_stable_between_frames() {
    let mut scene = Scene::new();
    let material = scene.graph.materials.add(DefaultMaterial::default());
    scene.add_quad(material);

    let mut data = LayerRenderPreparationData::new(scene.layer);
    let mut frame = FrameAllocator::new();
    let mut buffers = Quads;
    let mut collaborators = Collaborators::new(&mut buffers);

    let mut keys = Vec::new();
    for _ in 0..2 {
        frame.reset();
        data.reset_for_frame();
        prepare(&mut data, &mut scene, &mut collaborators, &mut frame);
        let handle = data.opaque_objects()[0];
        let object = frame.renderables.get(handle).expect("live handle").clone();
        let features = data.features().to_vec();
        keys.push(object.shader_cache_key(&scene.graph.materials, &features));
    }
    assert!(keys[0].is_some());
    assert_eq!(keys[0], keys[1]);
}
