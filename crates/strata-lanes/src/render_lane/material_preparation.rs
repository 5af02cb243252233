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

//! Material resolution, image loading and shader key derivation.

use super::collaborators::Collaborators;
use super::flags::RenderableFlags;
use super::renderable::RenderableImage;
use ahash::AHashSet;
use std::fmt;
use strata_core::asset::{
    BlendMode, CustomMaterial, DefaultMaterial, ImageId, MappingMode, Material, MaterialId,
    MaterialLighting, TextureData, TextureFlags,
};
use strata_core::math::Vec2;
use strata_core::renderer::{ImageKeyFlags, ImageMapSlot, LightProperties, ShaderKey};
use strata_data::allocators::{FrameArena, FrameHandle};
use strata_data::scene::{ImageStore, MaterialStore};

/// Why a material id does not lead to a drawable material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialResolveError {
    /// The id is not in the store, or a reference is empty.
    Missing(MaterialId),
    /// Following references came back to this material.
    Cycle(MaterialId),
    /// The reference chain is longer than allowed.
    TooDeep(MaterialId),
}

impl fmt::Display for MaterialResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterialResolveError::Missing(id) => write!(f, "Material {} does not exist", id.0),
            MaterialResolveError::Cycle(id) => {
                write!(f, "Material {} references itself", id.0)
            }
            MaterialResolveError::TooDeep(id) => {
                write!(f, "Reference chain starting at material {} is too long", id.0)
            }
        }
    }
}

impl std::error::Error for MaterialResolveError {}

/// The drawable material a reference chain ends at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMaterial {
    /// A default or custom material.
    pub id: MaterialId,
    /// The referenced materials walked through, in order.
    pub via: Vec<MaterialId>,
    /// One of the references changed since the last preparation.
    pub references_dirty: bool,
}

/// Follows referenced materials from `id` until a drawable material is
/// reached. Chains longer than `max_depth` and cycles are rejected.
pub fn resolve_material(
    materials: &MaterialStore,
    id: MaterialId,
    max_depth: u32,
) -> Result<ResolvedMaterial, MaterialResolveError> {
    let mut visited = AHashSet::new();
    let mut via = Vec::new();
    let mut references_dirty = false;
    let mut current = id;
    loop {
        let material = materials
            .get(current)
            .ok_or(MaterialResolveError::Missing(current))?;
        let Material::Referenced(reference) = material else {
            return Ok(ResolvedMaterial {
                id: current,
                via,
                references_dirty,
            });
        };
        if !visited.insert(current) {
            return Err(MaterialResolveError::Cycle(id));
        }
        if via.len() as u32 >= max_depth {
            return Err(MaterialResolveError::TooDeep(id));
        }
        via.push(current);
        references_dirty |= reference.dirty;
        current = reference
            .referenced
            .ok_or(MaterialResolveError::Missing(current))?;
    }
}

/// Derives the lighting part of a shader key.
///
/// Lights past the key's cap are ignored; the caller decides whether that
/// deserves a diagnostic.
pub fn generate_lighting_key(
    feature_set_hash: u64,
    lighting: MaterialLighting,
    lights: &[LightProperties],
    has_light_probe: bool,
) -> ShaderKey {
    let mut key = ShaderKey::new(feature_set_hash);
    let lit = lighting != MaterialLighting::NoLighting;
    key.set_lighting(lit);
    if !lit {
        return key;
    }
    key.set_ibl(has_light_probe);
    key.set_light_count(lights.len() as u32);
    for (index, light) in lights.iter().enumerate() {
        let index = index as u32;
        key.set_light_positional(index, !light.is_directional());
        key.set_light_area(index, light.is_area());
        key.set_light_shadow(index, light.casts_shadow_map());
    }
    key
}

/// Lighting state shared by every material of a renderable.
#[derive(Debug, Clone, Copy)]
pub struct LightingInputs<'a> {
    /// Hash of the layer's feature set.
    pub feature_set_hash: u64,
    /// Lights affecting the renderable, already capped.
    pub lights: &'a [LightProperties],
    /// The layer has a loaded light probe.
    pub layer_has_probe: bool,
    /// Scale of the presentation, passed to offscreen renderers.
    pub presentation_scale: Vec2,
}

impl LightingInputs<'_> {
    fn key(&self, lighting: MaterialLighting, material_has_probe: bool) -> ShaderKey {
        generate_lighting_key(
            self.feature_set_hash,
            lighting,
            self.lights,
            self.layer_has_probe || material_has_probe,
        )
    }
}

/// What preparing a material produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedMaterial {
    /// The permutation key.
    pub shader_key: ShaderKey,
    /// Head of the image chain.
    pub first_image: Option<FrameHandle<RenderableImage>>,
    /// Node opacity times material opacity.
    pub opacity: f32,
    /// Transparency and refraction flags.
    pub flags: RenderableFlags,
    /// The material or one of its images changed.
    pub dirty: bool,
}

/// Makes sure `image` has a texture, loading it when the image changed.
///
/// Returns the texture and whether it was (re)loaded this call.
pub(crate) fn ensure_texture(
    images: &mut ImageStore,
    id: ImageId,
    scan_for_transparency: bool,
    collaborators: &mut Collaborators<'_>,
    presentation_scale: Vec2,
) -> Option<(TextureData, bool)> {
    let image = images.get_mut(id)?;
    if !image.dirty {
        if let Some(texture) = image.texture_data {
            return Some((texture, false));
        }
    }

    let texture = match &image.offscreen_renderer_id {
        Some(renderer) => {
            let offscreen = collaborators.offscreen.as_deref_mut()?;
            let result = offscreen.render_texture(renderer, presentation_scale)?;
            let mut texture = result.texture;
            if result.has_transparency {
                texture.flags |= TextureFlags::HAS_TRANSPARENCY;
            }
            if result.has_premultiplied_alpha {
                texture.flags |= TextureFlags::PRE_MULTIPLIED;
            }
            Some(texture)
        }
        None => collaborators
            .buffer_manager
            .load_render_image(&image.image_path, scan_for_transparency),
    };
    image.texture_data = texture;
    image.dirty = false;
    if texture.is_none() {
        log::debug!("No texture for image '{}'", image.image_path);
    }
    texture.map(|t| (t, true))
}

/// Collects the images of one material and links them in the frame arena.
#[derive(Default)]
struct ImageChain {
    items: Vec<RenderableImage>,
    has_transparency: bool,
    dirty: bool,
}

impl ImageChain {
    fn add(
        &mut self,
        key: &mut ShaderKey,
        images: &mut ImageStore,
        id: ImageId,
        slot: ImageMapSlot,
        collaborators: &mut Collaborators<'_>,
        presentation_scale: Vec2,
    ) {
        let scan = slot.alpha_affects_transparency();
        let Some((texture, reloaded)) =
            ensure_texture(images, id, scan, collaborators, presentation_scale)
        else {
            return;
        };
        let Some(image) = images.get(id) else {
            return;
        };

        let mut key_flags = ImageKeyFlags::ENABLED;
        match image.mapping_mode {
            MappingMode::Normal => {}
            MappingMode::Environment => key_flags |= ImageKeyFlags::ENV_MAP,
            MappingMode::LightProbe => key_flags |= ImageKeyFlags::LIGHT_PROBE,
        }
        if texture.flags.contains(TextureFlags::INVERT_UV) {
            key_flags |= ImageKeyFlags::INVERT_UV;
        }
        if texture.flags.contains(TextureFlags::PRE_MULTIPLIED) {
            key_flags |= ImageKeyFlags::PREMULTIPLIED;
        }
        key.set_image_flags(slot, key_flags);
        key.set_swizzle(slot, texture.swizzle_mode());

        self.has_transparency |= scan && texture.has_transparency();
        self.dirty |= reloaded;
        self.items.push(RenderableImage {
            slot,
            image: id,
            texture,
            key_flags,
            texture_transform: image.texture_transform(),
            next: None,
        });
    }

    fn commit(self, arena: &mut FrameArena<RenderableImage>) -> Option<FrameHandle<RenderableImage>> {
        let mut next = None;
        for mut item in self.items.into_iter().rev() {
            item.next = next;
            next = Some(arena.alloc(item));
        }
        next
    }
}

fn material_probe(
    images: &mut ImageStore,
    probe: Option<ImageId>,
    collaborators: &mut Collaborators<'_>,
    scale: Vec2,
) -> bool {
    probe.is_some_and(|id| ensure_texture(images, id, false, collaborators, scale).is_some())
}

/// Prepares the built-in material.
pub fn prepare_default_material(
    material: &DefaultMaterial,
    node_opacity: f32,
    lighting: &LightingInputs<'_>,
    images: &mut ImageStore,
    collaborators: &mut Collaborators<'_>,
    arena: &mut FrameArena<RenderableImage>,
) -> PreparedMaterial {
    let scale = lighting.presentation_scale;
    let has_probe = material_probe(images, material.light_probe, collaborators, scale);
    let mut key = lighting.key(material.lighting, has_probe);
    key.set_specular_enabled(material.is_specular_enabled());
    key.set_fresnel_enabled(material.is_fresnel_enabled());
    key.set_vertex_colors_enabled(material.vertex_colors);
    key.set_specular_model(material.specular_model);

    let mut chain = ImageChain::default();
    for slot in ImageMapSlot::ALL {
        if let Some(id) = material.map(slot) {
            chain.add(&mut key, images, id, slot, collaborators, scale);
        }
    }

    let mut flags = RenderableFlags::NONE;
    if chain.has_transparency || material.blend_mode != BlendMode::Normal {
        flags |= RenderableFlags::HAS_TRANSPARENCY;
    }
    let dirty = material.dirty || chain.dirty;
    PreparedMaterial {
        shader_key: key,
        first_image: chain.commit(arena),
        opacity: node_opacity * material.opacity,
        flags,
        dirty,
    }
}

/// Prepares a shader-driven material. The custom material system's own
/// preparation is run by the caller, which knows the subset.
pub fn prepare_custom_material(
    material: &CustomMaterial,
    node_opacity: f32,
    lighting: &LightingInputs<'_>,
    images: &mut ImageStore,
    collaborators: &mut Collaborators<'_>,
    arena: &mut FrameArena<RenderableImage>,
) -> PreparedMaterial {
    let scale = lighting.presentation_scale;
    let has_probe = material_probe(images, material.light_probe, collaborators, scale);
    let mut key = lighting.key(material.lighting, has_probe);

    let mut chain = ImageChain::default();
    let maps = [
        (material.displacement_map, ImageMapSlot::Displacement),
        (material.lightmap_indirect, ImageMapSlot::LightmapIndirect),
        (material.lightmap_radiance, ImageMapSlot::LightmapRadiance),
        (material.lightmap_shadow, ImageMapSlot::LightmapShadow),
    ];
    for (image, slot) in maps {
        if let Some(id) = image {
            chain.add(&mut key, images, id, slot, collaborators, scale);
        }
    }

    let mut flags = RenderableFlags::NONE;
    if material.has_transparency || chain.has_transparency {
        flags |= RenderableFlags::HAS_TRANSPARENCY;
    }
    if material.has_refraction {
        flags |= RenderableFlags::HAS_REFRACTION | RenderableFlags::HAS_TRANSPARENCY;
    }
    let dirty = material.dirty || material.always_dirty || chain.dirty;
    PreparedMaterial {
        shader_key: key,
        first_image: chain.commit(arena),
        opacity: node_opacity,
        flags,
        dirty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strata_core::asset::{Image, ReferencedMaterial, TextureFlags};
    use strata_core::renderer::{BufferManager, LightType, RenderMesh, TextureFormat};

    struct Textures {
        loads: usize,
    }

    impl BufferManager for Textures {
        fn load_mesh(&mut self, _path: &str) -> Option<Arc<RenderMesh>> {
            None
        }

        fn load_render_image(&mut self, path: &str, _scan: bool) -> Option<TextureData> {
            self.loads += 1;
            (!path.is_empty()).then(|| TextureData {
                format: TextureFormat::Luminance8,
                flags: if path.contains("alpha") {
                    TextureFlags::HAS_TRANSPARENCY
                } else {
                    TextureFlags::NONE
                },
                ..Default::default()
            })
        }
    }

    fn reference(to: Option<MaterialId>) -> Material {
        Material::Referenced(ReferencedMaterial {
            referenced: to,
            dirty: false,
        })
    }

    #[test]
    fn test_resolve_follows_references() {
        let mut materials = MaterialStore::default();
        let base = materials.add(DefaultMaterial::default());
        let a = materials.add(reference(Some(base)));
        let b = materials.add(reference(Some(a)));
        let resolved = resolve_material(&materials, b, 32).unwrap();
        assert_eq!(resolved.id, base);
        assert_eq!(resolved.via, vec![b, a]);
        assert!(resolve_material(&materials, base, 32).unwrap().via.is_empty());
    }

    #[test]
    fn test_resolve_detects_cycles() {
        let mut materials = MaterialStore::default();
        let a = materials.add(reference(None));
        let b = materials.add(reference(Some(a)));
        *materials.get_mut(a).unwrap() = reference(Some(b));
        assert_eq!(
            resolve_material(&materials, a, 32),
            Err(MaterialResolveError::Cycle(a))
        );

        let selfish = materials.add(reference(None));
        *materials.get_mut(selfish).unwrap() = reference(Some(selfish));
        assert_eq!(
            resolve_material(&materials, selfish, 32),
            Err(MaterialResolveError::Cycle(selfish))
        );
    }

    #[test]
    fn test_resolve_limits_depth_and_reports_missing() {
        let mut materials = MaterialStore::default();
        let mut last = materials.add(DefaultMaterial::default());
        for _ in 0..4 {
            last = materials.add(reference(Some(last)));
        }
        assert!(resolve_material(&materials, last, 4).is_ok());
        assert_eq!(
            resolve_material(&materials, last, 3),
            Err(MaterialResolveError::TooDeep(last))
        );
        let dangling = materials.add(reference(None));
        assert_eq!(
            resolve_material(&materials, dangling, 4),
            Err(MaterialResolveError::Missing(dangling))
        );
        assert_eq!(
            resolve_material(&materials, MaterialId(99), 4),
            Err(MaterialResolveError::Missing(MaterialId(99)))
        );
    }

    #[test]
    fn test_lighting_key_per_light_bits() {
        let lights = [
            LightProperties::default(),
            LightProperties {
                light_type: LightType::Area,
                cast_shadow: true,
                ..Default::default()
            },
            LightProperties {
                light_type: LightType::Point,
                cast_shadow: true,
                ..Default::default()
            },
        ];
        let key = generate_lighting_key(7, MaterialLighting::FragmentLighting, &lights, true);
        assert!(key.has_lighting());
        assert!(key.has_ibl());
        assert_eq!(key.light_count(), 3);
        assert!(!key.light_positional(0));
        assert!(key.light_area(1) && !key.light_shadow(1));
        assert!(key.light_positional(2) && key.light_shadow(2));

        let unlit = generate_lighting_key(7, MaterialLighting::NoLighting, &lights, true);
        assert!(!unlit.has_lighting());
        assert_eq!(unlit.light_count(), 0);
    }

    #[test]
    fn test_default_material_images_and_transparency() {
        let mut store = ImageStore::default();
        let diffuse = store.add(Image::new("maps/alpha_leaf.png"));
        let bump = store.add(Image::new("maps/bump.png"));
        let mut material = DefaultMaterial::default();
        material.set_map(ImageMapSlot::Diffuse0, Some(diffuse));
        material.set_map(ImageMapSlot::Bump, Some(bump));
        material.opacity = 0.5;

        let mut textures = Textures { loads: 0 };
        let mut collaborators = Collaborators::new(&mut textures);
        let mut arena = FrameArena::new();
        let lighting = LightingInputs {
            feature_set_hash: 1,
            lights: &[],
            layer_has_probe: false,
            presentation_scale: Vec2::ONE,
        };
        let prepared = prepare_default_material(
            &material,
            0.8,
            &lighting,
            &mut store,
            &mut collaborators,
            &mut arena,
        );
        assert!(prepared.flags.has_transparency());
        assert!(prepared.dirty);
        assert!((prepared.opacity - 0.4).abs() < 1e-6);
        assert!(prepared
            .shader_key
            .image_flags(ImageMapSlot::Bump)
            .contains(ImageKeyFlags::ENABLED));

        let head = arena.get(prepared.first_image.unwrap()).unwrap();
        assert_eq!(head.slot, ImageMapSlot::Diffuse0);
        let second = arena.get(head.next.unwrap()).unwrap();
        assert_eq!(second.slot, ImageMapSlot::Bump);
        assert!(second.next.is_none());

        // Loaded images are not reloaded while clean.
        material.dirty = false;
        let again = prepare_default_material(
            &material,
            1.0,
            &lighting,
            &mut store,
            &mut collaborators,
            &mut arena,
        );
        assert!(!again.dirty);
        assert_eq!(again.shader_key, prepared.shader_key);
        drop(collaborators);
        assert_eq!(textures.loads, 2);
    }

    #[test]
    fn test_refraction_implies_transparency() {
        let mut material = CustomMaterial::new("shaders/water.glsl");
        material.has_refraction = true;
        let mut textures = Textures { loads: 0 };
        let mut collaborators = Collaborators::new(&mut textures);
        let prepared = prepare_custom_material(
            &material,
            1.0,
            &LightingInputs {
                feature_set_hash: 0,
                lights: &[],
                layer_has_probe: false,
                presentation_scale: Vec2::ONE,
            },
            &mut ImageStore::default(),
            &mut collaborators,
            &mut FrameArena::new(),
        );
        assert!(prepared
            .flags
            .contains(RenderableFlags::HAS_REFRACTION | RenderableFlags::HAS_TRANSPARENCY));
        assert!(prepared.first_image.is_none());
    }
}
