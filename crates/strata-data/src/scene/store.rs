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

//! Arenas holding the materials and images scene nodes refer to.

use strata_core::asset::{Image, ImageId, Material, MaterialId};

/// All materials of a scene, addressed by [`MaterialId`].
#[derive(Debug, Default, Clone)]
pub struct MaterialStore {
    materials: Vec<Material>,
}

impl MaterialStore {
    /// Adds a material and returns its id.
    pub fn add(&mut self, material: impl Into<Material>) -> MaterialId {
        let id = MaterialId(self.materials.len() as u32);
        self.materials.push(material.into());
        id
    }

    /// The material with id `id`.
    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0 as usize)
    }

    /// Mutable access to a material.
    pub fn get_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.0 as usize)
    }

    /// Number of materials.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

/// All images of a scene, addressed by [`ImageId`].
#[derive(Debug, Default, Clone)]
pub struct ImageStore {
    images: Vec<Image>,
}

impl ImageStore {
    /// Adds an image and returns its id.
    pub fn add(&mut self, image: Image) -> ImageId {
        let id = ImageId(self.images.len() as u32);
        self.images.push(image);
        id
    }

    /// The image with id `id`.
    pub fn get(&self, id: ImageId) -> Option<&Image> {
        self.images.get(id.0 as usize)
    }

    /// Mutable access to an image.
    pub fn get_mut(&mut self, id: ImageId) -> Option<&mut Image> {
        self.images.get_mut(id.0 as usize)
    }

    /// Number of images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::asset::{DefaultMaterial, ReferencedMaterial};

    #[test]
    fn test_ids_are_sequential() {
        let mut store = MaterialStore::default();
        let a = store.add(DefaultMaterial::default());
        let b = store.add(ReferencedMaterial {
            referenced: Some(a),
            dirty: false,
        });
        assert_eq!((a, b), (MaterialId(0), MaterialId(1)));
        assert!(matches!(store.get(b), Some(Material::Referenced(_))));
        assert!(store.get(MaterialId(7)).is_none());

        let mut images = ImageStore::default();
        let img = images.add(Image::new("maps/wood.png"));
        assert_eq!(images.get(img).map(|i| i.image_path.as_str()), Some("maps/wood.png"));
    }
}
