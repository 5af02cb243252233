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

//! Immediate-mode assembly of a [`MeshBlock`].
//!
//! The builder owns loose arrays (attributes, indices, subsets, joints) and
//! packs them into a single block on [`MeshBuilder::get_mesh`]. Setters that
//! can reject their input return `false` and log why; they never panic.

use super::block::{MeshBlock, MeshSections};
use super::error::MeshError;
use super::format::{Joint, MeshSubset, VertexBufferEntry, ALL_REMAINING_ITEMS};
use strata_core::math::{Aabb, Vec3};
use strata_core::renderer::{ComponentType, DrawMode, Winding};

/// Passed as the position entry of [`MeshBuilder::add_mesh_subset`] when the
/// subset should get no bounds.
pub const NO_BOUNDS_ENTRY: u32 = u32::MAX;

/// One vertex attribute handed to the builder.
///
/// For [`MeshBuilder::set_vertex_buffer`] `data` holds this attribute only,
/// item after item. For [`MeshBuilder::set_vertex_buffer_interleaved`] `data`
/// is ignored and `first_item_offset` places the attribute in the stride.
#[derive(Debug, Clone, Copy)]
pub struct MeshBuilderEntry<'a> {
    /// Attribute name, matched against shader inputs.
    pub name: &'a str,
    /// Raw attribute data.
    pub data: &'a [u8],
    /// Scalar type of each component.
    pub component_type: ComponentType,
    /// Components per item.
    pub num_components: u32,
    /// Byte offset of the attribute inside an interleaved vertex.
    pub first_item_offset: u32,
}

impl<'a> MeshBuilderEntry<'a> {
    /// An attribute with its own, non-interleaved data.
    pub fn new(
        name: &'a str,
        data: &'a [u8],
        component_type: ComponentType,
        num_components: u32,
    ) -> Self {
        Self {
            name,
            data,
            component_type,
            num_components,
            first_item_offset: 0,
        }
    }

    /// An attribute at `first_item_offset` in already interleaved data.
    pub fn interleaved(
        name: &'a str,
        component_type: ComponentType,
        num_components: u32,
        first_item_offset: u32,
    ) -> Self {
        Self {
            name,
            data: &[],
            component_type,
            num_components,
            first_item_offset,
        }
    }

    fn item_size(&self) -> Option<u32> {
        self.component_type
            .size_in_bytes()
            .checked_mul(self.num_components)
    }
}

#[derive(Debug, Clone)]
struct Attribute {
    name: String,
    component_type: ComponentType,
    num_components: u32,
    first_item_offset: u32,
}

#[derive(Debug, Clone)]
struct Subset {
    name: String,
    count: u32,
    offset: u32,
    bounds: Aabb,
    // Attribute the bounds were computed from, or `NO_BOUNDS_ENTRY`.
    position_entry: u32,
}

fn align_up(value: u32, alignment: u32) -> Option<u32> {
    if alignment <= 1 {
        return Some(value);
    }
    Some(value.checked_add(alignment - 1)? / alignment * alignment)
}

/// Builds meshes one piece at a time.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    attributes: Vec<Attribute>,
    stride: u32,
    vertex_data: Vec<u8>,
    index_type: Option<ComponentType>,
    index_data: Vec<u8>,
    subsets: Vec<Subset>,
    joints: Vec<Joint>,
    draw_mode: DrawMode,
    winding: Winding,
    block: Option<MeshBlock>,
}

impl MeshBuilder {
    /// An empty builder drawing counter-clockwise triangles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops everything added so far.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Interleaves separate attribute arrays into one vertex buffer.
    ///
    /// Each attribute starts on a multiple of its component size and the
    /// stride is rounded up to the largest component size. Empty attributes
    /// are skipped. When the attributes hold different item counts, only the
    /// smallest count is kept and `false` is returned.
    pub fn set_vertex_buffer(&mut self, entries: &[MeshBuilderEntry<'_>]) -> bool {
        self.block = None;
        self.attributes.clear();
        self.vertex_data.clear();
        self.stride = 0;

        let mut used = Vec::with_capacity(entries.len());
        for entry in entries.iter().filter(|e| !e.data.is_empty()) {
            match entry.item_size() {
                Some(size) if size > 0 => used.push((entry, size)),
                _ => {
                    log::warn!("Skipping vertex attribute '{}' with no item size", entry.name);
                }
            }
        }
        if used.is_empty() {
            return true;
        }

        let counts = used.iter().map(|(e, size)| e.data.len() / *size as usize);
        let min_count = counts.clone().min().unwrap_or(0);
        let consistent = counts.clone().all(|c| c == min_count);
        if !consistent {
            log::warn!("Vertex attributes disagree on their item count, keeping {min_count} items");
        }

        let mut offset = 0u32;
        let mut max_alignment = 1u32;
        let mut layout = Vec::with_capacity(used.len());
        for (entry, size) in &used {
            let alignment = entry.component_type.size_in_bytes();
            max_alignment = max_alignment.max(alignment);
            let Some(first) = align_up(offset, alignment) else {
                return false;
            };
            let Some(end) = first.checked_add(*size) else {
                return false;
            };
            layout.push(first);
            offset = end;
        }
        let Some(stride) = align_up(offset, max_alignment) else {
            return false;
        };
        let Some(total) = (stride as usize).checked_mul(min_count) else {
            return false;
        };

        let mut data = vec![0u8; total];
        for ((entry, size), &first) in used.iter().zip(&layout) {
            let size = *size as usize;
            for (item, src) in entry.data.chunks_exact(size).take(min_count).enumerate() {
                let at = item * stride as usize + first as usize;
                data[at..at + size].copy_from_slice(src);
            }
        }

        self.attributes = used
            .iter()
            .zip(&layout)
            .map(|((entry, _), &first)| Attribute {
                name: entry.name.to_owned(),
                component_type: entry.component_type,
                num_components: entry.num_components,
                first_item_offset: first,
            })
            .collect();
        self.stride = stride;
        self.vertex_data = data;
        consistent
    }

    /// Accepts already interleaved vertex data described by `entries`.
    ///
    /// A `stride` of 0 is inferred from the entries. Returns `false`, keeping
    /// the previous vertex buffer, when an entry does not fit in the stride.
    pub fn set_vertex_buffer_interleaved(
        &mut self,
        entries: &[MeshBuilderEntry<'_>],
        stride: u32,
        data: &[u8],
    ) -> bool {
        let mut end = 0u32;
        let mut max_alignment = 1u32;
        for entry in entries {
            let Some(entry_end) = entry
                .item_size()
                .and_then(|size| size.checked_add(entry.first_item_offset))
            else {
                return false;
            };
            end = end.max(entry_end);
            max_alignment = max_alignment.max(entry.component_type.size_in_bytes());
        }
        let stride = match stride {
            0 => match align_up(end, max_alignment) {
                Some(stride) => stride,
                None => return false,
            },
            given if given < end => {
                log::warn!("Vertex stride {given} is smaller than its attributes ({end} bytes)");
                return false;
            }
            given => given,
        };
        if stride > 0 && data.len() % stride as usize != 0 {
            log::warn!(
                "Interleaved vertex data ({} bytes) is not a whole number of {stride}-byte vertices",
                data.len()
            );
        }

        self.attributes = entries
            .iter()
            .map(|e| Attribute {
                name: e.name.to_owned(),
                component_type: e.component_type,
                num_components: e.num_components,
                first_item_offset: e.first_item_offset,
            })
            .collect();
        self.stride = stride;
        self.vertex_data = data.to_vec();
        self.block = None;
        true
    }

    /// Sets the index buffer. Empty `data` removes it.
    pub fn set_index_buffer(&mut self, data: &[u8], component_type: ComponentType) -> bool {
        self.block = None;
        if data.is_empty() {
            self.index_type = None;
            self.index_data.clear();
            return true;
        }
        if !component_type.is_index_type() {
            log::warn!("{component_type:?} cannot be used for indices");
            return false;
        }
        if data.len() % component_type.size_in_bytes() as usize != 0 {
            log::warn!("Index data is not a whole number of {component_type:?} indices");
            return false;
        }
        self.index_type = Some(component_type);
        self.index_data = data.to_vec();
        true
    }

    /// Appends one skeleton joint.
    pub fn add_joint(
        &mut self,
        joint_id: i32,
        parent_id: i32,
        inverse_bind_pose: &[f32; 16],
        local_to_global_bone_space: &[f32; 16],
    ) {
        self.joints.push(Joint {
            joint_id,
            parent_id,
            inverse_bind_pose: *inverse_bind_pose,
            local_to_global_bone_space: *local_to_global_bone_space,
        });
        self.block = None;
    }

    /// Appends a subset whose bounds are computed from attribute
    /// `position_entry`, or left empty with [`NO_BOUNDS_ENTRY`].
    ///
    /// `count` and `offset` are in items: indices when there is an index
    /// buffer, vertices otherwise. `count` may be
    /// [`ALL_REMAINING_ITEMS`](super::format::ALL_REMAINING_ITEMS).
    pub fn add_mesh_subset(&mut self, name: &str, count: u32, offset: u32, position_entry: u32) {
        let bounds = if position_entry == NO_BOUNDS_ENTRY {
            Aabb::EMPTY
        } else {
            self.compute_bounds(position_entry as usize, &[(count, offset)])
        };
        self.push_subset(name, count, offset, bounds, position_entry);
    }

    /// Appends a subset with caller-supplied bounds.
    pub fn add_mesh_subset_with_bounds(&mut self, name: &str, count: u32, offset: u32, bounds: Aabb) {
        self.push_subset(name, count, offset, bounds, NO_BOUNDS_ENTRY);
    }

    fn push_subset(&mut self, name: &str, count: u32, offset: u32, bounds: Aabb, position_entry: u32) {
        self.subsets.push(Subset {
            name: name.to_owned(),
            count,
            offset,
            bounds,
            position_entry,
        });
        self.block = None;
    }

    /// Draw mode and winding stored in the mesh.
    pub fn set_draw_parameters(&mut self, draw_mode: DrawMode, winding: Winding) {
        self.draw_mode = draw_mode;
        self.winding = winding;
        self.block = None;
    }

    /// Bytes per vertex of the current vertex buffer.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Number of whole vertices in the current vertex buffer.
    pub fn vertex_count(&self) -> usize {
        match self.stride {
            0 => 0,
            stride => self.vertex_data.len() / stride as usize,
        }
    }

    /// Number of subsets added so far.
    pub fn subset_count(&self) -> usize {
        self.subsets.len()
    }

    fn item_count(&self) -> usize {
        match self.index_type {
            Some(ty) => self.index_data.len() / ty.size_in_bytes() as usize,
            None => self.vertex_count(),
        }
    }

    fn resolve_range(&self, count: u32, offset: u32) -> (usize, usize) {
        let total = self.item_count();
        let start = (offset as usize).min(total);
        let count = if count == ALL_REMAINING_ITEMS {
            total - start
        } else {
            (count as usize).min(total - start)
        };
        (start, count)
    }

    fn index_at(&self, item: usize) -> Option<usize> {
        let ty = self.index_type?;
        let size = ty.size_in_bytes() as usize;
        let raw = self.index_data.get(item * size..(item + 1) * size)?;
        Some(match ty {
            ComponentType::U8 | ComponentType::I8 => raw[0] as usize,
            ComponentType::U16 | ComponentType::I16 => u16::from_le_bytes([raw[0], raw[1]]) as usize,
            _ => u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize,
        })
    }

    fn position_at(&self, attribute: &Attribute, vertex: usize) -> Option<Vec3> {
        let at = vertex
            .checked_mul(self.stride as usize)?
            .checked_add(attribute.first_item_offset as usize)?;
        let raw = self.vertex_data.get(at..at + 12)?;
        let floats: [f32; 3] = bytemuck::pod_read_unaligned(raw);
        Some(Vec3::from_slice(&floats))
    }

    /// Bounds of the positions of attribute `entry` reached by the item
    /// ranges `(count, offset)`.
    fn compute_bounds(&self, entry: usize, ranges: &[(u32, u32)]) -> Aabb {
        let Some(attribute) = self.attributes.get(entry) else {
            log::warn!("Subset bounds requested from missing vertex attribute {entry}");
            return Aabb::EMPTY;
        };
        if attribute.component_type != ComponentType::F32 || attribute.num_components != 3 {
            log::warn!(
                "Subset bounds need an F32x3 position, attribute '{}' is {:?}x{}",
                attribute.name,
                attribute.component_type,
                attribute.num_components
            );
            return Aabb::EMPTY;
        }

        let mut bounds = Aabb::EMPTY;
        for &(count, offset) in ranges {
            let (start, count) = self.resolve_range(count, offset);
            for item in start..start + count {
                let vertex = match self.index_type {
                    Some(_) => match self.index_at(item) {
                        Some(v) => v,
                        None => continue,
                    },
                    None => item,
                };
                if let Some(p) = self.position_at(attribute, vertex) {
                    bounds.include(p);
                }
            }
        }
        bounds
    }

    /// Merges subsets sharing a name into one subset each, in order of first
    /// appearance, by concatenating their index ranges. Without an index
    /// buffer a sequential `u32` one is created first. Does nothing with
    /// fewer than two subsets or when all names differ, and leaves the
    /// builder untouched when a merged range does not fit `u32`.
    ///
    /// A merged subset takes its bounds from the first member's position
    /// attribute over the whole merged range. When no member has one, the
    /// members' own bounds are combined.
    pub fn connect_sub_meshes(&mut self) {
        if self.subsets.len() < 2 {
            return;
        }
        let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
        for (i, subset) in self.subsets.iter().enumerate() {
            match groups.iter_mut().find(|(name, _)| *name == subset.name) {
                Some((_, members)) => members.push(i),
                None => groups.push((subset.name.clone(), vec![i])),
            }
        }
        if groups.len() == self.subsets.len() {
            return;
        }

        let sequential: Vec<u8>;
        let (index_type, source) = match self.index_type {
            Some(ty) => (ty, self.index_data.as_slice()),
            None => {
                let Ok(vertex_count) = u32::try_from(self.vertex_count()) else {
                    log::warn!("Too many vertices to synthesize a u32 index buffer");
                    return;
                };
                sequential = (0..vertex_count).flat_map(u32::to_le_bytes).collect();
                (ComponentType::U32, sequential.as_slice())
            }
        };
        let index_size = index_type.size_in_bytes() as usize;

        let mut index_data = Vec::with_capacity(source.len());
        let mut subsets = Vec::with_capacity(groups.len());
        for (name, members) in groups {
            let first = index_data.len() / index_size;
            let mut ranges = Vec::with_capacity(members.len());
            let mut given_bounds = Aabb::EMPTY;
            let mut position_entry = NO_BOUNDS_ENTRY;
            for i in members {
                let subset = &self.subsets[i];
                let (start, count) = self.resolve_range(subset.count, subset.offset);
                index_data.extend_from_slice(&source[start * index_size..(start + count) * index_size]);
                ranges.push((subset.count, subset.offset));
                given_bounds = given_bounds.merge(&subset.bounds);
                if position_entry == NO_BOUNDS_ENTRY {
                    position_entry = subset.position_entry;
                }
            }
            let count = index_data.len() / index_size - first;
            let (Ok(count), Ok(offset)) = (u32::try_from(count), u32::try_from(first)) else {
                log::warn!("Merged subset '{name}' exceeds the u32 item range");
                return;
            };
            let bounds = if position_entry == NO_BOUNDS_ENTRY {
                given_bounds
            } else {
                self.compute_bounds(position_entry as usize, &ranges)
            };
            subsets.push(Subset {
                name,
                count,
                offset,
                bounds,
                position_entry,
            });
        }
        self.index_type = Some(index_type);
        self.index_data = index_data;
        self.subsets = subsets;
        self.block = None;
    }

    /// Packs everything into one block.
    ///
    /// The returned reference lives until the next builder call.
    pub fn get_mesh(&mut self) -> Result<&MeshBlock, MeshError> {
        let block = MeshSections {
            entries: self
                .attributes
                .iter()
                .map(|a| {
                    (
                        VertexBufferEntry {
                            name_offset: 0,
                            component_type: a.component_type as u32,
                            num_components: a.num_components,
                            first_item_offset: a.first_item_offset,
                        },
                        a.name.as_bytes(),
                    )
                })
                .collect(),
            stride: self.stride,
            vertex_data: &self.vertex_data,
            index_type: self.index_type.map_or(0, |ty| ty as u32),
            index_data: &self.index_data,
            subsets: self
                .subsets
                .iter()
                .map(|s| {
                    let mut name: Vec<u16> = s.name.encode_utf16().collect();
                    if !name.is_empty() {
                        name.push(0);
                    }
                    (
                        MeshSubset {
                            count: s.count,
                            offset: s.offset,
                            bounds: s.bounds,
                            name: Default::default(),
                        },
                        name,
                    )
                })
                .collect(),
            joints: &self.joints,
            draw_mode: self.draw_mode as u32,
            winding: self.winding as u32,
        }
        .pack()?;
        Ok(self.block.insert(block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions() -> Vec<f32> {
        vec![0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, -1.0]
    }

    #[test]
    fn test_interleave_aligns_attributes() {
        let pos = positions();
        let flags = [1u8, 2, 3, 4];
        let weights: [u16; 4] = [10, 20, 30, 40];
        let mut builder = MeshBuilder::new();
        assert!(builder.set_vertex_buffer(&[
            MeshBuilderEntry::new("flag", &flags, ComponentType::U8, 1),
            MeshBuilderEntry::new("pos", bytemuck::cast_slice(&pos), ComponentType::F32, 3),
            MeshBuilderEntry::new("w", bytemuck::cast_slice(&weights), ComponentType::U16, 1),
        ]));
        // flag at 0, pos aligned to 4, w at 16, stride rounded up to 20.
        assert_eq!(builder.stride(), 20);
        assert_eq!(builder.vertex_count(), 4);

        let block = builder.get_mesh().unwrap();
        let offsets: Vec<u32> = block.vertex_entries().iter().map(|e| e.first_item_offset).collect();
        assert_eq!(offsets, vec![0, 4, 16]);
        let data = block.vertex_data();
        assert_eq!(data[20], 2);
        assert_eq!(&data[24..28], &2.0f32.to_le_bytes());
        assert_eq!(&data[36..38], &20u16.to_le_bytes());
    }

    #[test]
    fn test_mismatched_counts_clamp_to_minimum() {
        let pos = positions();
        let uv = [0.0f32; 6];
        let mut builder = MeshBuilder::new();
        assert!(!builder.set_vertex_buffer(&[
            MeshBuilderEntry::new("pos", bytemuck::cast_slice(&pos), ComponentType::F32, 3),
            MeshBuilderEntry::new("uv", bytemuck::cast_slice(&uv), ComponentType::F32, 2),
        ]));
        assert_eq!(builder.vertex_count(), 3);
        assert_eq!(builder.stride(), 20);
    }

    #[test]
    fn test_interleaved_stride_inference() {
        let mut builder = MeshBuilder::new();
        let data = vec![0u8; 48];
        assert!(builder.set_vertex_buffer_interleaved(
            &[
                MeshBuilderEntry::interleaved("pos", ComponentType::F32, 3, 0),
                MeshBuilderEntry::interleaved("id", ComponentType::U16, 1, 12),
            ],
            0,
            &data,
        ));
        assert_eq!(builder.stride(), 16);
        assert!(!builder.set_vertex_buffer_interleaved(
            &[MeshBuilderEntry::interleaved("pos", ComponentType::F32, 3, 0)],
            8,
            &data,
        ));
        assert_eq!(builder.stride(), 16);
    }

    #[test]
    fn test_bounds_through_index_buffer() {
        let pos = positions();
        let mut builder = MeshBuilder::new();
        builder.set_vertex_buffer(&[MeshBuilderEntry::new(
            "pos",
            bytemuck::cast_slice(&pos),
            ComponentType::F32,
            3,
        )]);
        let indices: [u16; 3] = [0, 1, 3];
        assert!(builder.set_index_buffer(bytemuck::cast_slice(&indices), ComponentType::U16));
        builder.add_mesh_subset("a", 3, 0, 0);
        builder.add_mesh_subset("b", ALL_REMAINING_ITEMS, 1, 0);
        builder.add_mesh_subset("c", 3, 0, NO_BOUNDS_ENTRY);

        let block = builder.get_mesh().unwrap();
        let a = block.subsets()[0].bounds;
        assert_eq!(a.min, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(a.max, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(block.subsets()[1].bounds.max, Vec3::new(2.0, 0.0, 0.0));
        assert!(block.subsets()[2].bounds.is_empty());
        assert_eq!(block.resolved_count(&block.subsets()[1]), 2);
    }

    #[test]
    fn test_bounds_need_float3_positions() {
        let ids = [1u32, 2, 3];
        let mut builder = MeshBuilder::new();
        builder.set_vertex_buffer(&[MeshBuilderEntry::new(
            "id",
            bytemuck::cast_slice(&ids),
            ComponentType::U32,
            1,
        )]);
        builder.add_mesh_subset("s", 3, 0, 0);
        assert!(builder.get_mesh().unwrap().subsets()[0].bounds.is_empty());
    }

    #[test]
    fn test_index_buffer_rejects_float_type() {
        let mut builder = MeshBuilder::new();
        assert!(!builder.set_index_buffer(&[0; 8], ComponentType::F32));
        assert!(!builder.set_index_buffer(&[0; 3], ComponentType::U16));
        assert!(builder.set_index_buffer(&[], ComponentType::F32));
    }

    #[test]
    fn test_connect_sub_meshes_merges_by_name() {
        let pos = positions();
        let mut builder = MeshBuilder::new();
        builder.set_vertex_buffer(&[MeshBuilderEntry::new(
            "pos",
            bytemuck::cast_slice(&pos),
            ComponentType::F32,
            3,
        )]);
        builder.add_mesh_subset("wood", 1, 0, 0);
        builder.add_mesh_subset("metal", 2, 1, 0);
        builder.add_mesh_subset("wood", 1, 3, 0);
        builder.connect_sub_meshes();
        assert_eq!(builder.subset_count(), 2);

        let block = builder.get_mesh().unwrap();
        assert_eq!(block.index_type(), Some(ComponentType::U32));
        let indices: &[u32] = bytemuck::cast_slice(block.index_data());
        assert_eq!(indices, &[0, 3, 1, 2]);
        assert_eq!(block.subset_name(0), "wood");
        assert_eq!((block.subsets()[0].offset, block.subsets()[0].count), (0, 2));
        assert_eq!((block.subsets()[1].offset, block.subsets()[1].count), (2, 2));
        assert_eq!(block.subsets()[0].bounds.min, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_connect_sub_meshes_recomputes_bounds_over_merged_range() {
        let pos = positions();
        let mut builder = MeshBuilder::new();
        builder.set_vertex_buffer(&[MeshBuilderEntry::new(
            "pos",
            bytemuck::cast_slice(&pos),
            ComponentType::F32,
            3,
        )]);
        // The second piece carries no bounds of its own
        builder.add_mesh_subset("hull", 2, 0, 0);
        builder.add_mesh_subset("hull", 2, 2, NO_BOUNDS_ENTRY);
        builder.connect_sub_meshes();
        assert_eq!(builder.subsets[0].position_entry, 0);

        let block = builder.get_mesh().unwrap();
        assert_eq!(block.subsets().len(), 1);
        let bounds = block.subsets()[0].bounds;
        assert_eq!(bounds.min, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(bounds.max, Vec3::new(2.0, 3.0, 0.0));
    }

    #[test]
    fn test_connect_sub_meshes_combines_given_bounds() {
        let mut builder = MeshBuilder::new();
        let unit = Aabb::from_min_max(Vec3::ZERO, Vec3::ONE);
        let far = Aabb::from_min_max(Vec3::new(4.0, 4.0, 4.0), Vec3::new(5.0, 5.0, 5.0));
        builder.add_mesh_subset_with_bounds("a", 0, 0, unit);
        builder.add_mesh_subset_with_bounds("a", 0, 0, far);
        builder.connect_sub_meshes();

        let block = builder.get_mesh().unwrap();
        assert_eq!(block.subsets()[0].bounds.min, Vec3::ZERO);
        assert_eq!(block.subsets()[0].bounds.max, Vec3::new(5.0, 5.0, 5.0));
    }

    #[test]
    fn test_rejected_or_emptied_vertex_buffer_drops_packed_block() {
        let pos = positions();
        let mut builder = MeshBuilder::new();
        builder.set_vertex_buffer(&[MeshBuilderEntry::new(
            "pos",
            bytemuck::cast_slice(&pos),
            ComponentType::F32,
            3,
        )]);
        builder.get_mesh().unwrap();
        assert!(builder.block.is_some());

        assert!(builder.set_vertex_buffer(&[]));
        assert!(builder.block.is_none());
        assert!(builder.get_mesh().unwrap().vertex_data().is_empty());
    }

    #[test]
    fn test_connect_sub_meshes_without_duplicates_is_noop() {
        let mut builder = MeshBuilder::new();
        builder.add_mesh_subset("a", 1, 0, NO_BOUNDS_ENTRY);
        builder.add_mesh_subset("b", 1, 1, NO_BOUNDS_ENTRY);
        builder.connect_sub_meshes();
        let block = builder.get_mesh().unwrap();
        assert_eq!(block.index_type(), None);
        assert_eq!(block.subsets().len(), 2);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut builder = MeshBuilder::new();
        builder.add_mesh_subset("a", 1, 0, NO_BOUNDS_ENTRY);
        builder.add_joint(0, -1, &[0.0; 16], &[0.0; 16]);
        builder.set_draw_parameters(DrawMode::Lines, Winding::Clockwise);
        builder.reset();
        let block = builder.get_mesh().unwrap();
        assert!(block.subsets().is_empty());
        assert!(block.joints().is_empty());
        assert_eq!(block.mesh().draw_mode(), DrawMode::Triangles);
    }
}
