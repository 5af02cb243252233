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

//! Path nodes: curves tessellated by the path manager.

use strata_core::asset::MaterialId;

/// How a path is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PathType {
    /// A stroked 3D curve, tessellated on the GPU.
    #[default]
    Geometry,
    /// A flat vector shape, filled and/or stroked.
    Painted,
}

/// What parts of a painted path are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PaintStyle {
    /// Outline only.
    #[default]
    Stroke,
    /// Interior only.
    Fill,
    /// Interior, then outline on top.
    FillAndStroke,
}

/// A path instance.
#[derive(Debug, Clone, PartialEq)]
pub struct PathNode {
    /// Geometry or painted.
    pub path_type: PathType,
    /// Drawn parts. Geometry paths are always stroked.
    pub paint_style: PaintStyle,
    /// Stroke width.
    pub width: f32,
    /// Material of the outline.
    pub stroke_material: Option<MaterialId>,
    /// Material of the interior.
    pub fill_material: Option<MaterialId>,
}

impl PathNode {
    /// A stroked geometry path.
    pub fn geometry(stroke_material: MaterialId) -> Self {
        Self {
            path_type: PathType::Geometry,
            paint_style: PaintStyle::Stroke,
            width: 5.0,
            stroke_material: Some(stroke_material),
            fill_material: None,
        }
    }

    /// A painted path.
    pub fn painted(
        paint_style: PaintStyle,
        fill_material: Option<MaterialId>,
        stroke_material: Option<MaterialId>,
    ) -> Self {
        Self {
            path_type: PathType::Painted,
            paint_style,
            width: 5.0,
            stroke_material,
            fill_material,
        }
    }

    /// The passes to draw, in order, with the material of each. `true`
    /// marks the stroke pass.
    pub fn passes(&self) -> Vec<(bool, Option<MaterialId>)> {
        match (self.path_type, self.paint_style) {
            (PathType::Geometry, _) | (PathType::Painted, PaintStyle::Stroke) => {
                vec![(true, self.stroke_material)]
            }
            (PathType::Painted, PaintStyle::Fill) => vec![(false, self.fill_material)],
            (PathType::Painted, PaintStyle::FillAndStroke) => {
                vec![(false, self.fill_material), (true, self.stroke_material)]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_stroke_draws_fill_first() {
        let path = PathNode::painted(
            PaintStyle::FillAndStroke,
            Some(MaterialId(1)),
            Some(MaterialId(2)),
        );
        assert_eq!(
            path.passes(),
            vec![(false, Some(MaterialId(1))), (true, Some(MaterialId(2)))]
        );
        let mut geometry = PathNode::geometry(MaterialId(0));
        geometry.paint_style = PaintStyle::Fill;
        assert_eq!(geometry.passes(), vec![(true, Some(MaterialId(0)))]);
    }
}
