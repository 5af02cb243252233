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

//! Axis-aligned 2D rectangles for viewports and scissor regions.

use super::Vec2;
use serde::{Deserialize, Serialize};

/// A rectangle in window space, origin at the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Bottom edge.
    pub y: f32,
    /// Width. Non-positive means empty.
    pub width: f32,
    /// Height. Non-positive means empty.
    pub height: f32,
}

impl Rect {
    /// Creates a new rectangle.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle at the origin covering `size`.
    #[inline]
    pub fn from_size(size: Vec2) -> Self {
        Self::new(0.0, 0.0, size.x, size.y)
    }

    /// `true` when both dimensions are strictly positive.
    #[inline]
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// The right edge.
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// The top edge.
    #[inline]
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    /// The overlapping region of two rectangles. Empty (zero-sized) when they
    /// do not overlap.
    pub fn intersection(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let top = self.top().min(other.top());
        Rect::new(x, y, (right - x).max(0.0), (top - y).max(0.0))
    }

    /// Whether a point lies inside, left/bottom edges inclusive.
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.top()
    }

    /// Maps an absolute point to `[-1, 1]` coordinates relative to the
    /// rectangle's center.
    pub fn to_normalized_relative(&self, p: Vec2) -> Vec2 {
        let half_w = self.width * 0.5;
        let half_h = self.height * 0.5;
        if half_w <= 0.0 || half_h <= 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new((p.x - self.x - half_w) / half_w, (p.y - self.y - half_h) / half_h)
    }

    /// Inverse of [`Rect::to_normalized_relative`].
    pub fn from_normalized_relative(&self, n: Vec2) -> Vec2 {
        let half_w = self.width * 0.5;
        let half_h = self.height * 0.5;
        Vec2::new(self.x + half_w + n.x * half_w, self.y + half_h + n.y * half_h)
    }
}
