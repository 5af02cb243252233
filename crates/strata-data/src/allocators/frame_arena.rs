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

//! A typed arena whose contents live for exactly one frame.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A handle to a value allocated in a [`FrameArena`].
///
/// It combines the slot index with the generation of the arena at the time of
/// allocation. Once the arena is reset for the next frame its generation moves
/// on, so a handle kept across frames stops resolving instead of silently
/// pointing at whatever was allocated in its slot afterwards.
pub struct FrameHandle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> FrameHandle<T> {
    /// The slot index inside the arena.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The frame generation the handle was created in.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl<T> Clone for FrameHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FrameHandle<T> {}

impl<T> PartialEq for FrameHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for FrameHandle<T> {}

impl<T> Hash for FrameHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for FrameHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameHandle")
            .field("index", &self.index)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Bump-style storage for per-frame objects.
///
/// Values are never freed individually: [`FrameArena::reset`] drops all of
/// them at once at the start of the next frame and keeps the capacity, so a
/// steady scene stops allocating after its first frames.
pub struct FrameArena<T> {
    items: Vec<T>,
    generation: u32,
}

impl<T> FrameArena<T> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            generation: 0,
        }
    }

    /// Creates an empty arena with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            generation: 0,
        }
    }

    /// Moves `value` into the arena for the rest of the frame.
    pub fn alloc(&mut self, value: T) -> FrameHandle<T> {
        let index = self.items.len() as u32;
        self.items.push(value);
        FrameHandle {
            index,
            generation: self.generation,
            _marker: PhantomData,
        }
    }

    /// The value behind `handle`, `None` if it comes from an earlier frame.
    pub fn get(&self, handle: FrameHandle<T>) -> Option<&T> {
        if handle.generation != self.generation {
            return None;
        }
        self.items.get(handle.index as usize)
    }

    /// Mutable access to the value behind `handle`.
    pub fn get_mut(&mut self, handle: FrameHandle<T>) -> Option<&mut T> {
        if handle.generation != self.generation {
            return None;
        }
        self.items.get_mut(handle.index as usize)
    }

    /// Drops every value and invalidates every outstanding handle.
    pub fn reset(&mut self) {
        self.items.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Current frame generation.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Number of values allocated this frame.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing was allocated this frame.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over this frame's values with their handles, in allocation
    /// order.
    pub fn iter(&self) -> impl Iterator<Item = (FrameHandle<T>, &T)> + '_ {
        let generation = self.generation;
        self.items.iter().enumerate().map(move |(i, item)| {
            (
                FrameHandle {
                    index: i as u32,
                    generation,
                    _marker: PhantomData,
                },
                item,
            )
        })
    }
}

impl<T> Default for FrameArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for FrameArena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameArena")
            .field("generation", &self.generation)
            .field("items", &self.items)
            .finish()
    }
}
