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

//! Self-relative references into a mesh block.
//!
//! An [`OffsetDataRef`] is an `{offset, size}` pair measured in bytes from
//! the start of the enclosing top-level block, never from a nested record.
//! A block can therefore be copied or mapped anywhere without fix-ups; the
//! only thing a consumer must keep is the block's base bytes.

use bytemuck::{Pod, Zeroable};
use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;

/// A typed span inside a block, stored as two little-endian `u32`s.
///
/// An empty span has `size == 0` and, by convention, `offset == 0`.
#[repr(C)]
pub struct OffsetDataRef<T> {
    /// Byte offset from the start of the block.
    pub offset: u32,
    /// Number of `T` items.
    pub size: u32,
    _marker: PhantomData<T>,
}

// SAFETY: two `u32`s and a zero-sized marker, no padding, valid for any bits.
unsafe impl<T: 'static> Zeroable for OffsetDataRef<T> {}
// SAFETY: see above; the marker carries no data.
unsafe impl<T: 'static> Pod for OffsetDataRef<T> {}

impl<T> Clone for OffsetDataRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for OffsetDataRef<T> {}

impl<T> PartialEq for OffsetDataRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.size == other.size
    }
}

impl<T> Eq for OffsetDataRef<T> {}

impl<T> Default for OffsetDataRef<T> {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl<T> fmt::Debug for OffsetDataRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OffsetDataRef")
            .field("offset", &self.offset)
            .field("size", &self.size)
            .finish()
    }
}

impl<T> OffsetDataRef<T> {
    /// The empty span.
    pub const EMPTY: Self = Self {
        offset: 0,
        size: 0,
        _marker: PhantomData,
    };

    /// A span of `size` items starting `offset` bytes into the block.
    pub const fn new(offset: u32, size: u32) -> Self {
        Self {
            offset,
            size,
            _marker: PhantomData,
        }
    }

    /// Whether the span holds no item.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Size of the span in bytes, `None` if it does not fit a `u32`.
    #[inline]
    pub fn byte_len(&self) -> Option<u32> {
        self.size.checked_mul(size_of::<T>() as u32)
    }

    /// One past the last byte of the span, `None` on overflow.
    #[inline]
    pub fn byte_end(&self) -> Option<u32> {
        self.byte_len()?.checked_add(self.offset)
    }

    /// Whether the whole span lies inside a block of `block_len` bytes.
    pub fn fits(&self, block_len: usize) -> bool {
        if self.is_empty() {
            return true;
        }
        matches!(self.byte_end(), Some(end) if end as usize <= block_len)
    }
}

impl<T: Pod> OffsetDataRef<T> {
    /// The raw bytes of the span within `base`.
    ///
    /// # Panics
    ///
    /// Panics if the span does not lie inside `base`.
    pub fn bytes<'a>(&self, base: &'a [u8]) -> &'a [u8] {
        if self.is_empty() {
            return &[];
        }
        assert!(
            self.fits(base.len()),
            "OffsetDataRef {{ offset: {}, size: {} }} exceeds a block of {} bytes",
            self.offset,
            self.size,
            base.len()
        );
        let start = self.offset as usize;
        &base[start..start + size_of::<T>() * self.size as usize]
    }

    /// The items of the span, borrowed from `base`.
    ///
    /// `base` must start on a 4-byte boundary, as every mesh block does.
    ///
    /// # Panics
    ///
    /// Panics if the span does not lie inside `base` or is misaligned.
    pub fn slice<'a>(&self, base: &'a [u8]) -> &'a [T] {
        if self.is_empty() {
            return &[];
        }
        bytemuck::cast_slice(self.bytes(base))
    }

    /// Mutable access to the items of the span.
    ///
    /// # Panics
    ///
    /// Panics if the span does not lie inside `base` or is misaligned.
    pub fn slice_mut<'a>(&self, base: &'a mut [u8]) -> &'a mut [T] {
        if self.is_empty() {
            return &mut [];
        }
        assert!(
            self.fits(base.len()),
            "OffsetDataRef {{ offset: {}, size: {} }} exceeds a block of {} bytes",
            self.offset,
            self.size,
            base.len()
        );
        let start = self.offset as usize;
        bytemuck::cast_slice_mut(&mut base[start..start + size_of::<T>() * self.size as usize])
    }

    /// The `index`-th item of the span.
    ///
    /// # Panics
    ///
    /// Panics if `index >= size`: indexing past a span is a caller bug.
    pub fn index<'a>(&self, base: &'a [u8], index: u32) -> &'a T {
        assert!(
            index < self.size,
            "index {index} out of range for a span of {} items",
            self.size
        );
        &self.slice(base)[index as usize]
    }

    /// Copies the `index`-th item out of `base`, whatever its alignment.
    ///
    /// # Panics
    ///
    /// Panics if `index >= size` or the span does not lie inside `base`.
    pub fn read(&self, base: &[u8], index: u32) -> T {
        assert!(
            index < self.size,
            "index {index} out of range for a span of {} items",
            self.size
        );
        let at = index as usize * size_of::<T>();
        bytemuck::pod_read_unaligned(&self.bytes(base)[at..at + size_of::<T>()])
    }
}
