// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Graphics layer, element, and surface identity types.

use core::fmt;

/// Sentinel value indicating "no layer" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a graphics layer in a [`GraphicsLayerStore`](super::GraphicsLayerStore).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a layer is released and the slot is reused. Mask and
/// replica references between layers are stored as these handles, so a
/// released mask can never be reached through its former owner.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphicsLayerId {
    /// Slot index into the store's arrays.
    pub(crate) idx: u32,
    /// Generation counter; must match the store's generation for this slot.
    pub(crate) generation: u32,
}

impl GraphicsLayerId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for GraphicsLayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GraphicsLayerId({}@gen{})", self.idx, self.generation)
    }
}

/// Stable identity of an element in the paint tree.
///
/// Assigned by the layout side and never reinterpreted by the compositor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({})", self.0)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An opaque reference to externally produced layer contents.
///
/// Decoded image bitmaps, video frames, canvas and plugin surfaces are owned
/// by the embedder; a layer only carries the key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({})", self.0)
    }
}
