// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contract for the graphics side that consumes committed layer trees.
//!
//! The compositor never talks to a GPU, a platform layer tree, or a raster
//! thread itself. After each [`commit`](crate::compositor::Compositor::commit)
//! the embedder hands the published [`LayerChanges`] to a [`Presenter`],
//! which mirrors them into whatever native tree it drives and schedules
//! rasterization for the layers that need repainting.
//!
//! Rasterization calls back into
//! [`Compositor::paint`](crate::compositor::Compositor::paint) with the
//! dirty rects from [`LayerChanges::repaint`]. It must not overlap the next
//! [`update`](crate::compositor::Compositor::update): a generation is
//! handed off as a whole.

use crate::layer::{GraphicsLayerStore, LayerChanges};

/// Applies committed layer changes to a native presentation tree.
///
/// # Frame loop pseudocode
///
/// ```rust,ignore
/// fn on_frame(layout: &LayoutTree) {
///     compositor.update(layout, &mut coordinator, &mut tracer);
///     let update = compositor.commit(&mut tracer);
///
///     // Invalidate painted content of elements whose backing changed.
///     for element in &update.invalidated {
///         paint_cache.invalidate(*element);
///     }
///
///     // Present: mirror the changes into the native tree.
///     presenter.apply(compositor.store(), &update.changes);
/// }
/// ```
pub trait Presenter {
    /// Applies `changes`, reading current property values from `store`.
    ///
    /// Layers listed in `changes.removed` are already released; their slot
    /// indices may be reused by layers in `changes.added`.
    fn apply(&mut self, store: &GraphicsLayerStore, changes: &LayerChanges);
}
