// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content invalidation of a mapping's layers.

use kurbo::{Point, Rect};

use crate::geometry::pixel_snap;
use crate::layer::GraphicsLayerStore;
use crate::role::LayerRole;

use super::CompositedLayerMapping;

impl CompositedLayerMapping {
    /// Requests a full repaint of every content layer that draws content.
    pub(crate) fn set_contents_need_display(&self, store: &mut GraphicsLayerStore) {
        for (_, layer) in self.layers.filtered(LayerRole::is_content_layer) {
            store.set_needs_display(layer);
        }
    }

    /// Requests a repaint of `rect`, given in the owner's paint space, on
    /// every content layer that draws content.
    ///
    /// The rect is snapped with the subpixel accumulation, then moved into
    /// each layer's space and clipped to the layer.
    pub(crate) fn set_contents_need_display_in_rect(
        &self,
        store: &mut GraphicsLayerStore,
        rect: Rect,
    ) {
        let snapped = pixel_snap(rect + self.subpixel_accumulation);
        for (_, layer) in self.layers.filtered(LayerRole::is_content_layer) {
            let bounds = Rect::from_origin_size(Point::ZERO, store.size(layer));
            let local = (snapped - store.offset_from_owner(layer)).intersect(bounds);
            store.set_needs_display_in_rect(layer, local);
        }
    }

    /// Requests a full repaint of the squashing layer, if any.
    pub(crate) fn set_squashing_contents_need_display(&self, store: &mut GraphicsLayerStore) {
        if let Some(layer) = self.layers.get(LayerRole::Squashing) {
            store.set_needs_display(layer);
        }
    }
}
