// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scrolling-coordination collaborator.
//!
//! A scrolling coordinator runs compositor-side scrolling. The mapping
//! passes tell it when scroll-related layers appear, disappear, or change
//! size, and which layers carry scroll and clip parents. It may take over
//! applying the scroll offset to a scrolling-contents layer; the geometry
//! pass asks, so the offset is applied exactly once.
//!
//! All methods default to no-ops.

use crate::layer::{ElementId, GraphicsLayerId};

/// Which scrollbar a notification is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScrollbarOrientation {
    /// The horizontal scrollbar.
    Horizontal,
    /// The vertical scrollbar.
    Vertical,
}

/// Receives scroll-layer notifications from the mapping passes.
pub trait ScrollingCoordinator {
    /// The scrolling layers of `element` were created, released, or
    /// resized.
    ///
    /// Returns `true` if the coordinator applies the scroll offset to the
    /// scrolling-contents layer itself, in which case the geometry pass
    /// leaves that layer at the origin.
    fn scroll_layer_did_change(&mut self, element: ElementId) -> bool {
        _ = element;
        false
    }

    /// A scrollbar layer of `element` was created or released.
    fn scrollbar_layer_did_change(&mut self, element: ElementId, orientation: ScrollbarOrientation) {
        _ = (element, orientation);
    }

    /// `layer` now has `scroll_parent` (or none).
    fn update_scroll_parent(&mut self, layer: GraphicsLayerId, scroll_parent: Option<ElementId>) {
        _ = (layer, scroll_parent);
    }

    /// `layer` now has `clip_parent` (or none).
    fn update_clip_parent(&mut self, layer: GraphicsLayerId, clip_parent: Option<ElementId>) {
        _ = (layer, clip_parent);
    }

    /// Whether `layer` contains fixed-position descendants of its element.
    fn set_layer_is_container_for_fixed_position(&mut self, layer: GraphicsLayerId, is_container: bool) {
        _ = (layer, is_container);
    }

    /// The position constraint of `element` may have changed.
    fn update_layer_position_constraint(&mut self, element: ElementId) {
        _ = element;
    }
}

/// A coordinator that ignores every notification and never handles scroll
/// offsets.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopScrollingCoordinator;

impl ScrollingCoordinator for NoopScrollingCoordinator {}
