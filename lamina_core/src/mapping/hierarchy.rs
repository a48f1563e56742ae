// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Internal hierarchy of a mapping and attachment of composited children.

use alloc::vec::Vec;

use crate::layer::GraphicsLayerId;
use crate::role::LayerRole;
use crate::trace::HierarchyRebuildEvent;

use super::{CompositedLayerMapping, PassContext};

/// A composited child as seen by the parent's attachment step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ChildLayer {
    /// The child's topmost layer.
    pub layer: GraphicsLayerId,
    /// Whether the child paints below the parent's foreground.
    pub negative_z: bool,
    /// The child's overflow-controls branch, when it must be lifted out of
    /// the child and placed right above it.
    pub reparented_overflow_controls: Option<GraphicsLayerId>,
}

impl CompositedLayerMapping {
    /// Re-attaches this mapping's own layers in their fixed order.
    ///
    /// The foreground layer is ordered among composited children and is
    /// placed by [`attach_children`](Self::attach_children) instead. Mask
    /// layers hang off their hosts by reference. The background layer is
    /// left for the embedder to place.
    pub(crate) fn rebuild_hierarchy(&mut self, cx: &mut PassContext<'_, '_>) {
        let Some(primary) = self.primary_layer() else {
            return;
        };
        let get = |role| self.layers.get(role);
        let store = &mut *cx.store;

        if let Some(ancestor_clip) = get(LayerRole::AncestorClip) {
            store.remove_all_children(ancestor_clip);
        }
        store.remove_all_children(primary);
        store.remove_from_parent(primary);
        if let Some(ancestor_clip) = get(LayerRole::AncestorClip) {
            store.add_child(ancestor_clip, primary);
        }

        let descendant_clip = get(LayerRole::DescendantClip);
        let child_transform = get(LayerRole::ChildTransform);
        if let Some(inner) = descendant_clip.or(child_transform) {
            store.add_child(primary, inner);
        }

        if let Some(container) = get(LayerRole::ScrollingContainer) {
            let host = child_transform.or(descendant_clip).unwrap_or(primary);
            store.add_child(host, container);
            if let Some(contents) = get(LayerRole::ScrollingContents) {
                store.add_child(container, contents);
                if let Some(selection) = get(LayerRole::ScrollingBlockSelection) {
                    store.add_child(contents, selection);
                }
            }
        }

        // Overflow controls sit outside the clip applied to children.
        let host = get(LayerRole::OverflowControlsHost);
        if let Some(clip) = get(LayerRole::OverflowControlsClip) {
            store.add_child(primary, clip);
            if let Some(host) = host {
                store.add_child(clip, host);
            }
        } else if let Some(host) = host {
            store.add_child(primary, host);
        }
        if let Some(host) = host {
            for role in [
                LayerRole::HorizontalScrollbar,
                LayerRole::VerticalScrollbar,
                LayerRole::ScrollCorner,
            ] {
                if let Some(layer) = get(role) {
                    store.add_child(host, layer);
                }
            }
        }

        if let Some(squashing) = get(LayerRole::Squashing) {
            if let Some(container) = get(LayerRole::SquashingContainer) {
                store.set_children(container, &[primary, squashing]);
            } else if let Some(ancestor_clip) = get(LayerRole::AncestorClip) {
                store.add_child(ancestor_clip, squashing);
            }
        } else if let Some(container) = get(LayerRole::SquashingContainer) {
            store.set_children(container, &[primary]);
        }

        cx.summary.hierarchy_rebuilt();
        cx.tracer.hierarchy_rebuild(&HierarchyRebuildEvent {
            generation: cx.generation,
            element: self.element,
            layer_count: self.layers.len(),
        });
        log::trace!("{:?}: rebuilt internal hierarchy", self.element);
        self.needs_hierarchy_rebuild = false;
    }

    /// Attaches composited children, in paint order, under
    /// [`parent_for_sublayers`](Self::parent_for_sublayers).
    ///
    /// Negative z-order children go first, then the foreground layer, then
    /// the rest. A child whose overflow controls must be reparented gets them
    /// right after itself. When children attach directly to the primary
    /// layer this element's own overflow-controls branch is kept last, unless
    /// `own_controls_reparented` hands it to the parent.
    pub(crate) fn attach_children(
        &self,
        cx: &mut PassContext<'_, '_>,
        children: &[ChildLayer],
        own_controls_reparented: bool,
    ) {
        let Some(parent) = self.parent_for_sublayers() else {
            return;
        };
        let mut list = Vec::with_capacity(children.len() + 2);
        let push = |list: &mut Vec<GraphicsLayerId>, child: &ChildLayer| {
            list.push(child.layer);
            if let Some(controls) = child.reparented_overflow_controls {
                list.push(controls);
            }
        };
        for child in children.iter().filter(|c| c.negative_z) {
            push(&mut list, child);
        }
        if let Some(foreground) = self.layers.get(LayerRole::Foreground) {
            list.push(foreground);
        }
        for child in children.iter().filter(|c| !c.negative_z) {
            push(&mut list, child);
        }

        if Some(parent) == self.primary_layer() && !own_controls_reparented {
            if let Some(branch) = self.overflow_controls_branch() {
                list.push(branch);
            }
        }
        cx.store.set_children(parent, &list);
    }
}
