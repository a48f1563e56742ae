// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-element graphics layer mappings.
//!
//! A [`CompositedLayerMapping`] owns the graphics layers of one composited
//! element: the primary layer plus whichever auxiliary roles the element
//! currently needs. A pass over a mapping runs in three steps, each in its
//! own submodule:
//!
//! - **lifecycle**: decide which roles are needed and create or release
//!   their layers ([`update_configuration`](CompositedLayerMapping::update_configuration)).
//! - **hierarchy**: re-attach the element's own layers in a fixed order
//!   when the configuration changed, then attach composited children.
//! - **geometry**: position, size and configure every live layer.
//!
//! Squashing state (other elements painted into this mapping's squashing
//! layer) lives in the **squashing** submodule.
//!
//! Mappings never see each other. Whatever a step needs from the element's
//! compositing container is copied into a small input struct by the
//! [`Compositor`](crate::compositor::Compositor) first.

mod geometry;
mod hierarchy;
mod invalidation;
mod lifecycle;
mod squashing;

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use kurbo::{Rect, Vec2};

pub use squashing::SquashedMember;

pub(crate) use geometry::{ContainerGeometry, GeometryInputs};
pub(crate) use hierarchy::ChildLayer;
pub(crate) use lifecycle::ConfigInputs;

use crate::config::CompositingConfig;
use crate::element::LayoutProvider;
use crate::geometry::pixel_snap;
use crate::layer::{ElementId, GraphicsLayerId, GraphicsLayerStore};
use crate::role::{LayerRole, RoleSlots};
use crate::scrolling::ScrollingCoordinator;
use crate::trace::{PassSummaryBuilder, RoleToggleEvent, Tracer};

/// The graphics layers owned by one composited element.
#[derive(Clone, Debug)]
pub struct CompositedLayerMapping {
    element: ElementId,
    layers: RoleSlots,
    composited_bounds: Rect,
    subpixel_accumulation: Vec2,
    squashed: Vec<SquashedMember>,
    squashing_offset_from_transformed_ancestor: Vec2,
    squash_membership_changed: bool,
    background_paints_fixed_root: bool,
    scrolling_contents_are_empty: bool,
    needs_hierarchy_rebuild: bool,
}

impl CompositedLayerMapping {
    /// Creates a mapping for `element` with a fresh primary layer.
    pub(crate) fn new(element: ElementId, cx: &mut PassContext<'_, '_>) -> Self {
        let mut mapping = Self {
            element,
            layers: RoleSlots::default(),
            composited_bounds: Rect::ZERO,
            subpixel_accumulation: Vec2::ZERO,
            squashed: Vec::new(),
            squashing_offset_from_transformed_ancestor: Vec2::ZERO,
            squash_membership_changed: false,
            background_paints_fixed_root: false,
            scrolling_contents_are_empty: false,
            needs_hierarchy_rebuild: true,
        };
        mapping.toggle_role(cx, LayerRole::Primary, true);
        mapping
    }

    /// The element this mapping belongs to.
    #[must_use]
    pub fn element(&self) -> ElementId {
        self.element
    }

    /// The live layer for `role`, if any.
    #[must_use]
    pub fn layer(&self, role: LayerRole) -> Option<GraphicsLayerId> {
        self.layers.get(role)
    }

    /// All live layers, keyed by role.
    #[must_use]
    pub fn layers(&self) -> &RoleSlots {
        &self.layers
    }

    /// The primary layer.
    ///
    /// Only `None` after [`destroy`](Self::destroy).
    #[must_use]
    pub fn primary_layer(&self) -> Option<GraphicsLayerId> {
        self.layers.get(LayerRole::Primary)
    }

    /// Compositing bounds from the last geometry update, in local space.
    #[must_use]
    pub fn composited_bounds(&self) -> Rect {
        self.composited_bounds
    }

    /// The fractional offset discarded when the element was snapped to
    /// whole pixels.
    #[must_use]
    pub fn subpixel_accumulation(&self) -> Vec2 {
        self.subpixel_accumulation
    }

    /// Composited bounds shifted by the subpixel accumulation and snapped.
    #[must_use]
    pub fn pixel_snapped_composited_bounds(&self) -> Rect {
        pixel_snap(self.composited_bounds + self.subpixel_accumulation)
    }

    /// Elements painted into the squashing layer, in paint order.
    #[must_use]
    pub fn squashed_members(&self) -> &[SquashedMember] {
        &self.squashed
    }

    /// Position of the squashing layer's origin relative to the owner's
    /// nearest transformed ancestor.
    #[must_use]
    pub fn squashing_offset_from_transformed_ancestor(&self) -> Vec2 {
        self.squashing_offset_from_transformed_ancestor
    }

    /// Whether the background layer paints the fixed root background.
    #[must_use]
    pub fn background_paints_fixed_root(&self) -> bool {
        self.background_paints_fixed_root
    }

    /// The layer composited children attach to.
    #[must_use]
    pub fn parent_for_sublayers(&self) -> Option<GraphicsLayerId> {
        self.first_live(&[
            LayerRole::ScrollingBlockSelection,
            LayerRole::ScrollingContents,
            LayerRole::DescendantClip,
            LayerRole::ChildTransform,
            LayerRole::Primary,
        ])
    }

    /// The topmost layer of this element, which its parent attaches.
    #[must_use]
    pub fn child_for_superlayers(&self) -> Option<GraphicsLayerId> {
        self.first_live(&[
            LayerRole::SquashingContainer,
            LayerRole::AncestorClip,
            LayerRole::Primary,
        ])
    }

    /// The layer carrying the children (perspective) transform.
    #[must_use]
    pub fn layer_for_children_transform(&self) -> Option<GraphicsLayerId> {
        self.first_live(&[
            LayerRole::DescendantClip,
            LayerRole::ScrollingContainer,
            LayerRole::ChildTransform,
        ])
    }

    /// The overflow-controls branch: the clip layer if present, else the
    /// host.
    #[must_use]
    pub fn overflow_controls_branch(&self) -> Option<GraphicsLayerId> {
        self.first_live(&[
            LayerRole::OverflowControlsClip,
            LayerRole::OverflowControlsHost,
        ])
    }

    /// Whether an internal hierarchy rebuild is pending.
    #[must_use]
    pub fn needs_hierarchy_rebuild(&self) -> bool {
        self.needs_hierarchy_rebuild
    }

    pub(crate) fn set_needs_hierarchy_rebuild(&mut self) {
        self.needs_hierarchy_rebuild = true;
    }

    fn first_live(&self, roles: &[LayerRole]) -> Option<GraphicsLayerId> {
        roles.iter().find_map(|&role| self.layers.get(role))
    }

    /// Creates or releases the layer for `role` so that it exists iff
    /// `needed`. Returns `true` if anything changed.
    fn toggle_role(&mut self, cx: &mut PassContext<'_, '_>, role: LayerRole, needed: bool) -> bool {
        match (needed, self.layers.get(role)) {
            (true, None) => {
                let id = cx.store.create_layer(role, self.element);
                if matches!(role, LayerRole::AncestorClip | LayerRole::SquashingContainer) {
                    // Clipping wrappers must not flatten the 3-D subtree below.
                    cx.store.set_flatten_transform(id, false);
                }
                self.layers.set(role, id);
                log::debug!("{:?}: created {}", self.element, role.debug_name());
                cx.role_toggled(self.element, role, id, true);
                true
            }
            (false, Some(id)) => {
                self.layers.take(role);
                cx.store.release_layer(id);
                log::debug!("{:?}: released {}", self.element, role.debug_name());
                cx.role_toggled(self.element, role, id, false);
                true
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Pass context
// ---------------------------------------------------------------------------

/// Notifications collected during a pass and published at commit.
#[derive(Clone, Debug, Default)]
pub(crate) struct PassNotes {
    /// Elements whose painted content must be invalidated.
    pub invalidated: BTreeSet<ElementId>,
    /// Root fixed background layer toggles.
    pub root_fixed_background_changes: u32,
}

impl PassNotes {
    pub(crate) fn clear(&mut self) {
        self.invalidated.clear();
        self.root_fixed_background_changes = 0;
    }
}

/// Everything a mapping step may touch besides the mapping itself.
pub(crate) struct PassContext<'a, 't> {
    pub store: &'a mut GraphicsLayerStore,
    pub layout: &'a dyn LayoutProvider,
    pub coordinator: &'a mut dyn ScrollingCoordinator,
    pub config: CompositingConfig,
    pub generation: u64,
    pub tracer: &'a mut Tracer<'t>,
    pub summary: &'a mut PassSummaryBuilder,
    pub notes: &'a mut PassNotes,
}

impl PassContext<'_, '_> {
    fn role_toggled(
        &mut self,
        element: ElementId,
        role: LayerRole,
        layer: GraphicsLayerId,
        created: bool,
    ) {
        self.summary.role_toggled(created);
        self.tracer.role_toggle(&RoleToggleEvent {
            generation: self.generation,
            element,
            role,
            layer_index: layer.index(),
            created,
        });
    }

    /// Records that `element`'s painted content must be invalidated.
    pub(crate) fn invalidate(&mut self, element: ElementId) {
        self.notes.invalidated.insert(element);
    }
}
