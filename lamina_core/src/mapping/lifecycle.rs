// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Role lifecycle: which auxiliary layers an element needs.
//!
//! Needs are evaluated purely from the element snapshot, the configuration,
//! and squashing membership ([`RoleNeeds::evaluate`]); they never look at
//! which layers currently exist. Applying them creates and releases layers
//! in a fixed order. Teardown applies [`RoleNeeds::NONE`] through the same
//! path.

use crate::element::{ElementSnapshot, ImageSource, LayoutProvider, ScrollState};
use crate::layer::{ElementId, GraphicsLayerId, GraphicsLayerStore, LayerContents};
use crate::phase::PaintPhase;
use crate::role::LayerRole;
use crate::scrolling::ScrollbarOrientation;

use super::{CompositedLayerMapping, PassContext};

/// Inputs to configuration that come from outside the element.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ConfigInputs {
    /// Nearest ancestor element that owns a mapping.
    pub container: Option<ElementId>,
    /// Primary layer of the element's reflection, if composited.
    pub reflection_primary: Option<GraphicsLayerId>,
    /// The clip parent resolved to its nearest composited element.
    pub clip_parent: Option<ElementId>,
}

/// Which auxiliary roles an element needs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct RoleNeeds {
    pub background: bool,
    pub foreground: bool,
    pub ancestor_clip: bool,
    pub descendant_clip: bool,
    pub horizontal_scrollbar: bool,
    pub vertical_scrollbar: bool,
    pub scroll_corner: bool,
    pub overflow_controls_host: bool,
    pub overflow_controls_clip: bool,
    pub scrolling: bool,
    pub child_transform: bool,
    pub squashing: bool,
    pub squashing_container: bool,
    pub mask: bool,
    pub child_clipping_mask: bool,
}

impl RoleNeeds {
    /// No auxiliary role is needed.
    pub const NONE: Self = Self {
        background: false,
        foreground: false,
        ancestor_clip: false,
        descendant_clip: false,
        horizontal_scrollbar: false,
        vertical_scrollbar: false,
        scroll_corner: false,
        overflow_controls_host: false,
        overflow_controls_clip: false,
        scrolling: false,
        child_transform: false,
        squashing: false,
        squashing_container: false,
        mask: false,
        child_clipping_mask: false,
    };

    /// Evaluates every need-predicate for `element`.
    pub fn evaluate(
        element: &ElementSnapshot,
        cx: &PassContext<'_, '_>,
        inputs: &ConfigInputs,
        squashed_members: usize,
    ) -> Self {
        let config = cx.config;
        let style = &element.style;

        let scrolling = config.accelerated_overflow_scroll && element.needs_composited_scrolling();
        // The scrolling layer clips instead, and the main frame's clip
        // handles its root.
        let descendant_clip = element.clips_compositing_descendants
            && !scrolling
            && !(config.is_main_frame && element.is_root);

        let mut ancestor_clip = clipped_by_non_ancestor(cx.layout, element, inputs.container);
        if config.accelerated_overflow_scroll
            && element.scroll_parent.is_some()
            && element.containing_block_is_ancestor_scroller
        {
            ancestor_clip = false;
        }

        let scroll = element.scroll.as_ref();
        let horizontal_scrollbar = scroll.is_some_and(ScrollState::needs_horizontal_scrollbar_layer);
        let vertical_scrollbar = scroll.is_some_and(ScrollState::needs_vertical_scrollbar_layer);
        let scroll_corner = scroll.is_some_and(ScrollState::needs_scroll_corner_layer);
        let overflow_controls_host = horizontal_scrollbar || vertical_scrollbar || scroll_corner;

        let squashing = config.layer_squashing_enabled && squashed_members > 0;

        let clips_children = element.clips_compositing_descendants && (descendant_clip || scrolling);
        let child_clipping_mask = (style.has_clip_path || style.has_border_radius)
            && (clips_children || element.kind.is_accelerated_contents() || scrolling);

        Self {
            background: config.is_main_frame
                && element.is_root
                && element.paints_fixed_root_background,
            foreground: element.needs_foreground_layer,
            ancestor_clip,
            descendant_clip,
            horizontal_scrollbar,
            vertical_scrollbar,
            scroll_corner,
            overflow_controls_host,
            overflow_controls_clip: overflow_controls_host && ancestor_clip,
            scrolling,
            child_transform: style.has_perspective() && !descendant_clip && !scrolling,
            squashing,
            // The ancestor clip layer doubles as the squashing container.
            squashing_container: squashing && !ancestor_clip,
            mask: style.has_mask,
            child_clipping_mask,
        }
    }
}

/// Whether `element` is clipped by an ancestor that is not above its
/// compositing container in the layer tree.
pub(crate) fn clipped_by_non_ancestor(
    layout: &dyn LayoutProvider,
    element: &ElementSnapshot,
    container: Option<ElementId>,
) -> bool {
    if element.parent.is_none() {
        return false;
    }
    let (Some(container), Some(clipping)) = (container, element.clipping_container) else {
        return false;
    };
    container != clipping && !layout.is_descendant_of(container, clipping)
}

/// An image that can be handed to the layer instead of being painted.
pub(crate) fn directly_composited_image(element: &ElementSnapshot) -> Option<ImageSource> {
    match element.kind {
        crate::element::ElementKind::Image(Some(source))
            if source.is_bitmap
                && !element.content.has_box_decorations_or_background
                && !element.has_css_clip =>
        {
            Some(source)
        }
        _ => None,
    }
}

impl CompositedLayerMapping {
    /// Brings the set of live layers in line with what `element` needs.
    ///
    /// Returns `true` if any layer was created or released. A change in a
    /// role that takes part in the internal hierarchy schedules a rebuild.
    pub(crate) fn update_configuration(
        &mut self,
        cx: &mut PassContext<'_, '_>,
        element: &ElementSnapshot,
        inputs: &ConfigInputs,
    ) -> bool {
        let needs = RoleNeeds::evaluate(element, cx, inputs, self.squashed.len());
        self.background_paints_fixed_root = needs.background;
        let changed = self.apply_needs(cx, &needs);

        if let Some(primary) = self.primary_layer() {
            let scroll_parent = cx
                .config
                .accelerated_overflow_scroll
                .then_some(element.scroll_parent)
                .flatten();
            self.update_scroll_parent(cx, scroll_parent);
            if !clipped_by_non_ancestor(cx.layout, element, inputs.container) {
                cx.coordinator.update_clip_parent(primary, inputs.clip_parent);
            }
        }

        self.update_layer_references(cx, element, inputs);
        self.update_contents(cx.store, element);
        self.update_painting_phases(cx);
        changed
    }

    /// Releases every layer, including the primary layer, and hands back
    /// the squashed members for invalidation.
    pub(crate) fn destroy(&mut self, cx: &mut PassContext<'_, '_>) {
        self.apply_needs(cx, &RoleNeeds::NONE);
        self.toggle_role(cx, LayerRole::Primary, false);
        for member in self.squashed.drain(..) {
            cx.invalidate(member.element);
        }
        self.needs_hierarchy_rebuild = false;
    }

    /// Toggles roles in dependency order and reports whether anything
    /// changed.
    fn apply_needs(&mut self, cx: &mut PassContext<'_, '_>, needs: &RoleNeeds) -> bool {
        let mut hierarchy_changed = false;

        if self.toggle_role(cx, LayerRole::Background, needs.background) {
            cx.notes.root_fixed_background_changes += 1;
            hierarchy_changed = true;
        }
        hierarchy_changed |= self.toggle_role(cx, LayerRole::Foreground, needs.foreground);
        hierarchy_changed |= self.toggle_role(cx, LayerRole::AncestorClip, needs.ancestor_clip);
        hierarchy_changed |= self.toggle_role(cx, LayerRole::DescendantClip, needs.descendant_clip);

        if self.toggle_role(cx, LayerRole::HorizontalScrollbar, needs.horizontal_scrollbar) {
            cx.coordinator
                .scrollbar_layer_did_change(self.element, ScrollbarOrientation::Horizontal);
            hierarchy_changed = true;
        }
        if self.toggle_role(cx, LayerRole::VerticalScrollbar, needs.vertical_scrollbar) {
            cx.coordinator
                .scrollbar_layer_did_change(self.element, ScrollbarOrientation::Vertical);
            hierarchy_changed = true;
        }
        hierarchy_changed |= self.toggle_role(cx, LayerRole::ScrollCorner, needs.scroll_corner);
        hierarchy_changed |=
            self.toggle_role(cx, LayerRole::OverflowControlsHost, needs.overflow_controls_host);
        hierarchy_changed |=
            self.toggle_role(cx, LayerRole::OverflowControlsClip, needs.overflow_controls_clip);

        let mut scrolling_changed = false;
        for role in [
            LayerRole::ScrollingContainer,
            LayerRole::ScrollingContents,
            LayerRole::ScrollingBlockSelection,
        ] {
            scrolling_changed |= self.toggle_role(cx, role, needs.scrolling);
        }
        if scrolling_changed {
            hierarchy_changed = true;
            cx.coordinator.scroll_layer_did_change(self.element);
        }

        hierarchy_changed |= self.toggle_role(cx, LayerRole::ChildTransform, needs.child_transform);
        hierarchy_changed |= self.toggle_role(cx, LayerRole::Squashing, needs.squashing);
        hierarchy_changed |=
            self.toggle_role(cx, LayerRole::SquashingContainer, needs.squashing_container);

        let both = self.layers.has(LayerRole::AncestorClip)
            && self.layers.has(LayerRole::SquashingContainer);
        debug_assert!(
            !both,
            "{:?}: ancestor clip and squashing container are both live",
            self.element
        );
        if both {
            log::warn!(
                "{:?}: ancestor clip and squashing container both live; keeping the ancestor clip",
                self.element
            );
            self.toggle_role(cx, LayerRole::SquashingContainer, false);
        }

        // Masks hang off other layers and are not part of the hierarchy.
        let mut masks_changed = self.toggle_role(cx, LayerRole::Mask, needs.mask);
        masks_changed |=
            self.toggle_role(cx, LayerRole::ChildClippingMask, needs.child_clipping_mask);

        if hierarchy_changed {
            self.needs_hierarchy_rebuild = true;
        }
        hierarchy_changed || masks_changed
    }

    /// Reports the scroll parent on the topmost layer only.
    fn update_scroll_parent(&self, cx: &mut PassContext<'_, '_>, scroll_parent: Option<ElementId>) {
        let topmost = self.child_for_superlayers();
        for role in [
            LayerRole::SquashingContainer,
            LayerRole::AncestorClip,
            LayerRole::Primary,
        ] {
            if let Some(layer) = self.layers.get(role) {
                let parent = if Some(layer) == topmost {
                    scroll_parent
                } else {
                    None
                };
                cx.coordinator.update_scroll_parent(layer, parent);
            }
        }
    }

    /// Wires mask, clipping mask and replica references.
    fn update_layer_references(
        &self,
        cx: &mut PassContext<'_, '_>,
        element: &ElementSnapshot,
        inputs: &ConfigInputs,
    ) {
        let Some(primary) = self.primary_layer() else {
            return;
        };
        let mask = self.layers.get(LayerRole::Mask);
        let clipping_mask = self.layers.get(LayerRole::ChildClippingMask);
        let clip_path = element.style.has_clip_path;

        // A clip path clips the whole subtree, scrollbars included, so its
        // mask goes on the primary layer.
        let primary_mask = if clip_path && clipping_mask.is_some() {
            clipping_mask
        } else {
            mask
        };
        cx.store.set_mask_layer(primary, primary_mask);

        let mut clip_mask_host = None;
        if !clip_path {
            clip_mask_host = self
                .layers
                .get(LayerRole::DescendantClip)
                .or(self.layers.get(LayerRole::ScrollingContainer));
        }
        for role in [LayerRole::DescendantClip, LayerRole::ScrollingContainer] {
            if let Some(layer) = self.layers.get(role) {
                let m = if Some(layer) == clip_mask_host {
                    clipping_mask
                } else {
                    None
                };
                cx.store.set_mask_layer(layer, m);
            }
        }

        let contents_mask = if !clip_path
            && clip_mask_host.is_none()
            && element.kind.is_accelerated_contents()
        {
            clipping_mask
        } else {
            None
        };
        cx.store.set_contents_clipping_mask_layer(primary, contents_mask);

        let replica = element.reflection.and(inputs.reflection_primary);
        cx.store.set_replica_layer(primary, replica);
    }

    /// Hands images and platform surfaces to the primary layer.
    pub(crate) fn update_contents(&self, store: &mut GraphicsLayerStore, element: &ElementSnapshot) {
        let Some(primary) = self.primary_layer() else {
            return;
        };
        if let Some(source) = directly_composited_image(element) {
            // An image that has not finished loading is retried next pass.
            if source.loaded {
                store.set_contents(primary, Some(LayerContents::Image(source.surface)));
            }
            return;
        }
        let contents = element.kind.platform_surface().map(LayerContents::Platform);
        store.set_contents(primary, contents);
    }

    fn update_painting_phases(&self, cx: &mut PassContext<'_, '_>) {
        let Some(primary) = self.primary_layer() else {
            return;
        };
        let has = |role| self.layers.has(role);

        let mut phase = PaintPhase::empty();
        if !has(LayerRole::Background) {
            phase |= PaintPhase::BACKGROUND;
        }
        if !has(LayerRole::Foreground) {
            phase |= PaintPhase::FOREGROUND;
        }
        if !has(LayerRole::Mask) {
            phase |= PaintPhase::MASK;
        }
        if has(LayerRole::ScrollingContents) {
            phase.remove(PaintPhase::FOREGROUND);
            phase |= PaintPhase::COMPOSITED_SCROLL;
        }
        cx.store.set_painting_phase(primary, phase);

        let mut scrolled = PaintPhase::OVERFLOW_CONTENTS | PaintPhase::COMPOSITED_SCROLL;
        if !has(LayerRole::Foreground) {
            scrolled |= PaintPhase::FOREGROUND;
        }
        for role in [LayerRole::ScrollingContents, LayerRole::ScrollingBlockSelection] {
            if let Some(layer) = self.layers.get(role) {
                cx.store.set_painting_phase(layer, scrolled);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Rect, Size};

    use super::*;
    use crate::element::{ElementKind, ScrollState};
    use crate::mapping::SquashedMember;
    use crate::testing::{Harness, LayoutBuilder};

    fn configure(h: &mut Harness, mapping: &mut CompositedLayerMapping, id: u64) -> bool {
        configure_with(h, mapping, id, ConfigInputs::default())
    }

    fn configure_with(
        h: &mut Harness,
        mapping: &mut CompositedLayerMapping,
        id: u64,
        inputs: ConfigInputs,
    ) -> bool {
        let element = h.element(id);
        mapping.update_configuration(&mut h.cx(), &element, &inputs)
    }

    fn scroller_layout() -> LayoutBuilder {
        LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(10.0, 10.0, 210.0, 110.0))
            .with(2, |e| {
                e.clips_compositing_descendants = true;
                e.scroll = Some(ScrollState {
                    client_box: Rect::new(0.0, 0.0, 185.0, 100.0),
                    scroll_size: Size::new(185.0, 400.0),
                    needs_composited_scrolling: true,
                    composited_scrollbars: true,
                    vertical_scrollbar: Some(Rect::new(185.0, 0.0, 200.0, 100.0)),
                    ..ScrollState::default()
                });
            })
    }

    #[test]
    fn composited_scrolling_replaces_descendant_clip() {
        let mut h = Harness::new(scroller_layout().build());
        let mut mapping = CompositedLayerMapping::new(ElementId(2), &mut h.cx());
        assert!(configure(&mut h, &mut mapping, 2));

        for role in [
            LayerRole::ScrollingContainer,
            LayerRole::ScrollingContents,
            LayerRole::ScrollingBlockSelection,
            LayerRole::OverflowControlsHost,
            LayerRole::VerticalScrollbar,
        ] {
            assert!(mapping.layers.has(role), "{role:?} missing");
        }
        assert!(!mapping.layers.has(LayerRole::DescendantClip));
        assert!(!mapping.layers.has(LayerRole::HorizontalScrollbar));
        assert_eq!(h.coordinator.scroll_layer_changes, [ElementId(2)]);
        assert_eq!(
            h.coordinator.scrollbar_changes,
            [(ElementId(2), ScrollbarOrientation::Vertical)]
        );
        assert!(mapping.needs_hierarchy_rebuild());
    }

    #[test]
    fn unchanged_inputs_toggle_nothing() {
        let mut h = Harness::new(scroller_layout().build());
        let mut mapping = CompositedLayerMapping::new(ElementId(2), &mut h.cx());
        assert!(configure(&mut h, &mut mapping, 2));
        let layers = mapping.layers.clone();
        assert!(!configure(&mut h, &mut mapping, 2));
        assert_eq!(mapping.layers, layers);
        assert_eq!(h.coordinator.scroll_layer_changes.len(), 1);
    }

    #[test]
    fn software_scrolling_falls_back_to_descendant_clip() {
        let mut h = Harness::new(scroller_layout().build());
        h.config = crate::config::CompositingConfig::SOFTWARE_SCROLLING;
        let mut mapping = CompositedLayerMapping::new(ElementId(2), &mut h.cx());
        configure(&mut h, &mut mapping, 2);
        assert!(mapping.layers.has(LayerRole::DescendantClip));
        assert!(!mapping.layers.has(LayerRole::ScrollingContainer));
    }

    #[test]
    fn fixed_root_background_notifies_once_per_toggle() {
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .with(1, |e| e.paints_fixed_root_background = true)
            .build();
        let mut h = Harness::new(layout);
        let mut mapping = CompositedLayerMapping::new(ElementId(1), &mut h.cx());

        configure(&mut h, &mut mapping, 1);
        assert!(mapping.layers.has(LayerRole::Background));
        assert_eq!(h.notes.root_fixed_background_changes, 1);

        configure(&mut h, &mut mapping, 1);
        configure(&mut h, &mut mapping, 1);
        assert_eq!(h.notes.root_fixed_background_changes, 1);

        if let Some(root) = h.layout.get_mut(ElementId(1)) {
            root.paints_fixed_root_background = false;
        }
        configure(&mut h, &mut mapping, 1);
        assert!(!mapping.layers.has(LayerRole::Background));
        assert_eq!(h.notes.root_fixed_background_changes, 2);
    }

    #[test]
    fn subframe_root_never_gets_background_layer() {
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .with(1, |e| e.paints_fixed_root_background = true)
            .build();
        let mut h = Harness::new(layout);
        h.config = h.config.subframe();
        let mut mapping = CompositedLayerMapping::new(ElementId(1), &mut h.cx());
        configure(&mut h, &mut mapping, 1);
        assert!(!mapping.layers.has(LayerRole::Background));
        assert_eq!(h.notes.root_fixed_background_changes, 0);
    }

    fn clipped_sibling_layout() -> LayoutBuilder {
        // 1 (root) > 2 (clips, not composited) > 3 (composited)
        LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(0.0, 0.0, 100.0, 100.0))
            .child(3, 2, Rect::new(10.0, 10.0, 50.0, 50.0))
            .with(2, |e| e.clip = Some(Rect::new(0.0, 0.0, 100.0, 100.0)))
            .with(3, |e| e.clipping_container = Some(ElementId(2)))
    }

    #[test]
    fn clip_below_container_needs_ancestor_clip() {
        let mut h = Harness::new(clipped_sibling_layout().build());
        let mut mapping = CompositedLayerMapping::new(ElementId(3), &mut h.cx());
        let inputs = ConfigInputs {
            container: Some(ElementId(1)),
            ..ConfigInputs::default()
        };
        configure_with(&mut h, &mut mapping, 3, inputs);
        assert!(mapping.layers.has(LayerRole::AncestorClip));
        assert_eq!(
            mapping.child_for_superlayers(),
            mapping.layer(LayerRole::AncestorClip)
        );
    }

    #[test]
    fn clip_on_container_needs_no_ancestor_clip() {
        let mut h = Harness::new(clipped_sibling_layout().build());
        let mut mapping = CompositedLayerMapping::new(ElementId(3), &mut h.cx());
        let inputs = ConfigInputs {
            container: Some(ElementId(2)),
            ..ConfigInputs::default()
        };
        configure_with(&mut h, &mut mapping, 3, inputs);
        assert!(!mapping.layers.has(LayerRole::AncestorClip));
    }

    #[test]
    fn scroll_parent_containing_block_skips_ancestor_clip() {
        let layout = clipped_sibling_layout()
            .with(3, |e| {
                e.scroll_parent = Some(ElementId(2));
                e.containing_block_is_ancestor_scroller = true;
            })
            .build();
        let mut h = Harness::new(layout);
        let mut mapping = CompositedLayerMapping::new(ElementId(3), &mut h.cx());
        let inputs = ConfigInputs {
            container: Some(ElementId(1)),
            ..ConfigInputs::default()
        };
        configure_with(&mut h, &mut mapping, 3, inputs);
        assert!(!mapping.layers.has(LayerRole::AncestorClip));
        let primary = mapping.primary_layer();
        assert!(
            h.coordinator
                .scroll_parents
                .iter()
                .any(|&(layer, parent)| Some(layer) == primary && parent == Some(ElementId(2)))
        );
    }

    #[test]
    fn squashing_uses_container_without_ancestor_clip() {
        let mut h = Harness::new(clipped_sibling_layout().build());
        let mut mapping = CompositedLayerMapping::new(ElementId(3), &mut h.cx());
        mapping.squashed.push(SquashedMember::new(ElementId(9)));
        configure(&mut h, &mut mapping, 3);
        assert!(mapping.layers.has(LayerRole::Squashing));
        assert!(mapping.layers.has(LayerRole::SquashingContainer));
        assert_eq!(
            mapping.child_for_superlayers(),
            mapping.layer(LayerRole::SquashingContainer)
        );
    }

    // Squashing combined with an ancestor clip resolves to the ancestor clip
    // layer hosting the squashing layer. This precedence is deliberate and
    // the combination is rare; keep this test if the rule is ever revisited.
    #[test]
    fn ancestor_clip_takes_precedence_over_squashing_container() {
        let mut h = Harness::new(clipped_sibling_layout().build());
        let mut mapping = CompositedLayerMapping::new(ElementId(3), &mut h.cx());
        mapping.squashed.push(SquashedMember::new(ElementId(9)));
        configure(&mut h, &mut mapping, 3);
        assert!(mapping.layers.has(LayerRole::SquashingContainer));

        let inputs = ConfigInputs {
            container: Some(ElementId(1)),
            ..ConfigInputs::default()
        };
        configure_with(&mut h, &mut mapping, 3, inputs);
        assert!(mapping.layers.has(LayerRole::AncestorClip));
        assert!(mapping.layers.has(LayerRole::Squashing));
        assert!(!mapping.layers.has(LayerRole::SquashingContainer));
    }

    #[test]
    fn squashing_disabled_never_creates_squashing_layers() {
        let mut h = Harness::new(clipped_sibling_layout().build());
        h.config = crate::config::CompositingConfig::NO_SQUASHING;
        let mut mapping = CompositedLayerMapping::new(ElementId(3), &mut h.cx());
        mapping.squashed.push(SquashedMember::new(ElementId(9)));
        configure(&mut h, &mut mapping, 3);
        assert!(!mapping.layers.has(LayerRole::Squashing));
    }

    #[test]
    fn border_radius_on_scroller_masks_scrolling_container() {
        let layout = scroller_layout()
            .with(2, |e| e.style.has_border_radius = true)
            .build();
        let mut h = Harness::new(layout);
        let mut mapping = CompositedLayerMapping::new(ElementId(2), &mut h.cx());
        configure(&mut h, &mut mapping, 2);

        let container = mapping.layer(LayerRole::ScrollingContainer).unwrap();
        let mask = mapping.layer(LayerRole::ChildClippingMask);
        assert!(mask.is_some());
        assert_eq!(h.store.mask_layer(container), mask);
        assert_eq!(h.store.mask_layer(mapping.primary_layer().unwrap()), None);
    }

    #[test]
    fn clip_path_mask_goes_on_primary() {
        let layout = scroller_layout()
            .with(2, |e| e.style.has_clip_path = true)
            .build();
        let mut h = Harness::new(layout);
        let mut mapping = CompositedLayerMapping::new(ElementId(2), &mut h.cx());
        configure(&mut h, &mut mapping, 2);

        let primary = mapping.primary_layer().unwrap();
        assert_eq!(
            h.store.mask_layer(primary),
            mapping.layer(LayerRole::ChildClippingMask)
        );
        let container = mapping.layer(LayerRole::ScrollingContainer).unwrap();
        assert_eq!(h.store.mask_layer(container), None);
    }

    #[test]
    fn border_radius_without_clipping_needs_no_mask() {
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(0.0, 0.0, 50.0, 50.0))
            .with(2, |e| e.style.has_border_radius = true)
            .build();
        let mut h = Harness::new(layout);
        let mut mapping = CompositedLayerMapping::new(ElementId(2), &mut h.cx());
        configure(&mut h, &mut mapping, 2);
        assert!(!mapping.layers.has(LayerRole::ChildClippingMask));
    }

    #[test]
    fn painting_phases_follow_dedicated_layers() {
        let layout = scroller_layout()
            .with(2, |e| {
                e.needs_foreground_layer = true;
                e.style.has_mask = true;
            })
            .build();
        let mut h = Harness::new(layout);
        let mut mapping = CompositedLayerMapping::new(ElementId(2), &mut h.cx());
        configure(&mut h, &mut mapping, 2);

        let primary = mapping.primary_layer().unwrap();
        assert_eq!(
            h.store.painting_phase(primary),
            PaintPhase::BACKGROUND | PaintPhase::COMPOSITED_SCROLL
        );
        let contents = mapping.layer(LayerRole::ScrollingContents).unwrap();
        assert_eq!(
            h.store.painting_phase(contents),
            PaintPhase::OVERFLOW_CONTENTS | PaintPhase::COMPOSITED_SCROLL
        );
        let mask = mapping.layer(LayerRole::Mask).unwrap();
        assert_eq!(h.store.painting_phase(mask), PaintPhase::MASK);
        assert_eq!(h.store.mask_layer(primary), Some(mask));
    }

    #[test]
    fn perspective_without_clip_uses_child_transform_layer() {
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(0.0, 0.0, 50.0, 50.0))
            .with(2, |e| e.style.perspective = Some(500.0))
            .build();
        let mut h = Harness::new(layout);
        let mut mapping = CompositedLayerMapping::new(ElementId(2), &mut h.cx());
        configure(&mut h, &mut mapping, 2);
        assert!(mapping.layers.has(LayerRole::ChildTransform));
        assert_eq!(
            mapping.layer_for_children_transform(),
            mapping.layer(LayerRole::ChildTransform)
        );
    }

    #[test]
    fn unloaded_image_is_retried() {
        let source = ImageSource {
            surface: crate::layer::SurfaceId(5),
            loaded: false,
            is_bitmap: true,
        };
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(0.0, 0.0, 50.0, 50.0))
            .with(2, |e| e.kind = ElementKind::Image(Some(source)))
            .build();
        let mut h = Harness::new(layout);
        let mut mapping = CompositedLayerMapping::new(ElementId(2), &mut h.cx());
        configure(&mut h, &mut mapping, 2);
        let primary = mapping.primary_layer().unwrap();
        assert_eq!(h.store.contents(primary), None);

        if let Some(e) = h.layout.get_mut(ElementId(2)) {
            e.kind = ElementKind::Image(Some(ImageSource {
                loaded: true,
                ..source
            }));
        }
        configure(&mut h, &mut mapping, 2);
        assert_eq!(
            h.store.contents(primary),
            Some(LayerContents::Image(crate::layer::SurfaceId(5)))
        );
    }

    #[test]
    fn decorated_image_is_painted() {
        let source = ImageSource {
            surface: crate::layer::SurfaceId(5),
            loaded: true,
            is_bitmap: true,
        };
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(0.0, 0.0, 50.0, 50.0))
            .with(2, |e| {
                e.kind = ElementKind::Image(Some(source));
                e.content.has_box_decorations_or_background = true;
            })
            .build();
        let mut h = Harness::new(layout);
        let mut mapping = CompositedLayerMapping::new(ElementId(2), &mut h.cx());
        configure(&mut h, &mut mapping, 2);
        assert_eq!(h.store.contents(mapping.primary_layer().unwrap()), None);
    }

    #[test]
    fn destroy_releases_everything() {
        let mut h = Harness::new(scroller_layout().build());
        let mut mapping = CompositedLayerMapping::new(ElementId(2), &mut h.cx());
        mapping.squashed.push(SquashedMember::new(ElementId(9)));
        configure(&mut h, &mut mapping, 2);
        assert!(h.store.live_count() > 1);

        mapping.destroy(&mut h.cx());
        assert!(mapping.layers.is_empty());
        assert_eq!(h.store.live_count(), 0);
        assert!(h.notes.invalidated.contains(&ElementId(9)));
        assert!(mapping.squashed_members().is_empty());
    }
}
