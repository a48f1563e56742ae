// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Squashing: other elements painted into this mapping's squashing layer.

use kurbo::{Rect, Vec2};

use crate::element::{ElementSnapshot, LayoutProvider};
use crate::geometry::{INFINITE_RECT, enclosing, pixel_snap, unite};
use crate::layer::ElementId;
use crate::role::LayerRole;
use crate::trace::{SquashAssignmentEvent, SquashChange};

use super::{CompositedLayerMapping, PassContext};

/// An element painted into another element's squashing layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SquashedMember {
    /// The squashed element.
    pub element: ElementId,
    /// The member's compositing bounds, in its own local space.
    pub composited_bounds: Rect,
    /// Paint offset of the member relative to the squashing layer origin.
    ///
    /// Painting translates by the negation of this offset.
    pub offset_from_owner: Vec2,
    pub(crate) offset_set: bool,
    /// Clip applied when painting the member, in the member's paint space,
    /// or [`INFINITE_RECT`].
    pub local_clip_rect: Rect,
    /// The fractional offset discarded when the member was snapped.
    pub subpixel_accumulation: Vec2,
}

impl SquashedMember {
    /// A member whose geometry has not been computed yet.
    #[must_use]
    pub fn new(element: ElementId) -> Self {
        Self {
            element,
            composited_bounds: Rect::ZERO,
            offset_from_owner: Vec2::ZERO,
            offset_set: false,
            local_clip_rect: INFINITE_RECT,
            subpixel_accumulation: Vec2::ZERO,
        }
    }
}

impl CompositedLayerMapping {
    /// Places `member` at `index` in the squashed list.
    ///
    /// Returns `true` if the slot changed. Both the displaced element and the
    /// new one are invalidated.
    pub(crate) fn assign_squashed(
        &mut self,
        cx: &mut PassContext<'_, '_>,
        member: ElementId,
        index: usize,
    ) -> bool {
        debug_assert!(index <= self.squashed.len(), "squash index {index} skips a slot");
        match self.squashed.get_mut(index) {
            Some(slot) if slot.element == member => return false,
            Some(slot) => {
                let displaced = slot.element;
                *slot = SquashedMember::new(member);
                cx.invalidate(displaced);
                self.squash_changed(cx, displaced, index, SquashChange::Evicted);
            }
            None => self.squashed.push(SquashedMember::new(member)),
        }
        cx.invalidate(member);
        self.squash_changed(cx, member, index, SquashChange::Assigned);
        true
    }

    /// Removes `member` from the squashed list, if present.
    pub(crate) fn remove_squashed(&mut self, cx: &mut PassContext<'_, '_>, member: ElementId) {
        let Some(index) = self.squashed.iter().position(|m| m.element == member) else {
            return;
        };
        self.squashed.remove(index);
        cx.invalidate(member);
        self.squash_changed(cx, member, index, SquashChange::Evicted);
    }

    /// Drops every member at or beyond `keep`.
    pub(crate) fn finalize_squashed(&mut self, cx: &mut PassContext<'_, '_>, keep: usize) {
        if keep >= self.squashed.len() {
            return;
        }
        let removed: alloc::vec::Vec<_> = self.squashed.drain(keep..).collect();
        for (offset, member) in removed.into_iter().enumerate() {
            cx.invalidate(member.element);
            self.squash_changed(cx, member.element, keep + offset, SquashChange::Evicted);
        }
    }

    fn squash_changed(
        &mut self,
        cx: &mut PassContext<'_, '_>,
        member: ElementId,
        index: usize,
        change: SquashChange,
    ) {
        self.squash_membership_changed = true;
        cx.summary.squash_changed();
        cx.tracer.squash_assignment(&SquashAssignmentEvent {
            generation: cx.generation,
            owner: self.element,
            member,
            index,
            change,
        });
    }

    /// Positions the squashing layer around its members and computes each
    /// member's paint offset and clip.
    ///
    /// `offset_from_container` is the owner's unsnapped offset from its
    /// compositing container; `parent_location` is where the owner's parent
    /// graphics layer sits in that same space.
    pub(crate) fn update_squashing_geometry(
        &mut self,
        cx: &mut PassContext<'_, '_>,
        owner: &ElementSnapshot,
        offset_from_container: Vec2,
        parent_location: Vec2,
    ) {
        let Some(layer) = self.layers.get(LayerRole::Squashing) else {
            return;
        };
        let layout = cx.layout;
        let to_parent = offset_from_container - parent_location;
        let reference = owner.offset_from_transformed_ancestor;

        let mut total = Rect::ZERO;
        for member in &mut self.squashed {
            let Some(snapshot) = layout.element(member.element) else {
                continue;
            };
            member.composited_bounds = snapshot.compositing_bounds;
            let delta = snapshot.offset_from_transformed_ancestor - reference;
            total = unite(total, member.composited_bounds + delta);
        }

        let bounds = enclosing(total + to_parent);
        let origin_in_owner = bounds.origin().to_vec2() - to_parent;

        for member in &mut self.squashed {
            let Some(snapshot) = layout.element(member.element) else {
                continue;
            };
            let from_origin =
                (snapshot.offset_from_transformed_ancestor - reference) - origin_in_owner;
            let offset = -from_origin.round();
            if member.offset_set && member.offset_from_owner != offset {
                cx.notes.invalidated.insert(member.element);
            }
            member.offset_from_owner = offset;
            member.offset_set = true;
            member.subpixel_accumulation = from_origin + offset;
        }

        let old_size = cx.store.size(layer);
        cx.store.set_position(layer, bounds.origin());
        cx.store.set_size(layer, bounds.size());
        if old_size != bounds.size() || self.squash_membership_changed {
            cx.store.set_needs_display(layer);
        }
        self.squash_membership_changed = false;
        self.squashing_offset_from_transformed_ancestor = reference + origin_in_owner;

        let clips: alloc::vec::Vec<Rect> = self
            .squashed
            .iter()
            .map(|member| local_clip_rect(layout, owner, member, &self.squashed))
            .collect();
        for (member, clip) in self.squashed.iter_mut().zip(clips) {
            member.local_clip_rect = clip;
        }
    }
}

/// The clip for `member` in its own paint space.
///
/// Members clipped by the same container as the owner need no clip of their
/// own. Otherwise the clipping container is itself squashed (or inside a
/// squashed member), and the clip is taken relative to that member.
fn local_clip_rect(
    layout: &dyn LayoutProvider,
    owner: &ElementSnapshot,
    member: &SquashedMember,
    members: &[SquashedMember],
) -> Rect {
    let clipping = layout
        .element(member.element)
        .and_then(|e| e.clipping_container);
    if clipping == owner.clipping_container {
        return INFINITE_RECT;
    }
    let Some(clipping) = clipping else {
        return INFINITE_RECT;
    };
    let ancestor = members.iter().find(|m| {
        m.element == clipping || layout.is_descendant_of(clipping, m.element)
    });
    let Some(ancestor) = ancestor else {
        debug_assert!(
            false,
            "{:?}: clipping container of squashed {:?} is not squashed",
            owner.id, member.element
        );
        return INFINITE_RECT;
    };
    let clip = pixel_snap(layout.background_clip_rect(member.element, ancestor.element, false));
    clip + (member.offset_from_owner - ancestor.offset_from_owner)
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Size};

    use super::*;
    use crate::testing::{Harness, LayoutBuilder};

    fn squash_layout() -> LayoutBuilder {
        // Root, an owner at the origin, and two 10x10 boxes that squash into
        // it at (0,0) and (20,0).
        LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(0.0, 0.0, 5.0, 5.0))
            .child(3, 1, Rect::new(0.0, 0.0, 10.0, 10.0))
            .child(4, 1, Rect::new(20.0, 0.0, 30.0, 10.0))
    }

    fn squashing_mapping(h: &mut Harness) -> CompositedLayerMapping {
        let mut mapping = CompositedLayerMapping::new(ElementId(2), &mut h.cx());
        assert!(mapping.assign_squashed(&mut h.cx(), ElementId(3), 0));
        assert!(mapping.assign_squashed(&mut h.cx(), ElementId(4), 1));
        mapping.toggle_role(&mut h.cx(), LayerRole::Squashing, true);
        mapping
    }

    #[test]
    fn group_bounds_cover_every_member() {
        let mut h = Harness::new(squash_layout().build());
        let mut mapping = squashing_mapping(&mut h);
        let owner = h.element(2);
        mapping.update_squashing_geometry(&mut h.cx(), &owner, Vec2::ZERO, Vec2::ZERO);

        let layer = mapping.layer(LayerRole::Squashing).unwrap();
        assert_eq!(h.store.position(layer), Point::ZERO);
        assert_eq!(h.store.size(layer), Size::new(30.0, 10.0));

        let members = mapping.squashed_members();
        assert_eq!(members[0].offset_from_owner, Vec2::ZERO);
        assert_eq!(members[1].offset_from_owner, Vec2::new(-20.0, 0.0));
        assert_eq!(members[1].subpixel_accumulation, Vec2::ZERO);
        assert_eq!(members[1].local_clip_rect, INFINITE_RECT);
        assert_eq!(mapping.squashing_offset_from_transformed_ancestor(), Vec2::ZERO);
    }

    #[test]
    fn fractional_member_keeps_subpixel_remainder() {
        let layout = squash_layout()
            .with(4, |e| {
                e.offset_from_root = Vec2::new(20.25, 0.0);
                e.offset_from_transformed_ancestor = Vec2::new(20.25, 0.0);
            })
            .build();
        let mut h = Harness::new(layout);
        let mut mapping = squashing_mapping(&mut h);
        let owner = h.element(2);
        mapping.update_squashing_geometry(&mut h.cx(), &owner, Vec2::ZERO, Vec2::ZERO);

        let member = mapping.squashed_members()[1];
        assert_eq!(member.offset_from_owner, Vec2::new(-20.0, 0.0));
        assert!((member.subpixel_accumulation.x - 0.25).abs() < 1e-9);
        let layer = mapping.layer(LayerRole::Squashing).unwrap();
        assert_eq!(h.store.size(layer), Size::new(31.0, 10.0));
    }

    #[test]
    fn moved_member_is_invalidated() {
        let mut h = Harness::new(squash_layout().build());
        let mut mapping = squashing_mapping(&mut h);
        let owner = h.element(2);
        mapping.update_squashing_geometry(&mut h.cx(), &owner, Vec2::ZERO, Vec2::ZERO);
        h.notes.clear();

        mapping.update_squashing_geometry(&mut h.cx(), &owner, Vec2::ZERO, Vec2::ZERO);
        assert!(h.notes.invalidated.is_empty());

        if let Some(e) = h.layout.get_mut(ElementId(4)) {
            e.offset_from_transformed_ancestor = Vec2::new(40.0, 0.0);
        }
        mapping.update_squashing_geometry(&mut h.cx(), &owner, Vec2::ZERO, Vec2::ZERO);
        assert!(h.notes.invalidated.contains(&ElementId(4)));
        assert!(!h.notes.invalidated.contains(&ElementId(3)));
    }

    #[test]
    fn reassignment_is_positional() {
        let mut h = Harness::new(squash_layout().build());
        let mut mapping = squashing_mapping(&mut h);
        h.notes.clear();

        assert!(!mapping.assign_squashed(&mut h.cx(), ElementId(3), 0));
        assert!(h.notes.invalidated.is_empty());

        assert!(mapping.assign_squashed(&mut h.cx(), ElementId(4), 0));
        assert!(h.notes.invalidated.contains(&ElementId(3)));
        assert!(h.notes.invalidated.contains(&ElementId(4)));

        mapping.finalize_squashed(&mut h.cx(), 1);
        let members: alloc::vec::Vec<_> =
            mapping.squashed_members().iter().map(|m| m.element).collect();
        assert_eq!(members, [ElementId(4)]);
    }

    #[test]
    fn remove_squashed_ignores_unknown_members() {
        let mut h = Harness::new(squash_layout().build());
        let mut mapping = squashing_mapping(&mut h);
        mapping.remove_squashed(&mut h.cx(), ElementId(99));
        assert_eq!(mapping.squashed_members().len(), 2);
        mapping.remove_squashed(&mut h.cx(), ElementId(3));
        assert_eq!(mapping.squashed_members().len(), 1);
        assert_eq!(mapping.squashed_members()[0].element, ElementId(4));
    }

    #[test]
    fn member_clipped_by_squashed_sibling_gets_local_clip() {
        // Element 5 sits inside squashed element 3, which clips to 8x8.
        let layout = squash_layout()
            .child(5, 3, Rect::new(2.0, 2.0, 12.0, 12.0))
            .with(3, |e| e.clip = Some(Rect::new(0.0, 0.0, 8.0, 8.0)))
            .with(5, |e| e.clipping_container = Some(ElementId(3)))
            .build();
        let mut h = Harness::new(layout);
        let mut mapping = CompositedLayerMapping::new(ElementId(2), &mut h.cx());
        mapping.assign_squashed(&mut h.cx(), ElementId(3), 0);
        mapping.assign_squashed(&mut h.cx(), ElementId(5), 1);
        mapping.toggle_role(&mut h.cx(), LayerRole::Squashing, true);
        let owner = h.element(2);
        mapping.update_squashing_geometry(&mut h.cx(), &owner, Vec2::ZERO, Vec2::ZERO);

        let members = mapping.squashed_members();
        assert_eq!(members[0].local_clip_rect, INFINITE_RECT);
        // Clip of 3 in 3's space, shifted into 5's paint space.
        assert_eq!(members[1].offset_from_owner, Vec2::new(-2.0, -2.0));
        assert_eq!(members[1].local_clip_rect, Rect::new(-2.0, -2.0, 6.0, 6.0));
    }
}
