// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint dispatch: routing a layer's paint callback to the right routine.
//!
//! The graphics subsystem asks for a layer to be painted with a dirty rect in
//! that layer's space. The owning mapping decides what that layer shows:
//!
//! - Content layers (primary, foreground, background, masks, scrolling
//!   contents and block selection) call the owner's
//!   [`ElementPainter::paint_element`] with flags derived from the layer's
//!   painting phase.
//! - The squashing layer paints every squashed member in order, each with
//!   its own offset and a software clip.
//! - Scrollbar and scroll corner layers call the widget painters with the
//!   context moved to the widget's origin.
//!
//! Every change to the [`GraphicsContext`] happens inside a [`ContextScope`],
//! so it is undone before the next member or layer paints, whatever path the
//! painter takes out.
//!
//! Layers that this crate does not own are ignored.

use core::ops::{Deref, DerefMut};

use kurbo::{Rect, Vec2};

use crate::element::LayoutProvider;
use crate::geometry::pixel_snap;
use crate::layer::{ElementId, GraphicsLayerId, GraphicsLayerStore};
use crate::mapping::{CompositedLayerMapping, SquashedMember};
use crate::phase::PaintLayerFlags;
use crate::role::LayerRole;
use crate::scrolling::ScrollbarOrientation;
use crate::trace::PaintTarget;

/// The drawing surface a paint routine records into.
///
/// Only the state operations dispatch needs are part of the trait; drawing
/// itself is between the embedder's context and its painter.
pub trait GraphicsContext {
    /// Pushes the current transform and clip.
    fn save(&mut self);

    /// Pops the state pushed by the matching [`save`](Self::save).
    fn restore(&mut self);

    /// Translates subsequent drawing by `offset`.
    fn translate(&mut self, offset: Vec2);

    /// Intersects the clip with `rect`, in current coordinates.
    fn clip_rect(&mut self, rect: Rect);
}

/// Saves a context on creation and restores it on drop.
pub struct ContextScope<'a> {
    context: &'a mut dyn GraphicsContext,
}

impl<'a> ContextScope<'a> {
    /// Saves `context` and returns a guard that restores it.
    pub fn new(context: &'a mut dyn GraphicsContext) -> Self {
        context.save();
        Self { context }
    }
}

impl core::fmt::Debug for ContextScope<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContextScope").finish_non_exhaustive()
    }
}

impl<'a> Deref for ContextScope<'a> {
    type Target = dyn GraphicsContext + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.context
    }
}

impl DerefMut for ContextScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.context
    }
}

impl Drop for ContextScope<'_> {
    fn drop(&mut self) {
        self.context.restore();
    }
}

/// One call into an element's paint routine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaintRequest {
    /// The element to paint.
    pub element: ElementId,
    /// Which phases to paint. Empty means the whole element, as for
    /// squashed members.
    pub flags: PaintLayerFlags,
    /// The area to paint, in the element's paint space.
    pub dirty: Rect,
    /// The element's subpixel accumulation, to keep painted content aligned
    /// with the snapped layer.
    pub subpixel_accumulation: Vec2,
    /// Whether the element is painted into another element's squashing
    /// layer, relative to its nearest transformed ancestor.
    pub squashed: bool,
}

/// The embedder's paint routines.
pub trait ElementPainter {
    /// Paints the phases of `request.element` named by `request.flags`.
    fn paint_element(&mut self, context: &mut dyn GraphicsContext, request: &PaintRequest);

    /// Paints a scrollbar of `element` at the context origin. `dirty` is in
    /// the scrollbar's own space.
    fn paint_scrollbar(
        &mut self,
        context: &mut dyn GraphicsContext,
        element: ElementId,
        orientation: ScrollbarOrientation,
        dirty: Rect,
    ) {
        _ = (context, element, orientation, dirty);
    }

    /// Paints the scroll corner and resizer of `element` at the context
    /// origin. `dirty` is in the corner's own space.
    fn paint_scroll_corner(
        &mut self,
        context: &mut dyn GraphicsContext,
        element: ElementId,
        dirty: Rect,
    ) {
        _ = (context, element, dirty);
    }
}

/// Read-only state a paint call needs besides the mapping.
pub(crate) struct PaintEnv<'a> {
    pub store: &'a GraphicsLayerStore,
    pub layout: &'a dyn LayoutProvider,
    /// Whether a separate layer paints the fixed root background.
    pub has_fixed_root_background_layer: bool,
}

/// What to paint, where, and how it is clipped.
struct PaintInfo {
    element: ElementId,
    composited_bounds: Rect,
    offset_from_owner: Vec2,
    subpixel_accumulation: Vec2,
    flags: PaintLayerFlags,
    /// Software clip for squashed members, in member paint space.
    squash_clip: Option<Rect>,
    repaint_overlay_scrollbars: bool,
}

impl PaintInfo {
    fn for_member(member: &SquashedMember) -> Self {
        Self {
            element: member.element,
            composited_bounds: member.composited_bounds,
            offset_from_owner: member.offset_from_owner,
            subpixel_accumulation: member.subpixel_accumulation,
            flags: PaintLayerFlags::empty(),
            squash_clip: Some(member.local_clip_rect),
            repaint_overlay_scrollbars: false,
        }
    }
}

impl CompositedLayerMapping {
    /// Paints `layer`, one of this mapping's layers, for `dirty` in layer
    /// space.
    ///
    /// Returns where the call was routed, or `None` if the layer shows no
    /// painted content of this mapping.
    pub(crate) fn paint_contents(
        &self,
        env: &PaintEnv<'_>,
        layer: GraphicsLayerId,
        context: &mut dyn GraphicsContext,
        painter: &mut dyn ElementPainter,
        dirty: Rect,
    ) -> Option<PaintTarget> {
        let role = self.layers().role_of(layer)?;
        let element = env.layout.element(self.element());

        if role.paints_owner_content() {
            let mut flags = PaintLayerFlags::from_phase(env.store.painting_phase(layer));
            if role == LayerRole::Background {
                // The foreground phase is what walks into child elements.
                flags |= PaintLayerFlags::ROOT_BACKGROUND_ONLY
                    | PaintLayerFlags::COMPOSITING_FOREGROUND_PHASE;
            } else if env.has_fixed_root_background_layer {
                flags |= PaintLayerFlags::SKIP_ROOT_BACKGROUND;
            }
            let info = PaintInfo {
                element: self.element(),
                composited_bounds: self.composited_bounds(),
                offset_from_owner: env.store.offset_from_owner(layer),
                subpixel_accumulation: self.subpixel_accumulation(),
                flags,
                squash_clip: None,
                repaint_overlay_scrollbars: element
                    .is_some_and(|e| e.content.contains_dirty_overlay_scrollbars),
            };
            do_paint_task(&info, context, painter, dirty);
            return Some(PaintTarget::Owner);
        }

        match role {
            LayerRole::Squashing => {
                let members = self.squashed_members();
                for member in members {
                    do_paint_task(&PaintInfo::for_member(member), context, painter, dirty);
                }
                Some(PaintTarget::SquashedMembers(members.len()))
            }
            LayerRole::HorizontalScrollbar | LayerRole::VerticalScrollbar => {
                let (orientation, frame) = match role {
                    LayerRole::HorizontalScrollbar => (
                        ScrollbarOrientation::Horizontal,
                        element?.scroll.as_ref()?.horizontal_scrollbar?,
                    ),
                    _ => (
                        ScrollbarOrientation::Vertical,
                        element?.scroll.as_ref()?.vertical_scrollbar?,
                    ),
                };
                let origin = frame.origin().to_vec2();
                let mut scope = ContextScope::new(context);
                scope.translate(-origin);
                painter.paint_scrollbar(&mut *scope, self.element(), orientation, dirty + origin);
                Some(PaintTarget::Scrollbar(orientation))
            }
            LayerRole::ScrollCorner => {
                let corner = element?.scroll.as_ref()?.scroll_corner;
                let origin = corner.origin().to_vec2();
                let mut scope = ContextScope::new(context);
                scope.translate(-origin);
                painter.paint_scroll_corner(&mut *scope, self.element(), dirty + origin);
                Some(PaintTarget::ScrollCorner)
            }
            _ => None,
        }
    }
}

/// Paints one element with the context moved into its paint space.
fn do_paint_task(
    info: &PaintInfo,
    context: &mut dyn GraphicsContext,
    painter: &mut dyn ElementPainter,
    dirty: Rect,
) {
    let mut scope = ContextScope::new(context);
    scope.translate(-info.offset_from_owner);

    let mut dirty = dirty + info.offset_from_owner;
    if info.flags.contains(PaintLayerFlags::OVERFLOW_CONTENTS) {
        dirty = dirty + info.subpixel_accumulation.round();
    } else {
        dirty = dirty.intersect(pixel_snap(
            info.composited_bounds + info.subpixel_accumulation,
        ));
    }

    let mut request = PaintRequest {
        element: info.element,
        flags: info.flags,
        dirty,
        subpixel_accumulation: info.subpixel_accumulation,
        squashed: info.squash_clip.is_some(),
    };

    if let Some(clip) = info.squash_clip {
        // Squashed members have no graphics layer to clip them.
        let mut clipped = ContextScope::new(&mut *scope);
        request.dirty = request.dirty.intersect(clip);
        clipped.clip_rect(request.dirty);
        painter.paint_element(&mut *clipped, &request);
        return;
    }

    painter.paint_element(&mut *scope, &request);
    if info.repaint_overlay_scrollbars {
        request.flags |= PaintLayerFlags::OVERLAY_SCROLLBARS;
        painter.paint_element(&mut *scope, &request);
    }
}
