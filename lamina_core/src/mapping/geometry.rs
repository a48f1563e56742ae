// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry: positions, sizes and per-layer properties.
//!
//! Everything is computed relative to the element's compositing container.
//! The container's primary layer (or its clip, child-transform or
//! scrolling-contents layer, whichever children attach to) is the
//! *parent location* that positions are expressed against.
//!
//! Repaints are only requested when the value that drives them changed, so
//! running the pass twice on unchanged input leaves nothing dirty.

use kurbo::{Point, Rect, Size, Vec2};

use crate::element::{ElementKind, ElementSnapshot, ScrollState};
use crate::geometry::{enclosing, pixel_snap, split_subpixel};
use crate::layer::{ElementId, GraphicsLayerId};
use crate::role::LayerRole;
use crate::style::BlendMode;
use crate::transform::{Transform3d, TransformOrigin};

use super::lifecycle::directly_composited_image;
use super::{CompositedLayerMapping, PassContext};

/// What the geometry pass needs to know about the compositing container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ContainerGeometry {
    pub element: ElementId,
    pub subpixel: Vec2,
    pub pixel_snapped_bounds: Rect,
    pub has_descendant_clip: bool,
    pub has_child_transform: bool,
    pub clip_box: Rect,
    pub scrolls_on_compositor: bool,
    pub client_origin: Vec2,
    pub scroll_offset: Vec2,
}

impl ContainerGeometry {
    /// Where layers attached to this container are positioned from, in the
    /// container's local space.
    fn parent_location(&self) -> Vec2 {
        if self.scrolls_on_compositor {
            self.client_origin.round() - self.scroll_offset.round()
        } else if self.has_descendant_clip {
            pixel_snap(self.clip_box).origin().to_vec2() + self.subpixel.round()
        } else if self.has_child_transform {
            self.subpixel.round()
        } else {
            self.pixel_snapped_bounds.origin().to_vec2()
        }
    }
}

/// Inputs to geometry that come from outside the element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct GeometryInputs {
    /// The compositing container, or `None` for the root.
    pub container: Option<ContainerGeometry>,
    /// Nearest stacking context ancestor.
    pub stacking_context: Option<ElementId>,
    /// Effective opacity, folding in non-composited stacking-context
    /// ancestors up to the container.
    pub opacity: f32,
    /// Whether a visible descendant paints into this element's layers.
    pub has_visible_non_composited_descendant: bool,
}

impl CompositedLayerMapping {
    /// Describes this mapping to its composited descendants.
    pub(crate) fn as_container(&self, element: &ElementSnapshot) -> ContainerGeometry {
        let scroll = element.scroll.as_ref();
        ContainerGeometry {
            element: self.element,
            subpixel: self.subpixel_accumulation,
            pixel_snapped_bounds: self.pixel_snapped_composited_bounds(),
            has_descendant_clip: self.layers.has(LayerRole::DescendantClip),
            has_child_transform: self.layers.has(LayerRole::ChildTransform),
            clip_box: element.clip_box(),
            scrolls_on_compositor: self.layers.has(LayerRole::ScrollingContainer),
            client_origin: scroll.map_or(Vec2::ZERO, |s| s.client_box.origin().to_vec2()),
            scroll_offset: scroll.map_or(Vec2::ZERO, |s| s.scroll_offset),
        }
    }

    /// Positions, sizes and configures every live layer.
    pub(crate) fn update_geometry(
        &mut self,
        cx: &mut PassContext<'_, '_>,
        element: &ElementSnapshot,
        inputs: &GeometryInputs,
    ) {
        let Some(primary) = self.primary_layer() else {
            return;
        };
        let style = &element.style;

        if !style.transform_animating {
            cx.store
                .set_transform(primary, style.transform.unwrap_or(Transform3d::IDENTITY));
        }
        cx.store.set_opacity(primary, inputs.opacity);
        cx.store.set_filters(primary, &style.filters);

        // Bounds relative to the container.
        self.composited_bounds = element.compositing_bounds;
        let container = inputs.container.as_ref();
        let offset = match container {
            Some(c) => cx.layout.offset_between(element.id, c.element) + c.subpixel,
            None => element.offset_from_root,
        };
        let (snapped, subpixel) = split_subpixel(offset);
        self.subpixel_accumulation = subpixel;
        let local = pixel_snap(self.composited_bounds + subpixel);
        let relative = local + snapped;
        let local_origin = local.origin().to_vec2();

        let mut parent_location = container.map_or_else(
            || cx.layout.document_rect().origin().to_vec2(),
            ContainerGeometry::parent_location,
        );

        if let (Some(c), Some(clip)) = (container, self.layers.get(LayerRole::AncestorClip)) {
            let rect = pixel_snap(cx.layout.background_clip_rect(element.id, c.element, true));
            cx.store.set_position(clip, rect.origin() - parent_location);
            cx.store.set_size(clip, rect.size());
            cx.store
                .set_offset_from_owner(clip, rect.origin().to_vec2() - snapped);
            // The primary layer is positioned inside the clip.
            parent_location = rect.origin().to_vec2();
        }
        self.update_overflow_controls_host(cx, element, inputs.stacking_context);

        cx.store.set_position(primary, relative.origin() - parent_location);
        cx.store.set_offset_from_owner(primary, local_origin);
        cx.store.set_size(primary, relative.size());
        cx.store.set_contents_visible(
            primary,
            element.content.has_visible_content || inputs.has_visible_non_composited_descendant,
        );
        cx.store.set_backface_visible(primary, style.backface_visible);

        self.update_squashing_geometry(cx, element, offset, parent_location);

        let clip_box = pixel_snap(element.clip_box());
        let clipping_mask = self.layers.get(LayerRole::ChildClippingMask);

        if let Some(clip) = self.layers.get(LayerRole::DescendantClip) {
            cx.store
                .set_position(clip, clip_box.origin() - local_origin + subpixel.round());
            cx.store.set_size(clip, clip_box.size());
            cx.store.set_offset_from_owner(clip, clip_box.origin().to_vec2());
            if let Some(mask) = clipping_mask {
                if !self.layers.has(LayerRole::ScrollingContainer) && !style.has_clip_path {
                    copy_frame(cx, clip, mask);
                }
            }
        }

        if let Some(transform) = self.layers.get(LayerRole::ChildTransform) {
            let border = pixel_snap(element.border_box);
            cx.store.set_size(transform, border.size());
            cx.store.set_position(
                transform,
                (-self.composited_bounds.origin().to_vec2().round()).to_point(),
            );
        }

        if let Some(mask) = self.layers.get(LayerRole::Mask) {
            resize_and_repaint(cx, mask, relative.size());
            cx.store.set_position(mask, Point::ZERO);
            cx.store.set_offset_from_owner(mask, local_origin);
        }

        let origin = if style.has_transform() {
            let border = Rect::from_origin_size(subpixel.to_point(), element.border_box.size());
            let bounds = pixel_snap(border) + snapped;
            let o = style.transform_origin.resolve(bounds.size());
            TransformOrigin::new(
                bounds.x0 - relative.x0 + o.x,
                bounds.y0 - relative.y0 + o.y,
                o.z,
            )
        } else {
            TransformOrigin::new(relative.width() * 0.5, relative.height() * 0.5, 0.0)
        };
        cx.store.set_transform_origin(primary, origin);

        // Under composited scrolling the foreground follows the scrolled
        // contents instead.
        let scrolls = self.layers.has(LayerRole::ScrollingContainer);
        if let (Some(foreground), false) = (self.layers.get(LayerRole::Foreground), scrolls) {
            let mut size = relative.size();
            let mut offset = local_origin;
            let mut position = Point::ZERO;
            if self.layers.has(LayerRole::DescendantClip) {
                size = clip_box.size();
                offset = clip_box.origin().to_vec2();
            } else if let Some(transform) = self.layers.get(LayerRole::ChildTransform) {
                position = (-cx.store.position(transform).to_vec2()).to_point();
            }
            cx.store.set_position(foreground, position);
            resize_and_repaint(cx, foreground, size);
            cx.store.set_offset_from_owner(foreground, offset);
        }

        if let Some(background) = self.layers.get(LayerRole::Background) {
            let size = if self.background_paints_fixed_root {
                cx.layout.viewport_size()
            } else {
                relative.size()
            };
            cx.store.set_position(background, Point::ZERO);
            resize_and_repaint(cx, background, size);
            cx.store.set_offset_from_owner(background, local_origin);
        }

        if let Some(scroll) = element.scroll.as_ref() {
            self.update_scrolling_geometry(cx, element, scroll, local_origin);
        }

        if let Some(mask) = clipping_mask {
            if style.has_clip_path {
                let (position, size) = (cx.store.position(primary), cx.store.size(primary));
                cx.store.set_position(mask, position);
                resize_and_repaint(cx, mask, size);
                cx.store
                    .set_offset_from_owner(mask, client_box(element).origin().to_vec2());
            }
        }

        if let Some(scroll) = element.scroll.as_ref() {
            self.update_overflow_controls_geometry(cx, scroll, local_origin - subpixel.round());
        }

        if cx.config.blend_modes_enabled {
            if let Some(clip) = self.layers.get(LayerRole::AncestorClip) {
                cx.store.set_blend_mode(clip, style.blend_mode);
                cx.store.set_blend_mode(primary, BlendMode::Normal);
            } else {
                cx.store.set_blend_mode(primary, style.blend_mode);
            }
            cx.store
                .set_isolation_root(primary, element.isolates_composited_descendants);
        }

        cx.store.set_contents_rect(
            primary,
            pixel_snap(element.content_box - self.composited_bounds.origin().to_vec2()),
        );
        cx.store.set_background_color(primary, style.background_color);

        self.update_draws_content(cx, element, inputs);

        let opaque = element.content.background_known_opaque;
        if let Some(background) = self.layers.get(LayerRole::Background) {
            cx.store.set_contents_opaque(primary, false);
            cx.store.set_contents_opaque(background, opaque);
        } else {
            cx.store.set_contents_opaque(primary, opaque);
        }

        let context = element
            .rendering_context_root
            .map_or(0, |root| root.0.wrapping_add(1));
        for (role, layer) in self.layers.iter() {
            if role.participates_in_rendering_context() {
                cx.store.set_rendering_context(layer, context);
            }
            if let Some(flatten) = self.flatten_transform(role, layer, element) {
                cx.store.set_flatten_transform(layer, flatten);
            }
        }
        self.update_children_transform(cx, element);

        cx.coordinator.update_layer_position_constraint(element.id);
        if let Some(top) = self.child_for_superlayers() {
            cx.coordinator.set_layer_is_container_for_fixed_position(
                top,
                style.has_transform() && !element.is_root,
            );
        }
        cx.store.set_compositing_reasons(primary, element.reasons);
        cx.summary.geometry_updated();
    }

    fn update_overflow_controls_host(
        &self,
        cx: &mut PassContext<'_, '_>,
        element: &ElementSnapshot,
        stacking_context: Option<ElementId>,
    ) {
        let Some(host) = self.layers.get(LayerRole::OverflowControlsHost) else {
            return;
        };
        let reparent = element
            .scroll
            .as_ref()
            .is_some_and(ScrollState::needs_to_reparent_overflow_controls);
        let position = if !reparent {
            Point::ZERO
        } else if let (Some(clip), Some(ancestor_clip)) = (
            self.layers.get(LayerRole::OverflowControlsClip),
            self.layers.get(LayerRole::AncestorClip),
        ) {
            copy_frame(cx, ancestor_clip, clip);
            cx.store.set_masks_to_bounds(clip, true);
            (-cx.store.offset_from_owner(clip)).to_point()
        } else {
            stacking_context.map_or(Point::ZERO, |context| {
                cx.layout.offset_between(element.id, context).to_point()
            })
        };
        cx.store.set_position(host, position);
    }

    fn update_scrolling_geometry(
        &self,
        cx: &mut PassContext<'_, '_>,
        element: &ElementSnapshot,
        scroll: &ScrollState,
        local_origin: Vec2,
    ) {
        let (Some(container), Some(contents)) = (
            self.layers.get(LayerRole::ScrollingContainer),
            self.layers.get(LayerRole::ScrollingContents),
        ) else {
            return;
        };
        let client = enclosing(scroll.client_box);
        let client_origin = client.origin().to_vec2();
        let scroll_offset = scroll.scroll_offset.round();

        cx.store.set_position(
            container,
            client.origin() - local_origin + self.subpixel_accumulation.round(),
        );
        cx.store.set_size(container, client.size());
        let old_offset = cx.store.offset_from_owner(container);
        cx.store.set_offset_from_owner(container, -client_origin);
        let client_moved = old_offset != -client_origin;

        if let Some(mask) = self.layers.get(LayerRole::ChildClippingMask) {
            if !element.style.has_clip_path {
                let position = cx.store.position(container);
                cx.store.set_position(mask, position);
                resize_and_repaint(cx, mask, client.size());
                cx.store.set_offset_from_owner(mask, client_origin);
            }
        }

        let scroll_size = scroll.scroll_size.round();
        let old_size = cx.store.size(contents);
        if old_size != scroll_size || client_moved {
            cx.store.set_needs_display(contents);
        }
        let contents_offset = client_origin - scroll_offset;
        if contents_offset != cx.store.offset_from_owner(contents) || old_size != scroll_size {
            let handled = cx.coordinator.scroll_layer_did_change(self.element);
            let position = if handled {
                Point::ZERO
            } else {
                (-scroll_offset).to_point()
            };
            cx.store.set_position(contents, position);
        }
        cx.store.set_size(contents, scroll_size);
        cx.store.set_offset_from_owner(contents, contents_offset);

        if let Some(foreground) = self.layers.get(LayerRole::Foreground) {
            // The foreground paints scrolled content at a fixed position.
            if cx.store.offset_from_owner(foreground) != contents_offset {
                cx.store.set_needs_display(foreground);
            }
            resize_and_repaint(cx, foreground, scroll_size);
            cx.store.set_offset_from_owner(foreground, contents_offset);
        }
    }

    /// Places scrollbar and scroll corner layers; `owner_offset` is the
    /// primary layer's offset from the element with the subpixel part
    /// removed.
    fn update_overflow_controls_geometry(
        &self,
        cx: &mut PassContext<'_, '_>,
        scroll: &ScrollState,
        owner_offset: Vec2,
    ) {
        for (role, frame) in [
            (LayerRole::HorizontalScrollbar, scroll.horizontal_scrollbar),
            (LayerRole::VerticalScrollbar, scroll.vertical_scrollbar),
        ] {
            let Some(layer) = self.layers.get(role) else {
                continue;
            };
            if let Some(frame) = frame {
                cx.store.set_position(layer, frame.origin() - owner_offset);
                cx.store.set_size(layer, frame.size());
            }
            cx.store.set_draws_content(layer, frame.is_some());
        }
        if let Some(layer) = self.layers.get(LayerRole::ScrollCorner) {
            let corner = scroll.scroll_corner;
            cx.store.set_position(layer, corner.origin() - owner_offset);
            cx.store.set_size(layer, corner.size());
            cx.store.set_draws_content(layer, !corner.is_zero_area());
        }
    }

    fn update_draws_content(
        &mut self,
        cx: &mut PassContext<'_, '_>,
        element: &ElementSnapshot,
        inputs: &GeometryInputs,
    ) {
        let Some(primary) = self.primary_layer() else {
            return;
        };
        let content = &element.content;
        let paints_children = (content.has_visible_content && content.has_non_empty_child_renderers)
            || inputs.has_visible_non_composited_descendant;

        if let Some(contents) = self.layers.get(LayerRole::ScrollingContents) {
            // Scrolled content paints into the scrolling contents layer, so
            // the primary layer only needs backing for decorations.
            cx.store.set_draws_content(
                primary,
                content.has_visible_content && content.has_box_decorations_or_background,
            );
            self.scrolling_contents_are_empty =
                !content.has_visible_content || !(content.has_background || paints_children);
            cx.store
                .set_draws_content(contents, !self.scrolling_contents_are_empty);
            self.update_block_selection(cx, element);
            return;
        }

        let painted = contains_painted_content(element, paints_children);
        cx.store.set_draws_content(primary, painted);
        for role in [LayerRole::Foreground, LayerRole::Background] {
            if let Some(layer) = self.layers.get(role) {
                cx.store.set_draws_content(layer, painted);
            }
        }
    }

    /// Selection gaps get their own layer only when nothing else paints the
    /// scrolled content.
    fn update_block_selection(&self, cx: &mut PassContext<'_, '_>, element: &ElementSnapshot) {
        let Some(layer) = self.layers.get(LayerRole::ScrollingBlockSelection) else {
            return;
        };
        if !self.scrolling_contents_are_empty {
            cx.store.set_draws_content(layer, false);
            return;
        }
        let Some(scroll) = element.scroll.as_ref() else {
            return;
        };
        let gaps = scroll.block_selection_gaps;
        let draws = !gaps.is_zero_area();
        cx.store.set_draws_content(layer, draws);
        if !draws {
            return;
        }
        let position = gaps.origin() + scroll.scroll_offset.round();
        if cx.store.size(layer) == gaps.size() && cx.store.position(layer) == position {
            return;
        }
        cx.store.set_position(layer, position);
        cx.store.set_size(layer, gaps.size());
        cx.store.set_offset_from_owner(layer, gaps.origin().to_vec2());
        cx.store.set_needs_display(layer);
    }

    /// The flatten flag `layer` should carry, or `None` if its role leaves
    /// flattening alone.
    fn flatten_transform(
        &self,
        role: LayerRole,
        layer: GraphicsLayerId,
        element: &ElementSnapshot,
    ) -> Option<bool> {
        let target = self.layer_for_children_transform();
        // Perspective must reach the children unflattened, and so must the
        // scrolled contents when the scroller carries it.
        if target == Some(layer) && element.style.has_perspective() {
            return Some(false);
        }
        if target.is_some()
            && target == self.layers.get(LayerRole::ScrollingContainer)
            && matches!(
                role,
                LayerRole::ScrollingContents | LayerRole::ScrollingBlockSelection
            )
        {
            return Some(false);
        }
        role.affected_by_preserve_3d()
            .then_some(!element.style.preserve_3d)
    }

    fn update_children_transform(&self, cx: &mut PassContext<'_, '_>, element: &ElementSnapshot) {
        let Some(target) = self.layer_for_children_transform() else {
            return;
        };
        let style = &element.style;
        let transform = match style.perspective {
            Some(distance) if style.has_perspective() => {
                let origin = style.perspective_origin.resolve(cx.store.size(target));
                Transform3d::from_perspective(distance).about_origin(origin)
            }
            _ => Transform3d::IDENTITY,
        };
        cx.store.set_children_transform(target, transform);
    }
}

/// Whether the element's own layers have anything to paint.
fn contains_painted_content(element: &ElementSnapshot, paints_children: bool) -> bool {
    if element.is_reflection || directly_composited_image(element).is_some() {
        return false;
    }
    let content = &element.content;
    if let ElementKind::Video {
        shows_video: true, ..
    } = element.kind
    {
        return content.has_box_decorations_or_background;
    }
    if content.has_visible_box_decorations || element.style.has_mask {
        return true;
    }
    if element.kind.is_replaced() {
        return true;
    }
    if element.is_root && content.has_complex_root_background {
        return true;
    }
    paints_children
}

/// The client box of a scroller, or the border box otherwise.
fn client_box(element: &ElementSnapshot) -> Rect {
    element
        .scroll
        .as_ref()
        .map_or(element.border_box, |s| enclosing(s.client_box))
}

fn copy_frame(cx: &mut PassContext<'_, '_>, from: GraphicsLayerId, to: GraphicsLayerId) {
    let position = cx.store.position(from);
    let size = cx.store.size(from);
    let offset = cx.store.offset_from_owner(from);
    cx.store.set_position(to, position);
    resize_and_repaint(cx, to, size);
    cx.store.set_offset_from_owner(to, offset);
}

/// Resizes `layer`, requesting a repaint only if the size changed.
fn resize_and_repaint(cx: &mut PassContext<'_, '_>, layer: GraphicsLayerId, size: Size) {
    if cx.store.size(layer) != size {
        cx.store.set_size(layer, size);
        cx.store.set_needs_display(layer);
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Rect, Size, Vec2};

    use super::*;
    use crate::element::{ImageSource, LayoutProvider};
    use crate::layer::SurfaceId;
    use crate::mapping::ConfigInputs;
    use crate::style::StyleOrigin;
    use crate::testing::{Harness, LayoutBuilder};

    fn mapped(h: &mut Harness, id: u64, inputs: ConfigInputs) -> CompositedLayerMapping {
        let mut mapping = CompositedLayerMapping::new(ElementId(id), &mut h.cx());
        let element = h.element(id);
        mapping.update_configuration(&mut h.cx(), &element, &inputs);
        mapping.rebuild_hierarchy(&mut h.cx());
        mapping
    }

    fn place(
        h: &mut Harness,
        mapping: &mut CompositedLayerMapping,
        id: u64,
        container: Option<ContainerGeometry>,
    ) {
        let element = h.element(id);
        let inputs = GeometryInputs {
            container,
            stacking_context: None,
            opacity: element.style.opacity,
            has_visible_non_composited_descendant: false,
        };
        mapping.update_geometry(&mut h.cx(), &element, &inputs);
    }

    /// Builds and places the root, returning its mapping and container view.
    fn root(h: &mut Harness) -> (CompositedLayerMapping, ContainerGeometry) {
        let mut root = mapped(h, 1, ConfigInputs::default());
        place(h, &mut root, 1, None);
        let geometry = root.as_container(&h.element(1));
        (root, geometry)
    }

    fn inputs_under(container: u64) -> ConfigInputs {
        ConfigInputs {
            container: Some(ElementId(container)),
            ..ConfigInputs::default()
        }
    }

    #[test]
    fn fractional_offset_is_snapped_and_accumulated() {
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(10.25, 20.75, 110.25, 70.75))
            .build();
        let mut h = Harness::new(layout);
        let (_root, container) = root(&mut h);
        let mut mapping = mapped(&mut h, 2, inputs_under(1));
        place(&mut h, &mut mapping, 2, Some(container));

        let primary = mapping.primary_layer().unwrap();
        assert_eq!(h.store.position(primary), Point::new(10.0, 21.0));
        assert_eq!(h.store.size(primary), Size::new(100.0, 50.0));
        assert_eq!(mapping.subpixel_accumulation(), Vec2::new(0.25, -0.25));
    }

    #[test]
    fn children_of_clipping_container_are_placed_in_its_clip() {
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(100.0, 100.0, 300.0, 300.0))
            .child(3, 2, Rect::new(30.0, 40.0, 80.0, 90.0))
            .with(2, |e| {
                e.clip = Some(Rect::new(10.0, 10.0, 190.0, 190.0));
                e.clips_compositing_descendants = true;
            })
            .build();
        let mut h = Harness::new(layout);
        let (_root, root_geometry) = root(&mut h);
        let mut scroller = mapped(&mut h, 2, inputs_under(1));
        place(&mut h, &mut scroller, 2, Some(root_geometry));

        let clip = scroller.layer(LayerRole::DescendantClip).unwrap();
        assert_eq!(h.store.position(clip), Point::new(10.0, 10.0));
        assert_eq!(h.store.size(clip), Size::new(180.0, 180.0));
        assert_eq!(h.store.offset_from_owner(clip), Vec2::new(10.0, 10.0));

        let container = scroller.as_container(&h.element(2));
        let mut child = mapped(&mut h, 3, inputs_under(2));
        place(&mut h, &mut child, 3, Some(container));
        let primary = child.primary_layer().unwrap();
        assert_eq!(h.store.position(primary), Point::new(20.0, 30.0));
    }

    #[test]
    fn ancestor_clip_positions_primary_inside_it() {
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(0.0, 0.0, 100.0, 100.0))
            .child(3, 2, Rect::new(10.0, 10.0, 60.0, 60.0))
            .with(2, |e| e.clip = Some(Rect::new(0.0, 0.0, 40.0, 40.0)))
            .with(3, |e| e.clipping_container = Some(ElementId(2)))
            .build();
        let mut h = Harness::new(layout);
        let (_root, root_geometry) = root(&mut h);
        let mut mapping = mapped(&mut h, 3, inputs_under(1));
        place(&mut h, &mut mapping, 3, Some(root_geometry));

        let clip = mapping.layer(LayerRole::AncestorClip).unwrap();
        assert_eq!(h.store.position(clip), Point::ZERO);
        assert_eq!(h.store.size(clip), Size::new(40.0, 40.0));
        assert_eq!(h.store.offset_from_owner(clip), Vec2::new(-10.0, -10.0));
        let primary = mapping.primary_layer().unwrap();
        assert_eq!(h.store.position(primary), Point::new(10.0, 10.0));
    }

    fn scroller_layout() -> LayoutBuilder {
        LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(0.0, 0.0, 200.0, 100.0))
            .with(2, |e| {
                e.clips_compositing_descendants = true;
                e.style.has_border_radius = true;
                e.scroll = Some(ScrollState {
                    client_box: Rect::new(0.0, 0.0, 185.0, 100.0),
                    scroll_size: Size::new(185.0, 400.0),
                    scroll_offset: Vec2::new(0.0, 30.0),
                    needs_composited_scrolling: true,
                    composited_scrollbars: true,
                    vertical_scrollbar: Some(Rect::new(185.0, 0.0, 200.0, 100.0)),
                    ..ScrollState::default()
                });
            })
    }

    #[test]
    fn scrolling_contents_are_offset_by_scroll_position() {
        let mut h = Harness::new(scroller_layout().build());
        let (_root, root_geometry) = root(&mut h);
        let mut mapping = mapped(&mut h, 2, inputs_under(1));
        place(&mut h, &mut mapping, 2, Some(root_geometry));

        let container = mapping.layer(LayerRole::ScrollingContainer).unwrap();
        assert_eq!(h.store.size(container), Size::new(185.0, 100.0));
        let contents = mapping.layer(LayerRole::ScrollingContents).unwrap();
        assert_eq!(h.store.position(contents), Point::new(0.0, -30.0));
        assert_eq!(h.store.size(contents), Size::new(185.0, 400.0));
        assert_eq!(h.store.offset_from_owner(contents), Vec2::new(0.0, -30.0));

        let mask = mapping.layer(LayerRole::ChildClippingMask).unwrap();
        assert_eq!(h.store.size(mask), Size::new(185.0, 100.0));

        let bar = mapping.layer(LayerRole::VerticalScrollbar).unwrap();
        assert_eq!(h.store.position(bar), Point::new(185.0, 0.0));
        assert_eq!(h.store.size(bar), Size::new(15.0, 100.0));
        assert!(h.store.draws_content(bar));
    }

    #[test]
    fn coordinator_owned_scroll_offset_leaves_contents_at_origin() {
        let mut h = Harness::new(scroller_layout().build());
        h.coordinator.handles_scroll_offset = true;
        let (_root, root_geometry) = root(&mut h);
        let mut mapping = mapped(&mut h, 2, inputs_under(1));
        place(&mut h, &mut mapping, 2, Some(root_geometry));

        let contents = mapping.layer(LayerRole::ScrollingContents).unwrap();
        assert_eq!(h.store.position(contents), Point::ZERO);
        assert_eq!(h.store.offset_from_owner(contents), Vec2::new(0.0, -30.0));
    }

    #[test]
    fn second_pass_on_unchanged_input_is_clean() {
        let layout = scroller_layout()
            .with(2, |e| {
                e.needs_foreground_layer = true;
                e.content.has_non_empty_child_renderers = true;
            })
            .build();
        let mut h = Harness::new(layout);
        let (_root, root_geometry) = root(&mut h);
        let mut mapping = mapped(&mut h, 2, inputs_under(1));
        place(&mut h, &mut mapping, 2, Some(root_geometry));
        let _ = h.store.commit();
        let notified = h.coordinator.scroll_layer_changes.len();

        place(&mut h, &mut mapping, 2, Some(root_geometry));
        let changes = h.store.commit();
        assert!(changes.repaint.is_empty(), "{:?}", changes.repaint);
        assert!(changes.geometry.is_empty());
        assert!(changes.properties.is_empty());
        assert_eq!(h.coordinator.scroll_layer_changes.len(), notified);
    }

    #[test]
    fn scrolling_contents_draw_only_with_content() {
        let mut h = Harness::new(scroller_layout().build());
        let (_root, root_geometry) = root(&mut h);
        let mut mapping = mapped(&mut h, 2, inputs_under(1));
        place(&mut h, &mut mapping, 2, Some(root_geometry));
        let contents = mapping.layer(LayerRole::ScrollingContents).unwrap();
        assert!(!h.store.draws_content(contents));

        if let Some(e) = h.layout.get_mut(ElementId(2)) {
            e.content.has_non_empty_child_renderers = true;
        }
        place(&mut h, &mut mapping, 2, Some(root_geometry));
        assert!(h.store.draws_content(contents));
    }

    #[test]
    fn block_selection_draws_when_contents_are_empty() {
        let layout = scroller_layout()
            .with(2, |e| {
                if let Some(scroll) = e.scroll.as_mut() {
                    scroll.block_selection_gaps = Rect::new(0.0, 50.0, 100.0, 70.0);
                }
            })
            .build();
        let mut h = Harness::new(layout);
        let (_root, root_geometry) = root(&mut h);
        let mut mapping = mapped(&mut h, 2, inputs_under(1));
        place(&mut h, &mut mapping, 2, Some(root_geometry));

        let selection = mapping.layer(LayerRole::ScrollingBlockSelection).unwrap();
        assert!(h.store.draws_content(selection));
        assert_eq!(h.store.position(selection), Point::new(0.0, 80.0));
        assert_eq!(h.store.size(selection), Size::new(100.0, 20.0));
    }

    #[test]
    fn fixed_root_background_covers_viewport() {
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 2000.0))
            .with(1, |e| {
                e.paints_fixed_root_background = true;
                e.content.has_complex_root_background = true;
                e.content.background_known_opaque = true;
            })
            .build();
        let mut h = Harness::new(layout);
        let (root, _) = root(&mut h);

        let background = root.layer(LayerRole::Background).unwrap();
        assert_eq!(h.store.size(background), h.layout.viewport_size());
        assert!(h.store.flags(background).contents_opaque);
        let primary = root.primary_layer().unwrap();
        assert!(!h.store.flags(primary).contents_opaque);
        assert!(h.store.draws_content(primary));
    }

    #[test]
    fn transform_origin_is_relative_to_compositing_bounds() {
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(10.0, 10.0, 110.0, 60.0))
            .with(2, |e| {
                e.compositing_bounds = Rect::new(-5.0, -5.0, 105.0, 55.0);
                e.style.transform = Some(Transform3d::from_rotation_z(0.5));
            })
            .build();
        let mut h = Harness::new(layout);
        let (_root, root_geometry) = root(&mut h);
        let mut mapping = mapped(&mut h, 2, inputs_under(1));
        place(&mut h, &mut mapping, 2, Some(root_geometry));

        let primary = mapping.primary_layer().unwrap();
        assert_eq!(h.store.position(primary), Point::new(5.0, 5.0));
        assert_eq!(
            h.store.transform_origin(primary),
            TransformOrigin::new(55.0, 30.0, 0.0)
        );
        assert_eq!(
            h.store.transform(primary),
            Transform3d::from_rotation_z(0.5)
        );
    }

    #[test]
    fn animating_transform_is_left_alone() {
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(0.0, 0.0, 10.0, 10.0))
            .with(2, |e| {
                e.style.transform = Some(Transform3d::from_scale(2.0, 2.0, 1.0));
                e.style.transform_animating = true;
            })
            .build();
        let mut h = Harness::new(layout);
        let (_root, root_geometry) = root(&mut h);
        let mut mapping = mapped(&mut h, 2, inputs_under(1));
        place(&mut h, &mut mapping, 2, Some(root_geometry));
        let primary = mapping.primary_layer().unwrap();
        assert_eq!(h.store.transform(primary), Transform3d::IDENTITY);
    }

    #[test]
    fn perspective_goes_on_child_transform_layer() {
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(0.0, 0.0, 100.0, 100.0))
            .with(2, |e| {
                e.style.perspective = Some(500.0);
                e.style.perspective_origin = StyleOrigin::CENTER;
            })
            .build();
        let mut h = Harness::new(layout);
        let (_root, root_geometry) = root(&mut h);
        let mut mapping = mapped(&mut h, 2, inputs_under(1));
        place(&mut h, &mut mapping, 2, Some(root_geometry));

        let transform = mapping.layer(LayerRole::ChildTransform).unwrap();
        assert_eq!(h.store.size(transform), Size::new(100.0, 100.0));
        assert!(!h.store.flags(transform).flatten_transform);
        assert_eq!(
            h.store.children_transform(transform),
            Transform3d::from_perspective(500.0)
                .about_origin(TransformOrigin::new(50.0, 50.0, 0.0))
        );
    }

    #[test]
    fn preserve_3d_stops_flattening() {
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(0.0, 0.0, 100.0, 100.0))
            .with(2, |e| {
                e.style.preserve_3d = true;
                e.rendering_context_root = Some(ElementId(2));
            })
            .build();
        let mut h = Harness::new(layout);
        let (_root, root_geometry) = root(&mut h);
        let mut mapping = mapped(&mut h, 2, inputs_under(1));
        place(&mut h, &mut mapping, 2, Some(root_geometry));

        let primary = mapping.primary_layer().unwrap();
        assert!(!h.store.flags(primary).flatten_transform);
        assert_eq!(h.store.rendering_context(primary), 3);
    }

    #[test]
    fn painted_content_rules() {
        let mut element = ElementSnapshot::new(ElementId(1));
        assert!(!contains_painted_content(&element, false));
        assert!(contains_painted_content(&element, true));

        element.content.has_visible_box_decorations = true;
        assert!(contains_painted_content(&element, false));

        element.is_reflection = true;
        assert!(!contains_painted_content(&element, true));
        element.is_reflection = false;

        element.kind = ElementKind::Image(Some(ImageSource {
            surface: SurfaceId(1),
            loaded: true,
            is_bitmap: true,
        }));
        element.content.has_visible_box_decorations = false;
        assert!(!contains_painted_content(&element, true));

        element.kind = ElementKind::Video {
            surface: Some(SurfaceId(2)),
            shows_video: true,
        };
        assert!(!contains_painted_content(&element, true));
        element.content.has_box_decorations_or_background = true;
        assert!(contains_painted_content(&element, false));
    }

    #[test]
    fn reparented_overflow_controls_follow_stacking_context() {
        let layout = LayoutBuilder::new()
            .root(1, Size::new(800.0, 600.0))
            .child(2, 1, Rect::new(40.0, 60.0, 240.0, 160.0))
            .with(2, |e| {
                e.scroll = Some(ScrollState {
                    composited_scrollbars: true,
                    has_overlay_scrollbars: true,
                    has_topmost_scroll_child: true,
                    vertical_scrollbar: Some(Rect::new(190.0, 0.0, 200.0, 100.0)),
                    ..ScrollState::default()
                });
            })
            .build();
        let mut h = Harness::new(layout);
        let (_root, root_geometry) = root(&mut h);
        let mut mapping = mapped(&mut h, 2, inputs_under(1));
        let element = h.element(2);
        let inputs = GeometryInputs {
            container: Some(root_geometry),
            stacking_context: Some(ElementId(1)),
            opacity: 1.0,
            has_visible_non_composited_descendant: false,
        };
        mapping.update_geometry(&mut h.cx(), &element, &inputs);

        let host = mapping.layer(LayerRole::OverflowControlsHost).unwrap();
        assert_eq!(h.store.position(host), Point::new(40.0, 60.0));
    }
}
