// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The read-only view of laid-out elements that the compositor consumes.
//!
//! Layout and style resolution happen elsewhere. What reaches the compositor
//! is one [`ElementSnapshot`] per paintable element, pulled through the
//! [`LayoutProvider`] trait. All rectangles in a snapshot are in the
//! element's own local space (its border box origin is the local origin
//! unless stated otherwise); `offset_from_root` places that space in the
//! document.
//!
//! [`LayoutTree`] is a plain map-backed provider, suitable for embedding
//! and for tests.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use kurbo::{Rect, Size, Vec2};

use crate::geometry::INFINITE_RECT;
use crate::layer::{ElementId, SurfaceId};
use crate::reasons::CompositingReasons;
use crate::style::StyleSnapshot;

/// A decoded image an element can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSource {
    /// The decoded surface.
    pub surface: SurfaceId,
    /// Whether decoding has finished.
    pub loaded: bool,
    /// Whether the image is a plain bitmap (as opposed to vector or
    /// generated content).
    pub is_bitmap: bool,
}

/// What kind of box an element is, as far as compositing cares.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ElementKind {
    /// An ordinary box.
    #[default]
    Box,
    /// An `<img>`; `None` while no resource is attached.
    Image(Option<ImageSource>),
    /// A `<video>`.
    Video {
        /// The platform surface frames are delivered to.
        surface: Option<SurfaceId>,
        /// Whether a frame (rather than the poster) is being shown.
        shows_video: bool,
    },
    /// A `<canvas>`; `surface` is set when the context is accelerated.
    Canvas {
        /// The accelerated context's surface.
        surface: Option<SurfaceId>,
    },
    /// An embedded plugin; `surface` is set when it composites itself.
    Plugin {
        /// The plugin's surface.
        surface: Option<SurfaceId>,
    },
}

impl ElementKind {
    /// Replaced content paints something other than CSS boxes.
    #[must_use]
    pub fn is_replaced(self) -> bool {
        matches!(
            self,
            Self::Image(_) | Self::Video { .. } | Self::Canvas { .. } | Self::Plugin { surface: None }
        )
    }

    /// Content produced outside painting and handed to the layer directly.
    #[must_use]
    pub fn is_accelerated_contents(self) -> bool {
        matches!(
            self,
            Self::Video { .. }
                | Self::Canvas { surface: Some(_) }
                | Self::Plugin { surface: Some(_) }
        )
    }

    /// The platform surface to show as layer contents, if any.
    #[must_use]
    pub fn platform_surface(self) -> Option<SurfaceId> {
        match self {
            Self::Video { surface, .. }
            | Self::Canvas { surface }
            | Self::Plugin { surface } => surface,
            Self::Box | Self::Image(_) => None,
        }
    }
}

/// Scroll state of an element with an overflow clip.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScrollState {
    /// The padding box minus scrollbars, in local space.
    pub client_box: Rect,
    /// Size of the whole scrollable area.
    pub scroll_size: Size,
    /// Current scroll offset, adjusted for the scroll origin.
    pub scroll_offset: Vec2,
    /// Whether the element scrolls on the compositor.
    pub needs_composited_scrolling: bool,
    /// Whether scrollbars get their own layers.
    pub composited_scrollbars: bool,
    /// Horizontal scrollbar frame, in local space.
    pub horizontal_scrollbar: Option<Rect>,
    /// Vertical scrollbar frame, in local space.
    pub vertical_scrollbar: Option<Rect>,
    /// Scroll corner and resizer, in local space; empty when absent.
    pub scroll_corner: Rect,
    /// Whether scrollbars overlay content.
    pub has_overlay_scrollbars: bool,
    /// Whether a scrolled descendant paints above the element's own
    /// stacking context, forcing overlay scrollbars to be reparented.
    pub has_topmost_scroll_child: bool,
    /// Bounds of block selection gaps, in scrolled-content space.
    pub block_selection_gaps: Rect,
}

impl ScrollState {
    /// Whether a horizontal scrollbar layer is needed.
    #[must_use]
    pub fn needs_horizontal_scrollbar_layer(&self) -> bool {
        self.composited_scrollbars && self.horizontal_scrollbar.is_some()
    }

    /// Whether a vertical scrollbar layer is needed.
    #[must_use]
    pub fn needs_vertical_scrollbar_layer(&self) -> bool {
        self.composited_scrollbars && self.vertical_scrollbar.is_some()
    }

    /// Whether a scroll corner layer is needed.
    #[must_use]
    pub fn needs_scroll_corner_layer(&self) -> bool {
        self.composited_scrollbars && !self.scroll_corner.is_zero_area()
    }

    /// Whether overflow controls must be reparented above the stacking
    /// context.
    #[must_use]
    pub fn needs_to_reparent_overflow_controls(&self) -> bool {
        self.has_overlay_scrollbars && self.has_topmost_scroll_child
    }
}

/// Facts about what an element paints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaintedContent {
    /// The element itself is visible.
    pub has_visible_content: bool,
    /// Some descendant (composited or not) is visible.
    pub has_visible_descendant: bool,
    /// Any background or box decoration, visible or not.
    pub has_box_decorations_or_background: bool,
    /// Visible borders, outlines, shadows, or backgrounds.
    pub has_visible_box_decorations: bool,
    /// A background is set.
    pub has_background: bool,
    /// Child renderers with non-empty boxes exist.
    pub has_non_empty_child_renderers: bool,
    /// The root element or body has a complex background that must be painted.
    pub has_complex_root_background: bool,
    /// The painted background covers the compositing bounds opaquely.
    pub background_known_opaque: bool,
    /// Overlay scrollbars are dirty and must be painted in a second pass.
    pub contains_dirty_overlay_scrollbars: bool,
}

/// One element as the compositor sees it.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementSnapshot {
    /// Stable identity.
    pub id: ElementId,
    /// Parent in the paint tree.
    pub parent: Option<ElementId>,
    /// Children in paint order.
    pub children: Vec<ElementId>,
    /// Stacking order among siblings; negative children paint below the
    /// parent's foreground.
    pub z_index: i32,
    /// What kind of box this is.
    pub kind: ElementKind,
    /// Computed style.
    pub style: StyleSnapshot,
    /// Why the element is (or is not) composited.
    pub reasons: CompositingReasons,
    /// Bounding box of everything painted into the element's backing,
    /// including non-composited descendants.
    pub compositing_bounds: Rect,
    /// Border box.
    pub border_box: Rect,
    /// Content box, where replaced content is placed.
    pub content_box: Rect,
    /// Position of the local origin in document space.
    pub offset_from_root: Vec2,
    /// Position of the local origin relative to the nearest ancestor with a
    /// transform (or the root).
    pub offset_from_transformed_ancestor: Vec2,
    /// Overflow clip box intersected with any CSS clip, if the element
    /// clips.
    pub clip: Option<Rect>,
    /// Whether a CSS `clip` is set (as opposed to an overflow clip only).
    pub has_css_clip: bool,
    /// Nearest ancestor whose clip applies to this element.
    pub clipping_container: Option<ElementId>,
    /// Scroll state, if the element is a scroller.
    pub scroll: Option<ScrollState>,
    /// Whether this is the document root.
    pub is_root: bool,
    /// Whether the element establishes a stacking context.
    pub is_stacking_context: bool,
    /// Painted content facts.
    pub content: PaintedContent,
    /// The element rendering this element's reflection.
    pub reflection: Option<ElementId>,
    /// Whether this element is itself a reflection.
    pub is_reflection: bool,
    /// Whether the element's clip must apply to composited descendants.
    pub clips_compositing_descendants: bool,
    /// Whether the element's foreground must be split from its background
    /// to sort correctly against negative z-order children.
    pub needs_foreground_layer: bool,
    /// Whether the element paints a fixed-position root background.
    pub paints_fixed_root_background: bool,
    /// Scroll parent for compositor-driven scrolling.
    pub scroll_parent: Option<ElementId>,
    /// Clip parent for out-of-flow clipping.
    pub clip_parent: Option<ElementId>,
    /// Whether the containing block is the nearest ancestor scroller.
    pub containing_block_is_ancestor_scroller: bool,
    /// The composited element this element is squashed into, if any.
    pub squash_into: Option<ElementId>,
    /// Root of the 3-D rendering context the element takes part in.
    pub rendering_context_root: Option<ElementId>,
    /// Whether the element isolates blending of composited descendants.
    pub isolates_composited_descendants: bool,
}

impl ElementSnapshot {
    /// A visible, empty box with no style and no compositing reasons.
    #[must_use]
    pub fn new(id: ElementId) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            z_index: 0,
            kind: ElementKind::Box,
            style: StyleSnapshot::default(),
            reasons: CompositingReasons::empty(),
            compositing_bounds: Rect::ZERO,
            border_box: Rect::ZERO,
            content_box: Rect::ZERO,
            offset_from_root: Vec2::ZERO,
            offset_from_transformed_ancestor: Vec2::ZERO,
            clip: None,
            has_css_clip: false,
            clipping_container: None,
            scroll: None,
            is_root: false,
            is_stacking_context: false,
            content: PaintedContent {
                has_visible_content: true,
                ..PaintedContent::default()
            },
            reflection: None,
            is_reflection: false,
            clips_compositing_descendants: false,
            needs_foreground_layer: false,
            paints_fixed_root_background: false,
            scroll_parent: None,
            clip_parent: None,
            containing_block_is_ancestor_scroller: false,
            squash_into: None,
            rendering_context_root: None,
            isolates_composited_descendants: false,
        }
    }

    /// The clip box children are clipped to, or [`INFINITE_RECT`].
    #[must_use]
    pub fn clip_box(&self) -> Rect {
        self.clip.unwrap_or(INFINITE_RECT)
    }

    /// Whether the element scrolls on the compositor.
    #[must_use]
    pub fn needs_composited_scrolling(&self) -> bool {
        self.scroll
            .as_ref()
            .is_some_and(|s| s.needs_composited_scrolling)
    }
}

/// Pull-based access to laid-out elements.
pub trait LayoutProvider {
    /// Returns the snapshot for `id`, or `None` if it is not in the tree.
    fn element(&self, id: ElementId) -> Option<&ElementSnapshot>;

    /// The document root element.
    fn root(&self) -> Option<ElementId>;

    /// The document rectangle. Root layers are positioned relative to its
    /// origin.
    fn document_rect(&self) -> Rect {
        Rect::ZERO
    }

    /// Size of the visible viewport.
    fn viewport_size(&self) -> Size;

    /// Returns `true` if `id` is a strict descendant of `ancestor`.
    fn is_descendant_of(&self, id: ElementId, ancestor: ElementId) -> bool {
        let mut current = self.element(id).and_then(|e| e.parent);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.element(p).and_then(|e| e.parent);
        }
        false
    }

    /// Offset of `id`'s local space relative to `ancestor`'s local space.
    fn offset_between(&self, id: ElementId, ancestor: ElementId) -> Vec2 {
        match (self.element(id), self.element(ancestor)) {
            (Some(e), Some(a)) => e.offset_from_root - a.offset_from_root,
            _ => Vec2::ZERO,
        }
    }

    /// The clip applied to `id`'s background by its ancestors, in the local
    /// space of `relative_to`.
    ///
    /// Clips of every ancestor of `id` up to and including `relative_to`
    /// are intersected. When `ignore_overflow_clip` is set the overflow clip
    /// of `relative_to` itself is skipped. Returns [`INFINITE_RECT`] when
    /// nothing clips.
    fn background_clip_rect(
        &self,
        id: ElementId,
        relative_to: ElementId,
        ignore_overflow_clip: bool,
    ) -> Rect {
        let Some(reference) = self.element(relative_to) else {
            return INFINITE_RECT;
        };
        let mut clip = INFINITE_RECT;
        let mut current = self.element(id).and_then(|e| e.parent);
        while let Some(p) = current {
            let Some(ancestor) = self.element(p) else {
                break;
            };
            let skip = p == relative_to && ignore_overflow_clip;
            if let (Some(c), false) = (ancestor.clip, skip) {
                let shifted = c + (ancestor.offset_from_root - reference.offset_from_root);
                clip = clip.intersect(shifted);
            }
            if p == relative_to {
                break;
            }
            current = ancestor.parent;
        }
        clip
    }
}

/// A map-backed [`LayoutProvider`].
#[derive(Clone, Debug, Default)]
pub struct LayoutTree {
    elements: BTreeMap<ElementId, ElementSnapshot>,
    root: Option<ElementId>,
    viewport: Size,
    document_rect: Rect,
}

impl LayoutTree {
    /// Creates an empty tree with the given viewport size.
    #[must_use]
    pub fn new(viewport: Size) -> Self {
        Self {
            elements: BTreeMap::new(),
            root: None,
            viewport,
            document_rect: Rect::from_origin_size((0.0, 0.0), viewport),
        }
    }

    /// Inserts or replaces an element.
    ///
    /// The element is appended to its parent's children if missing there.
    /// An element with no parent and `is_root` set becomes the root.
    pub fn insert(&mut self, element: ElementSnapshot) {
        let id = element.id;
        if element.is_root {
            self.root = Some(id);
        }
        if let Some(parent) = element.parent.and_then(|p| self.elements.get_mut(&p)) {
            if !parent.children.contains(&id) {
                parent.children.push(id);
            }
        }
        self.elements.insert(id, element);
    }

    /// Removes an element and its subtree.
    pub fn remove(&mut self, id: ElementId) {
        let Some(element) = self.elements.remove(&id) else {
            return;
        };
        if let Some(parent) = element.parent.and_then(|p| self.elements.get_mut(&p)) {
            parent.children.retain(|&c| c != id);
        }
        if self.root == Some(id) {
            self.root = None;
        }
        for child in element.children {
            self.remove(child);
        }
    }

    /// Mutable access to an element.
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut ElementSnapshot> {
        self.elements.get_mut(&id)
    }

    /// Sets the document rectangle.
    pub fn set_document_rect(&mut self, rect: Rect) {
        self.document_rect = rect;
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the tree has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl LayoutProvider for LayoutTree {
    fn element(&self, id: ElementId) -> Option<&ElementSnapshot> {
        self.elements.get(&id)
    }

    fn root(&self) -> Option<ElementId> {
        self.root
    }

    fn document_rect(&self) -> Rect {
        self.document_rect
    }

    fn viewport_size(&self) -> Size {
        self.viewport
    }
}
