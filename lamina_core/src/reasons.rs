// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Why an element, or one of its auxiliary layers, is composited.
//!
//! The low bits are reasons the compositor computes for an element. The
//! `LAYER_FOR_*` bits are never computed for elements: they are recorded on
//! auxiliary graphics layers so that diagnostics can say why each layer
//! exists.

bitflags::bitflags! {
    /// A set of compositing reasons.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct CompositingReasons: u64 {
        // Intrinsic reasons that can be known right away by the element.
        /// A 3-D transform.
        const TRANSFORM_3D = 1 << 0;
        /// Accelerated video.
        const VIDEO = 1 << 1;
        /// Accelerated canvas.
        const CANVAS = 1 << 2;
        /// Plugin content.
        const PLUGIN = 1 << 3;
        /// Composited iframe.
        const IFRAME = 1 << 4;
        /// `backface-visibility: hidden`.
        const BACKFACE_VISIBILITY_HIDDEN = 1 << 5;
        /// Running compositor animation.
        const ACTIVE_ANIMATION = 1 << 6;
        /// Transition on a compositable property.
        const TRANSITION_PROPERTY = 1 << 7;
        /// `position: fixed`.
        const POSITION_FIXED = 1 << 8;
        /// Touch overflow scrolling.
        const OVERFLOW_SCROLLING_TOUCH = 1 << 9;
        /// Scrolls with a composited scrolling ancestor that is not its containing block.
        const OVERFLOW_SCROLLING_PARENT = 1 << 10;
        /// Clipped by something outside its composited ancestor chain.
        const OUT_OF_FLOW_CLIPPING = 1 << 11;
        /// Overlaps a video with an overlay.
        const VIDEO_OVERLAY = 1 << 12;
        /// `will-change` compositing hint.
        const WILL_CHANGE_COMPOSITING_HINT = 1 << 13;

        // Overlap reasons that require knowing what is behind you in paint order.
        /// Might overlap a composited animation.
        const ASSUMED_OVERLAP = 1 << 14;
        /// Overlaps composited content painted earlier.
        const OVERLAP = 1 << 15;
        /// Has composited children with negative z-index.
        const NEGATIVE_Z_INDEX_CHILDREN = 1 << 16;
        /// Scrolls independently of the squashing layer it would join.
        const SCROLLS_WITH_RESPECT_TO_SQUASHING_LAYER = 1 << 17;
        /// Squashing would make the shared layer too sparse.
        const SQUASHING_SPARSITY_EXCEEDED = 1 << 18;
        /// Clipping container differs from the squashing layer's.
        const SQUASHING_CLIPPING_CONTAINER_MISMATCH = 1 << 19;
        /// Opacity ancestor differs from the squashing layer's.
        const SQUASHING_OPACITY_ANCESTOR_MISMATCH = 1 << 20;
        /// Transform ancestor differs from the squashing layer's.
        const SQUASHING_TRANSFORM_ANCESTOR_MISMATCH = 1 << 21;
        /// Filters differ from the squashing layer's.
        const SQUASHING_FILTER_MISMATCH = 1 << 22;
        /// Squashing would paint out of order.
        const SQUASHING_WOULD_BREAK_PAINT_ORDER = 1 << 23;
        /// Video may not be squashed.
        const SQUASHING_VIDEO_IS_DISALLOWED = 1 << 24;
        /// Clips composited descendants, so it may not be squashed.
        const SQUASHED_LAYER_CLIPS_COMPOSITING_DESCENDANTS = 1 << 25;
        /// Embedded content may not be squashed.
        const SQUASHING_RENDER_PART_IS_DISALLOWED = 1 << 26;
        /// Reflections may not be squashed.
        const SQUASHING_REFLECTION_IS_DISALLOWED = 1 << 27;

        // Subtree reasons that require knowing what the status of your subtree is.
        /// Transform with composited descendants.
        const TRANSFORM_WITH_COMPOSITED_DESCENDANTS = 1 << 28;
        /// Opacity with composited descendants.
        const OPACITY_WITH_COMPOSITED_DESCENDANTS = 1 << 29;
        /// Mask with composited descendants.
        const MASK_WITH_COMPOSITED_DESCENDANTS = 1 << 30;
        /// Reflection with composited descendants.
        const REFLECTION_WITH_COMPOSITED_DESCENDANTS = 1 << 31;
        /// Filter with composited descendants.
        const FILTER_WITH_COMPOSITED_DESCENDANTS = 1 << 32;
        /// Blending with composited descendants.
        const BLENDING_WITH_COMPOSITED_DESCENDANTS = 1 << 33;
        /// Clips composited descendants.
        const CLIPS_COMPOSITING_DESCENDANTS = 1 << 34;
        /// Perspective with 3-D descendants.
        const PERSPECTIVE_WITH_3D_DESCENDANTS = 1 << 35;
        /// `preserve-3d` with 3-D descendants.
        const PRESERVE_3D_WITH_3D_DESCENDANTS = 1 << 36;
        /// Reflection of a composited parent.
        const REFLECTION_OF_COMPOSITED_PARENT = 1 << 37;
        /// Isolation group with composited descendants.
        const ISOLATE_COMPOSITED_DESCENDANTS = 1 << 38;

        /// The document root.
        const ROOT = 1 << 39;

        // Reasons recorded on auxiliary graphics layers.
        /// Ancestor clipping layer.
        const LAYER_FOR_ANCESTOR_CLIP = 1 << 40;
        /// Descendant clipping layer.
        const LAYER_FOR_DESCENDANT_CLIP = 1 << 41;
        /// Child transform (perspective) layer.
        const LAYER_FOR_PERSPECTIVE = 1 << 42;
        /// Horizontal scrollbar layer.
        const LAYER_FOR_HORIZONTAL_SCROLLBAR = 1 << 43;
        /// Vertical scrollbar layer.
        const LAYER_FOR_VERTICAL_SCROLLBAR = 1 << 44;
        /// Overflow controls host (and its clip).
        const LAYER_FOR_OVERFLOW_CONTROLS_HOST = 1 << 45;
        /// Scroll corner layer.
        const LAYER_FOR_SCROLL_CORNER = 1 << 46;
        /// Scrolling contents layer.
        const LAYER_FOR_SCROLLING_CONTENTS = 1 << 47;
        /// Scrolling container layer.
        const LAYER_FOR_SCROLLING_CONTAINER = 1 << 48;
        /// Squashing layer.
        const LAYER_FOR_SQUASHING_CONTENTS = 1 << 49;
        /// Squashing container layer.
        const LAYER_FOR_SQUASHING_CONTAINER = 1 << 50;
        /// Foreground layer.
        const LAYER_FOR_FOREGROUND = 1 << 51;
        /// Background layer.
        const LAYER_FOR_BACKGROUND = 1 << 52;
        /// Mask layer.
        const LAYER_FOR_MASK = 1 << 53;
        /// Child clipping mask layer.
        const LAYER_FOR_CLIPPING_MASK = 1 << 54;
        /// Scrolling block selection layer.
        const LAYER_FOR_SCROLLING_BLOCK_SELECTION = 1 << 55;

        /// Inline element with a transform.
        const INLINE_TRANSFORM = 1 << 56;

        /// Every reason an element can know about itself without looking at
        /// other elements.
        const COMBO_ALL_DIRECT_REASONS = Self::TRANSFORM_3D.bits()
            | Self::VIDEO.bits()
            | Self::CANVAS.bits()
            | Self::PLUGIN.bits()
            | Self::IFRAME.bits()
            | Self::BACKFACE_VISIBILITY_HIDDEN.bits()
            | Self::ACTIVE_ANIMATION.bits()
            | Self::TRANSITION_PROPERTY.bits()
            | Self::POSITION_FIXED.bits()
            | Self::OVERFLOW_SCROLLING_TOUCH.bits()
            | Self::OVERFLOW_SCROLLING_PARENT.bits()
            | Self::OUT_OF_FLOW_CLIPPING.bits()
            | Self::VIDEO_OVERLAY.bits()
            | Self::WILL_CHANGE_COMPOSITING_HINT.bits();

        /// Reasons implied by composited descendants.
        const COMBO_COMPOSITED_DESCENDANTS = Self::TRANSFORM_WITH_COMPOSITED_DESCENDANTS.bits()
            | Self::ISOLATE_COMPOSITED_DESCENDANTS.bits()
            | Self::OPACITY_WITH_COMPOSITED_DESCENDANTS.bits()
            | Self::MASK_WITH_COMPOSITED_DESCENDANTS.bits()
            | Self::FILTER_WITH_COMPOSITED_DESCENDANTS.bits()
            | Self::BLENDING_WITH_COMPOSITED_DESCENDANTS.bits()
            | Self::REFLECTION_WITH_COMPOSITED_DESCENDANTS.bits()
            | Self::CLIPS_COMPOSITING_DESCENDANTS.bits();

        /// Reasons that may be satisfied by joining a squashing layer instead
        /// of getting an own backing.
        const COMBO_SQUASHABLE_REASONS = Self::OVERLAP.bits()
            | Self::ASSUMED_OVERLAP.bits()
            | Self::OVERFLOW_SCROLLING_PARENT.bits();
    }
}

impl CompositingReasons {
    /// Returns `true` if any reason other than a squashable one is present.
    #[inline]
    #[must_use]
    pub const fn requires_compositing(self) -> bool {
        !self.difference(Self::COMBO_SQUASHABLE_REASONS).is_empty()
    }

    /// Returns `true` if the only reasons present are squashable ones.
    #[inline]
    #[must_use]
    pub const fn requires_squashing(self) -> bool {
        !self.requires_compositing() && self.intersects(Self::COMBO_SQUASHABLE_REASONS)
    }
}
