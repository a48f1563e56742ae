// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Painting phases assigned to graphics layers, and the flags handed to an
//! element's paint routine.

bitflags::bitflags! {
    /// Which categories of an element's content a graphics layer paints.
    ///
    /// Each content layer of a composited element gets a subset; together the
    /// layers of one element cover every phase exactly once.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct PaintPhase: u8 {
        /// Backgrounds, borders and negative z-order children.
        const BACKGROUND = 1 << 0;
        /// In-flow content and positive z-order children.
        const FOREGROUND = 1 << 1;
        /// The CSS mask.
        const MASK = 1 << 2;
        /// Content inside an overflow scroller, relative to the scroll origin.
        const OVERFLOW_CONTENTS = 1 << 3;
        /// Content that moves with a composited scroller.
        const COMPOSITED_SCROLL = 1 << 4;
        /// Clip path or rounded corners used to mask composited children.
        const CHILD_CLIPPING_MASK = 1 << 5;

        /// Background, foreground and mask.
        const ALL_CONTENT = Self::BACKGROUND.bits()
            | Self::FOREGROUND.bits()
            | Self::MASK.bits();
    }
}

bitflags::bitflags! {
    /// Flags passed to an [`ElementPainter`](crate::paint::ElementPainter).
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct PaintLayerFlags: u16 {
        /// Paint the background phase.
        const COMPOSITING_BACKGROUND_PHASE = 1 << 0;
        /// Paint the foreground phase.
        const COMPOSITING_FOREGROUND_PHASE = 1 << 1;
        /// Paint the mask phase.
        const COMPOSITING_MASK_PHASE = 1 << 2;
        /// Paint the child clipping mask.
        const COMPOSITING_CLIPPING_PHASE = 1 << 3;
        /// Paint overflow contents in scroll space.
        const OVERFLOW_CONTENTS = 1 << 4;
        /// Paint content that scrolls with a composited scroller.
        const COMPOSITING_SCROLLING_PHASE = 1 << 5;
        /// Paint only the root background (fixed root background layer).
        const ROOT_BACKGROUND_ONLY = 1 << 6;
        /// Skip the root background; another layer paints it.
        const SKIP_ROOT_BACKGROUND = 1 << 7;
        /// Second pass that paints overlay scrollbars on top.
        const OVERLAY_SCROLLBARS = 1 << 8;
    }
}

impl PaintLayerFlags {
    /// Maps a layer's painting phase onto paint routine flags.
    #[must_use]
    pub const fn from_phase(phase: PaintPhase) -> Self {
        let mut flags = Self::empty();
        if phase.contains(PaintPhase::BACKGROUND) {
            flags = flags.union(Self::COMPOSITING_BACKGROUND_PHASE);
        }
        if phase.contains(PaintPhase::FOREGROUND) {
            flags = flags.union(Self::COMPOSITING_FOREGROUND_PHASE);
        }
        if phase.contains(PaintPhase::MASK) {
            flags = flags.union(Self::COMPOSITING_MASK_PHASE);
        }
        if phase.contains(PaintPhase::CHILD_CLIPPING_MASK) {
            flags = flags.union(Self::COMPOSITING_CLIPPING_PHASE);
        }
        if phase.contains(PaintPhase::OVERFLOW_CONTENTS) {
            flags = flags.union(Self::OVERFLOW_CONTENTS);
        }
        if phase.contains(PaintPhase::COMPOSITED_SCROLL) {
            flags = flags.union(Self::COMPOSITING_SCROLLING_PHASE);
        }
        flags
    }
}
