// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The registry of graphics layer roles a composited element can own.
//!
//! Every composited element owns exactly one [`Primary`](LayerRole::Primary)
//! layer plus any number of auxiliary layers, at most one per role. Roles
//! carry the static facts about each kind of layer: its initial flags, its
//! painting phase, its diagnostic name, and which bulk property updates it
//! participates in (expressed as predicates over roles rather than as mode
//! bits).

use crate::layer::GraphicsLayerId;
use crate::phase::PaintPhase;
use crate::reasons::CompositingReasons;

/// The role a graphics layer plays for its owning element.
///
/// The declaration order is the registry order: iteration, teardown and
/// diagnostics all visit roles in this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerRole {
    /// The element's own content layer. Lives as long as the element is
    /// composited.
    Primary,
    /// Clips the element by an ancestor clip that is not an ancestor in the
    /// graphics layer tree.
    AncestorClip,
    /// Clips composited descendants to the element's overflow clip.
    DescendantClip,
    /// Applies the element's perspective to composited children.
    ChildTransform,
    /// The CSS mask.
    Mask,
    /// Clip path or rounded corners masking composited children.
    ChildClippingMask,
    /// Foreground content separated from the background so that negative
    /// z-order children can sit between them.
    Foreground,
    /// The root element's fixed background.
    Background,
    /// Clips scrolled content to the client box.
    ScrollingContainer,
    /// Scrolled content; moved by the scroll offset.
    ScrollingContents,
    /// Selection painted on top of scrolled content.
    ScrollingBlockSelection,
    /// Shared layer painting squashed elements.
    Squashing,
    /// Groups the primary and squashing layers when there is no ancestor clip
    /// to do it.
    SquashingContainer,
    /// The horizontal scrollbar.
    HorizontalScrollbar,
    /// The vertical scrollbar.
    VerticalScrollbar,
    /// The scroll corner and resizer.
    ScrollCorner,
    /// Hosts the scrollbar and scroll corner layers.
    OverflowControlsHost,
    /// Clips the overflow controls host by the ancestor clip.
    OverflowControlsClip,
}

impl LayerRole {
    /// Number of roles.
    pub const COUNT: usize = 18;

    /// All roles in registry order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Primary,
        Self::AncestorClip,
        Self::DescendantClip,
        Self::ChildTransform,
        Self::Mask,
        Self::ChildClippingMask,
        Self::Foreground,
        Self::Background,
        Self::ScrollingContainer,
        Self::ScrollingContents,
        Self::ScrollingBlockSelection,
        Self::Squashing,
        Self::SquashingContainer,
        Self::HorizontalScrollbar,
        Self::VerticalScrollbar,
        Self::ScrollCorner,
        Self::OverflowControlsHost,
        Self::OverflowControlsClip,
    ];

    /// Position of this role in [`ALL`](Self::ALL).
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human-readable name used in layer tree dumps.
    #[must_use]
    pub const fn debug_name(self) -> &'static str {
        match self {
            Self::Primary => "Primary Layer",
            Self::AncestorClip => "Ancestor Clipping Layer",
            Self::DescendantClip => "Child Containment Layer",
            Self::ChildTransform => "Child Transform Layer",
            Self::Mask => "Mask Layer",
            Self::ChildClippingMask => "Child Clipping Mask Layer",
            Self::Foreground => "Foreground Layer",
            Self::Background => "Background Layer",
            Self::ScrollingContainer => "Scrolling Layer",
            Self::ScrollingContents => "Scrolling Contents Layer",
            Self::ScrollingBlockSelection => "Scrolling Block Selection Layer",
            Self::Squashing => "Squashing Layer",
            Self::SquashingContainer => "Squashing Containment Layer",
            Self::HorizontalScrollbar => "Horizontal Scrollbar Layer",
            Self::VerticalScrollbar => "Vertical Scrollbar Layer",
            Self::ScrollCorner => "Scroll Corner Layer",
            Self::OverflowControlsHost => "Overflow Controls Host Layer",
            Self::OverflowControlsClip => "Overflow Controls Clip Layer",
        }
    }

    /// The reason recorded on an auxiliary layer of this role.
    ///
    /// The primary layer records the element's own reasons instead, so this
    /// is empty for it.
    #[must_use]
    pub const fn layer_reason(self) -> CompositingReasons {
        match self {
            Self::Primary => CompositingReasons::empty(),
            Self::AncestorClip => CompositingReasons::LAYER_FOR_ANCESTOR_CLIP,
            Self::DescendantClip => CompositingReasons::LAYER_FOR_DESCENDANT_CLIP,
            Self::ChildTransform => CompositingReasons::LAYER_FOR_PERSPECTIVE,
            Self::Mask => CompositingReasons::LAYER_FOR_MASK,
            Self::ChildClippingMask => CompositingReasons::LAYER_FOR_CLIPPING_MASK,
            Self::Foreground => CompositingReasons::LAYER_FOR_FOREGROUND,
            Self::Background => CompositingReasons::LAYER_FOR_BACKGROUND,
            Self::ScrollingContainer => CompositingReasons::LAYER_FOR_SCROLLING_CONTAINER,
            Self::ScrollingContents => CompositingReasons::LAYER_FOR_SCROLLING_CONTENTS,
            Self::ScrollingBlockSelection => {
                CompositingReasons::LAYER_FOR_SCROLLING_BLOCK_SELECTION
            }
            Self::Squashing => CompositingReasons::LAYER_FOR_SQUASHING_CONTENTS,
            Self::SquashingContainer => CompositingReasons::LAYER_FOR_SQUASHING_CONTAINER,
            Self::HorizontalScrollbar => CompositingReasons::LAYER_FOR_HORIZONTAL_SCROLLBAR,
            Self::VerticalScrollbar => CompositingReasons::LAYER_FOR_VERTICAL_SCROLLBAR,
            Self::ScrollCorner => CompositingReasons::LAYER_FOR_SCROLL_CORNER,
            Self::OverflowControlsHost | Self::OverflowControlsClip => {
                CompositingReasons::LAYER_FOR_OVERFLOW_CONTROLS_HOST
            }
        }
    }

    /// Flags a freshly created layer of this role starts with.
    #[must_use]
    pub const fn initial_config(self) -> InitialConfig {
        let (draws_content, masks_to_bounds, painting_phase) = match self {
            Self::AncestorClip
            | Self::DescendantClip
            | Self::ScrollingContainer
            | Self::OverflowControlsClip => (false, true, PaintPhase::empty()),
            Self::Mask => (true, false, PaintPhase::MASK),
            Self::ChildClippingMask => (true, false, PaintPhase::CHILD_CLIPPING_MASK),
            Self::Background => (true, false, PaintPhase::BACKGROUND),
            Self::Foreground => (true, false, PaintPhase::FOREGROUND),
            Self::ScrollingContents | Self::ScrollingBlockSelection | Self::Squashing => {
                (true, false, PaintPhase::empty())
            }
            Self::Primary => (false, false, PaintPhase::ALL_CONTENT),
            Self::ChildTransform
            | Self::SquashingContainer
            | Self::HorizontalScrollbar
            | Self::VerticalScrollbar
            | Self::ScrollCorner
            | Self::OverflowControlsHost => (false, false, PaintPhase::empty()),
        };
        InitialConfig {
            draws_content,
            masks_to_bounds,
            painting_phase,
        }
    }

    /// Layers whose content is painted by the owner element's paint routine.
    #[must_use]
    pub const fn paints_owner_content(self) -> bool {
        matches!(
            self,
            Self::Primary
                | Self::Foreground
                | Self::Background
                | Self::Mask
                | Self::ChildClippingMask
                | Self::ScrollingContents
                | Self::ScrollingBlockSelection
        )
    }

    /// Scrollbar and scroll corner layers.
    #[must_use]
    pub const fn is_overflow_control(self) -> bool {
        matches!(
            self,
            Self::HorizontalScrollbar | Self::VerticalScrollbar | Self::ScrollCorner
        )
    }

    /// Layers whose flattening follows the element's `transform-style`.
    #[must_use]
    pub const fn affected_by_preserve_3d(self) -> bool {
        matches!(
            self,
            Self::ChildTransform
                | Self::Primary
                | Self::DescendantClip
                | Self::ScrollingContainer
                | Self::ScrollingBlockSelection
                | Self::ScrollingContents
                | Self::Foreground
        )
    }

    /// Layers that receive content invalidations for the element.
    #[must_use]
    pub const fn is_content_layer(self) -> bool {
        matches!(
            self,
            Self::Primary
                | Self::ScrollingContents
                | Self::Foreground
                | Self::Mask
                | Self::ChildClippingMask
                | Self::Background
        )
    }

    /// Layers that join the element's 3-D rendering context.
    ///
    /// The squashing layer holds content from other elements and stays out.
    #[must_use]
    pub const fn participates_in_rendering_context(self) -> bool {
        self.affected_by_preserve_3d()
            || self.is_content_layer()
            || self.is_overflow_control()
    }
}

/// Initial flags for a freshly created layer. See [`LayerRole::initial_config`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InitialConfig {
    /// Whether the layer paints.
    pub draws_content: bool,
    /// Whether the layer clips its children.
    pub masks_to_bounds: bool,
    /// The phase the layer paints.
    pub painting_phase: PaintPhase,
}

/// A predicate selecting a subset of roles.
pub type RoleFilter = fn(LayerRole) -> bool;

/// The live layers of one composited element, keyed by role.
///
/// Holds at most one layer per role by construction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoleSlots {
    slots: [Option<GraphicsLayerId>; LayerRole::COUNT],
}

impl RoleSlots {
    /// Returns the layer for `role`, if live.
    #[inline]
    #[must_use]
    pub fn get(&self, role: LayerRole) -> Option<GraphicsLayerId> {
        self.slots[role.index()]
    }

    /// Returns `true` if a layer for `role` is live.
    #[inline]
    #[must_use]
    pub fn has(&self, role: LayerRole) -> bool {
        self.slots[role.index()].is_some()
    }

    /// Stores the layer for `role`, returning the previous one.
    pub fn set(&mut self, role: LayerRole, layer: GraphicsLayerId) -> Option<GraphicsLayerId> {
        self.slots[role.index()].replace(layer)
    }

    /// Removes and returns the layer for `role`.
    pub fn take(&mut self, role: LayerRole) -> Option<GraphicsLayerId> {
        self.slots[role.index()].take()
    }

    /// Finds the role a layer is stored under.
    #[must_use]
    pub fn role_of(&self, layer: GraphicsLayerId) -> Option<LayerRole> {
        self.iter().find(|&(_, id)| id == layer).map(|(role, _)| role)
    }

    /// Iterates live layers in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (LayerRole, GraphicsLayerId)> + '_ {
        LayerRole::ALL
            .iter()
            .filter_map(|&role| self.get(role).map(|id| (role, id)))
    }

    /// Iterates live layers whose role satisfies `filter`.
    pub fn filtered(
        &self,
        filter: RoleFilter,
    ) -> impl Iterator<Item = (LayerRole, GraphicsLayerId)> + '_ {
        self.iter().filter(move |&(role, _)| filter(role))
    }

    /// Number of live layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Returns `true` if no layer is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}
