// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositor configuration.

/// Switches that change which auxiliary layers the mapping passes create.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositingConfig {
    /// Whether elements may share a squashing layer. When off, squashing
    /// roles are never needed and squash assignments are ignored.
    pub layer_squashing_enabled: bool,
    /// Whether overflow scrolling is composited. Gates scroll parents, and
    /// with them the exception that lets an element scrolled by its
    /// containing block skip its ancestor clip layer.
    pub accelerated_overflow_scroll: bool,
    /// Whether `mix-blend-mode` and isolation are pushed to layers.
    pub blend_modes_enabled: bool,
    /// Whether the document is the main frame. The main frame's root needs
    /// no descendant clip layer (the frame clip handles it) and may paint a
    /// fixed root background into its own layer.
    pub is_main_frame: bool,
}

impl CompositingConfig {
    /// Everything enabled, main frame.
    pub const DEFAULT: Self = Self {
        layer_squashing_enabled: true,
        accelerated_overflow_scroll: true,
        blend_modes_enabled: true,
        is_main_frame: true,
    };

    /// Like [`DEFAULT`](Self::DEFAULT) without layer squashing.
    pub const NO_SQUASHING: Self = Self {
        layer_squashing_enabled: false,
        ..Self::DEFAULT
    };

    /// Like [`DEFAULT`](Self::DEFAULT) with overflow scrolling left to the
    /// main thread.
    pub const SOFTWARE_SCROLLING: Self = Self {
        accelerated_overflow_scroll: false,
        ..Self::DEFAULT
    };

    /// A sub-frame configuration.
    #[must_use]
    pub const fn subframe(self) -> Self {
        Self {
            is_main_frame: false,
            ..self
        }
    }
}

impl Default for CompositingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
