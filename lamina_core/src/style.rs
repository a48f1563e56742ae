// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style snapshot consumed by the compositor.
//!
//! Only the computed-style properties that influence which graphics layers an
//! element needs, or how those layers are configured, are represented here.
//! Resolution of the cascade happens elsewhere.

use alloc::vec::Vec;

use kurbo::Size;

use crate::transform::{Transform3d, TransformOrigin};

/// Separable and non-separable blend modes for `mix-blend-mode`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Source-over compositing.
    #[default]
    Normal,
    /// Multiply.
    Multiply,
    /// Screen.
    Screen,
    /// Overlay.
    Overlay,
    /// Darken.
    Darken,
    /// Lighten.
    Lighten,
    /// Color dodge.
    ColorDodge,
    /// Color burn.
    ColorBurn,
    /// Hard light.
    HardLight,
    /// Soft light.
    SoftLight,
    /// Difference.
    Difference,
    /// Exclusion.
    Exclusion,
    /// Hue.
    Hue,
    /// Saturation.
    Saturation,
    /// Color.
    Color,
    /// Luminosity.
    Luminosity,
}

/// An 8-bit RGBA color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Opaque white.
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);

    /// Creates a color from its components.
    #[inline]
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Returns `true` if the alpha channel is fully opaque.
    #[inline]
    #[must_use]
    pub const fn is_opaque(self) -> bool {
        self.a == 255
    }
}

/// A single CSS filter function.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterOperation {
    /// `blur(radius)`.
    Blur(f64),
    /// `brightness(amount)`.
    Brightness(f64),
    /// `contrast(amount)`.
    Contrast(f64),
    /// `grayscale(amount)`.
    Grayscale(f64),
    /// `hue-rotate(degrees)`.
    HueRotate(f64),
    /// `invert(amount)`.
    Invert(f64),
    /// `opacity(amount)`.
    Opacity(f64),
    /// `saturate(amount)`.
    Saturate(f64),
    /// `sepia(amount)`.
    Sepia(f64),
}

/// A length that is either absolute or relative to a reference box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Length {
    /// Absolute pixels.
    Px(f64),
    /// Percentage of the reference dimension (`50.0` is half).
    Percent(f64),
}

impl Length {
    /// Resolves against a reference dimension.
    #[inline]
    #[must_use]
    pub fn resolve(self, reference: f64) -> f64 {
        match self {
            Self::Px(v) => v,
            Self::Percent(p) => reference * p / 100.0,
        }
    }
}

/// `transform-origin` / `perspective-origin` before resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleOrigin {
    /// Horizontal component.
    pub x: Length,
    /// Vertical component.
    pub y: Length,
    /// Depth component, always absolute.
    pub z: f64,
}

impl StyleOrigin {
    /// The CSS initial value, `50% 50% 0`.
    pub const CENTER: Self = Self {
        x: Length::Percent(50.0),
        y: Length::Percent(50.0),
        z: 0.0,
    };

    /// Resolves against a border-box size.
    #[must_use]
    pub fn resolve(self, size: Size) -> TransformOrigin {
        TransformOrigin::new(self.x.resolve(size.width), self.y.resolve(size.height), self.z)
    }
}

impl Default for StyleOrigin {
    fn default() -> Self {
        Self::CENTER
    }
}

/// The subset of computed style the compositor reads.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleSnapshot {
    /// `opacity`.
    pub opacity: f32,
    /// Resolved `transform`, in border-box space about the transform origin.
    pub transform: Option<Transform3d>,
    /// Whether the transform is driven by a compositor animation; the layer
    /// transform is then owned by the animation and not overwritten.
    pub transform_animating: bool,
    /// `transform-origin`.
    pub transform_origin: StyleOrigin,
    /// `filter`.
    pub filters: Vec<FilterOperation>,
    /// `mix-blend-mode`.
    pub blend_mode: BlendMode,
    /// Whether `clip-path` is set.
    pub has_clip_path: bool,
    /// Whether any `border-radius` is non-zero.
    pub has_border_radius: bool,
    /// Whether a CSS mask is set.
    pub has_mask: bool,
    /// `backface-visibility: visible`.
    pub backface_visible: bool,
    /// `perspective` distance.
    pub perspective: Option<f64>,
    /// `perspective-origin`.
    pub perspective_origin: StyleOrigin,
    /// `transform-style: preserve-3d`.
    pub preserve_3d: bool,
    /// `background-color`.
    pub background_color: Color,
}

impl StyleSnapshot {
    /// Returns `true` if `transform` is set.
    #[inline]
    #[must_use]
    pub fn has_transform(&self) -> bool {
        self.transform.is_some()
    }

    /// Returns `true` if `perspective` is set to a usable distance.
    #[inline]
    #[must_use]
    pub fn has_perspective(&self) -> bool {
        self.perspective.is_some_and(|d| d > 0.0)
    }
}

impl Default for StyleSnapshot {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            transform: None,
            transform_animating: false,
            transform_origin: StyleOrigin::CENTER,
            filters: Vec::new(),
            blend_mode: BlendMode::Normal,
            has_clip_path: false,
            has_border_radius: false,
            has_mask: false,
            backface_visible: true,
            perspective: None,
            perspective_origin: StyleOrigin::CENTER,
            preserve_3d: false,
            background_color: Color::TRANSPARENT,
        }
    }
}
