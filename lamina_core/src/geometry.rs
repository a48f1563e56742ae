// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel snapping and rectangle helpers shared by geometry and paint.
//!
//! Layout produces fractional coordinates. Graphics layers are positioned on
//! whole device pixels, and the fractional part that snapping discards is
//! carried separately as a *subpixel accumulation* so that descendants and
//! painted content stay aligned without drift.

use kurbo::{Rect, Vec2};

/// A rectangle large enough to stand in for "unclipped".
///
/// Finite so that translating it never produces NaN.
pub const INFINITE_RECT: Rect = Rect::new(
    -((1_u32 << 25) as f64),
    -((1_u32 << 25) as f64),
    (1_u32 << 25) as f64,
    (1_u32 << 25) as f64,
);

/// Returns `true` if `rect` is the [`INFINITE_RECT`] sentinel.
#[inline]
#[must_use]
pub fn is_infinite(rect: Rect) -> bool {
    rect == INFINITE_RECT
}

/// Snaps a rectangle's edges to the nearest whole pixels.
///
/// Edges are rounded independently, so the snapped size depends on the
/// fractional origin. Two adjacent rectangles always snap to adjacent pixels.
#[inline]
#[must_use]
pub fn pixel_snap(rect: Rect) -> Rect {
    rect.round()
}

/// Returns the smallest whole-pixel rectangle containing `rect`.
#[inline]
#[must_use]
pub fn enclosing(rect: Rect) -> Rect {
    rect.expand()
}

/// Splits a fractional offset into its pixel-snapped part and the remainder.
///
/// `snapped + remainder` reproduces `offset` exactly for the magnitudes that
/// layout produces.
#[inline]
#[must_use]
pub fn split_subpixel(offset: Vec2) -> (Vec2, Vec2) {
    let snapped = offset.round();
    (snapped, offset - snapped)
}

/// Unites two rectangles, ignoring either one if it has no area.
#[must_use]
pub fn unite(a: Rect, b: Rect) -> Rect {
    if b.is_zero_area() {
        a
    } else if a.is_zero_area() {
        b
    } else {
        a.union(b)
    }
}
