// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pending repaint state of a graphics layer.

use alloc::vec::Vec;

use kurbo::Rect;

/// The part of a layer's backing that must be repainted before the next
/// raster.
///
/// Rects are in the layer's own coordinate space.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum NeedsDisplay {
    /// Nothing is pending.
    #[default]
    None,
    /// A list of dirty rectangles.
    Rects(Vec<Rect>),
    /// The whole layer.
    Full,
}

impl NeedsDisplay {
    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Adds a dirty rectangle. Empty rectangles are ignored.
    ///
    /// Rects already covered by a pending rect are dropped, and pending rects
    /// covered by the new one are replaced. Past [`MAX_DIRTY_RECTS`] the list
    /// collapses into its bounding rect.
    pub fn add_rect(&mut self, rect: Rect) {
        if rect.is_zero_area() {
            return;
        }
        match self {
            Self::Full => {}
            Self::None => *self = Self::Rects(alloc::vec![rect]),
            Self::Rects(rects) => {
                if rects.iter().any(|r| contains(*r, rect)) {
                    return;
                }
                rects.retain(|r| !contains(rect, *r));
                rects.push(rect);
                if rects.len() > MAX_DIRTY_RECTS {
                    let bounds = rects.iter().fold(rect, |acc, r| acc.union(*r));
                    rects.clear();
                    rects.push(bounds);
                }
            }
        }
    }

    /// Merges another pending region into this one.
    pub fn merge(&mut self, other: &Self) {
        match other {
            Self::None => {}
            Self::Full => *self = Self::Full,
            Self::Rects(rects) => {
                for rect in rects {
                    self.add_rect(*rect);
                }
            }
        }
    }
}

/// Pending rects a layer keeps before they collapse into one.
pub const MAX_DIRTY_RECTS: usize = 8;

fn contains(outer: Rect, inner: Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && outer.x1 >= inner.x1 && outer.y1 >= inner.y1
}
