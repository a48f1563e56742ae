// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal column-major 4×4 transform and transform origin.
//!
//! Graphics layers carry a local transform applied about a transform origin
//! expressed in the layer's own coordinate space, plus an optional children
//! transform (perspective) applied to everything attached below them.

use core::ops::Mul;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Point;

/// A column-major 4×4 affine transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a transform from a column-major 2-D array.
    #[inline]
    #[must_use]
    pub const fn from_cols_array_2d(cols: [[f64; 4]; 4]) -> Self {
        Self { cols }
    }

    /// Returns column `i` (0-based).
    ///
    /// # Panics
    ///
    /// Panics if `i >= 4`.
    #[inline]
    #[must_use]
    pub const fn col(self, i: usize) -> [f64; 4] {
        self.cols[i]
    }

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    /// Creates a non-uniform scale transform.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            cols: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, sz, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the Z axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_z(radians: f64) -> Self {
        #[cfg(feature = "std")]
        let (s, c) = radians.sin_cos();
        #[cfg(not(feature = "std"))]
        let (s, c) = (radians.sin(), radians.cos());
        Self {
            cols: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a CSS `perspective(d)` matrix.
    ///
    /// A non-positive distance yields the identity, matching how a missing
    /// perspective is treated.
    #[inline]
    #[must_use]
    pub const fn from_perspective(distance: f64) -> Self {
        if distance <= 0.0 {
            return Self::IDENTITY;
        }
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, -1.0 / distance],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Returns this transform applied about `origin` instead of the layer
    /// origin, i.e. `T(origin) * self * T(-origin)`.
    #[must_use]
    pub fn about_origin(self, origin: TransformOrigin) -> Self {
        Self::from_translation(origin.x, origin.y, origin.z)
            * self
            * Self::from_translation(-origin.x, -origin.y, -origin.z)
    }

    /// Maps a 2-D point through the transform (with perspective divide).
    #[must_use]
    pub fn transform_point(self, p: Point) -> Point {
        let c = &self.cols;
        let x = c[0][0] * p.x + c[1][0] * p.y + c[3][0];
        let y = c[0][1] * p.x + c[1][1] * p.y + c[3][1];
        let w = c[0][3] * p.x + c[1][3] * p.y + c[3][3];
        if w == 0.0 || w == 1.0 {
            Point::new(x, y)
        } else {
            Point::new(x / w, y / w)
        }
    }

    /// Returns `true` if this is exactly the identity.
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Is this transform [finite]?
    ///
    /// [finite]: f64::is_finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform3d {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        let mut j = 0;
        while j < 4 {
            let mut i = 0;
            while i < 4 {
                out[j][i] =
                    a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
                i += 1;
            }
            j += 1;
        }
        Self { cols: out }
    }
}

/// A resolved transform origin in a layer's own coordinate space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransformOrigin {
    /// Horizontal origin in pixels.
    pub x: f64,
    /// Vertical origin in pixels.
    pub y: f64,
    /// Depth origin.
    pub z: f64,
}

impl TransformOrigin {
    /// Creates an origin from its three components.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        assert_eq!(Transform3d::default(), Transform3d::IDENTITY);
        assert!(Transform3d::IDENTITY.is_identity());
    }

    #[test]
    fn translation_composition() {
        let a = Transform3d::from_translation(1.0, 0.0, 0.0);
        let b = Transform3d::from_translation(0.0, 2.0, 0.0);
        assert_eq!((a * b).col(3), [1.0, 2.0, 0.0, 1.0]);
    }

    #[test]
    fn scale_about_center_keeps_center_fixed() {
        let s = Transform3d::from_scale(2.0, 2.0, 1.0);
        let about = s.about_origin(TransformOrigin::new(50.0, 25.0, 0.0));
        assert_eq!(about.transform_point(Point::new(50.0, 25.0)), Point::new(50.0, 25.0));
        assert_eq!(about.transform_point(Point::new(0.0, 0.0)), Point::new(-50.0, -25.0));
    }

    #[test]
    fn rotation_about_origin_moves_corner() {
        let r = Transform3d::from_rotation_z(core::f64::consts::FRAC_PI_2)
            .about_origin(TransformOrigin::new(10.0, 10.0, 0.0));
        let p = r.transform_point(Point::new(20.0, 10.0));
        let eps = 1e-9;
        assert!((p.x - 10.0).abs() < eps, "x was {}", p.x);
        assert!((p.y - 20.0).abs() < eps, "y was {}", p.y);
    }

    #[test]
    fn non_positive_perspective_is_identity() {
        assert!(Transform3d::from_perspective(0.0).is_identity());
        assert!(!Transform3d::from_perspective(500.0).is_identity());
    }

    #[test]
    fn infinity_detected() {
        let mut t = Transform3d::IDENTITY;
        t.cols[0][3] = f64::INFINITY;
        assert!(!t.is_finite());
    }
}
