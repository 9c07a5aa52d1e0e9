//! 2D affine transformation matrix in GDI+ element order.
//!
//! Points are treated as row vectors, so a point maps as
//!
//! ```text
//!   x' = x*m11 + y*m21 + dx
//!   y' = x*m12 + y*m22 + dy
//! ```
//!
//! Elements are stored as `f32` like GDI+ `REAL`; all arithmetic runs in
//! `f64` and is narrowed at the end.

use crate::basics::PointF;
use crate::error::{RegionError, Result};

/// Epsilon used for identity and degeneracy checks.
pub const MATRIX_EPSILON: f64 = 1e-12;

/// Affine matrix with elements `[m11, m12, m21, m22, dx, dy]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub m11: f32,
    pub m12: f32,
    pub m21: f32,
    pub m22: f32,
    pub dx: f32,
    pub dy: f32,
}

impl Matrix {
    // ====================================================================
    // Construction
    // ====================================================================

    /// Identity matrix.
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub fn new(m11: f32, m12: f32, m21: f32, m22: f32, dx: f32, dy: f32) -> Self {
        Self {
            m11,
            m12,
            m21,
            m22,
            dx,
            dy,
        }
    }

    pub fn translation(dx: f32, dy: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, dx, dy)
    }

    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation by `degrees`, clockwise on a y-down surface.
    pub fn rotation(degrees: f32) -> Self {
        let (sa, ca) = (degrees as f64).to_radians().sin_cos();
        Self::new(ca as f32, sa as f32, -sa as f32, ca as f32, 0.0, 0.0)
    }

    pub fn shearing(shx: f32, shy: f32) -> Self {
        Self::new(1.0, shy, shx, 1.0, 0.0, 0.0)
    }

    /// The six elements in GDI+ order.
    pub fn elements(&self) -> [f32; 6] {
        [self.m11, self.m12, self.m21, self.m22, self.dx, self.dy]
    }

    // ====================================================================
    // Operations (mutate self)
    // ====================================================================

    /// Post-multiply: `self = self * m`, so `m` is applied after `self`.
    pub fn multiply(&mut self, m: &Matrix) -> &mut Self {
        let (a11, a12, a21, a22, adx, ady) = self.wide();
        let (b11, b12, b21, b22, bdx, bdy) = m.wide();
        *self = Self::from_wide(
            a11 * b11 + a12 * b21,
            a11 * b12 + a12 * b22,
            a21 * b11 + a22 * b21,
            a21 * b12 + a22 * b22,
            adx * b11 + ady * b21 + bdx,
            adx * b12 + ady * b22 + bdy,
        );
        self
    }

    /// Pre-multiply: `self = m * self`, so `m` is applied before `self`.
    pub fn premultiply(&mut self, m: &Matrix) -> &mut Self {
        let mut t = *m;
        t.multiply(self);
        *self = t;
        self
    }

    pub fn translate(&mut self, dx: f32, dy: f32) -> &mut Self {
        self.multiply(&Matrix::translation(dx, dy))
    }

    pub fn scale(&mut self, sx: f32, sy: f32) -> &mut Self {
        self.multiply(&Matrix::scaling(sx, sy))
    }

    pub fn rotate(&mut self, degrees: f32) -> &mut Self {
        self.multiply(&Matrix::rotation(degrees))
    }

    /// Invert in place. A singular matrix is left untouched.
    pub fn invert(&mut self) -> Result<&mut Self> {
        let det = self.determinant();
        if det.abs() < MATRIX_EPSILON {
            return Err(RegionError::SingularMatrix);
        }
        let d = 1.0 / det;
        let (m11, m12, m21, m22, dx, dy) = self.wide();
        let i11 = m22 * d;
        let i12 = -m12 * d;
        let i21 = -m21 * d;
        let i22 = m11 * d;
        *self = Self::from_wide(
            i11,
            i12,
            i21,
            i22,
            -dx * i11 - dy * i21,
            -dx * i12 - dy * i22,
        );
        Ok(self)
    }

    // ====================================================================
    // Queries
    // ====================================================================

    pub fn determinant(&self) -> f64 {
        self.m11 as f64 * self.m22 as f64 - self.m12 as f64 * self.m21 as f64
    }

    pub fn is_invertible(&self) -> bool {
        self.determinant().abs() >= MATRIX_EPSILON
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Returns `true` if the matrix can turn an axis-aligned rectangle into
    /// something that is not one.
    pub fn has_rotation_or_shear(&self) -> bool {
        self.m12 != 0.0 || self.m21 != 0.0
    }

    // ====================================================================
    // Transformations
    // ====================================================================

    /// Map a point.
    #[inline]
    pub fn transform(&self, x: &mut f64, y: &mut f64) {
        let tmp = *x;
        *x = tmp * self.m11 as f64 + *y * self.m21 as f64 + self.dx as f64;
        *y = tmp * self.m12 as f64 + *y * self.m22 as f64 + self.dy as f64;
    }

    pub fn transform_point(&self, p: PointF) -> PointF {
        let (mut x, mut y) = (p.x as f64, p.y as f64);
        self.transform(&mut x, &mut y);
        PointF::new(x as f32, y as f32)
    }

    pub fn transform_points(&self, points: &mut [PointF]) {
        for p in points {
            *p = self.transform_point(*p);
        }
    }

    fn wide(&self) -> (f64, f64, f64, f64, f64, f64) {
        (
            self.m11 as f64,
            self.m12 as f64,
            self.m21 as f64,
            self.m22 as f64,
            self.dx as f64,
            self.dy as f64,
        )
    }

    fn from_wide(m11: f64, m12: f64, m21: f64, m22: f64, dx: f64, dy: f64) -> Self {
        Self::new(
            m11 as f32, m12 as f32, m21 as f32, m22 as f32, dx as f32, dy as f32,
        )
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Matrix {
    type Output = Matrix;

    /// `a * b` applies `a` first, then `b`.
    fn mul(self, rhs: Matrix) -> Matrix {
        let mut m = self;
        m.multiply(&rhs);
        m
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_identity() {
        let m = Matrix::identity();
        assert!(m.is_identity());
        assert_eq!(m.transform_point(PointF::new(3.0, 4.0)), PointF::new(3.0, 4.0));
        assert!(Matrix::default().is_identity());
    }

    #[test]
    fn test_translation_scaling() {
        let p = Matrix::translation(10.0, -5.0).transform_point(PointF::new(1.0, 2.0));
        assert_eq!(p, PointF::new(11.0, -3.0));
        let p = Matrix::scaling(2.0, 3.0).transform_point(PointF::new(1.0, 2.0));
        assert_eq!(p, PointF::new(2.0, 6.0));
    }

    #[test]
    fn test_rotation_90() {
        let p = Matrix::rotation(90.0).transform_point(PointF::new(1.0, 0.0));
        assert!(approx(p.x, 0.0));
        assert!(approx(p.y, 1.0));
        assert!(Matrix::rotation(90.0).has_rotation_or_shear());
        assert!(!Matrix::scaling(2.0, -1.0).has_rotation_or_shear());
    }

    #[test]
    fn test_multiply_order() {
        // Scale first, then translate.
        let m = Matrix::scaling(2.0, 2.0) * Matrix::translation(10.0, 0.0);
        let p = m.transform_point(PointF::new(1.0, 1.0));
        assert_eq!(p, PointF::new(12.0, 2.0));

        let mut n = Matrix::translation(10.0, 0.0);
        n.premultiply(&Matrix::scaling(2.0, 2.0));
        assert_eq!(n, m);
    }

    #[test]
    fn test_invert() {
        let mut m = Matrix::new(2.0, 1.0, -1.0, 3.0, 5.0, 7.0);
        let orig = m;
        m.invert().unwrap();
        let p = (orig * m).transform_point(PointF::new(4.0, -2.0));
        assert!(approx(p.x, 4.0));
        assert!(approx(p.y, -2.0));
    }

    #[test]
    fn test_invert_singular() {
        let mut m = Matrix::scaling(0.0, 1.0);
        assert!(!m.is_invertible());
        assert_eq!(m.invert().err(), Some(RegionError::SingularMatrix));
        assert_eq!(m, Matrix::scaling(0.0, 1.0));
    }
}
