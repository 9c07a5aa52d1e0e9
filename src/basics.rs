//! Foundation types, constants, and rounding helpers.
//!
//! Everything else in the crate depends on these: the float rectangle and
//! point types used at the public surface, the fill and combine modes, and
//! the sentinel rectangle that stands in for "the whole plane".

use crate::error::{RegionError, Result};

// ============================================================================
// Rounding and conversion functions
// ============================================================================

/// Round a double to the nearest integer (round half away from zero).
#[inline]
pub fn iround(v: f64) -> i32 {
    if v < 0.0 {
        (v - 0.5) as i32
    } else {
        (v + 0.5) as i32
    }
}

/// Floor a double to the nearest integer toward negative infinity.
#[inline]
pub fn ifloor(v: f64) -> i32 {
    let i = v as i32;
    i - (i as f64 > v) as i32
}

/// Ceiling of a double as a signed integer.
#[inline]
pub fn iceil(v: f64) -> i32 {
    v.ceil() as i32
}

/// Clamp a pixel coordinate into the range the raster code works in.
///
/// Keeps `x + width` computations in `i32` clear of overflow even for
/// near-degenerate paths with enormous coordinates.
#[inline]
pub fn clamp_pixel(v: f64) -> f64 {
    v.clamp(-(PIXEL_LIMIT as f64), PIXEL_LIMIT as f64)
}

/// Largest pixel coordinate magnitude handled by the raster code.
pub const PIXEL_LIMIT: i32 = 1 << 29;

// ============================================================================
// Infinite sentinel
// ============================================================================

pub const INFINITE_X: f32 = -4_194_304.0;
pub const INFINITE_Y: f32 = -4_194_304.0;
pub const INFINITE_WIDTH: f32 = 8_388_608.0;
pub const INFINITE_HEIGHT: f32 = 8_388_608.0;

// ============================================================================
// Point
// ============================================================================

/// A 2D point in region-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

// ============================================================================
// Rect
// ============================================================================

/// An axis-aligned rectangle given by origin and extent.
///
/// Width and height may be zero (an empty rectangle). Negative extents are
/// accepted from callers but every region entry point runs them through
/// [`RectF::normalize`] first.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from two corners, in any order.
    pub fn from_ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self::new(left, top, right - left, bottom - top).normalize()
    }

    /// The sentinel rectangle that represents the infinite region.
    pub fn infinite() -> Self {
        Self::new(INFINITE_X, INFINITE_Y, INFINITE_WIDTH, INFINITE_HEIGHT)
    }

    /// Returns `true` if this is exactly the infinite sentinel.
    pub fn is_infinite(&self) -> bool {
        *self == Self::infinite()
    }

    /// Flip a negative width/height so the extent is non-negative.
    pub fn normalize(self) -> Self {
        let mut r = self;
        if r.width < 0.0 {
            r.x += r.width;
            r.width = -r.width;
        }
        if r.height < 0.0 {
            r.y += r.height;
            r.height = -r.height;
        }
        r
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Returns `true` if the rectangle covers no area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Half-open point test: the left/top edges are inside, right/bottom are not.
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Returns `true` if `r` lies entirely inside this rectangle.
    pub fn contains_rect(&self, r: &RectF) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }

    /// Returns `true` if the two rectangles share a positive area.
    pub fn overlaps(&self, r: &RectF) -> bool {
        self.x < r.right() && r.x < self.right() && self.y < r.bottom() && r.y < self.bottom()
    }

    /// The overlap of two rectangles, if it has positive area.
    pub fn intersect(&self, r: &RectF) -> Option<RectF> {
        let x1 = self.x.max(r.x);
        let y1 = self.y.max(r.y);
        let x2 = self.right().min(r.right());
        let y2 = self.bottom().min(r.bottom());
        if x1 < x2 && y1 < y2 {
            Some(RectF::new(x1, y1, x2 - x1, y2 - y1))
        } else {
            None
        }
    }

    /// The bounding box of two rectangles.
    pub fn unite(&self, r: &RectF) -> RectF {
        let x1 = self.x.min(r.x);
        let y1 = self.y.min(r.y);
        let x2 = self.right().max(r.right());
        let y2 = self.bottom().max(r.bottom());
        RectF::new(x1, y1, x2 - x1, y2 - y1)
    }

    pub fn offset(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }
}

// ============================================================================
// Fill mode
// ============================================================================

/// Filling rule for path rasterization.
///
/// Discriminants match the GDI+ `FillMode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillMode {
    /// Even-odd rule.
    #[default]
    Alternate = 0,
    /// Non-zero winding rule.
    Winding = 1,
}

impl TryFrom<u32> for FillMode {
    type Error = RegionError;

    fn try_from(v: u32) -> Result<Self> {
        match v {
            0 => Ok(FillMode::Alternate),
            1 => Ok(FillMode::Winding),
            _ => Err(RegionError::InvalidParameter("unknown fill mode")),
        }
    }
}

// ============================================================================
// Combine mode
// ============================================================================

/// Set operator applied when merging a region with another region, path, or
/// rectangle. Discriminants match GDI+ `CombineMode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineMode {
    /// Discard the target and adopt the operand.
    Replace = 0,
    /// Keep what is in both.
    Intersect = 1,
    /// Keep what is in either.
    Union = 2,
    /// Keep what is in exactly one.
    Xor = 3,
    /// Target minus operand.
    Exclude = 4,
    /// Operand minus target.
    Complement = 5,
}

impl TryFrom<u32> for CombineMode {
    type Error = RegionError;

    fn try_from(v: u32) -> Result<Self> {
        match v {
            0 => Ok(CombineMode::Replace),
            1 => Ok(CombineMode::Intersect),
            2 => Ok(CombineMode::Union),
            3 => Ok(CombineMode::Xor),
            4 => Ok(CombineMode::Exclude),
            5 => Ok(CombineMode::Complement),
            _ => Err(RegionError::InvalidParameter("unknown combine mode")),
        }
    }
}

impl CombineMode {
    /// Apply the operator to one bit (or one byte, bitwise).
    #[inline]
    pub fn apply_byte(self, a: u8, b: u8) -> u8 {
        match self {
            CombineMode::Replace => b,
            CombineMode::Intersect => a & b,
            CombineMode::Union => a | b,
            CombineMode::Xor => a ^ b,
            CombineMode::Exclude => a & !b,
            CombineMode::Complement => b & !a,
        }
    }

    /// Apply the operator to two membership flags.
    #[inline]
    pub fn apply_bool(self, a: bool, b: bool) -> bool {
        self.apply_byte(a as u8, b as u8) & 1 != 0
    }
}

// ============================================================================
// Region type
// ============================================================================

/// Which representation is authoritative for a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionType {
    /// Non-overlapping rectangle list (possibly empty).
    Rect,
    /// Combination tree of paths.
    Path,
    /// The whole plane.
    Infinite,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iround() {
        assert_eq!(iround(0.5), 1);
        assert_eq!(iround(0.49), 0);
        assert_eq!(iround(-0.5), -1);
        assert_eq!(iround(-1.5), -2);
    }

    #[test]
    fn test_ifloor_iceil() {
        assert_eq!(ifloor(1.7), 1);
        assert_eq!(ifloor(-1.7), -2);
        assert_eq!(ifloor(-1.0), -1);
        assert_eq!(iceil(1.1), 2);
        assert_eq!(iceil(-1.1), -1);
    }

    #[test]
    fn test_normalize_negative_extent() {
        let r = RectF::new(10.0, 10.0, -5.0, -5.0).normalize();
        assert_eq!(r, RectF::new(5.0, 5.0, 5.0, 5.0));
    }

    #[test]
    fn test_contains_point_half_open() {
        let r = RectF::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains_point(0.0, 0.0));
        assert!(r.contains_point(9.99, 9.99));
        assert!(!r.contains_point(10.0, 5.0));
        assert!(!r.contains_point(5.0, 10.0));
    }

    #[test]
    fn test_overlaps_needs_area() {
        let a = RectF::new(0.0, 0.0, 10.0, 10.0);
        let touching = RectF::new(10.0, 0.0, 10.0, 10.0);
        let crossing = RectF::new(5.0, 5.0, 10.0, 10.0);
        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&crossing));
        assert_eq!(a.intersect(&touching), None);
        assert_eq!(a.intersect(&crossing), Some(RectF::new(5.0, 5.0, 5.0, 5.0)));
    }

    #[test]
    fn test_unite() {
        let a = RectF::new(0.0, 0.0, 10.0, 10.0);
        let b = RectF::new(20.0, 5.0, 10.0, 10.0);
        assert_eq!(a.unite(&b), RectF::new(0.0, 0.0, 30.0, 15.0));
    }

    #[test]
    fn test_infinite_sentinel() {
        assert!(RectF::infinite().is_infinite());
        assert!(!RectF::new(0.0, 0.0, 1.0, 1.0).is_infinite());
    }

    #[test]
    fn test_combine_mode_from_u32() {
        assert_eq!(CombineMode::try_from(2).unwrap(), CombineMode::Union);
        assert_eq!(CombineMode::try_from(5).unwrap(), CombineMode::Complement);
        assert!(matches!(
            CombineMode::try_from(6),
            Err(RegionError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_combine_mode_bitwise() {
        assert_eq!(CombineMode::Union.apply_byte(0b1100, 0b1010), 0b1110);
        assert_eq!(CombineMode::Intersect.apply_byte(0b1100, 0b1010), 0b1000);
        assert_eq!(CombineMode::Xor.apply_byte(0b1100, 0b1010), 0b0110);
        assert_eq!(CombineMode::Exclude.apply_byte(0b1100, 0b1010), 0b0100);
        assert_eq!(CombineMode::Complement.apply_byte(0b1100, 0b1010), 0b0010);
        assert!(CombineMode::Complement.apply_bool(false, true));
        assert!(!CombineMode::Exclude.apply_bool(true, true));
    }

    #[test]
    fn test_fill_mode_from_u32() {
        assert_eq!(FillMode::try_from(1).unwrap(), FillMode::Winding);
        assert!(FillMode::try_from(7).is_err());
    }
}
