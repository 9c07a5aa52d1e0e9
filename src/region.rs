//! The clipping region.
//!
//! A [`Region`] is either a list of non-overlapping rectangles or a
//! combination tree of paths with a lazily built 1bpp mask. It starts out as
//! rectangles and stays that way while every operand is rectangular; the
//! first combine with a path (or a transform that rotates or shears) moves
//! it to the tree form for good.
//!
//! The infinite region is the rectangle list holding only the sentinel
//! rectangle, or a tree that is a single leaf with only the sentinel figure.
//! The empty region is an empty rectangle list or a tree that is a single
//! empty leaf. Combines with either are short-circuited before any
//! algebra runs.
//!
//! Every mutating operation computes its result before touching `self`, so
//! an error leaves the region exactly as it was.

use std::borrow::Cow;
use std::sync::OnceLock;

use log::debug;

use crate::basics::{clamp_pixel, CombineMode, FillMode, RectF, RegionType};
use crate::error::{RegionError, Result};
use crate::matrix::Matrix;
use crate::path::GraphicsPath;
use crate::path_tree::PathTree;
use crate::rect_set::RectSet;
use crate::region_bitmap::{PixelBox, RegionBitmap};

#[derive(Debug, Clone)]
enum Repr {
    Rects(RectSet),
    Tree {
        tree: PathTree,
        bitmap: OnceLock<RegionBitmap>,
    },
}

/// A 2D point set used for clipping and hit testing.
#[derive(Debug, Clone)]
pub struct Region {
    repr: Repr,
}

impl Region {
    // ====================================================================
    // Construction
    // ====================================================================

    /// The infinite region.
    pub fn new() -> Self {
        Self::infinite()
    }

    /// The whole plane, held as the sentinel rectangle.
    pub fn infinite() -> Self {
        Self::from_rect_set(RectSet::infinite())
    }

    /// A region with no points.
    pub fn empty() -> Self {
        Self::from_rect_set(RectSet::new())
    }

    /// A region covering `rect`; negative extents are normalized first.
    pub fn from_rect(rect: RectF) -> Self {
        Self::from_rect_set(RectSet::from_rect(rect))
    }

    /// A region covering the union of `rects`.
    pub fn from_rects(rects: &[RectF]) -> Result<Self> {
        Ok(Self::from_rect_set(RectSet::from_rects(rects)?))
    }

    /// A region bounded by `path` under its fill mode. The path is copied.
    pub fn from_path(path: &GraphicsPath) -> Self {
        Self::from_tree(PathTree::leaf(path))
    }

    pub(crate) fn from_rect_set(set: RectSet) -> Self {
        Self {
            repr: Repr::Rects(set),
        }
    }

    pub(crate) fn from_tree(tree: PathTree) -> Self {
        Self {
            repr: Repr::Tree {
                tree,
                bitmap: OnceLock::new(),
            },
        }
    }

    /// Make the region the whole plane.
    pub fn set_infinite(&mut self) {
        self.repr = Repr::Rects(RectSet::infinite());
    }

    /// Drop every point from the region.
    pub fn set_empty(&mut self) {
        self.repr = Repr::Rects(RectSet::new());
    }

    // ====================================================================
    // Representation
    // ====================================================================

    /// The current representation, with the sentinel forms reported as
    /// [`RegionType::Infinite`].
    pub fn region_type(&self) -> RegionType {
        if self.is_infinite() {
            return RegionType::Infinite;
        }
        match self.repr {
            Repr::Rects(_) => RegionType::Rect,
            Repr::Tree { .. } => RegionType::Path,
        }
    }

    /// The rectangles, when the region is in rectangle form.
    pub fn rects(&self) -> Option<&[RectF]> {
        match &self.repr {
            Repr::Rects(set) => Some(set.rects()),
            Repr::Tree { .. } => None,
        }
    }

    /// The combination tree, when the region is in path form.
    pub fn path_tree(&self) -> Option<&PathTree> {
        match &self.repr {
            Repr::Rects(_) => None,
            Repr::Tree { tree, .. } => Some(tree),
        }
    }

    /// The mask, if one has been built since the tree last changed.
    pub fn cached_bitmap(&self) -> Option<&RegionBitmap> {
        match &self.repr {
            Repr::Rects(_) => None,
            Repr::Tree { bitmap, .. } => bitmap.get(),
        }
    }

    /// Structural test: only the sentinel forms count.
    pub fn is_infinite(&self) -> bool {
        match &self.repr {
            Repr::Rects(set) => set.is_infinite(),
            Repr::Tree { tree, .. } => tree.is_infinite_leaf(),
        }
    }

    fn is_structurally_empty(&self) -> bool {
        match &self.repr {
            Repr::Rects(set) => set.is_empty(),
            Repr::Tree { tree, .. } => tree.is_empty_leaf(),
        }
    }

    /// Build the mask of a tree region if it is not cached yet.
    pub(crate) fn ensure_bitmap(&self) -> Result<&RegionBitmap> {
        let Repr::Tree { tree, bitmap } = &self.repr else {
            return Err(RegionError::InvalidParameter("region has no path tree"));
        };
        if let Some(b) = bitmap.get() {
            return Ok(b);
        }
        let built = tree.to_bitmap()?;
        Ok(bitmap.get_or_init(|| built))
    }

    /// The mask of any region: cached for trees, built on the spot for
    /// rectangles.
    fn bitmap_view(&self) -> Result<Cow<'_, RegionBitmap>> {
        match &self.repr {
            Repr::Rects(set) if set.is_infinite() => Ok(Cow::Owned(RegionBitmap::unbounded())),
            Repr::Rects(set) => Ok(Cow::Owned(RegionBitmap::from_path(&set.to_path())?)),
            Repr::Tree { .. } => self.ensure_bitmap().map(Cow::Borrowed),
        }
    }

    /// The region as a tree, promoting rectangles into one leaf.
    fn to_tree(&self) -> PathTree {
        match &self.repr {
            Repr::Rects(set) => PathTree::Leaf(set.to_path()),
            Repr::Tree { tree, .. } => tree.clone(),
        }
    }

    fn promote_to_path(&mut self) {
        if let Repr::Rects(set) = &self.repr {
            debug!("promoting {} rectangle region to a path tree", set.len());
            self.repr = Repr::Tree {
                tree: PathTree::Leaf(set.to_path()),
                bitmap: OnceLock::new(),
            };
        }
    }

    fn invalidate_bitmap(&mut self) {
        if let Repr::Tree { bitmap, .. } = &mut self.repr {
            bitmap.take();
        }
    }

    // ====================================================================
    // Combine
    // ====================================================================

    /// Combine a rectangle into the region.
    pub fn combine_rect(&mut self, rect: RectF, mode: CombineMode) -> Result<()> {
        self.combine_region(&Region::from_rect(rect), mode)
    }

    /// Combine the fill of `path` into the region.
    pub fn combine_path(&mut self, path: &GraphicsPath, mode: CombineMode) -> Result<()> {
        self.combine_region(&Region::from_path(path), mode)
    }

    /// Combine `other` into `self`. `self` is the left operand.
    pub fn combine_region(&mut self, other: &Region, mode: CombineMode) -> Result<()> {
        if mode == CombineMode::Replace {
            *self = other.clone();
            return Ok(());
        }
        if self.combine_shortcut(other, mode)? {
            return Ok(());
        }
        if let Some(set) = self.combine_rects(other, mode)? {
            self.repr = Repr::Rects(set);
            return Ok(());
        }

        debug!("combining regions through their masks with {:?}", mode);
        let bitmap = {
            let a = self.bitmap_view()?;
            let b = other.bitmap_view()?;
            RegionBitmap::combine(&a, &b, mode)?
        };
        let left = match std::mem::replace(&mut self.repr, Repr::Rects(RectSet::new())) {
            Repr::Rects(set) => PathTree::Leaf(set.to_path()),
            Repr::Tree { tree, .. } => tree,
        };
        self.repr = Repr::Tree {
            tree: PathTree::combine(left, other.to_tree(), mode),
            bitmap: OnceLock::from(bitmap),
        };
        Ok(())
    }

    /// Exact rectangle algebra, when both sides are rectangle sets and the
    /// result can be stored without rounding.
    fn combine_rects(&self, other: &Region, mode: CombineMode) -> Result<Option<RectSet>> {
        let (Repr::Rects(a), Repr::Rects(b)) = (&self.repr, &other.repr) else {
            return Ok(None);
        };
        debug!("combining rectangle regions ({} and {} rects) with {:?}", a.len(), b.len(), mode);
        let set = a.combine_checked(b, mode)?;
        if set.is_none() {
            debug!("rectangle result not representable, falling back to paths");
        }
        Ok(set)
    }

    /// Handle the empty and infinite operands. Returns `true` if `self`
    /// already holds the result.
    fn combine_shortcut(&mut self, other: &Region, mode: CombineMode) -> Result<bool> {
        use CombineMode::*;

        if other.is_structurally_empty() {
            if matches!(mode, Intersect | Complement) {
                self.set_empty();
            }
            return Ok(true);
        }
        if self.is_structurally_empty() {
            if matches!(mode, Union | Xor | Complement) {
                *self = other.clone();
            }
            return Ok(true);
        }
        if self.is_infinite() {
            match mode {
                Union => return Ok(true),
                Intersect => {
                    *self = other.clone();
                    return Ok(true);
                }
                Complement => {
                    self.set_empty();
                    return Ok(true);
                }
                Exclude => {
                    if other.is_infinite() {
                        self.set_empty();
                        return Ok(true);
                    }
                    if let Some(set) = self.combine_rects(other, mode)? {
                        self.repr = Repr::Rects(set);
                        return Ok(true);
                    }
                    if let Some(path) = other.parity_path() {
                        self.exclude_from_infinite(&path);
                        return Ok(true);
                    }
                    return Ok(false);
                }
                Xor | Replace => return Ok(false),
            }
        }
        if other.is_infinite() {
            match mode {
                Union => {
                    self.set_infinite();
                    return Ok(true);
                }
                Intersect => return Ok(true),
                Exclude => {
                    self.set_empty();
                    return Ok(true);
                }
                _ => return Ok(false),
            }
        }
        Ok(false)
    }

    /// A path whose even-odd fill is exactly this region, if there is a
    /// cheap one.
    fn parity_path(&self) -> Option<Cow<'_, GraphicsPath>> {
        match &self.repr {
            Repr::Rects(set) => Some(Cow::Owned(set.to_path())),
            Repr::Tree {
                tree: PathTree::Leaf(path),
                ..
            } if path.fill_mode() == FillMode::Alternate => Some(Cow::Borrowed(path)),
            Repr::Tree { .. } => None,
        }
    }

    /// Become "the whole plane minus `path`" without rasterizing the plane:
    /// the path plus a reversed sentinel rectangle, filled even-odd.
    fn exclude_from_infinite(&mut self, path: &GraphicsPath) {
        let mut outline = path.clone();
        let mut sentinel = GraphicsPath::from_rect(RectF::infinite(), FillMode::Alternate);
        sentinel.reverse();
        outline.add_path(&sentinel, false);
        debug!(
            "excluding a {} point path from the infinite region",
            path.point_count()
        );
        *self = Region::from_tree(PathTree::Leaf(outline));
    }

    // ====================================================================
    // Queries
    // ====================================================================

    pub fn is_empty(&self) -> Result<bool> {
        match &self.repr {
            Repr::Rects(set) => Ok(set.is_empty()),
            Repr::Tree { tree, .. } => {
                if tree.is_empty_leaf() {
                    return Ok(true);
                }
                if tree.is_infinite_leaf() {
                    return Ok(false);
                }
                Ok(self.ensure_bitmap()?.is_empty())
            }
        }
    }

    /// Bounding rectangle. Path regions report pixel-quantized bounds.
    pub fn bounds(&self) -> Result<RectF> {
        match &self.repr {
            Repr::Rects(set) => Ok(set.bounds()),
            Repr::Tree { tree, .. } => {
                if tree.is_infinite_leaf() {
                    return Ok(RectF::infinite());
                }
                if tree.is_empty_leaf() {
                    return Ok(RectF::default());
                }
                Ok(self.ensure_bitmap()?.content_bounds())
            }
        }
    }

    pub fn is_visible_point(&self, x: f32, y: f32) -> Result<bool> {
        match &self.repr {
            Repr::Rects(set) => Ok(set.contains_point(x, y)),
            Repr::Tree { tree, bitmap } => {
                let px = clamp_pixel(x as f64).floor() as i32;
                let py = clamp_pixel(y as f64).floor() as i32;
                if bitmap.get().is_none() {
                    if let Some(path) = tree.path() {
                        return Ok(RegionBitmap::path_pixel_visible(path, px, py));
                    }
                }
                Ok(self.ensure_bitmap()?.is_point_visible(px, py))
            }
        }
    }

    /// Returns `true` if any part of `rect` is inside the region.
    pub fn is_visible_rect(&self, rect: RectF) -> Result<bool> {
        let rect = rect.normalize();
        if rect.is_empty() {
            return Ok(false);
        }
        match &self.repr {
            Repr::Rects(set) => Ok(set.intersects_rect(&rect)),
            Repr::Tree { .. } => Ok(self.ensure_bitmap()?.is_rect_visible(PixelBox::from_rect(&rect))),
        }
    }

    /// Set-wise equality. Two path-free regions compare geometrically;
    /// otherwise their masks are compared pixel by pixel.
    pub fn equals(&self, other: &Region) -> Result<bool> {
        if let (Repr::Rects(a), Repr::Rects(b)) = (&self.repr, &other.repr) {
            if let Some(eq) = a.geometric_eq(b)? {
                return Ok(eq);
            }
        }
        let a = self.bitmap_view()?;
        let b = other.bitmap_view()?;
        Ok(RegionBitmap::compare(&a, &b))
    }

    // ====================================================================
    // Scans
    // ====================================================================

    fn transformed_copy(&self, matrix: &Matrix) -> Option<Region> {
        if matrix.is_identity() || self.is_infinite() {
            return None;
        }
        let mut copy = self.clone();
        copy.promote_to_path();
        copy.transform(matrix);
        Some(copy)
    }

    /// Rectangles that make up the region after `matrix`.
    pub fn scans(&self, matrix: &Matrix) -> Result<Vec<RectF>> {
        if let Some(copy) = self.transformed_copy(matrix) {
            return copy.scans(&Matrix::identity());
        }
        match &self.repr {
            Repr::Rects(set) => Ok(set.rects().to_vec()),
            Repr::Tree { .. } => Ok(self.ensure_bitmap()?.scan_rects()),
        }
    }

    /// Number of rectangles [`scans`](Region::scans) would return.
    pub fn scan_count(&self, matrix: &Matrix) -> Result<usize> {
        if let Some(copy) = self.transformed_copy(matrix) {
            return copy.scan_count(&Matrix::identity());
        }
        match &self.repr {
            Repr::Rects(set) => Ok(set.len()),
            Repr::Tree { .. } => Ok(self.ensure_bitmap()?.scan_count()),
        }
    }

    // ====================================================================
    // Geometry
    // ====================================================================

    /// Shift the region. A co-finite rectangle region shifts its hole.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        if self.is_infinite() || (dx == 0.0 && dy == 0.0) {
            return;
        }
        if let Repr::Rects(set) = &mut self.repr {
            if !set.is_cofinite() {
                set.translate(dx, dy);
                return;
            }
            if let Some(moved) = set.map_hole(|hole| hole.translate(dx, dy)) {
                *set = moved;
                return;
            }
            self.promote_to_path();
        }
        if let Repr::Tree { tree, .. } = &mut self.repr {
            tree.translate(dx, dy);
        }
        self.invalidate_bitmap();
    }

    /// Apply `matrix` to the region. Rectangle regions stay rectangles
    /// unless the matrix rotates or shears.
    pub fn transform(&mut self, matrix: &Matrix) {
        if self.is_infinite() || matrix.is_identity() {
            return;
        }
        if let Repr::Rects(set) = &mut self.repr {
            if !matrix.has_rotation_or_shear() {
                if !set.is_cofinite() {
                    set.transform_axis_aligned(matrix);
                    return;
                }
                if let Some(moved) = set.map_hole(|hole| hole.transform_axis_aligned(matrix)) {
                    *set = moved;
                    return;
                }
            }
        }
        self.promote_to_path();
        if let Repr::Tree { tree, .. } = &mut self.repr {
            tree.transform(matrix);
        }
        self.invalidate_bitmap();
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
