//! Exact set algebra over lists of non-overlapping float rectangles.
//!
//! Rectangle regions stay in this form for as long as every operand is a
//! rectangle list, so their results carry the input coordinates exactly
//! with no pixel quantization.
//!
//! Union works from a pool holding both operands. It repeatedly takes the
//! rectangle with the lowest top edge (lowest left edge on ties), carves it
//! out of every other pool rectangle it overlaps, and emits it. Carving one
//! rectangle out of another leaves at most four pieces, which go back into
//! the pool. The other operators are built from pairwise intersection and
//! subtraction.

use crate::basics::{CombineMode, FillMode, RectF};
use crate::error::{RegionError, Result};
use crate::matrix::Matrix;
use crate::path::GraphicsPath;

/// An ordered list of pairwise non-overlapping, non-empty rectangles.
#[derive(Debug, Clone, Default)]
pub struct RectSet {
    rects: Vec<RectF>,
}

impl RectSet {
    /// The empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The set covering one rectangle; empty if it has no area.
    pub fn from_rect(rect: RectF) -> Self {
        let rect = rect.normalize();
        if rect.is_empty() {
            Self::new()
        } else {
            Self { rects: vec![rect] }
        }
    }

    /// The union of any rectangles, overlapping or not.
    pub fn from_rects(rects: &[RectF]) -> Result<Self> {
        let pool: Vec<RectF> = rects
            .iter()
            .map(|r| r.normalize())
            .filter(|r| !r.is_empty())
            .collect();
        let mut exact = true;
        Ok(Self {
            rects: union_pool(pool, &mut exact)?,
        })
    }

    /// The single-rectangle set that stands for the whole plane.
    pub fn infinite() -> Self {
        Self {
            rects: vec![RectF::infinite()],
        }
    }

    /// The rectangles; no two overlap.
    pub fn rects(&self) -> &[RectF] {
        &self.rects
    }

    /// Number of rectangles.
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Returns `true` if the set holds no rectangle.
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Returns `true` if the set is exactly the sentinel rectangle.
    pub fn is_infinite(&self) -> bool {
        self.rects.len() == 1 && self.rects[0].is_infinite()
    }

    /// Bounding box of every rectangle, or a zero rectangle.
    pub fn bounds(&self) -> RectF {
        let mut iter = self.rects.iter();
        match iter.next() {
            Some(first) => iter.fold(*first, |acc, r| acc.unite(r)),
            None => RectF::default(),
        }
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        self.rects.iter().any(|r| r.contains_point(x, y))
    }

    /// Returns `true` if `rect` shares a positive area with the set.
    pub fn intersects_rect(&self, rect: &RectF) -> bool {
        let rect = rect.normalize();
        self.rects.iter().any(|r| r.overlaps(&rect))
    }

    /// Shift every rectangle. See [`map_hole`](RectSet::map_hole) for
    /// co-finite sets.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        for r in &mut self.rects {
            r.offset(dx, dy);
        }
    }

    /// Map every rectangle through a matrix without rotation or shear.
    pub fn transform_axis_aligned(&mut self, m: &Matrix) {
        debug_assert!(!m.has_rotation_or_shear());
        for r in &mut self.rects {
            let x = r.x * m.m11 + m.dx;
            let y = r.y * m.m22 + m.dy;
            *r = RectF::new(x, y, r.width * m.m11, r.height * m.m22).normalize();
        }
        self.rects.retain(|r| !r.is_empty());
    }

    /// Combine with another set. `self` is the left operand.
    ///
    /// Returns `None` when a result rectangle cannot be stored within
    /// [`EDGE_TOLERANCE`]: next to the sentinel edges an `f32` width has
    /// too little precision to land on a fractional inner edge.
    pub fn combine_checked(&self, other: &RectSet, op: CombineMode) -> Result<Option<RectSet>> {
        let mut exact = true;
        let rects = match op {
            CombineMode::Replace => other.rects.clone(),
            CombineMode::Union => union(&self.rects, &other.rects, &mut exact)?,
            CombineMode::Intersect => intersect(&self.rects, &other.rects, &mut exact)?,
            CombineMode::Exclude => subtract(&self.rects, &other.rects, &mut exact)?,
            CombineMode::Complement => subtract(&other.rects, &self.rects, &mut exact)?,
            CombineMode::Xor => {
                let both = intersect(&self.rects, &other.rects, &mut exact)?;
                let either = union(&self.rects, &other.rects, &mut exact)?;
                subtract(&either, &both, &mut exact)?
            }
        };
        Ok(exact.then_some(RectSet { rects }))
    }

    /// Like [`combine_checked`](RectSet::combine_checked), with an
    /// unrepresentable result reported as an error.
    pub fn combine(&self, other: &RectSet, op: CombineMode) -> Result<RectSet> {
        self.combine_checked(other, op)?
            .ok_or(RegionError::InvalidParameter("rectangle edges are not representable"))
    }

    /// Returns `Some(true)` if both sets cover the same points, regardless
    /// of how they are split into rectangles. `None` if the difference
    /// cannot be computed exactly.
    pub fn geometric_eq(&self, other: &RectSet) -> Result<Option<bool>> {
        if self.rects == other.rects {
            return Ok(Some(true));
        }
        Ok(self
            .combine_checked(other, CombineMode::Xor)?
            .map(|x| x.is_empty()))
    }

    /// Returns `true` if the set reaches every edge of the sentinel
    /// rectangle without being the sentinel itself, as "infinite minus a
    /// hole" does.
    pub fn is_cofinite(&self) -> bool {
        if self.is_empty() || self.is_infinite() {
            return false;
        }
        let b = self.bounds();
        let inf = RectF::infinite();
        b.x <= inf.x && b.y <= inf.y && b.right() >= inf.right() && b.bottom() >= inf.bottom()
    }

    /// An even-odd path that fills exactly this set.
    ///
    /// Co-finite sets become their hole plus the sentinel figure, so the
    /// rasterizer sees a bounded outline and an outside that is filled.
    pub fn to_path(&self) -> GraphicsPath {
        if let Some(hole) = self.hole() {
            let mut path = hole.plain_path();
            path.add_rectangle(RectF::infinite());
            return path;
        }
        self.plain_path()
    }

    /// The finite part a co-finite set leaves out of the sentinel.
    pub fn hole(&self) -> Option<RectSet> {
        if !self.is_cofinite() {
            return None;
        }
        RectSet::infinite()
            .combine_checked(self, CombineMode::Exclude)
            .ok()
            .flatten()
    }

    /// Apply `f` to the hole of a co-finite set and return the set rebuilt
    /// around the moved hole. `None` if the set is not co-finite or the
    /// rebuilt set cannot be stored exactly.
    pub fn map_hole(&self, f: impl FnOnce(&mut RectSet)) -> Option<RectSet> {
        let mut hole = self.hole()?;
        f(&mut hole);
        RectSet::infinite()
            .combine_checked(&hole, CombineMode::Exclude)
            .ok()
            .flatten()
    }

    fn plain_path(&self) -> GraphicsPath {
        let mut path = GraphicsPath::new(FillMode::Alternate);
        path.add_rectangles(&self.rects);
        path
    }
}

// ============================================================================
// Algebra
// ============================================================================

fn push(out: &mut Vec<RectF>, r: RectF) -> Result<()> {
    out.try_reserve(1).map_err(|_| RegionError::OutOfMemory {
        requested: std::mem::size_of::<RectF>() as u64,
    })?;
    out.push(r);
    Ok(())
}

/// Largest drift of a stored far edge from the edge it stands for.
pub const EDGE_TOLERANCE: f32 = 1.0 / 4096.0;

/// Extent from `start` whose far edge `start + len` stays at or before
/// `end` and within [`EDGE_TOLERANCE`] of it.
fn fit(start: f32, end: f32) -> Option<f32> {
    let mut len = end - start;
    for _ in 0..4 {
        if start + len <= end || len <= 0.0 {
            break;
        }
        len = f32::from_bits(len.to_bits() - 1);
    }
    let far = start + len;
    (len > 0.0 && far <= end && end - far <= EDGE_TOLERANCE).then_some(len)
}

/// The rectangle between four edges, or `None` if its right or bottom
/// edge cannot be stored close enough in `f32`. Next to the sentinel
/// edges a width has a precision of half a unit.
fn from_edges(left: f32, top: f32, right: f32, bottom: f32) -> Option<RectF> {
    Some(RectF::new(left, top, fit(left, right)?, fit(top, bottom)?))
}

/// Push the rectangle between four edges. Unrepresentable edges clear
/// `exact` and the rounded rectangle is kept.
fn push_edges(
    out: &mut Vec<RectF>,
    (left, top, right, bottom): (f32, f32, f32, f32),
    exact: &mut bool,
) -> Result<()> {
    let r = from_edges(left, top, right, bottom).unwrap_or_else(|| {
        *exact = false;
        RectF::new(left, top, right - left, bottom - top)
    });
    push(out, r)
}

/// Edges of the overlap of two rectangles, if it has positive area.
fn overlap_edges(a: &RectF, b: &RectF) -> Option<(f32, f32, f32, f32)> {
    let l = a.x.max(b.x);
    let t = a.y.max(b.y);
    let r = a.right().min(b.right());
    let btm = a.bottom().min(b.bottom());
    (l < r && t < btm).then_some((l, t, r, btm))
}

/// Pieces of `r` left after removing `cut`, appended to `out`. Every inner
/// edge is taken from `cut` itself.
fn carve(r: &RectF, cut: &RectF, out: &mut Vec<RectF>, exact: &mut bool) -> Result<()> {
    let Some((hl, ht, hr, hb)) = overlap_edges(r, cut) else {
        return push(out, *r);
    };
    let (rl, rt, rr, rb) = (r.x, r.y, r.right(), r.bottom());
    if ht > rt {
        push_edges(out, (rl, rt, rr, ht), exact)?;
    }
    if hl > rl {
        push_edges(out, (rl, ht, hl, hb), exact)?;
    }
    if hr < rr {
        push_edges(out, (hr, ht, rr, hb), exact)?;
    }
    if hb < rb {
        push_edges(out, (rl, hb, rr, rb), exact)?;
    }
    Ok(())
}

fn lowest(pool: &[RectF]) -> usize {
    let mut best = 0;
    for (i, r) in pool.iter().enumerate().skip(1) {
        let b = &pool[best];
        if r.y < b.y || (r.y == b.y && r.x < b.x) {
            best = i;
        }
    }
    best
}

fn union(a: &[RectF], b: &[RectF], exact: &mut bool) -> Result<Vec<RectF>> {
    if a.is_empty() {
        return Ok(b.to_vec());
    }
    if b.is_empty() {
        return Ok(a.to_vec());
    }
    let mut pool = Vec::new();
    pool.try_reserve(a.len() + b.len())
        .map_err(|_| RegionError::OutOfMemory {
            requested: ((a.len() + b.len()) * std::mem::size_of::<RectF>()) as u64,
        })?;
    pool.extend_from_slice(a);
    pool.extend_from_slice(b);
    union_pool(pool, exact)
}

fn union_pool(mut pool: Vec<RectF>, exact: &mut bool) -> Result<Vec<RectF>> {
    let mut out: Vec<RectF> = Vec::new();
    let mut pieces = Vec::new();
    while !pool.is_empty() {
        let current = pool.swap_remove(lowest(&pool));
        let mut i = 0;
        while i < pool.len() {
            if pool[i].overlaps(&current) {
                let other = pool.swap_remove(i);
                if !current.contains_rect(&other) {
                    carve(&other, &current, &mut pieces, exact)?;
                }
            } else {
                i += 1;
            }
        }
        pool.append(&mut pieces);
        if !out.iter().any(|o| o.contains_rect(&current)) {
            push(&mut out, current)?;
        }
    }
    coalesce(&mut out);
    Ok(out)
}

fn intersect(a: &[RectF], b: &[RectF], exact: &mut bool) -> Result<Vec<RectF>> {
    let mut out = Vec::new();
    for ra in a {
        for rb in b {
            if let Some(edges) = overlap_edges(ra, rb) {
                push_edges(&mut out, edges, exact)?;
            }
        }
    }
    coalesce(&mut out);
    Ok(out)
}

/// `a` minus `b`.
fn subtract(a: &[RectF], b: &[RectF], exact: &mut bool) -> Result<Vec<RectF>> {
    let mut out = Vec::new();
    let mut pieces = Vec::new();
    let mut next = Vec::new();
    for ra in a {
        pieces.clear();
        push(&mut pieces, *ra)?;
        for rb in b {
            next.clear();
            for p in &pieces {
                if p.overlaps(rb) {
                    carve(p, rb, &mut next, exact)?;
                } else {
                    push(&mut next, *p)?;
                }
            }
            std::mem::swap(&mut pieces, &mut next);
            if pieces.is_empty() {
                break;
            }
        }
        for p in &pieces {
            push(&mut out, *p)?;
        }
    }
    coalesce(&mut out);
    Ok(out)
}

/// Merge neighbours that share a full edge, then sort by top-left corner.
/// A merge whose far edge would not be representable is skipped.
fn coalesce(rects: &mut Vec<RectF>) {
    let mut merged = true;
    while merged {
        merged = false;
        'scan: for i in 0..rects.len() {
            for j in (i + 1)..rects.len() {
                let (a, b) = (rects[i], rects[j]);
                let joined = if a.y == b.y && a.height == b.height {
                    if a.right() == b.x {
                        from_edges(a.x, a.y, b.right(), a.bottom())
                    } else if b.right() == a.x {
                        from_edges(b.x, a.y, a.right(), a.bottom())
                    } else {
                        None
                    }
                } else if a.x == b.x && a.width == b.width {
                    if a.bottom() == b.y {
                        from_edges(a.x, a.y, a.right(), b.bottom())
                    } else if b.bottom() == a.y {
                        from_edges(a.x, b.y, a.right(), a.bottom())
                    } else {
                        None
                    }
                } else {
                    None
                };
                if let Some(r) = joined {
                    rects[i] = r;
                    rects.swap_remove(j);
                    merged = true;
                    break 'scan;
                }
            }
        }
    }
    rects.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
}

// ============================================================================
// Tests
// ============================================================================
