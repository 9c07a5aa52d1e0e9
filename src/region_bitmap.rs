//! One-bit-per-pixel region mask.
//!
//! A mask covers a pixel box whose left edge and width are multiples of 8.
//! Bits are packed least significant first, so pixel `x` of a row lives in
//! bit `(x - self.x) % 8` of byte `(x - self.x) / 8`.
//!
//! Every pixel outside the box takes the value of the `outside` flag. That
//! is how unbounded regions (the infinite region, or the infinite region
//! minus some shapes) stay cheap: only the interesting part is stored.
//!
//! Combining two masks applies a [`CombineMode`] byte by byte over the
//! result box. Decomposition turns a mask back into non-overlapping
//! rectangles, merging runs that repeat on consecutive rows.

use log::{trace, warn};

use crate::basics::{clamp_pixel, CombineMode, RectF};
use crate::error::{RegionError, Result};
use crate::path::GraphicsPath;
use crate::rasterizer::RasterizerScanlineBin;
use crate::scanline_bin::ScanlineBin;

// ============================================================================
// Constants
// ============================================================================

/// Largest mask the engine will allocate.
pub const MAX_BITMAP_BYTES: u64 = 8 * 1024 * 1024;

/// A mask is reallocated on shrink only if that frees more than this.
pub const SHRINK_THRESHOLD_BYTES: usize = 4096;

/// Pixel window of the infinite sentinel; scans of unbounded masks are
/// reported inside it.
const WINDOW_X: i32 = -4_194_304;
const WINDOW_Y: i32 = -4_194_304;
const WINDOW_SIZE: i32 = 8_388_608;

#[inline]
fn align_down(v: i32) -> i32 {
    v.div_euclid(8) * 8
}

#[inline]
fn align_up(v: i32) -> i32 {
    align_down(v + 7)
}

// ============================================================================
// PixelBox
// ============================================================================

/// Half-open integer rectangle `[x, x + width) x [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest box covering `[x1, x2] x [y1, y2]`.
    pub fn from_bounds(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let l = clamp_pixel(x1).floor() as i32;
        let t = clamp_pixel(y1).floor() as i32;
        let r = clamp_pixel(x2).ceil() as i32;
        let b = clamp_pixel(y2).ceil() as i32;
        Self::new(l, t, r - l, b - t)
    }

    /// Pixels touched by a float rectangle.
    pub fn from_rect(r: &RectF) -> Self {
        let r = r.normalize();
        Self::from_bounds(r.x as f64, r.y as f64, r.right() as f64, r.bottom() as f64)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    pub fn contains_box(&self, b: &PixelBox) -> bool {
        b.x >= self.x && b.y >= self.y && b.right() <= self.right() && b.bottom() <= self.bottom()
    }

    pub fn overlaps(&self, b: &PixelBox) -> bool {
        !self.is_empty()
            && !b.is_empty()
            && self.x < b.right()
            && b.x < self.right()
            && self.y < b.bottom()
            && b.y < self.bottom()
    }

    pub fn union(&self, b: &PixelBox) -> PixelBox {
        if self.is_empty() {
            return *b;
        }
        if b.is_empty() {
            return *self;
        }
        let x = self.x.min(b.x);
        let y = self.y.min(b.y);
        PixelBox::new(x, y, self.right().max(b.right()) - x, self.bottom().max(b.bottom()) - y)
    }

    pub fn intersect(&self, b: &PixelBox) -> PixelBox {
        let x = self.x.max(b.x);
        let y = self.y.max(b.y);
        let r = self.right().min(b.right());
        let bt = self.bottom().min(b.bottom());
        if x < r && y < bt {
            PixelBox::new(x, y, r - x, bt - y)
        } else {
            PixelBox::default()
        }
    }

    /// Widen horizontally so `x` and `width` are multiples of 8.
    pub fn aligned(&self) -> PixelBox {
        if self.is_empty() {
            return PixelBox::default();
        }
        let x = align_down(self.x);
        PixelBox::new(x, self.y, align_up(self.right()) - x, self.height)
    }

    fn to_rect(self) -> RectF {
        RectF::new(
            self.x as f32,
            self.y as f32,
            self.width as f32,
            self.height as f32,
        )
    }
}

// ============================================================================
// RegionBitmap
// ============================================================================

/// Packed 1bpp mask plus the value of every pixel beyond it.
#[derive(Debug, Clone)]
pub struct RegionBitmap {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    mask: Vec<u8>,
    reduced: bool,
    outside: bool,
}

impl RegionBitmap {
    // --------------------------------------------------------------------
    // Construction
    // --------------------------------------------------------------------

    /// A mask with no pixels set anywhere.
    pub fn empty() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            mask: Vec::new(),
            reduced: true,
            outside: false,
        }
    }

    /// A mask with every pixel set.
    pub fn unbounded() -> Self {
        Self {
            outside: true,
            ..Self::empty()
        }
    }

    /// A zeroed mask covering at least the given box.
    ///
    /// The origin is snapped down to a multiple of 8 and the width rounded
    /// up so the requested box stays covered. A zero-size request yields an
    /// empty mask; a request above [`MAX_BITMAP_BYTES`] fails.
    pub fn allocate(x: i32, y: i32, width: i32, height: i32) -> Result<Self> {
        let b = PixelBox::new(x, y, width, height);
        if b.is_empty() {
            return Ok(Self::empty());
        }
        let b = b.aligned();
        let size = (b.width as u64 / 8) * b.height as u64;
        if size > MAX_BITMAP_BYTES {
            warn!(
                "region mask {}x{} at ({}, {}) needs {} bytes, over the {} byte ceiling",
                b.width, b.height, b.x, b.y, size, MAX_BITMAP_BYTES
            );
            return Err(RegionError::OutOfMemory { requested: size });
        }
        let mut mask = Vec::new();
        mask.try_reserve_exact(size as usize)
            .map_err(|_| RegionError::OutOfMemory { requested: size })?;
        mask.resize(size as usize, 0);
        trace!(
            "allocated {}x{} region mask at ({}, {})",
            b.width,
            b.height,
            b.x,
            b.y
        );
        Ok(Self {
            x: b.x,
            y: b.y,
            width: b.width,
            height: b.height,
            mask,
            reduced: false,
            outside: false,
        })
    }

    fn with_box(b: PixelBox, outside: bool) -> Result<Self> {
        let mut bitmap = Self::allocate(b.x, b.y, b.width, b.height)?;
        bitmap.outside = outside;
        Ok(bitmap)
    }

    /// Rasterize a path at pixel centers under its fill mode.
    ///
    /// Sentinel figures in the path make the mask unbounded instead of
    /// allocating the whole sentinel window.
    pub fn from_path(path: &GraphicsPath) -> Result<Self> {
        let mut ras = RasterizerScanlineBin::new();
        ras.filling_rule(path.fill_mode());
        ras.add_path(path);
        let outside = ras.outside_filled();

        let Some((x1, y1, x2, y2)) = ras.bounds() else {
            return Ok(if outside { Self::unbounded() } else { Self::empty() });
        };
        let b = PixelBox::from_bounds(x1, y1, x2, y2);
        let mut bitmap = Self::with_box(b, outside)?;

        ras.clip_box(bitmap.x, bitmap.y, bitmap.right(), bitmap.bottom());
        let mut sl = ScanlineBin::new();
        if ras.rewind_scanlines() {
            while ras.sweep_scanline(&mut sl) {
                for span in sl.spans() {
                    bitmap.set_span(sl.y(), span.x, span.len);
                }
            }
        }
        Ok(bitmap)
    }

    /// Whether pixel `(px, py)` of `path`'s mask would be set, found without
    /// allocating the mask.
    pub fn path_pixel_visible(path: &GraphicsPath, px: i32, py: i32) -> bool {
        let mut ras = RasterizerScanlineBin::new();
        ras.filling_rule(path.fill_mode());
        ras.add_path(path);
        ras.hit_test(px as f64 + 0.5, py as f64 + 0.5)
    }

    // --------------------------------------------------------------------
    // Accessors
    // --------------------------------------------------------------------

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn extent(&self) -> PixelBox {
        PixelBox::new(self.x, self.y, self.width, self.height)
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        (self.width / 8) as usize
    }

    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    /// Returns `true` once the mask has been shrunk to its content.
    pub fn is_reduced(&self) -> bool {
        self.reduced
    }

    /// Value of every pixel beyond the stored box.
    pub fn outside(&self) -> bool {
        self.outside
    }

    #[inline]
    fn fill_byte(&self) -> u8 {
        if self.outside {
            0xFF
        } else {
            0x00
        }
    }

    /// The byte holding pixels `px..px + 8`; `px` must be 8-aligned.
    #[inline]
    fn byte_at(&self, px: i32, py: i32) -> u8 {
        if self.extent().contains(px, py) {
            let row = (py - self.y) as usize * self.stride();
            self.mask[row + ((px - self.x) / 8) as usize]
        } else {
            self.fill_byte()
        }
    }

    #[inline]
    pub fn get_pixel(&self, px: i32, py: i32) -> bool {
        if self.extent().contains(px, py) {
            let off = (px - self.x) as usize;
            let row = (py - self.y) as usize * self.stride();
            self.mask[row + off / 8] & (1 << (off % 8)) != 0
        } else {
            self.outside
        }
    }

    fn set_span(&mut self, py: i32, px: i32, len: i32) {
        let x0 = px.max(self.x);
        let x1 = (px + len).min(self.right());
        if py < self.y || py >= self.bottom() || x0 >= x1 {
            return;
        }
        let row = (py - self.y) as usize * self.stride();
        for p in (x0 - self.x)..(x1 - self.x) {
            let p = p as usize;
            self.mask[row + p / 8] |= 1 << (p % 8);
        }
    }

    /// Returns `true` if any pixel of row `py` in `[x0, x1)` is set.
    /// The range must lie inside the stored box.
    fn row_any(&self, py: i32, x0: i32, x1: i32) -> bool {
        let row = (py - self.y) as usize * self.stride();
        let mut px = x0;
        while px < x1 {
            let off = (px - self.x) as usize;
            let bit = off % 8;
            let span = (8 - bit).min((x1 - px) as usize);
            let m = ((((1u16 << span) - 1) << bit) & 0xFF) as u8;
            if self.mask[row + off / 8] & m != 0 {
                return true;
            }
            px += span as i32;
        }
        false
    }

    // --------------------------------------------------------------------
    // Queries
    // --------------------------------------------------------------------

    pub fn is_point_visible(&self, px: i32, py: i32) -> bool {
        self.get_pixel(px, py)
    }

    /// Returns `true` if any pixel of `query` is set.
    pub fn is_rect_visible(&self, query: PixelBox) -> bool {
        if query.is_empty() {
            return false;
        }
        let ext = self.extent();
        if self.outside && !ext.contains_box(&query) {
            return true;
        }
        let inter = query.intersect(&ext);
        if inter.is_empty() {
            return false;
        }
        (inter.y..inter.bottom()).any(|py| self.row_any(py, inter.x, inter.right()))
    }

    /// Box of every stored pixel that differs from the outside value.
    fn content_box(&self) -> Option<PixelBox> {
        let fill = self.fill_byte();
        let stride = self.stride();
        let (mut x1, mut y1, mut x2, mut y2) = (i32::MAX, i32::MAX, i32::MIN, i32::MIN);
        for r in 0..self.height as usize {
            let row = &self.mask[r * stride..(r + 1) * stride];
            let mut hit = false;
            for (c, &b) in row.iter().enumerate() {
                let v = b ^ fill;
                if v == 0 {
                    continue;
                }
                hit = true;
                let base = self.x + (c as i32) * 8;
                x1 = x1.min(base + v.trailing_zeros() as i32);
                x2 = x2.max(base + 8 - v.leading_zeros() as i32);
            }
            if hit {
                y1 = y1.min(self.y + r as i32);
                y2 = y2.max(self.y + r as i32 + 1);
            }
        }
        if x1 < x2 && y1 < y2 {
            Some(PixelBox::new(x1, y1, x2 - x1, y2 - y1))
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.outside && self.content_box().is_none()
    }

    /// Tight bounds of the set pixels. Unbounded masks report the infinite
    /// sentinel; an empty mask reports a zero rectangle.
    pub fn content_bounds(&self) -> RectF {
        if self.outside {
            return RectF::infinite();
        }
        self.content_box().map(PixelBox::to_rect).unwrap_or_default()
    }

    // --------------------------------------------------------------------
    // Shrink
    // --------------------------------------------------------------------

    /// Cut the stored box down to the pixels that differ from the outside
    /// value. Without `force` the reallocation only happens when it frees
    /// more than [`SHRINK_THRESHOLD_BYTES`].
    pub fn shrink(&mut self, force: bool) {
        let Some(content) = self.content_box() else {
            if !self.mask.is_empty() {
                trace!("region mask of {} bytes holds nothing, dropping it", self.mask.len());
            }
            *self = if self.outside {
                Self::unbounded()
            } else {
                Self::empty()
            };
            return;
        };

        let target = content.aligned();
        if target == self.extent() {
            self.reduced = true;
            return;
        }
        let new_stride = (target.width / 8) as usize;
        let new_bytes = new_stride * target.height as usize;
        if !force && self.mask.len() - new_bytes <= SHRINK_THRESHOLD_BYTES {
            return;
        }

        let old_stride = self.stride();
        let col = ((target.x - self.x) / 8) as usize;
        let mut mask = vec![0u8; new_bytes];
        for r in 0..target.height as usize {
            let src = (target.y - self.y) as usize * old_stride + r * old_stride + col;
            mask[r * new_stride..(r + 1) * new_stride]
                .copy_from_slice(&self.mask[src..src + new_stride]);
        }
        trace!(
            "shrunk region mask from {} to {} bytes",
            self.mask.len(),
            new_bytes
        );
        self.x = target.x;
        self.y = target.y;
        self.width = target.width;
        self.height = target.height;
        self.mask = mask;
        self.reduced = true;
    }

    // --------------------------------------------------------------------
    // Combine
    // --------------------------------------------------------------------

    /// OR the stored pixels of `src` into `self`. `src` must lie inside.
    fn blit(&mut self, src: &RegionBitmap) {
        let stride = self.stride();
        let src_stride = src.stride();
        let col = ((src.x - self.x) / 8) as usize;
        for r in 0..src.height as usize {
            let dst = (src.y - self.y) as usize * stride + r * stride + col;
            let row = &src.mask[r * src_stride..(r + 1) * src_stride];
            for (d, &s) in self.mask[dst..dst + src_stride].iter_mut().zip(row) {
                *d |= s;
            }
        }
    }

    /// Combine two masks into a new one.
    pub fn combine(a: &RegionBitmap, b: &RegionBitmap, op: CombineMode) -> Result<RegionBitmap> {
        if op == CombineMode::Replace {
            return Ok(b.clone());
        }
        let ea = a.extent();
        let eb = b.extent();
        let outside = op.apply_bool(a.outside, b.outside);

        let ext = if !a.outside && !b.outside {
            if !ea.overlaps(&eb) {
                return Self::combine_disjoint(a, b, op);
            }
            match op {
                CombineMode::Union | CombineMode::Xor => ea.union(&eb),
                CombineMode::Intersect => ea.intersect(&eb),
                CombineMode::Exclude => ea,
                CombineMode::Complement | CombineMode::Replace => eb,
            }
        } else {
            ea.union(&eb)
        };

        let mut out = Self::with_box(ext, outside)?;
        let stride = out.stride();
        for r in 0..out.height {
            let py = out.y + r;
            for c in 0..stride {
                let px = out.x + (c as i32) * 8;
                out.mask[r as usize * stride + c] = op.apply_byte(a.byte_at(px, py), b.byte_at(px, py));
            }
        }
        out.shrink(false);
        Ok(out)
    }

    /// Neither mask is unbounded and their boxes do not meet.
    fn combine_disjoint(a: &RegionBitmap, b: &RegionBitmap, op: CombineMode) -> Result<RegionBitmap> {
        match op {
            CombineMode::Intersect => Ok(Self::empty()),
            CombineMode::Exclude => Ok(a.clone()),
            CombineMode::Complement | CombineMode::Replace => Ok(b.clone()),
            CombineMode::Union | CombineMode::Xor => {
                if a.extent().is_empty() {
                    return Ok(b.clone());
                }
                if b.extent().is_empty() {
                    return Ok(a.clone());
                }
                let mut out = Self::with_box(a.extent().union(&b.extent()), false)?;
                out.blit(a);
                out.blit(b);
                out.reduced = a.reduced && b.reduced;
                Ok(out)
            }
        }
    }

    /// Pixel equality, including the outside value.
    pub fn compare(a: &RegionBitmap, b: &RegionBitmap) -> bool {
        if a.outside != b.outside {
            return false;
        }
        let ext = a.extent().union(&b.extent());
        for py in ext.y..ext.bottom() {
            let mut px = ext.x;
            while px < ext.right() {
                if a.byte_at(px, py) != b.byte_at(px, py) {
                    return false;
                }
                px += 8;
            }
        }
        true
    }

    // --------------------------------------------------------------------
    // Decomposition
    // --------------------------------------------------------------------

    /// Runs of set pixels in row `py` of the stored box. Unbounded masks
    /// extend edge runs to `(wx0, wx1)`.
    fn row_spans(&self, py: i32, wx0: i32, wx1: i32, spans: &mut Vec<(i32, i32)>) {
        spans.clear();
        let stride = self.stride();
        let row = &self.mask[(py - self.y) as usize * stride..(py - self.y + 1) as usize * stride];
        let mut run: Option<i32> = self.outside.then_some(wx0);
        let close = |run: &mut Option<i32>, end: i32, spans: &mut Vec<(i32, i32)>| {
            if let Some(s) = run.take() {
                if end > s {
                    spans.push((s, end - s));
                }
            }
        };
        for (c, &b) in row.iter().enumerate() {
            let base = self.x + (c as i32) * 8;
            match b {
                0xFF => {
                    if run.is_none() {
                        run = Some(base);
                    }
                }
                0x00 => close(&mut run, base, spans),
                _ => {
                    for bit in 0..8 {
                        let px = base + bit;
                        if b & (1 << bit) != 0 {
                            if run.is_none() {
                                run = Some(px);
                            }
                        } else {
                            close(&mut run, px, spans);
                        }
                    }
                }
            }
        }
        if self.outside {
            // Pixels right of the stored extent are set too.
            run.get_or_insert(self.right());
            close(&mut run, wx1, spans);
        } else {
            close(&mut run, self.right(), spans);
        }
    }

    /// Decompose into non-overlapping rectangles and return how many there
    /// are. Rectangles are appended to `out` when it is given.
    ///
    /// Each row is split into runs of set pixels, and a run that repeats
    /// the run directly above it extends that rectangle downward.
    pub fn decompose(&self, out: Option<&mut Vec<RectF>>) -> usize {
        let mut builder = ScanBuilder::new(out);
        let mut spans = Vec::new();

        if !self.outside {
            for py in self.y..self.bottom() {
                self.row_spans(py, 0, 0, &mut spans);
                builder.push_band(py, 1, &spans);
            }
            return builder.finish();
        }

        let wx0 = WINDOW_X.min(self.x);
        let wx1 = (WINDOW_X + WINDOW_SIZE).max(self.right());
        let wy0 = WINDOW_Y.min(self.y);
        let wy1 = (WINDOW_Y + WINDOW_SIZE).max(self.bottom());
        let full = [(wx0, wx1 - wx0)];
        if self.height == 0 {
            builder.push_band(wy0, wy1 - wy0, &full);
            return builder.finish();
        }
        if self.y > wy0 {
            builder.push_band(wy0, self.y - wy0, &full);
        }
        for py in self.y..self.bottom() {
            self.row_spans(py, wx0, wx1, &mut spans);
            builder.push_band(py, 1, &spans);
        }
        if self.bottom() < wy1 {
            builder.push_band(self.bottom(), wy1 - self.bottom(), &full);
        }
        builder.finish()
    }

    pub fn scan_count(&self) -> usize {
        self.decompose(None)
    }

    pub fn scan_rects(&self) -> Vec<RectF> {
        let mut rects = Vec::new();
        self.decompose(Some(&mut rects));
        rects
    }
}

// ============================================================================
// ScanBuilder
// ============================================================================

/// Grows rectangles band by band for [`RegionBitmap::decompose`].
struct ScanBuilder<'a> {
    open: Vec<PixelBox>,
    out: Option<&'a mut Vec<RectF>>,
    count: usize,
}

impl<'a> ScanBuilder<'a> {
    fn new(out: Option<&'a mut Vec<RectF>>) -> Self {
        Self {
            open: Vec::new(),
            out,
            count: 0,
        }
    }

    fn emit(&mut self, b: PixelBox) {
        self.count += 1;
        if let Some(out) = self.out.as_deref_mut() {
            out.push(b.to_rect());
        }
    }

    /// Add a band of `h` rows starting at `y`; `spans` are `(x, width)`
    /// pairs sorted by `x`.
    fn push_band(&mut self, y: i32, h: i32, spans: &[(i32, i32)]) {
        let prev = std::mem::take(&mut self.open);
        let mut next = Vec::with_capacity(spans.len());
        let mut i = 0;
        for &(x, w) in spans {
            while i < prev.len() && prev[i].x < x {
                self.emit(prev[i]);
                i += 1;
            }
            if i < prev.len() && prev[i].x == x && prev[i].width == w && prev[i].bottom() == y {
                let mut b = prev[i];
                b.height += h;
                next.push(b);
                i += 1;
            } else {
                next.push(PixelBox::new(x, y, w, h));
            }
        }
        for &b in &prev[i..] {
            self.emit(b);
        }
        self.open = next;
    }

    fn finish(mut self) -> usize {
        for b in std::mem::take(&mut self.open) {
            self.emit(b);
        }
        self.count
    }
}

// ============================================================================
// Tests
// ============================================================================
