//! Non-antialiased scanline polygon rasterizer.
//!
//! Sweeps a set of polygon edges row by row and reports the pixels whose
//! centers lie inside under the even-odd or non-zero winding rule. A pixel
//! `(x, y)` is sampled at `(x + 0.5, y + 0.5)`, so a rectangle with integer
//! corners covers exactly the pixels inside it.
//!
//! Infinite sentinel figures never produce edges. They add a constant to the
//! winding number of every point instead (the base winding), which lets a
//! path describe "everything outside these shapes" without a huge mask.

use crate::basics::FillMode;
use crate::path::{GraphicsPath, FLATNESS_DEFAULT};
use crate::scanline_bin::ScanlineBin;

// ============================================================================
// Edge
// ============================================================================

/// A non-horizontal edge, stored top to bottom.
#[derive(Debug, Clone, Copy)]
struct Edge {
    x_top: f64,
    y_top: f64,
    y_bottom: f64,
    slope: f64,
    /// +1 if the original edge ran downward, -1 if upward.
    dir: i32,
}

impl Edge {
    fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Option<Self> {
        if y0 == y1 || !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return None;
        }
        let (xt, yt, xb, yb, dir) = if y0 < y1 {
            (x0, y0, x1, y1, 1)
        } else {
            (x1, y1, x0, y0, -1)
        };
        Some(Self {
            x_top: xt,
            y_top: yt,
            y_bottom: yb,
            slope: (xb - xt) / (yb - yt),
            dir,
        })
    }

    #[inline]
    fn x_at(&self, y: f64) -> f64 {
        self.x_top + (y - self.y_top) * self.slope
    }

    /// Half-open in y so shared vertices are counted once.
    #[inline]
    fn spans_y(&self, y: f64) -> bool {
        self.y_top <= y && y < self.y_bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Initial,
    MoveTo,
    LineTo,
}

// ============================================================================
// RasterizerScanlineBin
// ============================================================================

/// Binary polygon rasterizer with a sorted edge table and an active list.
pub struct RasterizerScanlineBin {
    edges: Vec<Edge>,
    filling_rule: FillMode,
    base_winding: i32,
    start_x: f64,
    start_y: f64,
    last_x: f64,
    last_y: f64,
    status: Status,
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
    // Sweep state
    sorted: bool,
    clip: (i32, i32, i32, i32),
    cur_y: i32,
    next_edge: usize,
    active: Vec<usize>,
    crossings: Vec<(f64, i32)>,
}

impl RasterizerScanlineBin {
    pub fn new() -> Self {
        Self {
            edges: Vec::new(),
            filling_rule: FillMode::Alternate,
            base_winding: 0,
            start_x: 0.0,
            start_y: 0.0,
            last_x: 0.0,
            last_y: 0.0,
            status: Status::Initial,
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
            sorted: false,
            clip: (0, 0, 0, 0),
            cur_y: 0,
            next_edge: 0,
            active: Vec::new(),
            crossings: Vec::new(),
        }
    }

    pub fn filling_rule(&mut self, rule: FillMode) {
        self.filling_rule = rule;
    }

    /// Winding number every point starts from.
    pub fn base_winding(&self) -> i32 {
        self.base_winding
    }

    /// Returns `true` if a winding number counts as inside under the rule.
    #[inline]
    pub fn inside(&self, winding: i32) -> bool {
        match self.filling_rule {
            FillMode::Alternate => winding & 1 != 0,
            FillMode::Winding => winding != 0,
        }
    }

    /// Returns `true` if points far away from every edge are inside.
    pub fn outside_filled(&self) -> bool {
        self.inside(self.base_winding)
    }

    // --------------------------------------------------------------------
    // Path input
    // --------------------------------------------------------------------

    pub fn move_to_d(&mut self, x: f64, y: f64) {
        if self.status == Status::LineTo {
            self.close_polygon();
        }
        self.start_x = x;
        self.start_y = y;
        self.last_x = x;
        self.last_y = y;
        self.extend_bounds(x, y);
        self.status = Status::MoveTo;
    }

    pub fn line_to_d(&mut self, x: f64, y: f64) {
        if self.status == Status::Initial {
            self.move_to_d(x, y);
            return;
        }
        self.add_edge(self.last_x, self.last_y, x, y);
        self.last_x = x;
        self.last_y = y;
        self.extend_bounds(x, y);
        self.status = Status::LineTo;
    }

    /// Close the current polygon back to its start point.
    pub fn close_polygon(&mut self) {
        if self.status == Status::LineTo {
            self.add_edge(self.last_x, self.last_y, self.start_x, self.start_y);
        }
        self.last_x = self.start_x;
        self.last_y = self.start_y;
        self.status = Status::Initial;
    }

    /// Add every figure of `path`; every figure is treated as closed.
    ///
    /// Sentinel figures contribute to the base winding instead of edges.
    pub fn add_path(&mut self, path: &GraphicsPath) {
        let flat = path.flattened(None, FLATNESS_DEFAULT);
        let points = flat.points();
        for range in flat.figure_ranges() {
            if flat.is_infinite_figure(range.clone()) {
                self.base_winding += figure_winding(&points[range], 0.5, 0.5);
                continue;
            }
            let fig = &points[range];
            self.move_to_d(fig[0].x as f64, fig[0].y as f64);
            for p in &fig[1..] {
                self.line_to_d(p.x as f64, p.y as f64);
            }
            self.close_polygon();
        }
    }

    fn add_edge(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) {
        if let Some(e) = Edge::new(x0, y0, x1, y1) {
            self.edges.push(e);
            self.sorted = false;
        }
    }

    fn extend_bounds(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Bounds of every finite point added so far as `(x1, y1, x2, y2)`.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        if self.min_x <= self.max_x && self.min_y <= self.max_y {
            Some((self.min_x, self.min_y, self.max_x, self.max_y))
        } else {
            None
        }
    }


    // --------------------------------------------------------------------
    // Sweep
    // --------------------------------------------------------------------

    /// Restrict the sweep to the half-open pixel box `[x1, x2) x [y1, y2)`.
    pub fn clip_box(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.clip = (x1, y1, x2, y2);
    }

    /// Prepare for sweeping. Returns `false` if nothing can be covered.
    pub fn rewind_scanlines(&mut self) -> bool {
        let (x1, y1, x2, y2) = self.clip;
        if x1 >= x2 || y1 >= y2 {
            return false;
        }
        if self.edges.is_empty() && !self.outside_filled() {
            return false;
        }
        if !self.sorted {
            self.edges.sort_by(|a, b| a.y_top.total_cmp(&b.y_top));
            self.sorted = true;
        }
        self.cur_y = y1;
        self.next_edge = 0;
        self.active.clear();
        true
    }

    /// Fill `sl` with the next row that has coverage. Returns `false` once
    /// the clip box is exhausted.
    pub fn sweep_scanline(&mut self, sl: &mut ScanlineBin) -> bool {
        let (x1, _, x2, y2) = self.clip;
        while self.cur_y < y2 {
            let y = self.cur_y;
            self.cur_y += 1;
            let yc = y as f64 + 0.5;

            while self.next_edge < self.edges.len() && self.edges[self.next_edge].y_top <= yc {
                self.active.push(self.next_edge);
                self.next_edge += 1;
            }
            let edges = &self.edges;
            self.active.retain(|&i| edges[i].y_bottom > yc);

            self.crossings.clear();
            for &i in &self.active {
                let e = &self.edges[i];
                if e.spans_y(yc) {
                    self.crossings.push((e.x_at(yc), e.dir));
                }
            }
            self.crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

            sl.reset_spans();
            let mut winding = self.base_winding;
            let mut run: Option<f64> = self.inside(winding).then_some(f64::NEG_INFINITY);
            for &(x, dir) in &self.crossings {
                winding += dir;
                match (run, self.inside(winding)) {
                    (Some(start), false) => {
                        add_run(sl, start, x, x1, x2);
                        run = None;
                    }
                    (None, true) => run = Some(x),
                    _ => {}
                }
            }
            if let Some(start) = run {
                add_run(sl, start, f64::INFINITY, x1, x2);
            }

            if sl.num_spans() > 0 {
                sl.finalize(y);
                return true;
            }
        }
        false
    }

    /// Point test at an arbitrary location, using the same crossing rule as
    /// the sweep. Needs no clip box.
    pub fn hit_test(&self, x: f64, y: f64) -> bool {
        let mut winding = self.base_winding;
        for e in &self.edges {
            if e.spans_y(y) && e.x_at(y) <= x {
                winding += e.dir;
            }
        }
        self.inside(winding)
    }
}

impl Default for RasterizerScanlineBin {
    fn default() -> Self {
        Self::new()
    }
}

/// Pixels whose centers fall in `[a, b)`, clipped to `[lo, hi)`.
fn add_run(sl: &mut ScanlineBin, a: f64, b: f64, lo: i32, hi: i32) {
    let px0 = pixel_ceil(a - 0.5, lo, hi);
    let px1 = pixel_ceil(b - 0.5, lo, hi);
    if px1 > px0 {
        sl.add_span(px0, px1 - px0);
    }
}

#[inline]
fn pixel_ceil(v: f64, lo: i32, hi: i32) -> i32 {
    if v <= lo as f64 {
        lo
    } else if v >= hi as f64 {
        hi
    } else {
        v.ceil() as i32
    }
}

/// Winding contribution of one closed polygon at `(px, py)`.
fn figure_winding(points: &[crate::basics::PointF], px: f64, py: f64) -> i32 {
    let n = points.len();
    let mut winding = 0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        if let Some(e) = Edge::new(a.x as f64, a.y as f64, b.x as f64, b.y as f64) {
            if e.spans_y(py) && e.x_at(py) <= px {
                winding += e.dir;
            }
        }
    }
    winding
}

// ============================================================================
// Tests
// ============================================================================
