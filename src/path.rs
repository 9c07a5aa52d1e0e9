//! Graphics path: point list, per-point type bytes, and a fill mode.
//!
//! Point types follow the GDI+ byte layout. The low three bits hold the
//! kind (start, line, bezier) and the high bits carry flags: `0x20` marks a
//! subpath marker and `0x80` closes the current figure.
//!
//! A path is a sequence of figures. Each figure begins at a start point;
//! bezier points always come in triples (two control points and an end
//! point).

use std::ops::Range;

use crate::basics::{FillMode, PointF, RectF, INFINITE_HEIGHT, INFINITE_WIDTH, INFINITE_X, INFINITE_Y};
use crate::curves::Curve4Div;
use crate::error::{RegionError, Result};
use crate::matrix::Matrix;

// ============================================================================
// Point types
// ============================================================================

pub const PATH_POINT_TYPE_START: u8 = 0x00;
pub const PATH_POINT_TYPE_LINE: u8 = 0x01;
pub const PATH_POINT_TYPE_BEZIER: u8 = 0x03;
pub const PATH_POINT_TYPE_MASK: u8 = 0x07;
pub const PATH_POINT_TYPE_DASH_MODE: u8 = 0x10;
pub const PATH_POINT_TYPE_MARKER: u8 = 0x20;
pub const PATH_POINT_TYPE_CLOSE: u8 = 0x80;

/// Default flatness used when converting beziers to lines.
pub const FLATNESS_DEFAULT: f32 = 0.25;

/// Bezier control distance for a quarter ellipse arc.
const ARC_KAPPA: f32 = 0.552_284_8;

#[inline]
pub fn point_kind(t: u8) -> u8 {
    t & PATH_POINT_TYPE_MASK
}

#[inline]
pub fn is_start(t: u8) -> bool {
    point_kind(t) == PATH_POINT_TYPE_START
}

#[inline]
pub fn is_bezier(t: u8) -> bool {
    point_kind(t) == PATH_POINT_TYPE_BEZIER
}

#[inline]
pub fn is_close(t: u8) -> bool {
    t & PATH_POINT_TYPE_CLOSE != 0
}

// ============================================================================
// GraphicsPath
// ============================================================================

/// An ordered list of figures made of lines and cubic beziers.
#[derive(Debug, Clone)]
pub struct GraphicsPath {
    points: Vec<PointF>,
    types: Vec<u8>,
    fill_mode: FillMode,
    start_new_figure: bool,
}

impl GraphicsPath {
    pub fn new(fill_mode: FillMode) -> Self {
        Self {
            points: Vec::new(),
            types: Vec::new(),
            fill_mode,
            start_new_figure: true,
        }
    }

    /// Build a path from raw point and type arrays.
    ///
    /// The arrays must be the same length, the first type must be a start
    /// point, every kind must be start/line/bezier, and bezier runs must come
    /// in whole triples.
    pub fn from_raw(points: Vec<PointF>, types: Vec<u8>, fill_mode: FillMode) -> Result<Self> {
        if points.len() != types.len() {
            return Err(RegionError::InvalidParameter("point and type counts differ"));
        }
        if let Some(&first) = types.first() {
            if !is_start(first) {
                return Err(RegionError::InvalidParameter("path must begin with a start point"));
            }
        }
        let mut bezier_run = 0usize;
        for &t in &types {
            match point_kind(t) {
                PATH_POINT_TYPE_BEZIER => bezier_run += 1,
                PATH_POINT_TYPE_START | PATH_POINT_TYPE_LINE => {
                    if bezier_run % 3 != 0 {
                        return Err(RegionError::InvalidParameter("incomplete bezier segment"));
                    }
                    bezier_run = 0;
                }
                _ => return Err(RegionError::InvalidParameter("unknown point type")),
            }
        }
        if bezier_run % 3 != 0 {
            return Err(RegionError::InvalidParameter("incomplete bezier segment"));
        }
        Ok(Self {
            points,
            types,
            fill_mode,
            start_new_figure: true,
        })
    }

    /// A single closed rectangle figure.
    pub fn from_rect(rect: RectF, fill_mode: FillMode) -> Self {
        let mut path = Self::new(fill_mode);
        path.add_rectangle(rect);
        path
    }

    // --------------------------------------------------------------------
    // Accessors
    // --------------------------------------------------------------------

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PointF] {
        &self.points
    }

    pub fn types(&self) -> &[u8] {
        &self.types
    }

    pub fn fill_mode(&self) -> FillMode {
        self.fill_mode
    }

    pub fn set_fill_mode(&mut self, fill_mode: FillMode) {
        self.fill_mode = fill_mode;
    }

    /// Index ranges of every figure, in order.
    pub fn figure_ranges(&self) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut start = 0;
        for i in 1..self.types.len() {
            if is_start(self.types[i]) {
                ranges.push(start..i);
                start = i;
            }
        }
        if !self.types.is_empty() {
            ranges.push(start..self.types.len());
        }
        ranges
    }

    pub fn figure_count(&self) -> usize {
        self.figure_ranges().len()
    }

    // --------------------------------------------------------------------
    // Building
    // --------------------------------------------------------------------

    /// The next point added begins a new figure.
    pub fn start_figure(&mut self) {
        self.start_new_figure = true;
    }

    /// Close the current figure and begin a new one.
    pub fn close_figure(&mut self) {
        if let Some(last) = self.types.last_mut() {
            *last |= PATH_POINT_TYPE_CLOSE;
        }
        self.start_new_figure = true;
    }

    /// Close every open figure.
    pub fn close_all_figures(&mut self) {
        for range in self.figure_ranges() {
            self.types[range.end - 1] |= PATH_POINT_TYPE_CLOSE;
        }
        self.start_new_figure = true;
    }

    /// Flag the last point as a subpath marker.
    pub fn set_marker(&mut self) {
        if let Some(last) = self.types.last_mut() {
            *last |= PATH_POINT_TYPE_MARKER;
        }
    }

    fn append(&mut self, p: PointF, kind: u8) {
        let kind = if self.start_new_figure || self.points.is_empty() {
            self.start_new_figure = false;
            PATH_POINT_TYPE_START
        } else {
            kind
        };
        self.points.push(p);
        self.types.push(kind);
    }

    /// Append a point joined to the previous one unless a figure is pending.
    fn append_line_to(&mut self, p: PointF) {
        if !self.start_new_figure && self.points.last() == Some(&p) {
            return;
        }
        self.append(p, PATH_POINT_TYPE_LINE);
    }

    pub fn add_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.append_line_to(PointF::new(x1, y1));
        self.append(PointF::new(x2, y2), PATH_POINT_TYPE_LINE);
    }

    /// Connected line segments through `points`.
    pub fn add_lines(&mut self, points: &[PointF]) -> Result<()> {
        if points.is_empty() {
            return Err(RegionError::InvalidParameter("no points"));
        }
        self.append_line_to(points[0]);
        for &p in &points[1..] {
            self.append(p, PATH_POINT_TYPE_LINE);
        }
        Ok(())
    }

    /// A closed polygon figure. Needs at least three points.
    pub fn add_polygon(&mut self, points: &[PointF]) -> Result<()> {
        if points.len() < 3 {
            return Err(RegionError::InvalidParameter("polygon needs three points"));
        }
        self.start_new_figure = true;
        for &p in points {
            self.append(p, PATH_POINT_TYPE_LINE);
        }
        self.close_figure();
        Ok(())
    }

    /// A closed rectangle figure, clockwise from the top-left corner.
    /// Rectangles with zero width or height are skipped.
    pub fn add_rectangle(&mut self, rect: RectF) {
        if rect.width == 0.0 || rect.height == 0.0 {
            return;
        }
        self.start_new_figure = true;
        self.append(PointF::new(rect.x, rect.y), PATH_POINT_TYPE_LINE);
        self.append(PointF::new(rect.right(), rect.y), PATH_POINT_TYPE_LINE);
        self.append(PointF::new(rect.right(), rect.bottom()), PATH_POINT_TYPE_LINE);
        self.append(PointF::new(rect.x, rect.bottom()), PATH_POINT_TYPE_LINE);
        self.close_figure();
    }

    pub fn add_rectangles(&mut self, rects: &[RectF]) {
        for &r in rects {
            self.add_rectangle(r);
        }
    }

    /// One cubic bezier segment, joined to the current figure.
    pub fn add_bezier(&mut self, p1: PointF, p2: PointF, p3: PointF, p4: PointF) {
        self.append_line_to(p1);
        self.append(p2, PATH_POINT_TYPE_BEZIER);
        self.append(p3, PATH_POINT_TYPE_BEZIER);
        self.append(p4, PATH_POINT_TYPE_BEZIER);
    }

    /// A closed ellipse inscribed in `rect`, as four bezier arcs.
    pub fn add_ellipse(&mut self, rect: RectF) {
        let rx = rect.width / 2.0;
        let ry = rect.height / 2.0;
        let cx = rect.x + rx;
        let cy = rect.y + ry;
        let kx = rx * ARC_KAPPA;
        let ky = ry * ARC_KAPPA;

        self.start_new_figure = true;
        self.append(PointF::new(cx + rx, cy), PATH_POINT_TYPE_LINE);
        let arcs = [
            [(cx + rx, cy + ky), (cx + kx, cy + ry), (cx, cy + ry)],
            [(cx - kx, cy + ry), (cx - rx, cy + ky), (cx - rx, cy)],
            [(cx - rx, cy - ky), (cx - kx, cy - ry), (cx, cy - ry)],
            [(cx + kx, cy - ry), (cx + rx, cy - ky), (cx + rx, cy)],
        ];
        for arc in arcs {
            for (x, y) in arc {
                self.append(PointF::new(x, y), PATH_POINT_TYPE_BEZIER);
            }
        }
        self.close_figure();
    }

    /// Append every figure of `other`. With `connect`, the first figure of
    /// `other` continues the current open figure.
    pub fn add_path(&mut self, other: &GraphicsPath, connect: bool) {
        if other.is_empty() {
            return;
        }
        let joined = connect && !self.start_new_figure && !self.points.is_empty();
        let first = self.points.len();
        self.points.extend_from_slice(&other.points);
        self.types.extend_from_slice(&other.types);
        if joined {
            self.types[first] = PATH_POINT_TYPE_LINE | (other.types[0] & !PATH_POINT_TYPE_MASK);
        }
        self.start_new_figure = is_close(other.types[other.types.len() - 1]);
    }

    // --------------------------------------------------------------------
    // Editing
    // --------------------------------------------------------------------

    /// Reverse the drawing direction of the path.
    ///
    /// Figure order is reversed and so is each figure's point order. Segment
    /// kinds travel with their segment, a figure that was closed stays
    /// closed, and subpath markers are dropped.
    pub fn reverse(&mut self) {
        let mut points = Vec::with_capacity(self.points.len());
        let mut types = Vec::with_capacity(self.types.len());

        for range in self.figure_ranges().into_iter().rev() {
            let fig_points = &self.points[range.clone()];
            let fig_types = &self.types[range.clone()];
            let n = fig_points.len();

            points.extend(fig_points.iter().rev());
            types.push(PATH_POINT_TYPE_START);
            // The segment arriving at reversed point k used to leave it.
            for k in 1..n {
                types.push(point_kind(fig_types[n - k]));
            }
            if is_close(fig_types[n - 1]) {
                if let Some(last) = types.last_mut() {
                    *last |= PATH_POINT_TYPE_CLOSE;
                }
            }
        }

        self.points = points;
        self.types = types;
    }

    pub fn transform(&mut self, matrix: &Matrix) {
        if !matrix.is_identity() {
            matrix.transform_points(&mut self.points);
        }
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        for p in &mut self.points {
            p.x += dx;
            p.y += dy;
        }
    }

    /// Transform every figure except infinite sentinel rectangles.
    pub(crate) fn transform_finite(&mut self, matrix: &Matrix) {
        if matrix.is_identity() {
            return;
        }
        for range in self.figure_ranges() {
            if !self.is_infinite_figure(range.clone()) {
                matrix.transform_points(&mut self.points[range]);
            }
        }
    }

    /// Translate every figure except infinite sentinel rectangles.
    pub(crate) fn translate_finite(&mut self, dx: f32, dy: f32) {
        for range in self.figure_ranges() {
            if !self.is_infinite_figure(range.clone()) {
                for p in &mut self.points[range] {
                    p.x += dx;
                    p.y += dy;
                }
            }
        }
    }

    /// Replace every bezier with line segments, after applying `matrix`.
    pub fn flatten(&mut self, matrix: Option<&Matrix>, flatness: f32) {
        if let Some(m) = matrix {
            self.transform(m);
        }
        if !self.types.iter().any(|&t| is_bezier(t)) {
            return;
        }

        let mut curve = Curve4Div::new(flatness as f64);
        let mut points = Vec::with_capacity(self.points.len() * 4);
        let mut types = Vec::with_capacity(self.types.len() * 4);
        let mut i = 0;
        while i < self.points.len() {
            let t = self.types[i];
            if is_bezier(t) && i >= 1 && i + 2 < self.points.len() {
                let p0 = self.points[i - 1];
                let (p1, p2, p3) = (self.points[i], self.points[i + 1], self.points[i + 2]);
                curve.init(
                    p0.x as f64, p0.y as f64, p1.x as f64, p1.y as f64, p2.x as f64,
                    p2.y as f64, p3.x as f64, p3.y as f64,
                );
                let flags = self.types[i + 2] & !PATH_POINT_TYPE_MASK;
                let flat = &curve.points()[1..];
                for (k, &(x, y)) in flat.iter().enumerate() {
                    points.push(PointF::new(x as f32, y as f32));
                    let last = k + 1 == flat.len();
                    types.push(PATH_POINT_TYPE_LINE | if last { flags } else { 0 });
                }
                i += 3;
            } else {
                points.push(self.points[i]);
                types.push(t);
                i += 1;
            }
        }
        self.points = points;
        self.types = types;
    }

    /// A flattened copy, leaving `self` untouched.
    pub fn flattened(&self, matrix: Option<&Matrix>, flatness: f32) -> GraphicsPath {
        let mut path = self.clone();
        path.flatten(matrix, flatness);
        path
    }

    /// Axis-aligned bounds of the flattened path under `matrix`.
    /// An empty path has zero bounds.
    pub fn world_bounds(&self, matrix: Option<&Matrix>) -> RectF {
        let flat = self.flattened(matrix, FLATNESS_DEFAULT);
        let mut iter = flat.points.iter();
        let Some(first) = iter.next() else {
            return RectF::default();
        };
        let (mut x1, mut y1, mut x2, mut y2) = (first.x, first.y, first.x, first.y);
        for p in iter {
            x1 = x1.min(p.x);
            y1 = y1.min(p.y);
            x2 = x2.max(p.x);
            y2 = y2.max(p.y);
        }
        RectF::new(x1, y1, x2 - x1, y2 - y1)
    }

    // --------------------------------------------------------------------
    // Sentinel detection
    // --------------------------------------------------------------------

    /// Returns `true` if the figure is a straight four-point outline of the
    /// infinite sentinel rectangle.
    pub fn is_infinite_figure(&self, range: Range<usize>) -> bool {
        if range.len() != 4 || range.end > self.points.len() {
            return false;
        }
        if self.types[range.clone()].iter().any(|&t| is_bezier(t)) {
            return false;
        }
        let (left, top) = (INFINITE_X, INFINITE_Y);
        let (right, bottom) = (INFINITE_X + INFINITE_WIDTH, INFINITE_Y + INFINITE_HEIGHT);
        let mut corners = [false; 4];
        for p in &self.points[range] {
            let idx = match (p.x, p.y) {
                (x, y) if x == left && y == top => 0,
                (x, y) if x == right && y == top => 1,
                (x, y) if x == right && y == bottom => 2,
                (x, y) if x == left && y == bottom => 3,
                _ => return false,
            };
            corners[idx] = true;
        }
        corners.iter().all(|&c| c)
    }

    /// Returns `true` if the whole path is exactly one sentinel figure.
    pub fn is_infinite(&self) -> bool {
        self.points.len() == 4 && self.is_infinite_figure(0..4)
    }
}

impl Default for GraphicsPath {
    fn default() -> Self {
        Self::new(FillMode::Alternate)
    }
}

impl PartialEq for GraphicsPath {
    fn eq(&self, other: &Self) -> bool {
        self.fill_mode == other.fill_mode && self.points == other.points && self.types == other.types
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f32, y: f32) -> PointF {
        PointF::new(x, y)
    }

    #[test]
    fn test_add_rectangle() {
        let path = GraphicsPath::from_rect(RectF::new(1.0, 2.0, 3.0, 4.0), FillMode::Alternate);
        assert_eq!(path.point_count(), 4);
        assert_eq!(
            path.points(),
            &[pt(1.0, 2.0), pt(4.0, 2.0), pt(4.0, 6.0), pt(1.0, 6.0)]
        );
        assert_eq!(path.types(), &[0x00, 0x01, 0x01, 0x81]);
    }

    #[test]
    fn test_zero_size_rectangle_skipped() {
        let mut path = GraphicsPath::default();
        path.add_rectangle(RectF::new(0.0, 0.0, 0.0, 5.0));
        path.add_rectangle(RectF::new(0.0, 0.0, 5.0, 0.0));
        assert!(path.is_empty());
    }

    #[test]
    fn test_figures() {
        let mut path = GraphicsPath::default();
        path.add_rectangle(RectF::new(0.0, 0.0, 1.0, 1.0));
        path.add_line(5.0, 5.0, 6.0, 6.0);
        path.add_line(6.0, 6.0, 7.0, 5.0);
        assert_eq!(path.figure_ranges(), vec![0..4, 4..7]);
        assert_eq!(path.figure_count(), 2);
    }

    #[test]
    fn test_ellipse_layout() {
        let mut path = GraphicsPath::default();
        path.add_ellipse(RectF::new(0.0, 0.0, 20.0, 10.0));
        assert_eq!(path.point_count(), 13);
        assert_eq!(path.types()[0], PATH_POINT_TYPE_START);
        assert!(path.types()[1..].iter().all(|&t| is_bezier(t)));
        assert!(is_close(path.types()[12]));
        assert_eq!(path.points()[0], path.points()[12]);
    }

    #[test]
    fn test_from_raw_validation() {
        let ok = GraphicsPath::from_raw(
            vec![pt(0.0, 0.0), pt(1.0, 0.0), pt(1.0, 1.0)],
            vec![0, 1, 0x81],
            FillMode::Winding,
        );
        assert!(ok.is_ok());

        let mismatch = GraphicsPath::from_raw(vec![pt(0.0, 0.0)], vec![0, 1], FillMode::Winding);
        assert!(mismatch.is_err());

        let bad_start = GraphicsPath::from_raw(vec![pt(0.0, 0.0)], vec![1], FillMode::Winding);
        assert!(bad_start.is_err());

        let bad_bezier = GraphicsPath::from_raw(
            vec![pt(0.0, 0.0), pt(1.0, 0.0), pt(1.0, 1.0)],
            vec![0, 3, 3],
            FillMode::Winding,
        );
        assert!(bad_bezier.is_err());

        let bad_kind = GraphicsPath::from_raw(vec![pt(0.0, 0.0), pt(1.0, 0.0)], vec![0, 2], FillMode::Winding);
        assert!(bad_kind.is_err());
    }

    #[test]
    fn test_reverse_polygon() {
        let mut path = GraphicsPath::default();
        path.add_polygon(&[pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0)])
            .unwrap();
        path.reverse();
        assert_eq!(path.points(), &[pt(10.0, 10.0), pt(10.0, 0.0), pt(0.0, 0.0)]);
        assert_eq!(path.types(), &[0x00, 0x01, 0x81]);
    }

    #[test]
    fn test_reverse_keeps_bezier_kinds_and_figure_order() {
        let mut path = GraphicsPath::default();
        path.add_line(0.0, 0.0, 1.0, 0.0);
        path.start_figure();
        path.add_bezier(pt(10.0, 0.0), pt(11.0, 1.0), pt(12.0, 1.0), pt(13.0, 0.0));
        path.add_line(13.0, 0.0, 20.0, 0.0);
        path.set_marker();
        path.reverse();

        // Second figure now first: line segment then bezier.
        assert_eq!(
            path.points(),
            &[
                pt(20.0, 0.0),
                pt(13.0, 0.0),
                pt(12.0, 1.0),
                pt(11.0, 1.0),
                pt(10.0, 0.0),
                pt(1.0, 0.0),
                pt(0.0, 0.0),
            ]
        );
        assert_eq!(path.types(), &[0, 1, 3, 3, 3, 0, 1]);
    }

    #[test]
    fn test_reverse_twice_is_identity_for_closed_figures() {
        let mut path = GraphicsPath::default();
        path.add_ellipse(RectF::new(0.0, 0.0, 10.0, 10.0));
        path.add_rectangle(RectF::new(20.0, 20.0, 5.0, 5.0));
        let orig = path.clone();
        path.reverse();
        path.reverse();
        assert_eq!(path, orig);
    }

    #[test]
    fn test_flatten_removes_beziers() {
        let mut path = GraphicsPath::default();
        path.add_ellipse(RectF::new(0.0, 0.0, 100.0, 100.0));
        path.flatten(None, FLATNESS_DEFAULT);
        assert!(path.point_count() > 13);
        assert!(!path.types().iter().any(|&t| is_bezier(t)));
        assert!(is_close(*path.types().last().unwrap()));
    }

    #[test]
    fn test_world_bounds() {
        let mut path = GraphicsPath::default();
        path.add_ellipse(RectF::new(10.0, 20.0, 30.0, 40.0));
        let b = path.world_bounds(None);
        assert!((b.x - 10.0).abs() < 0.01);
        assert!((b.y - 20.0).abs() < 0.01);
        assert!((b.width - 30.0).abs() < 0.01);
        assert!((b.height - 40.0).abs() < 0.01);

        let m = Matrix::translation(5.0, 5.0);
        let rect = GraphicsPath::from_rect(RectF::new(0.0, 0.0, 2.0, 2.0), FillMode::Alternate);
        assert_eq!(rect.world_bounds(Some(&m)), RectF::new(5.0, 5.0, 2.0, 2.0));
        assert_eq!(GraphicsPath::default().world_bounds(None), RectF::default());
    }

    #[test]
    fn test_infinite_detection() {
        let path = GraphicsPath::from_rect(RectF::infinite(), FillMode::Alternate);
        assert!(path.is_infinite());
        let mut reversed = path.clone();
        reversed.reverse();
        assert!(reversed.is_infinite());

        let mut two = path.clone();
        two.add_rectangle(RectF::new(0.0, 0.0, 1.0, 1.0));
        assert!(!two.is_infinite());
        assert!(two.is_infinite_figure(0..4));
        assert!(!two.is_infinite_figure(4..8));
    }

    #[test]
    fn test_transform_finite_skips_sentinel() {
        let mut path = GraphicsPath::from_rect(RectF::new(0.0, 0.0, 1.0, 1.0), FillMode::Alternate);
        path.add_rectangle(RectF::infinite());
        path.translate_finite(10.0, 0.0);
        assert_eq!(path.points()[0], pt(10.0, 0.0));
        assert!(path.is_infinite_figure(4..8));
    }

    #[test]
    fn test_add_path_connect() {
        let mut a = GraphicsPath::default();
        a.add_line(0.0, 0.0, 1.0, 0.0);
        let mut b = GraphicsPath::default();
        b.add_line(1.0, 1.0, 2.0, 2.0);
        let mut joined = a.clone();
        joined.add_path(&b, true);
        assert_eq!(joined.figure_count(), 1);
        let mut separate = a;
        separate.add_path(&b, false);
        assert_eq!(separate.figure_count(), 2);
    }
}
