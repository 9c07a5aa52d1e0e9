//! Cubic Bezier flattening by recursive de Casteljau subdivision.
//!
//! Used by [`GraphicsPath::flatten`](crate::path::GraphicsPath::flatten) to
//! turn bezier runs into polylines before rasterization. The tolerance is a
//! flatness in device units: a subdivided piece is accepted once its control
//! points are within that distance of its chord.

// ============================================================================
// Constants
// ============================================================================

const CURVE_COLLINEARITY_EPSILON: f64 = 1e-30;
const CURVE_RECURSION_LIMIT: u32 = 32;

/// Smallest flatness accepted; anything lower is clamped to it.
pub const MIN_FLATNESS: f64 = 1e-3;

#[inline]
fn sq_distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    dx * dx + dy * dy
}

// ============================================================================
// Curve4Div
// ============================================================================

/// Recursive subdivision cubic Bezier flattener.
///
/// After [`init`](Curve4Div::init), [`points`](Curve4Div::points) holds the
/// polyline from the first control point to the last, both included.
#[derive(Debug, Clone)]
pub struct Curve4Div {
    distance_tolerance_square: f64,
    points: Vec<(f64, f64)>,
}

impl Curve4Div {
    pub fn new(flatness: f64) -> Self {
        let tol = flatness.max(MIN_FLATNESS);
        Self {
            distance_tolerance_square: tol * tol,
            points: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.points.clear();
    }

    #[allow(clippy::too_many_arguments)]
    pub fn init(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64, x4: f64, y4: f64) {
        self.points.clear();
        self.points.push((x1, y1));
        self.recursive_bezier(x1, y1, x2, y2, x3, y3, x4, y4, 0);
        self.points.push((x4, y4));
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    #[allow(clippy::too_many_arguments)]
    fn recursive_bezier(
        &mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x3: f64,
        y3: f64,
        x4: f64,
        y4: f64,
        level: u32,
    ) {
        if level > CURVE_RECURSION_LIMIT {
            return;
        }

        let x12 = (x1 + x2) / 2.0;
        let y12 = (y1 + y2) / 2.0;
        let x23 = (x2 + x3) / 2.0;
        let y23 = (y2 + y3) / 2.0;
        let x34 = (x3 + x4) / 2.0;
        let y34 = (y3 + y4) / 2.0;
        let x123 = (x12 + x23) / 2.0;
        let y123 = (y12 + y23) / 2.0;
        let x234 = (x23 + x34) / 2.0;
        let y234 = (y23 + y34) / 2.0;
        let x1234 = (x123 + x234) / 2.0;
        let y1234 = (y123 + y234) / 2.0;

        let dx = x4 - x1;
        let dy = y4 - y1;

        let mut d2 = ((x2 - x4) * dy - (y2 - y4) * dx).abs();
        let mut d3 = ((x3 - x4) * dy - (y3 - y4) * dx).abs();

        let case = ((d2 > CURVE_COLLINEARITY_EPSILON) as u32) << 1
            | (d3 > CURVE_COLLINEARITY_EPSILON) as u32;

        match case {
            0 => {
                // All collinear, or p1 == p4.
                let k = dx * dx + dy * dy;
                if k == 0.0 {
                    d2 = sq_distance(x1, y1, x2, y2);
                    d3 = sq_distance(x4, y4, x3, y3);
                } else {
                    let k = 1.0 / k;
                    d2 = k * ((x2 - x1) * dx + (y2 - y1) * dy);
                    d3 = k * ((x3 - x1) * dx + (y3 - y1) * dy);
                    if d2 > 0.0 && d2 < 1.0 && d3 > 0.0 && d3 < 1.0 {
                        return;
                    }
                    d2 = if d2 <= 0.0 {
                        sq_distance(x2, y2, x1, y1)
                    } else if d2 >= 1.0 {
                        sq_distance(x2, y2, x4, y4)
                    } else {
                        sq_distance(x2, y2, x1 + d2 * dx, y1 + d2 * dy)
                    };
                    d3 = if d3 <= 0.0 {
                        sq_distance(x3, y3, x1, y1)
                    } else if d3 >= 1.0 {
                        sq_distance(x3, y3, x4, y4)
                    } else {
                        sq_distance(x3, y3, x1 + d3 * dx, y1 + d3 * dy)
                    };
                }
                if d2 > d3 {
                    if d2 < self.distance_tolerance_square {
                        self.points.push((x2, y2));
                        return;
                    }
                } else if d3 < self.distance_tolerance_square {
                    self.points.push((x3, y3));
                    return;
                }
            }
            1 => {
                // p3 is significant.
                if d3 * d3 <= self.distance_tolerance_square * (dx * dx + dy * dy) {
                    self.points.push((x23, y23));
                    return;
                }
            }
            2 => {
                // p2 is significant.
                if d2 * d2 <= self.distance_tolerance_square * (dx * dx + dy * dy) {
                    self.points.push((x23, y23));
                    return;
                }
            }
            _ => {
                if (d2 + d3) * (d2 + d3) <= self.distance_tolerance_square * (dx * dx + dy * dy) {
                    self.points.push((x23, y23));
                    return;
                }
            }
        }

        self.recursive_bezier(x1, y1, x12, y12, x123, y123, x1234, y1234, level + 1);
        self.recursive_bezier(x1234, y1234, x234, y234, x34, y34, x4, y4, level + 1);
    }
}

impl Default for Curve4Div {
    fn default() -> Self {
        Self::new(0.25)
    }
}

// ============================================================================
// Tests
// ============================================================================
