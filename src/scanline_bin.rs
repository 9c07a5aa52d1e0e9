//! Binary scanline container.
//!
//! One row of on/off spans with no coverage data. The rasterizer fills it
//! one row at a time and the region mask consumes it.

/// A horizontal run of covered pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinSpan {
    pub x: i32,
    pub len: i32,
}

/// Spans of a single row, sorted by `x` and never adjacent.
#[derive(Debug, Clone, Default)]
pub struct ScanlineBin {
    y: i32,
    spans: Vec<BinSpan>,
}

impl ScanlineBin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset_spans(&mut self) {
        self.spans.clear();
    }

    /// Append a span; it is merged into the previous one when they touch.
    pub fn add_span(&mut self, x: i32, len: i32) {
        if len <= 0 {
            return;
        }
        if let Some(last) = self.spans.last_mut() {
            if x <= last.x + last.len {
                let end = (x + len).max(last.x + last.len);
                last.len = end - last.x;
                return;
            }
        }
        self.spans.push(BinSpan { x, len });
    }

    pub fn finalize(&mut self, y: i32) {
        self.y = y;
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn num_spans(&self) -> usize {
        self.spans.len()
    }

    pub fn spans(&self) -> &[BinSpan] {
        &self.spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_spans_merge() {
        let mut sl = ScanlineBin::new();
        sl.add_span(0, 4);
        sl.add_span(4, 2);
        sl.add_span(10, 1);
        sl.finalize(7);
        assert_eq!(sl.y(), 7);
        assert_eq!(
            sl.spans(),
            &[BinSpan { x: 0, len: 6 }, BinSpan { x: 10, len: 1 }]
        );
    }

    #[test]
    fn test_empty_span_ignored() {
        let mut sl = ScanlineBin::new();
        sl.add_span(3, 0);
        assert_eq!(sl.num_spans(), 0);
        sl.add_span(3, 2);
        sl.reset_spans();
        assert_eq!(sl.num_spans(), 0);
    }
}
