//! Device clipping.
//!
//! A drawing surface that clips implements [`ClipTarget`]; a [`Region`]
//! hands it the cheapest description it has: rectangles, a single path, or
//! the scans of its mask. [`ClipStack`] keeps the current clip region with
//! save/restore on top.

use log::debug;

use crate::basics::{CombineMode, RectF};
use crate::error::{RegionError, Result};
use crate::matrix::Matrix;
use crate::path::GraphicsPath;
use crate::region::Region;

/// Something that can be clipped: a rasterizer, a device context, a
/// renderer with multiple clip boxes.
pub trait ClipTarget {
    /// Drop any clip; everything is visible again.
    fn reset_clip(&mut self);

    /// Intersect the clip with the union of `rects`. An empty slice clips
    /// everything away.
    fn intersect_rects(&mut self, rects: &[RectF]);

    /// Intersect the clip with the fill of `path`. Targets without path
    /// clipping keep the default, and receive rectangles instead.
    fn intersect_path(&mut self, path: &GraphicsPath) -> Result<()> {
        let _ = path;
        Err(RegionError::NotImplemented("path clipping"))
    }
}

impl Region {
    /// Intersect the clip of `target` with this region.
    pub fn apply_clip(&self, target: &mut dyn ClipTarget) -> Result<()> {
        if self.is_infinite() {
            return Ok(());
        }
        if let Some(rects) = self.rects() {
            target.intersect_rects(rects);
            return Ok(());
        }
        if let Some(path) = self.path_tree().and_then(|tree| tree.path()) {
            match target.intersect_path(path) {
                Ok(()) => return Ok(()),
                Err(RegionError::NotImplemented(_)) => {
                    debug!("clip target has no path clipping, sending scans");
                }
                Err(e) => return Err(e),
            }
        }
        let scans = self.scans(&Matrix::identity())?;
        target.intersect_rects(&scans);
        Ok(())
    }
}

// ============================================================================
// ClipStack
// ============================================================================

/// The clip region of a drawing surface with save and restore.
#[derive(Debug, Clone)]
pub struct ClipStack {
    current: Region,
    saved: Vec<Region>,
}

impl ClipStack {
    /// Starts unclipped.
    pub fn new() -> Self {
        Self {
            current: Region::infinite(),
            saved: Vec::new(),
        }
    }

    pub fn current(&self) -> &Region {
        &self.current
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn set_clip(&mut self, region: &Region, mode: CombineMode) -> Result<()> {
        self.current.combine_region(region, mode)
    }

    pub fn set_clip_rect(&mut self, rect: RectF, mode: CombineMode) -> Result<()> {
        self.current.combine_rect(rect, mode)
    }

    pub fn set_clip_path(&mut self, path: &GraphicsPath, mode: CombineMode) -> Result<()> {
        self.current.combine_path(path, mode)
    }

    pub fn reset(&mut self) {
        self.current.set_infinite();
    }

    pub fn translate_clip(&mut self, dx: f32, dy: f32) {
        self.current.translate(dx, dy);
    }

    /// Push the current clip. The returned token restores it.
    pub fn save(&mut self) -> usize {
        self.saved.push(self.current.clone());
        self.saved.len() - 1
    }

    /// Return to the clip saved under `token`, dropping every later save.
    pub fn restore(&mut self, token: usize) -> Result<()> {
        if token >= self.saved.len() {
            return Err(RegionError::InvalidParameter("unknown clip state"));
        }
        self.saved.truncate(token + 1);
        if let Some(region) = self.saved.pop() {
            self.current = region;
        }
        Ok(())
    }

    /// Replace the clip of `target` with the current region.
    pub fn apply(&self, target: &mut dyn ClipTarget) -> Result<()> {
        target.reset_clip();
        self.current.apply_clip(target)
    }
}

impl Default for ClipStack {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::FillMode;

    #[derive(Default)]
    struct Recorder {
        resets: usize,
        rects: Vec<Vec<RectF>>,
        paths: usize,
        accepts_paths: bool,
    }

    impl ClipTarget for Recorder {
        fn reset_clip(&mut self) {
            self.resets += 1;
        }

        fn intersect_rects(&mut self, rects: &[RectF]) {
            self.rects.push(rects.to_vec());
        }

        fn intersect_path(&mut self, path: &GraphicsPath) -> Result<()> {
            if self.accepts_paths {
                self.paths += path.figure_count();
                Ok(())
            } else {
                Err(RegionError::NotImplemented("path clipping"))
            }
        }
    }

    fn ellipse() -> GraphicsPath {
        let mut path = GraphicsPath::default();
        path.add_ellipse(RectF::new(0.0, 0.0, 8.0, 8.0));
        path
    }

    #[test]
    fn test_infinite_sends_nothing() {
        let mut target = Recorder::default();
        Region::infinite().apply_clip(&mut target).unwrap();
        assert!(target.rects.is_empty());
        assert_eq!(target.paths, 0);
    }

    #[test]
    fn test_rect_region_sends_rects() {
        let mut target = Recorder::default();
        let region = Region::from_rect(RectF::new(1.0, 2.0, 3.0, 4.0));
        region.apply_clip(&mut target).unwrap();
        assert_eq!(target.rects, vec![vec![RectF::new(1.0, 2.0, 3.0, 4.0)]]);
    }

    #[test]
    fn test_path_leaf_prefers_path() {
        let region = Region::from_path(&ellipse());

        let mut target = Recorder {
            accepts_paths: true,
            ..Default::default()
        };
        region.apply_clip(&mut target).unwrap();
        assert_eq!(target.paths, 1);
        assert!(target.rects.is_empty());

        let mut target = Recorder::default();
        region.apply_clip(&mut target).unwrap();
        assert_eq!(target.paths, 0);
        assert_eq!(target.rects.len(), 1);
        assert!(!target.rects[0].is_empty());
    }

    #[test]
    fn test_combined_tree_sends_scans() {
        let mut region = Region::from_path(&ellipse());
        region
            .combine_rect(RectF::new(4.0, 0.0, 4.0, 8.0), CombineMode::Exclude)
            .unwrap();
        let mut target = Recorder {
            accepts_paths: true,
            ..Default::default()
        };
        region.apply_clip(&mut target).unwrap();
        assert_eq!(target.paths, 0);
        assert!(target.rects[0].iter().all(|r| r.right() <= 4.0));
    }

    #[test]
    fn test_stack_save_restore() {
        let mut stack = ClipStack::new();
        assert!(stack.current().is_infinite());

        let outer = stack.save();
        stack
            .set_clip_rect(RectF::new(0.0, 0.0, 10.0, 10.0), CombineMode::Intersect)
            .unwrap();
        let inner = stack.save();
        stack
            .set_clip_path(
                &GraphicsPath::from_rect(RectF::new(5.0, 5.0, 10.0, 10.0), FillMode::Alternate),
                CombineMode::Intersect,
            )
            .unwrap();
        assert_eq!(stack.current().bounds().unwrap(), RectF::new(5.0, 5.0, 5.0, 5.0));
        assert_eq!(stack.depth(), 2);

        stack.restore(inner).unwrap();
        assert_eq!(stack.current().bounds().unwrap(), RectF::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(stack.depth(), 1);

        stack.restore(outer).unwrap();
        assert!(stack.current().is_infinite());
        assert_eq!(stack.depth(), 0);
        assert!(stack.restore(outer).is_err());
    }

    #[test]
    fn test_stack_apply_resets_first() {
        let mut stack = ClipStack::new();
        stack
            .set_clip(&Region::from_rect(RectF::new(0.0, 0.0, 2.0, 2.0)), CombineMode::Replace)
            .unwrap();
        stack.translate_clip(1.0, 1.0);
        let mut target = Recorder::default();
        stack.apply(&mut target).unwrap();
        assert_eq!(target.resets, 1);
        assert_eq!(target.rects, vec![vec![RectF::new(1.0, 1.0, 2.0, 2.0)]]);

        stack.reset();
        let mut target = Recorder::default();
        stack.apply(&mut target).unwrap();
        assert_eq!(target.resets, 1);
        assert!(target.rects.is_empty());
    }
}
