//! # gdiplus-region
//!
//! GDI+-compatible clipping regions in pure Rust.
//!
//! A region is a set of points in the plane built by combining rectangles
//! and paths with the six GDI+ combine modes (replace, intersect, union,
//! xor, exclude, complement). Regions answer hit tests, report bounds and
//! scan rectangles, transform, serialize to the GDI+ region-data layout,
//! and clip drawing targets.
//!
//! ## Architecture
//!
//! A region moves through three representations:
//!
//! 1. **Rectangle set**: a list of non-overlapping rectangles with exact
//!    band-based set algebra. Regions start here.
//! 2. **Path tree**: a lazy binary tree whose leaves are paths and whose
//!    branches are combine operators. Any combine with a path moves the
//!    region here.
//! 3. **Region bitmap**: a 1bpp pixel mask rasterized from the tree with a
//!    binary (non anti-aliased) scanline rasterizer, cached until the tree
//!    changes. Unbounded regions carry an outside bit instead of a huge
//!    mask.
//!
//! ```
//! use gdiplus_region::{CombineMode, RectF, Region};
//!
//! let mut region = Region::from_rect(RectF::new(0.0, 0.0, 10.0, 10.0));
//! region.combine_rect(RectF::new(5.0, 5.0, 10.0, 10.0), CombineMode::Union).unwrap();
//! assert!(region.is_visible_point(12.0, 12.0).unwrap());
//! assert_eq!(region.bounds().unwrap(), RectF::new(0.0, 0.0, 15.0, 15.0));
//! ```

// Foundation
pub mod basics;
pub mod error;
pub mod matrix;

// Geometry
pub mod curves;
pub mod path;

// Rasterization
pub mod rasterizer;
pub mod scanline_bin;

// Region representations
pub mod path_tree;
pub mod rect_set;
pub mod region_bitmap;

// Public region
pub mod clip;
pub mod region;
pub mod region_data;

pub use basics::{CombineMode, FillMode, PointF, RectF, RegionType};
pub use clip::{ClipStack, ClipTarget};
pub use error::{RegionError, Result};
pub use matrix::Matrix;
pub use path::GraphicsPath;
pub use path_tree::PathTree;
pub use region::Region;
