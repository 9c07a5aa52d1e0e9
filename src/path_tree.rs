//! Binary combination tree of paths.
//!
//! A leaf owns a path; a branch records the operator that combined its two
//! children. The tree is the replayable history of a path-based region: the
//! bitmap answers queries, and the tree lets the region be transformed,
//! serialized, and rasterized again.
//!
//! Encoding (little-endian):
//!
//! ```text
//! leaf   := u32 1, path
//! branch := u32 2, u32 op, u32 left_size, left, u32 right_size, right
//! path   := u32 count, u32 fill_mode, count * (f32 x, f32 y), count * u8 type
//! ```

use crate::basics::{CombineMode, FillMode, PointF};
use crate::error::{RegionError, Result};
use crate::matrix::Matrix;
use crate::path::GraphicsPath;
use crate::region_bitmap::RegionBitmap;

const TAG_LEAF: u32 = 1;
const TAG_BRANCH: u32 = 2;

/// Deepest tree accepted when decoding.
pub const MAX_TREE_DEPTH: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum PathTree {
    Leaf(GraphicsPath),
    Branch {
        op: CombineMode,
        left: Box<PathTree>,
        right: Box<PathTree>,
    },
}

impl PathTree {
    /// A leaf holding a copy of `path`.
    pub fn leaf(path: &GraphicsPath) -> Self {
        PathTree::Leaf(path.clone())
    }

    pub fn combine(left: PathTree, right: PathTree, op: CombineMode) -> Self {
        PathTree::Branch {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn path(&self) -> Option<&GraphicsPath> {
        match self {
            PathTree::Leaf(path) => Some(path),
            PathTree::Branch { .. } => None,
        }
    }

    /// A leaf with no points.
    pub fn is_empty_leaf(&self) -> bool {
        matches!(self, PathTree::Leaf(path) if path.is_empty())
    }

    /// A leaf holding exactly the infinite sentinel rectangle.
    pub fn is_infinite_leaf(&self) -> bool {
        matches!(self, PathTree::Leaf(path) if path.is_infinite())
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            PathTree::Leaf(_) => 1,
            PathTree::Branch { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            PathTree::Leaf(_) => 1,
            PathTree::Branch { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    /// Transform every leaf, leaving sentinel figures where they are.
    pub fn transform(&mut self, matrix: &Matrix) {
        match self {
            PathTree::Leaf(path) => path.transform_finite(matrix),
            PathTree::Branch { left, right, .. } => {
                left.transform(matrix);
                right.transform(matrix);
            }
        }
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        match self {
            PathTree::Leaf(path) => path.translate_finite(dx, dy),
            PathTree::Branch { left, right, .. } => {
                left.translate(dx, dy);
                right.translate(dx, dy);
            }
        }
    }

    /// Rasterize leaves and apply each branch operator bottom-up.
    pub fn to_bitmap(&self) -> Result<RegionBitmap> {
        match self {
            PathTree::Leaf(path) => RegionBitmap::from_path(path),
            PathTree::Branch { op, left, right } => {
                let a = left.to_bitmap()?;
                let b = right.to_bitmap()?;
                RegionBitmap::combine(&a, &b, *op)
            }
        }
    }

    // --------------------------------------------------------------------
    // Serialization
    // --------------------------------------------------------------------

    /// Exact number of bytes [`write_to`](PathTree::write_to) appends.
    pub fn data_size(&self) -> usize {
        match self {
            PathTree::Leaf(path) => 4 + path_data_size(path),
            PathTree::Branch { left, right, .. } => 4 + 4 + 4 + left.data_size() + 4 + right.data_size(),
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            PathTree::Leaf(path) => {
                put_u32(out, TAG_LEAF);
                write_path(path, out);
            }
            PathTree::Branch { op, left, right } => {
                put_u32(out, TAG_BRANCH);
                put_u32(out, *op as u32);
                put_u32(out, left.data_size() as u32);
                left.write_to(out);
                put_u32(out, right.data_size() as u32);
                right.write_to(out);
            }
        }
    }

    /// Decode one tree from the front of `reader`.
    pub fn read_from(reader: &mut DataReader<'_>) -> Result<Self> {
        Self::read_nested(reader, 0)
    }

    fn read_nested(reader: &mut DataReader<'_>, depth: usize) -> Result<Self> {
        if depth >= MAX_TREE_DEPTH {
            return Err(RegionError::InvalidParameter("path tree nested too deeply"));
        }
        match reader.read_u32()? {
            TAG_LEAF => Ok(PathTree::Leaf(read_path(reader)?)),
            TAG_BRANCH => {
                let op = CombineMode::try_from(reader.read_u32()?)?;
                if op == CombineMode::Replace {
                    return Err(RegionError::InvalidParameter("replace is not a branch operator"));
                }
                let left = Self::read_child(reader, depth)?;
                let right = Self::read_child(reader, depth)?;
                Ok(PathTree::combine(left, right, op))
            }
            _ => Err(RegionError::InvalidParameter("unknown path tree tag")),
        }
    }

    fn read_child(reader: &mut DataReader<'_>, depth: usize) -> Result<Self> {
        let size = reader.read_u32()? as usize;
        let mut sub = DataReader::new(reader.read_bytes(size)?);
        let child = Self::read_nested(&mut sub, depth + 1)?;
        sub.finish()?;
        Ok(child)
    }
}

// ============================================================================
// Path stream
// ============================================================================

fn path_data_size(path: &GraphicsPath) -> usize {
    4 + 4 + path.point_count() * 8 + path.point_count()
}

fn write_path(path: &GraphicsPath, out: &mut Vec<u8>) {
    put_u32(out, path.point_count() as u32);
    put_u32(out, path.fill_mode() as u32);
    for p in path.points() {
        put_f32(out, p.x);
        put_f32(out, p.y);
    }
    out.extend_from_slice(path.types());
}

fn read_path(reader: &mut DataReader<'_>) -> Result<GraphicsPath> {
    let count = reader.read_u32()? as usize;
    let fill_mode = FillMode::try_from(reader.read_u32()?)?;
    if count.saturating_mul(9) > reader.remaining() {
        return Err(RegionError::InvalidParameter("truncated path data"));
    }
    let mut points = Vec::with_capacity(count);
    for _ in 0..count {
        let x = reader.read_f32()?;
        let y = reader.read_f32()?;
        points.push(PointF::new(x, y));
    }
    let types = reader.read_bytes(count)?.to_vec();
    GraphicsPath::from_raw(points, types, fill_mode)
}

// ============================================================================
// Byte helpers
// ============================================================================

pub(crate) fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn put_f32(out: &mut Vec<u8>, v: f32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Little-endian cursor over region data.
pub struct DataReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DataReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(RegionError::InvalidParameter("truncated region data"));
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Fails if any bytes are left over.
    pub fn finish(&self) -> Result<()> {
        if self.remaining() == 0 {
            Ok(())
        } else {
            Err(RegionError::InvalidParameter("trailing bytes in region data"))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
