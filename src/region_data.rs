//! Region data export and import.
//!
//! Little-endian layout: a `u32` type word, then either a rectangle list
//! (`2`: `u32` count and `count` records of four `f32`) or a path tree
//! (`3`: the encoding of [`PathTree::write_to`]).

use log::debug;

use crate::basics::RectF;
use crate::error::{RegionError, Result};
use crate::path_tree::{put_f32, put_u32, DataReader, PathTree};
use crate::region::Region;

pub const REGION_DATA_RECTS: u32 = 2;
pub const REGION_DATA_TREE: u32 = 3;

impl Region {
    /// Exact number of bytes [`write_data`](Region::write_data) writes.
    pub fn data_size(&self) -> usize {
        match (self.rects(), self.path_tree()) {
            (Some(rects), _) => 4 + 4 + rects.len() * 16,
            (None, Some(tree)) => 4 + tree.data_size(),
            (None, None) => 4,
        }
    }

    /// Encode the region into a new buffer.
    pub fn to_data(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data_size());
        if let Some(rects) = self.rects() {
            put_u32(&mut out, REGION_DATA_RECTS);
            put_u32(&mut out, rects.len() as u32);
            for r in rects {
                put_f32(&mut out, r.x);
                put_f32(&mut out, r.y);
                put_f32(&mut out, r.width);
                put_f32(&mut out, r.height);
            }
        } else if let Some(tree) = self.path_tree() {
            put_u32(&mut out, REGION_DATA_TREE);
            tree.write_to(&mut out);
        }
        out
    }

    /// Encode into `buf` and return the number of bytes written. A buffer
    /// shorter than [`data_size`](Region::data_size) is left untouched.
    pub fn write_data(&self, buf: &mut [u8]) -> Result<usize> {
        let needed = self.data_size();
        if buf.len() < needed {
            return Err(RegionError::InsufficientBuffer {
                needed,
                available: buf.len(),
            });
        }
        let data = self.to_data();
        buf[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }

    /// Decode a region. The whole buffer must be consumed.
    pub fn from_data(data: &[u8]) -> Result<Region> {
        let mut reader = DataReader::new(data);
        let region = match reader.read_u32()? {
            REGION_DATA_RECTS => {
                let count = reader.read_u32()? as usize;
                if count.saturating_mul(16) > reader.remaining() {
                    return Err(RegionError::InvalidParameter("truncated rectangle data"));
                }
                let mut rects = Vec::with_capacity(count);
                for _ in 0..count {
                    let x = reader.read_f32()?;
                    let y = reader.read_f32()?;
                    let width = reader.read_f32()?;
                    let height = reader.read_f32()?;
                    rects.push(RectF::new(x, y, width, height));
                }
                if rects.iter().any(|r| r.is_infinite()) {
                    Region::infinite()
                } else {
                    Region::from_rects(&rects)?
                }
            }
            REGION_DATA_TREE => Region::from_tree(PathTree::read_from(&mut reader)?),
            _ => return Err(RegionError::InvalidParameter("unknown region data type")),
        };
        reader.finish()?;
        debug!("decoded {:?} region from {} bytes", region.region_type(), data.len());
        Ok(region)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::{CombineMode, FillMode, RegionType};
    use crate::path::GraphicsPath;

    #[test]
    fn test_rect_layout() {
        let region = Region::from_rect(RectF::new(1.0, 2.0, 3.0, 4.0));
        let data = region.to_data();
        assert_eq!(data.len(), region.data_size());
        assert_eq!(data.len(), 24);
        assert_eq!(&data[0..4], &2u32.to_le_bytes());
        assert_eq!(&data[4..8], &1u32.to_le_bytes());
        assert_eq!(&data[8..12], &1.0f32.to_le_bytes());
        assert_eq!(&data[20..24], &4.0f32.to_le_bytes());
    }

    #[test]
    fn test_empty_and_infinite() {
        let empty = Region::from_data(&Region::empty().to_data()).unwrap();
        assert!(empty.is_empty().unwrap());

        let infinite = Region::from_data(&Region::infinite().to_data()).unwrap();
        assert!(infinite.is_infinite());
        assert_eq!(infinite.region_type(), RegionType::Infinite);
    }

    #[test]
    fn test_tree_round_trip() {
        let mut region = Region::from_path(&GraphicsPath::from_rect(
            RectF::new(0.0, 0.0, 10.0, 10.0),
            FillMode::Alternate,
        ));
        region
            .combine_rect(RectF::new(5.0, 5.0, 10.0, 10.0), CombineMode::Xor)
            .unwrap();
        let data = region.to_data();
        assert_eq!(data.len(), region.data_size());
        assert_eq!(&data[0..4], &3u32.to_le_bytes());

        let decoded = Region::from_data(&data).unwrap();
        assert_eq!(decoded.path_tree(), region.path_tree());
        assert!(decoded.equals(&region).unwrap());
    }

    #[test]
    fn test_write_data_buffer_sizes() {
        let region = Region::from_rects(&[
            RectF::new(0.0, 0.0, 1.0, 1.0),
            RectF::new(5.0, 5.0, 1.0, 1.0),
        ])
        .unwrap();
        let needed = region.data_size();

        let mut small = vec![0xAAu8; needed - 1];
        let err = region.write_data(&mut small).unwrap_err();
        assert_eq!(
            err,
            RegionError::InsufficientBuffer {
                needed,
                available: needed - 1
            }
        );
        assert!(small.iter().all(|&b| b == 0xAA));

        let mut big = vec![0u8; needed + 8];
        assert_eq!(region.write_data(&mut big).unwrap(), needed);
        assert_eq!(&big[..needed], region.to_data().as_slice());
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(Region::from_data(&[]).is_err());
        assert!(Region::from_data(&7u32.to_le_bytes()).is_err());

        let mut data = Region::from_rect(RectF::new(0.0, 0.0, 2.0, 2.0)).to_data();
        data.push(0);
        assert!(matches!(
            Region::from_data(&data),
            Err(RegionError::InvalidParameter(_))
        ));
        data.truncate(data.len() - 2);
        assert!(Region::from_data(&data).is_err());

        let mut count_lie = Vec::new();
        count_lie.extend_from_slice(&2u32.to_le_bytes());
        count_lie.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(Region::from_data(&count_lie).is_err());
    }
}
