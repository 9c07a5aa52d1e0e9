//! Randomized agreement between the cheap and the general combine paths.

use gdiplus_region::region_bitmap::RegionBitmap;
use gdiplus_region::{CombineMode, FillMode, GraphicsPath, PointF, RectF, Region};
use proptest::prelude::*;

fn polygon() -> impl Strategy<Value = Vec<PointF>> {
    prop::collection::vec((0.0f32..40.0, 0.0f32..40.0), 3..9)
        .prop_map(|pts| pts.into_iter().map(|(x, y)| PointF::new(x, y)).collect())
}

fn int_rect() -> impl Strategy<Value = RectF> {
    (0i32..24, 0i32..24, 1i32..16, 1i32..16)
        .prop_map(|(x, y, w, h)| RectF::new(x as f32, y as f32, w as f32, h as f32))
}

fn combine_mode() -> impl Strategy<Value = CombineMode> {
    prop_oneof![
        Just(CombineMode::Intersect),
        Just(CombineMode::Union),
        Just(CombineMode::Xor),
        Just(CombineMode::Exclude),
        Just(CombineMode::Complement),
    ]
}

fn rect_path(r: RectF) -> GraphicsPath {
    GraphicsPath::from_rect(r, FillMode::Alternate)
}

proptest! {
    #[test]
    fn exclude_from_infinite_matches_raster(points in polygon()) {
        let mut path = GraphicsPath::new(FillMode::Alternate);
        path.add_polygon(&points).unwrap();

        let mut region = Region::infinite();
        region.combine_path(&path, CombineMode::Exclude).unwrap();
        prop_assert!(region.path_tree().and_then(|t| t.path()).is_some());

        let general = RegionBitmap::combine(
            &RegionBitmap::unbounded(),
            &RegionBitmap::from_path(&path).unwrap(),
            CombineMode::Exclude,
        )
        .unwrap();

        for py in -2..42 {
            for px in -2..42 {
                let fast = region
                    .is_visible_point(px as f32 + 0.5, py as f32 + 0.5)
                    .unwrap();
                prop_assert_eq!(fast, general.get_pixel(px, py), "pixel ({}, {})", px, py);
            }
        }
    }

    #[test]
    fn rect_algebra_matches_raster(a in int_rect(), b in int_rect(), mode in combine_mode()) {
        let mut exact = Region::from_rect(a);
        exact.combine_rect(b, mode).unwrap();

        let mut raster = Region::from_path(&rect_path(a));
        raster.combine_path(&rect_path(b), mode).unwrap();

        for py in -1..41 {
            for px in -1..41 {
                let (x, y) = (px as f32 + 0.5, py as f32 + 0.5);
                prop_assert_eq!(
                    exact.is_visible_point(x, y).unwrap(),
                    raster.is_visible_point(x, y).unwrap(),
                    "pixel ({}, {})", px, py
                );
            }
        }
        prop_assert!(exact.equals(&raster).unwrap());
    }

    #[test]
    fn union_covers_both_operands(a in int_rect(), b in int_rect()) {
        let mut u = Region::from_rect(a);
        u.combine_rect(b, CombineMode::Union).unwrap();
        let bounds = u.bounds().unwrap();
        prop_assert_eq!(bounds, a.unite(&b));
        prop_assert!(u.is_visible_rect(a).unwrap());
        prop_assert!(u.is_visible_rect(b).unwrap());
    }
}
