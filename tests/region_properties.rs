//! Behavioural properties of regions seen through the public API.

use gdiplus_region::region_bitmap::RegionBitmap;
use gdiplus_region::{
    CombineMode, FillMode, GraphicsPath, Matrix, PointF, RectF, Region, RegionError, RegionType,
};

fn rect(x: f32, y: f32, w: f32, h: f32) -> RectF {
    RectF::new(x, y, w, h)
}

fn rect_path(x: f32, y: f32, w: f32, h: f32) -> GraphicsPath {
    GraphicsPath::from_rect(rect(x, y, w, h), FillMode::Alternate)
}

fn triangle() -> GraphicsPath {
    let mut path = GraphicsPath::default();
    path.add_polygon(&[
        PointF::new(0.0, 0.0),
        PointF::new(20.0, 0.0),
        PointF::new(0.0, 20.0),
    ])
    .unwrap();
    path
}

fn sample_regions() -> Vec<Region> {
    let mut mixed = Region::from_rect(rect(0.0, 0.0, 10.0, 10.0));
    mixed
        .combine_path(&triangle(), CombineMode::Xor)
        .unwrap();
    let mut holed = Region::infinite();
    holed.combine_path(&triangle(), CombineMode::Exclude).unwrap();
    vec![
        Region::empty(),
        Region::infinite(),
        Region::from_rect(rect(1.0, 2.0, 3.0, 4.0)),
        Region::from_rects(&[rect(0.0, 0.0, 5.0, 5.0), rect(10.0, 0.0, 5.0, 5.0)]).unwrap(),
        Region::from_path(&triangle()),
        mixed,
        holed,
    ]
}

// ============================================================================
// Identities
// ============================================================================

#[test]
fn test_clone_equals() {
    for r in sample_regions() {
        assert!(r.equals(&r.clone()).unwrap());
    }
}

#[test]
fn test_union_with_infinite_stays_infinite() {
    for r in sample_regions() {
        let mut inf = Region::infinite();
        inf.combine_region(&r, CombineMode::Union).unwrap();
        assert!(inf.is_infinite());
        assert_eq!(inf.region_type(), RegionType::Infinite);
    }
}

#[test]
fn test_intersect_with_infinite_is_identity() {
    for r in sample_regions() {
        let mut inf = Region::infinite();
        inf.combine_region(&r, CombineMode::Intersect).unwrap();
        assert!(inf.equals(&r).unwrap());
    }
}

#[test]
fn test_complement_of_self_is_empty() {
    for r in sample_regions().into_iter().filter(|r| !r.is_infinite()) {
        let mut c = r.clone();
        c.combine_region(&r, CombineMode::Complement).unwrap();
        assert!(c.is_empty().unwrap());
    }
}

#[test]
fn test_complement_is_other_minus_self() {
    let mut r = Region::from_rect(rect(0.0, 0.0, 10.0, 10.0));
    r.combine_rect(rect(5.0, 0.0, 10.0, 10.0), CombineMode::Complement)
        .unwrap();
    assert_eq!(r.bounds().unwrap(), rect(10.0, 0.0, 5.0, 10.0));
}

// ============================================================================
// Rectangle algebra
// ============================================================================

#[test]
fn test_union_then_exclude_bounds() {
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let b = rect(20.0, 0.0, 10.0, 10.0);
    let mut r = Region::from_rect(a);
    r.combine_rect(b, CombineMode::Union).unwrap();
    assert_eq!(r.bounds().unwrap(), rect(0.0, 0.0, 30.0, 10.0));
    r.combine_rect(b, CombineMode::Exclude).unwrap();
    assert_eq!(r.bounds().unwrap(), a);
}

#[test]
fn test_rect_algebra_concrete_case() {
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let b = rect(5.0, 5.0, 10.0, 10.0);

    let mut u = Region::from_rect(a);
    u.combine_rect(b, CombineMode::Union).unwrap();
    assert_eq!(u.bounds().unwrap(), rect(0.0, 0.0, 15.0, 15.0));

    let mut i = Region::from_rect(a);
    i.combine_rect(b, CombineMode::Intersect).unwrap();
    assert_eq!(i.bounds().unwrap(), rect(5.0, 5.0, 5.0, 5.0));
    assert!(i.is_visible_point(7.0, 7.0).unwrap());
    assert!(!i.is_visible_point(1.0, 1.0).unwrap());

    let mut x = Region::from_rect(a);
    x.combine_rect(b, CombineMode::Xor).unwrap();
    assert!(!x.is_visible_point(7.0, 7.0).unwrap());
    assert!(x.is_visible_point(1.0, 1.0).unwrap());
    assert!(x.is_visible_point(12.0, 12.0).unwrap());
}

#[test]
fn test_negative_size_normalization() {
    let flipped = Region::from_rect(rect(10.0, 10.0, -5.0, -5.0));
    let plain = Region::from_rect(rect(5.0, 5.0, 5.0, 5.0));
    assert!(flipped.equals(&plain).unwrap());
    assert_eq!(flipped.bounds().unwrap(), rect(5.0, 5.0, 5.0, 5.0));
}

#[test]
fn test_is_visible_rect() {
    let r = Region::from_rect(rect(0.0, 0.0, 10.0, 10.0));
    assert!(r.is_visible_rect(rect(9.0, 9.0, 5.0, 5.0)).unwrap());
    assert!(!r.is_visible_rect(rect(10.0, 0.0, 5.0, 5.0)).unwrap());
    assert!(r.is_visible_rect(rect(12.0, 12.0, -4.0, -4.0)).unwrap());

    let p = Region::from_path(&triangle());
    assert!(p.is_visible_rect(rect(1.0, 1.0, 2.0, 2.0)).unwrap());
    assert!(!p.is_visible_rect(rect(15.0, 15.0, 4.0, 4.0)).unwrap());
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_round_trip_three_rects() {
    let r = Region::from_rects(&[
        rect(0.0, 0.0, 4.0, 4.0),
        rect(10.0, 0.0, 4.0, 4.0),
        rect(0.0, 10.0, 4.0, 4.0),
    ])
    .unwrap();
    let decoded = Region::from_data(&r.to_data()).unwrap();
    assert_eq!(decoded.region_type(), RegionType::Rect);
    assert!(decoded.equals(&r).unwrap());
}

#[test]
fn test_round_trip_xor_tree() {
    let mut r = Region::from_path(&rect_path(0.0, 0.0, 10.0, 10.0));
    r.combine_path(&rect_path(5.0, 5.0, 10.0, 10.0), CombineMode::Xor)
        .unwrap();
    let mut buf = vec![0u8; r.data_size()];
    assert_eq!(r.write_data(&mut buf).unwrap(), buf.len());
    let decoded = Region::from_data(&buf).unwrap();
    assert_eq!(decoded.region_type(), RegionType::Path);
    assert!(decoded.equals(&r).unwrap());
    assert!(!decoded.is_visible_point(7.0, 7.0).unwrap());
}

// ============================================================================
// Bitmap
// ============================================================================

#[test]
fn test_allocation_snapping() {
    let b = RegionBitmap::allocate(3, 0, 10, 8).unwrap();
    assert_eq!(b.x() % 8, 0);
    assert!(b.x() <= 3);
    assert_eq!(b.width() % 8, 0);
    assert!(b.width() >= 13 - b.x());
    assert_eq!(b.height(), 8);
}

#[test]
fn test_solid_rect_scans_to_one_rect() {
    let r = Region::from_path(&rect_path(2.0, 3.0, 7.0, 10.0));
    let scans = r.scans(&Matrix::identity()).unwrap();
    assert_eq!(scans, vec![rect(2.0, 3.0, 7.0, 10.0)]);
    assert_eq!(r.scan_count(&Matrix::identity()).unwrap(), 1);
}

#[test]
fn test_scans_of_hole_in_infinite_cover_both_sides() {
    let mut r = Region::infinite();
    r.combine_path(&rect_path(0.0, 0.0, 8.0, 8.0), CombineMode::Exclude)
        .unwrap();
    assert!(r.is_visible_point(100.5, 4.5).unwrap());
    assert!(!r.is_visible_point(4.5, 4.5).unwrap());

    let scans = r.scans(&Matrix::identity()).unwrap();
    assert_eq!(scans.len(), 4);
    assert_eq!(r.scan_count(&Matrix::identity()).unwrap(), 4);
    for (x, y) in [(100.5, 4.5), (-100.5, 4.5), (4.5, -100.5), (4.5, 100.5)] {
        assert!(scans.iter().any(|s| s.contains_point(x, y)), "({x}, {y})");
    }
    assert!(!scans.iter().any(|s| s.contains_point(4.5, 4.5)));
}

#[test]
fn test_scans_under_rotation() {
    let r = Region::from_rect(rect(0.0, 0.0, 10.0, 10.0));
    let scans = r.scans(&Matrix::rotation(90.0)).unwrap();
    let covered: f32 = scans.iter().map(|s| s.width * s.height).sum();
    assert_eq!(covered, 100.0);
    assert!(scans.iter().all(|s| s.x >= -10.0 && s.right() <= 0.0));
    assert_eq!(r.region_type(), RegionType::Rect);
}

#[test]
fn test_failed_combine_is_not_mutating() {
    let mut r = Region::from_rect(rect(0.0, 0.0, 10.0, 10.0));
    r.combine_path(&triangle(), CombineMode::Union).unwrap();
    let before = r.clone();

    let err = r
        .combine_path(&rect_path(0.0, 0.0, 100_000.0, 100_000.0), CombineMode::Intersect)
        .unwrap_err();
    assert!(matches!(err, RegionError::OutOfMemory { .. }));
    assert!(r.equals(&before).unwrap());
    assert_eq!(r.path_tree(), before.path_tree());
}

// ============================================================================
// Transforms
// ============================================================================

#[test]
fn test_translate_rect_and_path_regions() {
    let mut r = Region::from_rect(rect(0.0, 0.0, 4.0, 4.0));
    r.translate(3.0, -1.0);
    assert_eq!(r.bounds().unwrap(), rect(3.0, -1.0, 4.0, 4.0));

    let mut p = Region::from_path(&rect_path(0.0, 0.0, 4.0, 4.0));
    p.translate(3.0, -1.0);
    assert_eq!(p.bounds().unwrap(), rect(3.0, -1.0, 4.0, 4.0));

    let mut inf = Region::infinite();
    inf.translate(50.0, 50.0);
    assert!(inf.is_infinite());
}

#[test]
fn test_transform_hole_keeps_outside() {
    let mut r = Region::infinite();
    r.combine_rect(rect(0.0, 0.0, 10.0, 10.0), CombineMode::Exclude)
        .unwrap();
    assert_eq!(r.region_type(), RegionType::Rect);
    r.transform(&Matrix::rotation(45.0));
    assert_eq!(r.region_type(), RegionType::Path);
    assert!(!r.is_visible_point(0.0, 5.0).unwrap());
    assert!(r.is_visible_point(0.0, -5.0).unwrap());
    assert!(r.is_visible_point(1000.0, 1000.0).unwrap());
}
