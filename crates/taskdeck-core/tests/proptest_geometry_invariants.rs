//! Property-based invariant tests for board geometry.
//!
//! 1. Intersection is commutative and contained in both operands
//! 2. Overlap area never exceeds either operand's area
//! 3. Containment respects the half-open edge convention
//! 4. Translation preserves extent and center distance

use proptest::prelude::*;
use taskdeck_core::geometry::{Point, Rect};

fn rect_strategy() -> impl Strategy<Value = Rect> {
    (-500i32..500, -500i32..500, 0u32..300, 0u32..300)
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn point_strategy() -> impl Strategy<Value = Point> {
    (-600i32..600, -600i32..600).prop_map(|(x, y)| Point::new(x, y))
}

proptest! {
    #[test]
    fn intersection_is_commutative(a in rect_strategy(), b in rect_strategy()) {
        prop_assert_eq!(a.intersection_opt(&b), b.intersection_opt(&a));
    }

    #[test]
    fn intersection_within_both(a in rect_strategy(), b in rect_strategy()) {
        if let Some(i) = a.intersection_opt(&b) {
            prop_assert!(!i.is_empty());
            prop_assert!(i.x >= a.x && i.x >= b.x);
            prop_assert!(i.y >= a.y && i.y >= b.y);
            prop_assert!(i.right() <= a.right() && i.right() <= b.right());
            prop_assert!(i.bottom() <= a.bottom() && i.bottom() <= b.bottom());
        }
    }

    #[test]
    fn overlap_bounded_by_area(a in rect_strategy(), b in rect_strategy()) {
        let overlap = a.overlap_area(&b);
        prop_assert!(overlap <= a.area());
        prop_assert!(overlap <= b.area());
    }

    #[test]
    fn contained_points_lie_in_intersection(a in rect_strategy(), b in rect_strategy(), p in point_strategy()) {
        if a.contains(p) && b.contains(p) {
            let i = a.intersection_opt(&b);
            prop_assert!(i.is_some());
            prop_assert!(i.unwrap().contains(p));
        }
    }

    #[test]
    fn empty_rect_contains_nothing(x in -500i32..500, y in -500i32..500, h in 0u32..50, p in point_strategy()) {
        prop_assert!(!Rect::new(x, y, 0, h).contains(p));
    }

    #[test]
    fn translation_preserves_shape(a in rect_strategy(), b in rect_strategy(), dx in -100i32..100, dy in -100i32..100) {
        let ta = a.translate(dx, dy);
        let tb = b.translate(dx, dy);
        prop_assert_eq!(ta.width, a.width);
        prop_assert_eq!(ta.height, a.height);
        prop_assert!((ta.center_distance(&tb) - a.center_distance(&b)).abs() < 1e-9);
    }
}
