//! Deterministic grid packing of occupant markers inside a zone rectangle.

use crate::geometry::{Point, Rect};

/// Column/row split for `n` markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub cols: usize,
    pub rows: usize,
}

impl Grid {
    pub fn for_count(n: usize) -> Self {
        if n == 0 {
            return Self { cols: 0, rows: 0 };
        }
        let cols = ceil_sqrt(n).max(1);
        Self {
            cols,
            rows: n.div_ceil(cols),
        }
    }
}

fn ceil_sqrt(n: usize) -> usize {
    let mut root = (n as f64).sqrt() as usize;
    while root * root < n {
        root += 1;
    }
    while root > 0 && (root - 1) * (root - 1) >= n {
        root -= 1;
    }
    root
}

/// Distance between neighbouring slot centers along each axis.
pub fn slot_spacing(n: usize, rect: Rect) -> Option<(f32, f32)> {
    let grid = Grid::for_count(n);
    if n == 0 {
        return None;
    }
    Some((
        rect.width / (grid.cols + 1) as f32,
        rect.height / (grid.rows + 1) as f32,
    ))
}

/// One slot per index in `0..n`, in input order. Slots sit on the interior
/// points of a `(cols + 1) x (rows + 1)` division so none touches the border.
pub fn pack(n: usize, rect: Rect) -> Vec<Point> {
    let Some((step_x, step_y)) = slot_spacing(n, rect) else {
        return Vec::new();
    };
    let cols = Grid::for_count(n).cols;

    (0..n)
        .map(|i| {
            let col = i % cols;
            let row = i / cols;
            Point::new(
                rect.x + step_x * (col + 1) as f32,
                rect.y + step_y * (row + 1) as f32,
            )
        })
        .collect()
}

/// Marker radius that keeps neighbouring slots from touching. Dense zones
/// get smaller markers; the radius is never larger than 0.4 of the tighter
/// slot spacing.
pub fn marker_radius(n: usize, rect: Rect, preferred: f32) -> f32 {
    match slot_spacing(n, rect) {
        Some((step_x, step_y)) => preferred.min(step_x.min(step_y) * 0.4).max(0.0),
        None => preferred,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_zone_emits_nothing() {
        assert!(pack(0, Rect::new(0.0, 0.0, 10.0, 10.0)).is_empty());
        assert!(pack(0, Rect::new(0.0, 0.0, 0.0, 0.0)).is_empty());
    }

    #[test]
    fn single_marker_sits_in_center() {
        let slots = pack(1, Rect::new(10.0, 20.0, 40.0, 60.0));
        assert_eq!(slots, vec![Point::new(30.0, 50.0)]);
    }

    #[test]
    fn five_markers_use_three_columns() {
        assert_eq!(Grid::for_count(5), Grid { cols: 3, rows: 2 });
        let slots = pack(5, Rect::new(0.0, 0.0, 40.0, 30.0));
        assert_eq!(slots[0], Point::new(10.0, 10.0));
        assert_eq!(slots[2], Point::new(30.0, 10.0));
        assert_eq!(slots[3], Point::new(10.0, 20.0));
    }

    #[test]
    fn ceil_sqrt_matches_float_math() {
        for n in 1..2000usize {
            assert_eq!(ceil_sqrt(n), (n as f64).sqrt().ceil() as usize, "n = {n}");
        }
    }

    #[test]
    fn repeated_calls_reproduce_slots() {
        let rect = Rect::new(3.0, 7.0, 91.0, 37.0);
        assert_eq!(pack(17, rect), pack(17, rect));
    }

    #[test]
    fn crowded_small_zone_shrinks_markers() {
        // 100 people in a 4 m² zone at the default size factors
        let rect = Rect::new(0.0, 0.0, 12.0, 8.0);
        let slots = pack(100, rect);
        let radius = marker_radius(100, rect, 3.0);
        let closest = slots
            .iter()
            .enumerate()
            .flat_map(|(i, a)| slots[i + 1..].iter().map(move |b| a.offset_from(*b)))
            .map(|d| (d.x * d.x + d.y * d.y).sqrt())
            .fold(f32::INFINITY, f32::min);
        assert!(radius > 0.0);
        assert!(radius * 2.0 < closest, "radius {radius} vs spacing {closest}");
    }

    proptest! {
        #[test]
        fn markers_never_reach_neighbouring_slots(
            n in 1usize..600,
            w in 1.0f32..800.0,
            h in 1.0f32..800.0,
            preferred in 0.5f32..20.0,
        ) {
            let rect = Rect::new(0.0, 0.0, w, h);
            let (step_x, step_y) = slot_spacing(n, rect).expect("non-empty");
            let radius = marker_radius(n, rect, preferred);
            prop_assert!(radius >= 0.0);
            prop_assert!(radius <= preferred);
            prop_assert!(2.0 * radius <= step_x.min(step_y));
        }

        #[test]
        fn every_slot_is_unique_and_inside(
            n in 0usize..300,
            x in -500.0f32..500.0,
            y in -500.0f32..500.0,
            w in 1.0f32..800.0,
            h in 1.0f32..800.0,
        ) {
            let rect = Rect::new(x, y, w, h);
            let slots = pack(n, rect);
            prop_assert_eq!(slots.len(), n);
            if n > 0 {
                prop_assert_eq!(Grid::for_count(n).cols, (n as f64).sqrt().ceil() as usize);
            }
            for p in &slots {
                prop_assert!(rect.contains_strictly(*p));
            }
            for i in 0..slots.len() {
                for j in (i + 1)..slots.len() {
                    prop_assert!(slots[i] != slots[j]);
                }
            }
        }
    }
}
