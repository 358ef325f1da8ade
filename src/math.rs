use nalgebra as na;
use num_traits::Float;

/// Folds a rotated-rectangle angle (in degrees) into (-45, 45].
///
/// Minimum-area rectangle fitting is ambiguous modulo 90 degrees: the same box
/// may be reported as 0 or -90 (or 90, depending on the fitting convention).
pub fn fold_angle<T: Float>(raw: T) -> T {
    let quarter = T::from(90.0).unwrap_or_else(T::zero);
    let half_quarter = T::from(45.0).unwrap_or_else(T::zero);

    if !raw.is_finite() {
        return T::zero();
    }

    let mut angle = raw % quarter;

    if angle <= -half_quarter {
        angle = angle + quarter;
    } else if angle > half_quarter {
        angle = angle - quarter;
    }

    angle
}

/// `|a - b| / max(|a|, |b|)`, zero when both are zero.
pub fn relative_difference<T: Float>(a: T, b: T) -> T {
    let denom = a.abs().max(b.abs());

    if denom <= T::epsilon() {
        T::zero()
    } else {
        (a - b).abs() / denom
    }
}

/// Rectangle polygon inset from the frame border by `margin` of each dimension.
pub fn inset_bounds(dims: (u32, u32), margin: f32) -> Vec<na::Point2<f32>> {
    let (fw, fh) = (dims.0 as f32, dims.1 as f32);
    let (mx, my) = (fw * margin, fh * margin);

    vec![
        na::Point2::new(mx, my),
        na::Point2::new(fw - mx, my),
        na::Point2::new(fw - mx, fh - my),
        na::Point2::new(mx, fh - my),
    ]
}

/// Ray casting point-in-polygon test.
pub fn in_bounds(p: na::Point2<f32>, poly: &[na::Point2<f32>]) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut p1 = poly[0];
    let mut xints = 0.0;

    for i in 1..=n {
        let p2 = poly[i % n];

        if p.y > f32::min(p1.y, p2.y) && p.y <= f32::max(p1.y, p2.y) && p.x <= f32::max(p1.x, p2.x)
        {
            if (p1.y - p2.y).abs() > f32::EPSILON {
                xints = (p.y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y) + p1.x;
            }

            if (p1.x - p2.x).abs() < f32::EPSILON || p.x <= xints {
                inside = !inside;
            }
        }

        p1 = p2;
    }

    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_angle_into_half_open_range() {
        assert_eq!(fold_angle(-90.0f32), 0.0);
        assert_eq!(fold_angle(-60.0f32), 30.0);
        assert_eq!(fold_angle(-45.0f32), 45.0);
        assert_eq!(fold_angle(-10.0f32), -10.0);
        assert_eq!(fold_angle(45.0f32), 45.0);
        assert_eq!(fold_angle(80.0f32), -10.0);
        assert_eq!(fold_angle(90.0f32), 0.0);
        assert_eq!(fold_angle(f32::NAN), 0.0);
    }

    #[test]
    fn relative_difference_uses_larger_magnitude() {
        assert_eq!(relative_difference(100.0f32, 60.0), 0.4);
        assert_eq!(relative_difference(60.0f32, 100.0), 0.4);
        assert_eq!(relative_difference(0.0f32, 0.0), 0.0);
    }

    #[test]
    fn inset_rectangle_excludes_border() {
        let poly = inset_bounds((100, 50), 0.2);

        assert!(in_bounds(na::Point2::new(50.0, 25.0), &poly));
        assert!(in_bounds(na::Point2::new(21.0, 11.0), &poly));
        assert!(!in_bounds(na::Point2::new(19.0, 25.0), &poly));
        assert!(!in_bounds(na::Point2::new(50.0, 45.0), &poly));
        assert!(!in_bounds(na::Point2::new(85.0, 5.0), &poly));
    }

    #[test]
    fn degenerate_polygon_contains_nothing() {
        assert!(!in_bounds(na::Point2::new(0.0, 0.0), &[]));
    }
}
