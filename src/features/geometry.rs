// features/geometry.rs - planar footprint tests on surface coordinates

use crate::point::Point;

/// Even-odd ray casting. Points exactly on an edge may land either side.
pub fn polygon_contains(polygon: &[Point<2>], point: &Point<2>) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let (px, py) = (point[0], point[1]);
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (xi, yi) = (polygon[i][0], polygon[i][1]);
        let (xj, yj) = (polygon[j][0], polygon[j][1]);
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Distance from `point` to the segment `a`-`b`, and the signed side:
/// positive when `point` lies to the left of the direction `a` → `b`.
pub fn distance_to_segment(a: &Point<2>, b: &Point<2>, point: &Point<2>) -> (f64, f64) {
    let ab = *b - *a;
    let ap = *point - *a;
    let length_square = ab.norm_square();
    let t = if length_square > 0.0 {
        (ap.dot(&ab) / length_square).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let closest = *a + ab * t;
    (point.distance(&closest), ab.cross(&ap))
}
