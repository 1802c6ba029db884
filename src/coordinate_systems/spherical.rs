use super::{wrap_longitude, CoordinateSystem, CoordinateSystemKind};
use crate::point::Point;

/// Spherical geometry. Natural coordinates are (radius, longitude,
/// latitude) in radians, longitude in [-π, π).
#[derive(Debug, Clone, Copy, Default)]
pub struct Spherical;

impl CoordinateSystem for Spherical {
    fn natural_coordinate_system(&self) -> CoordinateSystemKind {
        CoordinateSystemKind::Spherical
    }

    fn cartesian_to_natural_coordinates(&self, position: Point<3>) -> Point<3> {
        let [x, y, z] = position.coordinates();
        let horizontal = x.hypot(y);
        let radius = horizontal.hypot(z);
        if radius == 0.0 {
            return Point::with_coordinate_system([0.0; 3], CoordinateSystemKind::Spherical);
        }

        // atan2 yields (-π, π]; fold π onto -π.
        let longitude = wrap_longitude(y.atan2(x));
        // atan2 on (z, horizontal) stays well conditioned at the poles,
        // where asin(z / r) loses precision.
        let latitude = z.atan2(horizontal);

        Point::with_coordinate_system(
            [radius, longitude, latitude],
            CoordinateSystemKind::Spherical,
        )
    }

    fn natural_to_cartesian_coordinates(&self, position: Point<3>) -> Point<3> {
        let [radius, longitude, latitude] = position.coordinates();
        let (sin_lat, cos_lat) = latitude.sin_cos();
        let (sin_lon, cos_lon) = longitude.sin_cos();
        Point::new([
            radius * cos_lat * cos_lon,
            radius * cos_lat * sin_lon,
            radius * sin_lat,
        ])
    }
}
