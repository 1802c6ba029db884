use super::{CoordinateSystem, CoordinateSystemKind};
use crate::point::Point;

/// Box geometry. Does nothing to coordinates but gives box models the same
/// interface as every other geometry model.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cartesian;

impl CoordinateSystem for Cartesian {
    fn natural_coordinate_system(&self) -> CoordinateSystemKind {
        CoordinateSystemKind::Cartesian
    }

    fn cartesian_to_natural_coordinates(&self, position: Point<3>) -> Point<3> {
        Point::with_coordinate_system(position.coordinates(), CoordinateSystemKind::Cartesian)
    }

    fn natural_to_cartesian_coordinates(&self, position: Point<3>) -> Point<3> {
        Point::with_coordinate_system(position.coordinates(), CoordinateSystemKind::Cartesian)
    }
}
