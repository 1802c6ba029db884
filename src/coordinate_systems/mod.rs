// coordinate_systems/mod.rs - geometry models and their natural frames
//
// Features reason about positions in the natural frame of the active
// geometry model (x/y/z for a box, radius/longitude/latitude for a sphere).
// Queries arrive in Cartesian coordinates, so the World runs every query
// point through the active coordinate system once before the fold.

mod cartesian;
mod spherical;

pub use cartesian::Cartesian;
pub use spherical::Spherical;

use crate::point::Point;
use std::f64::consts::{PI, TAU};
use std::fmt;

/// The natural frame a coordinate system works in. Also used as the tag
/// carried by every [`Point`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CoordinateSystemKind {
    #[default]
    Cartesian,
    Spherical,
}

impl CoordinateSystemKind {
    pub fn name(&self) -> &'static str {
        match self {
            CoordinateSystemKind::Cartesian => "cartesian",
            CoordinateSystemKind::Spherical => "spherical",
        }
    }
}

impl fmt::Display for CoordinateSystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A geometry model. Implementations are stateless conversion objects;
/// the two conversions must be inverses of each other for finite input.
pub trait CoordinateSystem: Send + Sync + fmt::Debug {
    /// Which natural frame this geometry model uses.
    fn natural_coordinate_system(&self) -> CoordinateSystemKind;

    /// Cartesian (x, y, z) into the natural frame.
    fn cartesian_to_natural_coordinates(&self, position: Point<3>) -> Point<3>;

    /// Undo [`CoordinateSystem::cartesian_to_natural_coordinates`].
    fn natural_to_cartesian_coordinates(&self, position: Point<3>) -> Point<3>;
}

/// Bring a longitude in radians onto [-π, π).
pub fn wrap_longitude(longitude: f64) -> f64 {
    let wrapped = (longitude + PI).rem_euclid(TAU) - PI;
    // rem_euclid may round up to TAU for inputs just below -π.
    if wrapped >= PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Constructor stored in the registry.
pub type CoordinateSystemFactory = fn() -> Box<dyn CoordinateSystem>;

pub(crate) fn create_cartesian() -> Box<dyn CoordinateSystem> {
    Box::new(Cartesian)
}

pub(crate) fn create_spherical() -> Box<dyn CoordinateSystem> {
    Box::new(Spherical)
}
