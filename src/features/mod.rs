// features/mod.rs - geological features and the contract they fold under
//
// A feature is one entry of "Surface objects". It is default-constructed by
// the registry, declares the entries it understands under its own path,
// reads them, and from then on only answers queries.
//
// Fold contract: `temperature` and `composition` receive the value produced
// by every feature declared before this one (or the background) and return
// it untouched for points outside their footprint. Inside, the configured
// sub-model decides.

mod geometry;
mod plate;
mod submodels;
mod subduction_zone;

pub use geometry::{distance_to_segment, polygon_contains};
pub use plate::{Plate, PlateKind};
pub use submodels::{CompositionModel, TemperatureModel};
pub use subduction_zone::SubductionZone;

use crate::coordinate_systems::{wrap_longitude, CoordinateSystemKind};
use crate::error::{Result, WorldBuilderError};
use crate::point::Point;
use crate::schema::{join_path, Parameters, Type};
use serde_json::Value as Json;
use std::f64::consts::TAU;
use std::fmt;

pub const CONTINENTAL_PLATE: &str = "ContinentalPlate";
pub const OCEANIC_PLATE: &str = "OceanicPlate";
pub const SUBDUCTION_ZONE: &str = "SubductionZone";

/// Global entry naming the coordinate system; features consult it to know
/// how their surface coordinates are expressed.
pub const COORDINATE_SYSTEM_PATH: &str = "Coordinate system";

pub trait Feature: Send + Sync + fmt::Debug {
    /// Registry name of this feature type.
    fn type_name(&self) -> &'static str;

    /// Node name from the document (e.g. `ContinentalPlate_1`).
    fn name(&self) -> &str;

    /// Declare every entry this feature understands, scoped under `path`.
    fn declare_entries(&self, prm: &mut Parameters, path: &str) -> Result<()>;

    /// Load the declared entries and the sub-model entries.
    fn read(&mut self, prm: &mut Parameters, node: &Json, path: &str) -> Result<()>;

    /// Fold step for temperature. `position` is in natural coordinates.
    fn temperature(
        &self,
        position: &Point<3>,
        depth: f64,
        gravity: f64,
        temperature: f64,
    ) -> f64;

    /// Fold step for the composition indicator `composition_number`.
    fn composition(
        &self,
        position: &Point<3>,
        depth: f64,
        composition_number: u32,
        composition: bool,
    ) -> bool;
}

pub(crate) fn create_continental_plate() -> Box<dyn Feature> {
    Box::new(Plate::new(PlateKind::Continental))
}

pub(crate) fn create_oceanic_plate() -> Box<dyn Feature> {
    Box::new(Plate::new(PlateKind::Oceanic))
}

pub(crate) fn create_subduction_zone() -> Box<dyn Feature> {
    Box::new(SubductionZone::default())
}

// ── Shared entry handling ───────────────────────────────────────────

pub(crate) const COORDINATES: &str = "Coordinates";
pub(crate) const TEMPERATURE_SUBMODULE: &str = "Temperature submodule";
pub(crate) const COMPOSITION_SUBMODULE: &str = "Composition submodule";

/// Declarations every feature shares.
pub(crate) fn declare_common_entries(prm: &mut Parameters, path: &str) -> Result<()> {
    prm.declare(
        &join_path(path, COORDINATES),
        true,
        Type::array(
            Type::point2(Point::zero(), "A point on the surface."),
            "The surface coordinates outlining the feature.",
        ),
    )?;
    submodels::declare_model_names(prm, path)
}

/// Surface coordinates of a feature, in the units the fold sees: radians
/// for spherical worlds (the document gives degrees), as-is otherwise.
///
/// Spherical outlines are made continuous in longitude: the first vertex is
/// wrapped onto [-π, π) and every later vertex is placed within π of the one
/// before it, so an outline crossing the antimeridian may run past ±π.
pub(crate) fn read_coordinates(
    prm: &mut Parameters,
    path: &str,
    minimum: usize,
) -> Result<Vec<Point<2>>> {
    let coordinates_path = join_path(path, COORDINATES);
    prm.load_entry(&coordinates_path)?;
    let points = prm.get_array_points::<2>(&coordinates_path)?;
    if points.len() < minimum {
        return Err(WorldBuilderError::config(
            &coordinates_path,
            format!(
                "needs at least {minimum} points, but {} were given",
                points.len()
            ),
        ));
    }

    if surface_frame(prm)? == CoordinateSystemKind::Cartesian {
        return Ok(points);
    }
    let mut previous: Option<f64> = None;
    Ok(points
        .into_iter()
        .map(|p| {
            let longitude = p[0].to_radians();
            let longitude = match previous {
                Some(last) => last + wrap_longitude(longitude - last),
                None => wrap_longitude(longitude),
            };
            previous = Some(longitude);
            Point::with_coordinate_system(
                [longitude, p[1].to_radians()],
                CoordinateSystemKind::Spherical,
            )
        })
        .collect())
}

/// Surface coordinates to test a query against. On a sphere the longitude is
/// also tried one turn east and west, matching outlines that run past ±π.
pub(crate) fn surface_candidates(position: &Point<3>) -> impl Iterator<Item = Point<2>> {
    let surface = position.surface();
    let shifts: &'static [f64] = match position.coordinate_system() {
        CoordinateSystemKind::Spherical => &[0.0, TAU, -TAU],
        CoordinateSystemKind::Cartesian => &[0.0],
    };
    shifts.iter().map(move |shift| {
        let mut candidate = surface;
        candidate[0] += shift;
        candidate
    })
}

/// Frame of the surface coordinates, from the global coordinate system entry.
/// A store without that entry (a feature parsed on its own) is Cartesian.
pub(crate) fn surface_frame(prm: &Parameters) -> Result<CoordinateSystemKind> {
    if !prm.is_declared(COORDINATE_SYSTEM_PATH) {
        return Ok(CoordinateSystemKind::Cartesian);
    }
    let name = prm.get_coordinate_system(COORDINATE_SYSTEM_PATH)?;
    Ok(prm
        .registry()
        .create_coordinate_system(name)?
        .natural_coordinate_system())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use serde_json::json;
    use std::sync::Arc;

    fn spherical_outline(coordinates: Json) -> Vec<Point<2>> {
        let path = "Surface objects/OceanicPlate";
        let doc = json!({
            "Coordinate system": "spherical",
            "Surface objects": {"OceanicPlate": {"Coordinates": coordinates}},
        });
        let mut prm = Parameters::new(doc, Arc::new(Registry::with_builtins()));
        prm.declare_and_load(
            COORDINATE_SYSTEM_PATH,
            false,
            Type::coordinate_system("cartesian", ""),
        )
        .unwrap();
        declare_common_entries(&mut prm, path).unwrap();
        read_coordinates(&mut prm, path, 1).unwrap()
    }

    #[test]
    fn outlines_stay_continuous_across_the_antimeridian() {
        let outline = spherical_outline(json!([[175, -5], [195, -5], [195, 5], [175, 5]]));
        let longitudes: Vec<f64> = outline.iter().map(|p| p[0].to_degrees()).collect();
        for (got, expected) in longitudes.iter().zip([175.0, 195.0, 195.0, 175.0]) {
            assert!((got - expected).abs() < 1e-9, "{longitudes:?}");
        }

        // Same outline written with negative longitudes.
        let outline = spherical_outline(json!([[175, -5], [-165, -5], [-165, 5], [175, 5]]));
        assert!((outline[1][0].to_degrees() - 195.0).abs() < 1e-9);
    }

    #[test]
    fn first_vertex_is_wrapped() {
        let outline = spherical_outline(json!([[350, 0], [370, 0]]));
        assert!((outline[0][0].to_degrees() + 10.0).abs() < 1e-9);
        assert!((outline[1][0].to_degrees() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn candidates_shift_longitude_on_a_sphere_only() {
        let cartesian = Point::new([1.0, 2.0, 3.0]);
        assert_eq!(surface_candidates(&cartesian).count(), 1);

        let spherical =
            Point::with_coordinate_system([6371e3, -3.0, 0.1], CoordinateSystemKind::Spherical);
        let longitudes: Vec<f64> = surface_candidates(&spherical).map(|p| p[0]).collect();
        assert_eq!(longitudes, vec![-3.0, -3.0 + TAU, -3.0 - TAU]);
    }
}
