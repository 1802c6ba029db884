// world/mod.rs - the composition engine
//
// A `World` declares the global schema, parses a document into its
// `Parameters` (constructing every feature on the way) and from then on
// answers temperature and composition queries by folding the features in
// declaration order:
//
//   query (Cartesian, 2-D or 3-D)
//     → lift to 3-D along the cross section (2-D worlds only)
//     → convert to the natural frame of the coordinate system
//     → undo the surface rotation
//     → background value, then every surface object in turn
//
// Nothing is mutated after construction, so a `World` can be shared between
// threads and queried concurrently.

mod cache;
mod section;

pub use cache::{hash_section_request, SectionCache};
pub use section::{
    evaluate_composition_section, evaluate_temperature_section, CompositionSectionResult,
    SectionRequest, SectionResult,
};

use crate::coordinate_systems::{wrap_longitude, CoordinateSystem, CoordinateSystemKind};
use crate::error::{Result, WorldBuilderError};
use crate::features::{surface_frame, Feature, COORDINATE_SYSTEM_PATH};
use crate::point::Point;
use crate::registry::Registry;
use crate::schema::{IndexList, Parameters, Type};
use serde_json::Value as Json;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::info;

pub const POTENTIAL_MANTLE_TEMPERATURE: &str = "Potential mantle temperature";
pub const THERMAL_EXPANSION_COEFFICIENT: &str = "Thermal expansion coefficient alpha";
pub const SPECIFIC_HEAT: &str = "specific heat Cp";
pub const SURFACE_ROTATION_ANGLE: &str = "Surface rotation angle";
pub const SURFACE_ROTATION_POINT: &str = "Surface rotation point";
pub const CROSS_SECTION: &str = "Cross section";
pub const SURFACE_OBJECTS: &str = "Surface objects";
/// Derived entry holding the unit direction of the cross section.
pub const SURFACE_COORDINATE_CONVERSIONS: &str = "Surface coordinate conversions";

/// Line along which 2-D queries are taken. Only Cartesian worlds have one.
///
/// `direction` points from the first "Cross section" point to the second,
/// so `along = 0` is the first point and `along` grows towards the second.
/// Input files that assume the opposite sign (first minus second) get
/// sections mirrored about the first point; swap the two points for those.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossSection {
    pub origin: Point<2>,
    /// Unit length.
    pub direction: Point<2>,
}

impl CrossSection {
    /// `(along, z)` → `(origin + along * direction, z)`.
    pub fn lift(&self, point: &Point<2>) -> Point<3> {
        let surface = self.origin + self.direction * point[0];
        Point::new([surface[0], surface[1], point[1]])
    }
}

pub struct World {
    parameters: Parameters,
    coordinate_system: Box<dyn CoordinateSystem>,
    cross_section: Option<CrossSection>,

    potential_mantle_temperature: f64,
    thermal_expansion_coefficient: f64,
    specific_heat: f64,
    /// Radians.
    surface_rotation_angle: f64,
    /// In the surface frame of the coordinate system.
    surface_rotation_point: Point<2>,

    /// Feature-table indices of "Surface objects", in declaration order.
    surface_objects: IndexList,

    /// Hash of the source document.
    fingerprint: u64,
}

impl World {
    /// Build a world with the built-in registry.
    pub fn new(document: Json) -> Result<Self> {
        Self::with_registry(document, Registry::global())
    }

    pub fn from_json_str(document: &str) -> Result<Self> {
        Self::new(serde_json::from_str(document)?)
    }

    /// Build a world whose features and coordinate systems come from
    /// `registry`.
    pub fn with_registry(document: Json, registry: Arc<Registry>) -> Result<Self> {
        let fingerprint = document_fingerprint(&document);
        let mut parameters = Parameters::new(document, registry);
        Self::declare_and_parse(&mut parameters)?;

        let coordinate_system = parameters
            .registry()
            .create_coordinate_system(parameters.get_coordinate_system(COORDINATE_SYSTEM_PATH)?)?;
        let frame = coordinate_system.natural_coordinate_system();

        let cross_section = if parameters.is_declared(SURFACE_COORDINATE_CONVERSIONS) {
            let origin = parameters
                .get_array_points::<2>(CROSS_SECTION)?
                .first()
                .copied()
                .ok_or_else(|| WorldBuilderError::internal(CROSS_SECTION, "no origin point"))?;
            Some(CrossSection {
                origin,
                direction: parameters.get_point::<2>(SURFACE_COORDINATE_CONVERSIONS)?,
            })
        } else {
            None
        };

        let rotation_point = parameters.get_point::<2>(SURFACE_ROTATION_POINT)?;
        let surface_rotation_point = match frame {
            CoordinateSystemKind::Spherical => Point::with_coordinate_system(
                [
                    wrap_longitude(rotation_point[0].to_radians()),
                    rotation_point[1].to_radians(),
                ],
                frame,
            ),
            CoordinateSystemKind::Cartesian => rotation_point,
        };

        let world = World {
            potential_mantle_temperature: parameters.get_double(POTENTIAL_MANTLE_TEMPERATURE)?,
            thermal_expansion_coefficient: parameters.get_double(THERMAL_EXPANSION_COEFFICIENT)?,
            specific_heat: parameters.get_double(SPECIFIC_HEAT)?,
            surface_rotation_angle: parameters.get_double(SURFACE_ROTATION_ANGLE)?.to_radians(),
            surface_rotation_point,
            surface_objects: parameters.get_feature_indices(SURFACE_OBJECTS)?,
            fingerprint,
            cross_section,
            coordinate_system,
            parameters,
        };
        info!(
            dim = world.dim(),
            coordinate_system = %frame,
            features = world.surface_objects.len(),
            "world built"
        );
        Ok(world)
    }

    /// Declare and load every global entry. Loading "Surface objects"
    /// constructs the features, which read the already loaded coordinate
    /// system.
    pub fn declare_and_parse(prm: &mut Parameters) -> Result<()> {
        prm.declare_and_load(
            POTENTIAL_MANTLE_TEMPERATURE,
            false,
            Type::double(1600.0, "Potential temperature of the mantle in K."),
        )?;
        prm.declare_and_load(
            THERMAL_EXPANSION_COEFFICIENT,
            false,
            Type::double(3.5e-5, "Thermal expansion coefficient in 1/K."),
        )?;
        prm.declare_and_load(
            SPECIFIC_HEAT,
            false,
            Type::double(1250.0, "Specific heat in J/(kg K)."),
        )?;
        prm.declare_and_load(
            SURFACE_ROTATION_ANGLE,
            false,
            Type::double(
                0.0,
                "Counter-clockwise rotation of every feature about the surface rotation point, \
                 in degrees.",
            ),
        )?;
        prm.declare_and_load(
            SURFACE_ROTATION_POINT,
            false,
            Type::point2(Point::zero(), "Centre of the surface rotation."),
        )?;
        prm.declare_and_load(
            COORDINATE_SYSTEM_PATH,
            false,
            Type::coordinate_system("cartesian", "Geometry model of the world."),
        )?;

        let configured = prm.declare_and_load(
            CROSS_SECTION,
            false,
            Type::array(
                Type::point2(Point::zero(), "A point on the surface."),
                "Two surface points; when present, queries are 2-D along this line.",
            ),
        )?;
        if configured {
            let frame = surface_frame(prm)?;
            if frame != CoordinateSystemKind::Cartesian {
                return Err(WorldBuilderError::config(
                    CROSS_SECTION,
                    format!("cross sections need a cartesian world, not {frame}"),
                ));
            }
            let points = prm.get_array_points::<2>(CROSS_SECTION)?;
            if points.len() != 2 {
                return Err(WorldBuilderError::config(
                    CROSS_SECTION,
                    format!("expected exactly 2 points, but {} were given", points.len()),
                ));
            }
            let delta = points[1] - points[0];
            let length = delta.norm();
            if length == 0.0 {
                return Err(WorldBuilderError::config(
                    CROSS_SECTION,
                    "the two points coincide",
                ));
            }
            prm.set_entry(
                SURFACE_COORDINATE_CONVERSIONS,
                Type::point2(delta * (1.0 / length), "Unit direction of the cross section."),
            )?;
        }

        prm.declare_and_load(
            SURFACE_OBJECTS,
            true,
            Type::list(
                Type::feature("A geological feature."),
                "Features making up the world, applied in order.",
            ),
        )?;
        Ok(())
    }

    /// 2 when a cross section is configured, 3 otherwise.
    pub fn dim(&self) -> usize {
        if self.cross_section.is_some() {
            2
        } else {
            3
        }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn coordinate_system(&self) -> &dyn CoordinateSystem {
        self.coordinate_system.as_ref()
    }

    pub fn cross_section(&self) -> Option<&CrossSection> {
        self.cross_section.as_ref()
    }

    /// Identifies the document this world was built from. Equal documents,
    /// keys in the same order, give equal fingerprints.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Surface objects in fold order.
    pub fn features(&self) -> impl Iterator<Item = &dyn Feature> + '_ {
        let all = self.parameters.features();
        self.surface_objects
            .iter()
            .map(move |&i| all[i as usize].as_ref())
    }

    /// Adiabatic background the temperature fold starts from.
    pub fn background_temperature(&self, depth: f64, gravity_norm: f64) -> f64 {
        let tp = self.potential_mantle_temperature;
        tp + ((tp * self.thermal_expansion_coefficient * gravity_norm) / self.specific_heat
            * 1000.0)
            * (depth / 1000.0)
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Temperature at a Cartesian `point`: 2-D `(along, z)` on a cross-section
    /// world, 3-D `(x, y, z)` otherwise.
    pub fn temperature<const DIM: usize>(
        &self,
        point: Point<DIM>,
        depth: f64,
        gravity_norm: f64,
    ) -> Result<f64> {
        let position = self.natural_position(point)?;
        let background = self.background_temperature(depth, gravity_norm);
        Ok(self.features().fold(background, |temperature, feature| {
            feature.temperature(&position, depth, gravity_norm, temperature)
        }))
    }

    /// Whether composition `composition_number` is present at `point`.
    pub fn composition<const DIM: usize>(
        &self,
        point: Point<DIM>,
        depth: f64,
        composition_number: u32,
    ) -> Result<bool> {
        let position = self.natural_position(point)?;
        Ok(self.features().fold(false, |composition, feature| {
            feature.composition(&position, depth, composition_number, composition)
        }))
    }

    fn natural_position<const DIM: usize>(&self, point: Point<DIM>) -> Result<Point<3>> {
        let cartesian = self.lift(point)?;
        let natural = self
            .coordinate_system
            .cartesian_to_natural_coordinates(cartesian);
        if self.surface_rotation_angle == 0.0 {
            return Ok(natural);
        }
        let surface = natural
            .surface()
            .rotate_around(&self.surface_rotation_point, -self.surface_rotation_angle);
        Ok(natural.with_surface(surface))
    }

    fn lift<const DIM: usize>(&self, point: Point<DIM>) -> Result<Point<3>> {
        match (DIM, &self.cross_section) {
            (2, Some(section)) => Ok(section.lift(&Point::new([point[0], point[1]]))),
            (3, None) => Ok(Point::new([point[0], point[1], point[2]])),
            (2, None) => Err(WorldBuilderError::ModeError {
                message: "2-D query on a 3-D world: cross section not configured".to_string(),
            }),
            (3, Some(_)) => Err(WorldBuilderError::ModeError {
                message: "3-D query on a cross-section world: queries must be 2-D".to_string(),
            }),
            (dim, _) => Err(WorldBuilderError::ModeError {
                message: format!("queries are 2-D or 3-D, got {dim}-D"),
            }),
        }
    }
}

fn document_fingerprint(document: &Json) -> u64 {
    let mut hasher = DefaultHasher::new();
    document.to_string().hash(&mut hasher);
    hasher.finish()
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("dim", &self.dim())
            .field("coordinate_system", &self.coordinate_system)
            .field("cross_section", &self.cross_section)
            .field("features", &self.surface_objects.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Json {
        json!([[x0, y0], [x1, y0], [x1, y1], [x0, y1]])
    }

    fn constant_plate(coordinates: Json, temperature: f64, composition: u32) -> Json {
        json!({
            "Coordinates": coordinates,
            "Temperature submodule": {"name": "constant", "Temperature": temperature},
            "Composition submodule": {"name": "constant", "Compositions": [composition]},
        })
    }

    #[test]
    fn empty_world_is_adiabatic() {
        let world = World::new(json!({"Surface objects": {}})).unwrap();
        assert_eq!(world.dim(), 3);
        let p = Point::new([0.0, 0.0, 0.0]);
        assert_eq!(world.temperature(p, 0.0, 9.81).unwrap(), 1600.0);

        let expected = 1600.0 + 1600.0 * 3.5e-5 * 9.81 / 1250.0 * 1000.0;
        let t = world.temperature(p, 1000.0, 9.81).unwrap();
        assert!((t - expected).abs() < 1e-9, "got {t}");
        assert!((t - 1600.4396).abs() < 1e-3);
        assert!(!world.composition(p, 1000.0, 0).unwrap());
    }

    #[test]
    fn surface_objects_are_required() {
        assert!(matches!(
            World::new(json!({})),
            Err(WorldBuilderError::MissingEntry { .. })
        ));
    }

    #[test]
    fn later_features_take_precedence() {
        let world = World::new(json!({
            "Surface objects": {
                "ContinentalPlate_1": constant_plate(square(0.0, 0.0, 100.0, 100.0), 10.0, 1),
                "OceanicPlate_1": constant_plate(square(50.0, 0.0, 150.0, 100.0), 20.0, 2),
            }
        }))
        .unwrap();

        let overlap = Point::new([75.0, 50.0, 0.0]);
        assert_eq!(world.temperature(overlap, 10.0, 9.81).unwrap(), 20.0);
        assert!(world.composition(overlap, 10.0, 2).unwrap());
        assert!(!world.composition(overlap, 10.0, 1).unwrap());

        let only_first = Point::new([25.0, 50.0, 0.0]);
        assert_eq!(world.temperature(only_first, 10.0, 9.81).unwrap(), 10.0);
        assert!(world.composition(only_first, 10.0, 1).unwrap());

        let outside = Point::new([500.0, 50.0, 0.0]);
        assert_eq!(world.temperature(outside, 0.0, 9.81).unwrap(), 1600.0);
    }

    #[test]
    fn declaration_order_not_name_order() {
        // Reversed declaration order flips the winner.
        let world = World::new(json!({
            "Surface objects": {
                "OceanicPlate_1": constant_plate(square(50.0, 0.0, 150.0, 100.0), 20.0, 2),
                "ContinentalPlate_1": constant_plate(square(0.0, 0.0, 100.0, 100.0), 10.0, 1),
            }
        }))
        .unwrap();
        let names: Vec<&str> = world.features().map(|f| f.name()).collect();
        assert_eq!(names, vec!["OceanicPlate_1", "ContinentalPlate_1"]);
        let overlap = Point::new([75.0, 50.0, 0.0]);
        assert_eq!(world.temperature(overlap, 10.0, 9.81).unwrap(), 10.0);
    }

    #[test]
    fn cross_section_lifts_queries() {
        let world = World::new(json!({
            "Cross section": [[0, 0], [3, 4]],
            "Surface objects": {
                "ContinentalPlate": constant_plate(square(50.0, 70.0, 70.0, 90.0), 10.0, 0),
            }
        }))
        .unwrap();
        assert_eq!(world.dim(), 2);

        let direction = world
            .parameters()
            .get_point::<2>(SURFACE_COORDINATE_CONVERSIONS)
            .unwrap();
        assert!((direction.norm() - 1.0).abs() < 1e-12);
        assert!((direction[0] - 0.6).abs() < 1e-12);
        assert!((direction[1] - 0.8).abs() < 1e-12);

        // 100 along the line lands on (60, 80).
        let lifted = world.cross_section().unwrap().lift(&Point::new([100.0, -5.0]));
        assert!((lifted[0] - 60.0).abs() < 1e-9);
        assert!((lifted[1] - 80.0).abs() < 1e-9);
        assert_eq!(lifted[2], -5.0);
        assert_eq!(world.temperature(Point::new([100.0, 0.0]), 10.0, 9.81).unwrap(), 10.0);
        assert_eq!(world.temperature(Point::new([10.0, 0.0]), 0.0, 9.81).unwrap(), 1600.0);
    }

    #[test]
    fn cross_section_needs_exactly_two_points() {
        for points in [json!([[0, 0]]), json!([[0, 0], [1, 0], [2, 0]])] {
            let err = World::new(json!({"Cross section": points, "Surface objects": {}}))
                .unwrap_err();
            assert!(matches!(err, WorldBuilderError::ConfigError { .. }), "{err}");
        }
        let err = World::new(json!({"Cross section": [[1, 1], [1, 1]], "Surface objects": {}}))
            .unwrap_err();
        assert!(matches!(err, WorldBuilderError::ConfigError { .. }));
    }

    #[test]
    fn cross_section_needs_a_cartesian_world() {
        let err = World::new(json!({
            "Coordinate system": "spherical",
            "Cross section": [[0, 0], [10, 0]],
            "Surface objects": {},
        }))
        .unwrap_err();
        assert!(
            matches!(&err, WorldBuilderError::ConfigError { path, .. } if path == CROSS_SECTION),
            "{err}"
        );
    }

    #[test]
    fn fingerprint_follows_the_document() {
        let doc = json!({"Surface objects": {}});
        let a = World::new(doc.clone()).unwrap();
        let b = World::new(doc).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let c = World::new(json!({"Potential mantle temperature": 1500, "Surface objects": {}}))
            .unwrap();
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn query_dimension_must_match_world() {
        let world_3d = World::new(json!({"Surface objects": {}})).unwrap();
        assert!(matches!(
            world_3d.temperature(Point::new([0.0, 0.0]), 0.0, 9.81),
            Err(WorldBuilderError::ModeError { .. })
        ));

        let world_2d = World::new(json!({
            "Cross section": [[0, 0], [1, 0]],
            "Surface objects": {},
        }))
        .unwrap();
        assert!(matches!(
            world_2d.composition(Point::new([0.0, 0.0, 0.0]), 0.0, 0),
            Err(WorldBuilderError::ModeError { .. })
        ));
    }

    #[test]
    fn unknown_names_fail_construction() {
        assert!(matches!(
            World::new(json!({"Surface objects": {"Plume": {}}})),
            Err(WorldBuilderError::UnknownFeatureType { .. })
        ));
        assert!(matches!(
            World::new(json!({"Coordinate system": "mercator", "Surface objects": {}})),
            Err(WorldBuilderError::UnknownCoordinateSystemType { .. })
        ));
    }

    #[test]
    fn global_parameters_are_read() {
        let world = World::new(json!({
            "Potential mantle temperature": 1500,
            "specific heat Cp": "1000",
            "Surface objects": {},
        }))
        .unwrap();
        assert_eq!(world.background_temperature(0.0, 9.81), 1500.0);
        let expected = 1500.0 + 1500.0 * 3.5e-5 * 10.0 / 1000.0 * 2000.0;
        assert!((world.background_temperature(2000.0, 10.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn surface_rotation_rotates_features() {
        // A plate east of the origin, rotated 90° counter-clockwise, ends up north.
        let world = World::new(json!({
            "Surface rotation angle": 90,
            "Surface objects": {
                "OceanicPlate": constant_plate(square(40.0, -10.0, 60.0, 10.0), 5.0, 0),
            }
        }))
        .unwrap();
        assert_eq!(world.temperature(Point::new([0.0, 50.0, 0.0]), 1.0, 9.81).unwrap(), 5.0);
        assert_eq!(
            world.temperature(Point::new([50.0, 0.0, 0.0]), 1.0, 9.81).unwrap(),
            world.background_temperature(1.0, 9.81)
        );
    }

    #[test]
    fn spherical_world_reads_degrees() {
        let world = World::new(json!({
            "Coordinate system": {"name": "spherical"},
            "Surface objects": {
                "ContinentalPlate": constant_plate(square(-10.0, -10.0, 10.0, 10.0), 7.0, 0),
            }
        }))
        .unwrap();
        assert_eq!(
            world.coordinate_system().natural_coordinate_system(),
            CoordinateSystemKind::Spherical
        );
        // On the +x axis: longitude 0, latitude 0.
        let inside = Point::new([6371e3, 0.0, 0.0]);
        assert_eq!(world.temperature(inside, 1.0, 9.81).unwrap(), 7.0);
        // 45° east is outside.
        let outside = Point::new([6371e3, 6371e3, 0.0]);
        assert_eq!(
            world.temperature(outside, 1.0, 9.81).unwrap(),
            world.background_temperature(1.0, 9.81)
        );
    }

    #[test]
    fn spherical_plate_across_the_antimeridian() {
        let world = World::new(json!({
            "Coordinate system": "spherical",
            "Surface objects": {
                "OceanicPlate": constant_plate(square(175.0, -5.0, 195.0, 5.0), 250.0, 0),
            }
        }))
        .unwrap();
        let on_equator = |longitude: f64| {
            let (sin, cos) = longitude.to_radians().sin_cos();
            Point::new([6371e3 * cos, 6371e3 * sin, 0.0])
        };
        assert_eq!(world.temperature(on_equator(185.0), 10.0, 9.81).unwrap(), 250.0);
        assert_eq!(world.temperature(on_equator(178.0), 10.0, 9.81).unwrap(), 250.0);
        assert!(world.composition(on_equator(-172.0), 10.0, 0).unwrap());
        assert_eq!(
            world.temperature(on_equator(200.0), 10.0, 9.81).unwrap(),
            world.background_temperature(10.0, 9.81)
        );
    }

    #[test]
    fn rotation_point_longitude_is_wrapped() {
        let world = |longitude: f64| {
            World::new(json!({
                "Coordinate system": "spherical",
                "Surface rotation angle": 30,
                "Surface rotation point": [longitude, 0],
                "Surface objects": {
                    "OceanicPlate": constant_plate(square(5.0, -5.0, 25.0, 5.0), 250.0, 0),
                }
            }))
            .unwrap()
        };
        let (wrapped, plain) = (world(370.0), world(10.0));
        for (x, y, z) in [(6371e3, 1000e3, 0.0), (6000e3, 2000e3, 500e3), (6371e3, 0.0, 0.0)] {
            let p = Point::new([x, y, z]);
            assert_eq!(
                wrapped.temperature(p, 10.0, 9.81).unwrap(),
                plain.temperature(p, 10.0, 9.81).unwrap()
            );
        }
    }

    #[test]
    fn from_json_str_reports_malformed_documents() {
        assert!(matches!(
            World::from_json_str("{\"Surface objects\": "),
            Err(WorldBuilderError::Document(_))
        ));
        let world = World::from_json_str(r#"{"Surface objects": {}}"#).unwrap();
        assert_eq!(world.dim(), 3);
    }

    #[test]
    fn world_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<World>();
    }
}
