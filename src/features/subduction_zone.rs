// features/subduction_zone.rs - a planar slab hanging off a trench line
//
// "Coordinates" trace the trench. The slab descends towards the left of the
// trench direction at "Dip angle" and has a fixed "Thickness" (measured
// perpendicular to the slab) and down-dip "Length". For a query at
// horizontal distance `h` from the trench on the dipping side:
//
//   top of slab     = h * tan(dip)
//   vertical extent = thickness / cos(dip)
//   down-dip reach  = h / cos(dip)  <= length
//
// On spherical worlds the surface distance is the planar (longitude,
// latitude) distance scaled by the query radius. The query longitude is also
// tried one turn east and west so trenches crossing the antimeridian match.

use super::{
    declare_common_entries, distance_to_segment, read_coordinates, surface_candidates,
    CompositionModel, Feature, TemperatureModel, COMPOSITION_SUBMODULE, COORDINATES,
    TEMPERATURE_SUBMODULE,
};
use crate::coordinate_systems::CoordinateSystemKind;
use crate::error::{Result, WorldBuilderError};
use crate::point::Point;
use crate::schema::{check_known_keys, join_path, leaf_name, Parameters, Type};
use serde_json::Value as Json;

const DIP_ANGLE: &str = "Dip angle";
const LENGTH: &str = "Length";
const THICKNESS: &str = "Thickness";

#[derive(Debug, Clone)]
pub struct SubductionZone {
    name: String,
    trench: Vec<Point<2>>,
    /// Radians.
    dip: f64,
    length: f64,
    thickness: f64,
    temperature_model: TemperatureModel,
    composition_model: CompositionModel,
}

impl Default for SubductionZone {
    fn default() -> Self {
        SubductionZone {
            name: String::new(),
            trench: Vec::new(),
            dip: 30f64.to_radians(),
            length: 500e3,
            thickness: 100e3,
            temperature_model: TemperatureModel::None,
            composition_model: CompositionModel::None,
        }
    }
}

impl SubductionZone {
    pub fn trench(&self) -> &[Point<2>] {
        &self.trench
    }

    pub fn dip(&self) -> f64 {
        self.dip
    }

    /// Position inside the slab as a fraction of its thickness (0 at the
    /// top), or `None` outside.
    fn slab_fraction(&self, position: &Point<3>, depth: f64) -> Option<f64> {
        // Nearest trench segment decides distance and side.
        let (distance, side) = surface_candidates(position)
            .flat_map(|surface| {
                self.trench
                    .windows(2)
                    .map(move |w| distance_to_segment(&w[0], &w[1], &surface))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))?;
        if side < 0.0 {
            return None;
        }

        let scale = match position.coordinate_system() {
            CoordinateSystemKind::Spherical => position[0],
            CoordinateSystemKind::Cartesian => 1.0,
        };
        let horizontal = distance * scale;

        let (sin_dip, cos_dip) = self.dip.sin_cos();
        if horizontal / cos_dip > self.length {
            return None;
        }
        let below_top = depth - horizontal * sin_dip / cos_dip;
        let extent = self.thickness / cos_dip;
        (0.0..=extent)
            .contains(&below_top)
            .then(|| below_top / extent)
    }
}

impl Feature for SubductionZone {
    fn type_name(&self) -> &'static str {
        super::SUBDUCTION_ZONE
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn declare_entries(&self, prm: &mut Parameters, path: &str) -> Result<()> {
        declare_common_entries(prm, path)?;
        prm.declare(
            &join_path(path, DIP_ANGLE),
            false,
            Type::double(30.0, "Dip of the slab below the horizontal, in degrees."),
        )?;
        prm.declare(
            &join_path(path, LENGTH),
            false,
            Type::double(500e3, "Down-dip length of the slab."),
        )?;
        prm.declare(
            &join_path(path, THICKNESS),
            false,
            Type::double(100e3, "Thickness of the slab, perpendicular to its surface."),
        )
    }

    fn read(&mut self, prm: &mut Parameters, node: &Json, path: &str) -> Result<()> {
        check_known_keys(
            path,
            node,
            &[
                COORDINATES,
                DIP_ANGLE,
                LENGTH,
                THICKNESS,
                TEMPERATURE_SUBMODULE,
                COMPOSITION_SUBMODULE,
            ],
        )?;
        self.name = leaf_name(path).to_string();
        self.trench = read_coordinates(prm, path, 2)?;

        let dip_path = join_path(path, DIP_ANGLE);
        prm.load_entry(&dip_path)?;
        let dip = prm.get_double(&dip_path)?;
        if !(dip > 0.0 && dip < 90.0) {
            return Err(WorldBuilderError::config(
                &dip_path,
                format!("dip must lie strictly between 0 and 90 degrees, got {dip}"),
            ));
        }
        self.dip = dip.to_radians();

        for (entry, slot) in [(LENGTH, &mut self.length), (THICKNESS, &mut self.thickness)] {
            let entry_path = join_path(path, entry);
            prm.load_entry(&entry_path)?;
            let value = prm.get_double(&entry_path)?;
            if value <= 0.0 {
                return Err(WorldBuilderError::config(
                    &entry_path,
                    format!("must be positive, got {value}"),
                ));
            }
            *slot = value;
        }

        // The slab geometry bounds the sub-models, so they own no depth.
        self.temperature_model = TemperatureModel::read(prm, node, path, None)?;
        self.composition_model = CompositionModel::read(prm, node, path, None)?;
        Ok(())
    }

    fn temperature(
        &self,
        position: &Point<3>,
        depth: f64,
        _gravity: f64,
        temperature: f64,
    ) -> f64 {
        match self.slab_fraction(position, depth) {
            Some(fraction) => self.temperature_model.at_fraction(fraction, temperature),
            None => temperature,
        }
    }

    fn composition(
        &self,
        position: &Point<3>,
        depth: f64,
        composition_number: u32,
        composition: bool,
    ) -> bool {
        match self.slab_fraction(position, depth) {
            Some(_) => self.composition_model.inside(composition_number, composition),
            None => composition,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use serde_json::json;
    use std::sync::Arc;

    fn read_zone(node: Json) -> Result<SubductionZone> {
        let path = "Surface objects/SubductionZone";
        let doc = json!({"Surface objects": {"SubductionZone": node.clone()}});
        let mut prm = Parameters::new(doc, Arc::new(Registry::with_builtins()));
        let mut zone = SubductionZone::default();
        zone.declare_entries(&mut prm, path)?;
        zone.read(&mut prm, &node, path)?;
        Ok(zone)
    }

    /// Trench along +x, slab dipping 45° towards +y.
    fn zone() -> SubductionZone {
        read_zone(json!({
            "Coordinates": [[0, 0], [1000e3, 0]],
            "Dip angle": 45,
            "Length": 300e3,
            "Thickness": 50e3,
            "Temperature submodule": {"name": "constant", "Temperature": 600},
            "Composition submodule": {"name": "constant", "Compositions": [1]},
        }))
        .unwrap()
    }

    #[test]
    fn reads_geometry() {
        let z = zone();
        assert_eq!(z.trench().len(), 2);
        assert!((z.dip() - 45f64.to_radians()).abs() < 1e-12);
        assert_eq!(z.name(), "SubductionZone");
    }

    #[test]
    fn inside_the_slab() {
        let z = zone();
        // 100 km from the trench the top of the slab sits at 100 km depth.
        let p = Point::new([500e3, 100e3, 0.0]);
        assert_eq!(z.temperature(&p, 110e3, 9.81, 1600.0), 600.0);
        assert!(z.composition(&p, 110e3, 1, false));
        assert!(!z.composition(&p, 110e3, 0, true));
    }

    #[test]
    fn outside_the_slab() {
        let z = zone();
        let above = Point::new([500e3, 100e3, 0.0]);
        assert_eq!(z.temperature(&above, 50e3, 9.81, 1600.0), 1600.0);
        // Thickness / cos(45°) ≈ 70.7 km below the slab top
        assert_eq!(z.temperature(&above, 180e3, 9.81, 1600.0), 1600.0);
        // Wrong side of the trench
        let behind = Point::new([500e3, -100e3, 0.0]);
        assert_eq!(z.temperature(&behind, 110e3, 9.81, 1600.0), 1600.0);
        assert!(z.composition(&behind, 110e3, 0, true));
        // Past the down-dip end: 250 km / cos(45°) > 300 km
        let far = Point::new([500e3, 250e3, 0.0]);
        assert_eq!(z.temperature(&far, 260e3, 9.81, 1600.0), 1600.0);
    }

    #[test]
    fn spherical_trench_across_the_antimeridian() {
        use crate::coordinate_systems::CoordinateSystemKind;
        use crate::features::COORDINATE_SYSTEM_PATH;

        let path = "Surface objects/SubductionZone";
        let node = json!({
            "Coordinates": [[170, 0], [190, 0]],
            "Dip angle": 45,
            "Temperature submodule": {"name": "constant", "Temperature": 600},
        });
        let doc = json!({
            "Coordinate system": "spherical",
            "Surface objects": {"SubductionZone": node.clone()},
        });
        let mut prm = Parameters::new(doc, Arc::new(Registry::with_builtins()));
        prm.declare_and_load(
            COORDINATE_SYSTEM_PATH,
            false,
            Type::coordinate_system("cartesian", ""),
        )
        .unwrap();
        let mut z = SubductionZone::default();
        z.declare_entries(&mut prm, path).unwrap();
        z.read(&mut prm, &node, path).unwrap();

        let at = |longitude: f64, latitude: f64| {
            Point::with_coordinate_system(
                [6371e3, longitude.to_radians(), latitude.to_radians()],
                CoordinateSystemKind::Spherical,
            )
        };
        // 0.5° north of the trench is about 55.6 km away, so the slab top
        // lies at about 55.6 km depth on either side of the antimeridian.
        assert_eq!(z.temperature(&at(-175.0, 0.5), 80e3, 9.81, 1600.0), 600.0);
        assert_eq!(z.temperature(&at(175.0, 0.5), 80e3, 9.81, 1600.0), 600.0);
        assert_eq!(z.temperature(&at(-175.0, 0.5), 40e3, 9.81, 1600.0), 1600.0);
        assert_eq!(z.temperature(&at(-175.0, -0.5), 80e3, 9.81, 1600.0), 1600.0);
    }

    #[test]
    fn slab_models_have_no_depth_entry() {
        let err = read_zone(json!({
            "Coordinates": [[0, 0], [1, 0]],
            "Temperature submodule": {"name": "constant", "Depth": 1.0, "Temperature": 600},
        }))
        .unwrap_err();
        assert!(matches!(err, WorldBuilderError::ConfigError { .. }), "{err}");

        let err = read_zone(json!({
            "Coordinates": [[0, 0], [1, 0]],
            "Composition submodule": {"name": "constant", "Depth": 1.0, "Compositions": [0]},
        }))
        .unwrap_err();
        assert!(matches!(err, WorldBuilderError::ConfigError { .. }), "{err}");
    }

    #[test]
    fn dip_must_be_between_zero_and_ninety() {
        let err = read_zone(json!({"Coordinates": [[0, 0], [1, 0]], "Dip angle": 90}))
            .unwrap_err();
        assert!(matches!(err, WorldBuilderError::ConfigError { .. }));
    }

    #[test]
    fn trench_needs_two_points() {
        let err = read_zone(json!({"Coordinates": [[0, 0]]})).unwrap_err();
        assert!(matches!(err, WorldBuilderError::ConfigError { .. }));
    }
}
