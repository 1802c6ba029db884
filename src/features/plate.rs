// features/plate.rs - continental and oceanic plates
//
// A plate is a polygon on the surface extruded downwards. Its sub-models
// own their depth range, so the footprint is "inside the polygon and above
// the sub-model's Depth".

use super::{
    declare_common_entries, polygon_contains, read_coordinates, surface_candidates,
    CompositionModel, Feature, TemperatureModel, COMPOSITION_SUBMODULE, COORDINATES,
    TEMPERATURE_SUBMODULE,
};
use crate::error::Result;
use crate::point::Point;
use crate::schema::{check_known_keys, leaf_name, Parameters};
use serde_json::Value as Json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlateKind {
    Continental,
    Oceanic,
}

impl PlateKind {
    /// Default thickness the sub-models apply down to.
    fn default_depth(&self) -> f64 {
        match self {
            PlateKind::Continental => 150e3,
            PlateKind::Oceanic => 100e3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Plate {
    kind: PlateKind,
    name: String,
    coordinates: Vec<Point<2>>,
    temperature_model: TemperatureModel,
    composition_model: CompositionModel,
}

impl Plate {
    pub fn new(kind: PlateKind) -> Self {
        Plate {
            kind,
            name: String::new(),
            coordinates: Vec::new(),
            temperature_model: TemperatureModel::None,
            composition_model: CompositionModel::None,
        }
    }

    pub fn kind(&self) -> PlateKind {
        self.kind
    }

    pub fn coordinates(&self) -> &[Point<2>] {
        &self.coordinates
    }

    pub fn temperature_model(&self) -> &TemperatureModel {
        &self.temperature_model
    }

    pub fn composition_model(&self) -> &CompositionModel {
        &self.composition_model
    }

    fn covers(&self, position: &Point<3>) -> bool {
        surface_candidates(position).any(|surface| polygon_contains(&self.coordinates, &surface))
    }
}

impl Feature for Plate {
    fn type_name(&self) -> &'static str {
        match self.kind {
            PlateKind::Continental => super::CONTINENTAL_PLATE,
            PlateKind::Oceanic => super::OCEANIC_PLATE,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn declare_entries(&self, prm: &mut Parameters, path: &str) -> Result<()> {
        declare_common_entries(prm, path)
    }

    fn read(&mut self, prm: &mut Parameters, node: &Json, path: &str) -> Result<()> {
        check_known_keys(
            path,
            node,
            &[COORDINATES, TEMPERATURE_SUBMODULE, COMPOSITION_SUBMODULE],
        )?;
        self.name = leaf_name(path).to_string();
        self.coordinates = read_coordinates(prm, path, 3)?;
        let depth = Some(self.kind.default_depth());
        self.temperature_model = TemperatureModel::read(prm, node, path, depth)?;
        self.composition_model = CompositionModel::read(prm, node, path, depth)?;
        Ok(())
    }

    fn temperature(
        &self,
        position: &Point<3>,
        depth: f64,
        _gravity: f64,
        temperature: f64,
    ) -> f64 {
        if !self.covers(position) {
            return temperature;
        }
        self.temperature_model.apply(depth, temperature)
    }

    fn composition(
        &self,
        position: &Point<3>,
        depth: f64,
        composition_number: u32,
        composition: bool,
    ) -> bool {
        if !self.covers(position) {
            return composition;
        }
        self.composition_model
            .apply(depth, composition_number, composition)
    }
}
