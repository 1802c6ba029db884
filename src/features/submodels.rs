// features/submodels.rs - temperature and composition sub-models
//
// Each feature names one temperature and one composition sub-model:
//
//   "Temperature submodule": {"name": "linear", "Depth": 100e3,
//                             "Top temperature": 273, "Bottom temperature": 1600}
//
// The sub-model entries live under `<feature>/Temperature submodule/...` and
// are declared only once the name is known, since every model understands
// different entries.

use super::{COMPOSITION_SUBMODULE, TEMPERATURE_SUBMODULE};
use crate::error::{Result, WorldBuilderError};
use crate::schema::{check_known_keys, join_path, Parameters, Type};
use serde_json::Value as Json;

const NAME: &str = "name";
const DEPTH: &str = "Depth";

pub(crate) fn declare_model_names(prm: &mut Parameters, feature_path: &str) -> Result<()> {
    prm.declare(
        &join_path(&join_path(feature_path, TEMPERATURE_SUBMODULE), NAME),
        false,
        Type::string("none", "Temperature model applied inside the feature."),
    )?;
    prm.declare(
        &join_path(&join_path(feature_path, COMPOSITION_SUBMODULE), NAME),
        false,
        Type::string("none", "Composition model applied inside the feature."),
    )
}

/// Load `<model>/Depth` when the model owns its depth extent.
fn read_depth(prm: &mut Parameters, model_path: &str, depth_default: Option<f64>) -> Result<f64> {
    let Some(default) = depth_default else {
        return Ok(f64::INFINITY);
    };
    let path = join_path(model_path, DEPTH);
    prm.declare_and_load(
        &path,
        false,
        Type::double(default, "Depth down to which the model applies."),
    )?;
    let depth = prm.get_double(&path)?;
    if depth <= 0.0 {
        return Err(WorldBuilderError::config(
            &path,
            format!("depth must be positive, got {depth}"),
        ));
    }
    Ok(depth)
}

/// Keys a model node may carry: its name, "Depth" when the model owns its
/// extent, and the model's own entries.
fn known_keys(depth_default: Option<f64>, entries: &[&'static str]) -> Vec<&'static str> {
    let mut known = vec![NAME];
    if depth_default.is_some() {
        known.push(DEPTH);
    }
    known.extend_from_slice(entries);
    known
}

fn within(depth: f64, max_depth: f64) -> bool {
    (0.0..=max_depth).contains(&depth)
}

// ── Temperature ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TemperatureModel {
    /// Leaves the running temperature alone.
    None,
    /// Fixed temperature down to `max_depth`.
    Constant { max_depth: f64, temperature: f64 },
    /// Linear from `top` at the surface to `bottom` at `max_depth`. A NaN
    /// `bottom` means "whatever the running temperature is there".
    Linear { max_depth: f64, top: f64, bottom: f64 },
}

impl TemperatureModel {
    /// `depth_default` is `Some` when the model owns a "Depth" entry (plates)
    /// and `None` when the feature supplies the extent itself (slabs).
    pub fn read(
        prm: &mut Parameters,
        feature_node: &Json,
        feature_path: &str,
        depth_default: Option<f64>,
    ) -> Result<Self> {
        let model_path = join_path(feature_path, TEMPERATURE_SUBMODULE);
        let name_path = join_path(&model_path, NAME);
        prm.load_entry(&name_path)?;
        let name = prm.get_string(&name_path)?.to_string();

        let (model, known) = match name.as_str() {
            "none" => (TemperatureModel::None, vec![NAME]),
            "constant" => {
                let max_depth = read_depth(prm, &model_path, depth_default)?;
                let path = join_path(&model_path, "Temperature");
                prm.declare_and_load(
                    &path,
                    false,
                    Type::double(293.15, "Temperature inside the feature in K."),
                )?;
                let model = TemperatureModel::Constant {
                    max_depth,
                    temperature: prm.get_double(&path)?,
                };
                (model, known_keys(depth_default, &["Temperature"]))
            }
            "linear" => {
                let max_depth = read_depth(prm, &model_path, depth_default)?;
                let top_path = join_path(&model_path, "Top temperature");
                let bottom_path = join_path(&model_path, "Bottom temperature");
                prm.declare_and_load(
                    &top_path,
                    false,
                    Type::double(293.15, "Temperature at the top of the feature in K."),
                )?;
                prm.declare_and_load(
                    &bottom_path,
                    false,
                    Type::double(
                        f64::NAN,
                        "Temperature at the bottom of the feature in K. Defaults to the \
                         temperature below the feature.",
                    ),
                )?;
                let model = TemperatureModel::Linear {
                    max_depth,
                    top: prm.get_double(&top_path)?,
                    bottom: prm.get_double(&bottom_path)?,
                };
                (
                    model,
                    known_keys(depth_default, &["Top temperature", "Bottom temperature"]),
                )
            }
            other => {
                return Err(WorldBuilderError::config(
                    &model_path,
                    format!("unknown temperature submodule `{other}`"),
                ))
            }
        };

        if let Some(node) = feature_node.get(TEMPERATURE_SUBMODULE) {
            check_known_keys(&model_path, node, &known)?;
        }
        Ok(model)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TemperatureModel::None => "none",
            TemperatureModel::Constant { .. } => "constant",
            TemperatureModel::Linear { .. } => "linear",
        }
    }

    /// Apply at `depth` below the surface, for features whose extent is the
    /// model's own depth range.
    pub fn apply(&self, depth: f64, temperature: f64) -> f64 {
        match self {
            TemperatureModel::None => temperature,
            TemperatureModel::Constant { max_depth, .. }
            | TemperatureModel::Linear { max_depth, .. } => {
                if within(depth, *max_depth) {
                    self.at_fraction(depth / max_depth, temperature)
                } else {
                    temperature
                }
            }
        }
    }

    /// Evaluate at a relative position `fraction` (0 = top, 1 = bottom)
    /// through the feature, without any extent check.
    pub fn at_fraction(&self, fraction: f64, temperature: f64) -> f64 {
        match self {
            TemperatureModel::None => temperature,
            TemperatureModel::Constant {
                temperature: fixed, ..
            } => *fixed,
            TemperatureModel::Linear { top, bottom, .. } => {
                let bottom = if bottom.is_nan() { temperature } else { *bottom };
                let fraction = if fraction.is_finite() { fraction } else { 0.0 };
                top + (bottom - top) * fraction
            }
        }
    }
}

// ── Composition ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum CompositionModel {
    /// Leaves the running indicator alone.
    None,
    /// Inside the feature, exactly the listed compositions are present.
    Constant { max_depth: f64, compositions: Vec<u32> },
}

impl CompositionModel {
    pub fn read(
        prm: &mut Parameters,
        feature_node: &Json,
        feature_path: &str,
        depth_default: Option<f64>,
    ) -> Result<Self> {
        let model_path = join_path(feature_path, COMPOSITION_SUBMODULE);
        let name_path = join_path(&model_path, NAME);
        prm.load_entry(&name_path)?;
        let name = prm.get_string(&name_path)?.to_string();

        let (model, known) = match name.as_str() {
            "none" => (CompositionModel::None, vec![NAME]),
            "constant" => {
                let max_depth = read_depth(prm, &model_path, depth_default)?;
                let path = join_path(&model_path, "Compositions");
                prm.declare_and_load(
                    &path,
                    true,
                    Type::array(
                        Type::unsigned_int(0, "A composition number."),
                        "Compositions present inside the feature.",
                    ),
                )?;
                let model = CompositionModel::Constant {
                    max_depth,
                    compositions: prm.get_array_unsigned_ints(&path)?,
                };
                (model, known_keys(depth_default, &["Compositions"]))
            }
            other => {
                return Err(WorldBuilderError::config(
                    &model_path,
                    format!("unknown composition submodule `{other}`"),
                ))
            }
        };

        if let Some(node) = feature_node.get(COMPOSITION_SUBMODULE) {
            check_known_keys(&model_path, node, &known)?;
        }
        Ok(model)
    }

    pub fn name(&self) -> &'static str {
        match self {
            CompositionModel::None => "none",
            CompositionModel::Constant { .. } => "constant",
        }
    }

    pub fn apply(&self, depth: f64, composition_number: u32, composition: bool) -> bool {
        match self {
            CompositionModel::None => composition,
            CompositionModel::Constant { max_depth, .. } => {
                if within(depth, *max_depth) {
                    self.inside(composition_number, composition)
                } else {
                    composition
                }
            }
        }
    }

    /// Value inside the feature, without any extent check.
    pub fn inside(&self, composition_number: u32, composition: bool) -> bool {
        match self {
            CompositionModel::None => composition,
            CompositionModel::Constant { compositions, .. } => {
                compositions.contains(&composition_number)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_temperature_only_within_depth() {
        let model = TemperatureModel::Constant {
            max_depth: 100.0,
            temperature: 10.0,
        };
        assert_eq!(model.apply(50.0, 1600.0), 10.0);
        assert_eq!(model.apply(150.0, 1600.0), 1600.0);
        assert_eq!(model.apply(-1.0, 1600.0), 1600.0);
    }

    #[test]
    fn linear_temperature_interpolates() {
        let model = TemperatureModel::Linear {
            max_depth: 100.0,
            top: 0.0,
            bottom: 1000.0,
        };
        assert!((model.apply(25.0, 1600.0) - 250.0).abs() < 1e-12);
        assert!((model.apply(100.0, 1600.0) - 1000.0).abs() < 1e-12);
    }

    #[test]
    fn linear_bottom_defaults_to_running_value() {
        let model = TemperatureModel::Linear {
            max_depth: 100.0,
            top: 0.0,
            bottom: f64::NAN,
        };
        assert!((model.apply(50.0, 1600.0) - 800.0).abs() < 1e-12);
    }

    #[test]
    fn none_passes_through() {
        assert_eq!(TemperatureModel::None.apply(10.0, 42.0), 42.0);
        assert!(CompositionModel::None.apply(10.0, 3, true));
        assert!(!CompositionModel::None.apply(10.0, 3, false));
    }

    #[test]
    fn constant_composition_overrides() {
        let model = CompositionModel::Constant {
            max_depth: 100.0,
            compositions: vec![1, 3],
        };
        assert!(model.apply(10.0, 3, false));
        assert!(!model.apply(10.0, 2, true));
        assert!(model.apply(500.0, 2, true));
    }

    #[test]
    fn depth_is_known_only_when_the_model_owns_it() {
        assert_eq!(known_keys(Some(100e3), &["Temperature"]), [NAME, DEPTH, "Temperature"]);
        assert_eq!(known_keys(None, &["Temperature"]), [NAME, "Temperature"]);
    }
}
