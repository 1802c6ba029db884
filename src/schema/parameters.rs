// schema/parameters.rs - the parameter store
//
// Declare, then load. Every path is declared exactly once with a `Type`
// (expected type, default, description). Loading a declared path reads it
// from the input document, validates it against the declaration and stores
// it. Feature lists are loaded by asking the registry for a feature object
// per child node and letting that feature declare and load its own entries
// under the child's path, so the whole document is consumed in one pass,
// top to bottom.
//
// After the pass the store is read-only. The World keeps it for the rest of
// the run and features have already copied out what they need.

use super::document::{self, join_path, leaf_name};
use super::types::{Type, ValueType};
use super::value::{ArrayValue, IndexList, StoredValue, Value};
use crate::error::{Result, WorldBuilderError};
use crate::features::Feature;
use crate::point::Point;
use crate::registry::Registry;
use rustc_hash::FxHashMap;
use serde_json::{json, Value as Json};
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
struct Declaration {
    required: bool,
    descriptor: Type,
}

/// Either a loaded value or the declared default of an optional path that
/// was never loaded.
enum Resolved<'a> {
    Stored(&'a StoredValue),
    Default(&'a Type),
}

impl Resolved<'_> {
    fn value_type(&self) -> ValueType {
        match self {
            Resolved::Stored(v) => v.value_type(),
            Resolved::Default(t) => t.value_type(),
        }
    }
}

/// Typed store of every value read from a world document.
pub struct Parameters {
    document: Arc<Json>,
    registry: Arc<Registry>,

    declarations: FxHashMap<String, Declaration>,
    /// Declaration order, for documentation output.
    declared_paths: Vec<String>,
    entries: FxHashMap<String, Value>,

    // ── Side tables ─────────────────────────────────────────────────
    doubles: Vec<f64>,
    bools: Vec<bool>,
    strings: Vec<String>,
    unsigned_ints: Vec<u32>,
    points_2d: Vec<Point<2>>,
    points_3d: Vec<Point<3>>,
    arrays: Vec<ArrayValue>,
    features: Vec<Box<dyn Feature>>,
}

impl Parameters {
    pub fn new(document: Json, registry: Arc<Registry>) -> Self {
        Parameters {
            document: Arc::new(document),
            registry,
            declarations: FxHashMap::default(),
            declared_paths: Vec::new(),
            entries: FxHashMap::default(),
            doubles: Vec::new(),
            bools: Vec::new(),
            strings: Vec::new(),
            unsigned_ints: Vec::new(),
            points_2d: Vec::new(),
            points_3d: Vec::new(),
            arrays: Vec::new(),
            features: Vec::new(),
        }
    }

    pub fn document(&self) -> &Json {
        &self.document
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn is_declared(&self, path: &str) -> bool {
        self.declarations.contains_key(path)
    }

    /// True once `path` holds a loaded (or defaulted) value.
    pub fn is_loaded(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// All features in construction (document) order.
    pub fn features(&self) -> &[Box<dyn Feature>] {
        &self.features
    }

    // ── Declaration ─────────────────────────────────────────────────

    /// Register the expected type and default of `path`. Each path may be
    /// declared once.
    pub fn declare(&mut self, path: &str, required: bool, descriptor: Type) -> Result<()> {
        if self.declarations.contains_key(path) {
            return Err(WorldBuilderError::DuplicateDeclaration {
                path: path.to_string(),
            });
        }
        validate_descriptor(path, &descriptor, false)?;
        debug!(path, required, kind = %descriptor.value_type(), "entry declared");
        self.declarations.insert(
            path.to_string(),
            Declaration {
                required,
                descriptor,
            },
        );
        self.declared_paths.push(path.to_string());
        Ok(())
    }

    /// Read a declared path from the document.
    ///
    /// Returns `true` when the document provided the value, `false` when the
    /// default of an optional entry was stored instead.
    pub fn load_entry(&mut self, path: &str) -> Result<bool> {
        let declaration = self
            .declarations
            .get(path)
            .cloned()
            .ok_or_else(|| WorldBuilderError::UnknownPath {
                path: path.to_string(),
            })?;
        if self.entries.contains_key(path) {
            return Err(WorldBuilderError::internal(path, "entry loaded twice"));
        }

        let document = Arc::clone(&self.document);
        let (value, provided) = match document::lookup(&document, path) {
            Some(node) => (self.parse_value(path, &declaration.descriptor, node)?, true),
            None if declaration.required => {
                return Err(WorldBuilderError::MissingEntry {
                    path: path.to_string(),
                })
            }
            None => (self.default_value(path, &declaration.descriptor)?, false),
        };
        debug!(path, provided, "entry loaded");
        self.entries.insert(path.to_string(), value);
        Ok(provided)
    }

    /// `declare` followed by `load_entry`.
    pub fn declare_and_load(
        &mut self,
        path: &str,
        required: bool,
        descriptor: Type,
    ) -> Result<bool> {
        self.declare(path, required, descriptor)?;
        self.load_entry(path)
    }

    /// Store a derived entry computed from already validated values. The
    /// descriptor's default is the value. Written once, like any other path.
    pub fn set_entry(&mut self, path: &str, descriptor: Type) -> Result<()> {
        if self.declarations.contains_key(path) || self.entries.contains_key(path) {
            return Err(WorldBuilderError::DuplicateDeclaration {
                path: path.to_string(),
            });
        }
        self.declare(path, false, descriptor.clone())?;
        let value = self.default_value(path, &descriptor)?;
        trace!(path, "derived entry stored");
        self.entries.insert(path.to_string(), value);
        Ok(())
    }

    // ── Typed getters ───────────────────────────────────────────────

    fn resolve(&self, path: &str) -> Result<Resolved<'_>> {
        if let Some(entry) = self.entries.get(path) {
            return Ok(Resolved::Stored(&entry.value));
        }
        match self.declarations.get(path) {
            Some(d) if !d.required => Ok(Resolved::Default(&d.descriptor)),
            Some(_) => Err(WorldBuilderError::MissingEntry {
                path: path.to_string(),
            }),
            None => Err(WorldBuilderError::UnknownPath {
                path: path.to_string(),
            }),
        }
    }

    pub fn get_double(&self, path: &str) -> Result<f64> {
        match self.resolve(path)? {
            Resolved::Stored(StoredValue::Double(v)) => Ok(*v),
            Resolved::Default(Type::Double { default, .. }) => Ok(*default),
            other => Err(mismatch(path, ValueType::Double, other.value_type())),
        }
    }

    pub fn get_bool(&self, path: &str) -> Result<bool> {
        match self.resolve(path)? {
            Resolved::Stored(StoredValue::Bool(v)) => Ok(*v),
            Resolved::Default(Type::Bool { default, .. }) => Ok(*default),
            other => Err(mismatch(path, ValueType::Bool, other.value_type())),
        }
    }

    pub fn get_string(&self, path: &str) -> Result<&str> {
        match self.resolve(path)? {
            Resolved::Stored(StoredValue::String(v)) => Ok(v),
            Resolved::Default(Type::String { default, .. }) => Ok(default),
            other => Err(mismatch(path, ValueType::String, other.value_type())),
        }
    }

    pub fn get_unsigned_int(&self, path: &str) -> Result<u32> {
        match self.resolve(path)? {
            Resolved::Stored(StoredValue::UnsignedInt(v)) => Ok(*v),
            Resolved::Default(Type::UnsignedInt { default, .. }) => Ok(*default),
            other => Err(mismatch(path, ValueType::UnsignedInt, other.value_type())),
        }
    }

    /// Name of the configured coordinate system.
    pub fn get_coordinate_system(&self, path: &str) -> Result<&str> {
        match self.resolve(path)? {
            Resolved::Stored(StoredValue::CoordinateSystem(v)) => Ok(v),
            Resolved::Default(Type::CoordinateSystem { default, .. }) => Ok(default),
            other => Err(mismatch(path, ValueType::CoordinateSystem, other.value_type())),
        }
    }

    pub fn get_point<const DIM: usize>(&self, path: &str) -> Result<Point<DIM>> {
        match (DIM, self.resolve(path)?) {
            (2, Resolved::Stored(StoredValue::Point2(i))) => {
                table_get(&self.points_2d, *i, path).map(resize)
            }
            (2, Resolved::Default(Type::Point2 { default, .. })) => Ok(resize(default)),
            (3, Resolved::Stored(StoredValue::Point3(i))) => {
                table_get(&self.points_3d, *i, path).map(resize)
            }
            (3, Resolved::Default(Type::Point3 { default, .. })) => Ok(resize(default)),
            (_, other) => Err(mismatch(path, point_type(DIM), other.value_type())),
        }
    }

    pub fn get_array(&self, path: &str) -> Result<ArrayValue> {
        match self.resolve(path)? {
            Resolved::Stored(StoredValue::Array(i)) => {
                table_get(&self.arrays, *i, path).map(Clone::clone)
            }
            Resolved::Default(Type::Array { inner, .. }) => {
                Ok(ArrayValue::empty(inner.value_type()))
            }
            other => Err(mismatch(path, ValueType::Array, other.value_type())),
        }
    }

    pub fn get_array_points<const DIM: usize>(&self, path: &str) -> Result<Vec<Point<DIM>>> {
        let array = self.expect_elements(path, point_type(DIM))?;
        array
            .inner_type_index
            .iter()
            .map(|&i| match DIM {
                2 => table_get(&self.points_2d, i, path).map(resize),
                _ => table_get(&self.points_3d, i, path).map(resize),
            })
            .collect()
    }

    pub fn get_array_doubles(&self, path: &str) -> Result<Vec<f64>> {
        let array = self.expect_elements(path, ValueType::Double)?;
        array
            .inner_type_index
            .iter()
            .map(|&i| table_get(&self.doubles, i, path).copied())
            .collect()
    }

    pub fn get_array_unsigned_ints(&self, path: &str) -> Result<Vec<u32>> {
        let array = self.expect_elements(path, ValueType::UnsignedInt)?;
        array
            .inner_type_index
            .iter()
            .map(|&i| table_get(&self.unsigned_ints, i, path).copied())
            .collect()
    }

    pub fn get_array_strings(&self, path: &str) -> Result<Vec<&str>> {
        let array = self.expect_elements(path, ValueType::String)?;
        array
            .inner_type_index
            .iter()
            .map(|&i| table_get(&self.strings, i, path).map(String::as_str))
            .collect()
    }

    pub fn get_array_bools(&self, path: &str) -> Result<Vec<bool>> {
        let array = self.expect_elements(path, ValueType::Bool)?;
        array
            .inner_type_index
            .iter()
            .map(|&i| table_get(&self.bools, i, path).copied())
            .collect()
    }

    /// Feature-table indices of a feature list, in document order.
    pub fn get_feature_indices(&self, path: &str) -> Result<IndexList> {
        let array = match self.resolve(path)? {
            Resolved::Stored(StoredValue::List(i)) => table_get(&self.arrays, *i, path)?.clone(),
            Resolved::Default(Type::List { inner, .. }) => ArrayValue::empty(inner.value_type()),
            other => return Err(mismatch(path, ValueType::List, other.value_type())),
        };
        if array.element != ValueType::Feature {
            return Err(mismatch(path, ValueType::Feature, array.element));
        }
        for &i in &array.inner_type_index {
            table_get(&self.features, i, path)?;
        }
        Ok(array.inner_type_index)
    }

    pub fn get_features(&self, path: &str) -> Result<Vec<&dyn Feature>> {
        Ok(self
            .get_feature_indices(path)?
            .iter()
            .map(|&i| self.features[i as usize].as_ref())
            .collect())
    }

    fn expect_elements(&self, path: &str, element: ValueType) -> Result<ArrayValue> {
        let array = self.get_array(path)?;
        if array.element != element {
            return Err(mismatch(path, element, array.element));
        }
        Ok(array)
    }

    // ── Documentation ───────────────────────────────────────────────

    /// Every declaration in declaration order, as JSON.
    pub fn documentation(&self) -> Json {
        let entries: Vec<Json> = self
            .declared_paths
            .iter()
            .filter_map(|path| {
                let d = self.declarations.get(path)?;
                let mut doc = d.descriptor.to_documentation();
                doc["path"] = json!(path);
                doc["required"] = json!(d.required);
                Some(doc)
            })
            .collect();
        Json::Array(entries)
    }

    // ── Parsing ─────────────────────────────────────────────────────

    fn parse_value(&mut self, path: &str, descriptor: &Type, node: &Json) -> Result<Value> {
        let value = match descriptor {
            Type::Double { .. } => StoredValue::Double(document::parse_double(path, node)?),
            Type::Bool { .. } => StoredValue::Bool(document::parse_bool(path, node)?),
            Type::String { .. } => StoredValue::String(document::parse_string(path, node)?),
            Type::UnsignedInt { .. } => {
                StoredValue::UnsignedInt(document::parse_unsigned_int(path, node)?)
            }
            Type::Point2 { .. } => {
                let p = document::parse_point::<2>(path, node)?;
                StoredValue::Point2(push(&mut self.points_2d, p))
            }
            Type::Point3 { .. } => {
                let p = document::parse_point::<3>(path, node)?;
                StoredValue::Point3(push(&mut self.points_3d, p))
            }
            Type::Array { inner, .. } => StoredValue::Array(self.parse_array(path, inner, node)?),
            Type::List { .. } => StoredValue::List(self.parse_feature_list(path, node)?),
            Type::CoordinateSystem { .. } => {
                StoredValue::CoordinateSystem(self.parse_coordinate_system(path, node)?)
            }
            Type::Feature { .. } => {
                StoredValue::Feature(self.parse_feature(path, leaf_name(path), node)?)
            }
        };
        Ok(Value {
            value,
            description: descriptor.description().to_string(),
        })
    }

    /// Parse every element against `inner`; returns the array-table index.
    fn parse_array(&mut self, path: &str, inner: &Type, node: &Json) -> Result<u32> {
        let items = node.as_array().ok_or_else(|| {
            WorldBuilderError::parse(path, "array", format!("found {}", document::kind_of(node)))
        })?;
        let mut indices = IndexList::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let item_path = join_path(path, &i.to_string());
            indices.push(self.parse_element(&item_path, inner, item)?);
        }
        Ok(push(
            &mut self.arrays,
            ArrayValue {
                element: inner.value_type(),
                inner_type_index: indices,
            },
        ))
    }

    /// Parse one array element into its side table; returns the index.
    fn parse_element(&mut self, path: &str, inner: &Type, node: &Json) -> Result<u32> {
        match inner {
            Type::Double { .. } => Ok(push(&mut self.doubles, document::parse_double(path, node)?)),
            Type::Bool { .. } => Ok(push(&mut self.bools, document::parse_bool(path, node)?)),
            Type::String { .. } => Ok(push(&mut self.strings, document::parse_string(path, node)?)),
            Type::UnsignedInt { .. } => Ok(push(
                &mut self.unsigned_ints,
                document::parse_unsigned_int(path, node)?,
            )),
            Type::Point2 { .. } => Ok(push(
                &mut self.points_2d,
                document::parse_point::<2>(path, node)?,
            )),
            Type::Point3 { .. } => Ok(push(
                &mut self.points_3d,
                document::parse_point::<3>(path, node)?,
            )),
            Type::Array { inner, .. } => self.parse_array(path, inner, node),
            other => Err(WorldBuilderError::internal(
                path,
                format!("{} passed validation as an array element", other.value_type()),
            )),
        }
    }

    /// A feature list is an object whose keys are node names, in document
    /// order. Returns the array-table index of the feature indices.
    fn parse_feature_list(&mut self, path: &str, node: &Json) -> Result<u32> {
        let children = node.as_object().ok_or_else(|| {
            WorldBuilderError::parse(path, "list", format!("found {}", document::kind_of(node)))
        })?;
        let mut indices = IndexList::with_capacity(children.len());
        for (name, child) in children {
            let child_path = join_path(path, name);
            indices.push(self.parse_feature(&child_path, name, child)?);
        }
        Ok(push(
            &mut self.arrays,
            ArrayValue {
                element: ValueType::Feature,
                inner_type_index: indices,
            },
        ))
    }

    /// Construct a feature for `node_name` through the registry and let it
    /// declare and read its own entries under `path`.
    fn parse_feature(&mut self, path: &str, node_name: &str, node: &Json) -> Result<u32> {
        if !node.is_object() {
            return Err(WorldBuilderError::parse(
                path,
                "feature",
                format!("found {}", document::kind_of(node)),
            ));
        }
        let registry = Arc::clone(&self.registry);
        let mut feature = registry.create_feature(node_name, path)?;
        feature.declare_entries(self, path)?;
        feature.read(self, node, path)?;
        debug!(path, kind = feature.type_name(), "feature constructed");
        Ok(push(&mut self.features, feature))
    }

    /// Either `"spherical"` or `{"name": "spherical"}`.
    fn parse_coordinate_system(&self, path: &str, node: &Json) -> Result<String> {
        let name = match node {
            Json::Object(map) => {
                document::check_known_keys(path, node, &["name"])?;
                let name_path = join_path(path, "name");
                let name_node = map.get("name").ok_or(WorldBuilderError::MissingEntry {
                    path: name_path.clone(),
                })?;
                document::parse_string(&name_path, name_node)?
            }
            other => document::parse_string(path, other)?,
        };
        if !self.registry.has_coordinate_system(&name) {
            return Err(WorldBuilderError::UnknownCoordinateSystemType { name });
        }
        Ok(name)
    }

    fn default_value(&mut self, path: &str, descriptor: &Type) -> Result<Value> {
        let value = match descriptor {
            Type::Double { default, .. } => StoredValue::Double(*default),
            Type::Bool { default, .. } => StoredValue::Bool(*default),
            Type::String { default, .. } => StoredValue::String(default.clone()),
            Type::UnsignedInt { default, .. } => StoredValue::UnsignedInt(*default),
            Type::Point2 { default, .. } => {
                StoredValue::Point2(push(&mut self.points_2d, *default))
            }
            Type::Point3 { default, .. } => {
                StoredValue::Point3(push(&mut self.points_3d, *default))
            }
            Type::Array { inner, .. } => StoredValue::Array(push(
                &mut self.arrays,
                ArrayValue::empty(inner.value_type()),
            )),
            Type::List { inner, .. } => StoredValue::List(push(
                &mut self.arrays,
                ArrayValue::empty(inner.value_type()),
            )),
            Type::CoordinateSystem { default, .. } => {
                if !self.registry.has_coordinate_system(default) {
                    return Err(WorldBuilderError::UnknownCoordinateSystemType {
                        name: default.clone(),
                    });
                }
                StoredValue::CoordinateSystem(default.clone())
            }
            Type::Feature { .. } => {
                return Err(WorldBuilderError::config(path, "a feature has no default"))
            }
        };
        Ok(Value {
            value,
            description: descriptor.description().to_string(),
        })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Arrays hold plain values or nested arrays; lists hold features.
fn validate_descriptor(path: &str, descriptor: &Type, in_array: bool) -> Result<()> {
    match descriptor {
        Type::Array { inner, .. } => validate_descriptor(path, inner, true),
        Type::List { inner, .. } if in_array => Err(WorldBuilderError::config(
            path,
            format!("arrays cannot hold a list of {}", inner.value_type()),
        )),
        Type::List { inner, .. } => match inner.as_ref() {
            Type::Feature { .. } => Ok(()),
            other => Err(WorldBuilderError::config(
                path,
                format!("lists hold features, not {}", other.value_type()),
            )),
        },
        Type::CoordinateSystem { .. } | Type::Feature { .. } if in_array => {
            Err(WorldBuilderError::config(
                path,
                format!("arrays cannot hold a {}", descriptor.value_type()),
            ))
        }
        _ => Ok(()),
    }
}

fn mismatch(path: &str, expected: ValueType, found: ValueType) -> WorldBuilderError {
    WorldBuilderError::TypeMismatch {
        path: path.to_string(),
        expected: expected.name(),
        found: found.name(),
    }
}

fn point_type(dim: usize) -> ValueType {
    if dim == 2 {
        ValueType::Point2
    } else {
        ValueType::Point3
    }
}

fn push<T>(table: &mut Vec<T>, value: T) -> u32 {
    table.push(value);
    (table.len() - 1) as u32
}

fn table_get<'a, T>(table: &'a [T], index: u32, path: &str) -> Result<&'a T> {
    table.get(index as usize).ok_or_else(|| {
        WorldBuilderError::internal(
            path,
            format!("side-table index {index} out of range ({} stored)", table.len()),
        )
    })
}

/// Re-dimension a point (only used between equal dimensions).
fn resize<const FROM: usize, const TO: usize>(p: &Point<FROM>) -> Point<TO> {
    let coordinates = std::array::from_fn(|i| if i < FROM { p[i] } else { 0.0 });
    Point::with_coordinate_system(coordinates, p.coordinate_system())
}
