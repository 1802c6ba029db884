// schema/types.rs - declaration-side type descriptors
//
// A `Type` says what a path is expected to hold, what it holds when the
// document leaves it out, and how to explain it to a human. Array and List
// descriptors carry the descriptor of their elements so validation can
// recurse.

use crate::point::Point;
use serde_json::{json, Value as Json};
use std::fmt;

/// Semantic type tag shared by descriptors and stored values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Double,
    Bool,
    String,
    UnsignedInt,
    Point2,
    Point3,
    Array,
    List,
    CoordinateSystem,
    Feature,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Double => "double",
            ValueType::Bool => "bool",
            ValueType::String => "string",
            ValueType::UnsignedInt => "unsigned int",
            ValueType::Point2 => "2d point",
            ValueType::Point3 => "3d point",
            ValueType::Array => "array",
            ValueType::List => "list",
            ValueType::CoordinateSystem => "coordinate system",
            ValueType::Feature => "feature",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Expected type, default and description of a declared path.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Double { default: f64, description: String },
    Bool { default: bool, description: String },
    String { default: String, description: String },
    UnsignedInt { default: u32, description: String },
    Point2 { default: Point<2>, description: String },
    Point3 { default: Point<3>, description: String },
    /// Homogeneous array; the default is empty.
    Array { inner: Box<Type>, description: String },
    /// Ordered list of named child nodes, e.g. the surface objects.
    List { inner: Box<Type>, description: String },
    CoordinateSystem { default: String, description: String },
    Feature { description: String },
}

impl Type {
    pub fn double(default: f64, description: impl Into<String>) -> Self {
        Type::Double {
            default,
            description: description.into(),
        }
    }

    pub fn bool(default: bool, description: impl Into<String>) -> Self {
        Type::Bool {
            default,
            description: description.into(),
        }
    }

    pub fn string(default: impl Into<String>, description: impl Into<String>) -> Self {
        Type::String {
            default: default.into(),
            description: description.into(),
        }
    }

    pub fn unsigned_int(default: u32, description: impl Into<String>) -> Self {
        Type::UnsignedInt {
            default,
            description: description.into(),
        }
    }

    pub fn point2(default: Point<2>, description: impl Into<String>) -> Self {
        Type::Point2 {
            default,
            description: description.into(),
        }
    }

    pub fn point3(default: Point<3>, description: impl Into<String>) -> Self {
        Type::Point3 {
            default,
            description: description.into(),
        }
    }

    pub fn array(inner: Type, description: impl Into<String>) -> Self {
        Type::Array {
            inner: Box::new(inner),
            description: description.into(),
        }
    }

    pub fn list(inner: Type, description: impl Into<String>) -> Self {
        Type::List {
            inner: Box::new(inner),
            description: description.into(),
        }
    }

    pub fn coordinate_system(default: impl Into<String>, description: impl Into<String>) -> Self {
        Type::CoordinateSystem {
            default: default.into(),
            description: description.into(),
        }
    }

    pub fn feature(description: impl Into<String>) -> Self {
        Type::Feature {
            description: description.into(),
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Type::Double { .. } => ValueType::Double,
            Type::Bool { .. } => ValueType::Bool,
            Type::String { .. } => ValueType::String,
            Type::UnsignedInt { .. } => ValueType::UnsignedInt,
            Type::Point2 { .. } => ValueType::Point2,
            Type::Point3 { .. } => ValueType::Point3,
            Type::Array { .. } => ValueType::Array,
            Type::List { .. } => ValueType::List,
            Type::CoordinateSystem { .. } => ValueType::CoordinateSystem,
            Type::Feature { .. } => ValueType::Feature,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Type::Double { description, .. }
            | Type::Bool { description, .. }
            | Type::String { description, .. }
            | Type::UnsignedInt { description, .. }
            | Type::Point2 { description, .. }
            | Type::Point3 { description, .. }
            | Type::Array { description, .. }
            | Type::List { description, .. }
            | Type::CoordinateSystem { description, .. }
            | Type::Feature { description } => description,
        }
    }

    /// JSON rendering used by `Parameters::documentation`.
    pub fn to_documentation(&self) -> Json {
        let mut doc = json!({
            "type": self.value_type().name(),
            "description": self.description(),
        });
        let default = match self {
            Type::Double { default, .. } => Some(json!(default)),
            Type::Bool { default, .. } => Some(json!(default)),
            Type::String { default, .. } | Type::CoordinateSystem { default, .. } => {
                Some(json!(default))
            }
            Type::UnsignedInt { default, .. } => Some(json!(default)),
            Type::Point2 { default, .. } => Some(json!(default.coordinates())),
            Type::Point3 { default, .. } => Some(json!(default.coordinates())),
            Type::Array { inner, .. } | Type::List { inner, .. } => {
                doc["items"] = inner.to_documentation();
                None
            }
            Type::Feature { .. } => None,
        };
        if let Some(default) = default {
            doc["default"] = default;
        }
        doc
    }
}
