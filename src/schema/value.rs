// schema/value.rs - stored values
//
// Scalars are stored inline. Points, arrays and features live in homogeneous
// side tables owned by `Parameters`; a composite value only records indices
// into them, so values never own each other.

use super::types::ValueType;
use smallvec::SmallVec;

/// Index list of an array or list value. Most arrays in a world file are
/// short (points of a footprint, two cross-section points).
pub type IndexList = SmallVec<[u32; 8]>;

#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Double(f64),
    Bool(bool),
    String(String),
    UnsignedInt(u32),
    /// Index into the 2-D point table.
    Point2(u32),
    /// Index into the 3-D point table.
    Point3(u32),
    /// Index into the array table.
    Array(u32),
    /// Index into the array table; elements index the feature table.
    List(u32),
    CoordinateSystem(String),
    /// Index into the feature table.
    Feature(u32),
}

impl StoredValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            StoredValue::Double(_) => ValueType::Double,
            StoredValue::Bool(_) => ValueType::Bool,
            StoredValue::String(_) => ValueType::String,
            StoredValue::UnsignedInt(_) => ValueType::UnsignedInt,
            StoredValue::Point2(_) => ValueType::Point2,
            StoredValue::Point3(_) => ValueType::Point3,
            StoredValue::Array(_) => ValueType::Array,
            StoredValue::List(_) => ValueType::List,
            StoredValue::CoordinateSystem(_) => ValueType::CoordinateSystem,
            StoredValue::Feature(_) => ValueType::Feature,
        }
    }
}

/// A parsed entry: the value plus the description it was declared with.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub value: StoredValue,
    pub description: String,
}

/// Homogeneous collection. `inner_type_index[i]` indexes the side table
/// that belongs to `element`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub element: ValueType,
    pub inner_type_index: IndexList,
}

impl ArrayValue {
    pub fn empty(element: ValueType) -> Self {
        ArrayValue {
            element,
            inner_type_index: IndexList::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner_type_index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner_type_index.is_empty()
    }
}
