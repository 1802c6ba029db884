// schema/mod.rs - typed, declared view of the input document
//
// Everything a world reads from its document goes through `Parameters`:
// paths are declared with a `Type`, loaded once, and read back through typed
// getters.

mod document;
mod parameters;
mod types;
mod value;

pub use document::{
    check_known_keys, join_path, kind_of, leaf_name, lookup, parse_bool, parse_double,
    parse_point, parse_string, parse_unsigned_int, PATH_SEPARATOR,
};
pub use parameters::Parameters;
pub use types::{Type, ValueType};
pub use value::{ArrayValue, IndexList, StoredValue, Value};
