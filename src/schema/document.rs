// schema/document.rs - reading literals out of the input tree
//
// The input document is a `serde_json::Value`. Paths address it with `/`
// separated segments: object keys, or decimal indices into arrays. Every
// literal reader accepts a JSON scalar or a string holding the literal, so
// hand-written documents may quote numbers.

use crate::error::{Result, WorldBuilderError};
use crate::point::Point;
use serde_json::Value as Json;

pub const PATH_SEPARATOR: char = '/';

/// `base/name`, or `name` when `base` is empty.
pub fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}{PATH_SEPARATOR}{name}")
    }
}

/// Last segment of a path.
pub fn leaf_name(path: &str) -> &str {
    path.rsplit(PATH_SEPARATOR).next().unwrap_or(path)
}

/// Walk `path` from the document root. `null` counts as absent.
pub fn lookup<'a>(root: &'a Json, path: &str) -> Option<&'a Json> {
    let mut node = root;
    for segment in path.split(PATH_SEPARATOR) {
        node = match node {
            Json::Object(map) => map.get(segment)?,
            Json::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    if node.is_null() {
        None
    } else {
        Some(node)
    }
}

/// Short name of a JSON node kind for error messages.
pub fn kind_of(node: &Json) -> &'static str {
    match node {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

pub fn parse_double(path: &str, node: &Json) -> Result<f64> {
    let value = match node {
        Json::Number(n) => n
            .as_f64()
            .ok_or_else(|| {
                WorldBuilderError::parse(path, "double", format!("`{n}` is out of range"))
            })?,
        Json::String(s) => s.trim().parse::<f64>().map_err(|_| {
            WorldBuilderError::parse(path, "double", format!("`{s}` is not a decimal number"))
        })?,
        other => {
            return Err(WorldBuilderError::parse(
                path,
                "double",
                format!("found {}", kind_of(other)),
            ))
        }
    };
    if !value.is_finite() {
        return Err(WorldBuilderError::parse(
            path,
            "double",
            format!("`{value}` is not finite"),
        ));
    }
    Ok(value)
}

pub fn parse_unsigned_int(path: &str, node: &Json) -> Result<u32> {
    let wide = match node {
        Json::Number(n) => n.as_u64().ok_or_else(|| {
            WorldBuilderError::parse(
                path,
                "unsigned int",
                format!("`{n}` is negative or fractional"),
            )
        })?,
        Json::String(s) => s.trim().parse::<u64>().map_err(|_| {
            WorldBuilderError::parse(
                path,
                "unsigned int",
                format!("`{s}` is not a non-negative integer"),
            )
        })?,
        other => {
            return Err(WorldBuilderError::parse(
                path,
                "unsigned int",
                format!("found {}", kind_of(other)),
            ))
        }
    };
    u32::try_from(wide).map_err(|_| {
        WorldBuilderError::parse(path, "unsigned int", format!("`{wide}` exceeds {}", u32::MAX))
    })
}

pub fn parse_bool(path: &str, node: &Json) -> Result<bool> {
    match node {
        Json::Bool(b) => Ok(*b),
        Json::String(s) => match s.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(WorldBuilderError::parse(
                path,
                "bool",
                format!("`{other}` is neither true nor false"),
            )),
        },
        other => Err(WorldBuilderError::parse(
            path,
            "bool",
            format!("found {}", kind_of(other)),
        )),
    }
}

pub fn parse_string(path: &str, node: &Json) -> Result<String> {
    node.as_str().map(str::to_string).ok_or_else(|| {
        WorldBuilderError::parse(path, "string", format!("found {}", kind_of(node)))
    })
}

/// A point is an array of exactly `DIM` numeric literals.
pub fn parse_point<const DIM: usize>(path: &str, node: &Json) -> Result<Point<DIM>> {
    let expected = if DIM == 2 { "2d point" } else { "3d point" };
    let items = node.as_array().ok_or_else(|| {
        WorldBuilderError::parse(path, expected, format!("found {}", kind_of(node)))
    })?;
    if items.len() != DIM {
        return Err(WorldBuilderError::parse(
            path,
            expected,
            format!("expected {DIM} coordinates, found {}", items.len()),
        ));
    }
    let mut coordinates = [0.0; DIM];
    for (i, (slot, item)) in coordinates.iter_mut().zip(items).enumerate() {
        *slot = parse_double(&join_path(path, &i.to_string()), item)?;
    }
    Ok(Point::new(coordinates))
}

/// Keys of `node` must all appear in `known`.
pub fn check_known_keys(path: &str, node: &Json, known: &[&str]) -> Result<()> {
    let Some(map) = node.as_object() else {
        return Err(WorldBuilderError::parse(
            path,
            "object",
            format!("found {}", kind_of(node)),
        ));
    };
    match map.keys().find(|k| !known.contains(&k.as_str())) {
        Some(unknown) => Err(WorldBuilderError::config(
            path,
            format!("unknown entry `{unknown}`, expected one of {known:?}"),
        )),
        None => Ok(()),
    }
}
