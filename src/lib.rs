//! Parameterized geophysical worlds.
//!
//! A [`World`] is built from a JSON document describing geological features
//! laid out over a surface. Once built it answers temperature and composition
//! queries at any point by folding the features in declaration order over an
//! adiabatic background.
//!
//! ```no_run
//! use serde_json::json;
//! use world_builder::{Point, World};
//!
//! let world = World::new(json!({
//!     "Surface objects": {
//!         "ContinentalPlate": {
//!             "Coordinates": [[0, 0], [100e3, 0], [100e3, 100e3], [0, 100e3]],
//!             "Temperature submodule": {"name": "linear", "Depth": 150e3}
//!         }
//!     }
//! }))?;
//! let t = world.temperature(Point::new([50e3, 50e3, 0.0]), 10e3, 9.81)?;
//! # Ok::<(), world_builder::WorldBuilderError>(())
//! ```

pub mod coordinate_systems;
pub mod error;
pub mod features;
pub mod point;
pub mod registry;
pub mod schema;
pub mod world;

pub use coordinate_systems::{CoordinateSystem, CoordinateSystemKind};
pub use error::{Result, WorldBuilderError};
pub use features::Feature;
pub use point::Point;
pub use registry::Registry;
pub use schema::Parameters;
pub use world::{SectionCache, SectionRequest, World};
