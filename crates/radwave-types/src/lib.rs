//! Shared type definitions for the Radcliffe Wave animation driver.
//!
//! This crate is the single source of truth for the vocabulary used across
//! the radwave workspace: scene-object identifiers, layer-configuration
//! enumerations, and the small data structs that flow between the driver
//! and the visualization engine.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for layers and annotations
//! - [`enums`] -- Layer-configuration enumerations (frames, units, scaling)
//! - [`structs`] -- Core data structs (points, dataset rows, colors)

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{AltType, AltUnit, DatasetKind, MarkerScale, RaUnits, ReferenceFrame};
pub use ids::{AnnotationId, LayerId};
pub use structs::{Color, DataRow, Point3};
