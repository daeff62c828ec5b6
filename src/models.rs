//! Lean Graph and Resource Manager models.
//!
//! Each model decodes the identifying fields the collector relies on and keeps every other
//! property in an untyped `extra` map, so new API fields never break decoding.

pub mod graph;
pub mod resource_id;
pub mod resource_manager;

pub use graph::*;
pub use resource_id::*;
pub use resource_manager::*;

/// Untyped remainder of a JSON object.
pub type Extra = serde_json::Map<String, serde_json::Value>;
