pub mod cache;
pub mod engine;
pub mod handlers;
pub mod rules;
pub mod slices;

use serde_json::Value;

/// The open-ended structured value rules read and augment.
pub type Descriptor = Value;
