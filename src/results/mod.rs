//! Result types and per-provider sections
//!
//! This module defines the uniform result shape every provider maps into.

mod container;
mod types;

pub use container::{ProviderSection, SearchResults};
pub use types::*;
