//! Search orchestration module
//!
//! Fans a query out to the three providers through the session cache and
//! collects the per-provider sections.

mod executor;
mod models;

pub use executor::{Search, SearchError};
pub use models::*;
