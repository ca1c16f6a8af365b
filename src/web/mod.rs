//! Web server module
//!
//! JSON API over the search library: login, search, and the per-session
//! selection of results.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use handlers::{SearchRequest, SearchResponse};
pub use routes::create_router;
pub use state::{AppState, SESSION_HEADER};
