//! # Menu API
//! 
//! HTTP handlers, response envelope and router for the menu builder.

pub mod handlers;
pub mod error;
pub mod response;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
