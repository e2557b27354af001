//! REST API layer built on axum.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
