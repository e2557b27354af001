//! HTTP access to the external document-processing service.
//!
//! `client` drives the two lifecycle endpoints used by the orchestrators;
//! `proxy` replays arbitrary authenticated requests for the frontend.

pub mod client;
pub mod proxy;

pub use client::HttpProcessingClient;
pub use proxy::ProcessingProxy;
