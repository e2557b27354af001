//! Repository trait definitions (ports).
//!
//! These traits define the record-store interface that the infrastructure
//! layer (chatdocs-infra) implements. The core crate never depends on any
//! specific storage technology.

pub mod chatbot;
pub mod token;
pub mod user;
