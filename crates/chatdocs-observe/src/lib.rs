//! Observability setup shared by the `chatdocs` binary.

pub mod tracing_setup;
