//! Orchestration logic and port trait definitions for chatdocs.
//!
//! This crate defines the "ports" (record store, object store, processing
//! service) that the infrastructure layer implements, and the creation and
//! deletion orchestrators that keep those three consistent. It depends only
//! on `chatdocs-types` -- never on `chatdocs-infra` or any database/IO crate.

pub mod processing;
pub mod repository;
pub mod service;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;
