//! Shared domain types for the chatdocs gateway.
//!
//! Chatbots, users, the saga/teardown lifecycle markers and the error
//! taxonomy used across the workspace.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror, bytes.

pub mod chatbot;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod user;
