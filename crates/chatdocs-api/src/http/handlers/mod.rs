//! HTTP request handlers for the REST API.

pub mod auth;
pub mod chatbot;
pub mod proxy;
