//! Business logic services (use cases).
//!
//! Services orchestrate record-store, object-store and processing-service
//! calls. They depend on traits (ports) -- never on concrete infrastructure
//! implementations.

pub mod chatbot;
pub mod creation;
pub mod credentials;
pub mod deletion;
pub mod user;
pub mod user_deletion;
