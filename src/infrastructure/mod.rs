//! Infrastructure: configuration, authentication and runtime wiring.

pub mod auth;
pub mod bootstrap;
pub mod config;
