//! Infrastructure configuration modules.

pub mod auth;
pub mod cache;
pub mod database;
pub mod device;
pub mod logging;
pub mod settings;

pub use settings::Config;
