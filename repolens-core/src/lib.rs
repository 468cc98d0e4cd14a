//! Repolens Core - shared error, configuration, and data types
//!
//! This crate defines the abstractions shared by the analytics engine and
//! the web surface.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;
