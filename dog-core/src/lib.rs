//! dog-core: framework-agnostic core for DogRS.
//!
//! Holds the pieces every other crate leans on: structured errors
//! and the key/value configuration store.

pub mod config;
pub mod errors;

pub use config::DogConfig;
pub use errors::{DogError, ErrorKind};
