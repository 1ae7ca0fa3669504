//! dog-axum: Axum adapter for the DogRS video proxy.
//!
//! Builds the router that serves byte ranges of stored objects
//! (`GET|HEAD /{*path}`), CORS preflights, `/health` and `/`.

pub mod app;
pub mod cors;
mod error;
pub mod health;
pub mod media;
pub mod state;

pub use error::DogAxumError;
pub use state::{ProxyState, ServiceInfo};

pub use app::{axum, AxumApp};
