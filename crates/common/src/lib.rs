//! Common utilities and types shared across the ipvs-proxy crates.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
