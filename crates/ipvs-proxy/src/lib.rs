//! ipvs-proxy: declarative IPVS load balancing
//!
//! Reads a YAML description of one virtual service and its backends, then
//! installs it in the kernel IPVS table through `ipvsadm`.
//!
//! # Components
//!
//! - **Config**: YAML loading and validation
//! - **Cli**: command line flags for the `ipvs-proxy` binary
//! - **Plan**: rendering of the ipvsadm commands an apply would run

pub mod cli;
pub mod config;
pub mod plan;

pub use cli::{Cli, PlanFormat};
pub use config::{BackendSpec, Config, ConfigError, LogFormat, LoggingSettings, ServiceSpec};
pub use plan::render_plan;
