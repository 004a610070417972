//! ipvsadm command construction.
//!
//! Each variant maps to exactly one ipvsadm invocation. Argument vectors are
//! built here and nowhere else so the handler, the dry-run printer and the
//! tests all agree on what gets executed.

use crate::types::{Destination, Service};
use serde::Serialize;
use std::fmt;

/// Name of the administration binary.
pub const IPVSADM: &str = "ipvsadm";

/// A single ipvsadm invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpvsadmCommand {
    /// Clear the whole virtual server table (`-C`)
    Clear,
    /// Add a virtual service (`-A`)
    AddService(Service),
    /// Add a real server to a virtual service (`-a`)
    AddDestination(Service, Destination),
    /// List the table with numeric addresses (`-L -n`)
    List,
}

impl IpvsadmCommand {
    /// Argument vector passed to ipvsadm, without the program name.
    pub fn args(&self) -> Vec<String> {
        match self {
            IpvsadmCommand::Clear => vec!["-C".to_string()],
            IpvsadmCommand::AddService(service) => vec![
                "-A".to_string(),
                service.protocol.service_flag().to_string(),
                service.endpoint().to_string(),
                "-s".to_string(),
                service.scheduler.to_string(),
            ],
            IpvsadmCommand::AddDestination(service, dest) => {
                let mut args = vec![
                    "-a".to_string(),
                    service.protocol.service_flag().to_string(),
                    service.endpoint().to_string(),
                    "-r".to_string(),
                    dest.endpoint().to_string(),
                ];
                if let Some(method) = dest.forwarding {
                    args.push(method.flag().to_string());
                }
                args.push("-w".to_string());
                args.push(dest.weight.to_string());
                args
            }
            IpvsadmCommand::List => vec!["-L".to_string(), "-n".to_string()],
        }
    }

    /// Short description used in log lines and error messages.
    pub fn describe(&self) -> String {
        match self {
            IpvsadmCommand::Clear => "clear existing rules".to_string(),
            IpvsadmCommand::AddService(_) => "add virtual service".to_string(),
            IpvsadmCommand::AddDestination(_, dest) => format!("add backend {}", dest),
            IpvsadmCommand::List => "get IPVS status".to_string(),
        }
    }
}

impl fmt::Display for IpvsadmCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", IPVSADM, self.args().join(" "))
    }
}

/// Serializable view of a command for machine-readable plans.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedCommand {
    pub description: String,
    pub program: &'static str,
    pub args: Vec<String>,
}

impl From<&IpvsadmCommand> for PlannedCommand {
    fn from(cmd: &IpvsadmCommand) -> Self {
        Self {
            description: cmd.describe(),
            program: IPVSADM,
            args: cmd.args(),
        }
    }
}

/// Commands that install `service` with `destinations`, in execution order:
/// clear, add the service, then each destination as listed.
pub fn plan(service: &Service, destinations: &[Destination]) -> Vec<IpvsadmCommand> {
    let mut commands = Vec::with_capacity(destinations.len() + 2);
    commands.push(IpvsadmCommand::Clear);
    commands.push(IpvsadmCommand::AddService(service.clone()));
    commands.extend(
        destinations
            .iter()
            .map(|d| IpvsadmCommand::AddDestination(service.clone(), d.clone())),
    );
    commands
}
