//! IPVS (IP Virtual Server) management through the `ipvsadm` utility.
//!
//! The kernel owns every piece of load-balancing state. This crate only
//! builds ipvsadm argument vectors, runs them in order and checks their exit
//! status.
//!
//! # Example
//!
//! ```no_run
//! use ipvs::{Destination, Handler, Protocol, Scheduler, Service};
//! use std::net::{IpAddr, Ipv4Addr};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = Handler::new()?;
//!
//! let service = Service {
//!     address: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
//!     port: 80,
//!     protocol: Protocol::TCP,
//!     scheduler: Scheduler::RoundRobin,
//! };
//! let backends = vec![
//!     Destination::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10)), 8080),
//!     Destination::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 11)), 8080),
//! ];
//!
//! handler.apply(&service, &backends)?;
//! println!("{}", handler.show_status()?);
//! handler.close();
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod runner;
mod types;

pub use commands::{IPVSADM, IpvsadmCommand, PlannedCommand, plan};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
pub use types::{Destination, ForwardingMethod, ParseError, Protocol, Scheduler, Service};

use common::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Applies IPVS configuration by invoking ipvsadm.
pub struct Handler<R = SystemRunner> {
    runner: R,
    program: PathBuf,
}

impl Handler<SystemRunner> {
    /// Create a handler backed by the ipvsadm binary found on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolNotFound`] if ipvsadm is not installed. It only
    /// exists on Linux.
    pub fn new() -> Result<Self> {
        let program = which::which(IPVSADM).map_err(|e| Error::ToolNotFound {
            tool: IPVSADM.to_string(),
            reason: format!(
                "{}; ipvsadm is required and only available on Linux systems",
                e
            ),
        })?;
        debug!(path = %program.display(), "Found ipvsadm");
        Ok(Self::with_runner(SystemRunner, program))
    }
}

impl<R: CommandRunner> Handler<R> {
    /// Create a handler that runs `program` through `runner`.
    pub fn with_runner(runner: R, program: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    /// Path of the ipvsadm binary in use.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Replace the kernel table with `service` and its `destinations`.
    ///
    /// Existing rules are cleared first; a failed clear is logged and the
    /// apply carries on. Destinations are added in the given order and the
    /// first failure aborts the remaining ones.
    pub fn apply(&self, service: &Service, destinations: &[Destination]) -> Result<()> {
        if destinations.is_empty() {
            warn!(service = %service, "Virtual service has no backends");
        }

        for cmd in plan(service, destinations) {
            match self.execute(&cmd) {
                Ok(_) => {
                    if let IpvsadmCommand::AddDestination(_, dest) = &cmd {
                        info!(weight = dest.weight, "Added backend {}", dest);
                    } else {
                        debug!(command = %cmd, "Command succeeded");
                    }
                }
                Err(e) if matches!(cmd, IpvsadmCommand::Clear) => {
                    warn!(error = %e, "Failed to clear existing rules");
                }
                Err(e) => {
                    return Err(Error::ipvs(cmd.describe(), e));
                }
            }
        }

        info!(
            "Created virtual server {} [{}]",
            service.endpoint(),
            service.scheduler
        );
        Ok(())
    }

    /// List the current IPVS table (`ipvsadm -L -n`).
    ///
    /// The listing is logged verbatim and returned unparsed.
    pub fn show_status(&self) -> Result<String> {
        info!("Current IPVS configuration:");
        let cmd = IpvsadmCommand::List;
        let output = self
            .execute(&cmd)
            .map_err(|e| Error::ipvs(cmd.describe(), e))?;
        info!("\n{}", output.stdout);
        Ok(output.stdout)
    }

    /// Release the handler. No kernel state is held between commands.
    pub fn close(self) {
        debug!(path = %self.program.display(), "IPVS handler closed");
    }

    fn execute(&self, cmd: &IpvsadmCommand) -> Result<CommandOutput> {
        let output = self.runner.run(&self.program, &cmd.args())?;
        if output.success() {
            Ok(output)
        } else {
            Err(Error::CommandFailed {
                command: cmd.to_string(),
                code: output.code,
                stderr: output.stderr,
            })
        }
    }
}
