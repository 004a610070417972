//! IPVS data types and structures.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// Error returned when a protocol, scheduler or forwarding method name
/// cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseError {
    kind: &'static str,
    value: String,
}

impl ParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// IP protocol for IPVS services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Protocol {
    #[default]
    TCP,
    UDP,
    SCTP,
}

impl Protocol {
    /// The ipvsadm option selecting a service of this protocol.
    pub fn service_flag(&self) -> &'static str {
        match self {
            Protocol::TCP => "-t",
            Protocol::UDP => "-u",
            Protocol::SCTP => "--sctp-service",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::TCP => write!(f, "TCP"),
            Protocol::UDP => write!(f, "UDP"),
            Protocol::SCTP => write!(f, "SCTP"),
        }
    }
}

impl FromStr for Protocol {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::TCP),
            "udp" => Ok(Protocol::UDP),
            "sctp" => Ok(Protocol::SCTP),
            _ => Err(ParseError::new("protocol", s)),
        }
    }
}

impl TryFrom<String> for Protocol {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Protocol> for String {
    fn from(p: Protocol) -> String {
        p.to_string().to_ascii_lowercase()
    }
}

/// IPVS scheduling algorithm.
///
/// Names the kernel does not ship a variant for are carried through as
/// `Other` and left for ipvsadm to accept or reject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Scheduler {
    RoundRobin,
    WeightedRoundRobin,
    LeastConnection,
    #[default]
    WeightedLeastConnection,
    SourceHashing,
    MaglevHashing,
    Other(String),
}

impl fmt::Display for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheduler::RoundRobin => write!(f, "rr"),
            Scheduler::WeightedRoundRobin => write!(f, "wrr"),
            Scheduler::LeastConnection => write!(f, "lc"),
            Scheduler::WeightedLeastConnection => write!(f, "wlc"),
            Scheduler::SourceHashing => write!(f, "sh"),
            Scheduler::MaglevHashing => write!(f, "mh"),
            Scheduler::Other(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for Scheduler {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let scheduler = match name.as_str() {
            "rr" => Scheduler::RoundRobin,
            "wrr" => Scheduler::WeightedRoundRobin,
            "lc" => Scheduler::LeastConnection,
            "wlc" => Scheduler::WeightedLeastConnection,
            "sh" => Scheduler::SourceHashing,
            "mh" => Scheduler::MaglevHashing,
            // Anything else must at least look like a kernel module suffix.
            other
                if !other.is_empty()
                    && other.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') =>
            {
                Scheduler::Other(other.to_string())
            }
            _ => return Err(ParseError::new("scheduler", s)),
        };
        Ok(scheduler)
    }
}

impl TryFrom<String> for Scheduler {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Scheduler> for String {
    fn from(s: Scheduler) -> String {
        s.to_string()
    }
}

/// Packet forwarding method for a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ForwardingMethod {
    /// NAT mode (masquerading)
    Masq,
    /// Route mode (DSR - Direct Server Return)
    Route,
    /// Tunnel mode (IP-in-IP)
    Tunnel,
}

impl ForwardingMethod {
    /// The ipvsadm option selecting this forwarding method.
    pub fn flag(&self) -> &'static str {
        match self {
            ForwardingMethod::Masq => "-m",
            ForwardingMethod::Route => "-g",
            ForwardingMethod::Tunnel => "-i",
        }
    }
}

impl fmt::Display for ForwardingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForwardingMethod::Masq => write!(f, "masq"),
            ForwardingMethod::Route => write!(f, "route"),
            ForwardingMethod::Tunnel => write!(f, "tunnel"),
        }
    }
}

impl FromStr for ForwardingMethod {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "masq" | "masquerading" | "nat" => Ok(ForwardingMethod::Masq),
            "route" | "gatewaying" | "dr" => Ok(ForwardingMethod::Route),
            "tunnel" | "ipip" => Ok(ForwardingMethod::Tunnel),
            _ => Err(ParseError::new("forwarding method", s)),
        }
    }
}

impl TryFrom<String> for ForwardingMethod {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ForwardingMethod> for String {
    fn from(m: ForwardingMethod) -> String {
        m.to_string()
    }
}

/// An IPVS service (virtual server).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Service {
    pub address: IpAddr,
    pub port: u16,
    pub protocol: Protocol,
    pub scheduler: Scheduler,
}

impl Service {
    /// The address clients connect to.
    pub fn endpoint(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.protocol, self.endpoint(), self.scheduler)
    }
}

/// An IPVS destination (real server).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Destination {
    pub address: IpAddr,
    pub port: u16,
    pub weight: u32,
    pub forwarding: Option<ForwardingMethod>,
}

impl Destination {
    /// A destination with weight 1 and the ipvsadm default forwarding method.
    pub fn new(address: IpAddr, port: u16) -> Self {
        Self {
            address,
            port,
            weight: 1,
            forwarding: None,
        }
    }

    pub fn endpoint(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.endpoint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_protocol_is_case_insensitive() {
        assert_eq!("TCP".parse::<Protocol>().unwrap(), Protocol::TCP);
        assert_eq!("Udp".parse::<Protocol>().unwrap(), Protocol::UDP);
        assert_eq!(" sctp ".parse::<Protocol>().unwrap(), Protocol::SCTP);
        assert!("icmp".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_protocol_service_flag() {
        assert_eq!(Protocol::TCP.service_flag(), "-t");
        assert_eq!(Protocol::UDP.service_flag(), "-u");
        assert_eq!(Protocol::SCTP.service_flag(), "--sctp-service");
    }

    #[test]
    fn test_scheduler_known_and_passthrough() {
        assert_eq!("rr".parse::<Scheduler>().unwrap(), Scheduler::RoundRobin);
        assert_eq!("WLC".parse::<Scheduler>().unwrap(), Scheduler::WeightedLeastConnection);
        assert_eq!(
            "sed".parse::<Scheduler>().unwrap(),
            Scheduler::Other("sed".to_string())
        );
        assert_eq!(Scheduler::Other("nq".to_string()).to_string(), "nq");
    }

    #[test]
    fn test_scheduler_rejects_garbage() {
        assert!("".parse::<Scheduler>().is_err());
        assert!("rr; rm -rf /".parse::<Scheduler>().is_err());
    }

    #[test]
    fn test_scheduler_default_matches_ipvsadm() {
        assert_eq!(Scheduler::default().to_string(), "wlc");
    }

    #[test]
    fn test_forwarding_aliases() {
        assert_eq!("nat".parse::<ForwardingMethod>().unwrap(), ForwardingMethod::Masq);
        assert_eq!("dr".parse::<ForwardingMethod>().unwrap(), ForwardingMethod::Route);
        assert_eq!("ipip".parse::<ForwardingMethod>().unwrap(), ForwardingMethod::Tunnel);
        assert_eq!(ForwardingMethod::Tunnel.flag(), "-i");
    }

    #[test]
    fn test_ipv6_endpoint_is_bracketed() {
        let service = Service {
            address: IpAddr::V6(Ipv6Addr::LOCALHOST),
            port: 443,
            protocol: Protocol::TCP,
            scheduler: Scheduler::RoundRobin,
        };
        assert_eq!(service.endpoint().to_string(), "[::1]:443");
        assert_eq!(service.to_string(), "TCP [::1]:443 (rr)");
    }

    #[test]
    fn test_destination_defaults() {
        let dest = Destination::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10)), 8080);
        assert_eq!(dest.weight, 1);
        assert_eq!(dest.forwarding, None);
        assert_eq!(dest.to_string(), "192.168.1.10:8080");
    }
}
