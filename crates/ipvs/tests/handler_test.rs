//! Handler behaviour against a recording runner (no kernel access needed).

use common::Error;
use ipvs::{CommandOutput, CommandRunner, Destination, Handler, Protocol, Scheduler, Service};
use std::cell::RefCell;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

/// Records every invocation and fails the ones whose args contain `fail_on`.
#[derive(Default)]
struct RecordingRunner {
    calls: RefCell<Vec<Vec<String>>>,
    fail_on: Option<&'static str>,
}

impl RecordingRunner {
    fn failing_on(needle: &'static str) -> Self {
        Self {
            fail_on: Some(needle),
            ..Default::default()
        }
    }
}

impl CommandRunner for &RecordingRunner {
    fn run(&self, _program: &Path, args: &[String]) -> common::Result<CommandOutput> {
        self.calls.borrow_mut().push(args.to_vec());
        match self.fail_on {
            Some(needle) if args.iter().any(|a| a == needle) => {
                Ok(CommandOutput::failed(2, format!("rejected {}", needle)))
            }
            _ => Ok(CommandOutput::ok("")),
        }
    }
}

fn service() -> Service {
    Service {
        address: IpAddr::V4(Ipv4Addr::new(10, 96, 0, 10)),
        port: 53,
        protocol: Protocol::UDP,
        scheduler: Scheduler::WeightedRoundRobin,
    }
}

fn backends() -> Vec<Destination> {
    (1..=3)
        .map(|i| Destination::new(IpAddr::V4(Ipv4Addr::new(10, 244, 0, i)), 5353))
        .collect()
}

#[test]
fn test_full_apply_sequence() {
    let runner = RecordingRunner::default();
    let handler = Handler::with_runner(&runner, "ipvsadm");

    handler.apply(&service(), &backends()).unwrap();

    let calls = runner.calls.borrow();
    assert_eq!(calls.len(), 5);
    assert_eq!(calls[0], vec!["-C"]);
    assert_eq!(calls[1], vec!["-A", "-u", "10.96.0.10:53", "-s", "wrr"]);
    for (i, call) in calls[2..].iter().enumerate() {
        let real = format!("10.244.0.{}:5353", i + 1);
        assert_eq!(
            call,
            &vec!["-a", "-u", "10.96.0.10:53", "-r", real.as_str(), "-w", "1"]
        );
    }
}

#[test]
fn test_clear_failure_is_not_fatal() {
    let runner = RecordingRunner::failing_on("-C");
    let handler = Handler::with_runner(&runner, "ipvsadm");

    handler.apply(&service(), &backends()).unwrap();
    assert_eq!(runner.calls.borrow().len(), 5);
}

#[test]
fn test_backend_failure_aborts_remaining() {
    let runner = RecordingRunner::failing_on("10.244.0.2:5353");
    let handler = Handler::with_runner(&runner, "ipvsadm");

    let err = handler.apply(&service(), &backends()).unwrap_err();

    assert!(matches!(err, Error::IPVS { .. }));
    let source = std::error::Error::source(&err).expect("command failure kept as source");
    assert!(source.to_string().contains("rejected 10.244.0.2:5353"));
    let msg = err.to_string();
    assert!(msg.contains("failed to add backend 10.244.0.2:5353"), "{}", msg);
    assert!(msg.contains("rejected 10.244.0.2:5353"), "{}", msg);
    // clear, service, backend 1, backend 2 (failed); backend 3 never runs
    assert_eq!(runner.calls.borrow().len(), 4);
}

#[test]
fn test_show_status_runs_numeric_listing() {
    let runner = RecordingRunner::default();
    let handler = Handler::with_runner(&runner, "ipvsadm");

    handler.show_status().unwrap();
    assert_eq!(*runner.calls.borrow(), vec![vec!["-L", "-n"]]);
}
