//! Per-event failure handling across the whole pipeline.

use pixsim_core::{Configuration, DetectorId, EventNumber};
use pixsim_engine::{SetupError, Simulation, SimulationConfig};
use pixsim_messenger::{MessageKind, MessengerError, Requirement};
use pixsim_module::{ModuleError, OrderError};
use pixsim_test_utils::{init_test_logging, test_model, CaptureModule, MockModule};

fn base() -> SimulationConfig {
    SimulationConfig::new().with_detector("dut", test_model())
}

#[test]
fn recoverable_failure_skips_only_that_event() {
    init_test_logging();
    let producer = MockModule::new("producer")
        .on("dut")
        .publishes(MessageKind::PixelCharge)
        .failing_at(
            EventNumber(2),
            ModuleError::ExecutionFailed {
                reason: "no hits".into(),
            },
        );
    let consumer = MockModule::new("consumer")
        .on("dut")
        .subscribes(MessageKind::PixelCharge, Requirement::Required);
    let capture = CaptureModule::new(MessageKind::PixelCharge);
    let captured = capture.captured();
    let consumer_log = consumer.calls();

    let mut sim = Simulation::new(
        base()
            .with_module(capture, Configuration::new("Capture"))
            .with_module(consumer, Configuration::new("consumer"))
            .with_module(producer, Configuration::new("producer")),
    )
    .unwrap();

    let summary = sim.run(4);
    assert_eq!(summary.events_completed, 3);
    assert_eq!(summary.failed_events.len(), 1);
    assert_eq!(summary.failed_events[0].event, EventNumber(2));
    assert_eq!(summary.failed_events[0].module, "producer");
    assert!(summary.aborted.is_none());

    // The consumer never saw event 2, and nothing from an earlier event
    // leaked into a later one.
    assert_eq!(
        consumer_log.runs(),
        vec![EventNumber(1), EventNumber(3), EventNumber(4)]
    );
    let events: Vec<EventNumber> = captured.messages().iter().map(|m| m.event()).collect();
    assert_eq!(events, vec![EventNumber(1), EventNumber(3), EventNumber(4)]);
    assert_eq!(sim.events_completed(), 3);
}

#[test]
fn non_recoverable_failure_stops_the_run() {
    let m = MockModule::new("reader").failing_at(
        EventNumber(2),
        ModuleError::NonRecoverable {
            reason: "lost file".into(),
        },
    );
    let calls = m.calls();
    let mut sim = Simulation::new(base().with_module(m, Configuration::new("reader"))).unwrap();

    let summary = sim.run(10);
    assert_eq!(summary.events_completed, 1);
    let aborted = summary.aborted.expect("run should abort");
    assert_eq!(aborted.event, EventNumber(2));
    assert!(!aborted.is_recoverable());
    assert_eq!(calls.runs(), vec![EventNumber(1), EventNumber(2)]);

    sim.finalize().unwrap();
    assert_eq!(calls.finalized(), vec![1]);
}

#[test]
fn required_cycle_is_a_setup_error() {
    let a = MockModule::new("a")
        .on("dut")
        .publishes(MessageKind::DepositedCharge)
        .subscribes(MessageKind::PixelCharge, Requirement::Required);
    let b = MockModule::new("b")
        .on("dut")
        .publishes(MessageKind::PixelCharge)
        .subscribes(MessageKind::DepositedCharge, Requirement::Required);
    let err = Simulation::new(
        base()
            .with_module(a, Configuration::new("a"))
            .with_module(b, Configuration::new("b")),
    )
    .err()
    .expect("cycle must be rejected");
    assert!(matches!(
        err,
        SetupError::Order(OrderError::CyclicDependency { .. })
    ));
}

#[test]
fn duplicate_producer_fails_the_event_but_not_the_run() {
    let first = MockModule::new("first")
        .on("dut")
        .publishes(MessageKind::PixelCharge);
    let second = MockModule::new("second")
        .on("dut")
        .publishes(MessageKind::PixelCharge);
    let mut sim = Simulation::new(
        base()
            .with_module(first, Configuration::new("first"))
            .with_module(second, Configuration::new("second")),
    )
    .unwrap();

    let err = sim.run_event().unwrap_err();
    assert_eq!(err.module, "second");
    assert_eq!(err.detector, Some(DetectorId::new("dut")));
    assert!(matches!(
        err.source,
        ModuleError::Messenger(MessengerError::DuplicateProducer { .. })
    ));
    assert!(err.is_recoverable());

    // The bus was reset, so the next event fails the same way rather than
    // on a stale message from event 1.
    let err = sim.run_event().unwrap_err();
    assert_eq!(err.event, EventNumber(2));
    assert_eq!(sim.next_event(), EventNumber(3));
}

#[test]
fn unbound_module_sees_messages_from_every_detector() {
    let capture = CaptureModule::new(MessageKind::PixelCharge);
    let captured = capture.captured();
    let mut sim = Simulation::new(
        base()
            .with_detector("ref", test_model())
            .with_module(capture, Configuration::new("Capture"))
            .with_module(
                MockModule::new("p1").on("dut").publishes(MessageKind::PixelCharge),
                Configuration::new("p1"),
            )
            .with_module(
                MockModule::new("p2").on("ref").publishes(MessageKind::PixelCharge),
                Configuration::new("p2"),
            ),
    )
    .unwrap();

    let metrics = sim.run_event().unwrap();
    assert_eq!(metrics.messages_dispatched, 2);
    let got = captured.in_event(EventNumber(1));
    let detectors: Vec<_> = got.iter().filter_map(|m| m.detector().cloned()).collect();
    assert_eq!(detectors, vec![DetectorId::new("dut"), DetectorId::new("ref")]);
}
