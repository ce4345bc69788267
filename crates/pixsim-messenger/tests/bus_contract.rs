//! Producer uniqueness and event isolation across many detectors.

use std::sync::Arc;

use pixsim_core::{DetectorId, EventNumber, ModuleId, PixelIndex};
use pixsim_messenger::{
    DetectorScope, Message, MessageKind, Messenger, MessengerError, PixelCharge, Requirement,
};
use proptest::prelude::*;

fn pixel_message(detector: &str, n: usize) -> Message {
    let records: Vec<PixelCharge> = (0..n)
        .map(|i| PixelCharge {
            pixel: PixelIndex::new(i as i32, 0),
            charge: i as f64,
        })
        .collect();
    Message::new(Some(DetectorId::new(detector)), records)
}

proptest! {
    #[test]
    fn one_producer_per_detector_and_event(
        detectors in proptest::collection::vec(0u8..6, 1..20),
    ) {
        let mut bus = Messenger::new();
        bus.begin_event(EventNumber(1));
        let mut seen = std::collections::HashSet::new();
        for (i, d) in detectors.iter().enumerate() {
            let name = format!("plane{d}");
            let result = bus.dispatch(ModuleId(i as u32), pixel_message(&name, 1));
            if seen.insert(*d) {
                prop_assert!(result.is_ok());
            } else {
                let is_duplicate = matches!(result, Err(MessengerError::DuplicateProducer { .. }));
                prop_assert!(is_duplicate);
            }
        }
        prop_assert_eq!(bus.end_event(), seen.len());
    }
}

#[test]
fn consumers_see_producer_records_without_copies() {
    let consumer = ModuleId(9);
    let mut bus = Messenger::new();
    for name in ["plane0", "plane1"] {
        bus.subscribe(
            consumer,
            MessageKind::PixelCharge,
            DetectorScope::Detector(DetectorId::new(name)),
            Requirement::Required,
        )
        .unwrap();
    }

    for event in 1..=3 {
        bus.begin_event(EventNumber(event));
        let sent = bus.dispatch(ModuleId(0), pixel_message("plane0", 5)).unwrap();
        let got = bus
            .fetch(consumer, MessageKind::PixelCharge, &DetectorId::new("plane0"))
            .unwrap()
            .unwrap();
        assert!(Arc::ptr_eq(&sent, &got));
        assert_eq!(got.data::<PixelCharge>().unwrap().len(), 5);

        // plane1 was never produced: the required fetch fails, but only
        // within this event.
        assert!(matches!(
            bus.fetch(consumer, MessageKind::PixelCharge, &DetectorId::new("plane1")),
            Err(MessengerError::NoMessage { .. })
        ));
        bus.end_event();
    }
}
