/// Desync detection with SimMirror
///
/// Server and client run the same game side by side. Tampering with the
/// client's world must be reported at exactly the tick it first shows up.

use std::sync::{Arc, Mutex};

use lockstep_shared::{InputFrame, MirrorDesyncEvent, SimMirror, Simulation, Tick};
use lockstep_test::{init_logger, test_world::encode_inputs, Health, TestSim};

fn inputs(ticks: std::ops::RangeInclusive<Tick>) -> Vec<Vec<u8>> {
    ticks
        .map(|tick| {
            let dx = (tick % 3) as f32 - 1.0;
            encode_inputs(&[InputFrame::new(tick as u32, 1, dx, 0.5)])
        })
        .collect()
}

fn mirror() -> SimMirror<TestSim, TestSim> {
    SimMirror::new(TestSim::new(9, 1, 30), TestSim::new(9, 1, 30))
}

#[test]
fn test_identical_sides_never_desync() {
    init_logger();
    let mut mirror = mirror();
    assert_eq!(mirror.run_frames(inputs(1..=50)), None);
    assert_eq!(mirror.frame_count(), 50);
    assert!(!mirror.has_desync());
}

#[test]
fn test_tampered_client_desyncs_at_next_tick() {
    init_logger();
    let mut mirror = mirror();
    assert_eq!(mirror.run_frames(inputs(1..=6)), None);

    let player = mirror.client().players()[0];
    if let Some(health) = mirror
        .client_mut()
        .store_mut()
        .get_component_mut::<Health>(player)
    {
        health.0 -= 1;
    }

    assert_eq!(mirror.run_frames(inputs(7..=20)), Some(7));
    let event = mirror.first_desync().unwrap();
    assert_eq!(event.tick, 7);
    assert_ne!(event.server_hash, event.client_hash);
    assert_eq!(mirror.frame_count(), 7);
}

#[test]
fn test_desync_callback_and_history() {
    init_logger();
    let events: Arc<Mutex<Vec<MirrorDesyncEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);

    let mut mirror = mirror();
    mirror.set_desync_callback(move |event| sink.lock().unwrap().push(*event));
    mirror.run_frames(inputs(1..=3));

    let player = mirror.server().players()[0];
    if let Some(health) = mirror
        .server_mut()
        .store_mut()
        .get_component_mut::<Health>(player)
    {
        health.0 = 1;
    }

    // Once diverged, the ladders stay apart on every later tick
    for input in inputs(4..=6) {
        assert!(!mirror.step(&input));
    }
    let ticks: Vec<Tick> = mirror.desyncs().iter().map(|event| event.tick).collect();
    assert_eq!(ticks, vec![4, 5, 6]);
    assert_eq!(events.lock().unwrap().len(), 3);

    mirror.reset();
    assert!(!mirror.has_desync());
    assert_eq!(mirror.frame_count(), 0);
    assert_eq!(mirror.server().current_tick(), 6);
}

#[test]
fn test_disabled_mirror_does_not_step() {
    let mut mirror = mirror();
    mirror.set_enabled(false);
    assert!(!mirror.is_enabled());
    assert_eq!(mirror.run_frames(inputs(1..=5)), None);
    assert_eq!(mirror.frame_count(), 0);
    assert_eq!(mirror.client().current_tick(), 0);
}
