/// Prediction, correction and replay
///
/// The client predicts a run of inputs, then learns that one tick's input
/// was different. Rolling back to the tick before and replaying the
/// corrected inputs must land on exactly the state and hash ladder of a run
/// that used the corrected inputs from the start.

use lockstep_shared::{InputFrame, NetConfig, NetContext, NetMode, StateHasher, Tick};
use lockstep_test::{
    assert_ladders_match, init_logger,
    test_world::{apply_input, movement_system},
    Position, TestSim,
};

const SEED: u64 = 77;
const TICKS: Tick = 12;

fn predicted(tick: Tick) -> InputFrame {
    InputFrame::new(tick as u32, 1, 1.0, 0.0)
}

fn corrected(tick: Tick, wrong_tick: Tick) -> InputFrame {
    if tick == wrong_tick {
        InputFrame::new(tick as u32, 1, 0.0, 3.0)
    } else {
        predicted(tick)
    }
}

/// Steps `sim`'s store the way a NetContext replays: input, one fixed step,
/// then a rung over the store bytes and the frame bytes
fn run_reference(frames: &[InputFrame]) -> (TestSim, StateHasher) {
    let mut sim = TestSim::new(SEED, 1, 30);
    let mut hasher = StateHasher::new(SEED);
    let delta_time = sim.fixed_delta_time();
    for frame in frames {
        apply_input(sim.store_mut(), frame);
        movement_system(sim.store_mut(), delta_time);
        hasher.advance_tick(
            Tick::from(frame.tick),
            &sim.store().serialize(),
            &frame.to_bytes(),
        );
    }
    (sim, hasher)
}

fn predicting_client() -> NetContext {
    let mut context = NetContext::new(NetConfig::default());
    context.init(NetMode::Client);
    context.set_input_apply_callback(apply_input);
    context
}

#[test]
fn test_correction_replays_to_authoritative_state() {
    init_logger();
    let wrong_tick = 5;

    // Predicted run, snapshotting after every tick
    let mut context = predicting_client();
    let mut sim = TestSim::new(SEED, 1, 30);
    let mut hasher = StateHasher::new(SEED);
    let delta_time = sim.fixed_delta_time();
    for tick in 1..=TICKS {
        let frame = predicted(tick);
        context.record_input(frame);
        apply_input(sim.store_mut(), &frame);
        sim.store_mut().update(delta_time);
        hasher.advance_tick(tick, &sim.store().serialize(), &frame.to_bytes());
        context.save_snapshot(tick, sim.store());
    }

    let corrected_frames: Vec<InputFrame> =
        (1..=TICKS).map(|tick| corrected(tick, wrong_tick)).collect();
    let (authority, authority_hasher) = run_reference(&corrected_frames);
    assert_eq!(hasher.find_divergence(&authority_hasher), Some(wrong_tick));

    // Correction arrives: rewind to the last agreed tick and replay
    context.rollback_to(wrong_tick - 1, sim.store_mut()).unwrap();
    hasher.rewind_to(wrong_tick);
    context.clear_recorded_inputs();
    for frame in &corrected_frames {
        context.record_input(*frame);
    }
    let replayed = context.replay_and_rehash(wrong_tick, sim.store_mut(), &mut hasher);

    assert_eq!(replayed, (TICKS - wrong_tick + 1) as usize);
    assert_eq!(sim.store().serialize(), authority.store().serialize());
    assert_eq!(hasher.history(), authority_hasher.history());
    assert_ladders_match!(&hasher, &authority_hasher);
    assert_eq!(context.snapshot_count(), (wrong_tick - 1) as usize);
}

#[test]
fn test_rollback_then_replay_same_inputs_is_identity() {
    init_logger();
    let frames: Vec<InputFrame> = (1..=TICKS).map(predicted).collect();
    let (expected, expected_hasher) = run_reference(&frames);

    let mut context = predicting_client();
    let mut sim = TestSim::new(SEED, 1, 30);
    context.save_snapshot(0, sim.store());
    for frame in &frames {
        context.record_input(*frame);
    }

    let mut hasher = StateHasher::new(SEED);
    context.rollback_to(0, sim.store_mut()).unwrap();
    context.replay_and_rehash(1, sim.store_mut(), &mut hasher);

    assert_eq!(hasher.history(), expected_hasher.history());
    let position = sim.store().get_component::<Position>(sim.players()[0]);
    assert_eq!(position, expected.store().get_component::<Position>(expected.players()[0]));
}

#[test]
fn test_snapshot_restore_through_sim() {
    init_logger();
    let mut sim = TestSim::new(SEED, 2, 30);
    let mut context = predicting_client();
    let delta_time = sim.fixed_delta_time();

    for tick in 1..=4 {
        apply_input(sim.store_mut(), &predicted(tick));
        sim.store_mut().update(delta_time);
        context.save_snapshot(tick, sim.store());
    }
    let at_two = context
        .snapshots()
        .find(|snapshot| snapshot.tick == 2)
        .map(|snapshot| snapshot.ecs_data.clone())
        .unwrap();

    sim.restore(2, &at_two).unwrap();
    assert_eq!(sim.store().serialize(), at_two);
    assert!(sim.restore(2, &at_two[..5]).is_err());
    assert_eq!(sim.store().serialize(), at_two);
}
