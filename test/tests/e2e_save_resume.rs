/// Save, load and resume; record and verify a replay
///
/// A game saved mid-run and resumed from the file must end in the same
/// state as an uninterrupted run. A recorded replay played back into a
/// fresh game must reproduce every recorded hash.

use lockstep_shared::{
    point_hash, InputFrame, ReplayRecorder, ReplayState, SaveData, SaveSystem, Simulation, Tick,
};
use lockstep_test::{init_logger, test_world::encode_inputs, TestSim};

const SEED: u64 = 2024;
const TICK_RATE: u32 = 30;

fn input_for(tick: Tick) -> Vec<u8> {
    let dx = if tick % 2 == 0 { 2.0 } else { -1.0 };
    encode_inputs(&[
        InputFrame::new(tick as u32, 1, dx, 0.0),
        InputFrame::new(tick as u32, 2, 0.0, dx),
    ])
}

#[test]
fn test_resume_from_save_matches_uninterrupted_run() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("midgame.sav");

    let mut uninterrupted = TestSim::new(SEED, 2, TICK_RATE);
    for tick in 1..=20 {
        uninterrupted.step(&input_for(tick));
    }

    let mut first_half = TestSim::new(SEED, 2, TICK_RATE);
    for tick in 1..=10 {
        first_half.step(&input_for(tick));
    }
    let ecs_data = first_half.store().serialize();
    let saves = SaveSystem::new();
    saves
        .save(
            &path,
            &SaveData {
                tick: first_half.current_tick(),
                tick_rate: TICK_RATE,
                seed: SEED as u32,
                ecs_data: &ecs_data,
                aux_data: &[],
                metadata: "halfway",
            },
        )
        .unwrap();

    let mut loader = SaveSystem::new();
    loader.load(&path).unwrap();
    assert_eq!(loader.header().save_tick, 10);
    assert_eq!(loader.header().state_hash, point_hash(&ecs_data, &[]));
    assert_eq!(loader.metadata(), "halfway");

    let mut resumed = TestSim::new(u64::from(loader.header().seed), 2, loader.header().tick_rate);
    resumed
        .restore(loader.header().save_tick, loader.ecs_data())
        .unwrap();
    assert_eq!(resumed.current_tick(), 10);
    for tick in 11..=20 {
        resumed.step(&input_for(tick));
    }

    assert_eq!(resumed.current_tick(), 20);
    assert_eq!(resumed.store().serialize(), uninterrupted.store().serialize());
    // The resumed ladder starts at the first tick after the save
    let ticks: Vec<Tick> = resumed.hasher().history().iter().map(|entry| entry.tick).collect();
    assert_eq!(ticks, (11..=20).collect::<Vec<Tick>>());
}

#[test]
fn test_replay_file_reproduces_every_hash() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.rply");

    let mut recorder = ReplayRecorder::new();
    recorder.start_recording(TICK_RATE, SEED as u32);
    let mut live = TestSim::new(SEED, 2, TICK_RATE);
    for tick in 1..=25 {
        let input = input_for(tick);
        live.step(&input);
        recorder.record_frame(tick as u32, &input, live.world_hash());
    }
    recorder.stop_recording();
    recorder.save_replay(&path).unwrap();

    let mut playback = ReplayRecorder::new();
    playback.load_replay(&path).unwrap();
    assert_eq!(playback.state(), ReplayState::Playing);
    assert_eq!(playback.frame_count(), 25);
    assert_eq!(playback.duration_ticks(), 25);

    let header = playback.header().clone();
    let mut replayed = TestSim::new(u64::from(header.seed), 2, header.tick_rate);
    for frame in playback.frames() {
        replayed.step(&frame.input);
        assert_eq!(
            replayed.world_hash(),
            frame.state_hash,
            "replay diverged at tick {}",
            frame.tick
        );
    }
    assert_eq!(replayed.store().serialize(), live.store().serialize());
}

#[test]
fn test_corrupted_save_refuses_to_resume() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.sav");

    let sim = TestSim::new(SEED, 1, TICK_RATE);
    let ecs_data = sim.store().serialize();
    SaveSystem::new()
        .save(
            &path,
            &SaveData {
                tick: 0,
                tick_rate: TICK_RATE,
                seed: SEED as u32,
                ecs_data: &ecs_data,
                aux_data: &[],
                metadata: "",
            },
        )
        .unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x80;
    std::fs::write(&path, &bytes).unwrap();

    let mut loader = SaveSystem::new();
    assert!(loader.load(&path).is_err());
    assert!(loader.ecs_data().is_empty());
}
