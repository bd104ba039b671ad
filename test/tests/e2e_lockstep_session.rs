/// End-to-end lockstep session over an in-memory link
///
/// The client sends its input to the server, the server merges it with its
/// own and broadcasts the tick's full input set. Both sides step the same
/// game, so their hash ladders must agree on every tick.

use proptest::prelude::*;

use lockstep_shared::{
    InputFrame, NetConfig, NetContext, NetHardening, NetHardeningConfig, NetMode, NetPeer,
    PacketLossSimConfig, Simulation, Tick,
};
use lockstep_test::{
    assert_diverges_at, assert_ladders_match, init_logger, receive_all, send_inputs,
    test_world::{decode_inputs, encode_inputs},
    LocalLink, TestSim,
};

const SEED: u64 = 0x5EED;
const SERVER_PLAYER: u32 = 1;
const CLIENT_PLAYER: u32 = 2;

struct Session {
    server_context: NetContext,
    client_context: NetContext,
    link: LocalLink,
    server: TestSim,
    client: TestSim,
}

impl Session {
    fn new() -> Self {
        let mut server_context = NetContext::new(NetConfig::default());
        server_context.init(NetMode::Server);
        server_context.add_peer(NetPeer::new(CLIENT_PLAYER));

        let mut client_context = NetContext::new(NetConfig::default());
        client_context.init(NetMode::Client);
        client_context.add_peer(NetPeer::new(SERVER_PLAYER));

        Self {
            server_context,
            client_context,
            link: LocalLink::new(),
            server: TestSim::new(SEED, 2, 30),
            client: TestSim::new(SEED, 2, 30),
        }
    }

    /// Pumps the link in 10ms steps until `receiver` has something inbound
    fn pump_until_delivered(&mut self, to_client: bool) {
        for _ in 0..100 {
            self.link
                .pump(&mut self.server_context, &mut self.client_context, 10.0);
            let waiting = if to_client {
                self.client_context.inbound_len()
            } else {
                self.server_context.inbound_len()
            };
            if waiting > 0 {
                return;
            }
        }
        panic!("packet never arrived");
    }

    fn run_tick(&mut self, tick: Tick, server_move: (f32, f32), client_move: (f32, f32)) {
        let client_frame = InputFrame::new(tick as u32, CLIENT_PLAYER, client_move.0, client_move.1);
        assert!(send_inputs(&mut self.client_context, tick, &[client_frame]));
        self.pump_until_delivered(false);

        let from_client = receive_all(&mut self.server_context);
        assert_eq!(from_client.rejected, 0);
        let mut frames = vec![InputFrame::new(
            tick as u32,
            SERVER_PLAYER,
            server_move.0,
            server_move.1,
        )];
        for packet in &from_client.packets {
            frames.extend(decode_inputs(&packet.payload));
        }

        self.server.step(&encode_inputs(&frames));
        assert!(send_inputs(&mut self.server_context, tick, &frames));
        self.pump_until_delivered(true);

        let from_server = receive_all(&mut self.client_context);
        assert_eq!(from_server.packets.len(), 1);
        assert_eq!(u64::from(from_server.packets[0].tick), tick);
        self.client.step(&from_server.packets[0].payload);
    }
}

fn scripted_move(tick: Tick, player: u32) -> (f32, f32) {
    let phase = (tick + u64::from(player)) % 4;
    match phase {
        0 => (1.0, 0.0),
        1 => (0.0, 1.0),
        2 => (-1.0, 0.5),
        _ => (0.25, -0.75),
    }
}

// ========== Lockstep ==========

#[test]
fn test_both_sides_hash_identically() {
    init_logger();
    let mut session = Session::new();
    for tick in 1..=60 {
        session.run_tick(
            tick,
            scripted_move(tick, SERVER_PLAYER),
            scripted_move(tick, CLIENT_PLAYER),
        );
    }

    assert_eq!(session.server.current_tick(), 60);
    assert_eq!(session.client.current_tick(), 60);
    assert_eq!(session.server.world_hash(), session.client.world_hash());
    assert_ladders_match!(session.server.hasher(), session.client.hasher());
    assert_eq!(
        session.server.store().serialize(),
        session.client.store().serialize()
    );
}

#[test]
fn test_players_move_by_their_inputs() {
    init_logger();
    let mut session = Session::new();
    for tick in 1..=30 {
        session.run_tick(tick, (3.0, 0.0), (0.0, -6.0));
    }

    // 30 ticks at 30 Hz is one second of movement
    let server_player = session.client.position_of(SERVER_PLAYER).unwrap();
    let client_player = session.client.position_of(CLIENT_PLAYER).unwrap();
    assert!((server_player.x - 3.0).abs() < 1e-3);
    assert!((client_player.x - 10.0).abs() < 1e-3);
    assert!((client_player.y + 6.0).abs() < 1e-3);
}

#[test]
fn test_lockstep_survives_link_latency() {
    init_logger();
    let mut session = Session::new();
    for context in [&mut session.server_context, &mut session.client_context] {
        let mut hardening = NetHardening::new(NetHardeningConfig::default());
        hardening.set_packet_loss_simulation(PacketLossSimConfig {
            loss_percent: 0.0,
            latency_ms: 40.0,
            jitter_ms: 20.0,
            enabled: true,
        });
        context.set_hardening(hardening);
    }

    for tick in 1..=20 {
        session.run_tick(
            tick,
            scripted_move(tick, SERVER_PLAYER),
            scripted_move(tick, CLIENT_PLAYER),
        );
    }
    assert_ladders_match!(session.server.hasher(), session.client.hasher());

    let stats = session.server_context.hardening().unwrap().stats();
    assert_eq!(stats.packets_sent, 20);
    assert_eq!(stats.packets_received, 20);
}

#[test]
fn test_corrupted_input_is_rejected_on_arrival() {
    init_logger();
    let mut session = Session::new();
    session.run_tick(1, (1.0, 0.0), (1.0, 0.0));

    session.link.corrupt_next_a_to_b();
    let frame = InputFrame::new(2, SERVER_PLAYER, 1.0, 0.0);
    assert!(send_inputs(&mut session.server_context, 2, &[frame]));
    session.pump_until_delivered(true);

    let received = receive_all(&mut session.client_context);
    assert!(received.packets.is_empty());
    assert_eq!(received.rejected, 1);
    assert_eq!(session.client_context.invalid_checksum_count(), 1);
}

// ========== Divergence ==========

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn same_inputs_same_ladder(moves in prop::collection::vec((-4i8..=4, -4i8..=4), 1..40)) {
        let mut a = TestSim::new(SEED, 1, 30);
        let mut b = TestSim::new(SEED, 1, 30);
        for (index, (dx, dy)) in moves.iter().enumerate() {
            let frame = InputFrame::new(index as u32 + 1, 1, f32::from(*dx), f32::from(*dy));
            let input = encode_inputs(&[frame]);
            a.step(&input);
            b.step(&input);
        }
        prop_assert_eq!(a.hasher().history(), b.hasher().history());
    }

    #[test]
    fn changed_input_diverges_at_its_tick(
        moves in prop::collection::vec((-4i8..=4, -4i8..=4), 2..40),
        pick in any::<prop::sample::Index>(),
    ) {
        let changed_index = pick.index(moves.len());
        let mut a = TestSim::new(SEED, 1, 30);
        let mut b = TestSim::new(SEED, 1, 30);
        for (index, (dx, dy)) in moves.iter().enumerate() {
            let tick = index as u32 + 1;
            let honest = InputFrame::new(tick, 1, f32::from(*dx), f32::from(*dy));
            let mut altered = honest;
            if index == changed_index {
                altered.move_x += 10.0;
            }
            a.step(&encode_inputs(&[honest]));
            b.step(&encode_inputs(&[altered]));
        }
        prop_assert_eq!(a.hasher().find_divergence(b.hasher()), Some(changed_index as Tick + 1));
    }
}

#[test]
fn test_different_seeds_diverge_immediately() {
    let mut a = TestSim::new(1, 1, 30);
    let mut b = TestSim::new(2, 1, 30);
    let input = encode_inputs(&[InputFrame::new(1, 1, 0.0, 0.0)]);
    a.step(&input);
    b.step(&input);
    assert_diverges_at!(a.hasher(), b.hasher(), 1);
}
