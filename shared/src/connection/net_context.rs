use std::collections::VecDeque;

use log::{debug, info, warn};

use crate::{
    sim::{state_hasher::StateHasher, world_state::WorldSnapshot},
    world::world_store::WorldStore,
    PeerId, Tick,
};

use super::{
    checksum::{compute_checksum, validate_checksum},
    error::NetContextError,
    hardening::NetHardening,
    input_frame::InputFrame,
    net_config::NetConfig,
    packet::Packet,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NetMode {
    Standalone,
    Client,
    Server,
    P2pHost,
    P2pPeer,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NetPeer {
    pub id: PeerId,
    pub rtt_ms: f32,
    pub connected: bool,
}

impl NetPeer {
    pub fn new(id: PeerId) -> Self {
        Self {
            id,
            rtt_ms: 0.0,
            connected: true,
        }
    }
}

/// Where an outbound packet is headed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PacketDestination {
    Peer(PeerId),
    Broadcast,
}

pub type InputApplyCallback = Box<dyn FnMut(&mut WorldStore, &InputFrame) + Send>;

/// Packet queues with checksum validation, plus snapshot rollback and input
/// replay against an externally owned `WorldStore`.
///
/// `poll` is a local loopback: everything queued for sending becomes
/// receivable unchanged. A transport replaces it by draining
/// `take_outbound` and feeding `push_inbound`.
pub struct NetContext {
    config: NetConfig,
    mode: NetMode,
    peers: Vec<NetPeer>,
    outbound: VecDeque<(PacketDestination, Packet)>,
    inbound: VecDeque<Packet>,
    dropped_send_count: u32,
    invalid_checksum_count: u32,
    hardening: Option<NetHardening>,
    snapshots: VecDeque<WorldSnapshot>,
    recorded_inputs: Vec<InputFrame>,
    input_apply_callback: Option<InputApplyCallback>,
}

impl Default for NetContext {
    fn default() -> Self {
        Self::new(NetConfig::default())
    }
}

impl NetContext {
    pub fn new(config: NetConfig) -> Self {
        Self {
            config,
            mode: NetMode::Standalone,
            peers: Vec::new(),
            outbound: VecDeque::new(),
            inbound: VecDeque::new(),
            dropped_send_count: 0,
            invalid_checksum_count: 0,
            hardening: None,
            snapshots: VecDeque::new(),
            recorded_inputs: Vec::new(),
            input_apply_callback: None,
        }
    }

    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    /// Enters `mode` with empty queues, peers, snapshots, inputs and counters.
    /// Any hardening layer is removed.
    pub fn init(&mut self, mode: NetMode) {
        self.reset();
        self.mode = mode;
        info!("NetContext: initialized as {:?}", mode);
    }

    pub fn shutdown(&mut self) {
        self.reset();
        self.mode = NetMode::Standalone;
        info!("NetContext: shut down");
    }

    fn reset(&mut self) {
        self.peers.clear();
        self.outbound.clear();
        self.inbound.clear();
        self.dropped_send_count = 0;
        self.invalid_checksum_count = 0;
        self.hardening = None;
        self.snapshots.clear();
        self.recorded_inputs.clear();
    }

    pub fn mode(&self) -> NetMode {
        self.mode
    }

    /// Server and P2P host are authoritative
    pub fn is_authority(&self) -> bool {
        matches!(self.mode, NetMode::Server | NetMode::P2pHost)
    }

    // Peers

    /// Adds a peer. Returns false if the id is already known.
    pub fn add_peer(&mut self, peer: NetPeer) -> bool {
        if self.peers.iter().any(|known| known.id == peer.id) {
            return false;
        }
        debug!("NetContext: peer {} added", peer.id);
        self.peers.push(peer);
        true
    }

    pub fn remove_peer(&mut self, id: PeerId) -> Option<NetPeer> {
        let index = self.peers.iter().position(|peer| peer.id == id)?;
        Some(self.peers.remove(index))
    }

    pub fn peers(&self) -> &[NetPeer] {
        &self.peers
    }

    // Hardening

    pub fn set_hardening(&mut self, hardening: NetHardening) {
        self.hardening = Some(hardening);
    }

    pub fn hardening(&self) -> Option<&NetHardening> {
        self.hardening.as_ref()
    }

    pub fn hardening_mut(&mut self) -> Option<&mut NetHardening> {
        self.hardening.as_mut()
    }

    pub fn clear_hardening(&mut self) -> Option<NetHardening> {
        self.hardening.take()
    }

    // Sending

    /// Seals the packet and queues it for `peer`. Returns false if hardening
    /// policy dropped it.
    pub fn send(&mut self, peer: PeerId, packet: Packet) -> bool {
        self.enqueue(PacketDestination::Peer(peer), packet)
    }

    /// Seals the packet and queues it for every peer. Returns false if
    /// hardening policy dropped it.
    pub fn broadcast(&mut self, packet: Packet) -> bool {
        self.enqueue(PacketDestination::Broadcast, packet)
    }

    fn enqueue(&mut self, destination: PacketDestination, mut packet: Packet) -> bool {
        if packet.seal().is_err() {
            warn!(
                "NetContext: dropping packet for tick {} with {} byte payload",
                packet.tick,
                packet.payload.len()
            );
            self.record_drop();
            return false;
        }

        let size = u32::from(packet.size);
        if let Some(reason) = self
            .hardening
            .as_mut()
            .and_then(|hardening| rejection_reason(hardening, size))
        {
            debug!(
                "NetContext: dropped {} byte packet for tick {}: {}",
                size, packet.tick, reason
            );
            self.record_drop();
            return false;
        }
        if let Some(hardening) = self.hardening.as_mut() {
            hardening.record_bytes_sent(size);
            hardening.record_packet_sent();
        }

        self.outbound.push_back((destination, packet));
        true
    }

    fn record_drop(&mut self) {
        self.dropped_send_count += 1;
        if let Some(hardening) = self.hardening.as_mut() {
            hardening.record_packet_dropped();
        }
    }

    /// Loopback transfer: moves every queued outbound packet to the inbound queue
    pub fn poll(&mut self) {
        let moved = self.outbound.len();
        self.inbound
            .extend(self.outbound.drain(..).map(|(_, packet)| packet));
        if moved > 0 {
            debug!("NetContext: looped back {} packets", moved);
        }
    }

    /// Hands every queued outbound packet to a transport
    pub fn take_outbound(&mut self) -> Vec<(PacketDestination, Packet)> {
        self.outbound.drain(..).collect()
    }

    /// Queues a packet that arrived from a transport. It is validated on `receive`.
    pub fn push_inbound(&mut self, packet: Packet) {
        self.inbound.push_back(packet);
    }

    pub fn outbound_len(&self) -> usize {
        self.outbound.len()
    }

    pub fn inbound_len(&self) -> usize {
        self.inbound.len()
    }

    /// Dequeues the next inbound packet. A packet whose checksum does not
    /// match its payload is discarded and reported as an error.
    pub fn receive(&mut self) -> Result<Option<Packet>, NetContextError> {
        let Some(packet) = self.inbound.pop_front() else {
            return Ok(None);
        };

        if !validate_checksum(&packet) {
            self.invalid_checksum_count += 1;
            let error = NetContextError::InvalidChecksum {
                tick: packet.tick,
                found: packet.checksum,
                computed: compute_checksum(&packet.payload),
            };
            warn!("NetContext: {}", error);
            return Err(error);
        }

        if let Some(hardening) = self.hardening.as_mut() {
            hardening.record_bytes_received(u32::from(packet.size));
            hardening.record_packet_received();
        }
        Ok(Some(packet))
    }

    pub fn dropped_send_count(&self) -> u32 {
        self.dropped_send_count
    }

    pub fn invalid_checksum_count(&self) -> u32 {
        self.invalid_checksum_count
    }

    // Snapshots

    /// Captures the store at `tick`, replacing any earlier snapshot for the same tick.
    /// Snapshots stay sorted by tick, so eviction always drops the oldest.
    pub fn save_snapshot(&mut self, tick: Tick, store: &WorldStore) {
        self.snapshots.retain(|snapshot| snapshot.tick != tick);
        let index = self.snapshots.partition_point(|snapshot| snapshot.tick < tick);
        self.snapshots
            .insert(index, WorldSnapshot::new(tick, store.serialize(), Vec::new()));

        if let Some(max) = self.config.max_snapshots {
            while self.snapshots.len() > max.max(1) {
                self.snapshots.pop_front();
            }
        }
    }

    /// Restores the snapshot taken at `tick` and discards every newer one.
    ///
    /// If there is no snapshot for `tick`, or it cannot be restored, neither
    /// the store nor the snapshot list changes.
    pub fn rollback_to(&mut self, tick: Tick, store: &mut WorldStore) -> Result<(), NetContextError> {
        let snapshot = self
            .snapshots
            .iter()
            .find(|snapshot| snapshot.tick == tick)
            .ok_or(NetContextError::SnapshotNotFound { tick })?;

        store
            .deserialize(&snapshot.ecs_data)
            .map_err(|source| NetContextError::RestoreFailed { tick, source })?;

        self.snapshots.retain(|snapshot| snapshot.tick <= tick);
        info!("NetContext: rolled back to tick {}", tick);
        Ok(())
    }

    pub fn snapshots(&self) -> impl Iterator<Item = &WorldSnapshot> {
        self.snapshots.iter()
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    // Input replay

    pub fn record_input(&mut self, frame: InputFrame) {
        self.recorded_inputs.push(frame);
    }

    pub fn recorded_inputs(&self) -> &[InputFrame] {
        &self.recorded_inputs
    }

    pub fn clear_recorded_inputs(&mut self) {
        self.recorded_inputs.clear();
    }

    /// Installs the function that applies one input frame to the store during replay
    pub fn set_input_apply_callback(
        &mut self,
        callback: impl FnMut(&mut WorldStore, &InputFrame) + Send + 'static,
    ) {
        self.input_apply_callback = Some(Box::new(callback));
    }

    /// Re-applies every recorded frame with `frame.tick >= tick`, in recording
    /// order, advancing the store one fixed step after each. Returns the
    /// number of frames replayed.
    pub fn replay_from(&mut self, tick: Tick, store: &mut WorldStore) -> usize {
        self.replay(tick, store, None)
    }

    /// Like `replay_from`, also extending `hasher` with the store bytes and
    /// frame bytes of every replayed step
    pub fn replay_and_rehash(
        &mut self,
        tick: Tick,
        store: &mut WorldStore,
        hasher: &mut StateHasher,
    ) -> usize {
        self.replay(tick, store, Some(hasher))
    }

    fn replay(
        &mut self,
        tick: Tick,
        store: &mut WorldStore,
        mut hasher: Option<&mut StateHasher>,
    ) -> usize {
        let delta_time = self.config.fixed_delta_time();
        let mut replayed = 0;

        for frame in self
            .recorded_inputs
            .iter()
            .filter(|frame| Tick::from(frame.tick) >= tick)
        {
            if let Some(callback) = self.input_apply_callback.as_mut() {
                callback(store, frame);
            }
            store.update(delta_time);

            if let Some(hasher) = hasher.as_deref_mut() {
                hasher.advance_tick(Tick::from(frame.tick), &store.serialize(), &frame.to_bytes());
            }
            replayed += 1;
        }

        debug!("NetContext: replayed {} frames from tick {}", replayed, tick);
        replayed
    }
}

/// Send checks in order: packet size, bandwidth budget, simulated loss
fn rejection_reason(hardening: &mut NetHardening, size: u32) -> Option<&'static str> {
    if !hardening.is_packet_size_valid(size) {
        Some("exceeds max packet size")
    } else if !hardening.can_send_bytes(size) {
        Some("over bandwidth budget")
    } else if hardening.should_drop_packet() {
        Some("simulated loss")
    } else {
        None
    }
}
