use lockstep_shared::{InputFrame, NetContext, Packet, Tick};

use crate::test_world::encode_inputs;

pub const INPUT_PACKET: u16 = 1;
pub const STATE_DELTA_PACKET: u16 = 2;

/// Broadcasts one tick of input frames. Returns false if the send was dropped.
pub fn send_inputs(context: &mut NetContext, tick: Tick, frames: &[InputFrame]) -> bool {
    match Packet::new(INPUT_PACKET, tick as u32, encode_inputs(frames)) {
        Ok(packet) => context.broadcast(packet),
        Err(_) => false,
    }
}

/// Broadcasts a replication delta. Returns false if the send was dropped.
pub fn send_delta(context: &mut NetContext, tick: Tick, delta: Vec<u8>) -> bool {
    match Packet::new(STATE_DELTA_PACKET, tick as u32, delta) {
        Ok(packet) => context.broadcast(packet),
        Err(_) => false,
    }
}

#[derive(Default)]
pub struct ReceivedPackets {
    pub packets: Vec<Packet>,
    pub rejected: usize,
}

/// Drains the inbound queue, separating valid packets from rejected ones
pub fn receive_all(context: &mut NetContext) -> ReceivedPackets {
    let mut received = ReceivedPackets::default();
    loop {
        match context.receive() {
            Ok(Some(packet)) => received.packets.push(packet),
            Ok(None) => break,
            Err(_) => received.rejected += 1,
        }
    }
    received
}
