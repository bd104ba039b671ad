//! In-memory transport between two `NetContext`s.
//!
//! Picks up whatever each side queued for sending and delivers it to the
//! other side's inbound queue once the sender's simulated latency has
//! elapsed. Delivery is FIFO per direction.

use std::collections::VecDeque;

use log::trace;

use lockstep_shared::{NetContext, Packet};

struct InFlight {
    due_ms: f32,
    packet: Packet,
}

#[derive(Default)]
pub struct LocalLink {
    clock_ms: f32,
    a_to_b: VecDeque<InFlight>,
    b_to_a: VecDeque<InFlight>,
    corrupt_next_a_to_b: bool,
}

impl LocalLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips a payload bit in the next packet carried from `a` to `b`
    pub fn corrupt_next_a_to_b(&mut self) {
        self.corrupt_next_a_to_b = true;
    }

    pub fn in_flight(&self) -> usize {
        self.a_to_b.len() + self.b_to_a.len()
    }

    /// Collects outbound packets from both sides, advances the link clock by
    /// `delta_ms` and delivers everything that is due. Returns the number of
    /// packets delivered.
    pub fn pump(&mut self, a: &mut NetContext, b: &mut NetContext, delta_ms: f32) -> usize {
        for (_, mut packet) in a.take_outbound() {
            if self.corrupt_next_a_to_b && !packet.payload.is_empty() {
                packet.payload[0] ^= 0x01;
                self.corrupt_next_a_to_b = false;
            }
            let due_ms = self.clock_ms + latency_of(a);
            self.a_to_b.push_back(InFlight { due_ms, packet });
        }
        for (_, packet) in b.take_outbound() {
            let due_ms = self.clock_ms + latency_of(b);
            self.b_to_a.push_back(InFlight { due_ms, packet });
        }

        self.clock_ms += delta_ms;
        let delivered = deliver(&mut self.a_to_b, b, self.clock_ms) + deliver(&mut self.b_to_a, a, self.clock_ms);
        trace!("LocalLink: delivered {} packets at {}ms", delivered, self.clock_ms);
        delivered
    }
}

fn latency_of(context: &mut NetContext) -> f32 {
    context
        .hardening_mut()
        .map_or(0.0, |hardening| hardening.simulated_latency_ms() as f32)
}

fn deliver(queue: &mut VecDeque<InFlight>, to: &mut NetContext, now_ms: f32) -> usize {
    let mut delivered = 0;
    while queue.front().is_some_and(|in_flight| in_flight.due_ms <= now_ms) {
        if let Some(in_flight) = queue.pop_front() {
            to.push_inbound(in_flight.packet);
            delivered += 1;
        }
    }
    delivered
}
