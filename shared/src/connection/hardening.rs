use std::fmt;

use log::{debug, info};

use super::hardening_config::{NetHardeningConfig, PacketLossSimConfig};

const MS_PER_SECOND: f32 = 1000.0;
const RTT_SMOOTHING: f32 = 0.1;
const LOSS_CYCLE: u32 = 100;
/// Jitter steps through `-1.0..=1.0` of `jitter_ms` in tenths
const JITTER_STEPS: u32 = 21;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    TimedOut,
    Kicked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConnectionQuality {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl fmt::Display for ConnectionQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionQuality::Excellent => "Excellent",
            ConnectionQuality::Good => "Good",
            ConnectionQuality::Fair => "Fair",
            ConnectionQuality::Poor => "Poor",
            ConnectionQuality::Critical => "Critical",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionStats {
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub packets_sent: u32,
    pub packets_received: u32,
    pub packets_dropped: u32,
    /// Exponential moving average, alpha 0.1
    pub average_rtt_ms: f32,
    pub peak_rtt_ms: f32,
    pub reconnect_count: u32,
    pub state: ConnectionState,
}

impl Default for ConnectionStats {
    fn default() -> Self {
        Self {
            bytes_sent: 0,
            bytes_received: 0,
            packets_sent: 0,
            packets_received: 0,
            packets_dropped: 0,
            average_rtt_ms: 0.0,
            peak_rtt_ms: 0.0,
            reconnect_count: 0,
            state: ConnectionState::Disconnected,
        }
    }
}

pub type StateCallback = Box<dyn FnMut(ConnectionState, ConnectionState) + Send>;

/// Connection supervision: timeouts, reconnection, heartbeat monitoring,
/// bandwidth throttling and deterministic loss simulation.
///
/// All timers advance only through `update`, so behaviour depends on the
/// sequence of calls and never on the wall clock.
pub struct NetHardening {
    config: NetHardeningConfig,
    stats: ConnectionStats,
    state_callback: Option<StateCallback>,

    since_last_heartbeat_ms: f32,
    since_connect_start_ms: f32,
    since_last_reconnect_ms: f32,
    reconnect_attempts: u32,

    bytes_sent_this_second: u64,
    second_accumulator_ms: f32,
    total_bytes_tracked: u64,
    total_time_tracked_ms: f32,

    loss_sim: PacketLossSimConfig,
    loss_counter: u32,
    jitter_counter: u32,
}

impl Default for NetHardening {
    fn default() -> Self {
        Self::new(NetHardeningConfig::default())
    }
}

impl NetHardening {
    pub fn new(config: NetHardeningConfig) -> Self {
        Self {
            config,
            stats: ConnectionStats::default(),
            state_callback: None,
            since_last_heartbeat_ms: 0.0,
            since_connect_start_ms: 0.0,
            since_last_reconnect_ms: 0.0,
            reconnect_attempts: 0,
            bytes_sent_this_second: 0,
            second_accumulator_ms: 0.0,
            total_bytes_tracked: 0,
            total_time_tracked_ms: 0.0,
            loss_sim: PacketLossSimConfig::default(),
            loss_counter: 0,
            jitter_counter: 0,
        }
    }

    pub fn configure(&mut self, config: NetHardeningConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &NetHardeningConfig {
        &self.config
    }

    /// Advances every timer by `delta_ms`. Call once per tick.
    pub fn update(&mut self, delta_ms: f32) {
        self.total_time_tracked_ms += delta_ms;
        self.second_accumulator_ms += delta_ms;
        if self.second_accumulator_ms >= MS_PER_SECOND {
            self.second_accumulator_ms -= MS_PER_SECOND;
            self.bytes_sent_this_second = 0;
        }

        match self.stats.state {
            ConnectionState::Connecting => {
                self.since_connect_start_ms += delta_ms;
                let timeout = self.config.connection_timeout_ms;
                if timeout > 0 && self.since_connect_start_ms >= timeout as f32 {
                    debug!("NetHardening: connection attempt timed out");
                    self.handle_timeout();
                }
            }
            ConnectionState::Connected => {
                if self.config.heartbeat_interval_ms > 0 {
                    self.since_last_heartbeat_ms += delta_ms;
                    let threshold = self.config.heartbeat_interval_ms as f32
                        * self.config.heartbeat_miss_threshold as f32;
                    if self.since_last_heartbeat_ms >= threshold {
                        debug!("NetHardening: heartbeat missed");
                        self.handle_timeout();
                    }
                }
            }
            ConnectionState::Reconnecting => {
                self.since_last_reconnect_ms += delta_ms;
                if self.since_last_reconnect_ms >= self.config.reconnect_delay_ms as f32 {
                    self.attempt_reconnect();
                }
            }
            ConnectionState::Disconnected | ConnectionState::TimedOut | ConnectionState::Kicked => {}
        }
    }

    // State transitions

    pub fn connect(&mut self) {
        self.since_connect_start_ms = 0.0;
        self.since_last_heartbeat_ms = 0.0;
        self.reconnect_attempts = 0;
        self.set_state(ConnectionState::Connecting);
    }

    pub fn disconnect(&mut self) {
        self.set_state(ConnectionState::Disconnected);
    }

    /// The remote side removed us. Terminal until `connect`.
    pub fn kick(&mut self) {
        self.set_state(ConnectionState::Kicked);
    }

    pub fn state(&self) -> ConnectionState {
        self.stats.state
    }

    pub fn set_state_callback(
        &mut self,
        callback: impl FnMut(ConnectionState, ConnectionState) + Send + 'static,
    ) {
        self.state_callback = Some(Box::new(callback));
    }

    fn set_state(&mut self, new_state: ConnectionState) {
        let old_state = self.stats.state;
        if old_state == new_state {
            return;
        }
        self.stats.state = new_state;
        info!("NetHardening: {:?} -> {:?}", old_state, new_state);
        if let Some(callback) = self.state_callback.as_mut() {
            callback(old_state, new_state);
        }
    }

    fn handle_timeout(&mut self) {
        let max_attempts = self.config.max_reconnect_attempts;
        if max_attempts > 0 && self.reconnect_attempts < max_attempts {
            self.since_last_reconnect_ms = 0.0;
            self.set_state(ConnectionState::Reconnecting);
        } else {
            self.set_state(ConnectionState::TimedOut);
        }
    }

    fn attempt_reconnect(&mut self) {
        self.reconnect_attempts += 1;
        self.stats.reconnect_count = self.reconnect_attempts;
        self.since_last_reconnect_ms = 0.0;

        if self.reconnect_attempts >= self.config.max_reconnect_attempts {
            self.set_state(ConnectionState::TimedOut);
        } else {
            self.since_connect_start_ms = 0.0;
            self.set_state(ConnectionState::Connecting);
        }
    }

    // Traffic accounting

    pub fn record_bytes_sent(&mut self, bytes: u32) {
        self.stats.bytes_sent += u64::from(bytes);
        self.bytes_sent_this_second += u64::from(bytes);
        self.total_bytes_tracked += u64::from(bytes);
    }

    pub fn record_bytes_received(&mut self, bytes: u32) {
        self.stats.bytes_received += u64::from(bytes);
    }

    pub fn record_packet_sent(&mut self) {
        self.stats.packets_sent += 1;
    }

    /// Counts a received packet. The first one while connecting completes the connection.
    pub fn record_packet_received(&mut self) {
        self.stats.packets_received += 1;
        if self.stats.state == ConnectionState::Connecting {
            self.since_last_heartbeat_ms = 0.0;
            self.set_state(ConnectionState::Connected);
        }
    }

    pub fn record_packet_dropped(&mut self) {
        self.stats.packets_dropped += 1;
    }

    pub fn record_rtt(&mut self, rtt_ms: f32) {
        if rtt_ms > self.stats.peak_rtt_ms {
            self.stats.peak_rtt_ms = rtt_ms;
        }
        if self.stats.average_rtt_ms == 0.0 {
            self.stats.average_rtt_ms = rtt_ms;
        } else {
            self.stats.average_rtt_ms =
                self.stats.average_rtt_ms * (1.0 - RTT_SMOOTHING) + rtt_ms * RTT_SMOOTHING;
        }
    }

    pub fn record_heartbeat(&mut self) {
        self.since_last_heartbeat_ms = 0.0;
    }

    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    /// Zeroes every counter, keeping the connection state
    pub fn reset_stats(&mut self) {
        let state = self.stats.state;
        self.stats = ConnectionStats {
            state,
            ..ConnectionStats::default()
        };
    }

    // Limits

    /// Whether `bytes` more fit in the current second's budget
    pub fn can_send_bytes(&self, bytes: u32) -> bool {
        let budget = self.config.max_bandwidth_bytes_per_sec;
        budget == 0 || self.bytes_sent_this_second + u64::from(bytes) <= u64::from(budget)
    }

    pub fn is_packet_size_valid(&self, bytes: u32) -> bool {
        bytes <= self.config.max_packet_size
    }

    // Loss simulation

    /// Installs a loss simulation profile and restarts its deterministic sequences
    pub fn set_packet_loss_simulation(&mut self, config: PacketLossSimConfig) {
        self.loss_sim = config;
        self.loss_counter = 0;
        self.jitter_counter = 0;
    }

    pub fn packet_loss_simulation(&self) -> &PacketLossSimConfig {
        &self.loss_sim
    }

    /// Steps a counter through 0..100 and drops while it sits below
    /// `loss_percent`, so the same call sequence always drops the same sends
    pub fn should_drop_packet(&mut self) -> bool {
        if !self.loss_sim.enabled || self.loss_sim.loss_percent <= 0.0 {
            return false;
        }
        let slot = self.loss_counter;
        self.loss_counter = (self.loss_counter + 1) % LOSS_CYCLE;
        (slot as f32) < self.loss_sim.loss_percent
    }

    /// `latency_ms` plus a deterministic offset within `±jitter_ms`, never negative.
    /// 0 while simulation is disabled.
    pub fn simulated_latency_ms(&mut self) -> u32 {
        if !self.loss_sim.enabled {
            return 0;
        }
        let mut latency = self.loss_sim.latency_ms;
        if self.loss_sim.jitter_ms > 0.0 {
            let slot = self.jitter_counter;
            self.jitter_counter = (self.jitter_counter + 1) % JITTER_STEPS;
            let half_steps = (JITTER_STEPS / 2) as f32;
            latency += (slot as f32 - half_steps) / half_steps * self.loss_sim.jitter_ms;
        }
        latency.max(0.0).round() as u32
    }

    // Derived metrics

    /// dropped / (sent + dropped) as a percentage
    pub fn packet_loss_percent(&self) -> f32 {
        let dropped = self.stats.packets_dropped as f32;
        let total = self.stats.packets_sent as f32 + dropped;
        if total == 0.0 {
            return 0.0;
        }
        dropped / total * 100.0
    }

    pub fn average_bandwidth_bytes_per_sec(&self) -> f32 {
        if self.total_time_tracked_ms <= 0.0 {
            return 0.0;
        }
        self.total_bytes_tracked as f32 / (self.total_time_tracked_ms / MS_PER_SECOND)
    }

    pub fn connection_quality(&self) -> ConnectionQuality {
        let rtt = self.stats.average_rtt_ms;
        let loss = self.packet_loss_percent();
        if rtt < 30.0 && loss < 1.0 {
            ConnectionQuality::Excellent
        } else if rtt < 80.0 && loss < 3.0 {
            ConnectionQuality::Good
        } else if rtt < 150.0 && loss < 8.0 {
            ConnectionQuality::Fair
        } else if rtt < 300.0 && loss < 15.0 {
            ConnectionQuality::Poor
        } else {
            ConnectionQuality::Critical
        }
    }
}
