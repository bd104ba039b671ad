use std::default::Default;

/// Contains Config properties which will be used by NetHardening
#[derive(Clone, Debug, PartialEq)]
pub struct NetHardeningConfig {
    /// How long a connection attempt may take, in milliseconds. 0 disables the timeout.
    pub connection_timeout_ms: u32,
    /// Reconnection attempts before giving up. 0 disables reconnection.
    pub max_reconnect_attempts: u32,
    /// Delay between reconnection attempts, in milliseconds
    pub reconnect_delay_ms: u32,
    /// Outbound budget in bytes per second. 0 means unlimited.
    pub max_bandwidth_bytes_per_sec: u32,
    /// Largest payload that may be sent, in bytes
    pub max_packet_size: u32,
    /// Expected interval between heartbeats, in milliseconds. 0 disables heartbeat monitoring.
    pub heartbeat_interval_ms: u32,
    /// Missed heartbeats tolerated before the connection times out
    pub heartbeat_miss_threshold: u32,
}

impl Default for NetHardeningConfig {
    fn default() -> Self {
        Self {
            connection_timeout_ms: 10_000,
            max_reconnect_attempts: 5,
            reconnect_delay_ms: 2_000,
            max_bandwidth_bytes_per_sec: 0,
            max_packet_size: 1_400,
            heartbeat_interval_ms: 1_000,
            heartbeat_miss_threshold: 5,
        }
    }
}

/// Deterministic link conditioning for tests and soak runs
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PacketLossSimConfig {
    /// Share of sends to drop, 0.0 to 100.0
    pub loss_percent: f32,
    /// Added latency in milliseconds
    pub latency_ms: f32,
    /// Latency varies within `latency_ms ± jitter_ms`
    pub jitter_ms: f32,
    pub enabled: bool,
}
