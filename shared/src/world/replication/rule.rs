use crate::{HostType, TypeTag};

/// How often a component type is sent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReplicationFrequency {
    /// Every live entity holding the component, every collection
    EveryTick,
    /// Only entities marked dirty since the last collection
    OnChange,
    /// Every live entity holding the component, only after an explicit trigger
    Manual,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReplicationDirection {
    ServerToClient,
    ClientToServer,
    Bidirectional,
}

impl ReplicationDirection {
    /// Whether a host of the given type sends components with this direction
    pub fn is_sent_by(&self, host_type: HostType) -> bool {
        match (self, host_type) {
            (ReplicationDirection::Bidirectional, _) => true,
            (ReplicationDirection::ServerToClient, HostType::Server) => true,
            (ReplicationDirection::ClientToServer, HostType::Client) => true,
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplicationRule {
    pub type_tag: TypeTag,
    pub component_name: String,
    pub frequency: ReplicationFrequency,
    pub direction: ReplicationDirection,
    /// Reliable rules are collected by `collect_delta`, the rest by `collect_unreliable_delta`
    pub reliable: bool,
    pub priority: u8,
}

impl ReplicationRule {
    pub fn new(type_tag: TypeTag, component_name: &str) -> Self {
        Self {
            type_tag,
            component_name: component_name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_frequency(mut self, frequency: ReplicationFrequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_direction(mut self, direction: ReplicationDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_reliable(mut self, reliable: bool) -> Self {
        self.reliable = reliable;
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }
}

impl Default for ReplicationRule {
    fn default() -> Self {
        Self {
            type_tag: 0,
            component_name: String::new(),
            frequency: ReplicationFrequency::OnChange,
            direction: ReplicationDirection::ServerToClient,
            reliable: true,
            priority: 128,
        }
    }
}
