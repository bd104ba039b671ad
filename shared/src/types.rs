/// Simulation tick counter. Wire formats that carry a 32-bit tick truncate it.
pub type Tick = u64;
/// Stable small integer identifying a component kind across processes
pub type TypeTag = u32;
pub type PeerId = u32;

/// Which end of a connection a process is. Decides which replication
/// directions it sends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostType {
    Server,
    Client,
}

