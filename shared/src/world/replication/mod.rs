mod error;
mod replication_manager;
mod rule;

pub use error::ReplicationError;
pub use replication_manager::{DeltaCallback, ReplicationManager, DELTA_HEADER_BYTES};
pub use rule::{ReplicationDirection, ReplicationFrequency, ReplicationRule};
