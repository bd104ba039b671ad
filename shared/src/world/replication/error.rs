use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicationError {
    /// The delta is shorter than its `[tick][ruleCount]` header
    #[error("Replication delta of {length} bytes is shorter than the {minimum} byte header")]
    TruncatedHeader { length: usize, minimum: usize },
}
