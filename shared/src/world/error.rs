use lockstep_serde::SerdeErr;
use thiserror::Error;

use crate::{EntityId, TypeTag};

/// Errors that can occur during WorldStore operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldError {
    /// The entity was never created, or has been destroyed
    #[error("{entity} does not exist")]
    EntityNotFound { entity: EntityId },

    /// No serializer has been registered for the type tag
    #[error("No component serializer registered for type tag {tag}")]
    UnregisteredTypeTag { tag: TypeTag },

    /// The id is the reserved top value, or no ids remain to allocate
    #[error("Entity id space exhausted at {entity}")]
    IdSpaceExhausted { entity: EntityId },

    /// The byte stream is shorter than the fixed `[nextID][entityCount]` header
    #[error("World data of {length} bytes is shorter than the {minimum} byte header")]
    TruncatedHeader { length: usize, minimum: usize },

    /// The byte stream ended in the middle of an entity or component header
    #[error("World data truncated at offset {offset}: {source}")]
    TruncatedStream {
        offset: usize,
        #[source]
        source: SerdeErr,
    },

    /// A component length field points past the end of the stream
    #[error("{entity} component {tag} declares {declared} bytes but only {remaining} remain")]
    MalformedComponentLength {
        entity: EntityId,
        tag: TypeTag,
        declared: u32,
        remaining: usize,
    },

    /// A registered serializer rejected the component bytes
    #[error("Failed to decode component {tag} on {entity}: {source}")]
    ComponentDecode {
        entity: EntityId,
        tag: TypeTag,
        #[source]
        source: SerdeErr,
    },

    /// The same entity id appears twice in one stream
    #[error("{entity} appears more than once in world data")]
    DuplicateEntity { entity: EntityId },
}
