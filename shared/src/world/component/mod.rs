pub mod category;
pub mod component_kinds;
pub mod serializer;

use std::any::Any;

/// Anything stored against an entity. Values are held type-erased; only kinds
/// registered in `ComponentKinds` take part in serialization.
pub trait Component: Any + Send + Sync {}

impl<T: Any + Send + Sync> Component for T {}
