pub mod component;
pub mod entity;
pub mod error;
pub mod replication;
pub mod world_store;
