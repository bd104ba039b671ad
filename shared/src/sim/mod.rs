pub mod error;
pub mod replay_recorder;
pub mod save_system;
pub mod sim_mirror;
pub mod state_hasher;
pub mod tick_scheduler;
pub mod world_state;
