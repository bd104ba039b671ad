pub mod checksum;
pub mod error;
pub mod hardening;
pub mod hardening_config;
pub mod input_frame;
pub mod net_config;
pub mod net_context;
pub mod packet;
