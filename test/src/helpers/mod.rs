pub mod logging;
pub mod packet_exchange;

pub use logging::init_logger;
pub use packet_exchange::{
    receive_all, send_delta, send_inputs, ReceivedPackets, INPUT_PACKET, STATE_DELTA_PACKET,
};
