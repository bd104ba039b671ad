pub mod helpers;
pub mod local_link;
pub mod test_protocol;

pub use helpers::*;
pub use local_link::LocalLink;
pub use test_protocol::{register_components, Health, Position, Velocity};
pub use test_world::TestSim;
