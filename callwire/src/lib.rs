pub use callwire_core::model::{ConnectionId, MessageType, RoomId, SignalMessage, UserId};

pub mod model {
    pub use callwire_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use callwire_server::*;
}
