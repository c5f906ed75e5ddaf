mod connection;
mod room;
mod signaling;
mod user;

pub use connection::ConnectionId;
pub use room::RoomId;
pub use signaling::{MessageType, SignalMessage};
pub use user::UserId;
