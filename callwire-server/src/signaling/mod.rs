mod room_access;
mod router;
mod signaling_service;
mod ws_handler;

pub use room_access::*;
pub use router::*;
pub use signaling_service::*;
pub use ws_handler::*;
