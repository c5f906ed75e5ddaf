pub mod auth;
pub mod config;
pub mod error;
mod room;
mod signaling;
mod transport;

pub use auth::{AuthError, Identity, JwtVerifier, TokenVerifier, authenticate};
pub use config::{ConnectionTiming, RelayConfig};
pub use error::{ConfigError, RelayError, TransportError};
pub use room::*;
pub use signaling::*;
pub use transport::*;
