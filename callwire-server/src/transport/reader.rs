use crate::config::ConnectionTiming;
use crate::error::TransportError;
use crate::room::Registry;
use crate::transport::Connection;
use axum::extract::ws::Message;
use callwire_core::SignalMessage;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Drives the inbound half of a connection until the peer goes away, the
/// read deadline passes, or the write loop reports the transport closed.
///
/// Every exit path runs the same teardown: leave the room, half-close the
/// outbound queue, mark the transport closed.
pub async fn read_loop<S, E>(
    mut stream: S,
    connection: Arc<Connection>,
    registry: Registry,
    timing: ConnectionTiming,
) -> Result<(), TransportError>
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let result = loop {
        let next = tokio::select! {
            biased;
            _ = connection.transport_closed() => {
                debug!(user_id = %connection.user_id(), "Write side closed, stopping reader");
                break Ok(());
            }
            next = timeout(timing.read_deadline, stream.next()) => next,
        };

        let message = match next {
            Err(_) => break Err(TransportError::ReadDeadline(timing.read_deadline)),
            Ok(None) => break Ok(()),
            Ok(Some(Err(e))) => break Err(TransportError::Read(e.to_string())),
            Ok(Some(Ok(message))) => message,
        };

        match message {
            Message::Text(text) => relay_frame(text.as_str(), &connection, &registry),
            Message::Binary(bytes) => match std::str::from_utf8(&bytes) {
                Ok(text) => relay_frame(text, &connection, &registry),
                Err(_) => warn!(
                    user_id = %connection.user_id(),
                    len = bytes.len(),
                    "Binary frame is not UTF-8, ignoring"
                ),
            },
            Message::Close(frame) => {
                debug!(user_id = %connection.user_id(), ?frame, "Peer sent close");
                break Ok(());
            }
            // Any frame, pongs included, has already reset the deadline.
            Message::Ping(_) | Message::Pong(_) => {}
        }
    };

    registry.leave(&connection);
    connection.close_outbound();
    connection.mark_transport_closed();

    match &result {
        Ok(()) => info!(
            user_id = %connection.user_id(),
            room_id = %connection.room_id(),
            "Connection closed"
        ),
        Err(e) => info!(
            user_id = %connection.user_id(),
            room_id = %connection.room_id(),
            "Connection dropped: {}", e
        ),
    }

    result
}

fn relay_frame(text: &str, connection: &Connection, registry: &Registry) {
    let mut message = match SignalMessage::decode(text) {
        Ok(message) => message,
        Err(e) => {
            warn!("Invalid SignalMessage from {}: {}", connection.user_id(), e);
            return;
        }
    };

    if message.kind.is_presence() {
        warn!(
            user_id = %connection.user_id(),
            kind = %message.kind,
            "Client sent a server-only message type, dropping"
        );
        return;
    }

    message.stamp_from(connection.user_id());
    let delivered = registry.route(&message, connection);
    debug!(
        user_id = %connection.user_id(),
        kind = %message.kind,
        to = message.recipient().unwrap_or("*"),
        delivered,
        "Relayed signal message"
    );
}
