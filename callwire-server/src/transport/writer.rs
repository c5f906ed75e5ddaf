use crate::config::ConnectionTiming;
use crate::error::TransportError;
use crate::transport::Connection;
use axum::extract::ws::Message;
use bytes::Bytes;
use futures::{Sink, SinkExt};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, warn};

/// Drains the outbound queue onto the socket and keeps the peer alive with
/// periodic pings.
///
/// Ends when the queue is closed (after a close frame), or when a write
/// fails or misses its deadline. Either way the transport is marked closed
/// so the read loop stops too.
pub async fn write_loop<S>(
    mut sink: S,
    mut outbound: mpsc::Receiver<Bytes>,
    connection: Arc<Connection>,
    timing: ConnectionTiming,
) -> Result<(), TransportError>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let mut ping = interval(timing.ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ping.tick().await;

    let result = loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    debug!(user_id = %connection.user_id(), "Outbound queue closed, sending close frame");
                    let _ = send_within(&mut sink, Message::Close(None), timing.write_wait).await;
                    break Ok(());
                };
                if let Err(e) = send_within(&mut sink, frame_message(frame), timing.write_wait).await {
                    break Err(e);
                }
            }
            _ = ping.tick() => {
                if let Err(e) = send_within(&mut sink, Message::Ping(Bytes::new()), timing.write_wait).await {
                    break Err(e);
                }
            }
        }
    };

    if let Err(e) = &result {
        warn!(user_id = %connection.user_id(), "Write loop stopped: {}", e);
    }

    connection.mark_transport_closed();
    let _ = timeout(timing.write_wait, sink.close()).await;

    result
}

fn frame_message(frame: Bytes) -> Message {
    match std::str::from_utf8(&frame) {
        Ok(text) => Message::Text(text.into()),
        Err(_) => Message::Binary(frame),
    }
}

async fn send_within<S>(sink: &mut S, message: Message, wait: Duration) -> Result<(), TransportError>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    match timeout(wait, sink.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(TransportError::Write(e.to_string())),
        Err(_) => Err(TransportError::WriteDeadline(wait)),
    }
}
