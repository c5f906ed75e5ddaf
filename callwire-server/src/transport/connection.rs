use bytes::Bytes;
use callwire_core::{ConnectionId, RoomId, UserId};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{Notify, mpsc};
use tracing::{debug, warn};

/// Result of handing a frame to a connection's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    Queued,
    /// The queue was full; the frame was dropped.
    Full,
    /// The write loop is gone or shutting down.
    Closed,
}

/// One peer's live link: an authenticated user bound to one room.
///
/// The socket halves are owned by the read and write loops; everything the
/// rest of the relay may touch lives here. The outbound sender is kept
/// behind a lock so the read loop can drop it, which is the signal that
/// ends the write loop.
pub struct Connection {
    id: ConnectionId,
    user_id: UserId,
    room_id: RoomId,
    outbound: Mutex<Option<mpsc::Sender<Bytes>>>,
    transport_closed: AtomicBool,
    transport_notify: Notify,
    dropped_frames: AtomicU64,
}

impl Connection {
    /// Creates a connection and the receiving end of its outbound queue.
    pub fn new(
        user_id: UserId,
        room_id: RoomId,
        capacity: usize,
    ) -> (Arc<Self>, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));

        let connection = Arc::new(Self {
            id: ConnectionId::new(),
            user_id,
            room_id,
            outbound: Mutex::new(Some(tx)),
            transport_closed: AtomicBool::new(false),
            transport_notify: Notify::new(),
            dropped_frames: AtomicU64::new(0),
        });

        (connection, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Non-blocking enqueue. A full queue drops the frame.
    pub fn enqueue(&self, frame: Bytes) -> Enqueue {
        let guard = self.outbound.lock();
        let Some(tx) = guard.as_ref() else {
            return Enqueue::Closed;
        };

        match tx.try_send(frame) {
            Ok(()) => Enqueue::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => {
                let dropped = self.dropped_frames.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    user_id = %self.user_id,
                    room_id = %self.room_id,
                    dropped,
                    "Outbound queue full, dropping frame"
                );
                Enqueue::Full
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(user_id = %self.user_id, "Outbound queue closed, dropping frame");
                Enqueue::Closed
            }
        }
    }

    /// Half-close: drops the only sender so the write loop drains what is
    /// queued and exits. Returns `false` if it was already closed.
    pub fn close_outbound(&self) -> bool {
        self.outbound.lock().take().is_some()
    }

    pub fn is_outbound_closed(&self) -> bool {
        self.outbound.lock().is_none()
    }

    /// Marks the transport as closed and wakes the read loop.
    ///
    /// Safe to call from either loop any number of times; only the first
    /// call returns `true`.
    pub fn mark_transport_closed(&self) -> bool {
        let first = !self.transport_closed.swap(true, Ordering::AcqRel);
        if first {
            self.transport_notify.notify_one();
        }
        first
    }

    pub fn is_transport_closed(&self) -> bool {
        self.transport_closed.load(Ordering::Acquire)
    }

    /// Resolves once [`mark_transport_closed`](Self::mark_transport_closed)
    /// has been called.
    pub async fn transport_closed(&self) {
        if self.is_transport_closed() {
            return;
        }
        self.transport_notify.notified().await;
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("room_id", &self.room_id)
            .finish()
    }
}
