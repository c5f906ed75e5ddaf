use crate::room::Room;
use crate::transport::Connection;
use bytes::Bytes;
use callwire_core::{RoomId, SignalMessage, UserId};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Process-wide map of live rooms.
///
/// Cloning is cheap and every clone sees the same rooms. Lock order is
/// always registry shard first, then the room's member lock.
#[derive(Clone, Default)]
pub struct Registry {
    rooms: Arc<DashMap<RoomId, Arc<Room>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `connection` to its room, creating the room on first use, and
    /// tells the other members with `user-joined`.
    ///
    /// A second join for the same user replaces the first entry. The old
    /// connection is left running; its eventual leave is ignored.
    pub fn join(&self, connection: Arc<Connection>) {
        let room_id = connection.room_id().clone();
        let user_id = connection.user_id();
        let presence = presence_frame(SignalMessage::user_joined(user_id));

        let room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            info!("Creating new room: {}", room_id);
            Arc::new(Room::new(room_id.clone()))
        });

        if let Some(previous) = room.admit(connection, presence) {
            info!(
                %user_id,
                %room_id,
                previous = %previous.id(),
                "User reconnected, replacing previous connection"
            );
        } else {
            info!(%user_id, %room_id, members = room.len(), "User joined room");
        }
    }

    /// Removes `connection` from its room if it is still the registered
    /// instance for its user. Deletes the room when that leaves it empty,
    /// otherwise tells the remaining members with `user-left`.
    pub fn leave(&self, connection: &Connection) {
        let user_id = connection.user_id();
        let room_id = connection.room_id();

        let Entry::Occupied(entry) = self.rooms.entry(room_id.clone()) else {
            debug!(%user_id, %room_id, "Leave for unknown room ignored");
            return;
        };

        let room = entry.get().clone();
        if !room.remove_if_current(connection) {
            debug!(%user_id, %room_id, "Stale connection left, membership unchanged");
            return;
        }

        if room.is_empty() {
            entry.remove();
            info!(%user_id, %room_id, "Last user left, room closed");
            return;
        }

        info!(%user_id, %room_id, members = room.len(), "User left room");
        if let Some(frame) = presence_frame(SignalMessage::user_left(user_id)) {
            room.broadcast_except(user_id, &frame);
        }
    }

    /// Delivers `message` within the sender's room: to `message.to` if set,
    /// otherwise to everyone but the sender. Returns how many outbound
    /// queues accepted the frame.
    pub fn route(&self, message: &SignalMessage, from: &Connection) -> usize {
        let Some(room) = self.rooms.get(from.room_id()) else {
            debug!(
                user_id = %from.user_id(),
                room_id = %from.room_id(),
                "Sender's room no longer exists, dropping message"
            );
            return 0;
        };

        let frame = match message.encode() {
            Ok(json) => Bytes::from(json),
            Err(e) => {
                error!("Failed to serialize signal message: {}", e);
                return 0;
            }
        };

        match message.recipient() {
            Some(to) => room.send_to(to, frame),
            None => room.broadcast_except(from.user_id(), &frame),
        }
    }

    pub fn room(&self, room_id: &str) -> Option<Arc<Room>> {
        self.rooms.get(room_id).map(|room| room.value().clone())
    }

    pub fn contains_room(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Sorted user ids of a room; empty if the room does not exist.
    pub fn members(&self, room_id: &str) -> Vec<UserId> {
        self.room(room_id)
            .map(|room| room.user_ids())
            .unwrap_or_default()
    }
}

fn presence_frame(message: SignalMessage) -> Option<Bytes> {
    match message.encode() {
        Ok(json) => Some(Bytes::from(json)),
        Err(e) => {
            error!("Failed to serialize presence message: {}", e);
            None
        }
    }
}
