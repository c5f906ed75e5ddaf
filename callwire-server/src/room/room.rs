use crate::transport::{Connection, Enqueue};
use bytes::Bytes;
use callwire_core::{RoomId, UserId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Members of one call, keyed by user.
///
/// A room never outlives its last member: the [`Registry`](crate::Registry)
/// drops it in the same critical section that removes that member.
pub struct Room {
    id: RoomId,
    members: RwLock<HashMap<UserId, Arc<Connection>>>,
}

impl Room {
    pub(crate) fn new(id: RoomId) -> Self {
        Self {
            id,
            members: RwLock::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }

    pub fn user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.members.read().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn member(&self, user_id: UserId) -> Option<Arc<Connection>> {
        self.members.read().get(&user_id).cloned()
    }

    /// Inserts `connection`, replacing any previous connection of the same
    /// user, and announces it to everyone else with `presence`.
    pub(crate) fn admit(
        &self,
        connection: Arc<Connection>,
        presence: Option<Bytes>,
    ) -> Option<Arc<Connection>> {
        let user_id = connection.user_id();
        let mut members = self.members.write();
        let replaced = members.insert(user_id, connection);

        if let Some(frame) = presence {
            Self::fan_out(&members, user_id, &frame);
        }

        replaced
    }

    /// Removes the member only if `connection` is the instance currently
    /// registered for its user.
    pub(crate) fn remove_if_current(&self, connection: &Connection) -> bool {
        let mut members = self.members.write();
        let is_current = members
            .get(&connection.user_id())
            .is_some_and(|current| current.id() == connection.id());

        if is_current {
            members.remove(&connection.user_id());
        }
        is_current
    }

    /// Queues `frame` for every member except `except`.
    pub(crate) fn broadcast_except(&self, except: UserId, frame: &Bytes) -> usize {
        Self::fan_out(&self.members.read(), except, frame)
    }

    /// Queues `frame` for the member addressed by the wire string `to`.
    /// Unknown recipients are dropped without telling the sender.
    pub(crate) fn send_to(&self, to: &str, frame: Bytes) -> usize {
        let members = self.members.read();
        let recipient = UserId::parse_wire(to).and_then(|id| members.get(&id));

        match recipient {
            Some(connection) => usize::from(connection.enqueue(frame) == Enqueue::Queued),
            None => {
                debug!(room_id = %self.id, to, "Recipient not in room, dropping message");
                0
            }
        }
    }

    fn fan_out(members: &HashMap<UserId, Arc<Connection>>, except: UserId, frame: &Bytes) -> usize {
        members
            .iter()
            .filter(|(id, _)| **id != except)
            .filter(|(_, connection)| connection.enqueue(frame.clone()) == Enqueue::Queued)
            .count()
    }
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("members", &self.user_ids())
            .finish()
    }
}
