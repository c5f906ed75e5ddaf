use crate::auth::Identity;
use async_trait::async_trait;
use callwire_core::RoomId;

/// Decides whether an authenticated user may enter a room.
///
/// The relay itself has no notion of who belongs in which call; deployments
/// that do (an appointment table, say) plug that in here.
#[async_trait]
pub trait RoomAccess: Send + Sync {
    async fn can_join(&self, identity: &Identity, room_id: &RoomId) -> bool;
}

/// Lets every authenticated user into every room.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl RoomAccess for AllowAll {
    async fn can_join(&self, _identity: &Identity, _room_id: &RoomId) -> bool {
        true
    }
}
