use async_trait::async_trait;
use std::sync::Arc;

use callwire_core::RoomId;
use callwire_server::{Identity, RelayConfig, RoomAccess};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::integration::{boot_server_with, init_tracing};
use crate::utils::{TestClient, token_for};

/// Only user 7 may enter `private-*` rooms.
struct PrivateRooms;

#[async_trait]
impl RoomAccess for PrivateRooms {
    async fn can_join(&self, identity: &Identity, room_id: &RoomId) -> bool {
        !room_id.as_str().starts_with("private-") || identity.user_id.0 == 7
    }
}

#[tokio::test]
async fn test_room_access_denied() {
    init_tracing();
    let server = boot_server_with(RelayConfig::default(), Arc::new(PrivateRooms)).await;

    let url = format!("{}?token={}", server.room_url("private-1"), token_for(12));
    match connect_async(url).await {
        Err(WsError::Http(response)) => assert_eq!(response.status().as_u16(), 403),
        other => panic!("Expected 403, got {:?}", other.map(|_| ())),
    }

    let owner = TestClient::connect(&server.room_url("private-1"), 7, &token_for(7))
        .await
        .expect("Owner should be admitted");
    server.wait_for_members("private-1", &[7]).await;
    owner.close().await.unwrap();
}
