pub mod messaging_tests;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use callwire_core::UserId;
use callwire_server::{AllowAll, RelayConfig, RoomAccess, SignalingService, signaling_router};
use tokio::net::TcpListener;
use tracing::Level;

use crate::utils::{TestClient, test_verifier, token_for};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub service: SignalingService,
}

impl TestServer {
    pub fn room_url(&self, room_id: &str) -> String {
        format!("ws://{}/api/v1/webrtc/{}", self.addr, room_id)
    }

    pub async fn join(&self, user_id: u64, room_id: &str) -> TestClient {
        let client = TestClient::connect(&self.room_url(room_id), user_id, &token_for(user_id))
            .await
            .expect("Failed to connect test client");
        self.wait_until(|| {
            self.service
                .registry()
                .members(room_id)
                .contains(&UserId(user_id))
        })
        .await;
        client
    }

    /// Polls until `condition` holds; panics after a few seconds.
    pub async fn wait_until(&self, condition: impl Fn() -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(
                tokio::time::Instant::now() < deadline,
                "Condition not met in time"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    pub async fn wait_for_members(&self, room_id: &str, users: &[u64]) {
        let expected: Vec<UserId> = users.iter().copied().map(UserId).collect();
        self.wait_until(|| self.service.registry().members(room_id) == expected)
            .await;
    }
}

pub async fn boot_server() -> TestServer {
    boot_server_with(RelayConfig::default(), Arc::new(AllowAll)).await
}

pub async fn boot_server_with(config: RelayConfig, access: Arc<dyn RoomAccess>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");

    let service = SignalingService::new(config).with_room_access(access);
    let app = signaling_router(service.clone(), Arc::new(test_verifier()));

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });

    TestServer { addr, service }
}
