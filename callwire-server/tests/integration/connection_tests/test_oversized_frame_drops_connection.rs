use serde_json::json;
use std::sync::Arc;

use callwire_server::{AllowAll, RelayConfig};

use crate::integration::{boot_server_with, init_tracing};

#[tokio::test]
async fn test_oversized_frame_drops_connection() {
    init_tracing();
    let config = RelayConfig {
        max_frame_bytes: 1024,
        ..Default::default()
    };
    let server = boot_server_with(config, Arc::new(AllowAll)).await;

    let mut alice = server.join(7, "apt-42").await;
    let mut bob = server.join(12, "apt-42").await;
    assert_eq!(alice.recv_json().await.unwrap()["type"], "user-joined");

    let huge = "x".repeat(4096);
    // The send itself may or may not fail depending on when the server reacts.
    let _ = bob
        .send_json(json!({"type": "offer", "to": "7", "data": huge}))
        .await;

    let left = alice.recv_json().await.unwrap();
    assert_eq!(left, json!({"type": "user-left", "from": "12"}));
    server.wait_for_members("apt-42", &[7]).await;
    bob.expect_closed()
        .await
        .expect("Server should close the offending socket");
}
