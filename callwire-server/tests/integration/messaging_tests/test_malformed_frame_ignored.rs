use serde_json::json;
use std::time::Duration;

use crate::integration::{boot_server, init_tracing};

#[tokio::test]
async fn test_malformed_frame_ignored() {
    init_tracing();
    let server = boot_server().await;

    let mut alice = server.join(1, "r").await;
    let mut bob = server.join(2, "r").await;
    alice.recv_json().await.unwrap();

    bob.send_text("{this is not json").await.unwrap();
    bob.send_json(json!({"type": 42, "to": "1"})).await.unwrap();
    // Presence is server-only.
    bob.send_json(json!({"type": "user-left", "from": "2"}))
        .await
        .unwrap();

    alice
        .expect_silence(Duration::from_millis(200))
        .await
        .expect("Nothing should be relayed");
    server.wait_for_members("r", &[1, 2]).await;

    bob.send_json(json!({"type": "offer", "to": "1"})).await.unwrap();
    let got = alice.recv_json().await.unwrap();
    assert_eq!(got, json!({"type": "offer", "from": "2", "to": "1"}));
}
