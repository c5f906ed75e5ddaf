use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::integration::{boot_server, init_tracing};
use crate::utils::{expired_token_for, token_for};

async fn handshake_status(url: String) -> u16 {
    match connect_async(url).await {
        Err(WsError::Http(response)) => response.status().as_u16(),
        Err(e) => panic!("Unexpected handshake error: {e}"),
        Ok(_) => panic!("Handshake should have been rejected"),
    }
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    init_tracing();
    let server = boot_server().await;

    assert_eq!(handshake_status(server.room_url("apt-42")).await, 401);
    assert_eq!(server.service.registry().room_count(), 0);
}

#[tokio::test]
async fn test_bad_tokens_are_rejected() {
    init_tracing();
    let server = boot_server().await;
    let url = server.room_url("apt-42");

    let expired = format!("{url}?token={}", expired_token_for(7));
    assert_eq!(handshake_status(expired).await, 401);

    let garbage = format!("{url}?token=not-a-jwt");
    assert_eq!(handshake_status(garbage).await, 401);

    let foreign = callwire_server::JwtVerifier::new("someone-else")
        .issue(callwire_core::UserId(7), "patient", 60)
        .unwrap();
    assert_eq!(handshake_status(format!("{url}?token={foreign}")).await, 401);

    assert_eq!(server.service.registry().room_count(), 0);
}

#[tokio::test]
async fn test_missing_room_segment_is_rejected() {
    init_tracing();
    let server = boot_server().await;

    let url = format!("ws://{}/api/v1/webrtc/?token={}", server.addr, token_for(7));
    assert_eq!(handshake_status(url).await, 400);
}
