use crate::auth::{AuthError, Identity};
use crate::error::RelayError;
use crate::signaling::SignalingService;
use crate::transport::{Connection, read_loop, write_loop};
use axum::Extension;
use axum::extract::ws::WebSocket;
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::Response;
use callwire_core::RoomId;
use futures::StreamExt;
use tracing::{error, info, warn};

/// `GET /api/v1/webrtc/{room_id}`: upgrades an authenticated request into a
/// signaling connection for `room_id`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    State(service): State<SignalingService>,
    identity: Option<Extension<Identity>>,
) -> Result<Response, RelayError> {
    let Some(Extension(identity)) = identity else {
        return Err(AuthError::MissingToken.into());
    };

    let room_id = RoomId::from(room_id.trim());
    if room_id.is_empty() {
        return Err(RelayError::MissingRoom);
    }

    if !service.room_access().can_join(&identity, &room_id).await {
        warn!(user_id = %identity.user_id, %room_id, "Room access denied");
        return Err(RelayError::Forbidden {
            user: identity.user_id.to_string(),
            room: room_id.to_string(),
        });
    }

    let max_frame = service.config().max_frame_bytes;
    Ok(ws
        .max_message_size(max_frame)
        .max_frame_size(max_frame)
        .on_failed_upgrade(|e| warn!("WebSocket upgrade failed: {}", e))
        .on_upgrade(move |socket| handle_socket(socket, identity, room_id, service)))
}

/// `GET /api/v1/webrtc/`: the room segment is missing.
pub async fn missing_room_handler() -> RelayError {
    RelayError::MissingRoom
}

async fn handle_socket(
    socket: WebSocket,
    identity: Identity,
    room_id: RoomId,
    service: SignalingService,
) {
    let config = service.config();
    let timing = config.timing();
    let (connection, outbound) =
        Connection::new(identity.user_id, room_id, config.outbound_capacity);

    info!(
        user_id = %connection.user_id(),
        room_id = %connection.room_id(),
        role = %identity.role,
        connection_id = %connection.id(),
        "New WebSocket connection"
    );

    let (sink, stream) = socket.split();
    let writer = tokio::spawn(write_loop(sink, outbound, connection.clone(), timing));

    service.registry().join(connection.clone());
    let read_result = read_loop(stream, connection.clone(), service.registry().clone(), timing).await;

    let write_result = match writer.await {
        Ok(result) => result,
        Err(e) => {
            error!(user_id = %connection.user_id(), "Write task panicked: {}", e);
            Ok(())
        }
    };

    info!(
        user_id = %connection.user_id(),
        room_id = %connection.room_id(),
        dropped_frames = connection.dropped_frames(),
        clean = read_result.is_ok() && write_result.is_ok(),
        "WebSocket disconnected"
    );
}
