use anyhow::{Context, Result, bail};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

pub const TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A signaling peer speaking to the relay over a real socket.
pub struct TestClient {
    pub user_id: u64,
    ws: WsStream,
}

impl TestClient {
    /// Connects passing the token as a query parameter.
    pub async fn connect(url: &str, user_id: u64, token: &str) -> Result<Self> {
        let (ws, _) = connect_async(format!("{url}?token={token}"))
            .await
            .context("WebSocket handshake failed")?;
        Ok(Self { user_id, ws })
    }

    /// Connects passing the token in an `Authorization: Bearer` header.
    pub async fn connect_with_header(url: &str, user_id: u64, token: &str) -> Result<Self> {
        let mut request = url.into_client_request()?;
        request
            .headers_mut()
            .insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);

        let (ws, _) = connect_async(request)
            .await
            .context("WebSocket handshake failed")?;
        Ok(Self { user_id, ws })
    }

    pub async fn send_json(&mut self, value: Value) -> Result<()> {
        self.send_text(&value.to_string()).await
    }

    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.ws.send(Message::text(text)).await?;
        Ok(())
    }

    pub async fn send_binary(&mut self, bytes: &[u8]) -> Result<()> {
        self.ws.send(Message::binary(bytes.to_vec())).await?;
        Ok(())
    }

    /// Next JSON frame, skipping control frames.
    pub async fn recv_json(&mut self) -> Result<Value> {
        loop {
            let msg = timeout(TIMEOUT, self.ws.next())
                .await
                .context("Timed out waiting for a frame")?
                .context("Socket closed")??;

            match msg {
                Message::Text(text) => return Ok(serde_json::from_str(text.as_str())?),
                Message::Binary(bytes) => return Ok(serde_json::from_slice(&bytes)?),
                Message::Close(frame) => bail!("Server closed the socket: {:?}", frame),
                _ => continue,
            }
        }
    }

    /// Fails if a data frame arrives within `window`.
    pub async fn expect_silence(&mut self, window: Duration) -> Result<()> {
        match timeout(window, self.next_data_frame()).await {
            Err(_) => Ok(()),
            Ok(Some(frame)) => bail!("Expected no frames, got {:?}", frame),
            Ok(None) => bail!("Socket closed while expecting silence"),
        }
    }

    /// Waits for the server to end the connection.
    pub async fn expect_closed(&mut self) -> Result<()> {
        timeout(TIMEOUT, async {
            while let Some(Ok(msg)) = self.ws.next().await {
                if msg.is_close() {
                    break;
                }
            }
        })
        .await
        .context("Server did not close the socket")
    }

    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await?;
        while let Ok(Some(Ok(_))) = timeout(TIMEOUT, self.ws.next()).await {}
        Ok(())
    }

    async fn next_data_frame(&mut self) -> Option<Message> {
        while let Some(Ok(msg)) = self.ws.next().await {
            if msg.is_text() || msg.is_binary() {
                return Some(msg);
            }
        }
        None
    }
}
