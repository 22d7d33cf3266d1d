//! WebSocket client utilities for testing.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub struct WebSocketClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WebSocketClient {
    /// Connect to a WebSocket endpoint, retrying until success or timeout.
    pub async fn connect_retry(
        url: &str,
        timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let start = tokio::time::Instant::now();
        loop {
            match connect_async(url).await {
                Ok((stream, _)) => return Ok(Self { stream }),
                Err(err) => {
                    if start.elapsed() >= timeout {
                        return Err(Box::new(err));
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            }
        }
    }

    /// Send one event frame.
    pub async fn send_json(&mut self, value: &Value) -> Result<(), Box<dyn std::error::Error>> {
        self.stream
            .send(Message::text(serde_json::to_string(value)?))
            .await?;
        Ok(())
    }

    /// Next text frame parsed as JSON, skipping control frames.
    pub async fn recv_json_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Value>, Box<dyn std::error::Error>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline
                .checked_duration_since(tokio::time::Instant::now())
                .ok_or("Timeout waiting for message")?;

            let frame = tokio::time::timeout(remaining, self.stream.next())
                .await
                .map_err(|_| "Timeout waiting for message")?;

            match frame.transpose()? {
                Some(Message::Text(text)) => {
                    return Ok(Some(serde_json::from_str(text.as_str())?));
                }
                Some(Message::Close(_)) | None => return Ok(None),
                Some(_) => continue,
            }
        }
    }

    /// Keep reading until a frame with the given event name arrives.
    pub async fn recv_event_timeout(
        &mut self,
        event: &str,
        timeout: Duration,
    ) -> Result<Value, Box<dyn std::error::Error>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline
                .checked_duration_since(tokio::time::Instant::now())
                .ok_or_else(|| format!("Timeout waiting for event {event}"))?;

            match self.recv_json_timeout(remaining).await? {
                Some(frame) if frame["event"] == event => return Ok(frame),
                Some(_) => continue,
                None => return Err(format!("Connection closed waiting for {event}").into()),
            }
        }
    }

    pub async fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.stream.close(None).await?;
        Ok(())
    }
}
