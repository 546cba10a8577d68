//! WebSocket push transport.

use super::{PushTransport, TransportError};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Push transport over tokio-tungstenite.
///
/// One socket at a time; `connect()` closes any previous socket first.
#[derive(Default)]
pub struct WsTransport {
    stream: Mutex<Option<WsStream>>,
    connected: AtomicBool,
}

impl WsTransport {
    /// Create a disconnected transport.
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for WsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsTransport")
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error;
        match e {
            Error::ConnectionClosed | Error::AlreadyClosed => TransportError::ConnectionClosed,
            other => TransportError::ReceiveFailed(other.to_string()),
        }
    }
}

#[async_trait]
impl PushTransport for WsTransport {
    async fn connect(&self, url: &str) -> Result<(), TransportError> {
        let mut stream = self.stream.lock().await;
        if let Some(mut previous) = stream.take() {
            let _ = previous.close(None).await;
        }
        self.connected.store(false, Ordering::SeqCst);

        let (socket, _response) = connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        tracing::debug!("Push socket open to {}", url);
        *stream = Some(socket);
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn recv(&self) -> Result<String, TransportError> {
        let mut guard = self.stream.lock().await;
        let socket = guard.as_mut().ok_or(TransportError::NotConnected)?;

        loop {
            let message = match socket.next().await {
                Some(Ok(message)) => message,
                Some(Err(e)) => {
                    *guard = None;
                    self.connected.store(false, Ordering::SeqCst);
                    return Err(e.into());
                }
                None => {
                    *guard = None;
                    self.connected.store(false, Ordering::SeqCst);
                    return Err(TransportError::ConnectionClosed);
                }
            };

            match message {
                Message::Text(text) => return Ok(text),
                Message::Binary(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => return Ok(text),
                    Err(_) => tracing::warn!("Dropping non-UTF-8 binary push frame"),
                },
                Message::Close(frame) => {
                    tracing::debug!("Push socket closed by device: {:?}", frame);
                    *guard = None;
                    self.connected.store(false, Ordering::SeqCst);
                    return Err(TransportError::ConnectionClosed);
                }
                // Ping/pong are answered by tungstenite
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.connected.store(false, Ordering::SeqCst);
        let mut stream = self.stream.lock().await;
        if let Some(mut socket) = stream.take() {
            if let Err(e) = socket.close(None).await {
                tracing::debug!("Push socket close error: {}", e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recv_before_connect_fails() {
        let transport = WsTransport::new();
        assert!(matches!(
            transport.recv().await,
            Err(TransportError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn close_without_connection_is_ok() {
        let transport = WsTransport::new();
        transport.close().await.unwrap();
        transport.close().await.unwrap();
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn connect_to_closed_port_fails() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = WsTransport::new();
        let result = transport.connect(&format!("ws://127.0.0.1:{port}/")).await;
        assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
        assert!(!transport.is_connected());
    }
}
