//! Control Endpoint
//!
//! Owns the single TCP connection to the coordinator. Reads deliver whole
//! messages in arrival order; writes hold the writer lock for a full line so
//! two responses never interleave. [`ControlEndpoint::close`] wakes a read
//! blocked on the socket, which then reports [`EndpointError::Closed`].

use crate::error::EndpointError;
use crate::protocol::{self, Message, Received};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

pub struct ControlEndpoint {
    reader: Mutex<BufReader<OwnedReadHalf>>,
    writer: Mutex<OwnedWriteHalf>,
    closed: watch::Sender<bool>,
}

impl ControlEndpoint {
    /// Connect to the coordinator.
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, EndpointError> {
        let stream = TcpStream::connect(addr).await?;
        if let Ok(peer) = stream.peer_addr() {
            info!(coordinator = %peer, "Connected to coordinator");
        }
        Ok(Self::from_stream(stream))
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        let (read, write) = stream.into_split();
        let (closed, _) = watch::channel(false);
        Self {
            reader: Mutex::new(BufReader::new(read)),
            writer: Mutex::new(write),
            closed,
        }
    }

    /// Send `INIT{name}` and wait for the coordinator's `ACK`.
    pub async fn send_handshake(&self, name: &str) -> Result<(), EndpointError> {
        self.write_message(&Message::Init(name.to_string())).await?;
        match self.read_message().await? {
            Received::Message(Message::Ack) => {
                debug!(agent = %name, "Handshake acknowledged");
                Ok(())
            }
            Received::Message(other) => {
                Err(EndpointError::HandshakeRejected(other.kind().to_string()))
            }
            Received::Unrecognized(kind) => Err(EndpointError::HandshakeRejected(kind)),
        }
    }

    /// Wait for the next message.
    ///
    /// Blank lines are skipped. A line that is not UTF-8 is a decode error
    /// and leaves the connection usable. End of stream and close both yield
    /// [`EndpointError::Closed`].
    pub async fn read_message(&self) -> Result<Received, EndpointError> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return Err(EndpointError::Closed);
        }
        let mut reader = self.reader.lock().await;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = tokio::select! {
                read = reader.read_until(b'\n', &mut buf) => read?,
                _ = closed.changed() => return Err(EndpointError::Closed),
            };
            if read == 0 {
                return Err(EndpointError::Closed);
            }
            let line = std::str::from_utf8(&buf).map_err(|e| EndpointError::Decode {
                kind: "<envelope>".to_string(),
                reason: e.to_string(),
            })?;
            let line = line.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                continue;
            }
            return protocol::decode(line);
        }
    }

    /// Send one complete message.
    pub async fn write_message(&self, message: &Message) -> Result<(), EndpointError> {
        let line = protocol::encode(message)?;
        if *self.closed.borrow() {
            return Err(EndpointError::Closed);
        }
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Shut the connection down. Only the first call has an effect.
    pub async fn close(&self) {
        if self.closed.send_replace(true) {
            return;
        }
        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.shutdown().await {
            debug!(error = %e, "Control connection shutdown failed");
        }
        debug!("Control connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    async fn pair() -> (ControlEndpoint, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (endpoint, accepted) =
            tokio::join!(ControlEndpoint::connect(addr), listener.accept());
        (endpoint.unwrap(), accepted.unwrap().0)
    }

    #[tokio::test]
    async fn test_handshake_accepts_ack() {
        let (endpoint, coordinator) = pair().await;
        let coordinator = tokio::spawn(async move {
            let (read, mut write) = coordinator.into_split();
            let mut lines = BufReader::new(read).lines();
            let init = lines.next_line().await.unwrap().unwrap();
            write.write_all(b"{\"type\":\"ACK\"}\n").await.unwrap();
            init
        });

        endpoint.send_handshake("agent0").await.unwrap();
        let init: serde_json::Value = serde_json::from_str(&coordinator.await.unwrap()).unwrap();
        assert_eq!(init, serde_json::json!({"type": "INIT", "payload": "agent0"}));
    }

    #[tokio::test]
    async fn test_handshake_rejects_other_kinds() {
        let (endpoint, coordinator) = pair().await;
        tokio::spawn(async move {
            let (read, mut write) = coordinator.into_split();
            let mut lines = BufReader::new(read).lines();
            let _ = lines.next_line().await;
            write.write_all(b"{\"type\":\"DebugStepAck\"}\n").await.unwrap();
            let _ = lines.next_line().await;
        });

        let err = endpoint.send_handshake("agent0").await.unwrap_err();
        assert!(matches!(err, EndpointError::HandshakeRejected(ref kind) if kind == "DebugStepAck"));
    }

    #[tokio::test]
    async fn test_handshake_fails_when_coordinator_hangs_up() {
        let (endpoint, coordinator) = pair().await;
        drop(coordinator);
        let err = endpoint.send_handshake("agent0").await.unwrap_err();
        assert!(err.is_terminal());
    }

    #[tokio::test]
    async fn test_reads_preserve_order_and_skip_blank_lines() {
        let (endpoint, mut coordinator) = pair().await;
        coordinator
            .write_all(b"{\"type\":\"MemoryQuery\"}\n\n{\"type\":\"DebugStep\"}\n")
            .await
            .unwrap();

        assert_eq!(
            endpoint.read_message().await.unwrap(),
            Received::Message(Message::MemoryQuery)
        );
        assert_eq!(
            endpoint.read_message().await.unwrap(),
            Received::Message(Message::DebugStep)
        );
    }

    #[tokio::test]
    async fn test_non_utf8_line_is_not_terminal() {
        let (endpoint, mut coordinator) = pair().await;
        coordinator
            .write_all(b"{\"type\":\"\xff\xfe\"}\n{\"type\":\"DebugStatusQuery\"}\n")
            .await
            .unwrap();

        let err = endpoint.read_message().await.unwrap_err();
        assert!(matches!(err, EndpointError::Decode { .. }));
        assert!(!err.is_terminal());
        assert_eq!(
            endpoint.read_message().await.unwrap(),
            Received::Message(Message::DebugStatusQuery)
        );
    }

    #[tokio::test]
    async fn test_close_wakes_blocked_reader() {
        let (endpoint, _coordinator) = pair().await;
        let endpoint = Arc::new(endpoint);

        let reader = {
            let endpoint = Arc::clone(&endpoint);
            tokio::spawn(async move { endpoint.read_message().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        endpoint.close().await;

        let result = tokio::time::timeout(Duration::from_secs(2), reader)
            .await
            .expect("blocked read must return after close")
            .unwrap();
        assert!(matches!(result, Err(EndpointError::Closed)));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_blocks_further_io() {
        let (endpoint, _coordinator) = pair().await;
        endpoint.close().await;
        endpoint.close().await;
        assert!(matches!(
            endpoint.write_message(&Message::Ack).await,
            Err(EndpointError::Closed)
        ));
        assert!(matches!(
            endpoint.read_message().await,
            Err(EndpointError::Closed)
        ));
    }
}
