//! Connection handling logic for WebSocket clients.
//!
//! This module contains the per-connection task: WebSocket handshake,
//! registration, the join protocol, inbound frame routing, the outbound writer
//! and the leave protocol once the socket closes.

use crate::{
    connection::{ConnectionId, ConnectionManager, CONNECTION_ID_HEADER},
    error::ServerError,
    session::{Session, SyncHub},
};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, WebSocketConfig};
use tokio_tungstenite::{accept_hdr_async_with_config, tungstenite::Message};
use tracing::{debug, trace, warn};

/// How long to wait for the closing handshake to flush once a connection ends.
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Handles a single client connection from establishment to cleanup.
///
/// # Connection Flow
///
/// 1. Assign the connection id and perform the WebSocket handshake, returning
///    the id in the `x-connection-id` response header
/// 2. Register the connection's outbound queue (or refuse it when full)
/// 3. Run the join protocol: registry entry, snapshot, `newPlayer`
/// 4. Route inbound frames and drain the outbound queue concurrently
/// 5. Run the leave protocol and unregister once either side ends
/// 6. Flush the closing handshake
///
/// The outbound queue is registered before the join protocol runs so the
/// snapshot unicast always has somewhere to go.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    connection_manager: Arc<ConnectionManager>,
    hub: Arc<SyncHub>,
    max_message_size: usize,
) -> Result<(), ServerError> {
    let ws_config = WebSocketConfig::default()
        .max_message_size(Some(max_message_size))
        .max_frame_size(Some(max_message_size));
    let connection_id = ConnectionId::new();
    let id_header = HeaderValue::from_str(&connection_id.to_string())
        .map_err(|e| ServerError::Network(format!("Unusable connection id header: {e}")))?;
    let announce_id = move |_: &Request, mut response: Response| -> Result<Response, ErrorResponse> {
        response.headers_mut().insert(CONNECTION_ID_HEADER, id_header);
        Ok(response)
    };

    let ws_stream = accept_hdr_async_with_config(stream, announce_id, Some(ws_config))
        .await
        .map_err(|e| ServerError::Network(format!("WebSocket handshake failed: {e}")))?;

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();

    if let Err(e) = connection_manager.add_connection(connection_id, addr, outbound_tx) {
        warn!("Refusing connection from {}: {}", addr, e);
        let frame = CloseFrame {
            code: CloseCode::Again,
            reason: "Server full".into(),
        };
        let _ = ws_sender.send(Message::Close(Some(frame))).await;
        return Ok(());
    }

    let mut session = Session::open(hub, connection_id).await;

    // Incoming message task - routes frames into the session
    let incoming_task = {
        let connection_manager = connection_manager.clone();
        let session = &session;

        async move {
            while let Some(msg) = ws_receiver.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        if let Err(e) = session.handle_text(text.as_str()).await {
                            debug!("❌ Dropped frame from {}: {}", connection_id, e);
                        }
                    }
                    Ok(Message::Ping(data)) => {
                        connection_manager.send_message(&connection_id, Message::Pong(data));
                    }
                    Ok(Message::Close(_)) => {
                        debug!("🔌 Client {} requested close", connection_id);
                        break;
                    }
                    Ok(Message::Binary(_)) => {
                        trace!("Ignoring binary frame from {}", connection_id);
                    }
                    Err(e) => {
                        debug!("WebSocket error for connection {}: {}", connection_id, e);
                        break;
                    }
                    _ => {}
                }
            }
        }
    };

    // Outgoing message task - drains the queue into the socket
    let outgoing_task = async {
        while let Some(message) = outbound_rx.recv().await {
            if let Err(e) = ws_sender.send(message).await {
                trace!("Failed to write to {}: {}", connection_id, e);
                break;
            }
        }
    };

    // Run both tasks concurrently until one completes
    tokio::select! {
        _ = incoming_task => {},
        _ = outgoing_task => {},
    }

    session.close().await;
    connection_manager.remove_connection(connection_id);

    // Sends our close frame, or the reply tungstenite queued when the client
    // closed first.
    match tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, ws_sender.close()).await {
        Ok(Err(e)) => trace!("Closing handshake with {} ended: {}", connection_id, e),
        Err(_) => trace!("Closing handshake with {} timed out", connection_id),
        Ok(Ok(())) => {}
    }
    Ok(())
}
