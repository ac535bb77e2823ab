//! Per-connection handling: the join handshake, then two independent
//! halves (inbound input forwarding, outbound patch/lifecycle delivery)
//! running concurrently for the life of the socket.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use prost::Message as _;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use tile_room_auth::AuthService;
use tile_room_registry::RoomRegistry;
use tile_room_room::{JoinError, RoomOutboundMessage};
use tile_room_wire::{InputCmd, JoinEnvelope};

/// Handle one accepted TCP connection end to end: WebSocket handshake,
/// join envelope, room join, then steady-state message pumping. Errors
/// are logged and simply end this connection; they never affect another
/// session or the room runtime.
pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    session_id: u64,
    registry: Arc<RoomRegistry>,
    auth: Arc<dyn AuthService>,
) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!(%peer, error = %e, "websocket handshake failed");
            return;
        }
    };
    let (mut sink, mut stream) = ws.split();

    let join_bytes = match stream.next().await {
        Some(Ok(Message::Binary(bytes))) => bytes,
        _ => {
            tracing::warn!(%peer, "connection closed before join envelope");
            return;
        }
    };
    let envelope = match JoinEnvelope::decode(join_bytes.as_slice()) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(%peer, error = %e, "malformed join envelope");
            let _ = close_with(&mut sink, tile_room_wire::close_code::AUTH_FAILED, "malformed join envelope").await;
            return;
        }
    };

    let claims = match auth.decode_token(&envelope.token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::info!(%peer, error = %e, "auth failed");
            let _ = close_with(&mut sink, tile_room_wire::close_code::AUTH_FAILED, "authentication failed").await;
            return;
        }
    };

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    let handle = match registry
        .join_or_create(
            &envelope.world_save_id,
            session_id,
            claims.account_id,
            envelope.character_name,
            outbound_tx,
        )
        .await
    {
        Ok(handle) => handle,
        Err(e) => {
            tracing::info!(world_id = %envelope.world_save_id, account_id = claims.account_id, error = %e, "join rejected");
            let _ = close_with(&mut sink, join_close_code(&e), "join rejected").await;
            return;
        }
    };

    tracing::info!(world_id = %envelope.world_save_id, session_id, account_id = claims.account_id, "session established");

    let writer = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            match message {
                RoomOutboundMessage::Deliver(message) => {
                    let bytes = message.encode_to_vec();
                    if sink.send(Message::Binary(bytes)).await.is_err() {
                        break;
                    }
                }
                RoomOutboundMessage::Close(code) => {
                    let _ = close_with(&mut sink, code, "server closed the session").await;
                    return;
                }
            }
        }
        let _ = sink.send(Message::Close(None)).await;
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Binary(bytes)) => match InputCmd::decode(bytes.as_slice()) {
                Ok(input) => {
                    handle
                        .submit_input(session_id, input.sequence_number, input.direction)
                        .await;
                }
                Err(e) => {
                    tracing::warn!(session_id, error = %e, "malformed input message, dropping");
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(session_id, error = %e, "transport error, treating as disconnect");
                break;
            }
        }
    }

    handle.leave(session_id).await;
    writer.abort();
    tracing::info!(session_id, "session closed");
}

fn join_close_code(err: &JoinError) -> u16 {
    err.close_code()
}

async fn close_with(
    sink: &mut (impl SinkExt<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin),
    code: u16,
    reason: &str,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    sink.send(Message::Close(Some(CloseFrame {
        code: CloseCode::from(code),
        reason: reason.to_string().into(),
    })))
    .await
}
