//! Per-connection handler: feeds inbound frames to the dispatcher and
//! writes the connection's outbox to the socket.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The task owns both directions of its socket, so frames from one client
//! are always dispatched in the order they arrived.

use std::sync::Arc;

use mess_protocol::{Codec, ServerMessage};
use mess_rules::RulesEngine;
use mess_session::ConnectionHandle;
use mess_transport::{
    Connection, ConnectionId, TransportError, WebSocketConnection,
};

use crate::server::ServerState;
use crate::MessError;

/// Drop guard that runs disconnect handling when the handler exits.
///
/// Covers the paths that skip the explicit `on_close`/`on_error` calls,
/// panics included. Since `Drop` is synchronous, the lock is taken in a
/// spawned task. A second disconnect for the same connection is a no-op.
struct DisconnectGuard<R: RulesEngine, C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<R, C>>,
}

impl<R: RulesEngine, C: Codec> Drop for DisconnectGuard<R, C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.dispatcher.lock().await.handle_disconnect(conn_id);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<R, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<R, C>>,
) -> Result<(), MessError>
where
    R: RulesEngine,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::info!(%conn_id, "client connected");

    let (handle, mut outbox) = ConnectionHandle::channel(conn_id);
    let _guard = DisconnectGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    let result = loop {
        tokio::select! {
            inbound = conn.recv() => match inbound {
                Ok(Some(data)) => {
                    state.dispatcher.lock().await.on_message(&handle, &data);
                }
                Ok(None) => {
                    state.dispatcher.lock().await.on_close(conn_id);
                    break Ok(());
                }
                Err(e) => {
                    state.dispatcher.lock().await.on_error(conn_id, &e);
                    break Err(MessError::from(e));
                }
            },

            Some(msg) = outbox.recv() => {
                if let Err(e) = deliver(&conn, &state.codec, &msg).await {
                    tracing::debug!(%conn_id, kind = msg.kind(), error = %e, "write failed");
                    state.dispatcher.lock().await.on_error(conn_id, &e);
                    break Err(e);
                }
            }
        }
    };

    if let Err(e) = conn.close().await {
        tracing::trace!(%conn_id, error = %e, "close after disconnect failed");
    }
    tracing::info!(%conn_id, "client disconnected");

    // _guard drops here → disconnect handling runs once more, harmlessly.
    result
}

/// Encodes one outbound message and writes it to the socket.
///
/// UTF-8 output (always the case for JSON) goes out as a text frame, which
/// is what a browser's `JSON.parse(event.data)` expects.
async fn deliver<T, C>(
    conn: &T,
    codec: &C,
    msg: &ServerMessage,
) -> Result<(), MessError>
where
    T: Connection<Error = TransportError>,
    C: Codec,
{
    let bytes = codec.encode(msg)?;
    match String::from_utf8(bytes) {
        Ok(text) => conn.send_text(&text).await?,
        Err(e) => conn.send(&e.into_bytes()).await?,
    }
    Ok(())
}
