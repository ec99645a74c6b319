//! Per-connection handler: registration, outbox writer and command loop.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register a session in the world (which queues `WELCOME`)
//!   2. Spawn a writer task draining the session's outbox to the socket
//!   3. Loop: receive frames → decode commands → apply under the lock
//!
//! A closed or failed stream ends the loop; malformed commands do not.

use std::sync::Arc;

use dodge_protocol::{ClientCommand, Codec, PlayerId};
use dodge_session::Outbound;
use dodge_transport::{Connection, TcpConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::DodgeError;

/// Drop guard that removes a player's session when the handler exits.
///
/// This makes cleanup happen even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async lock.
struct SessionGuard {
    player_id: PlayerId,
    state: Arc<ServerState>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut world = state.world.lock().await;
            if let Err(e) = world.disconnect(player_id) {
                tracing::debug!(%player_id, error = %e, "disconnect cleanup failed");
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: TcpConnection,
    state: Arc<ServerState>,
) -> Result<(), DodgeError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let (tx, rx) = mpsc::unbounded_channel();

    // Register and arm the guard together: if registration fails there is
    // nothing to clean up.
    let player_id = state.world.lock().await.connect(tx)?;
    let _guard = SessionGuard {
        player_id,
        state: Arc::clone(&state),
    };

    let writer = tokio::spawn(write_outbox(Arc::clone(&conn), rx, player_id));

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
        };

        let cmd: ClientCommand = match state.codec.decode(&data) {
            Ok(cmd) => cmd,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode command");
                continue;
            }
        };

        let result = state.world.lock().await.apply(player_id, cmd);
        if let Err(e) = result {
            tracing::debug!(%player_id, error = %e, "command rejected");
        }
    }

    writer.abort();
    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close failed");
    }

    // _guard drops here → session disconnect fires.
    Ok(())
}

/// Drains a session's outbox into the socket until either side goes away.
///
/// The outbox closes when the world drops the session, which ends this
/// task on its own after a disconnect.
async fn write_outbox(
    conn: Arc<TcpConnection>,
    mut rx: mpsc::UnboundedReceiver<Outbound>,
    player_id: PlayerId,
) {
    while let Some(payload) = rx.recv().await {
        if let Err(e) = conn.send(&payload).await {
            tracing::debug!(%player_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}
