//! Per-connection read/write pumps.
//!
//! Each upgraded socket runs two independent pumps. The write pump drains
//! the bounded outbound queue into the transport in enqueue order; the read
//! pump feeds inbound frames to the `on_message` hook. Either pump
//! observing a terminal transport error requests unregistration (which is
//! idempotent) and tears the whole connection down: when the write pump
//! dies first, the read half is dropped with it so the transport closes
//! instead of lingering half-open.

use std::fmt::Display;
use std::sync::Arc;

use axum::extract::ws::{Message, Utf8Bytes};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;

use super::hub::{ConnId, Connection, Hub, HubHooks};

/// Registers the socket with the hub and runs both pumps until the
/// transport dies or the hub closes the outbound queue.
///
/// Generic over the transport so the lifecycle can be exercised without a
/// live network socket; the upgrade handler passes axum's `WebSocket`.
pub async fn run_connection<S, E, C>(
    socket: S,
    hub: Hub<C>,
    hooks: Arc<dyn HubHooks<C>>,
    context: C,
    outbound_capacity: usize,
) where
    S: Stream<Item = Result<Message, E>> + Sink<Message, Error = E> + Send + 'static,
    E: Display + Send + 'static,
    C: Send + Sync + 'static,
{
    let conn = Arc::new(Connection::new(context));
    let id = conn.id();

    // The hub keeps the only sender; dropping it on unregistration is what
    // closes the queue.
    let (outbound_tx, outbound_rx) = mpsc::channel(outbound_capacity);
    if hub.register(Arc::clone(&conn), outbound_tx).await.is_err() {
        tracing::warn!(%id, "hub is not running, dropping connection");
        return;
    }

    let (ws_tx, ws_rx) = socket.split();
    let mut writer = tokio::spawn(write_pump(ws_tx, outbound_rx, hub.clone(), id));

    tokio::select! {
        () = read_pump(ws_rx, hooks.as_ref(), &conn) => {
            // Peer closed or the read side errored. Idempotent if the
            // write pump requested unregistration first; the hub closing
            // the queue lets the write pump drain and exit.
            if hub.unregister(id).await.is_err() {
                tracing::debug!(%id, "hub gone during unregister");
            }
            let _ = (&mut writer).await;
        }
        _ = &mut writer => {
            // The write pump hit a transport error and already requested
            // unregistration. Falling out of the select drops the read
            // half, closing the transport instead of leaving the
            // connection half-open with a live read pump.
        }
    }

    tracing::debug!(%id, "connection closed");
}

/// Drains the outbound queue into the transport in enqueue order.
///
/// Terminates cleanly when the hub closes the queue; on a write error it
/// requests unregistration and abandons the transport.
async fn write_pump<W, E, C>(
    mut ws_tx: W,
    mut outbound: mpsc::Receiver<Utf8Bytes>,
    hub: Hub<C>,
    id: ConnId,
) where
    W: Sink<Message, Error = E> + Unpin,
    E: Display,
    C: Send + Sync + 'static,
{
    while let Some(payload) = outbound.recv().await {
        if let Err(err) = ws_tx.send(Message::Text(payload)).await {
            tracing::debug!(%id, error = %err, "write failed, closing connection");
            if hub.unregister(id).await.is_err() {
                tracing::debug!(%id, "hub gone during unregister");
            }
            return;
        }
    }

    // Queue closed by the hub after unregistration: close gracefully.
    let _ = ws_tx.close().await;
}

/// Feeds inbound frames to the message hook until the transport terminates.
///
/// A hook failure is logged and the pump keeps reading; only a close frame,
/// end of stream, or transport error ends the pump.
async fn read_pump<R, E, C>(mut ws_rx: R, hooks: &dyn HubHooks<C>, conn: &Connection<C>)
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
    C: 'static,
{
    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                if let Err(err) = hooks.on_message(conn, text.as_bytes()) {
                    tracing::warn!(id = %conn.id(), error = %err, "on_message hook failed");
                }
            }
            Ok(Message::Binary(data)) => {
                if let Err(err) = hooks.on_message(conn, &data) {
                    tracing::warn!(id = %conn.id(), error = %err, "on_message hook failed");
                }
            }
            Ok(Message::Close(_)) => break,
            // Axum replies to pings itself; pongs need no handling.
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(id = %conn.id(), error = %err, "read failed");
                break;
            }
        }
    }
}
