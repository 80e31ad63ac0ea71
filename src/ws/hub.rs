//! Connection hub: registry and fan-out coordinator.
//!
//! A single spawned task owns the set of registered connections. Register,
//! unregister, and broadcast all travel over the same command channel, so a
//! broadcast is totally ordered with respect to every connect/disconnect
//! submitted before it — there is no second, concurrent fan-out path.
//!
//! Each connection moves through `Connecting → Registered → Unregistering
//! → Closed`. Unregistering an id that is no longer in the live set is a
//! no-op, so both pumps may request it without coordination. The hub closes
//! a connection's outbound queue exactly once, by dropping the only sender
//! when the entry is removed from the registry.
//!
//! Backpressure: outbound queues are bounded and fan-out never waits. When
//! a subscriber's queue is full the message is dropped for that subscriber
//! only, so one slow client cannot stall delivery to the rest.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::Utf8Bytes;
use tokio::sync::{mpsc, oneshot};

/// Unique identifier for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(uuid::Uuid);

impl ConnId {
    /// Generates a fresh connection id.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One subscriber's identity plus caller-supplied context.
///
/// The hub never inspects the context; it only hands it back through
/// [`HubHooks`]. A connection is registered with at most one hub, at most
/// once.
pub struct Connection<C> {
    id: ConnId,
    /// Caller-supplied per-connection context, passed to every hook.
    pub context: C,
}

impl<C> Connection<C> {
    /// Wraps the given context with a fresh connection id.
    #[must_use]
    pub fn new(context: C) -> Self {
        Self {
            id: ConnId::new(),
            context,
        }
    }

    /// Returns the connection id.
    #[must_use]
    pub fn id(&self) -> ConnId {
        self.id
    }
}

impl<C> std::fmt::Debug for Connection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Lifecycle hooks invoked by the hub's coordinating loop and by each
/// connection's read pump.
///
/// Hook failures are logged and never interrupt the loop or the pumps; in
/// particular a failing `on_register` does not roll back registration.
pub trait HubHooks<C>: Send + Sync + 'static {
    /// Called after a connection has been added to the live set.
    ///
    /// # Errors
    ///
    /// Implementations may fail; the error is logged by the hub.
    fn on_register(&self, conn: &Connection<C>) -> anyhow::Result<()> {
        let _ = conn;
        Ok(())
    }

    /// Called after a connection has been removed from the live set.
    ///
    /// # Errors
    ///
    /// Implementations may fail; the error is logged by the hub.
    fn on_unregister(&self, conn: &Connection<C>) -> anyhow::Result<()> {
        let _ = conn;
        Ok(())
    }

    /// Called by the read pump for every inbound frame.
    ///
    /// # Errors
    ///
    /// Implementations may fail; the error is logged and the pump keeps
    /// reading.
    fn on_message(&self, conn: &Connection<C>, payload: &[u8]) -> anyhow::Result<()> {
        let _ = (conn, payload);
        Ok(())
    }
}

/// Hook implementation that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl<C> HubHooks<C> for NoopHooks {}

/// Error returned when the hub's coordinator task is no longer running.
#[derive(Debug, thiserror::Error)]
#[error("hub is not running")]
pub struct HubClosed;

enum HubCommand<C> {
    Register {
        conn: Arc<Connection<C>>,
        outbound: mpsc::Sender<Utf8Bytes>,
    },
    Unregister {
        id: ConnId,
    },
    Broadcast {
        payload: Utf8Bytes,
    },
    Count {
        reply: oneshot::Sender<usize>,
    },
}

struct RegisteredClient<C> {
    conn: Arc<Connection<C>>,
    outbound: mpsc::Sender<Utf8Bytes>,
}

/// Cloneable handle to the hub's coordinator task.
pub struct Hub<C> {
    commands: mpsc::Sender<HubCommand<C>>,
}

impl<C> Clone for Hub<C> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
        }
    }
}

impl<C> std::fmt::Debug for Hub<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub").finish_non_exhaustive()
    }
}

impl<C: Send + Sync + 'static> Hub<C> {
    /// Spawns the coordinator task and returns a handle to it.
    ///
    /// The task runs until every handle has been dropped.
    #[must_use]
    pub fn spawn(hooks: Arc<dyn HubHooks<C>>, command_capacity: usize) -> Self {
        let (commands, rx) = mpsc::channel(command_capacity);
        tokio::spawn(run_hub(rx, hooks));
        Self { commands }
    }

    /// Adds a connection to the live set.
    ///
    /// `outbound` must be the only sender for the connection's queue: the
    /// hub closes the queue by dropping it on unregistration.
    ///
    /// # Errors
    ///
    /// Returns [`HubClosed`] if the coordinator task has shut down.
    pub async fn register(
        &self,
        conn: Arc<Connection<C>>,
        outbound: mpsc::Sender<Utf8Bytes>,
    ) -> Result<(), HubClosed> {
        self.commands
            .send(HubCommand::Register { conn, outbound })
            .await
            .map_err(|_| HubClosed)
    }

    /// Removes a connection from the live set and closes its outbound
    /// queue. A no-op if the id is not registered.
    ///
    /// # Errors
    ///
    /// Returns [`HubClosed`] if the coordinator task has shut down.
    pub async fn unregister(&self, id: ConnId) -> Result<(), HubClosed> {
        self.commands
            .send(HubCommand::Unregister { id })
            .await
            .map_err(|_| HubClosed)
    }

    /// Enqueues `payload` for every connection registered at the moment
    /// the command is processed.
    ///
    /// # Errors
    ///
    /// Returns [`HubClosed`] if the coordinator task has shut down.
    pub async fn broadcast(&self, payload: Utf8Bytes) -> Result<(), HubClosed> {
        self.commands
            .send(HubCommand::Broadcast { payload })
            .await
            .map_err(|_| HubClosed)
    }

    /// Returns the number of currently registered connections.
    ///
    /// # Errors
    ///
    /// Returns [`HubClosed`] if the coordinator task has shut down.
    pub async fn connection_count(&self) -> Result<usize, HubClosed> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(HubCommand::Count { reply })
            .await
            .map_err(|_| HubClosed)?;
        rx.await.map_err(|_| HubClosed)
    }
}

async fn run_hub<C: Send + Sync + 'static>(
    mut commands: mpsc::Receiver<HubCommand<C>>,
    hooks: Arc<dyn HubHooks<C>>,
) {
    let mut clients: HashMap<ConnId, RegisteredClient<C>> = HashMap::new();

    while let Some(command) = commands.recv().await {
        match command {
            HubCommand::Register { conn, outbound } => {
                let id = conn.id();
                clients.insert(
                    id,
                    RegisteredClient {
                        conn: Arc::clone(&conn),
                        outbound,
                    },
                );
                tracing::info!(%id, clients = clients.len(), "client connected");
                if let Err(err) = hooks.on_register(&conn) {
                    tracing::error!(%id, error = %err, "on_register hook failed");
                }
            }
            HubCommand::Unregister { id } => {
                // Removing the entry drops the only sender, which closes
                // the outbound queue; the write pump drains and exits.
                if let Some(client) = clients.remove(&id) {
                    tracing::info!(%id, clients = clients.len(), "client disconnected");
                    if let Err(err) = hooks.on_unregister(&client.conn) {
                        tracing::error!(%id, error = %err, "on_unregister hook failed");
                    }
                }
            }
            HubCommand::Broadcast { payload } => {
                for client in clients.values() {
                    match client.outbound.try_send(payload.clone()) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            tracing::warn!(
                                id = %client.conn.id(),
                                "outbound queue full, dropping message"
                            );
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => {
                            tracing::debug!(
                                id = %client.conn.id(),
                                "outbound queue closed, unregister pending"
                            );
                        }
                    }
                }
            }
            HubCommand::Count { reply } => {
                let _ = reply.send(clients.len());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn spawn_hub() -> Hub<()> {
        Hub::spawn(Arc::new(NoopHooks), 64)
    }

    async fn register_client(hub: &Hub<()>, capacity: usize) -> (ConnId, mpsc::Receiver<Utf8Bytes>) {
        let conn = Arc::new(Connection::new(()));
        let id = conn.id();
        let (tx, rx) = mpsc::channel(capacity);
        if hub.register(conn, tx).await.is_err() {
            panic!("hub closed during register");
        }
        (id, rx)
    }

    async fn broadcast(hub: &Hub<()>, payload: &str) {
        if hub.broadcast(Utf8Bytes::from(payload.to_string())).await.is_err() {
            panic!("hub closed during broadcast");
        }
    }

    async fn live_count(hub: &Hub<()>) -> usize {
        let Ok(count) = hub.connection_count().await else {
            panic!("hub closed during count");
        };
        count
    }

    async fn recv_str(rx: &mut mpsc::Receiver<Utf8Bytes>) -> Option<String> {
        rx.recv().await.map(|payload| payload.as_str().to_string())
    }

    #[tokio::test]
    async fn broadcast_reaches_registered_client() {
        let hub = spawn_hub();
        let (_id, mut rx) = register_client(&hub, 8).await;

        broadcast(&hub, "hello").await;

        assert_eq!(recv_str(&mut rx).await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn messages_arrive_in_enqueue_order() {
        let hub = spawn_hub();
        let (_id, mut rx) = register_client(&hub, 8).await;

        for i in 0..5 {
            broadcast(&hub, &format!("m{i}")).await;
        }
        for i in 0..5 {
            assert_eq!(recv_str(&mut rx).await, Some(format!("m{i}")));
        }
    }

    #[tokio::test]
    async fn unregister_closes_outbound_queue() {
        let hub = spawn_hub();
        let (id, mut rx) = register_client(&hub, 8).await;

        if hub.unregister(id).await.is_err() {
            panic!("hub closed during unregister");
        }

        assert!(recv_str(&mut rx).await.is_none());
        assert_eq!(live_count(&hub).await, 0);
    }

    #[tokio::test]
    async fn duplicate_unregister_is_a_noop() {
        let hub = spawn_hub();
        let (id_a, mut rx_a) = register_client(&hub, 8).await;
        let (_id_b, mut rx_b) = register_client(&hub, 8).await;

        for _ in 0..2 {
            if hub.unregister(id_a).await.is_err() {
                panic!("hub closed during unregister");
            }
        }

        assert_eq!(live_count(&hub).await, 1);
        assert!(recv_str(&mut rx_a).await.is_none());

        broadcast(&hub, "still here").await;
        assert_eq!(recv_str(&mut rx_b).await.as_deref(), Some("still here"));
    }

    #[tokio::test]
    async fn unregistered_client_misses_later_broadcasts() {
        let hub = spawn_hub();
        let (id_a, mut rx_a) = register_client(&hub, 8).await;
        let (_id_b, mut rx_b) = register_client(&hub, 8).await;

        if hub.unregister(id_a).await.is_err() {
            panic!("hub closed during unregister");
        }
        broadcast(&hub, "late").await;

        // The queue was closed before the broadcast was processed, so the
        // removed client sees end-of-queue with no message.
        assert!(recv_str(&mut rx_a).await.is_none());
        assert_eq!(recv_str(&mut rx_b).await.as_deref(), Some("late"));
    }

    #[tokio::test]
    async fn late_registrant_misses_earlier_broadcast() {
        let hub = spawn_hub();
        let (_id_a, mut rx_a) = register_client(&hub, 8).await;

        broadcast(&hub, "early").await;
        let (_id_b, mut rx_b) = register_client(&hub, 8).await;

        assert_eq!(recv_str(&mut rx_a).await.as_deref(), Some("early"));
        // Barrier: the count command is ordered after b's registration.
        assert_eq!(live_count(&hub).await, 2);
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn full_queue_drops_only_for_slow_client() {
        let hub = spawn_hub();
        let (_slow, mut slow_rx) = register_client(&hub, 1).await;
        let (_fast, mut fast_rx) = register_client(&hub, 8).await;

        for i in 0..3 {
            broadcast(&hub, &format!("m{i}")).await;
        }

        // The fast client sees every message in order.
        for i in 0..3 {
            assert_eq!(recv_str(&mut fast_rx).await, Some(format!("m{i}")));
        }
        // The slow client only had room for the first; the rest were dropped.
        assert_eq!(recv_str(&mut slow_rx).await.as_deref(), Some("m0"));
        assert!(slow_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn failing_hooks_do_not_stop_the_loop() {
        struct FailingHooks;

        impl HubHooks<()> for FailingHooks {
            fn on_register(&self, _conn: &Connection<()>) -> anyhow::Result<()> {
                anyhow::bail!("register hook failure")
            }

            fn on_unregister(&self, _conn: &Connection<()>) -> anyhow::Result<()> {
                anyhow::bail!("unregister hook failure")
            }
        }

        let hub: Hub<()> = Hub::spawn(Arc::new(FailingHooks), 64);
        let (id_a, _rx_a) = register_client(&hub, 8).await;
        if hub.unregister(id_a).await.is_err() {
            panic!("hub closed during unregister");
        }

        // Registration is not rolled back on hook failure, and the loop
        // keeps serving commands after failed hooks.
        let (_id_b, mut rx_b) = register_client(&hub, 8).await;
        assert_eq!(live_count(&hub).await, 1);

        broadcast(&hub, "alive").await;
        assert_eq!(recv_str(&mut rx_b).await.as_deref(), Some("alive"));
    }

    #[tokio::test]
    async fn connection_count_tracks_live_set() {
        let hub = spawn_hub();
        assert_eq!(live_count(&hub).await, 0);

        let (id_a, _rx_a) = register_client(&hub, 8).await;
        let (_id_b, _rx_b) = register_client(&hub, 8).await;
        assert_eq!(live_count(&hub).await, 2);

        if hub.unregister(id_a).await.is_err() {
            panic!("hub closed during unregister");
        }
        assert_eq!(live_count(&hub).await, 1);
    }
}
