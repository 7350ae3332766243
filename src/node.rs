//! The node: owns the clock, protocol state, audit trail, and transport lifecycle.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::audit::Audit;
use crate::clock::Clock;
use crate::config::{NodeConfig, PeerConfig};
use crate::message::NodeId;

/// Everything guarded by the node's single mutex: clock, requesting flag, own request
/// timestamp, reply counter, deferred set. `attempt` is a generation counter so a condvar waiter
/// from a stale attempt can never be woken by a later attempt's signal.
pub(crate) struct SharedState {
    pub(crate) clock: Clock,
    pub(crate) requesting: bool,
    pub(crate) request_ts: u64,
    pub(crate) reply_count: usize,
    pub(crate) deferred: HashSet<NodeId>,
    pub(crate) attempt: u64,
}

impl SharedState {
    fn new() -> Self {
        Self {
            clock: Clock::new(),
            requesting: false,
            request_ts: 0,
            reply_count: 0,
            deferred: HashSet::new(),
            attempt: 0,
        }
    }
}

pub(crate) struct ServerHandle {
    pub(crate) shutdown: oneshot::Sender<()>,
    pub(crate) join: JoinHandle<()>,
}

pub(crate) struct Inner {
    pub(crate) node_id: NodeId,
    pub(crate) peers: Vec<PeerConfig>,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) timeout: Duration,
    pub(crate) strict_timeout: bool,

    pub(crate) state: Mutex<SharedState>,
    pub(crate) cv: Condvar,
    pub(crate) audit: Audit,
    pub(crate) http: reqwest::Client,
    pub(crate) rt: tokio::runtime::Handle,
    pub(crate) server: Mutex<Option<ServerHandle>>,
}

/// A peer process. Cheaply `Clone`-able (an `Arc` handle) so it can be captured by the `axum`
/// handlers and by the detached send tasks spawned from them.
#[derive(Clone)]
pub struct Node(pub(crate) std::sync::Arc<Inner>);

impl Node {
    /// Builds a node from its constructor inputs, opening the audit log and a pooled HTTP
    /// client. Must be called from within a Tokio runtime — outbound sends are dispatched onto
    /// detached tasks from the synchronous `request_cs`/`release_cs` API, which needs a
    /// captured [`tokio::runtime::Handle`] to do so from non-async call sites.
    pub fn new(config: NodeConfig) -> anyhow::Result<Self> {
        let node_id = config.node_id();
        let peers = config.peers();
        let bind_addr = SocketAddr::new(config.my_ip, config.my_port);
        let audit = Audit::open(&config.logfile(), node_id.clone())?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        let peer_ids: Vec<NodeId> = peers.iter().map(|p| p.node_id.clone()).collect();
        audit.start(&peer_ids);

        Ok(Self(std::sync::Arc::new(Inner {
            node_id,
            peers,
            bind_addr,
            timeout: config.timeout,
            strict_timeout: config.strict_timeout,
            state: Mutex::new(SharedState::new()),
            cv: Condvar::new(),
            audit,
            http,
            rt: tokio::runtime::Handle::current(),
            server: Mutex::new(None),
        })))
    }

    pub fn node_id(&self) -> &NodeId {
        &self.0.node_id
    }

    pub fn peers(&self) -> &[PeerConfig] {
        &self.0.peers
    }

    /// Binds the inbound HTTP server and serves it on a detached task. Returns once the listener
    /// is bound, not once the server has stopped — `stop()` is how the caller waits for shutdown.
    pub async fn start(&self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.0.bind_addr).await?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let app = crate::transport::server::router(self.clone());
        let join = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(err) = result {
                tracing::warn!(%err, "dme inbound server exited with error");
            }
        });
        *self.0.server.lock().unwrap_or_else(|e| e.into_inner()) = Some(ServerHandle {
            shutdown: shutdown_tx,
            join,
        });
        Ok(())
    }

    /// Stops the inbound server and waits for it to finish. Idempotent: calling `stop()` on a
    /// node that was never started, or twice, is a no-op besides the log line.
    pub async fn stop(&self) {
        let handle = self.0.server.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            let _ = handle.shutdown.send(());
            let _ = handle.join.await;
        }
        self.0.audit.stop();
    }
}
