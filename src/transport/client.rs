//! Outbound HTTP client. A shared, pooled `reqwest::Client` with a fixed per-send timeout;
//! failures are logged as `NETERR` and never retried or surfaced to the protocol API.

use crate::config::PeerConfig;
use crate::message::{NodeId, WireMessage};
use crate::node::Node;

impl Node {
    /// Sends `REQUEST(self, ts)` to every peer concurrently, each on its own detached task so a
    /// slow or unreachable peer can't delay the others or block the caller.
    pub(crate) fn fan_out_requests(&self, ts: u64) {
        for peer in self.0.peers.clone() {
            self.spawn_send_request(peer, ts);
        }
    }

    fn spawn_send_request(&self, peer: PeerConfig, ts: u64) {
        let node = self.clone();
        self.0.rt.spawn(async move {
            let url = format!("http://{}/dme/request", peer.addr());
            let body = WireMessage::new(node.node_id().clone(), ts);
            match post(&node.0.http, &url, &body).await {
                Ok(()) => node.0.audit.sent_request(&peer.node_id, ts),
                Err(err) => node.0.audit.neterr(&url, &err),
            }
        });
    }

    /// Sends `REPLY(self, lc)` to `peer_id`, looking its address up in the configured peer set.
    /// An unknown peer id is a caller bug (stale deferred entry, typo'd diagnostic call), logged
    /// as `SENT_REPLY_FAIL` rather than panicking.
    pub(crate) fn spawn_send_reply(&self, peer_id: NodeId) {
        let Some(peer) = self.0.peers.iter().find(|p| p.node_id == peer_id).cloned() else {
            self.0.audit.sent_reply_fail(&peer_id);
            return;
        };
        let lc = {
            let state = self.0.state.lock().unwrap_or_else(|e| e.into_inner());
            state.clock.get()
        };
        let node = self.clone();
        self.0.rt.spawn(async move {
            let url = format!("http://{}/dme/reply", peer.addr());
            let body = WireMessage::new(node.node_id().clone(), lc);
            match post(&node.0.http, &url, &body).await {
                Ok(()) => node.0.audit.sent_reply(&peer.node_id, lc),
                Err(err) => node.0.audit.neterr(&url, &err),
            }
        });
    }
}

async fn post(client: &reqwest::Client, url: &str, body: &WireMessage) -> anyhow::Result<()> {
    client.post(url).json(body).send().await?.error_for_status()?;
    Ok(())
}
