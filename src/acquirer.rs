//! The blocking acquire/release API. `request_cs`/`release_cs` are synchronous: they block
//! the calling thread rather than `.await`, since the lock they hold is a plain
//! [`std::sync::Mutex`]/[`std::sync::Condvar`] pair and no `.await` ever happens while it's
//! held. Call them from a dedicated thread, or from an async caller via
//! `tokio::task::spawn_blocking`, never directly inline in an async fn.

use std::time::Duration;

use crate::message::NodeId;
use crate::node::Node;

impl Node {
    /// Blocks until every peer has replied to this attempt's `REQUEST`, or `timeout` elapses
    /// (falling back to the node's configured default timeout when `None`). Returns `true` once
    /// the caller may enter the critical section. On timeout, proceeds best-effort (returns
    /// `true`) unless `strict_timeout` was configured, in which case it returns `false` and resets
    /// to `IDLE` on the caller's behalf.
    ///
    /// Not reentrant: calling this again before the matching `release_cs` races with this
    /// attempt's own bookkeeping and is a caller bug, not a supported usage.
    pub fn request_cs(&self, timeout: Option<Duration>) -> bool {
        let wait_timeout = timeout.unwrap_or(self.0.timeout);

        let (request_ts, my_attempt) = {
            let mut state = self.0.state.lock().unwrap_or_else(|e| e.into_inner());
            state.requesting = true;
            state.reply_count = 0;
            // cleared on every new attempt: a previous incomplete attempt cannot exist given
            // `request_cs` is non-reentrant, so this can only ever clear an already-empty set
            // in practice.
            state.deferred.clear();
            state.attempt += 1;
            state.request_ts = state.clock.tick();
            (state.request_ts, state.attempt)
        };

        let peer_ids: Vec<NodeId> = self.0.peers.iter().map(|p| p.node_id.clone()).collect();
        self.0.audit.request(request_ts, &peer_ids);
        self.fan_out_requests(request_ts);

        let num_peers = self.0.peers.len();
        let guard = self.0.state.lock().unwrap_or_else(|e| e.into_inner());
        let (guard, wait_result) = self
            .0
            .cv
            .wait_timeout_while(guard, wait_timeout, |state| {
                state.attempt == my_attempt && state.reply_count < num_peers
            })
            .unwrap_or_else(|e| e.into_inner());
        let timed_out = wait_result.timed_out();
        let reply_count = guard.reply_count;
        drop(guard);

        if timed_out {
            self.0.audit.timeout(wait_timeout.as_secs(), reply_count);
            if self.0.strict_timeout {
                let mut state = self.0.state.lock().unwrap_or_else(|e| e.into_inner());
                if state.attempt == my_attempt {
                    state.requesting = false;
                    state.deferred.clear();
                }
                return false;
            }
        }

        self.0.audit.enter(request_ts);
        true
    }

    /// Releases the critical section and replies to everyone deferred during this attempt. A
    /// no-op (besides the `EXIT` log line) when called on an already-`IDLE` node.
    pub fn release_cs(&self) {
        let deferred: Vec<NodeId> = {
            let mut state = self.0.state.lock().unwrap_or_else(|e| e.into_inner());
            state.requesting = false;
            state.deferred.drain().collect()
        };
        for peer_id in &deferred {
            self.spawn_send_reply(peer_id.clone());
        }
        self.0.audit.exit(&deferred);
    }

    /// Diagnostic escape hatch: sends a `REPLY` to `peer_id` outside of the normal deferred-drain
    /// flow. Bypasses the protocol's deferral bookkeeping entirely — exposed deliberately,
    /// not used by the protocol itself.
    pub fn send_reply_to(&self, peer_id: &str) {
        self.spawn_send_reply(peer_id.to_string());
    }
}
