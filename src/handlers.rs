//! Inbound message handlers. The decision step runs under the node mutex; the reply send
//! it may trigger is always dispatched after the lock is released — no network I/O under the
//! mutex.

use crate::message::{NodeId, RequestKey};
use crate::node::Node;

impl Node {
    /// `REQUEST(sender, ts)`: observe the clock, then reply immediately or defer depending on
    /// whether this node is itself requesting and, if so, who has priority.
    pub(crate) fn on_request(&self, sender: NodeId, ts: u64) {
        // observe+decide+defer-or-reply-pick is one atomic step: a single lock acquisition, so a
        // concurrently arriving REQUEST can't interleave its own decision between this message's
        // clock update and its reply/defer choice.
        let (lc, do_reply) = {
            let mut state = self.0.state.lock().unwrap_or_else(|e| e.into_inner());
            let lc = state.clock.observe(Some(ts));
            let do_reply = if !state.requesting {
                true
            } else if RequestKey(ts, &sender) < RequestKey(state.request_ts, &self.0.node_id) {
                true
            } else {
                state.deferred.insert(sender.clone());
                false
            };
            (lc, do_reply)
        };
        self.0.audit.recv_request(&sender, ts, lc);

        if do_reply {
            self.spawn_send_reply(sender);
        } else {
            self.0.audit.defer(&sender);
        }
    }

    /// `REPLY(sender, ts)`: observe the clock, count the reply, and wake a waiting `request_cs`
    /// once every peer has replied for the current attempt.
    pub(crate) fn on_reply(&self, sender: NodeId, ts: u64) {
        let (lc, reached_threshold) = {
            let mut state = self.0.state.lock().unwrap_or_else(|e| e.into_inner());
            let lc = state.clock.observe(Some(ts));
            state.reply_count += 1;
            (lc, state.reply_count >= self.0.peers.len())
        };
        self.0.audit.recv_reply(&sender, ts, lc);

        if reached_threshold {
            // edge-triggered: every handler call that observes the threshold re-notifies, which
            // is harmless — `request_cs` re-checks the predicate under the lock before waking up
            // for good, so a spurious extra notify_all never lets it return early.
            self.0.cv.notify_all();
        }
    }
}
