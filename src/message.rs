//! Wire messages exchanged between peers: JSON bodies over HTTP POST.

use serde::{Deserialize, Serialize};

/// `"<ip>:<port>"`, total-ordered by plain string compare — the sole tie-breaker the algorithm
/// depends on.
pub type NodeId = String;

/// Body of both `/dme/request` and `/dme/reply`: the two message kinds share a shape, so the
/// route alone (not a tagged enum) carries the kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub node_id: NodeId,
    pub ts: u64,
}

impl WireMessage {
    pub fn new(node_id: NodeId, ts: u64) -> Self {
        Self { node_id, ts }
    }
}

/// Ordering key for the RA tie-break: `(ts, sender_id)` lexicographic, `ts` numeric first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestKey<'a>(pub u64, pub &'a str);

#[cfg(test)]
mod tests {
    use super::RequestKey;

    #[test]
    fn ts_dominates_id_in_ordering() {
        assert!(RequestKey(1, "zeta") < RequestKey(2, "alpha"));
    }

    #[test]
    fn id_breaks_ties() {
        assert!(RequestKey(5, "A") < RequestKey(5, "B"));
        assert!(!(RequestKey(5, "B") < RequestKey(5, "A")));
    }
}
