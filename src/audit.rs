//! Append-only event trace. One line per event, fixed shape, asserted against by tests —
//! this is an external contract, not a debugging nicety, so formatting lives in one place.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use crate::message::NodeId;

pub struct Audit {
    node_id: NodeId,
    file: Mutex<File>,
}

impl Audit {
    pub fn open(path: &Path, node_id: NodeId) -> anyhow::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            node_id,
            file: Mutex::new(file),
        })
    }

    /// Writes one line: `[TAG] <iso-8601 timestamp> <node_id> <msg>`. Locked for the duration of
    /// the write so interleaved events from different threads never corrupt a single line.
    pub fn log(&self, tag: &str, msg: &str) {
        let line = format!(
            "[{tag}] {} {} {msg}",
            chrono::Local::now().to_rfc3339(),
            self.node_id
        );
        tracing::debug!(%tag, %msg, "audit event");
        println!("{line}");
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        // best-effort: a broken log file must not take down the protocol
        let _ = writeln!(file, "{line}");
    }

    pub fn start(&self, peers: &[NodeId]) {
        self.log("START", &format!("peers={peers:?}"));
    }

    pub fn request(&self, ts: u64, peers: &[NodeId]) {
        self.log("REQUEST", &format!("ts={ts} peers={peers:?}"));
    }

    pub fn sent_request(&self, to: &str, ts: u64) {
        self.log("SENT_REQUEST", &format!("to={to} ts={ts}"));
    }

    pub fn recv_request(&self, from: &str, ts: u64, lc: u64) {
        self.log("RECV_REQUEST", &format!("from={from} ts={ts} lc={lc}"));
    }

    pub fn defer(&self, from: &str) {
        self.log("DEFER", &format!("deferred-from={from}"));
    }

    pub fn sent_reply(&self, to: &str, lc: u64) {
        self.log("SENT_REPLY", &format!("to={to} lc={lc}"));
    }

    pub fn sent_reply_fail(&self, to: &str) {
        self.log("SENT_REPLY_FAIL", &format!("unknown-peer={to}"));
    }

    pub fn recv_reply(&self, from: &str, ts: u64, lc: u64) {
        self.log("RECV_REPLY", &format!("from={from} ts={ts} lc={lc}"));
    }

    pub fn enter(&self, ts: u64) {
        self.log("ENTER", &format!("ts={ts}"));
    }

    pub fn exit(&self, deferred: &[NodeId]) {
        self.log("EXIT", &format!("released and replied to deferred: {deferred:?}"));
    }

    pub fn timeout(&self, secs: u64, reply_count: usize) {
        self.log(
            "TIMEOUT",
            &format!("did not receive all replies in {secs}s, reply_count={reply_count}"),
        );
    }

    pub fn neterr(&self, url: &str, err: &dyn std::fmt::Display) {
        self.log("NETERR", &format!("{url} -> {err}"));
    }

    pub fn stop(&self) {
        self.log("STOP", "shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn writes_are_line_oriented_and_tagged() {
        let dir = std::env::temp_dir().join(format!("ra-dme-audit-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("node.log");
        let audit = Audit::open(&path, "127.0.0.1:9000".into()).unwrap();
        audit.start(&["127.0.0.1:9001".to_string()]);
        audit.enter(3);

        let mut contents = String::new();
        File::open(&path).unwrap().read_to_string(&mut contents).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[START]"));
        assert!(lines[0].contains("127.0.0.1:9000"));
        assert!(lines[1].starts_with("[ENTER]"));
        assert!(lines[1].contains("ts=3"));
    }
}
