//! Constructor inputs: everything a [`crate::Node`] needs up front, nothing discovered later.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::message::NodeId;

#[derive(Debug, Clone)]
pub struct PeerConfig {
    pub ip: IpAddr,
    pub port: u16,
    pub node_id: NodeId,
}

impl PeerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub my_ip: IpAddr,
    pub my_port: u16,
    /// Full peer set as given by the caller; entries equal to self are filtered out by
    /// [`NodeConfig::peers`], never mutated in place, so callers can still see what they passed.
    pub peers: Vec<PeerConfig>,
    pub logfile: Option<PathBuf>,
    pub timeout: Duration,
    /// When set, `request_cs` returns `false` (and resets to IDLE) on timeout instead of
    /// proceeding best-effort.
    pub strict_timeout: bool,
}

impl NodeConfig {
    pub fn node_id(&self) -> NodeId {
        format!("{}:{}", self.my_ip, self.my_port)
    }

    /// Peers excluding self, in the order supplied.
    pub fn peers(&self) -> Vec<PeerConfig> {
        let self_id = self.node_id();
        self.peers
            .iter()
            .filter(|p| p.node_id != self_id)
            .cloned()
            .collect()
    }

    pub fn logfile(&self) -> PathBuf {
        self.logfile.clone().unwrap_or_else(|| {
            PathBuf::from(format!("dme_{}.log", self.node_id().replace([':', '.'], "_")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(ip: &str, port: u16) -> PeerConfig {
        PeerConfig {
            ip: ip.parse().unwrap(),
            port,
            node_id: format!("{ip}:{port}"),
        }
    }

    #[test]
    fn self_is_filtered_out_of_peers() {
        let cfg = NodeConfig {
            my_ip: "127.0.0.1".parse().unwrap(),
            my_port: 9000,
            peers: vec![peer("127.0.0.1", 9000), peer("127.0.0.1", 9001)],
            logfile: None,
            timeout: Duration::from_secs(5),
            strict_timeout: false,
        };
        let peers = cfg.peers();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].node_id, "127.0.0.1:9001");
    }

    #[test]
    fn default_logfile_is_derived_from_node_id() {
        let cfg = NodeConfig {
            my_ip: "127.0.0.1".parse().unwrap(),
            my_port: 9000,
            peers: vec![],
            logfile: None,
            timeout: Duration::from_secs(5),
            strict_timeout: false,
        };
        assert_eq!(cfg.logfile(), PathBuf::from("dme_127_0_0_1_9000.log"));
    }
}
