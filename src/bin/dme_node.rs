//! Headless RA peer daemon: binds the inbound transport and serves it until interrupted. Exists
//! so the core protocol can run as its own process; application code that actually calls
//! `request_cs`/`release_cs` links against the `ra-dme` library directly (see `demos/`).

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use ra_dme::{Node, NodeConfig, PeerConfig};

#[derive(Parser, Debug)]
#[command(about = "Ricart-Agrawala distributed mutual exclusion peer")]
struct Args {
    /// This node's bind IP.
    my_ip: IpAddr,
    /// This node's bind port.
    my_port: u16,
    /// Peer addresses as `ip:port`, repeated. Self is filtered out automatically.
    #[arg(required = true)]
    peers: Vec<String>,
    /// Audit log path (defaults to `dme_<ip>_<port>.log`).
    #[arg(long)]
    logfile: Option<PathBuf>,
    /// Default `request_cs` timeout, in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
    /// Return `false` on timeout instead of proceeding best-effort.
    #[arg(long)]
    strict_timeout: bool,
}

fn parse_peer(raw: &str) -> anyhow::Result<PeerConfig> {
    let (ip, port) = raw
        .rsplit_once(':')
        .ok_or_else(|| anyhow::anyhow!("peer address `{raw}` is not `ip:port`"))?;
    Ok(PeerConfig {
        ip: ip.parse()?,
        port: port.parse()?,
        node_id: raw.to_string(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let peers = args
        .peers
        .iter()
        .map(|p| parse_peer(p))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let config = NodeConfig {
        my_ip: args.my_ip,
        my_port: args.my_port,
        peers,
        logfile: args.logfile,
        timeout: Duration::from_secs(args.timeout_secs),
        strict_timeout: args.strict_timeout,
    };
    let node = Node::new(config)?;
    node.start().await?;
    tracing::info!(node_id = %node.node_id(), "dme node listening");

    tokio::signal::ctrl_c().await?;
    node.stop().await;
    Ok(())
}
