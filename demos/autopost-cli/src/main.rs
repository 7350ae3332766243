//! Example application client of the `request_cs`/`release_cs` API: a `view` / `post`
//! / `quit` REPL wrapping the shared demo file service, plus an optional autopost at startup
//! driven by `--autopost`/`--autopost-file` flags.

use std::io::BufRead;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use ra_dme::{Node, NodeConfig, PeerConfig};

#[derive(Parser, Debug)]
#[command(about = "Example DME-backed chat client")]
struct Args {
    my_ip: IpAddr,
    my_port: u16,
    peer1: String,
    peer2: String,
    file_server: SocketAddr,
    /// Text to autopost once, `delay` seconds after startup.
    #[arg(long)]
    autopost: Option<String>,
    /// File whose contents to autopost once, `delay` seconds after startup.
    #[arg(long)]
    autopost_file: Option<PathBuf>,
    #[arg(long, default_value_t = 1.0)]
    delay: f64,
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

async fn append_to_file_server(
    client: &reqwest::Client,
    file_server: SocketAddr,
    node_id: &str,
    text: &str,
) -> String {
    let body = serde_json::json!({
        "node_id": node_id,
        "client_time": chrono::Local::now().to_rfc3339(),
        "text": text,
    });
    match client
        .post(format!("http://{file_server}/append"))
        .json(&body)
        .send()
        .await
    {
        Ok(resp) => format!("status={}", resp.status()),
        Err(err) => format!("ERROR: {err}"),
    }
}

async fn view_file_server(client: &reqwest::Client, file_server: SocketAddr) -> String {
    match client.get(format!("http://{file_server}/view")).send().await {
        Ok(resp) => resp.text().await.unwrap_or_default(),
        Err(err) => format!("ERROR: {err}"),
    }
}

/// Requests the CS, runs `post_text` through the file service, then releases — the only
/// choreography every caller of this library must get right.
async fn post_under_cs(node: &Node, http: &reqwest::Client, file_server: SocketAddr, text: String) {
    let node_id = node.node_id().clone();
    let entered = {
        let node = node.clone();
        tokio::task::spawn_blocking(move || node.request_cs(None))
            .await
            .unwrap()
    };
    if entered {
        let result = append_to_file_server(http, file_server, &node_id, &text).await;
        println!("POST result={result}");
    }
    node.release_cs();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let mut peers = vec![parse_peer(&args.peer1)?, parse_peer(&args.peer2)?];
    peers.retain(|p| (p.ip, p.port) != (args.file_server.ip(), args.file_server.port()));

    let config = NodeConfig {
        my_ip: args.my_ip,
        my_port: args.my_port,
        peers,
        logfile: None,
        timeout: Duration::from_secs(30),
        strict_timeout: false,
    };
    let node = Node::new(config)?;
    node.start().await?;

    let http = reqwest::Client::new();

    let autopost_text = args.autopost.clone();
    let autopost_file = args.autopost_file.clone();
    if autopost_text.is_some() || autopost_file.is_some() {
        let node = node.clone();
        let http = http.clone();
        let file_server = args.file_server;
        let delay = args.delay;
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs_f64(delay)).await;
            let text = if let Some(path) = autopost_file {
                match tokio::fs::read_to_string(&path).await {
                    Ok(contents) => contents,
                    Err(err) => {
                        eprintln!("AUTOPOST-FILE read error: {err}");
                        return;
                    }
                }
            } else {
                autopost_text.unwrap_or_default()
            };
            println!("[AUTOPOST] posting {} bytes", text.len());
            post_under_cs(&node, &http, file_server, text).await;
        });
    }

    println!("Commands: view | post <text> | quit");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line {
            "quit" => break,
            "view" => {
                let out = view_file_server(&http, args.file_server).await;
                println!("----- CHAT LOG -----\n{out}\n--------------------");
            }
            _ if line.starts_with("post ") => {
                let text = line["post ".len()..].to_string();
                post_under_cs(&node, &http, args.file_server, text).await;
            }
            _ => println!("Unknown cmd"),
        }
    }

    node.stop().await;
    Ok(())
}
