//! Inbound HTTP server. One `axum` route per message kind; bodies are read as raw
//! bytes and parsed by hand so that any malformed body — missing field, wrong type, truncated
//! JSON — uniformly yields 400 rather than axum's finer-grained (400/422/415) rejection split.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;

use crate::message::WireMessage;
use crate::node::Node;

pub fn router(node: Node) -> Router {
    Router::new()
        .route("/dme/request", post(handle_request))
        .route("/dme/reply", post(handle_reply))
        .with_state(node)
}

fn parse(body: &Bytes) -> Result<WireMessage, StatusCode> {
    serde_json::from_slice(body).map_err(|_| StatusCode::BAD_REQUEST)
}

async fn handle_request(State(node): State<Node>, body: Bytes) -> Result<StatusCode, StatusCode> {
    let message = parse(&body)?;
    node.on_request(message.node_id, message.ts);
    Ok(StatusCode::OK)
}

async fn handle_reply(State(node): State<Node>, body: Bytes) -> Result<StatusCode, StatusCode> {
    let message = parse(&body)?;
    node.on_reply(message.node_id, message.ts);
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_garbage_as_bad_request() {
        let body = Bytes::from_static(b"not json");
        assert_eq!(parse(&body).unwrap_err(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn parse_rejects_missing_fields_as_bad_request() {
        let body = Bytes::from_static(br#"{"node_id": "127.0.0.1:9000"}"#);
        assert_eq!(parse(&body).unwrap_err(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn parse_accepts_well_formed_body() {
        let body = Bytes::from_static(br#"{"node_id": "127.0.0.1:9000", "ts": 3}"#);
        let message = parse(&body).unwrap();
        assert_eq!(message.node_id, "127.0.0.1:9000");
        assert_eq!(message.ts, 3);
    }
}
