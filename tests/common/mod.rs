#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use portfolio_site::{
    contact::FormFields,
    relay::{HttpRelay, RelayConfig, RelayProvider},
};
use url::Url;

#[derive(Debug, Clone)]
pub struct Captured {
    pub content_type: String,
    pub body: String,
}

/// Starts a relay stand-in that records every request and answers with a fixed reply.
pub async fn spawn_relay(status: StatusCode, reply: &'static str) -> (Url, Arc<Mutex<Vec<Captured>>>) {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();
    let app = Router::new().route(
        "/submit",
        post(move |headers: HeaderMap, body: String| {
            let sink = sink.clone();
            async move {
                let content_type = headers
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                sink.lock()
                    .unwrap()
                    .push(Captured { content_type, body });
                (status, reply)
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (endpoint(addr), captured)
}

pub fn endpoint(addr: SocketAddr) -> Url {
    Url::parse(&format!("http://{addr}/submit")).unwrap()
}

pub fn relay(provider: RelayProvider) -> HttpRelay {
    HttpRelay::new(RelayConfig {
        provider,
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

pub fn jane() -> FormFields {
    FormFields {
        name: "Jane Doe".to_string(),
        email: "jane@example.com".to_string(),
        subject: "Hello".to_string(),
        message: "Test message".to_string(),
    }
}
