//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use river_tracker::config::TrackerConfig;
use river_tracker::http::HttpServer;
use river_tracker::lifecycle::{build_components, Shutdown};

/// Start a programmable mock upstream on an ephemeral port.
///
/// `f` receives the request target (path and query) and returns the status
/// and body to answer with.
#[allow(dead_code)]
pub async fn start_programmable_upstream<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let target = read_request_target(&mut socket).await;
                        let (status, body) = f(target).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Read the request head and return its target, e.g. `/lifts?page=1`.
async fn read_request_target(socket: &mut tokio::net::TcpStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&head)
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string()
}

/// Config for a fallback-only tracker with fast retries.
#[allow(dead_code)]
pub fn tracker_config(vessels: Option<SocketAddr>, bridge: Option<SocketAddr>) -> TrackerConfig {
    let mut config = TrackerConfig::default();
    config.server.bind_address = "127.0.0.1:0".into();
    config.cache.redis_address = String::new();
    config.retry.initial_delay_ms = 10;
    config.upstreams.request_timeout_secs = 2;
    config.observability.metrics_enabled = false;
    if let Some(addr) = vessels {
        config.upstreams.vessels_url = format!("http://{}/vessels", addr);
    }
    if let Some(addr) = bridge {
        config.upstreams.bridge_url = format!("http://{}/lifts", addr);
    }
    config
}

/// Start the tracker; returns its base URL and the shutdown handle.
#[allow(dead_code)]
pub async fn start_tracker(config: TrackerConfig) -> (String, Shutdown) {
    let components = build_components(&config).unwrap();
    let shutdown = Shutdown::new();
    components.fallback.spawn_sweeper(shutdown.subscribe());

    let listener = TcpListener::bind(&config.server.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(&config.server, components.orchestrator);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (format!("http://{}", addr), shutdown)
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// A vessel API body with two in-port vessels at Tilbury and one arrival.
#[allow(dead_code)]
pub const VESSELS_BODY: &str = r#"{
    "inport": [
        {"vessel_name": "SEA LION", "visit": "V1", "location_name": "TILBURY", "last_rep_dt": "2025-03-01 10:15:00.000"},
        {"vessel_name": "GLOBE", "visit": "V2", "location_name": "TILBURY", "last_rep_dt": "2025-03-01 11:00:00.000"}
    ],
    "arrivals": [
        {"vessel_name": "NORTHERN STAR", "visit": "V3", "location_to": "GRAVESEND", "last_rep_dt": "2025-03-01 12:00:00.000"}
    ],
    "departures": [],
    "forecast": []
}"#;

/// Render a single bridge lift page.
#[allow(dead_code)]
pub fn bridge_page(lifts: &[(&str, &str)], next: Option<&str>) -> String {
    let rows: String = lifts
        .iter()
        .map(|(vessel, time)| {
            format!(
                "<tr><td>-</td><td><time datetime=\"{time}\">d</time></td>\
                 <td><time datetime=\"{time}\">t</time></td><td>{vessel}</td><td>Up river</td></tr>"
            )
        })
        .collect();
    let pager = match next {
        Some(href) => format!(
            "<nav class=\"pager\"><ul><li><a href=\"#\" title=\"Current page\">1</a></li>\
             <li><a href=\"{href}\">2</a></li></ul></nav>"
        ),
        None => String::new(),
    };
    format!("<html><body><table><tbody>{rows}</tbody></table>{pager}</body></html>")
}
