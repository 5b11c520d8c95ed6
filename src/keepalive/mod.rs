//! Liveness HTTP surface and optional self-probe loop.
//!
//! External uptime monitors poll these endpoints to confirm the bot is
//! running; the handlers read only configuration copies and the atomic
//! metric counters, so a wedged store lock can never make the process look
//! dead. Three routes:
//!
//! - `/` - plain-text alive response
//! - `/health` - JSON with status, UTC timestamp, uptime, and counters
//! - `/status` - JSON with service name and version
//!
//! With the `probe` feature enabled, a background task pings `/health` on
//! an interval so platform watchdogs that key on outbound traffic see a
//! heartbeat too.

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::config::KeepaliveConfig;
use crate::metrics;

/// Start the liveness listener. Returns the bound address once the socket
/// is up; serving continues on the spawned task until process shutdown.
pub async fn spawn_listener(
    config: KeepaliveConfig,
) -> Result<(std::net::SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(&config.bind).await?;
    let addr = listener.local_addr()?;
    info!("Keepalive listener bound on {}", addr);
    let started = Utc::now();
    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    debug!("Keepalive request from {}", peer);
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, started).await {
                            debug!("Keepalive connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    warn!("Keepalive accept error: {}", e);
                }
            }
        }
    });
    Ok((addr, handle))
}

async fn serve_connection(mut stream: TcpStream, started: DateTime<Utc>) -> Result<()> {
    let mut buf = [0u8; 1024];
    let n = stream.read(&mut buf).await?;
    let head = String::from_utf8_lossy(&buf[..n]);
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let (status, content_type, body) = match path.as_str() {
        "/" => ("200 OK", "text/plain", "Bot is alive!".to_string()),
        "/health" => {
            let now = Utc::now();
            let payload = serde_json::json!({
                "status": "healthy",
                "timestamp": now.to_rfc3339(),
                "uptime_seconds": (now - started).num_seconds(),
                "metrics": metrics::snapshot(),
            });
            ("200 OK", "application/json", payload.to_string())
        }
        "/status" => {
            let payload = serde_json::json!({
                "status": "online",
                "bot": "statbot",
                "version": env!("CARGO_PKG_VERSION"),
            });
            ("200 OK", "application/json", payload.to_string())
        }
        _ => ("404 Not Found", "text/plain", "not found".to_string()),
    };

    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Periodically ping our own `/health` endpoint. Errors are logged and the
/// loop keeps going; the next ping may succeed.
#[cfg(feature = "probe")]
pub fn spawn_probe(config: KeepaliveConfig) -> Option<JoinHandle<()>> {
    if config.probe_interval_seconds == 0 {
        return None;
    }
    let url = format!("http://{}/health", probe_host(&config.bind));
    let period = std::time::Duration::from_secs(config.probe_interval_seconds);
    Some(tokio::spawn(async move {
        let client = reqwest::Client::new();
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match client.get(&url).timeout(std::time::Duration::from_secs(10)).send().await {
                Ok(resp) if resp.status().is_success() => {
                    debug!("Self-ping successful: {}", url);
                }
                Ok(resp) => {
                    warn!("Self-ping returned status {}", resp.status());
                }
                Err(e) => {
                    warn!("Self-ping error: {}", e);
                }
            }
        }
    }))
}

/// A wildcard bind address is not dialable; probe loopback instead.
#[cfg(feature = "probe")]
fn probe_host(bind: &str) -> String {
    match bind.strip_prefix("0.0.0.0") {
        Some(rest) => format!("127.0.0.1{rest}"),
        None => bind.to_string(),
    }
}
