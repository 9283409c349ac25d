//! DocGate Server - HTTP gateway in front of CouchDB.
//!
//! Re-exposes database and document CRUD under a simplified route layout,
//! manages CouchDB revision tokens on behalf of clients and tags every
//! request with a correlation id.
//!
//! # Usage
//!
//! ```text
//! COUCHDB_ENDPOINT=couchdb:5984 COUCHDB_USER=admin COUCHDB_PASSWORD=secret docgate-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `COUCHDB_ENDPOINT` | `127.0.0.1:5984` | CouchDB `host:port` or URL |
//! | `COUCHDB_USER` | *(empty)* | CouchDB user; empty disables auth |
//! | `COUCHDB_PASSWORD` | *(empty)* | CouchDB password |
//! | `COUCHDB_SCHEME` | `http` | Scheme when the endpoint carries none |
//! | `COUCHDB_HEALTH_PATH` | `_up` | CouchDB liveness endpoint |
//! | `COUCHDB_TIMEOUT_SECS` | `10` | Per-call store timeout |
//! | `REQUEST_TIMEOUT_SECS` | `30` | Inbound request deadline, `0` disables |
//! | `MAX_BODY_BYTES` | `8388608` | Request body limit |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `LOG_FORMAT` | `text` | `text` or `json` |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use docgate_core::{DocGateConfig, DocGateHandler, DocumentService, LogFormat};
use docgate_couchdb::{CouchDbClient, CouchDbConfig};
use docgate_http::{DataHandler, DataHttpService};

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }

    Ok(())
}

/// Run the accept loop, serving connections until `shutdown` resolves.
async fn serve<H, F>(listener: TcpListener, service: DataHttpService<H>, shutdown: F) -> Result<()>
where
    H: DataHandler,
    F: Future<Output = ()>,
{
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Resolve on Ctrl-C.
async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("received shutdown signal, draining connections");
}

/// Perform a health check by connecting to the gateway and requesting `/health`.
///
/// Succeeds only when the gateway answers `200 OK`, which it does only when
/// CouchDB itself is reachable.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    // No write-side shutdown: the server drops a half-closed connection
    // before answering. `Connection: close` ends the read instead.
    writer.write_all(request.as_bytes()).await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    let status_line = response.lines().next().unwrap_or_default();
    if status_line.starts_with("HTTP/1.1 200") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}: {status_line}")
    }
}

/// The address a local health probe should dial for a bind address.
fn health_check_addr(listen_addr: &str) -> String {
    listen_addr.replace("0.0.0.0", "127.0.0.1")
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = DocGateConfig::from_env();

    // Handle --health-check flag for container probes.
    if std::env::args().any(|a| a == "--health-check") {
        let healthy = run_health_check(&health_check_addr(&config.gateway_listen))
            .await
            .is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level, config.log_format)?;

    let couchdb_config = CouchDbConfig::from_env();
    info!(
        couchdb = %couchdb_config.base_url(),
        authenticated = couchdb_config.credentials().is_some(),
        "initializing CouchDB client",
    );
    let client = CouchDbClient::new(couchdb_config).context("failed to build CouchDB client")?;
    let document_service = DocumentService::new(client);
    let handler = DocGateHandler::new(Arc::new(document_service));
    let service = DataHttpService::new(Arc::new(handler), config.http_config());

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        %addr,
        request_timeout = ?config.request_timeout,
        max_body_bytes = config.max_body_bytes,
        version = VERSION,
        "starting DocGate Server",
    );

    serve(listener, service, shutdown_signal()).await
}
