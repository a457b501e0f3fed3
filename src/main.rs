//! SMC Exporter binary
//!
//! Wires the SMC collector into a Prometheus registry and serves the
//! exposition endpoint over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use prometheus::Registry;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use smc_exporter::{Error, Result, SensorLabels, SmcCollector, SmcGateway};

// =============================================================================
// CLI Arguments
// =============================================================================

/// SMC Exporter - Prometheus exporter for Apple SMC sensors
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on for telemetry
    #[arg(long, env = "SMC_EXPORTER_LISTEN_ADDR", default_value = "0.0.0.0:9190")]
    listen_addr: String,

    /// Path under which to expose metrics
    #[arg(long, env = "SMC_EXPORTER_TELEMETRY_PATH", default_value = "/metrics")]
    telemetry_path: String,

    /// Path to the JSON file containing sensor labels
    #[arg(long, env = "SMC_EXPORTER_LABELS_FILE", default_value = "sensors.json")]
    labels_file: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting SMC exporter");
    info!("  Version: {}", smc_exporter::VERSION);
    info!("  Listen address: {}", args.listen_addr);
    info!("  Telemetry path: {}", args.telemetry_path);

    #[cfg(unix)]
    if unsafe { libc::geteuid() } == 0 {
        tracing::warn!(
            "SMC exporter is running as root; it is designed to run as an unprivileged user"
        );
    }

    // A missing or malformed label table is fatal at startup, never a
    // per-scrape concern.
    let labels = SensorLabels::load(&args.labels_file)?;
    info!(count = labels.len(), "Loaded sensor labels");

    let registry = Registry::new();
    let collector = SmcCollector::new(Box::new(SmcGateway::new()), labels)?;
    registry.register(Box::new(collector))?;

    run_server(&args, registry).await
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().unwrap());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

// =============================================================================
// Metrics Server
// =============================================================================

struct ServerState {
    registry: Registry,
    telemetry_path: String,
    landing_page: String,
}

async fn run_server(args: &Args, registry: Registry) -> Result<()> {
    use hyper::service::{make_service_fn, service_fn};
    use hyper::{Body, Request, Server};

    let addr: SocketAddr = args.listen_addr.parse().map_err(|e| {
        Error::Configuration(format!("invalid listen address {}: {}", args.listen_addr, e))
    })?;

    let state = Arc::new(ServerState {
        registry,
        telemetry_path: args.telemetry_path.clone(),
        landing_page: landing_page(&args.telemetry_path),
    });

    let make_svc = make_service_fn(move |_conn| {
        let state = state.clone();
        async move {
            Ok::<_, std::convert::Infallible>(service_fn(move |req: Request<Body>| {
                let state = state.clone();
                async move { Ok::<_, std::convert::Infallible>(handle_request(&req, &state)) }
            }))
        }
    });

    info!("Metrics server listening on {}", addr);
    Server::bind(&addr)
        .serve(make_svc)
        .await
        .map_err(|e| Error::Internal(format!("Metrics server error: {}", e)))?;

    Ok(())
}

fn handle_request(req: &hyper::Request<hyper::Body>, state: &ServerState) -> hyper::Response<hyper::Body> {
    use hyper::{Body, Response, StatusCode};
    use prometheus::{Encoder, TextEncoder};

    let path = req.uri().path();

    if path == state.telemetry_path {
        let encoder = TextEncoder::new();
        let metric_families = state.registry.gather();
        let mut buffer = Vec::new();

        return match encoder.encode(&metric_families, &mut buffer) {
            Ok(()) => Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", encoder.format_type())
                .body(Body::from(buffer))
                .unwrap(),
            Err(e) => {
                error!(error = %e, "failed to encode metrics");
                Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Body::from("encoding failure"))
                    .unwrap()
            }
        };
    }

    match path {
        "/" => Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "text/html; charset=utf-8")
            .body(Body::from(state.landing_page.clone()))
            .unwrap(),
        "/healthz" => Response::builder()
            .status(StatusCode::OK)
            .body(Body::from("ok"))
            .unwrap(),
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("not found"))
            .unwrap(),
    }
}

fn landing_page(telemetry_path: &str) -> String {
    format!(
        r#"<html>
    <head><title>SMC Exporter</title></head>
    <body>
    <h1>SMC Exporter</h1>
    <p><a href="{telemetry_path}">Metrics</a></p>
    </body>
    </html>"#
    )
}
