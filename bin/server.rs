// SMACK Verification Gateway - Web Server
// Same query contract as the legacy ws.php stub: GET ?action=...&... → one JSON value

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use clap::Parser;
use smack_verification::{dispatch, FileListProvider, GatewayConfig, RuleEngine, SystemClock};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "smack-server")]
#[command(about = "SMACK verification gateway - HTTP stub", long_about = None)]
struct Args {
    /// Gateway configuration file (JSON)
    #[arg(short, long, env = "SMACK_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    addr: String,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    engine: Arc<RuleEngine<FileListProvider, SystemClock>>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json("OK")
}

/// GET /ws.php?action=... - Run one verification
async fn verify(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let response = dispatch(state.engine.as_ref(), &params);

    let status = if response.is_client_error() {
        StatusCode::BAD_REQUEST
    } else if response.is_error() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };

    (status, Json(response.to_json()))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    println!("🌐 SMACK Verification Gateway - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = GatewayConfig::load(args.config.as_deref())?;
    for (name, path) in [
        ("receiver BIC", &config.lists.receiver_bic),
        ("receiver QXBAN", &config.lists.receiver_account),
        ("sender BIC", &config.lists.sender_bic),
        ("sender blacklist", &config.lists.sender_blacklist),
        ("priority", &config.lists.priority),
    ] {
        if !path.exists() {
            tracing::warn!(list = name, path = ?path, "Reference list missing; checks using it will fail");
        }
    }

    let state = AppState {
        engine: Arc::new(config.build_engine()),
    };

    let app = Router::new()
        .route("/", get(verify))
        .route("/ws.php", get(verify))
        .route("/api/health", get(health_check))
        .with_state(state)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&args.addr).await?;

    println!("\n🚀 Server running on http://{}", args.addr);
    println!("   Try: /ws.php?action=verify_priority&priority=HIGH");
    println!("\n   Press Ctrl+C to stop\n");
    tracing::info!(addr = %args.addr, tolerance_ms = config.date_tolerance_ms, "Listening");

    axum::serve(listener, app).await?;

    Ok(())
}
