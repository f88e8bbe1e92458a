// ============================================================================
// WALLET GATEWAY - HTTP + WebSocket server
// ============================================================================

use std::process::ExitCode;

use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wallet_gateway::{build_router, spawn_expiry_sweeper, AppState, GatewayConfig};

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// GRACEFUL SHUTDOWN
// ============================================================================

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("❌ Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("🛑 Shutdown signal received");
}

// ============================================================================
// MAIN
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    // 1. Logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,wallet_gateway=debug")))
        .with(tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true))
        .init();

    info!("╔══════════════════════════════════════════════════════╗");
    info!("║              WALLET GATEWAY  v{:<8}               ║", VERSION);
    info!("║  Node proxy · Address book · Payment requests       ║");
    info!("╚══════════════════════════════════════════════════════╝");

    // 2. Config
    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("🔗 Node RPC: {} (timeout {:?})", config.node_rpc_url, config.rpc_timeout);
    if config.mock_fallback {
        info!("🎭 Mock fallback enabled for unreachable node");
    }

    // 3. State (ReDB + node client)
    info!("🗄️  Opening ReDB at {}", config.data_path);
    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            error!("❌ Startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // 4. Expiry sweeper
    spawn_expiry_sweeper(state.store.clone(), state.events.clone(), config.expiry_sweep_interval);

    // 5. HTTP Server
    let app = build_router(state);
    let addr = config.listen_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("❌ Cannot bind {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("");
    info!("🚀 Listening on http://{}", addr);
    info!("");
    info!("📡 ENDPOINTS:");
    info!("   GET  /health                          Health check");
    info!("   POST /api/rpc                         JSON-RPC proxy");
    info!("   GET  /ws                              Wallet events (WebSocket)");
    info!("");
    info!("📒 ADDRESS BOOK:");
    info!("   GET|POST        /api/addressbook");
    info!("   GET             /api/addressbook/search?q=");
    info!("   GET|PUT|DELETE  /api/addressbook/{{id}}");
    info!("");
    info!("🧾 PAYMENT REQUESTS:");
    info!("   GET|POST        /api/requests");
    info!("   GET|DELETE      /api/requests/{{id}}");
    info!("   PATCH           /api/requests/{{id}}/status");
    info!("");
    info!("👛 WALLET:");
    info!("   POST /api/wallet/create | /import | /send | /estimate-fee");
    info!("   GET  /api/wallet/{{address}}[/balance|/transactions]");
    info!("");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("✅ Server shutdown complete");
    ExitCode::SUCCESS
}
