use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use conversy::api;
use conversy::auth::AuthService;
use conversy::config::Config;
use conversy::services::Services;
use conversy::store;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // An unreachable backend degrades to per-call failures instead of
    // refusing to start
    info!("Initializing document store...");
    let store = store::connect_or_unavailable(&config.database, &config.cache).await;
    info!(
        "Read cache: {} entries, {}s TTL",
        config.cache.max_entries, config.cache.ttl_secs
    );

    let services = Services::new(store, &config.stats);

    let auth_service = Arc::new(AuthService::new(&config.auth));
    if auth_service.is_enabled() {
        if config.auth.api_keys.is_empty() {
            info!("🔐 Admin API enabled but no ADMIN_API_KEYS configured - admin routes are locked");
        } else {
            info!(
                "🔐 Admin API key authentication enabled ({} key(s))",
                config.auth.api_keys.len()
            );
        }
    } else {
        info!("🔓 Authentication is disabled - all admin requests are allowed");
    }

    let api_router = api::create_api_router(services, auth_service);

    let api_addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("🚀 API server listening on http://{}", api_addr);
    info!("   - Public endpoints at http://{}/api/...", api_addr);
    info!("   - Admin endpoints at http://{}/api/admin/...", api_addr);

    axum::serve(api_listener, api_router).await?;

    Ok(())
}
