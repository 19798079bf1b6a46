use captains_draft::{
    app,
    config::Config,
    services::{
        auth_user::{JwtSecret, LoginKey},
        lobby_hub::LobbyHub,
    },
};
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if config.uses_default_credentials() {
        warn!("Running with the default token secret or login key; set DRAFT_JWT_SECRET and DRAFT_LOGIN_KEY.");
    }

    let hub = LobbyHub::shared(config.lobby_settings());
    let (tx, _rx) = broadcast::channel::<String>(100);
    let app = app(
        hub,
        tx,
        JwtSecret::new(&config.jwt_secret),
        LoginKey::new(&config.login_key),
    );

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Could not bind {}: {}", config.bind_addr, e);
            std::process::exit(1);
        }
    };
    info!("Started server on {}.", config.bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server stopped: {}", e);
    }
}
