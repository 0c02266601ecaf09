use std::{env, net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;

use service::country::repository::SeaOrmCountryRepository;
use service::country::CountryService;
use service::storage::local::FsFlagStore;

use crate::routes::{self, auth};

/// Initialize logging via shared common utils
fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load host/port from configs or env vars, with sensible fallbacks
fn load_bind_addr() -> anyhow::Result<SocketAddr> {
    let (host, port) = match configs::load_default() {
        Ok(cfg) => {
            let s = cfg.server;
            (s.host, s.port)
        }
        Err(_) => {
            let host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
            let port = env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8080);
            (host, port)
        }
    };
    Ok(format!("{}:{}", host, port).parse()?)
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let storage = configs::load_default().map(|cfg| cfg.storage).unwrap_or_default();
    common::env::ensure_env(&storage.root).await?;

    // DB connection
    let db = models::db::connect().await?;

    // Country resource service over the SeaORM repository and the local
    // filesystem flag store.
    let repo = Arc::new(SeaOrmCountryRepository { db: db.clone() });
    let flags = Arc::new(FsFlagStore::new(&storage.root, storage.public_base.clone()));
    let countries = Arc::new(CountryService::new(repo, flags));

    // JWT secret
    let jwt_secret =
        std::env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".to_string());
    let state = auth::ServerState {
        db,
        auth: auth::ServerAuthConfig { jwt_secret },
        countries,
    };

    // Build router
    let cors = build_cors();
    let app: Router = routes::build_router(&storage.root, cors, state);

    // Bind and serve
    let addr = load_bind_addr()?;
    info!(%addr, "starting countries api server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
