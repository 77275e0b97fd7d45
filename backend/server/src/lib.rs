//! Meteor shower observation log.
//!
//! Observers submit how many meteors they counted and for how long. Every submission is ranked on
//! a shared leaderboard by its hourly rate.
//!
//!
//!
//! # Endpoints
//!
//! - `GET /api/observations`: every observation as JSON, highest rate first
//! - `POST /api/observations`: JSON `{name, meteors, minutes}`, answers `201` with the stored row
//! - `GET /leaderboard`: page data `{observations, error}`, never fails outright
//! - `POST /leaderboard`: form post of the same fields, numbers may be text, redirects back on success
//!
//! Client errors are `400` with a `{"error": message}` body. Only the first problem with a
//! submission is reported.
//!
//!
//!
//! # Storage
//!
//! Redis when `REDIS_URL` is set, otherwise an in-memory store that is lost on restart.
//! See [`database`] for the Redis layout.
//!
//!
//!
//! # Setup
//!
//! Run against a local Redis.
//! ```sh
//! REDIS_URL=redis://localhost:6379 RUST_LOG=info cargo run -p backend
//! ```
//!
//! Seed a running server with sample data.
//! ```sh
//! cargo run -p tester -- http://localhost:1111 25
//! ```
//!
//! Generate docs in `target/doc/meteors/index.html`.
//! ```sh
//! cargo doc
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};

use signal::ctrl_c;
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod observation;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;
pub mod validation;

use error::StartupError;
use routes::{
    LEADERBOARD_PATH, OBSERVATIONS_PATH, create_handler, leaderboard_handler, list_handler,
    submit_handler,
};
pub use state::State;

pub async fn start_server() -> Result<(), StartupError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await?;

    info!("Starting server...");
    let app = build_router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");

    Ok(())
}

pub fn build_router(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route(OBSERVATIONS_PATH, get(list_handler).post(create_handler))
        .route(LEADERBOARD_PATH, get(leaderboard_handler).post(submit_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
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
}
