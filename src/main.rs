//! Trip Carbon Advisor - Rust/Axum service
//!
//! Estimates CO2 emissions for a mapped trip and fetches AI-generated
//! conservation tips. Serves the built single-page frontend as well.

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod advice;
mod config;
mod error;
pub mod routing;

use advice::{AdviceClient, GeminiProvider};
use config::Config;

/// Application state shared across all handlers
pub struct AppState<P = GeminiProvider> {
    pub advice: Arc<AdviceClient<P>>,
    /// Provider model identifier, for health reporting
    pub model: String,
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            advice: Arc::clone(&self.advice),
            model: self.model.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trip_carbon_advisor=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Resolve configuration once; a missing API key stops startup here.
    let config = Config::from_env()?;
    tracing::info!(
        model = %config.gemini.model,
        timeout = ?config.advice_timeout,
        "Configuration loaded"
    );

    let provider = GeminiProvider::new(&config.gemini)?;
    let client = AdviceClient::new(provider, config.advice_timeout);
    let state = AppState {
        model: client.provider().model().to_string(),
        advice: Arc::new(client),
    };

    // Built frontend with SPA fallback
    let index = config.static_dir.join("index.html");
    let frontend = ServeDir::new(&config.static_dir).fallback(ServeFile::new(index));

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        // Advice API (called by the frontend)
        .nest("/api/advice", advice::router::<GeminiProvider>())
        .fallback_service(frontend)
        // State and middleware
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "trip-carbon-advisor",
        "model": state.model,
    }))
}
