//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::article::{ArticleError, ArticlePipeline};
use crate::config::Config;
use crate::llm::ProviderRegistry;

use super::types::*;

/// Shared application state.
pub struct AppState {
    /// Builds a fresh crew for every request
    pub pipeline: ArticlePipeline,
}

impl AppState {
    pub fn new(config: Config, registry: Arc<ProviderRegistry>) -> Self {
        Self {
            pipeline: ArticlePipeline::new(config, registry),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// All routes, with tracing and permissive CORS.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/", get(health))
        .route("/providers", get(list_providers))
        .route("/generate-article", post(generate_article))
        .route("/generate-article/", post(generate_article))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let registry = Arc::new(ProviderRegistry::with_defaults(&config));

    // Misconfiguration only fails requests; report it early.
    if let Err(e) = registry.resolve(None, &config.credentials) {
        tracing::warn!("Default provider is not usable yet: {}", e);
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config, registry));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

async fn list_providers(State(state): State<Arc<AppState>>) -> Json<ProvidersResponse> {
    let registry = state.pipeline.registry();
    Json(ProvidersResponse {
        default: registry.default_id().to_string(),
        providers: registry.list(),
    })
}

/// Generate an article. Body errors and blank topics are 422, any failure
/// inside the crew is 500 with the error message as `detail`.
async fn generate_article(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ArticleRequest>, JsonRejection>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::debug!("Rejected article request: {}", rejection.body_text());
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::new(rejection.body_text())),
        )
    })?;

    let min_words = req
        .min_words
        .unwrap_or(state.pipeline.config().min_words);

    match state.pipeline.generate(&req.topic, min_words).await {
        Ok(article) => Ok(Json(article.into())),
        Err(e @ ArticleError::EmptyTopic) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::new(e.to_string())),
        )),
        Err(e) => {
            tracing::error!("Article generation for '{}' failed: {}", req.topic, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            ))
        }
    }
}
