use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use crate::error::RecommendError;
use crate::recommender::{Recommendation, RecommendationEngine};

#[derive(Clone)]
struct SharedState {
    engine: RecommendationEngine,
}

pub fn router(engine: RecommendationEngine) -> Router {
    let shared_state = Arc::new(SharedState { engine });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/recommend", post(recommend))
        .route("/get-recommendations", post(recommend))
        .route("/health", get(health))
        .layer(cors)
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state)
}

pub async fn serve(engine: RecommendationEngine, addr: &str) -> anyhow::Result<()> {
    let app = router(engine);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
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
    tracing::warn!("shutdown signal received");
}

#[derive(Debug)]
struct HttpError(RecommendError);

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            // The engine already logs RecipeNotFound with the row details.
            if !matches!(self.0, RecommendError::RecipeNotFound { .. }) {
                tracing::error!("{:?}", self.0);
            }
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({"error": self.0.to_string()}))).into_response()
    }
}

impl<E> From<E> for HttpError
where
    E: Into<RecommendError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendRequest {
    /// Comma-space separated ingredient list.
    #[serde(default)]
    pub ingredients: Option<serde_json::Value>,
}

impl RecommendRequest {
    fn ingredients_text(self) -> Result<String, RecommendError> {
        match self.ingredients {
            Some(serde_json::Value::String(text)) => Ok(text),
            None | Some(serde_json::Value::Null) => {
                Err(RecommendError::Input("missing `ingredients` field".to_string()))
            }
            Some(_) => Err(RecommendError::Input("`ingredients` must be a string".to_string())),
        }
    }
}

async fn recommend(
    State(state): State<Arc<SharedState>>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<Vec<Recommendation>>, HttpError> {
    let Json(payload) = payload.map_err(|rejection| RecommendError::Input(rejection.body_text()))?;
    let ingredients = payload.ingredients_text()?;

    let engine = state.engine.clone();
    let results = tokio::task::spawn_blocking(move || engine.recommend(&ingredients))
        .await
        .map_err(|e| RecommendError::Internal(e.into()))??;

    Ok(Json(results))
}

async fn health(State(state): State<Arc<SharedState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "recipes": state.engine.recipe_count(),
        "neighbors": state.engine.k(),
    }))
}
