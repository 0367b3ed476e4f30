//! HTTP handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use tracing::{debug, warn};

use super::protocol::{
    HealthResponse, MemoryMatch, RootResponse, SearchMemoryRequest, SearchMemoryResponse,
    StoreMemoryRequest, StoreMemoryResponse,
};
use super::{AppError, AppState};
use crate::core::{Condition, FilterField, FilterOp, Importance};
use crate::error::Error;
use crate::memory::{RecallOptions, RememberRequest};

fn invalid_body(rejection: JsonRejection) -> Error {
    Error::InvalidInput(rejection.body_text())
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Personal Memory Assistant API".into(),
        status: "running".into(),
        version: crate::VERSION.into(),
    })
}

pub async fn store_memory(
    State(state): State<AppState>,
    payload: Result<Json<StoreMemoryRequest>, JsonRejection>,
) -> Result<Json<StoreMemoryResponse>, AppError> {
    let Json(body) = payload.map_err(invalid_body)?;
    let importance = match body.priority.as_deref() {
        Some(p) if !p.trim().is_empty() => p.parse::<Importance>()?,
        _ => Importance::default(),
    };

    let mut request = RememberRequest::new(body.content).with_importance(importance);
    if let Some(category) = body.memory_type {
        request = request.with_category(category);
    }
    if let Some(entities) = body.entities {
        request = request.with_entities(entities.into_vec());
    }

    let record = state.service.remember(request).await?;

    Ok(Json(StoreMemoryResponse {
        success: true,
        memory_id: record.id,
        message: "Memory stored successfully".into(),
    }))
}

pub async fn search_memory(
    State(state): State<AppState>,
    payload: Result<Json<SearchMemoryRequest>, JsonRejection>,
) -> Result<Json<SearchMemoryResponse>, AppError> {
    let Json(body) = payload.map_err(invalid_body)?;
    let mut options = RecallOptions::new();

    if let Some(top_k) = body.top_k {
        if top_k <= 0 {
            return Err(Error::InvalidInput("top_k must be a positive integer".into()).into());
        }
        options = options.with_top_k(usize::try_from(top_k).unwrap_or(usize::MAX));
    }
    if let Some(min_relevance) = body.min_relevance {
        options = options.with_min_relevance(min_relevance);
    }
    if let Some(category) = body.memory_type.filter(|c| !c.trim().is_empty()) {
        options = options.with_category(category);
    }
    if let Some(range) = body.time_range {
        if range.to_lowercase().contains("today") {
            let today = Utc::now().format("%Y-%m-%d").to_string();
            options = options.with_condition(Condition::new(
                FilterField::DateCreated,
                FilterOp::Eq,
                today,
            ));
        } else {
            debug!(time_range = %range, "Ignoring unsupported time range");
        }
    }

    let matches: Vec<MemoryMatch> = state
        .service
        .recall(&body.query, options)
        .await?
        .into_iter()
        .map(MemoryMatch::from)
        .collect();

    Ok(Json(SearchMemoryResponse {
        success: true,
        count: matches.len(),
        matches,
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.service.status().await {
        Ok(stats) => (
            StatusCode::OK,
            Json(HealthResponse::Healthy {
                index_connected: true,
                total_vectors: stats.total_records,
                dimension: stats.dimension,
                timestamp: Utc::now(),
            }),
        ),
        Err(err) => {
            warn!("Health check failed: {}", err);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse::Unhealthy {
                    index_connected: false,
                    error: err.to_string(),
                    timestamp: Utc::now(),
                }),
            )
        }
    }
}
