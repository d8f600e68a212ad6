use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::candidate::{
    CandidateDetail, CandidateListData, CandidateUpdate, SearchData, Stats,
};
use crate::models::ApiResponse;
use crate::state::AppState;
use crate::store;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// GET /api/candidates
pub async fn handle_list(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CandidateListData>>, AppError> {
    let candidates = store::list_summaries(&state.db).await?;
    Ok(Json(ApiResponse::ok(
        format!("Retrieved {} candidates", candidates.len()),
        CandidateListData { candidates },
    )))
}

/// GET /api/candidates/:id — the first read marks the candidate viewed.
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CandidateDetail>>, AppError> {
    let candidate = store::get_full(&state.db, id).await?;
    Ok(Json(ApiResponse::ok("Candidate retrieved", candidate)))
}

/// PATCH /api/candidates/:id — merge-patch of the reviewer fields.
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<CandidateUpdate>,
) -> Result<Json<ApiResponse<CandidateDetail>>, AppError> {
    let candidate = store::update(&state.db, id, &patch).await?;
    Ok(Json(ApiResponse::ok("Candidate updated", candidate)))
}

/// GET /api/candidates/:id/resume — streams the PDF from disk.
pub async fn handle_resume(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let path = store::resume_path(&state.db, &state.config.applicants_dir, id).await?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))
        .map_err(AppError::Internal)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "inline"),
        ],
        bytes,
    ))
}

/// GET /api/search?q=... — a blank query short-circuits to an empty list.
pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<SearchData>>, AppError> {
    let candidates = store::search(&state.db, &params.q).await?;
    Ok(Json(ApiResponse::ok(
        format!("Found {} results for '{}'", candidates.len(), params.q),
        SearchData {
            candidates,
            query: params.q,
        },
    )))
}

/// GET /api/stats
pub async fn handle_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Stats>>, AppError> {
    let stats = store::stats(&state.db).await?;
    Ok(Json(ApiResponse::ok("Stats retrieved", stats)))
}
