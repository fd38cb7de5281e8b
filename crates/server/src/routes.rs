use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use nutriscan_core::{Grade, NutriScoreCalculator, NutrientField, NutrientReading, ScoreResult};
use nutriscan_ocr::{upload_extension, LabelAnalysis, NutrientExtractor};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::render;
use crate::AppState;

// ── Upload handling ───────────────────────────────────────────────────────────

struct Upload {
    ext: String,
    data: Vec<u8>,
}

/// Pull the `file` part out of a multipart form.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_owned);
        if filename.as_deref().map_or(true, str::is_empty) {
            return Err(ApiError::NoFile);
        }
        if let Some(content_type) = field.content_type() {
            if !content_type.starts_with("image/") {
                return Err(ApiError::UnsupportedMedia(content_type.to_owned()));
            }
        }
        let data = field.bytes().await?;
        if data.is_empty() {
            return Err(ApiError::NoFile);
        }
        return Ok(Upload {
            ext: upload_extension(filename.as_deref()),
            data: data.to_vec(),
        });
    }
    Err(ApiError::NoFile)
}

async fn analyze_upload(state: &AppState, multipart: Multipart) -> Result<LabelAnalysis, ApiError> {
    let upload = read_upload(multipart).await?;
    tracing::info!(bytes = upload.data.len(), ext = %upload.ext, "Processing label upload");
    Ok(state.pipeline.process_bytes(&upload.data, &upload.ext).await?)
}

/// 422 when the extracted values were rejected; the body still carries the
/// analysis.
fn analysis_status(analysis: &LabelAnalysis) -> StatusCode {
    if analysis.score_error.is_some() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    }
}

// ── Page adapter ──────────────────────────────────────────────────────────────

pub async fn index_page() -> Html<String> {
    Html(render::page(None, None))
}

pub async fn index_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> (StatusCode, Html<String>) {
    match analyze_upload(&state, multipart).await {
        Ok(analysis) => (analysis_status(&analysis), Html(render::page(Some(&analysis), None))),
        Err(e) => {
            e.log();
            (e.status(), Html(render::page(None, Some(&e.user_message()))))
        }
    }
}

// ── Data adapter ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
    pub ocr_text: String,
    pub nutrients: NutrientReading,
    pub missing: Vec<NutrientField>,
    pub score: Option<i64>,
    pub label: Option<Grade>,
    pub description: Option<String>,
    pub upload_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<LabelAnalysis> for CheckResponse {
    fn from(a: LabelAnalysis) -> Self {
        Self {
            score: a.score.map(|s| s.score),
            label: a.score.map(|s| s.grade),
            description: a.score.map(|s| s.grade.description().to_string()),
            upload_hash: a.upload.map(|u| u.hash_hex),
            error: a.score_error.map(|e| e.to_string()),
            ocr_text: a.ocr_text,
            nutrients: a.nutrients,
            missing: a.missing,
        }
    }
}

pub async fn check(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CheckResponse>), ApiError> {
    let analysis = analyze_upload(&state, multipart).await?;
    Ok((analysis_status(&analysis), Json(analysis.into())))
}

// ── Text-only endpoints ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub nutrients: NutrientReading,
    pub missing: Vec<NutrientField>,
}

pub async fn extract(
    payload: Result<Json<ExtractRequest>, JsonRejection>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let Json(req) = payload?;
    let nutrients = NutrientExtractor::extract(&req.text);
    Ok(Json(ExtractResponse { missing: nutrients.missing(), nutrients }))
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub nutrients: BTreeMap<String, i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub score: i64,
    pub label: Grade,
    pub description: String,
    pub negative_points: f64,
    pub positive_points: f64,
}

impl From<ScoreResult> for ScoreResponse {
    fn from(r: ScoreResult) -> Self {
        Self {
            score: r.score,
            label: r.grade,
            description: r.grade.description().to_string(),
            negative_points: r.negative_points,
            positive_points: r.positive_points,
        }
    }
}

pub async fn score(
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let Json(req) = payload?;
    let reading = NutrientReading::from_named(req.nutrients)?;
    let result = NutriScoreCalculator::score(&reading)?;
    Ok(Json(result.into()))
}

// ── Health ────────────────────────────────────────────────────────────────────

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
