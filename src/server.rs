use crate::analysis::{AnalyzeRequest, Analysis, Analyzer, Prepared};
use crate::error::AnalysisError;
use crate::estimator::StrokeAnalysis;
use crate::feedback::FeedbackMessage;
use crate::letters::Letter;
use crate::quality::{QualityLabel, StrokeComplexity};
use crate::util::{percent, round2};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

const SERVER_NAME: &str = "akuru";
const INDEX_HTML: &str = include_str!("../static/index.html");

pub const ENDPOINTS: &[&str] = &[
    "GET /",
    "GET /health",
    "GET /api/health",
    "POST /predict",
    "POST /api/analyze",
    "GET /api/random-letter",
    "GET /api/letters",
    "GET /api/stats",
];

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(analyzer: Arc<Analyzer>) -> Self {
        Self {
            analyzer,
            started_at: Utc::now(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/health", get(health))
        .route("/predict", post(analyze))
        .route("/api/analyze", post(analyze))
        .route("/api/random-letter", get(random_letter))
        .route("/api/letters", get(letters))
        .route("/api/stats", get(stats))
        .fallback(not_found)
        .with_state(state)
}

/// Request body accepted by both analysis routes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeBody {
    pub image: Option<String>,
    pub image_data: Option<String>,
    pub target_letter: Option<String>,
    pub stroke_count: Option<u32>,
    pub request_id: Option<String>,
}

impl From<AnalyzeBody> for AnalyzeRequest {
    fn from(body: AnalyzeBody) -> Self {
        AnalyzeRequest {
            // a blank `image` defers to `imageData`
            payload: body
                .image
                .filter(|s| !s.trim().is_empty())
                .or(body.image_data),
            target: body.target_letter,
            stroke_count: body.stroke_count,
            request_id: body.request_id,
        }
    }
}

#[derive(Serialize)]
struct AlternativeView<'a> {
    letter: &'a Letter,
    confidence: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisDetails<'a> {
    drawing_quality: QualityLabel,
    stroke_complexity: StrokeComplexity,
    target_letter: &'a Letter,
    image_size: usize,
    method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_confidence: Option<f64>,
    processing_time_ms: u64,
    alternatives: Vec<AlternativeView<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stroke_analysis: Option<&'a StrokeAnalysis>,
    request_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse<'a> {
    status: &'static str,
    prediction: &'a Letter,
    confidence: f64,
    confidence_percent: u8,
    is_correct: bool,
    feedback: &'a FeedbackMessage,
    analysis: AnalysisDetails<'a>,
}

impl<'a> From<&'a Analysis> for AnalyzeResponse<'a> {
    fn from(a: &'a Analysis) -> Self {
        let result = &a.result;
        AnalyzeResponse {
            status: "success",
            prediction: &result.prediction,
            confidence: round2(result.confidence),
            confidence_percent: percent(result.confidence),
            is_correct: result.is_correct(),
            feedback: &a.feedback,
            analysis: AnalysisDetails {
                drawing_quality: result.quality,
                stroke_complexity: result.complexity,
                target_letter: &result.target,
                image_size: a.image_size,
                method: result.method,
                target_confidence: result.target_confidence.map(round2),
                processing_time_ms: u64::try_from(result.processing_time.as_millis())
                    .unwrap_or(u64::MAX),
                alternatives: result
                    .alternatives
                    .iter()
                    .map(|alt| AlternativeView {
                        letter: &alt.letter,
                        confidence: round2(alt.confidence),
                    })
                    .collect(),
                stroke_analysis: result.strokes.as_ref(),
                request_id: &a.request_id,
            },
        }
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let analyzer = &state.analyzer;
    analyzer.record_request();

    let uptime = (Utc::now() - state.started_at).num_seconds().max(0);
    let mut body = json!({
        "status": "healthy",
        "server": SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "uptime": uptime,
        "estimator": analyzer.estimator_name(),
    });
    if let Some(stats) = analyzer.stats() {
        let snap = stats.snapshot();
        body["stats"] = json!({
            "requestsHandled": snap.requests_handled,
            "analysisRequests": snap.analysis_requests,
            "averageConfidence": percent(snap.average_confidence),
            "supportedLetters": analyzer.alphabet().catalog.len(),
        });
    }
    Json(body)
}

async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Response {
    let analyzer = &state.analyzer;
    analyzer.record_request();

    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "rejected malformed analysis body");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": rejection.body_text(), "status": "error" })),
            )
                .into_response();
        }
    };
    let target = body.target_letter.clone();

    let drawing = match analyzer.prepare(body.into()) {
        Ok(Prepared::Ready(drawing)) => drawing,
        Ok(Prepared::NoDrawing { .. }) => {
            return Json(json!({
                "prediction": null,
                "status": "no_drawing",
                "feedback": analyzer.composer().no_drawing(),
            }))
            .into_response()
        }
        Err(err) => return error_response(analyzer, err, target.as_deref()),
    };

    if let Some(delay) = analyzer.simulated_delay() {
        tokio::time::sleep(delay).await;
    }

    match analyzer.evaluate(drawing) {
        Ok(analysis) => Json(AnalyzeResponse::from(&analysis)).into_response(),
        Err(err) => error_response(analyzer, err, target.as_deref()),
    }
}

fn error_response(analyzer: &Analyzer, err: AnalysisError, target: Option<&str>) -> Response {
    match err {
        AnalysisError::InvalidLetter { supported, .. } => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Invalid target letter",
                "status": "error",
                "supportedLetters": supported,
            })),
        )
            .into_response(),
        AnalysisError::MissingPayload | AnalysisError::InvalidPayload(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": err.to_string(), "status": "error" })),
        )
            .into_response(),
        AnalysisError::Internal(message) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Analysis failed",
                "status": "error",
                "message": message,
                "fallback": analyzer.fallback(target),
            })),
        )
            .into_response(),
    }
}

async fn random_letter(State(state): State<AppState>) -> Response {
    state.analyzer.record_request();
    match state.analyzer.random_letter() {
        Some(pick) => Json(pick).into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "No letters available" })),
        )
            .into_response(),
    }
}

async fn letters(State(state): State<AppState>) -> impl IntoResponse {
    state.analyzer.record_request();
    let catalog = &state.analyzer.alphabet().catalog;
    Json(json!({
        "letters": catalog.letters(),
        "count": catalog.len(),
    }))
}

async fn stats(State(state): State<AppState>) -> Response {
    let analyzer = &state.analyzer;
    let Some(stats) = analyzer.stats() else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Statistics are disabled" })),
        )
            .into_response();
    };
    stats.record_request();
    let snap = stats.snapshot();

    Json(json!({
        "server": {
            "uptime": snap.uptime_ms,
            "startTime": snap.started_at,
            "requestsHandled": snap.requests_handled,
            "analysisRequests": snap.analysis_requests,
        },
        "performance": {
            "averageConfidence": percent(snap.average_confidence),
            "totalSamples": snap.total_samples,
            "estimator": analyzer.estimator_name(),
        },
        "usage": {
            "topLetters": snap.top_letters,
            "totalLettersSupported": analyzer.alphabet().catalog.len(),
        },
    }))
    .into_response()
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Endpoint not found",
            "availableEndpoints": ENDPOINTS,
        })),
    )
}
