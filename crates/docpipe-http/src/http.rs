//! JSON-over-HTTP surface.
//!
//! - `POST /extract-text` `{url}`: PDF pipeline
//! - `POST /scrape-text` `{url}`: HTML pipeline
//! - `GET /get-text`: last successful result of either pipeline
//! - `GET /health`

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use docpipe_core::{Error, ExtractionRequest, SourceKind};
use docpipe_local::Extractor;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<Extractor>,
}

pub fn router(extractor: Arc<Extractor>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/extract-text", post(extract_text))
        .route("/scrape-text", post(scrape_text))
        .route("/get-text", get(get_text))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { extractor })
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Per-route wording for the two failure classes callers see.
struct RouteMessages {
    required: &'static str,
    failed: &'static str,
}

const PDF_MESSAGES: RouteMessages = RouteMessages {
    required: "PDF URL is required",
    failed: "Failed to extract text from the PDF",
};

const HTML_MESSAGES: RouteMessages = RouteMessages {
    required: "URL is required",
    failed: "Failed to scrape text from the URL",
};

const NO_TEXT: &str = "No text available. Extract first via POST /extract-text or POST /scrape-text";

/// Pipeline details are already logged by the extractor; callers get the fixed wording.
fn api_error(e: Error, msgs: &RouteMessages) -> ApiError {
    match e {
        Error::Validation(_) => ApiError::BadRequest(msgs.required.to_string()),
        Error::InvalidUrl(_) => ApiError::BadRequest("Invalid URL".to_string()),
        Error::NotFound(_) => ApiError::NotFound(NO_TEXT.to_string()),
        Error::Fetch(_) | Error::Assembly(_) => ApiError::Internal(msgs.failed.to_string()),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub message: &'static str,
    pub extracted_text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastTextResponse {
    pub extracted_text: String,
    pub source: SourceKind,
    pub url: String,
}

/// A body that is not JSON, or lacks `url`, is treated as a request without a url.
fn request_or_default(body: Result<Json<ExtractionRequest>, JsonRejection>) -> ExtractionRequest {
    match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::debug!(%rejection, "unreadable request body");
            ExtractionRequest::default()
        }
    }
}

async fn extract_text(
    State(state): State<AppState>,
    body: Result<Json<ExtractionRequest>, JsonRejection>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let req = request_or_default(body);
    let text = state
        .extractor
        .extract_pdf(&req)
        .await
        .map_err(|e| api_error(e, &PDF_MESSAGES))?;
    Ok(Json(ExtractResponse {
        message: "Text extraction successful",
        extracted_text: text,
    }))
}

async fn scrape_text(
    State(state): State<AppState>,
    body: Result<Json<ExtractionRequest>, JsonRejection>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let req = request_or_default(body);
    let text = state
        .extractor
        .extract_html(&req)
        .await
        .map_err(|e| api_error(e, &HTML_MESSAGES))?;
    Ok(Json(ExtractResponse {
        message: "Text scraping successful",
        extracted_text: text,
    }))
}

async fn get_text(State(state): State<AppState>) -> Result<Json<LastTextResponse>, ApiError> {
    let last = state
        .extractor
        .last_result()
        .map_err(|e| api_error(e, &PDF_MESSAGES))?;
    Ok(Json(LastTextResponse {
        extracted_text: last.text.clone(),
        source: last.source,
        url: last.url.clone(),
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
