//! Axum route handlers for caption generation.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::captioning::pipeline::generate_caption;
use crate::captioning::schema::CaptionCandidate;
use crate::errors::AppError;
use crate::state::AppState;

/// Multipart field carrying the uploaded text file.
const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct CaptionRequest {
    pub context: String,
}

#[derive(Debug, Serialize)]
pub struct CaptionResponse {
    pub meme_id: Uuid,
    pub meme_name: String,
    pub caption: CaptionCandidate,
    /// Caption fields joined into one line, for quick display.
    pub text: String,
    pub chunks: usize,
    pub llm_calls: u32,
    pub consolidated: bool,
}

/// POST /api/v1/memes/:id/captions
///
/// Generates a caption from context sent inline as JSON.
pub async fn handle_generate_caption(
    State(state): State<AppState>,
    Path(meme_id): Path<Uuid>,
    Json(request): Json<CaptionRequest>,
) -> Result<Json<CaptionResponse>, AppError> {
    caption_for(&state, meme_id, &request.context).await
}

/// POST /api/v1/memes/:id/captions/upload
///
/// Generates a caption from an uploaded text file (multipart field `file`).
pub async fn handle_upload_caption(
    State(state): State<AppState>,
    Path(meme_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<CaptionResponse>, AppError> {
    let context = read_upload(&mut multipart).await?;
    caption_for(&state, meme_id, &context).await
}

async fn caption_for(
    state: &AppState,
    meme_id: Uuid,
    context: &str,
) -> Result<Json<CaptionResponse>, AppError> {
    let meme = state.catalog.get(meme_id).await?;
    info!(
        "Generating caption for meme '{}' from {} bytes of context",
        meme.name,
        context.len()
    );

    let result = generate_caption(state.llm.as_ref(), &meme, context, &state.pipeline).await?;

    Ok(Json(CaptionResponse {
        meme_id: meme.id,
        meme_name: meme.name,
        text: result.caption.to_line(),
        caption: result.caption,
        chunks: result.chunks,
        llm_calls: result.llm_calls,
        consolidated: result.consolidated,
    }))
}

async fn read_upload(multipart: &mut Multipart) -> Result<String, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error("Invalid multipart body", e))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| upload_error("Could not read uploaded file", e))?;
        return String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::Validation("Uploaded file must be UTF-8 text".to_string()));
    }

    Err(AppError::Validation(format!(
        "Missing multipart field '{UPLOAD_FIELD}'"
    )))
}

/// Body-limit failures surface as 413, like an oversized JSON body.
fn upload_error(context: &str, err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("{context}: {}", err.body_text()))
    } else {
        AppError::Validation(format!("{context}: {}", err.body_text()))
    }
}
