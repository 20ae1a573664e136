//! Axum route handlers for the meme catalog.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::captioning::customizer::{customizer_for, TextPlacement};
use crate::captioning::schema::FieldSpec;
use crate::errors::AppError;
use crate::models::meme::MemeTemplate;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MemeListResponse {
    pub memes: Vec<MemeTemplate>,
}

#[derive(Debug, Serialize)]
pub struct MemeDetailResponse {
    pub meme: MemeTemplate,
    pub display_name: String,
    pub rules: Vec<String>,
    /// The fields a generated caption for this meme will have.
    pub caption_fields: Vec<FieldSpec>,
    pub text_placements: Vec<TextPlacement>,
}

/// GET /api/v1/memes
pub async fn handle_list_memes(
    State(state): State<AppState>,
) -> Result<Json<MemeListResponse>, AppError> {
    let memes = state.catalog.list().await?;
    Ok(Json(MemeListResponse { memes }))
}

/// GET /api/v1/memes/:id
pub async fn handle_get_meme(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MemeDetailResponse>, AppError> {
    let meme = state.catalog.get(id).await?;
    let customizer = customizer_for(&meme);

    Ok(Json(MemeDetailResponse {
        display_name: meme.display_name(),
        rules: meme.rule_lines(),
        caption_fields: customizer.caption_schema(&meme).fields().to_vec(),
        text_placements: customizer.text_placements().to_vec(),
        meme,
    }))
}
