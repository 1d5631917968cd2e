use actix_web::{HttpResponse, get, web};
use chrono::Utc;

use super::models::{AppState, BlockCheckResponse, BlockContentResponse, BlockView};
use crate::error::Result;

#[get("/blocks/{block_id}/")]
pub async fn get_block(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let block = state.chains.block(&path)?;
    let content = state.chains.block_content(&block.id)?;
    Ok(HttpResponse::Ok().json(BlockView { block, content }))
}

/// Raw content records (TEXT / FILE_HASH) attached to a block.
#[get("/blocks/{block_id}/content/")]
pub async fn get_block_content(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let block_id = path.into_inner();
    let records = state.chains.content_records(&block_id)?;
    Ok(HttpResponse::Ok().json(BlockContentResponse { block_id, records }))
}

/// Re-hash the block from its stored content and compare.
#[get("/blocks/{block_id}/verify/")]
pub async fn verify_block(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let block_id = path.into_inner();
    let is_valid = state.validator.verify_block_content(&block_id)?;
    Ok(HttpResponse::Ok().json(BlockCheckResponse {
        block_id,
        is_valid,
        timestamp: Utc::now().timestamp_millis(),
    }))
}
