use actix_web::{HttpResponse, get, post, web};
use chrono::Utc;

use super::models::{AppState, BlockCheckResponse, ChainQuery, RepairResponse};
use super::run_blocking;
use crate::error::Result;

/// Walk a chain (default chain when `chain_id` is omitted) and report each link.
/// Never creates the default chain; 404 when there is none.
#[get("/validation/chain/")]
pub async fn validate_chain(
    state: web::Data<AppState>,
    query: web::Query<ChainQuery>,
) -> Result<HttpResponse> {
    let ChainQuery { chain_id } = query.into_inner();
    let validation = run_blocking(&state, move |s| {
        let chain = s.chains.lookup_chain(chain_id.as_deref())?;
        s.validator.validate_chain(&chain.id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(validation))
}

#[get("/validation/integrity/")]
pub async fn chain_integrity(
    state: web::Data<AppState>,
    query: web::Query<ChainQuery>,
) -> Result<HttpResponse> {
    let ChainQuery { chain_id } = query.into_inner();
    let summary = run_blocking(&state, move |s| {
        let chain = s.chains.lookup_chain(chain_id.as_deref())?;
        s.validator.integrity_summary(&chain.id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Structural check of one block (prefix and link, no re-hash).
#[get("/validation/block/{block_id}/")]
pub async fn validate_block(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let block_id = path.into_inner();
    let is_valid = state.validator.validate_single_block(&block_id)?;
    Ok(HttpResponse::Ok().json(BlockCheckResponse {
        block_id,
        is_valid,
        timestamp: Utc::now().timestamp_millis(),
    }))
}

/// Rewrite stale validity flags of a chain.
#[post("/validation/repair/")]
pub async fn repair_chain(
    state: web::Data<AppState>,
    query: web::Query<ChainQuery>,
) -> Result<HttpResponse> {
    let ChainQuery { chain_id } = query.into_inner();
    let (chain_id, repaired_blocks) = run_blocking(&state, move |s| {
        let chain = s.chains.lookup_chain(chain_id.as_deref())?;
        let repaired = s.validator.repair(&chain.id)?;
        Ok((chain.id, repaired))
    })
    .await?;
    Ok(HttpResponse::Ok().json(RepairResponse {
        success: true,
        chain_id,
        repaired_blocks,
        timestamp: Utc::now().timestamp_millis(),
    }))
}
