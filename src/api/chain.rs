use actix_web::{HttpRequest, HttpResponse, get, post, web};
use log::info;

use super::models::{
    AppState, BlockCreatedResponse, BlockView, ChainDetailResponse, CreateChainRequest,
    MiningInfo, TextBlockRequest,
};
use super::{caller_id, run_blocking};
use crate::error::Result;
use crate::service::ChainStats;

/// Create a chain; its genesis block is mined right away.
#[post("/chains/")]
pub async fn create_chain(
    state: web::Data<AppState>,
    body: web::Json<CreateChainRequest>,
) -> Result<HttpResponse> {
    let req = body.into_inner();
    let chain = run_blocking(&state, move |s| s.chains.create_chain(&req.name, &req.description))
        .await?;
    Ok(HttpResponse::Created().json(chain))
}

/// List active chains, oldest first.
#[get("/chains/")]
pub async fn list_chains(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.chains.active_chains()?))
}

/// The default chain, created on first use.
#[get("/chains/default/")]
pub async fn default_chain(state: web::Data<AppState>) -> Result<HttpResponse> {
    let chain = run_blocking(&state, |s| s.chains.default_chain()).await?;
    Ok(HttpResponse::Ok().json(chain))
}

/// A chain with all of its blocks in index order.
#[get("/chains/{chain_id}/")]
pub async fn get_chain(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let chain_id = path.into_inner();
    let chain = state.chains.chain(&chain_id)?;
    let blocks = state
        .chains
        .blocks(&chain_id)?
        .into_iter()
        .map(|block| {
            let content = state.chains.block_content(&block.id)?;
            Ok(BlockView { block, content })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(HttpResponse::Ok().json(ChainDetailResponse { chain, blocks }))
}

/// Last hash and next index, i.e. where the next block will attach.
#[get("/chains/{chain_id}/tip/")]
pub async fn chain_tip(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.chains.tip(&path)?))
}

#[get("/chains/{chain_id}/stats/")]
pub async fn chain_stats(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let blocks = state.chains.blocks(&path)?;
    Ok(HttpResponse::Ok().json(ChainStats::from_blocks(&path, &blocks)))
}

/// Mine a TEXT block. The caller, if identified, is rewarded.
#[post("/blocks/text/")]
pub async fn add_text_block(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<TextBlockRequest>,
) -> Result<HttpResponse> {
    let TextBlockRequest { content, chain_id } = body.into_inner();
    let user_id = caller_id(&req);

    let appended = run_blocking(&state, move |s| {
        let chain = s.chains.resolve_chain(chain_id.as_deref())?;
        s.chains
            .append_text(&chain.id, &content, user_id.as_deref())
    })
    .await?;

    info!(
        "API - text block #{} added to chain {}",
        appended.block.index, appended.block.chain_id
    );
    Ok(HttpResponse::Created().json(BlockCreatedResponse {
        success: true,
        mining: MiningInfo::from(&appended.report),
        upload_points: appended.upload_points,
        block: appended.block,
    }))
}
