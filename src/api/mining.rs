use actix_web::{HttpRequest, HttpResponse, get, post, web};
use log::info;

use super::models::{
    AppState, DifficultyResponse, MineRequest, MineResponse, MiningInfo, MiningStatsResponse,
    SetDifficultyRequest,
};
use super::{require_caller, run_blocking};
use crate::error::Result;

/// Mine a TEXT block for the calling user.
///
/// Without content the block records who mined it.
#[post("/mining/mine/")]
pub async fn mine(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: Option<web::Json<MineRequest>>,
) -> Result<HttpResponse> {
    let user_id = require_caller(&req)?;
    let user = state.users.get(&user_id)?;
    let MineRequest { content, chain_id } = body.map(web::Json::into_inner).unwrap_or_default();

    let content = content
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| {
            format!("Block mined by {} {}", user.first_name, user.last_name)
                .trim_end()
                .to_string()
        });

    let miner_id = user_id.clone();
    let appended = run_blocking(&state, move |s| {
        let chain = s.chains.resolve_chain(chain_id.as_deref())?;
        s.chains.append_text(&chain.id, &content, Some(&miner_id))
    })
    .await?;

    let account = state.users.get(&user_id)?;
    info!(
        "API - user {} mined block #{} (points now {})",
        user_id, appended.block.index, account.total_points
    );
    Ok(HttpResponse::Ok().json(MineResponse {
        success: true,
        mining: MiningInfo::from(&appended.report),
        block: appended.block,
        user_points: account.total_points,
        blocks_mined: account.blocks_mined,
    }))
}

/// Mining totals for the calling user.
#[get("/mining/stats/")]
pub async fn mining_stats(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let user_id = require_caller(&req)?;
    let account = state.users.get(&user_id)?;
    let average_points_per_block = if account.blocks_mined > 0 {
        account.total_points as f64 / account.blocks_mined as f64
    } else {
        0.0
    };
    Ok(HttpResponse::Ok().json(MiningStatsResponse {
        user_id: account.id,
        total_points: account.total_points,
        blocks_mined: account.blocks_mined,
        average_points_per_block,
        current_difficulty: state.difficulty.current(),
        target_prefix: state.difficulty.target_prefix(),
    }))
}

fn difficulty_response(state: &AppState) -> DifficultyResponse {
    DifficultyResponse {
        current: state.difficulty.current(),
        default: state.difficulty.default_value(),
        target_prefix: state.difficulty.target_prefix(),
        reward_policy: state.chains.miner().policy_name(),
        mining_reward: state.settings.mining_reward,
    }
}

/// Get current PoW difficulty.
#[get("/mining/difficulty/")]
pub async fn get_difficulty(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(difficulty_response(&state))
}

/// Update PoW difficulty (affects future blocks only).
#[post("/mining/difficulty/")]
pub async fn set_difficulty(
    state: web::Data<AppState>,
    body: web::Json<SetDifficultyRequest>,
) -> Result<HttpResponse> {
    state.difficulty.set(body.difficulty)?;
    info!("API - difficulty set to {}", body.difficulty);
    Ok(HttpResponse::Ok().json(difficulty_response(&state)))
}

#[post("/mining/difficulty/reset/")]
pub async fn reset_difficulty(state: web::Data<AppState>) -> HttpResponse {
    state.difficulty.reset();
    info!(
        "API - difficulty reset to {}",
        state.difficulty.default_value()
    );
    HttpResponse::Ok().json(difficulty_response(&state))
}
