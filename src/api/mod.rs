mod block;
mod chain;
mod file;
mod health;
mod mining;
pub mod models;
mod users;
mod validation;

use actix_web::HttpRequest;
use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

use crate::error::{LedgerError, Result};

/// Header carrying the already-authenticated caller id.
pub const USER_HEADER: &str = "X-User-Id";

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            // chains (static segments before `{chain_id}`)
            .service(chain::create_chain)
            .service(chain::list_chains)
            .service(chain::default_chain)
            .service(chain::get_chain)
            .service(chain::chain_tip)
            .service(chain::chain_stats)
            // blocks
            .service(chain::add_text_block)
            .service(block::get_block)
            .service(block::get_block_content)
            .service(block::verify_block)
            // mining
            .service(mining::mine)
            .service(mining::mining_stats)
            .service(mining::get_difficulty)
            .service(mining::reset_difficulty)
            .service(mining::set_difficulty)
            // validation
            .service(validation::validate_chain)
            .service(validation::chain_integrity)
            .service(validation::validate_block)
            .service(validation::repair_chain)
            // files
            .service(file::upload_file)
            .service(file::supported_types)
            // users
            .service(users::register_user)
            .service(users::get_user)
            .service(users::deactivate_user)
            .service(users::leaderboard)
            .service(users::leaderboard_stats),
    );
}

fn caller_id(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn require_caller(req: &HttpRequest) -> Result<String> {
    caller_id(req).ok_or(LedgerError::Unauthenticated)
}

/// Run chain work (mining, genesis creation) on actix's blocking pool.
async fn run_blocking<F, R>(state: &web::Data<AppState>, f: F) -> Result<R>
where
    F: FnOnce(&AppState) -> Result<R> + Send + 'static,
    R: Send + 'static,
{
    let state = state.clone();
    web::block(move || f(state.get_ref())).await?
}
