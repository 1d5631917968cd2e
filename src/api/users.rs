use actix_web::{HttpResponse, get, post, web};
use log::info;

use super::models::{AppState, LeaderboardResponse, RegisterUserRequest};
use crate::error::Result;

#[post("/users/")]
pub async fn register_user(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> Result<HttpResponse> {
    let account = state.users.register(&body.first_name, &body.last_name)?;
    info!("API - registered user {}", account.id);
    Ok(HttpResponse::Created().json(account))
}

#[get("/users/{user_id}/")]
pub async fn get_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.users.get(&path)?))
}

/// Deactivated users keep their points but earn no further rewards.
#[post("/users/{user_id}/deactivate/")]
pub async fn deactivate_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.users.deactivate(&path)?))
}

#[get("/leaderboard/")]
pub async fn leaderboard(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(LeaderboardResponse {
        entries: state.users.leaderboard()?,
        stats: state.users.stats()?,
    }))
}

#[get("/leaderboard/stats/")]
pub async fn leaderboard_stats(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.users.stats()?))
}
