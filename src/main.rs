mod api;
mod blockchain;
mod config;
mod error;
mod ledger;
mod mining;
mod service;
mod storage;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::info;
use std::io;

use api::AppState;
use config::Settings;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let settings = Settings::from_env().map_err(io::Error::other)?;
    let (host, port) = (settings.host.clone(), settings.port);
    let upload_limit = settings.max_upload_bytes;

    let state = web::Data::new(AppState::new(settings).map_err(io::Error::other)?);
    info!(
        "difficulty {} (reward policy: {}, timeout: {:?})",
        state.difficulty.current(),
        state.chains.miner().policy_name(),
        state.settings.mining_timeout
    );

    println!("⛓️ Starting proof-of-work ledger API at http://{host}:{port}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(upload_limit))
            .configure(api::init_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
