mod db;
mod handlers;
mod models;
mod routes;
mod services;
mod state;
mod structs;
mod utils;
mod views;

use crate::db::store::JsonStore;
use crate::services::telegram::TelegramClient;
use crate::state::app_state::AppState;
use crate::state::config::AppConfig;
use actix_web::{App, HttpServer, middleware::Logger, web};
use dotenv::dotenv;
use env_logger::Env;
use log::info;
use routes::init_routes;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Open the data directory holding the JSON documents
    let store = match JsonStore::open(&config.data_dir).await {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error opening the data store: {:#}", e);
            std::process::exit(1);
        }
    };

    let telegram = match TelegramClient::new(&config.telegram_api_base, config.telegram_timeout) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error creating the Telegram client: {:#}", e);
            std::process::exit(1);
        }
    };

    let bind = (config.bind_address.clone(), config.port);
    info!(
        "Serving on {}:{} with data in {}",
        bind.0,
        bind.1,
        store.dir().display()
    );

    // Create shared state
    let app_state = web::Data::new(AppState::new(config, store, Arc::new(telegram)));

    HttpServer::new(move || {
        let logger = Logger::new("%a \"%r\" %s %b \"%{Referer}i\" \"%{User-Agent}i\" %D ms");

        let cors_origins = app_state.config.cors_allowed_origins.clone();

        App::new()
            .wrap(logger)
            .app_data(app_state.clone())
            .configure(|cfg| init_routes(cfg, &cors_origins))
    })
    .bind(bind)?
    .run()
    .await
}
