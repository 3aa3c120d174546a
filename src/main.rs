mod logger;
mod modules;
mod sensors_info;
mod shared;

use modules::api::start_api;
use sensors_info::SensorsInfo;
use shared::{config::Configs, db::open_dao};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    logger::start_log();

    let config_path = std::env::var("SENSORS_CONFIG").unwrap_or_else(|_| "sensors.toml".to_string());
    let configs = match Configs::load_from_file(&config_path) {
        Ok(c) => {
            log::info!("Configurations loaded from {}", c.config_path().display());
            c
        }
        Err(e) => {
            log::error!("Failed to load configurations from {}: {}", config_path, e);
            std::process::exit(1);
        }
    };

    let dao = match open_dao(&configs.store).await {
        Ok(dao) => dao,
        Err(e) => {
            log::error!("Failed to open {:?} store: {}", configs.store.kind, e);
            std::process::exit(1);
        }
    };
    let info = Arc::new(SensorsInfo::new(dao));

    if let Some(load_path) = &configs.store.load_path {
        if let Err(e) = info.load_file(load_path).await {
            log::error!("Failed to load {}: {}", load_path.display(), e);
            std::process::exit(1);
        }
    }

    let api = start_api(info.clone(), configs.server.clone());

    tokio::select! {
        res = api => {
            if let Err(e) = res {
                log::error!("API task failed: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("Shutting down...");
        }
    }

    if let Err(e) = info.close().await {
        log::error!("Failed to close store: {}", e);
    }
}
