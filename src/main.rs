#[macro_use]
extern crate log;

mod config;
mod database;
mod entity;
mod error;
mod feedback;
mod server;
mod views;

use crate::{config::Config, feedback::FeedbackService};

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let db = match database::connect(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            error!("failed to initialize database: {:#}", e);
            std::process::exit(1);
        }
    };
    info!("database ready");

    if let Err(err) = server::serve(config.bind_address, FeedbackService::new(db)).await {
        error!("failed to serve: {:#}", err);
        std::process::exit(1);
    }
}
