use log::{error, info, LevelFilter};

mod app;
mod commands;
mod config;
mod deployment;
mod handlers;
mod responder;
mod server;
mod update;

use config::Config;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    pretty_env_logger::formatted_builder()
        .filter_level(LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();
    info!("Starting Nimble Roulette bot...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Configuration error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = deployment::run(config).await {
        error!("❌ Bot failed: {e}");
        std::process::exit(1);
    }
}
