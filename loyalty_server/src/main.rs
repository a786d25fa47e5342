use clap::Parser;
use dotenvy::dotenv;
use log::*;
use loyalty_server::{cli::CliOptions, config::ServerConfig, server::run_server};

#[actix_web::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let options = CliOptions::parse();
    let config = ServerConfig::from_cli_and_env(options);

    info!("🚀️ Starting server on {}", config.run_address);
    match run_server(config).await {
        Ok(_) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}
