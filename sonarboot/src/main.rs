use clap::Parser;
use log::error;

use sonarboot::{Args, ProvisionConfig, execute_provisioning};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(if args.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let config = match ProvisionConfig::from_env() {
        Ok(config) => config.with_args(&args),
        Err(e) => {
            error!("❌ Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(code) = execute_provisioning(&config).await {
        std::process::exit(code);
    }
}
