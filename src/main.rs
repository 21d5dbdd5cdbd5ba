use std::sync::Arc;

use clap::Parser;
use sim_groups::utils::{logger, validation::Validate};
use sim_groups::{app, server, CliConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    logger::init_logger(config.logging.format, cli.verbose, config.logging.level.as_deref());

    tracing::info!("Starting sim-groups");
    if cli.verbose {
        tracing::debug!("CLI args: {:?}", cli);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let service = match app::build_service(&config) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            tracing::error!("❌ Startup failed: {} (Category: {:?})", e, e.category());
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let router = server::app(service, config.allowed_origins());
    if let Err(e) = server::listen(router, config.bind()).await {
        tracing::error!("failed to start sim-groups http server, {}", e);
        return Err(e);
    }

    Ok(())
}
