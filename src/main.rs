use marketproxy::{
    arguments::{patterns, print_debug_info, print_help},
    core::config::ProxyConfig,
    logger::{self, LogTag},
    service::MarketService,
    upstream::BitgetClient,
    webserver::{self, state::AppState},
};
use std::sync::Arc;

/// Main entry point for the market-data proxy
///
/// Starts the upstream client, the market service with its background
/// refresh/sweep tasks, and the webserver. Ctrl-C triggers a graceful
/// shutdown.
#[tokio::main]
async fn main() {
    logger::init();

    // Check for help request first
    if patterns::is_help_requested() {
        print_help();
        std::process::exit(0);
    }

    logger::info(LogTag::System, "🚀 Market proxy starting up...");
    print_debug_info();

    let config = ProxyConfig::load();

    let source = match BitgetClient::new(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            logger::error(
                LogTag::System,
                &format!("❌ Failed to create upstream client: {}", e),
            );
            std::process::exit(1);
        }
    };

    let service = Arc::new(MarketService::new(config.clone(), source));
    let background_tasks = service.spawn_background_tasks();

    // Ctrl-C triggers graceful webserver shutdown
    if let Err(e) = ctrlc::set_handler(webserver::shutdown) {
        logger::warning(
            LogTag::System,
            &format!("Failed to install Ctrl-C handler: {}", e),
        );
    }

    let state = Arc::new(AppState::new(config, service));
    if let Err(e) = webserver::start_server(state).await {
        logger::error(LogTag::System, &format!("❌ {}", e));
        std::process::exit(1);
    }

    for task in background_tasks {
        task.abort();
    }
    logger::info(LogTag::System, "👋 Shutdown complete");
}
