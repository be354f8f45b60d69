use clap::Parser;
use energy_forecast::utils::error::ErrorSeverity;
use energy_forecast::utils::logger;
use energy_forecast::utils::monitor::SystemMonitor;
use energy_forecast::utils::validation::Validate;
use energy_forecast::{ApiCli, ApiServer, AppError};

fn fail(stage: &str, e: &AppError) -> ! {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        stage,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() {
    let cli = ApiCli::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::info!("Starting energy-forecast-api");

    let settings = match cli.load_settings() {
        Ok(settings) => settings,
        Err(e) => fail("Failed to load settings", &e),
    };
    if cli.verbose {
        tracing::debug!("Settings: {:?}", settings);
    }

    // 驗證配置
    if let Err(e) = settings.validate() {
        fail("Configuration validation failed", &e);
    }
    if let Err(e) = settings.ensure_directories() {
        fail("Cannot prepare data directories", &e);
    }

    let monitor = SystemMonitor::new(cli.monitor);
    if monitor.is_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    let server = match ApiServer::bind(settings, monitor).await {
        Ok(server) => server,
        Err(e) => fail("Failed to start API", &e),
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("⚠️ Could not listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("🛑 Shutdown requested");
    };

    if let Err(e) = server.serve(shutdown).await {
        fail("API stopped with an error", &e);
    }
}
