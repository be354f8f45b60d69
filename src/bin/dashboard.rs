use clap::Parser;
use energy_forecast::utils::logger;
use energy_forecast::utils::validation::Validate;
use energy_forecast::{ApiClient, Dashboard, DashboardCli};
use std::time::Duration;
use tokio::io::BufReader;

#[tokio::main]
async fn main() {
    let cli = DashboardCli::parse();
    logger::init_dashboard_logger(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    let settings = match cli.load_settings().and_then(|s| s.validate().map(|_| s)) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let client = match ApiClient::new(
        &settings.dashboard.api_base,
        Duration::from_secs(settings.dashboard.timeout_seconds),
    ) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let mut dashboard = Dashboard::new(client, settings, std::io::stdout());
    if let Err(e) = dashboard.run(BufReader::new(tokio::io::stdin())).await {
        tracing::error!("❌ Dashboard terminated: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }
}
