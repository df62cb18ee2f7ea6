use clap::Parser;
use ldap_fixture::utils::error::ErrorSeverity;
use ldap_fixture::utils::{logger, validation::Validate};
use ldap_fixture::{memory_fixture, CliConfig, FixtureError};

fn exit_code(e: &FixtureError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn report(stage: &str, e: &FixtureError) {
    tracing::error!(
        "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
        stage,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    // 載入並驗證設定
    let settings = match cli.to_settings().and_then(|s| s.validate().map(|_| s)) {
        Ok(settings) => settings,
        Err(e) => {
            report("Configuration", &e);
            std::process::exit(1);
        }
    };
    if cli.verbose {
        tracing::debug!("Fixture settings: {:?}", settings);
    }

    let mut fixture = memory_fixture(&settings)?.with_status_line(!cli.json);

    let port = match fixture.start() {
        Ok(port) => port,
        Err(e) => {
            report("Start", &e);
            std::process::exit(exit_code(&e));
        }
    };

    if cli.json {
        let status = serde_json::json!({
            "port": port,
            "port_key": settings.port_key(),
            "working_directory": settings.server.working_directory,
            "entries": fixture.imported_entries(),
        });
        println!("{}", status);
    }

    if !cli.exit_after_start {
        tracing::info!("Press Ctrl-C to stop the directory service");
        tokio::signal::ctrl_c().await?;
    }

    if let Err(e) = fixture.stop() {
        report("Stop", &e);
        let code = exit_code(&e);
        if code > 0 {
            std::process::exit(code);
        }
    }

    Ok(())
}
