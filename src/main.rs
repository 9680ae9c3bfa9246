use anyhow::Context;
use clap::Parser;
use small_backoffice::adapters::{db, http};
use small_backoffice::core::Order;
use small_backoffice::domain::model::ImportMode;
use small_backoffice::utils::error::AppError;
use small_backoffice::utils::{logger, validation::Validate};
use small_backoffice::{
    AppConfig, CliConfig, Command, LogMailer, OrderManager, ReportImporter, SqlReportStore,
    UserService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting small-backoffice");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            AppConfig::from_file(path)
                .with_context(|| format!("failed to load config file '{}'", path))?
        }
        None => AppConfig::default(),
    };

    // 應用命令列覆蓋設定
    match &cli.command {
        Command::Import { skip_invalid: true, .. } => config.import.mode = ImportMode::Skip,
        Command::Serve { bind: Some(bind) } => config.server.bind = bind.clone(),
        _ => {}
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(cli.command, config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        std::process::exit(e.severity().exit_code());
    }

    Ok(())
}

async fn run(command: Command, config: AppConfig) -> Result<(), AppError> {
    let pool = db::connect(&config.database).await?;

    match command {
        Command::Import { file, .. } => {
            let importer = ReportImporter::new(SqlReportStore::new(pool), config.import);
            let summary = importer.process_report(&file).await?;

            println!(
                "✅ {}: {} rows read, {} inserted, {} already present, {} rejected",
                summary.source,
                summary.rows_read,
                summary.inserted,
                summary.duplicates,
                summary.rejected.len()
            );
            for rejected in &summary.rejected {
                println!("  line {}: {}", rejected.line, rejected.reason);
            }
        }
        Command::Order { path } => {
            let raw = tokio::fs::read_to_string(&path).await?;
            let order: Order = serde_json::from_str(&raw)?;

            let manager = OrderManager::new(
                pool,
                LogMailer::new(config.mail.from_address.clone()),
                config.mail,
            );
            let receipt = manager.process_order(&order).await?;

            println!(
                "✅ Order {} confirmed ({} line items, {} units, paid via {})",
                receipt.order_id, receipt.line_items, receipt.units, receipt.payment_method
            );
            if !receipt.confirmation_sent {
                println!("⚠️ Confirmation email was not sent");
            }
        }
        Command::Stock { sku, quantity } => {
            let manager = OrderManager::new(
                pool,
                LogMailer::new(config.mail.from_address.clone()),
                config.mail,
            );
            manager.set_stock(&sku, quantity).await?;
            println!("✅ Stock for {} set to {}", sku, quantity);
        }
        Command::Serve { .. } => {
            http::run_server(UserService::new(pool), &config.server.bind).await?;
        }
    }

    Ok(())
}
