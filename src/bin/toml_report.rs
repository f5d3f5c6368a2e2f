use anyhow::Context;
use clap::Parser;
use feedback_pulse::core::ConfigProvider;
use feedback_pulse::core::SourceSpec;
use feedback_pulse::domain::catalog::value_definition;
use feedback_pulse::utils::error::ErrorSeverity;
use feedback_pulse::utils::{logger, validation::Validate};
use feedback_pulse::{EtlEngine, LocalStorage, ReportPipeline, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-report")]
#[command(about = "Feedback report runner with TOML configuration support")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "feedback-report.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the user the report is generated for
    #[arg(long)]
    user_id: Option<String>,

    /// Override the document store directory from config
    #[arg(long)]
    store_path: Option<String>,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::from_file(&args.config).with_context(|| {
        format!(
            "Failed to load config file '{}'; make sure it exists and is valid TOML",
            args.config
        )
    })?;

    logger::init_logger(args.verbose || config.verbose(), config.json_logs());

    tracing::info!("🚀 Starting TOML-based feedback report");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Some(user_id) = &args.user_id {
        config.subject.user_id = user_id.clone();
        tracing::info!("🔧 User overridden to: {}", user_id);
    }
    if let Some(path) = &args.store_path {
        config.store = Some(feedback_pulse::config::toml_config::StoreConfig { path: path.clone() });
        tracing::info!("🔧 Store path overridden to: {}", path);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config);
        return Ok(());
    }

    let storage = LocalStorage::new(".".to_string());
    let pipeline = ReportPipeline::new(storage, config);
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Feedback report completed");
            println!("✅ Feedback report completed");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Feedback report failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn describe_source(source: &SourceSpec) -> String {
    match source {
        SourceSpec::File { path } => format!("file {}", path),
        SourceSpec::Api { endpoint, .. } => format!("api {}", endpoint),
    }
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Pipeline: {} v{}",
        config.pipeline.name, config.pipeline.version
    );
    println!("  Source: {}", describe_source(&config.source()));
    println!(
        "  Subject: user {} / survey {}",
        config.user_id(),
        config.survey_id()
    );
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.output_formats().join(", "));

    if let Some(store) = config.store_path() {
        println!("  Store: {}", store);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📡 Data Source Analysis:");
    match config.source() {
        SourceSpec::File { path } => println!("  File: {}", path),
        SourceSpec::Api {
            endpoint,
            headers,
            bearer_token,
            timeout_seconds,
        } => {
            println!("  Endpoint: {}", endpoint);
            println!("  Headers: {} custom headers", headers.len());
            println!(
                "  Auth: {}",
                if bearer_token.is_some() { "bearer token" } else { "none" }
            );
            println!("  Timeout: {}s", timeout_seconds);
        }
    }

    let settings = config.analysis();
    println!();
    println!("⚙️ Analysis Settings:");
    println!("  Positive threshold: {}", settings.positive_threshold);
    println!("  Minimum phrase length: {}", settings.min_phrase_length);
    println!("  Top phrases: {}", settings.top_n);
    println!("  Trend tolerance: {}", settings.trend_tolerance);

    println!();
    println!("🔄 Question Mapping:");
    for (question, value) in settings.question_map.questions() {
        println!("  {} -> {}", question, value);
        println!("      {}", value_definition(value).description);
    }

    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", config.output_path());
    println!("  Formats: {}", config.output_formats().join(", "));
    if let Some(archive) = config.archive_name() {
        println!("  Compression: {} (ZIP)", archive);
    }
    match config.store_path() {
        Some(store) => println!("  Store: {} (trends and persistence enabled)", store),
        None => println!("  Store: none (trends will be stable)"),
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
