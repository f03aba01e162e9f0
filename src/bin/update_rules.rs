use clap::Parser;
use ruleset_forge::domain::model::{FetchOutcome, PublishOutcome, RunSummary};
use ruleset_forge::utils::{logger, validation::Validate};
use ruleset_forge::{ForgeConfig, ForgeEngine};

#[derive(Parser)]
#[command(name = "update-rules")]
#[command(about = "Download Clash rule providers, convert them and compile sing-box rule-sets")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "forge.toml")]
    config: String,

    /// Compile what is already staged without downloading
    #[arg(long)]
    skip_fetch: bool,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting rule-set update");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = match ForgeConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(2);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    if args.dry_run {
        perform_dry_run(&config, &args);
        return;
    }

    let engine = ForgeEngine::from_config(config).skip_fetch(args.skip_fetch);
    match engine.run().await {
        Ok(summary) => display_summary(&summary),
        Err(e) => {
            tracing::error!(
                "❌ Rule-set update failed: {} (Category: {:?})",
                e,
                e.category()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}

fn display_summary(summary: &RunSummary) {
    if let Some(fetch) = &summary.fetch {
        println!(
            "📡 Providers: {} converted, {} skipped, {} failed",
            fetch.converted(),
            fetch.skipped(),
            fetch.failed()
        );
        for (name, outcome) in &fetch.providers {
            match outcome {
                FetchOutcome::Converted { json_path, rules, .. } => {
                    println!("  ✅ {} -> {} ({} rules)", name, json_path.display(), rules)
                }
                FetchOutcome::Skipped { reason } => println!("  ⏭️ {}: {}", name, reason),
                FetchOutcome::Failed { error } => println!("  ⚠️ {}: {}", name, error),
            }
        }
    }

    println!("⚙️ Compiled {} rule-set(s)", summary.compile.compiled.len());

    match summary.publish {
        Some(PublishOutcome::Committed { pushed: true }) => println!("📝 Committed and pushed"),
        Some(PublishOutcome::Committed { pushed: false }) => println!("📝 Committed"),
        Some(PublishOutcome::NothingToCommit) => println!("📝 Nothing to commit"),
        None => {}
    }
}

fn perform_dry_run(config: &ForgeConfig, args: &Args) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📡 Rule Providers:");
    if args.skip_fetch {
        println!("  Fetch stage skipped (--skip-fetch)");
    } else {
        for (name, provider) in &config.rule_providers {
            println!(
                "  {} [{}] {} -> {}",
                name,
                provider
                    .behavior
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| "?".to_string()),
                provider.url.as_deref().unwrap_or("<no url>"),
                provider.path.as_deref().unwrap_or("<no path>")
            );
        }
        println!("  Concurrent requests: {}", config.concurrent_requests());
    }

    let options = config.batch_options();
    println!();
    println!("⚙️ Compile:");
    println!("  Directory: {}", config.output_dir_path().display());
    println!(
        "  {} -> {} via `{}`",
        options.input_extension,
        options.output_extension,
        config.compiler().command_line()
    );
    println!("  Failure policy: {:?}", options.failure_policy);

    println!();
    println!("📦 Publish:");
    if config.git.enabled {
        println!(
            "  git commit in {} (push: {})",
            config.root_path().display(),
            config.git.push.unwrap_or(false)
        );
    } else {
        println!("  Disabled");
    }

    println!();
    println!("✅ Dry run analysis complete.");
}
