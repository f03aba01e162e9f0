use clap::Parser;
use ruleset_forge::utils::{logger, validation::Validate};
use ruleset_forge::{BatchCompiler, CliConfig};

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }

    let compiler = config.compiler();
    tracing::debug!("Compiler: {}", compiler.command_line());
    let batch = BatchCompiler::new(compiler, config.batch_options());

    match batch.run(&config.dir_path()).await {
        Ok(report) if report.is_empty() => {
            println!(
                "No {} files found in '{}'. Nothing to compile.",
                config.input_extension, config.dir
            );
        }
        Ok(report) => {
            for file in &report.compiled {
                println!("✅ {} -> {}", file.input.display(), file.output.display());
            }
            println!("Compiled {} rule-set(s).", report.compiled.len());
        }
        Err(e) => {
            tracing::error!(
                "❌ Compilation failed: {} (Category: {:?})",
                e,
                e.category()
            );
            eprintln!("❌ {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}
