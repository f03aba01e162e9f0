use crate::adapters::process::CommandCompiler;
use crate::core::batch::BatchOptions;
use crate::domain::model::FailurePolicy;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "ruleset-forge")]
#[command(about = "Compile staged sing-box JSON rule-sets into binary .srs rule-sets")]
pub struct CliConfig {
    /// Directory holding the JSON rule-sets
    #[arg(long, default_value = "sing-box")]
    pub dir: String,

    #[arg(long, default_value = ".json")]
    pub input_extension: String,

    #[arg(long, default_value = ".srs")]
    pub output_extension: String,

    /// Compiler executable, looked up on PATH unless given as a path
    #[arg(long, default_value = "sing-box")]
    pub compiler: String,

    /// Arguments placed before `<input> --output <output>` (repeatable)
    #[arg(
        long = "compiler-arg",
        allow_hyphen_values = true,
        default_values = ["rule-set", "compile"]
    )]
    pub compiler_args: Vec<String>,

    /// Compile every file and report all failures instead of stopping at the first
    #[arg(long)]
    pub collect_errors: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    pub fn dir_path(&self) -> PathBuf {
        PathBuf::from(&self.dir)
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            input_extension: self.input_extension.clone(),
            output_extension: self.output_extension.clone(),
            failure_policy: if self.collect_errors {
                FailurePolicy::Collect
            } else {
                FailurePolicy::Abort
            },
        }
    }

    pub fn compiler(&self) -> CommandCompiler {
        CommandCompiler::new(self.compiler.clone(), self.compiler_args.clone())
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("dir", &self.dir)?;
        validation::validate_extension("input_extension", &self.input_extension)?;
        validation::validate_extension("output_extension", &self.output_extension)?;
        validation::validate_extension_pair(
            "output_extension",
            &self.input_extension,
            &self.output_extension,
        )?;
        validation::validate_non_empty_string("compiler", &self.compiler)?;
        Ok(())
    }
}
