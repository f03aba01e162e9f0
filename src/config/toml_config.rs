use crate::adapters::http::DEFAULT_TIMEOUT_SECONDS;
use crate::adapters::process::{CommandCompiler, DEFAULT_COMPILER, DEFAULT_COMPILER_ARGS};
use crate::core::batch::{BatchOptions, DEFAULT_INPUT_EXTENSION, DEFAULT_OUTPUT_EXTENSION};
use crate::core::fetch::DEFAULT_CONCURRENT_REQUESTS;
use crate::core::publish::{GitPublisher, DEFAULT_COMMIT_MESSAGE, DEFAULT_GIT_PROGRAM};
use crate::domain::model::{FailurePolicy, RuleProvider};
use crate::utils::error::{ForgeError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForgeConfig {
    #[serde(default)]
    pub forge: ForgeSection,
    #[serde(default)]
    pub compile: CompileSection,
    #[serde(default)]
    pub git: GitSection,
    #[serde(rename = "rule-providers", default)]
    pub rule_providers: BTreeMap<String, RuleProvider>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgeSection {
    /// Every relative path below resolves against this directory.
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    pub concurrent_requests: Option<usize>,
    pub timeout_seconds: Option<u64>,
}

impl Default for ForgeSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            output_dir: default_output_dir(),
            concurrent_requests: None,
            timeout_seconds: None,
        }
    }
}

fn default_root() -> String {
    ".".to_string()
}

fn default_output_dir() -> String {
    "sing-box".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompileSection {
    pub program: Option<String>,
    pub args: Option<Vec<String>>,
    pub input_extension: Option<String>,
    pub output_extension: Option<String>,
    pub failure_policy: Option<FailurePolicy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitSection {
    #[serde(default)]
    pub enabled: bool,
    pub program: Option<String>,
    pub args: Option<Vec<String>>,
    pub message: Option<String>,
    pub push: Option<bool>,
}

impl ForgeConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ForgeError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ForgeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${RULES_CDN}); unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ForgeError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("forge.root", &self.forge.root)?;
        validation::validate_path("forge.output_dir", &self.forge.output_dir)?;
        validation::validate_range("forge.concurrent_requests", self.concurrent_requests(), 1, 64)?;
        validation::validate_range("forge.timeout_seconds", self.timeout_seconds(), 1, 3600)?;

        let options = self.batch_options();
        validation::validate_extension("compile.input_extension", &options.input_extension)?;
        validation::validate_extension("compile.output_extension", &options.output_extension)?;
        validation::validate_extension_pair(
            "compile.output_extension",
            &options.input_extension,
            &options.output_extension,
        )?;
        if let Some(program) = &self.compile.program {
            validation::validate_non_empty_string("compile.program", program)?;
        }

        for (name, provider) in &self.rule_providers {
            if let Some(url) = &provider.url {
                validation::validate_url(&format!("rule-providers.{}.url", name), url)?;
            }
            if let Some(path) = &provider.path {
                validation::validate_path(&format!("rule-providers.{}.path", name), path)?;
            }
        }

        if self.git.enabled {
            if let Some(program) = &self.git.program {
                validation::validate_non_empty_string("git.program", program)?;
            }
        }

        Ok(())
    }

    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(&self.forge.root)
    }

    pub fn output_dir_path(&self) -> PathBuf {
        self.root_path().join(&self.forge.output_dir)
    }

    pub fn concurrent_requests(&self) -> usize {
        self.forge
            .concurrent_requests
            .unwrap_or(DEFAULT_CONCURRENT_REQUESTS)
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.forge.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            input_extension: self
                .compile
                .input_extension
                .clone()
                .unwrap_or_else(|| DEFAULT_INPUT_EXTENSION.to_string()),
            output_extension: self
                .compile
                .output_extension
                .clone()
                .unwrap_or_else(|| DEFAULT_OUTPUT_EXTENSION.to_string()),
            failure_policy: self.compile.failure_policy.unwrap_or_default(),
        }
    }

    pub fn compiler(&self) -> CommandCompiler {
        let program = self
            .compile
            .program
            .clone()
            .unwrap_or_else(|| DEFAULT_COMPILER.to_string());
        let args = self
            .compile
            .args
            .clone()
            .unwrap_or_else(|| DEFAULT_COMPILER_ARGS.iter().map(|s| s.to_string()).collect());
        CommandCompiler::new(program, args)
    }

    /// `None` unless `[git] enabled = true`. Stages the output dir and every
    /// provider's raw payload.
    pub fn publisher(&self) -> Option<GitPublisher> {
        if !self.git.enabled {
            return None;
        }

        let raw_paths: BTreeSet<&String> = self
            .rule_providers
            .values()
            .filter_map(|provider| provider.path.as_ref())
            .collect();
        let mut paths = vec![self.forge.output_dir.clone()];
        paths.extend(raw_paths.into_iter().cloned());

        let publisher = GitPublisher::new(self.root_path(), paths)
        .with_program(
            self.git
                .program
                .clone()
                .unwrap_or_else(|| DEFAULT_GIT_PROGRAM.to_string()),
        )
        .with_args(self.git.args.clone().unwrap_or_default())
        .with_message(
            self.git
                .message
                .clone()
                .unwrap_or_else(|| DEFAULT_COMMIT_MESSAGE.to_string()),
        )
        .with_push(self.git.push.unwrap_or(false));

        Some(publisher)
    }
}

impl Validate for ForgeConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
