use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Download failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("External command '{program}' failed: {message}")]
    ProcessError { program: String, message: String },

    #[error("Failed to compile {}: {reason}", .path.display())]
    CompileFailed { path: PathBuf, reason: String },

    #[error(
        "{} rule-set(s) failed to compile ({compiled} succeeded): {}",
        .failures.len(),
        describe_failures(.failures)
    )]
    BatchFailed {
        compiled: usize,
        failures: Vec<CompileFailure>,
    },

    #[error("Publish failed: {message}")]
    PublishError { message: String },
}

/// One failed input in a batch run.
#[derive(Debug, Clone)]
pub struct CompileFailure {
    pub path: PathBuf,
    pub reason: String,
}

fn failed_paths(failures: &[CompileFailure]) -> String {
    failures
        .iter()
        .map(|f| f.path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_failures(failures: &[CompileFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.path.display(), f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Filesystem,
    Configuration,
    Compilation,
    Publish,
}

impl ForgeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ForgeError::HttpError(_) => ErrorCategory::Network,
            ForgeError::IoError(_) | ForgeError::SerializationError(_) => {
                ErrorCategory::Filesystem
            }
            ForgeError::ConfigError { .. }
            | ForgeError::ConfigValidationError { .. }
            | ForgeError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            ForgeError::ProcessError { .. }
            | ForgeError::CompileFailed { .. }
            | ForgeError::BatchFailed { .. } => ErrorCategory::Compilation,
            ForgeError::PublishError { .. } => ErrorCategory::Publish,
        }
    }

    /// 程序退出碼
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Compilation => 1,
            ErrorCategory::Configuration => 2,
            ErrorCategory::Network | ErrorCategory::Filesystem | ErrorCategory::Publish => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ForgeError::CompileFailed { path, .. } => {
                format!("Compilation aborted at {}", path.display())
            }
            ForgeError::BatchFailed { failures, .. } => {
                format!("Could not compile: {}", failed_paths(failures))
            }
            ForgeError::HttpError(e) => match e.url() {
                Some(url) => format!("Could not download {}", url),
                None => "A download failed".to_string(),
            },
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check network access and the provider URLs",
            ErrorCategory::Filesystem => "Check that the working directories exist and are writable",
            ErrorCategory::Configuration => "Fix the configuration file or command-line flags",
            ErrorCategory::Compilation => {
                "Make sure the compiler is installed and the JSON rule-set is valid"
            }
            ErrorCategory::Publish => "Check the git repository state and credentials",
        }
    }
}

pub type Result<T> = std::result::Result<T, ForgeError>;
