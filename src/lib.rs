pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::ForgeConfig;

pub use adapters::{CommandCompiler, HttpRuleSource, LocalStorage};
pub use crate::core::{batch::BatchCompiler, fetch::RuleFetcher, forge::ForgeEngine, publish::GitPublisher};
pub use utils::error::{ForgeError, Result};
