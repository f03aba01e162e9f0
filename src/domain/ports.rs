use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub trait Storage: Send + Sync {
    /// Writes `data` to `path`, creating parent directories. Returns the full path written.
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<PathBuf>> + Send;
}

/// Where raw rule-provider payloads come from.
#[async_trait]
pub trait RuleSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Turns one JSON rule-set into its binary sibling.
#[async_trait]
pub trait RuleCompiler: Send + Sync {
    async fn compile(&self, input: &Path, output: &Path) -> Result<()>;
}
