use crate::adapters::{HttpRuleSource, LocalStorage};
use crate::config::ForgeConfig;
use crate::core::batch::BatchCompiler;
use crate::core::fetch::RuleFetcher;
use crate::domain::model::RunSummary;
use crate::domain::ports::RuleCompiler;
use crate::utils::error::Result;

/// Runs fetch, compile, then publish, as configured.
pub struct ForgeEngine<C: RuleCompiler> {
    config: ForgeConfig,
    compiler: C,
    skip_fetch: bool,
}

impl ForgeEngine<crate::adapters::CommandCompiler> {
    pub fn from_config(config: ForgeConfig) -> Self {
        let compiler = config.compiler();
        Self::new(config, compiler)
    }
}

impl<C: RuleCompiler> ForgeEngine<C> {
    pub fn new(config: ForgeConfig, compiler: C) -> Self {
        Self {
            config,
            compiler,
            skip_fetch: false,
        }
    }

    pub fn skip_fetch(mut self, skip: bool) -> Self {
        self.skip_fetch = skip;
        self
    }

    pub async fn run(self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        if self.skip_fetch {
            tracing::info!("⏭️ Skipping fetch stage");
        } else {
            tracing::info!(
                "📡 Fetching {} rule provider(s)...",
                self.config.rule_providers.len()
            );
            let fetcher = RuleFetcher::new(
                LocalStorage::new(self.config.root_path()),
                HttpRuleSource::new(self.config.timeout_seconds())?,
                self.config.forge.output_dir.clone(),
            )
            .with_concurrency(self.config.concurrent_requests());
            summary.fetch = Some(fetcher.fetch_all(&self.config.rule_providers).await);
        }

        tracing::info!("⚙️ Compiling rule-sets...");
        let output_dir = self.config.output_dir_path();
        let batch = BatchCompiler::new(self.compiler, self.config.batch_options());
        summary.compile = batch.run(&output_dir).await?;

        if let Some(publisher) = self.config.publisher() {
            tracing::info!("📦 Publishing rule-sets...");
            summary.publish = Some(publisher.publish().await?);
        }

        Ok(summary)
    }
}
