use crate::domain::ports::RuleSource;
use crate::utils::error::Result;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Downloads rule payloads over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpRuleSource {
    client: Client,
}

impl HttpRuleSource {
    pub fn new(timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("ruleset-forge/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl RuleSource for HttpRuleSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        tracing::debug!("Response status for {}: {}", url, response.status());
        Ok(response.text().await?)
    }
}
