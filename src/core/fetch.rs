use crate::core::convert::{convert_payload, render};
use crate::domain::model::{Behavior, FetchOutcome, FetchReport, HeadlessRule, RuleProvider};
use crate::domain::ports::{RuleSource, Storage};
use crate::utils::error::Result;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;

pub const DEFAULT_CONCURRENT_REQUESTS: usize = 5;

/// Downloads every provider, keeps the raw payload and stages the converted JSON.
pub struct RuleFetcher<S: Storage, R: RuleSource> {
    storage: S,
    source: R,
    output_dir: String,
    concurrent_requests: usize,
}

impl<S: Storage, R: RuleSource> RuleFetcher<S, R> {
    pub fn new(storage: S, source: R, output_dir: impl Into<String>) -> Self {
        Self {
            storage,
            source,
            output_dir: output_dir.into(),
            concurrent_requests: DEFAULT_CONCURRENT_REQUESTS,
        }
    }

    pub fn with_concurrency(mut self, concurrent_requests: usize) -> Self {
        self.concurrent_requests = concurrent_requests.max(1);
        self
    }

    /// One provider failing never stops the others. Outcomes are in provider-name order.
    pub async fn fetch_all(&self, providers: &BTreeMap<String, RuleProvider>) -> FetchReport {
        let providers = stream::iter(providers.iter())
            .map(|(name, provider)| async move {
                let outcome = self.process_provider(name, provider).await;
                (name.clone(), outcome)
            })
            .buffered(self.concurrent_requests)
            .collect::<Vec<_>>()
            .await;

        let report = FetchReport { providers };
        tracing::info!(
            "All rule providers processed: {} converted, {} skipped, {} failed",
            report.converted(),
            report.skipped(),
            report.failed()
        );
        report
    }

    async fn process_provider(&self, name: &str, provider: &RuleProvider) -> FetchOutcome {
        let (url, behavior, path) = match (&provider.url, provider.behavior, &provider.path) {
            (Some(url), Some(behavior), Some(path)) => (url.as_str(), behavior, path.as_str()),
            _ => {
                tracing::warn!("Skipping '{}': missing url, behavior, or path", name);
                return FetchOutcome::Skipped {
                    reason: "missing url, behavior, or path".to_string(),
                };
            }
        };

        tracing::info!("Processing '{}'...", name);
        match self.download_and_convert(name, url, behavior, path).await {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::warn!("⚠️ Rule provider '{}' failed: {}", name, error);
                FetchOutcome::Failed { error }
            }
        }
    }

    async fn download_and_convert(
        &self,
        name: &str,
        url: &str,
        behavior: Behavior,
        path: &str,
    ) -> Result<FetchOutcome> {
        let content = self.source.fetch(url).await?;

        let raw_path = self.storage.write_file(path, content.as_bytes()).await?;
        tracing::debug!("Downloaded '{}' to {}", name, raw_path.display());

        let rule_set = convert_payload(&content, behavior);
        if rule_set.rules.iter().all(HeadlessRule::is_empty) {
            tracing::warn!("⚠️ '{}' yielded no {} rules", name, behavior);
        }
        let rules = rule_set.rule_count();
        let json = render(&rule_set)?;

        let json_path = self
            .storage
            .write_file(&format!("{}/{}.json", self.output_dir, name), json.as_bytes())
            .await?;
        tracing::info!("Generated {} ({} {} rules)", json_path.display(), rules, behavior);

        Ok(FetchOutcome::Converted {
            raw_path,
            json_path,
            rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ForgeError;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn get_file(&self, path: &str) -> Option<String> {
            let files = self.files.lock().await;
            files
                .get(path)
                .map(|data| String::from_utf8_lossy(data).to_string())
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<PathBuf> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(PathBuf::from(path))
        }
    }

    struct MockSource {
        payloads: HashMap<String, String>,
    }

    #[async_trait::async_trait]
    impl RuleSource for MockSource {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.payloads
                .get(url)
                .cloned()
                .ok_or_else(|| ForgeError::ConfigError {
                    message: format!("no payload for {}", url),
                })
        }
    }

    fn provider(behavior: Option<Behavior>, url: Option<&str>, path: Option<&str>) -> RuleProvider {
        RuleProvider {
            provider_type: "http".to_string(),
            behavior,
            url: url.map(str::to_string),
            path: path.map(str::to_string),
            interval: Some(86400),
        }
    }

    #[tokio::test]
    async fn test_fetch_all_reports_each_provider() {
        let storage = MockStorage::default();
        let source = MockSource {
            payloads: HashMap::from([
                ("mem://gfw".to_string(), "payload:\n  - '+.google.com'\n".to_string()),
                ("mem://lan".to_string(), "payload:\n  - '10.0.0.0/8'\n".to_string()),
            ]),
        };

        let providers = BTreeMap::from([
            (
                "gfw".to_string(),
                provider(Some(Behavior::Domain), Some("mem://gfw"), Some("./rule-set/gfw.yaml")),
            ),
            (
                "lancidr".to_string(),
                provider(Some(Behavior::Ipcidr), Some("mem://lan"), Some("./rule-set/lancidr.yaml")),
            ),
            (
                "broken".to_string(),
                provider(Some(Behavior::Domain), Some("mem://404"), Some("./rule-set/broken.yaml")),
            ),
            ("incomplete".to_string(), provider(None, Some("mem://gfw"), None)),
        ]);

        let fetcher = RuleFetcher::new(storage.clone(), source, "sing-box").with_concurrency(2);
        let report = fetcher.fetch_all(&providers).await;

        assert_eq!(report.converted(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);

        let names: Vec<&str> = report.providers.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["broken", "gfw", "incomplete", "lancidr"]);

        match report.outcome("gfw") {
            Some(FetchOutcome::Converted { rules, .. }) => assert_eq!(*rules, 2),
            other => panic!("unexpected outcome: {:?}", other),
        }

        let raw = storage.get_file("./rule-set/gfw.yaml").await.unwrap();
        assert!(raw.contains("+.google.com"));

        let json = storage.get_file("sing-box/lancidr.json").await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["version"], 1);
        assert_eq!(parsed["rules"][0]["ip_cidr"][0], "10.0.0.0/8");

        assert!(storage.get_file("sing-box/broken.json").await.is_none());
    }

    #[tokio::test]
    async fn test_no_providers_is_a_noop() {
        let fetcher = RuleFetcher::new(
            MockStorage::default(),
            MockSource {
                payloads: HashMap::new(),
            },
            "sing-box",
        );
        let report = fetcher.fetch_all(&BTreeMap::new()).await;
        assert!(report.providers.is_empty());
    }
}
