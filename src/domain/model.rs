use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Source format version written into every converted rule-set.
pub const RULE_SET_VERSION: u32 = 1;

/// A staged JSON rule-set and the binary file compiled from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSetFile {
    pub name: String,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl RuleSetFile {
    /// Matches `file_name` against `input_extension` and swaps the suffix for
    /// `output_extension`. Hidden files and a bare extension never match.
    /// Names need not be UTF-8.
    pub fn from_input(
        path: &Path,
        input_extension: &str,
        output_extension: &str,
    ) -> Option<Self> {
        let file_name = path.file_name()?;
        if file_name.as_encoded_bytes().starts_with(b".") {
            return None;
        }

        let stem = strip_suffix(file_name, input_extension)?;
        if stem.is_empty() {
            return None;
        }

        let mut output_name = stem.to_os_string();
        output_name.push(output_extension);

        Some(Self {
            name: stem.to_string_lossy().into_owned(),
            input: path.to_path_buf(),
            output: path.with_file_name(output_name),
        })
    }
}

#[cfg(unix)]
fn strip_suffix<'a>(name: &'a OsStr, suffix: &str) -> Option<&'a OsStr> {
    use std::os::unix::ffi::OsStrExt;
    name.as_bytes()
        .strip_suffix(suffix.as_bytes())
        .map(OsStr::from_bytes)
}

#[cfg(not(unix))]
fn strip_suffix<'a>(name: &'a OsStr, suffix: &str) -> Option<&'a OsStr> {
    name.to_str()?.strip_suffix(suffix).map(OsStr::new)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    Domain,
    Ipcidr,
    Classical,
}

impl std::fmt::Display for Behavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Behavior::Domain => "domain",
            Behavior::Ipcidr => "ipcidr",
            Behavior::Classical => "classical",
        };
        f.write_str(name)
    }
}

/// A Clash `rule-providers` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleProvider {
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,
    pub behavior: Option<Behavior>,
    pub url: Option<String>,
    pub path: Option<String>,
    pub interval: Option<u64>,
}

fn default_provider_type() -> String {
    "http".to_string()
}

/// The single headless rule emitted per converted provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlessRule {
    pub domain: Vec<String>,
    pub domain_suffix: Vec<String>,
    pub ip_cidr: Vec<String>,
    pub process_name: Vec<String>,
}

impl HeadlessRule {
    pub fn len(&self) -> usize {
        self.domain.len() + self.domain_suffix.len() + self.ip_cidr.len() + self.process_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// sing-box source rule-set, the compiler's input format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingBoxRuleSet {
    pub version: u32,
    pub rules: Vec<HeadlessRule>,
}

impl SingBoxRuleSet {
    pub fn new(rule: HeadlessRule) -> Self {
        Self {
            version: RULE_SET_VERSION,
            rules: vec![rule],
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.iter().map(HeadlessRule::len).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failing file; later files stay uncompiled.
    #[default]
    Abort,
    /// Attempt every file, then fail listing all failures.
    Collect,
}

#[derive(Debug, Clone, Default)]
pub struct CompileReport {
    pub compiled: Vec<RuleSetFile>,
}

impl CompileReport {
    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

#[derive(Debug)]
pub enum FetchOutcome {
    Converted {
        raw_path: PathBuf,
        json_path: PathBuf,
        rules: usize,
    },
    Skipped {
        reason: String,
    },
    Failed {
        error: crate::utils::error::ForgeError,
    },
}

#[derive(Debug, Default)]
pub struct FetchReport {
    pub providers: Vec<(String, FetchOutcome)>,
}

impl FetchReport {
    pub fn converted(&self) -> usize {
        self.count(|o| matches!(o, FetchOutcome::Converted { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FetchOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FetchOutcome::Failed { .. }))
    }

    pub fn outcome(&self, name: &str) -> Option<&FetchOutcome> {
        self.providers
            .iter()
            .find(|(provider, _)| provider == name)
            .map(|(_, outcome)| outcome)
    }

    fn count(&self, pred: impl Fn(&FetchOutcome) -> bool) -> usize {
        self.providers.iter().filter(|(_, o)| pred(o)).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Committed { pushed: bool },
    NothingToCommit,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub fetch: Option<FetchReport>,
    pub compile: CompileReport,
    pub publish: Option<PublishOutcome>,
}
