use crate::domain::model::{CompileReport, FailurePolicy, RuleSetFile};
use crate::domain::ports::RuleCompiler;
use crate::utils::error::{CompileFailure, ForgeError, Result};
use std::io::ErrorKind;
use std::path::Path;

pub const DEFAULT_INPUT_EXTENSION: &str = ".json";
pub const DEFAULT_OUTPUT_EXTENSION: &str = ".srs";

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub input_extension: String,
    pub output_extension: String,
    pub failure_policy: FailurePolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            input_extension: DEFAULT_INPUT_EXTENSION.to_string(),
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
            failure_policy: FailurePolicy::Abort,
        }
    }
}

/// Compiles every matching file of one directory, one external process at a time.
pub struct BatchCompiler<C: RuleCompiler> {
    compiler: C,
    options: BatchOptions,
}

impl<C: RuleCompiler> BatchCompiler<C> {
    pub fn new(compiler: C, options: BatchOptions) -> Self {
        Self { compiler, options }
    }

    /// Matching files in `dir`, sorted by file name. A missing directory is empty.
    pub async fn discover(&self, dir: &Path) -> Result<Vec<RuleSetFile>> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Directory {} does not exist", dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            // follows symlinks, as the shell glob did
            let is_file = match tokio::fs::metadata(&path).await {
                Ok(metadata) => metadata.is_file(),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    false
                }
            };
            if !is_file {
                continue;
            }

            match RuleSetFile::from_input(
                &path,
                &self.options.input_extension,
                &self.options.output_extension,
            ) {
                Some(file) => files.push(file),
                None => tracing::trace!("Ignoring {}", path.display()),
            }
        }

        files.sort_by(|a, b| a.input.file_name().cmp(&b.input.file_name()));
        Ok(files)
    }

    pub async fn run(&self, dir: &Path) -> Result<CompileReport> {
        let files = self.discover(dir).await?;
        let mut report = CompileReport::default();

        if files.is_empty() {
            tracing::info!(
                "No {} files found in {}, nothing to compile",
                self.options.input_extension,
                dir.display()
            );
            return Ok(report);
        }

        tracing::info!("Compiling {} rule-set(s) in {}", files.len(), dir.display());

        let mut failures = Vec::new();
        for file in files {
            tracing::info!("Compiling {}", file.input.display());

            match self.compiler.compile(&file.input, &file.output).await {
                Ok(()) => report.compiled.push(file),
                Err(e) => {
                    tracing::error!("❌ Failed to compile {}: {}", file.input.display(), e);
                    match self.options.failure_policy {
                        FailurePolicy::Abort => {
                            return Err(ForgeError::CompileFailed {
                                path: file.input,
                                reason: e.to_string(),
                            });
                        }
                        FailurePolicy::Collect => failures.push(CompileFailure {
                            path: file.input,
                            reason: e.to_string(),
                        }),
                    }
                }
            }
        }

        if !failures.is_empty() {
            return Err(ForgeError::BatchFailed {
                compiled: report.compiled.len(),
                failures,
            });
        }

        tracing::info!("✅ Compiled {} rule-set(s)", report.compiled.len());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Writes the input name into the output; fails for names listed in `failing`.
    #[derive(Clone, Default)]
    struct MockCompiler {
        failing: Vec<String>,
        calls: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl MockCompiler {
        fn failing_on(names: &[&str]) -> Self {
            Self {
                failing: names.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<PathBuf> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl RuleCompiler for MockCompiler {
        async fn compile(&self, input: &Path, output: &Path) -> Result<()> {
            self.calls.lock().unwrap().push(input.to_path_buf());
            let name = input.file_name().unwrap().to_string_lossy().to_string();
            if self.failing.contains(&name) {
                return Err(ForgeError::ProcessError {
                    program: "mock".to_string(),
                    message: "exit status: 1".to_string(),
                });
            }
            std::fs::write(output, name)?;
            Ok(())
        }
    }

    fn stage(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), r#"{"version":1,"rules":[]}"#).unwrap();
        }
    }

    #[tokio::test]
    async fn test_empty_directory_compiles_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let compiler = MockCompiler::default();
        let batch = BatchCompiler::new(compiler.clone(), BatchOptions::default());

        let report = batch.run(temp_dir.path()).await.unwrap();

        assert!(report.is_empty());
        assert!(compiler.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_directory_is_treated_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let batch = BatchCompiler::new(MockCompiler::default(), BatchOptions::default());

        let report = batch.run(&temp_dir.path().join("sing-box")).await.unwrap();
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_discover_filters_and_sorts() {
        let temp_dir = TempDir::new().unwrap();
        stage(temp_dir.path(), &["gfw.json", "apple.json", "notes.txt", ".hidden.json"]);
        std::fs::create_dir(temp_dir.path().join("nested.json")).unwrap();

        let batch = BatchCompiler::new(MockCompiler::default(), BatchOptions::default());
        let files = batch.discover(temp_dir.path()).await.unwrap();

        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["apple", "gfw"]);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_non_utf8_file_name_is_compiled() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(OsStr::from_bytes(b"r\xe9gles.json")), "{}").unwrap();

        let batch = BatchCompiler::new(MockCompiler::default(), BatchOptions::default());
        let report = batch.run(temp_dir.path()).await.unwrap();

        assert_eq!(report.compiled.len(), 1);
        assert!(temp_dir.path().join(OsStr::from_bytes(b"r\xe9gles.srs")).exists());
    }

    #[tokio::test]
    async fn test_every_input_gets_a_sibling_output() {
        let temp_dir = TempDir::new().unwrap();
        stage(temp_dir.path(), &["a.json", "b.json"]);

        let batch = BatchCompiler::new(MockCompiler::default(), BatchOptions::default());
        let report = batch.run(temp_dir.path()).await.unwrap();

        assert_eq!(report.compiled.len(), 2);
        assert!(temp_dir.path().join("a.srs").exists());
        assert!(temp_dir.path().join("b.srs").exists());
    }

    #[tokio::test]
    async fn test_abort_stops_at_first_failure() {
        let temp_dir = TempDir::new().unwrap();
        stage(temp_dir.path(), &["a.json", "bad.json", "c.json"]);

        let compiler = MockCompiler::failing_on(&["bad.json"]);
        let batch = BatchCompiler::new(compiler.clone(), BatchOptions::default());
        let err = batch.run(temp_dir.path()).await.unwrap_err();

        match err {
            ForgeError::CompileFailed { path, .. } => {
                assert_eq!(path, temp_dir.path().join("bad.json"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(temp_dir.path().join("a.srs").exists());
        assert!(!temp_dir.path().join("bad.srs").exists());
        assert!(!temp_dir.path().join("c.srs").exists());
        assert_eq!(compiler.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_collect_attempts_every_file() {
        let temp_dir = TempDir::new().unwrap();
        stage(temp_dir.path(), &["a.json", "bad.json", "c.json", "worse.json"]);

        let options = BatchOptions {
            failure_policy: FailurePolicy::Collect,
            ..Default::default()
        };
        let compiler = MockCompiler::failing_on(&["bad.json", "worse.json"]);
        let batch = BatchCompiler::new(compiler.clone(), options);
        let err = batch.run(temp_dir.path()).await.unwrap_err();

        match err {
            ForgeError::BatchFailed { compiled, failures } => {
                assert_eq!(compiled, 2);
                let failed: Vec<PathBuf> = failures.into_iter().map(|f| f.path).collect();
                assert_eq!(
                    failed,
                    vec![temp_dir.path().join("bad.json"), temp_dir.path().join("worse.json")]
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(temp_dir.path().join("c.srs").exists());
        assert_eq!(compiler.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_custom_extensions() {
        let temp_dir = TempDir::new().unwrap();
        stage(temp_dir.path(), &["a.rules.json", "b.json"]);

        let options = BatchOptions {
            input_extension: ".rules.json".to_string(),
            output_extension: ".bin".to_string(),
            ..Default::default()
        };
        let batch = BatchCompiler::new(MockCompiler::default(), options);
        let report = batch.run(temp_dir.path()).await.unwrap();

        assert_eq!(report.compiled.len(), 1);
        assert!(temp_dir.path().join("a.bin").exists());
    }

    #[tokio::test]
    async fn test_rerun_regenerates_identical_outputs() {
        let temp_dir = TempDir::new().unwrap();
        stage(temp_dir.path(), &["a.json"]);
        let batch = BatchCompiler::new(MockCompiler::default(), BatchOptions::default());

        batch.run(temp_dir.path()).await.unwrap();
        let first = std::fs::read(temp_dir.path().join("a.srs")).unwrap();
        batch.run(temp_dir.path()).await.unwrap();
        let second = std::fs::read(temp_dir.path().join("a.srs")).unwrap();

        assert_eq!(first, second);
    }
}
