use crate::domain::ports::RuleCompiler;
use crate::utils::error::{ForgeError, Result};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;

pub const DEFAULT_COMPILER: &str = "sing-box";
pub const DEFAULT_COMPILER_ARGS: [&str; 2] = ["rule-set", "compile"];

/// Runs `program args...` to completion and captures its output.
pub async fn run_command<I, S>(program: &str, args: I, cwd: Option<&Path>) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args).kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    command
        .output()
        .await
        .map_err(|e| ForgeError::ProcessError {
            program: program.to_string(),
            message: e.to_string(),
        })
}

/// Exit status plus trimmed stderr, if any.
pub fn failure_reason(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    match stderr.trim() {
        "" => output.status.to_string(),
        text => format!("{}: {}", output.status, text),
    }
}

/// Compiles by shelling out to `<program> <args...> <input> --output <output>`.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: String,
    args: Vec<String>,
}

impl CommandCompiler {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for CommandCompiler {
    fn default() -> Self {
        Self::new(
            DEFAULT_COMPILER,
            DEFAULT_COMPILER_ARGS.iter().map(|s| s.to_string()).collect(),
        )
    }
}

#[async_trait::async_trait]
impl RuleCompiler for CommandCompiler {
    async fn compile(&self, input: &Path, output: &Path) -> Result<()> {
        let args = self
            .args
            .iter()
            .map(OsStr::new)
            .chain([input.as_os_str(), OsStr::new("--output"), output.as_os_str()]);

        let result = run_command(&self.program, args, None).await?;
        if !result.status.success() {
            return Err(ForgeError::ProcessError {
                program: self.program.clone(),
                message: failure_reason(&result),
            });
        }

        tracing::debug!("{} -> {}", input.display(), output.display());
        Ok(())
    }
}
