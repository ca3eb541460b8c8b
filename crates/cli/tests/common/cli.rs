//! CLI command execution helpers with automatic timing
//!
//! Wraps the `ai-helper` binary with an isolated `HOME` so the per-user config and
//! log directories land inside the test's temp dir.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

/// CLI command builder with timing
#[derive(Clone)]
pub struct HelperCommand {
    binary_path: PathBuf,
    working_dir: PathBuf,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl HelperCommand {
    /// Create a new command in `working_dir` with `HOME` pointed at `home`
    pub fn new(working_dir: impl AsRef<Path>, home: impl AsRef<Path>) -> Self {
        let mut env = HashMap::new();
        env.insert("HOME".to_string(), home.as_ref().display().to_string());
        env.insert("NO_COLOR".to_string(), "1".to_string());

        Self {
            binary_path: PathBuf::from(env!("CARGO_BIN_EXE_ai-helper")),
            working_dir: working_dir.as_ref().to_path_buf(),
            args: Vec::new(),
            env,
        }
    }

    /// Add command arguments
    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Set environment variable
    pub fn env(&mut self, key: &str, value: &str) -> &mut Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Execute command and return result with timing
    pub fn execute(&self) -> Result<CommandResult> {
        let start = Instant::now();

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .envs(&self.env)
            .output()
            .context("Failed to execute command")?;

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration: start.elapsed(),
        })
    }

    /// Execute on the blocking pool so stub servers on the runtime keep serving
    pub async fn execute_async(&self) -> Result<CommandResult> {
        let command = self.clone();
        tokio::task::spawn_blocking(move || command.execute())
            .await
            .context("Command task panicked")?
    }

    /// Execute and assert success
    pub async fn assert_success(&self) -> Result<CommandResult> {
        let result = self.execute_async().await?;

        if !result.success() {
            anyhow::bail!(
                "Command failed (exit code: {}):\nArgs: {:?}\nStdout: {}\nStderr: {}",
                result.exit_code,
                self.args,
                result.stdout,
                result.stderr
            );
        }

        Ok(result)
    }

    /// Execute and expect failure
    pub async fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute_async().await?;

        if result.success() {
            anyhow::bail!(
                "Command should have failed but succeeded:\nArgs: {:?}\nStdout: {}",
                self.args,
                result.stdout
            );
        }

        Ok(result)
    }
}

/// Command execution result with timing
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl CommandResult {
    /// Check if command succeeded
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Check if stdout contains text
    pub fn contains_stdout(&self, text: &str) -> bool {
        self.stdout.contains(text)
    }

    /// Check if stderr contains text
    pub fn contains_stderr(&self, text: &str) -> bool {
        self.stderr.contains(text)
    }
}

/// Macro for convenient command construction
///
/// Usage:
/// ```ignore
/// helper!(dir, home, "process", "app.py").assert_success().await?;
/// ```
#[macro_export]
macro_rules! helper {
    ($dir:expr, $home:expr, $($arg:expr),*) => {{
        let mut cmd = $crate::common::cli::HelperCommand::new($dir, $home);
        cmd.args(&[$($arg),*]);
        cmd
    }};
}
