use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;

/// git exits with this status when `config --unset` finds no such key.
const CONFIG_KEY_MISSING: i32 = 5;

/// Thin wrapper around the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: OsString,
    leading_args: Vec<OsString>,
    workdir: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of removing an alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasRemoval {
    Removed,
    NotInstalled,
}

impl GitCli {
    pub fn new() -> Self {
        Self {
            program: OsString::from("git"),
            leading_args: Vec::new(),
            workdir: None,
            envs: Vec::new(),
        }
    }

    /// Run a different executable in place of `git`.
    pub fn with_program(mut self, program: impl AsRef<OsStr>) -> Self {
        self.program = program.as_ref().to_os_string();
        self
    }

    /// Arguments placed before every git subcommand.
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.leading_args = args
            .into_iter()
            .map(|a| a.as_ref().to_os_string())
            .collect();
        self
    }

    pub fn with_workdir(mut self, workdir: &Path) -> Self {
        self.workdir = Some(workdir.to_path_buf());
        self
    }

    pub fn with_env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    /// A command for `git` with output captured. The child is killed if the
    /// returned future is dropped before it exits.
    pub(crate) fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args);
        if let Some(ref dir) = self.workdir {
            cmd.current_dir(dir);
        }
        cmd.envs(self.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    pub async fn set_global_alias(&self, name: &str, value: &str) -> Result<()> {
        let output = self
            .command()
            .args(["config", "--global"])
            .arg(format!("alias.{name}"))
            .arg(value)
            .output()
            .await
            .context("Failed to run git config")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("git config failed: {}", stderr.trim());
        }
        Ok(())
    }

    pub async fn global_alias(&self, name: &str) -> Result<Option<String>> {
        let output = self
            .command()
            .args(["config", "--global", "--get"])
            .arg(format!("alias.{name}"))
            .output()
            .await
            .context("Failed to run git config --get")?;

        if output.status.success() {
            let value = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
            return Ok(Some(value));
        }
        // --get exits 1 when the key is absent
        if output.status.code() == Some(1) {
            return Ok(None);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git config --get failed: {}", stderr.trim())
    }

    pub async fn unset_global_alias(&self, name: &str) -> Result<AliasRemoval> {
        let output = self
            .command()
            .args(["config", "--global", "--unset"])
            .arg(format!("alias.{name}"))
            .output()
            .await
            .context("Failed to run git config --unset")?;

        if output.status.success() {
            return Ok(AliasRemoval::Removed);
        }
        if output.status.code() == Some(CONFIG_KEY_MISSING) {
            return Ok(AliasRemoval::NotInstalled);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git config --unset failed: {}", stderr.trim())
    }
}
