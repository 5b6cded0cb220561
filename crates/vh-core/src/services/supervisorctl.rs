use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;

use crate::error::{Result, VhError};

use super::restart::ServiceControl;
use super::systemctl;

static STATUS_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s+([A-Z]+)\b\s*(.*)$").unwrap());

/// One line of `supervisorctl status` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramStatus {
    pub name: String,
    pub state: String,
    pub detail: String,
}

impl ProgramStatus {
    pub fn is_running(&self) -> bool {
        self.state == "RUNNING"
    }
}

pub fn parse_status(output: &str) -> Vec<ProgramStatus> {
    output
        .lines()
        .filter_map(|line| STATUS_LINE_RE.captures(line.trim()))
        .map(|caps| ProgramStatus {
            name: caps[1].to_string(),
            state: caps[2].to_string(),
            detail: caps[3].trim().to_string(),
        })
        .collect()
}

/// `status` exit code when some listed program is not running.
const EXIT_NOT_RUNNING: i32 = 3;

/// Run `supervisorctl`, returning its exit code and stdout. supervisorctl
/// exits non-zero whenever a listed program is not running, so the caller decides.
async fn run_supervisorctl(arguments: &[&str]) -> Result<(Option<i32>, String)> {
    let output = Command::new("supervisorctl")
        .args(arguments)
        .output()
        .await
        .map_err(|e| VhError::Command(format!("failed to run supervisorctl: {e}")))?;
    Ok((
        output.status.code(),
        String::from_utf8_lossy(&output.stdout).to_string(),
    ))
}

/// Whether a `supervisorctl status` run reached the daemon. Stopped or failed
/// programs still count as an answer; only an unreachable daemon does not.
pub fn daemon_answered(code: Option<i32>, stdout: &str) -> bool {
    match code {
        Some(0) | Some(EXIT_NOT_RUNNING) => true,
        _ => !parse_status(stdout).is_empty(),
    }
}

pub async fn program_status(name: &str) -> Result<Option<ProgramStatus>> {
    let (_, stdout) = run_supervisorctl(&["status", name]).await?;
    Ok(parse_status(&stdout).into_iter().find(|s| s.name == name))
}

/// The supervisord daemon: started through systemd, reloaded through supervisorctl.
pub struct SupervisorService {
    unit: String,
}

impl SupervisorService {
    pub fn new(unit: impl Into<String>) -> Self {
        Self { unit: unit.into() }
    }
}

#[async_trait]
impl ServiceControl for SupervisorService {
    async fn is_running(&self) -> Result<bool> {
        systemctl::is_active(&self.unit).await
    }

    async fn start(&self) -> Result<()> {
        systemctl::start(&self.unit).await
    }

    async fn reload(&self) -> Result<()> {
        let (code, stdout) = run_supervisorctl(&["reload"]).await?;
        if code != Some(0) {
            return Err(VhError::Command(format!(
                "supervisorctl reload failed: {}",
                stdout.trim()
            )));
        }
        Ok(())
    }

    async fn acknowledged(&self) -> Result<bool> {
        let (code, stdout) = run_supervisorctl(&["status"]).await?;
        Ok(daemon_answered(code, &stdout))
    }
}
