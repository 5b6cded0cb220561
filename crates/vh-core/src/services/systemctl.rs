use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Result, VhError};

use super::restart::ServiceControl;

async fn run_systemctl(arguments: &[&str]) -> Result<String> {
    let output = Command::new("systemctl")
        .args(arguments)
        .output()
        .await
        .map_err(|e| VhError::Command(format!("failed to run systemctl: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VhError::Command(format!(
            "systemctl {} failed (exit {}): {stderr}",
            arguments.join(" "),
            output.status.code().unwrap_or(-1)
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

pub async fn is_active(unit: &str) -> Result<bool> {
    let status = Command::new("systemctl")
        .args(["is-active", "--quiet", unit])
        .status()
        .await
        .map_err(|e| VhError::Command(format!("failed to run systemctl: {e}")))?;
    Ok(status.success())
}

pub async fn start(unit: &str) -> Result<()> {
    run_systemctl(&["start", unit]).await?;
    Ok(())
}

pub async fn reload(unit: &str) -> Result<()> {
    run_systemctl(&["reload", unit]).await?;
    Ok(())
}

/// A systemd unit that supports `reload`.
pub struct SystemdService {
    unit: String,
}

impl SystemdService {
    pub fn new(unit: impl Into<String>) -> Self {
        Self { unit: unit.into() }
    }
}

#[async_trait]
impl ServiceControl for SystemdService {
    async fn is_running(&self) -> Result<bool> {
        is_active(&self.unit).await
    }

    async fn start(&self) -> Result<()> {
        start(&self.unit).await
    }

    async fn reload(&self) -> Result<()> {
        reload(&self.unit).await
    }

    async fn acknowledged(&self) -> Result<bool> {
        is_active(&self.unit).await
    }
}
