use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Result, VhError};
use crate::models::settings::RestartSettings;

/// The concrete actions behind a restartable service.
#[async_trait]
pub trait ServiceControl: Send + Sync {
    async fn is_running(&self) -> Result<bool>;

    async fn start(&self) -> Result<()>;

    /// Ask a running service to pick up new configuration.
    async fn reload(&self) -> Result<()>;

    /// Whether the service has come back after `start` or `reload`.
    async fn acknowledged(&self) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_secs(1),
        }
    }
}

impl From<&RestartSettings> for RetryPolicy {
    fn from(settings: &RestartSettings) -> Self {
        Self {
            attempts: settings.attempts.max(1),
            delay: Duration::from_millis(settings.delay_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "camelCase")]
pub enum RestartOutcome {
    Started,
    Reloaded,
    /// The action ran but the service never acknowledged within the retry budget.
    Unconfirmed,
    Failed(String),
}

impl RestartOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, RestartOutcome::Started | RestartOutcome::Reloaded)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestartReport {
    pub service: String,
    pub outcome: RestartOutcome,
}

/// A named service whose restart can be requested any number of times per
/// pass and is carried out at most once.
pub struct Restartable {
    name: String,
    scheduled: AtomicBool,
    control: Arc<dyn ServiceControl>,
    retry: RetryPolicy,
}

impl Restartable {
    pub fn new(
        name: impl Into<String>,
        control: Arc<dyn ServiceControl>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            name: name.into(),
            scheduled: AtomicBool::new(false),
            control,
            retry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn control(&self) -> Arc<dyn ServiceControl> {
        self.control.clone()
    }

    pub fn schedule(&self) {
        if !self.scheduled.swap(true, Ordering::SeqCst) {
            debug!(service = %self.name, "restart scheduled");
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled.load(Ordering::SeqCst)
    }

    /// Restart if scheduled. The flag is cleared before the restart runs, so
    /// a failure never carries over into the next pass.
    pub async fn process(&self) -> Option<RestartReport> {
        if !self.scheduled.swap(false, Ordering::SeqCst) {
            return None;
        }
        info!(service = %self.name, "restarting");
        let outcome = match self.restart().await {
            Ok(outcome) => outcome,
            Err(e) => RestartOutcome::Failed(e.to_string()),
        };
        match &outcome {
            RestartOutcome::Started | RestartOutcome::Reloaded => {
                info!(service = %self.name, ?outcome, "restart confirmed")
            }
            RestartOutcome::Unconfirmed => {
                warn!(
                    service = %self.name,
                    attempts = self.retry.attempts,
                    "service did not acknowledge restart"
                )
            }
            RestartOutcome::Failed(reason) => {
                warn!(service = %self.name, %reason, "restart failed")
            }
        }
        Some(RestartReport {
            service: self.name.clone(),
            outcome,
        })
    }

    async fn restart(&self) -> Result<RestartOutcome> {
        let started = if self.control.is_running().await? {
            self.control.reload().await?;
            false
        } else {
            self.control.start().await?;
            true
        };

        // Await restart
        for attempt in 1..=self.retry.attempts {
            match self.control.acknowledged().await {
                Ok(true) => {
                    return Ok(if started {
                        RestartOutcome::Started
                    } else {
                        RestartOutcome::Reloaded
                    });
                }
                Ok(false) => debug!(service = %self.name, attempt, "not acknowledged yet"),
                Err(e) => debug!(service = %self.name, attempt, error = %e, "status probe failed"),
            }
            if attempt < self.retry.attempts {
                tokio::time::sleep(self.retry.delay).await;
            }
        }
        Ok(RestartOutcome::Unconfirmed)
    }
}

/// Registry of restartable services, processed in registration order.
#[derive(Default)]
pub struct RestartCoordinator {
    services: Vec<Arc<Restartable>>,
}

impl RestartCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service and return the handle components schedule through.
    pub fn register(&mut self, restartable: Restartable) -> Result<Arc<Restartable>> {
        if self.get(restartable.name()).is_some() {
            return Err(VhError::DuplicateService(restartable.name().to_string()));
        }
        let handle = Arc::new(restartable);
        self.services.push(handle.clone());
        Ok(handle)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Restartable>> {
        self.services.iter().find(|s| s.name() == name).cloned()
    }

    pub fn pending(&self) -> Vec<String> {
        self.services
            .iter()
            .filter(|s| s.is_scheduled())
            .map(|s| s.name().to_string())
            .collect()
    }

    /// Restart every scheduled service once. Failures are reported, not raised.
    pub async fn process(&self) -> Vec<RestartReport> {
        let mut reports = Vec::new();
        for service in &self.services {
            if let Some(report) = service.process().await {
                reports.push(report);
            }
        }
        reports
    }
}
