use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::models::SanityCheck;

use super::component::{Check, CheckOutcome};
use super::restart::ServiceControl;

/// Run every check and record its result. Errors count as failures.
pub async fn evaluate(checks: Vec<Box<dyn Check>>) -> Vec<SanityCheck> {
    let mut results = Vec::with_capacity(checks.len());
    for check in checks {
        let outcome = match check.check().await {
            Ok(outcome) => outcome,
            Err(e) => CheckOutcome::fail(e.to_string()),
        };
        if !outcome.passed {
            warn!(
                check = check.name(),
                kind = check.kind(),
                message = %outcome.message,
                "sanity check failed"
            );
        }
        results.push(SanityCheck {
            name: check.name().to_string(),
            kind: check.kind().to_string(),
            message: outcome.message,
            satisfied: outcome.passed,
        });
    }
    results
}

/// Passes while the given service reports itself running.
pub struct ServiceRunningCheck {
    name: String,
    control: Arc<dyn ServiceControl>,
}

impl ServiceRunningCheck {
    pub fn new(name: impl Into<String>, control: Arc<dyn ServiceControl>) -> Self {
        Self {
            name: name.into(),
            control,
        }
    }
}

#[async_trait]
impl Check for ServiceRunningCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "Service"
    }

    async fn check(&self) -> Result<CheckOutcome> {
        Ok(if self.control.is_running().await? {
            CheckOutcome::pass("running")
        } else {
            CheckOutcome::fail("not running")
        })
    }
}
