use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::components::{NginxWebserver, Processes, ReverseProxy, StaticFiles};
use crate::error::{Result, VhError};
use crate::models::{Config, SanityCheck, Settings};

use super::checks;
use super::component::ComponentRegistry;
use super::restart::{RestartCoordinator, RestartReport, Restartable, RetryPolicy};
use super::store::ConfigStore;
use super::supervisorctl::SupervisorService;
use super::systemctl::SystemdService;

/// Outcome of one full reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub restarts: Vec<RestartReport>,
    pub checks: Vec<SanityCheck>,
    pub finished_at: DateTime<Utc>,
}

impl PassReport {
    pub fn is_healthy(&self) -> bool {
        self.restarts.iter().all(|r| r.outcome.is_healthy())
            && self.checks.iter().all(|c| c.satisfied)
    }
}

/// Owns the declarative config and drives components through reconciliation passes.
///
/// Passes mutate shared external artifacts, so callers sharing a manager must
/// serialize access (e.g. behind a `tokio::sync::Mutex`); `&mut self` on every
/// pass operation enforces that for a single owner.
pub struct VirtualHostManager {
    store: ConfigStore,
    config: Config,
    configured: bool,
    components: ComponentRegistry,
    restarts: RestartCoordinator,
    checks: Vec<SanityCheck>,
}

impl VirtualHostManager {
    pub fn new(
        store: ConfigStore,
        components: ComponentRegistry,
        restarts: RestartCoordinator,
    ) -> Self {
        Self {
            store,
            config: Config::create(),
            configured: false,
            components,
            restarts,
            checks: Vec::new(),
        }
    }

    /// Wire the built-in nginx, static, proxy and processes components.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let retry = RetryPolicy::from(&settings.restart);
        let mut restarts = RestartCoordinator::new();
        let nginx = restarts.register(Restartable::new(
            "nginx",
            Arc::new(SystemdService::new(&settings.nginx.service)),
            retry,
        ))?;
        let supervisor = restarts.register(Restartable::new(
            "supervisor",
            Arc::new(SupervisorService::new(&settings.supervisor.service)),
            retry,
        ))?;

        let mut components = ComponentRegistry::new();
        components.register(Box::new(StaticFiles))?;
        components.register(Box::new(ReverseProxy))?;
        components.register(Box::new(Processes::new(
            &settings.supervisor.conf_path,
            &settings.www_user,
            supervisor,
        )))?;
        components.register(Box::new(NginxWebserver::new(&settings.nginx.conf_dir, nginx)))?;

        Ok(Self::new(
            ConfigStore::new(&settings.config_path),
            components,
            restarts,
        ))
    }

    /// Load the persisted document, or start from an empty config if there is none.
    /// On error the current config is kept.
    ///
    /// A loaded document also primes component checks, so [`Self::run_checks`]
    /// reports on the saved config without a pass in this process.
    pub async fn reload(&mut self) -> Result<()> {
        match self.store.load().await? {
            Some(config) => {
                self.config = config;
                self.configured = true;
                self.components.prepare_checks(&self.config);
            }
            None => {
                self.config = Config::create();
                self.configured = false;
            }
        }
        debug!(
            path = %self.store.path().display(),
            configured = self.configured,
            websites = self.config.websites.len(),
            "config reloaded"
        );
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    pub fn restarts(&self) -> &RestartCoordinator {
        &self.restarts
    }

    pub fn checks(&self) -> &[SanityCheck] {
        &self.checks
    }

    /// Generate every component's artifacts, then apply them. Gateways and misc
    /// components run before the webserver in both phases. Restarts are only
    /// scheduled here; see [`Self::restart_services`].
    pub async fn update_configuration(&mut self) -> Result<()> {
        let config = &self.config;
        let mut ordered = self.components.pass_order_mut()?;

        for component in ordered.iter_mut() {
            debug!(component = component.name(), "creating configuration");
            if let Err(e) = component.create_configuration(config).await {
                error!(component = component.name(), error = %e, "configuration aborted");
                return Err(configuration_write(component.name(), e));
            }
        }

        for component in ordered.iter_mut() {
            debug!(component = component.name(), "applying configuration");
            if let Err(e) = component.apply_configuration().await {
                error!(component = component.name(), error = %e, "apply aborted");
                return Err(configuration_write(component.name(), e));
            }
        }

        info!(
            websites = config.enabled_websites().count(),
            pending_restarts = ?self.restarts.pending(),
            "configuration updated"
        );
        Ok(())
    }

    pub async fn restart_services(&mut self) -> Vec<RestartReport> {
        self.restarts.process().await
    }

    /// Re-collect checks from every component and evaluate them.
    pub async fn run_checks(&mut self) -> &[SanityCheck] {
        self.checks.clear();
        let collected = self
            .components
            .all()
            .flat_map(|c| c.get_checks())
            .collect::<Vec<_>>();
        self.checks = checks::evaluate(collected).await;
        &self.checks
    }

    pub async fn save(&mut self) -> Result<()> {
        self.store.save(&self.config).await?;
        self.configured = true;
        info!(path = %self.store.path().display(), "config saved");
        Ok(())
    }

    /// One full pass: update, restart, check.
    pub async fn reconcile(&mut self) -> Result<PassReport> {
        self.update_configuration().await?;
        let restarts = self.restart_services().await;
        let checks = self.run_checks().await.to_vec();
        Ok(PassReport {
            restarts,
            checks,
            finished_at: Utc::now(),
        })
    }
}

fn configuration_write(component: &str, e: VhError) -> VhError {
    match e {
        VhError::ConfigurationWrite { .. } => e,
        other => VhError::ConfigurationWrite {
            component: component.to_string(),
            reason: other.to_string(),
        },
    }
}
