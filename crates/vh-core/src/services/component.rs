use async_trait::async_trait;

use crate::error::{Result, VhError};
use crate::models::Config;

/// Which slot of the registry a component fills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    Webserver,
    /// Handles every backend whose `type` equals `id`.
    ApplicationGateway { id: String, title: String },
    Misc,
}

/// A pluggable unit turning the declarative model into external artifacts.
///
/// Per pass, `create_configuration` runs on every component before any
/// `apply_configuration`; checks reflect the most recent configuration.
#[async_trait]
pub trait Component: Send + Sync {
    fn name(&self) -> &str;

    fn category(&self) -> Category;

    /// Write (or rewrite) every artifact this component owns for `config`,
    /// pruning entries it generated on earlier passes.
    async fn create_configuration(&mut self, config: &Config) -> Result<()>;

    /// Act on the freshly written artifacts, typically by scheduling a restart.
    async fn apply_configuration(&mut self) -> Result<()> {
        Ok(())
    }

    /// Rebuild check state from `config` without touching any artifact, for a
    /// process that loaded the config but did not run the pass itself.
    fn prepare_checks(&mut self, _config: &Config) {}

    fn get_checks(&self) -> Vec<Box<dyn Check>> {
        Vec::new()
    }
}

/// What a check observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub passed: bool,
    pub message: String,
}

impl CheckOutcome {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }
}

/// A read-only probe against live system state.
#[async_trait]
pub trait Check: Send + Sync {
    fn name(&self) -> &str;

    /// Category label shown next to the result.
    fn kind(&self) -> &str;

    async fn check(&self) -> Result<CheckOutcome>;
}

/// Registered components, partitioned by category in registration order.
#[derive(Default)]
pub struct ComponentRegistry {
    webserver: Option<Box<dyn Component>>,
    gateways: Vec<Box<dyn Component>>,
    misc: Vec<Box<dyn Component>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, component: Box<dyn Component>) -> Result<()> {
        if self.all().any(|c| c.name() == component.name()) {
            return Err(VhError::DuplicateComponent(component.name().to_string()));
        }
        match component.category() {
            Category::Webserver => {
                if self.webserver.is_some() {
                    return Err(VhError::DuplicateWebserver(component.name().to_string()));
                }
                self.webserver = Some(component);
            }
            Category::ApplicationGateway { .. } => self.gateways.push(component),
            Category::Misc => self.misc.push(component),
        }
        Ok(())
    }

    /// Every component in pass order: gateways, then misc, then the webserver.
    pub fn all(&self) -> impl Iterator<Item = &Box<dyn Component>> {
        self.gateways
            .iter()
            .chain(self.misc.iter())
            .chain(self.webserver.iter())
    }

    /// Mutable view in pass order. The webserver must be present.
    pub(crate) fn pass_order_mut(&mut self) -> Result<Vec<&mut Box<dyn Component>>> {
        let webserver = self.webserver.as_mut().ok_or(VhError::NoWebserver)?;
        let mut ordered: Vec<&mut Box<dyn Component>> =
            self.gateways.iter_mut().chain(self.misc.iter_mut()).collect();
        ordered.push(webserver);
        Ok(ordered)
    }

    pub fn prepare_checks(&mut self, config: &Config) {
        let all = self
            .gateways
            .iter_mut()
            .chain(self.misc.iter_mut())
            .chain(self.webserver.iter_mut());
        for component in all {
            component.prepare_checks(config);
        }
    }

    /// Display title of the gateway handling backends of type `backend_type`.
    pub fn gateway_title(&self, backend_type: &str) -> Option<String> {
        self.gateways.iter().find_map(|c| match c.category() {
            Category::ApplicationGateway { id, title } if id == backend_type => Some(title),
            _ => None,
        })
    }

}
