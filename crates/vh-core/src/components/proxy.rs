use async_trait::async_trait;

use crate::error::{Result, VhError};
use crate::models::Config;
use crate::services::component::{Category, Component};

pub const GATEWAY_ID: &str = "proxy";

/// Forwards requests to an upstream given by the backend's `url` param.
pub struct ReverseProxy;

#[async_trait]
impl Component for ReverseProxy {
    fn name(&self) -> &str {
        GATEWAY_ID
    }

    fn category(&self) -> Category {
        Category::ApplicationGateway {
            id: GATEWAY_ID.to_string(),
            title: "Reverse proxy".to_string(),
        }
    }

    async fn create_configuration(&mut self, config: &Config) -> Result<()> {
        for website in config.enabled_websites() {
            for located in website.backends() {
                if located.backend().kind != GATEWAY_ID {
                    continue;
                }
                let url = located.backend().param_str("url").unwrap_or_default();
                if !["http://", "https://", "unix:"]
                    .iter()
                    .any(|scheme| url.starts_with(scheme))
                {
                    return Err(VhError::InvalidConfig(format!(
                        "backend '{}' needs an http(s):// or unix: url, got '{url}'",
                        located.id()
                    )));
                }
            }
        }
        Ok(())
    }
}
