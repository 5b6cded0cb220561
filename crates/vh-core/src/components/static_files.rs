use async_trait::async_trait;

use crate::error::Result;
use crate::models::Config;
use crate::services::component::{Category, Component};

/// Files served straight from the website (or location) root by the webserver.
pub struct StaticFiles;

#[async_trait]
impl Component for StaticFiles {
    fn name(&self) -> &str {
        "static"
    }

    fn category(&self) -> Category {
        Category::ApplicationGateway {
            id: "static".to_string(),
            title: "Static files".to_string(),
        }
    }

    async fn create_configuration(&mut self, _config: &Config) -> Result<()> {
        Ok(())
    }
}
