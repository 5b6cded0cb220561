use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::website::{slugify, Website};
use crate::error::{Result, VhError};

/// Root of the declarative virtual host tree. Website order is significant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub websites: Vec<Website>,
}

impl Config {
    pub fn create() -> Self {
        Self::default()
    }

    /// Parse a persisted document, deriving missing slugs and validating the result.
    pub fn from_document(document: &str) -> Result<Self> {
        let mut config: Config = serde_json::from_str(document)?;
        for website in &mut config.websites {
            if website.slug.is_empty() {
                website.slug = slugify(&website.name);
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn to_document(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let mut slugs = HashSet::new();
        for (i, website) in self.websites.iter().enumerate() {
            if website.name.trim().is_empty() {
                return Err(VhError::InvalidConfig(format!(
                    "website {i} has an empty name"
                )));
            }
            if website.slug.is_empty() {
                return Err(VhError::InvalidConfig(format!(
                    "website '{}' has an empty slug",
                    website.name
                )));
            }
            if !slugs.insert(website.slug.as_str()) {
                return Err(VhError::InvalidConfig(format!(
                    "duplicate website slug '{}'",
                    website.slug
                )));
            }
            if let Some(port) = website.ports.iter().find(|p| p.port == 0) {
                return Err(VhError::InvalidConfig(format!(
                    "website '{}' binds invalid port {} on {}",
                    website.name, port.port, port.host
                )));
            }
        }
        Ok(())
    }

    pub fn enabled_websites(&self) -> impl Iterator<Item = &Website> {
        self.websites.iter().filter(|w| w.enabled)
    }

    pub fn website(&self, slug: &str) -> Option<&Website> {
        self.websites.iter().find(|w| w.slug == slug)
    }

    pub fn website_mut(&mut self, slug: &str) -> Option<&mut Website> {
        self.websites.iter_mut().find(|w| w.slug == slug)
    }
}
