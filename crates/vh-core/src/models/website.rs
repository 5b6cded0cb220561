use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::location::{Backend, WebsiteLocation};

pub const DEFAULT_OWNER: &str = "root";
pub const DEFAULT_ROOT: &str = "/srv/new-website";
pub const WILDCARD_HOST: &str = "*";

/// One virtual host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Website {
    pub name: String,
    #[serde(default = "default_owner")]
    pub owner: String,
    /// Derived from `name` when absent from the document, then persisted.
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub domains: Vec<WebsiteDomain>,
    #[serde(default)]
    pub ports: Vec<WebsitePort>,
    #[serde(default)]
    pub locations: Vec<WebsiteLocation>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// New websites start in maintenance until explicitly taken live.
    #[serde(default = "default_true")]
    pub maintenance_mode: bool,
    #[serde(default = "default_root")]
    pub root: String,
    /// Opaque per-extension settings, keyed by extension identifier.
    #[serde(rename = "extensions", default)]
    pub extension_configs: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub custom_conf: String,
    #[serde(default)]
    pub ssl_cert_path: String,
    #[serde(default)]
    pub ssl_key_path: String,
}

fn default_owner() -> String {
    DEFAULT_OWNER.to_string()
}

fn default_root() -> String {
    DEFAULT_ROOT.to_string()
}

fn default_true() -> bool {
    true
}

impl Website {
    /// A new website listening on port 80 with no domains or locations.
    pub fn create(name: &str) -> Self {
        Self {
            name: name.to_string(),
            owner: default_owner(),
            slug: slugify(name),
            domains: Vec::new(),
            ports: vec![WebsitePort::create(80)],
            locations: Vec::new(),
            enabled: true,
            maintenance_mode: true,
            root: default_root(),
            extension_configs: BTreeMap::new(),
            custom_conf: String::new(),
            ssl_cert_path: String::new(),
            ssl_key_path: String::new(),
        }
    }

    pub fn has_tls(&self) -> bool {
        !self.ssl_cert_path.is_empty() && !self.ssl_key_path.is_empty()
    }

    pub fn extension_config(&self, extension: &str) -> Option<&serde_json::Value> {
        self.extension_configs.get(extension)
    }

    /// Every location's backend paired with its positional identity.
    pub fn backends(&self) -> impl Iterator<Item = LocatedBackend<'_>> {
        self.locations
            .iter()
            .enumerate()
            .map(move |(index, location)| LocatedBackend {
                website: self,
                location,
                index,
            })
    }

    pub fn find_backend(&self, id: &str) -> Option<LocatedBackend<'_>> {
        self.backends().find(|b| b.id() == id)
    }
}

/// A backend viewed through its owning website and location index.
#[derive(Debug, Clone, Copy)]
pub struct LocatedBackend<'a> {
    pub website: &'a Website,
    pub location: &'a WebsiteLocation,
    pub index: usize,
}

impl LocatedBackend<'_> {
    pub fn backend(&self) -> &Backend {
        &self.location.backend
    }

    pub fn id(&self) -> String {
        self.location.backend.id(&self.website.slug, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteDomain {
    pub domain: String,
}

impl WebsiteDomain {
    pub fn create(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsitePort {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub ssl: bool,
    #[serde(default)]
    pub spdy: bool,
}

fn default_host() -> String {
    WILDCARD_HOST.to_string()
}

impl WebsitePort {
    pub fn create(port: u16) -> Self {
        Self {
            host: default_host(),
            port,
            ssl: false,
            spdy: false,
        }
    }
}

/// Lowercase ASCII slug: runs of anything other than `[a-z0-9]` become a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}
