use serde::{Deserialize, Serialize};

/// How the webserver interprets a location's `pattern`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    #[default]
    Exact,
    Regex,
}

/// A routing rule within a website.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteLocation {
    pub pattern: String,
    #[serde(rename = "match")]
    pub match_kind: MatchKind,
    pub backend: Backend,
    #[serde(default)]
    pub custom_conf: String,
    #[serde(default)]
    pub custom_conf_override: bool,
    /// Overrides the website root for this location when non-empty.
    #[serde(default)]
    pub path: String,
}

impl WebsiteLocation {
    /// Build a location from a named template. Unknown or missing templates
    /// give a catch-all `/` rule.
    pub fn create(template: Option<&str>) -> Self {
        let (pattern, match_kind) = match template {
            Some("php-fcgi") => (r"[^/]\.php(/|$)", MatchKind::Regex),
            _ => ("/", MatchKind::Exact),
        };
        Self {
            pattern: pattern.to_string(),
            match_kind,
            backend: Backend::create(),
            custom_conf: String::new(),
            custom_conf_override: false,
            path: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backend {
    /// Selects the application gateway component handling this location.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl Backend {
    pub fn create() -> Self {
        Self {
            kind: "static".to_string(),
            params: serde_json::Map::new(),
        }
    }

    /// Identity of this backend when owned by the location at `index` of the
    /// website with `website_slug`. Reordering locations changes it.
    pub fn id(&self, website_slug: &str, index: usize) -> String {
        backend_id(website_slug, &self.kind, index)
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_str())
    }
}

pub fn backend_id(website_slug: &str, kind: &str, index: usize) -> String {
    format!("{website_slug}-{kind}-{index}")
}
