use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{Config, LocatedBackend, MatchKind, Website, WebsitePort, WILDCARD_HOST};
use crate::services::artifact::write_atomic;
use crate::services::checks::ServiceRunningCheck;
use crate::services::component::{Category, Check, Component};
use crate::services::restart::Restartable;

pub const MARKER: &str = "# Autogenerated by vh. Changes will be overwritten.";

const INDENT: &str = "    ";

/// Renders one nginx include file per enabled website.
pub struct NginxWebserver {
    conf_dir: PathBuf,
    service: Arc<Restartable>,
    written: Vec<PathBuf>,
    configured: bool,
}

impl NginxWebserver {
    pub fn new(conf_dir: impl Into<PathBuf>, service: Arc<Restartable>) -> Self {
        Self {
            conf_dir: conf_dir.into(),
            service,
            written: Vec::new(),
            configured: false,
        }
    }

    pub fn conf_path(&self, slug: &str) -> PathBuf {
        self.conf_dir.join(format!("{slug}.conf"))
    }

    /// Site files of the most recent pass, or of the loaded config.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Remove files carrying our marker that the current pass did not write.
    async fn prune(&self, keep: &HashSet<PathBuf>) -> Result<()> {
        let mut entries = tokio::fs::read_dir(&self.conf_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if keep.contains(&path) || path.extension().and_then(|e| e.to_str()) != Some("conf") {
                continue;
            }
            if is_generated(&path).await {
                debug!(path = %path.display(), "removing stale site config");
                tokio::fs::remove_file(&path).await?;
            }
        }
        Ok(())
    }
}

async fn is_generated(path: &Path) -> bool {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents.lines().next() == Some(MARKER),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not inspect site config");
            false
        }
    }
}

#[async_trait]
impl Component for NginxWebserver {
    fn name(&self) -> &str {
        "nginx"
    }

    fn category(&self) -> Category {
        Category::Webserver
    }

    async fn create_configuration(&mut self, config: &Config) -> Result<()> {
        tokio::fs::create_dir_all(&self.conf_dir).await?;

        let mut written = Vec::new();
        for website in config.enabled_websites() {
            let path = self.conf_path(&website.slug);
            write_atomic(&path, &render_website(website)).await?;
            written.push(path);
        }

        let keep: HashSet<PathBuf> = written.iter().cloned().collect();
        self.prune(&keep).await?;

        debug!(dir = %self.conf_dir.display(), sites = written.len(), "nginx config written");
        self.written = written;
        self.configured = true;
        Ok(())
    }

    async fn apply_configuration(&mut self) -> Result<()> {
        self.service.schedule();
        Ok(())
    }

    fn prepare_checks(&mut self, config: &Config) {
        self.written = config
            .enabled_websites()
            .map(|website| self.conf_path(&website.slug))
            .collect();
        self.configured = true;
    }

    fn get_checks(&self) -> Vec<Box<dyn Check>> {
        if !self.configured {
            return Vec::new();
        }
        vec![Box::new(ServiceRunningCheck::new(
            self.service.name(),
            self.service.control(),
        ))]
    }
}

/// The full include file for one website: one server block per port.
pub fn render_website(website: &Website) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{MARKER}");
    let _ = writeln!(out, "# website: {}", website.name);
    for port in &website.ports {
        out.push('\n');
        render_server(&mut out, website, port);
    }
    out
}

fn render_server(out: &mut String, website: &Website, port: &WebsitePort) {
    let _ = writeln!(out, "server {{");
    let _ = writeln!(out, "{INDENT}listen {};", listen_directive(port));

    let names: Vec<&str> = website.domains.iter().map(|d| d.domain.as_str()).collect();
    let server_name = if names.is_empty() {
        "_".to_string()
    } else {
        names.join(" ")
    };
    let _ = writeln!(out, "{INDENT}server_name {server_name};");
    let _ = writeln!(out, "{INDENT}root {};", website.root);

    if port.ssl && website.has_tls() {
        let _ = writeln!(out, "{INDENT}ssl_certificate {};", website.ssl_cert_path);
        let _ = writeln!(out, "{INDENT}ssl_certificate_key {};", website.ssl_key_path);
    }

    if website.maintenance_mode {
        out.push('\n');
        let _ = writeln!(out, "{INDENT}location / {{");
        let _ = writeln!(out, "{INDENT}{INDENT}return 503;");
        let _ = writeln!(out, "{INDENT}}}");
    } else {
        for backend in website.backends() {
            out.push('\n');
            render_location(out, &backend);
        }
    }

    if !website.custom_conf.trim().is_empty() {
        out.push('\n');
        push_indented(out, INDENT, &website.custom_conf);
    }
    let _ = writeln!(out, "}}");
}

fn listen_directive(port: &WebsitePort) -> String {
    let mut listen = if port.host == WILDCARD_HOST || port.host.is_empty() {
        port.port.to_string()
    } else {
        format!("{}:{}", port.host, port.port)
    };
    if port.ssl {
        listen.push_str(" ssl");
    }
    if port.spdy {
        listen.push_str(" http2");
    }
    listen
}

fn render_location(out: &mut String, located: &LocatedBackend<'_>) {
    let location = located.location;
    let modifier = match location.match_kind {
        MatchKind::Exact => "",
        MatchKind::Regex => "~ ",
    };
    let _ = writeln!(out, "{INDENT}location {modifier}{} {{", location.pattern);

    let body_indent = format!("{INDENT}{INDENT}");
    if !location.custom_conf_override {
        for directive in backend_directives(located) {
            let _ = writeln!(out, "{body_indent}{directive}");
        }
    }
    if !location.custom_conf.trim().is_empty() {
        push_indented(out, &body_indent, &location.custom_conf);
    }
    let _ = writeln!(out, "{INDENT}}}");
}

/// Routing directives for a location, by backend type.
fn backend_directives(located: &LocatedBackend<'_>) -> Vec<String> {
    let location = located.location;
    let backend = located.backend();
    match backend.kind.as_str() {
        "static" => {
            let root = if location.path.is_empty() {
                &located.website.root
            } else {
                &location.path
            };
            vec![format!("root {root};"), "try_files $uri $uri/ =404;".to_string()]
        }
        "proxy" => vec![
            format!("proxy_pass {};", backend.param_str("url").unwrap_or_default()),
            "proxy_set_header Host $host;".to_string(),
            "proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;".to_string(),
        ],
        "fcgi" => vec![
            "include fastcgi_params;".to_string(),
            "fastcgi_param SCRIPT_FILENAME $document_root$fastcgi_script_name;".to_string(),
            format!("fastcgi_pass unix:{};", fcgi_socket(&located.id())),
        ],
        other => vec![
            format!("# no gateway handles backend type '{other}'"),
            "return 502;".to_string(),
        ],
    }
}

/// Socket a FastCGI backend is expected to listen on.
pub fn fcgi_socket(backend_id: &str) -> String {
    format!("/var/run/vh-{backend_id}.sock")
}

fn push_indented(out: &mut String, indent: &str, text: &str) {
    for line in text.trim_end().lines() {
        if line.trim().is_empty() {
            out.push('\n');
        } else {
            let _ = writeln!(out, "{indent}{}", line.trim_start());
        }
    }
}
