use std::fmt::Write as _;

use vh_core::models::SanityCheck;
use vh_core::services::manager::{PassReport, VirtualHostManager};
use vh_core::services::restart::{RestartOutcome, RestartReport};

/// Websites, ports and backends of the current config.
pub fn render_status(manager: &VirtualHostManager) -> String {
    let config = manager.config();
    let mut out = String::new();
    let configured = if manager.is_configured() { "yes" } else { "no" };
    let _ = writeln!(out, "configured: {configured}");
    let _ = writeln!(out, "websites: {}", config.websites.len());

    for website in &config.websites {
        let state = if !website.enabled {
            "disabled"
        } else if website.maintenance_mode {
            "maintenance"
        } else {
            "enabled"
        };
        out.push('\n');
        let _ = writeln!(out, "{} ({}) {state}", website.slug, website.name);

        let domains: Vec<&str> = website.domains.iter().map(|d| d.domain.as_str()).collect();
        let domains = if domains.is_empty() {
            "-".to_string()
        } else {
            domains.join(", ")
        };
        let _ = writeln!(out, "  domains: {domains}");

        let ports: Vec<String> = website
            .ports
            .iter()
            .map(|p| {
                let ssl = if p.ssl { "/ssl" } else { "" };
                format!("{}:{}{ssl}", p.host, p.port)
            })
            .collect();
        let _ = writeln!(out, "  ports: {}", ports.join(", "));

        for located in website.backends() {
            let kind = &located.backend().kind;
            let title = manager
                .components()
                .gateway_title(kind)
                .unwrap_or_else(|| format!("unknown type '{kind}'"));
            let _ = writeln!(
                out,
                "  {} {} -> {title}",
                located.id(),
                located.location.pattern
            );
        }
    }
    out
}

pub fn render_restarts(reports: &[RestartReport]) -> String {
    if reports.is_empty() {
        return "restarts: none\n".to_string();
    }
    let mut out = String::from("restarts:\n");
    for report in reports {
        let outcome = match &report.outcome {
            RestartOutcome::Started => "started".to_string(),
            RestartOutcome::Reloaded => "reloaded".to_string(),
            RestartOutcome::Unconfirmed => "unconfirmed".to_string(),
            RestartOutcome::Failed(reason) => format!("failed: {reason}"),
        };
        let _ = writeln!(out, "  {}: {outcome}", report.service);
    }
    out
}

pub fn render_checks(checks: &[SanityCheck]) -> String {
    if checks.is_empty() {
        return "checks: none\n".to_string();
    }
    let mut out = String::from("checks:\n");
    for check in checks {
        let mark = if check.satisfied { "ok  " } else { "FAIL" };
        let _ = writeln!(out, "  [{mark}] {} {}: {}", check.kind, check.name, check.message);
    }
    out
}

pub fn render_pass(report: &PassReport) -> String {
    let mut out = render_restarts(&report.restarts);
    out.push_str(&render_checks(&report.checks));
    let _ = writeln!(out, "finished: {}", report.finished_at.to_rfc3339());
    out
}
