mod common;

use vh_core::components::processes::{self, EXTENSION_ID};
use vh_core::components::supervisor_conf;
use vh_core::models::{Config, MatchKind};

use common::{example_website, host};

#[tokio::test]
async fn static_site_generates_one_server_block() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = host(dir.path());
    let site = example_website();
    assert_eq!(site.slug, "example");
    assert_eq!(site.locations[0].match_kind, MatchKind::Exact);
    host.manager.config_mut().websites.push(site);

    host.manager.update_configuration().await.unwrap();

    let conf = tokio::fs::read_to_string(host.nginx_conf("example"))
        .await
        .unwrap();
    assert_eq!(conf.matches("server {").count(), 1);
    assert!(conf.contains("listen 80;"));
    assert_eq!(conf.matches("location ").count(), 1);
    assert!(conf.contains("location / {"));
    assert!(conf.contains("root /srv/example;"));

    host.manager.restart_services().await;
    let checks = host.manager.run_checks().await;
    assert!(checks.iter().all(|c| c.kind != "Process"));
    assert!(checks.iter().all(|c| c.satisfied));
}

#[tokio::test]
async fn worker_process_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = host(dir.path());
    let mut site = example_website();
    site.extension_configs.insert(
        EXTENSION_ID.into(),
        serde_json::json!({"processes": [{"name": "worker", "command": "./worker"}]}),
    );
    host.manager.config_mut().websites.push(site);

    host.manager.update_configuration().await.unwrap();
    let conf = tokio::fs::read_to_string(host.supervisor_conf()).await.unwrap();
    let programs = supervisor_conf::marked_programs(&conf, processes::MARKER);
    assert_eq!(programs.len(), 1);
    assert!(programs[0].starts_with("example-worker"));

    let process_checks: Vec<String> = host
        .manager
        .components()
        .all()
        .find(|c| c.name() == EXTENSION_ID)
        .unwrap()
        .get_checks()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    assert_eq!(process_checks, vec!["example-worker"]);

    host.manager.config_mut().websites[0].enabled = false;
    host.manager.update_configuration().await.unwrap();
    let conf = tokio::fs::read_to_string(host.supervisor_conf()).await.unwrap();
    assert!(supervisor_conf::marked_programs(&conf, processes::MARKER).is_empty());
    assert!(!host.nginx_conf("example").exists());
}

#[tokio::test]
async fn every_component_touching_a_service_restarts_it_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = host(dir.path());
    host.manager.config_mut().websites.push(example_website());

    host.manager.update_configuration().await.unwrap();
    host.manager.update_configuration().await.unwrap();
    let reports = host.manager.restart_services().await;

    assert_eq!(reports.len(), 2);
    assert_eq!(host.nginx.reloads(), 1);
    assert_eq!(host.supervisor.reloads(), 1);

    let reports = host.manager.restart_services().await;
    assert!(reports.is_empty());
}

#[tokio::test]
async fn disabled_website_contributes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = host(dir.path());
    let mut site = example_website();
    site.enabled = false;
    site.extension_configs.insert(
        EXTENSION_ID.into(),
        serde_json::json!({"processes": [{"name": "worker"}]}),
    );
    host.manager.config_mut().websites.push(site);

    host.manager.update_configuration().await.unwrap();

    assert!(!host.nginx_conf("example").exists());
    let conf = tokio::fs::read_to_string(host.supervisor_conf()).await.unwrap();
    assert!(conf.is_empty());
    let checks = host.manager.run_checks().await;
    assert!(checks.iter().all(|c| c.kind != "Process"));
}

#[tokio::test]
async fn misconfigured_gateway_aborts_before_webserver() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = host(dir.path());
    let mut site = example_website();
    site.locations[0].backend.kind = "proxy".into();
    host.manager.config_mut().websites.push(site);

    let err = host.manager.update_configuration().await.unwrap_err();
    assert!(err.to_string().contains("proxy"));
    assert!(!host.nginx_conf("example").exists());
    assert!(host.manager.restarts().pending().is_empty());
}

#[tokio::test]
async fn saved_document_reloads_identically() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = host(dir.path());
    host.manager.reload().await.unwrap();
    assert!(!host.manager.is_configured());

    let mut site = example_website();
    site.extension_configs.insert(
        EXTENSION_ID.into(),
        serde_json::json!({"processes": [{"name": "worker"}]}),
    );
    host.manager.config_mut().websites.push(site);
    host.manager.save().await.unwrap();
    let saved: Config = host.manager.config().clone();

    let mut fresh = common::host(dir.path());
    fresh.manager.reload().await.unwrap();
    assert!(fresh.manager.is_configured());
    assert_eq!(fresh.manager.config(), &saved);
}

#[tokio::test]
async fn fresh_manager_checks_saved_config() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = host(dir.path());
    let mut site = example_website();
    site.extension_configs.insert(
        EXTENSION_ID.into(),
        serde_json::json!({"processes": [{"name": "worker", "command": "./worker"}]}),
    );
    host.manager.config_mut().websites.push(site);
    host.manager.save().await.unwrap();

    let mut fresh = common::host(dir.path());
    fresh.manager.reload().await.unwrap();
    let checks = fresh.manager.run_checks().await;
    let mut names: Vec<(&str, &str)> = checks
        .iter()
        .map(|c| (c.kind.as_str(), c.name.as_str()))
        .collect();
    names.sort();
    assert_eq!(names, vec![("Process", "example-worker"), ("Service", "nginx")]);

    assert!(!fresh.nginx_conf("example").exists());
    assert!(!fresh.supervisor_conf().exists());
    assert_eq!(fresh.nginx.reloads(), 0);
}
