use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, VhError};
use crate::models::{Config, Website};
use crate::services::artifact::{read_or_empty, write_atomic};
use crate::services::component::{Category, Check, CheckOutcome, Component};
use crate::services::restart::Restartable;
use crate::services::supervisorctl;

use super::supervisor_conf;

/// Key of this component's settings in `Website::extension_configs`.
pub const EXTENSION_ID: &str = "processes";

pub const MARKER: &str = "; Autogenerated vh process";

/// Per-website settings stored under `extensions.processes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessesConfig {
    #[serde(default)]
    pub processes: Vec<WebsiteProcess>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteProcess {
    #[serde(default = "default_process_name")]
    pub name: String,
    #[serde(default)]
    pub command: String,
    /// Defaults to the website root when empty.
    #[serde(default)]
    pub directory: String,
    /// Defaults to the configured www user when empty.
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub environment: String,
}

fn default_process_name() -> String {
    "service".to_string()
}

impl ProcessesConfig {
    pub fn for_website(website: &Website) -> Result<Self> {
        match website.extension_config(EXTENSION_ID) {
            None | Some(serde_json::Value::Null) => Ok(Self::default()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                VhError::InvalidConfig(format!(
                    "website '{}' has invalid {EXTENSION_ID} settings: {e}",
                    website.slug
                ))
            }),
        }
    }
}

/// Generates supervisord programs for website processes.
pub struct Processes {
    conf_path: PathBuf,
    www_user: String,
    service: Arc<Restartable>,
    programs: Vec<String>,
}

impl Processes {
    pub fn new(
        conf_path: impl Into<PathBuf>,
        www_user: impl Into<String>,
        service: Arc<Restartable>,
    ) -> Self {
        Self {
            conf_path: conf_path.into(),
            www_user: www_user.into(),
            service,
            programs: Vec::new(),
        }
    }

    pub fn conf_path(&self) -> &Path {
        &self.conf_path
    }

    /// Program names written by the most recent pass.
    pub fn programs(&self) -> &[String] {
        &self.programs
    }

    fn render(&self, website: &Website, process: &WebsiteProcess) -> (String, String) {
        let name = program_name(website, process);
        let directory = if process.directory.is_empty() {
            website.root.as_str()
        } else {
            process.directory.as_str()
        };
        let user = if process.user.is_empty() {
            self.www_user.as_str()
        } else {
            process.user.as_str()
        };
        let section = supervisor_conf::render_program(
            MARKER,
            &name,
            &[
                ("command", process.command.as_str()),
                ("directory", directory),
                ("user", user),
                ("environment", process.environment.as_str()),
            ],
        );
        (name, section)
    }
}

fn program_name(website: &Website, process: &WebsiteProcess) -> String {
    format!("{}-{}", website.slug, process.name)
}

#[async_trait]
impl Component for Processes {
    fn name(&self) -> &str {
        EXTENSION_ID
    }

    fn category(&self) -> Category {
        Category::Misc
    }

    async fn create_configuration(&mut self, config: &Config) -> Result<()> {
        let mut programs = Vec::new();
        let mut sections = Vec::new();
        for website in config.enabled_websites() {
            for process in ProcessesConfig::for_website(website)?.processes {
                let (name, section) = self.render(website, &process);
                programs.push(name);
                sections.push(section);
            }
        }

        let existing = read_or_empty(&self.conf_path).await?;
        let updated = supervisor_conf::replace_marked(&existing, MARKER, &sections);
        write_atomic(&self.conf_path, &updated).await?;

        debug!(
            path = %self.conf_path.display(),
            programs = programs.len(),
            "supervisor programs written"
        );
        self.programs = programs;
        Ok(())
    }

    async fn apply_configuration(&mut self) -> Result<()> {
        self.service.schedule();
        Ok(())
    }

    fn prepare_checks(&mut self, config: &Config) {
        let mut programs = Vec::new();
        for website in config.enabled_websites() {
            match ProcessesConfig::for_website(website) {
                Ok(settings) => programs.extend(
                    settings
                        .processes
                        .iter()
                        .map(|process| program_name(website, process)),
                ),
                Err(e) => warn!(website = %website.slug, error = %e, "no process checks"),
            }
        }
        self.programs = programs;
    }

    fn get_checks(&self) -> Vec<Box<dyn Check>> {
        self.programs
            .iter()
            .map(|name| Box::new(ProcessCheck { program: name.clone() }) as Box<dyn Check>)
            .collect()
    }
}

/// Passes while supervisord reports the program as RUNNING.
pub struct ProcessCheck {
    program: String,
}

#[async_trait]
impl Check for ProcessCheck {
    fn name(&self) -> &str {
        &self.program
    }

    fn kind(&self) -> &str {
        "Process"
    }

    async fn check(&self) -> Result<CheckOutcome> {
        Ok(match supervisorctl::program_status(&self.program).await? {
            Some(status) if status.is_running() => CheckOutcome::pass(status.state),
            Some(status) => CheckOutcome::fail(status.state),
            None => CheckOutcome::fail("unknown program"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WebsiteLocation;
    use crate::services::restart::testing::{fast_retry, FakeService};

    fn component(dir: &Path) -> Processes {
        let service = Arc::new(Restartable::new(
            "supervisor",
            FakeService::running(),
            fast_retry(),
        ));
        Processes::new(dir.join("supervisor").join("vh.conf"), "www-data", service)
    }

    fn example_with_worker() -> Config {
        let mut site = Website::create("Example");
        site.root = "/srv/example".into();
        site.locations.push(WebsiteLocation::create(None));
        site.extension_configs.insert(
            EXTENSION_ID.into(),
            serde_json::json!({"processes": [{"name": "worker", "command": "python worker.py"}]}),
        );
        Config {
            websites: vec![site],
        }
    }

    #[tokio::test]
    async fn writes_one_program_per_process() {
        let dir = tempfile::tempdir().unwrap();
        let mut processes = component(dir.path());
        processes
            .create_configuration(&example_with_worker())
            .await
            .unwrap();

        let written = tokio::fs::read_to_string(processes.conf_path()).await.unwrap();
        let programs = supervisor_conf::marked_programs(&written, MARKER);
        assert_eq!(programs, vec!["example-worker"]);
        assert!(programs[0].starts_with("example-worker"));
        assert!(written.contains("command=python worker.py"));
        assert!(written.contains("directory=/srv/example"));
        assert!(written.contains("user=www-data"));
        assert!(!written.contains("environment="));

        let checks = processes.get_checks();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].name(), "example-worker");
        assert_eq!(checks[0].kind(), "Process");
    }

    #[tokio::test]
    async fn disabling_website_prunes_its_programs() {
        let dir = tempfile::tempdir().unwrap();
        let mut processes = component(dir.path());
        let mut config = example_with_worker();
        processes.create_configuration(&config).await.unwrap();

        config.websites[0].enabled = false;
        processes.create_configuration(&config).await.unwrap();

        let written = tokio::fs::read_to_string(processes.conf_path()).await.unwrap();
        assert!(supervisor_conf::marked_programs(&written, MARKER).is_empty());
        assert!(processes.get_checks().is_empty());
    }

    #[tokio::test]
    async fn hand_written_programs_survive() {
        let dir = tempfile::tempdir().unwrap();
        let mut processes = component(dir.path());
        write_atomic(processes.conf_path(), "[program:manual]\ncommand=/bin/true\n")
            .await
            .unwrap();

        processes
            .create_configuration(&example_with_worker())
            .await
            .unwrap();
        processes
            .create_configuration(&example_with_worker())
            .await
            .unwrap();

        let written = tokio::fs::read_to_string(processes.conf_path()).await.unwrap();
        assert!(written.starts_with("[program:manual]\ncommand=/bin/true\n"));
        assert_eq!(written.matches("[program:example-worker]").count(), 1);
    }

    #[tokio::test]
    async fn explicit_overrides_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut processes = component(dir.path());
        let mut config = example_with_worker();
        config.websites[0].extension_configs.insert(
            EXTENSION_ID.into(),
            serde_json::json!({"processes": [{
                "command": "serve",
                "directory": "/opt/app",
                "user": "deploy",
                "environment": "PORT=8000"
            }]}),
        );
        processes.create_configuration(&config).await.unwrap();

        let written = tokio::fs::read_to_string(processes.conf_path()).await.unwrap();
        assert!(written.contains("[program:example-service]"));
        assert!(written.contains("directory=/opt/app"));
        assert!(written.contains("user=deploy"));
        assert!(written.contains("environment=PORT=8000"));
    }

    #[tokio::test]
    async fn invalid_extension_blob_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut processes = component(dir.path());
        let mut config = example_with_worker();
        config.websites[0]
            .extension_configs
            .insert(EXTENSION_ID.into(), serde_json::json!({"processes": "nope"}));
        assert!(processes.create_configuration(&config).await.is_err());
    }

    #[test]
    fn checks_follow_loaded_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut processes = component(dir.path());
        let mut config = example_with_worker();
        let mut broken = Website::create("Broken");
        broken
            .extension_configs
            .insert(EXTENSION_ID.into(), serde_json::json!({"processes": 3}));
        config.websites.push(broken);

        processes.prepare_checks(&config);
        let names: Vec<String> = processes
            .get_checks()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["example-worker"]);
        assert!(!processes.conf_path().exists());
    }

    #[tokio::test]
    async fn apply_schedules_supervisor() {
        let dir = tempfile::tempdir().unwrap();
        let mut processes = component(dir.path());
        processes.apply_configuration().await.unwrap();
        processes.apply_configuration().await.unwrap();
        assert!(processes.service.is_scheduled());
    }
}
