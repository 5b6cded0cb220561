use std::path::Path;

use crate::error::{Result, VhError};
use crate::models::Settings;

pub const DEFAULT_SETTINGS_PATH: &str = "/etc/vh/settings.yaml";

/// Load settings from a YAML file. A missing file gives the defaults.
pub fn load(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(path)?;
    let settings: Settings = serde_yaml::from_str(&contents)
        .map_err(|e| VhError::Settings(format!("{}: {e}", path.display())))?;
    validate(&settings)?;
    Ok(settings)
}

fn validate(settings: &Settings) -> Result<()> {
    if settings.config_path.as_os_str().is_empty() {
        return Err(VhError::Settings("config_path cannot be empty".into()));
    }
    if settings.nginx.conf_dir.as_os_str().is_empty() {
        return Err(VhError::Settings("nginx.conf_dir cannot be empty".into()));
    }
    if settings.supervisor.conf_path.as_os_str().is_empty() {
        return Err(VhError::Settings(
            "supervisor.conf_path cannot be empty".into(),
        ));
    }
    if settings.restart.attempts == 0 {
        return Err(VhError::Settings(
            "restart.attempts must be at least 1".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parse_full_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        let yaml = r#"
config_path: /var/lib/vh/vh.json
www_user: http
nginx:
  conf_dir: /etc/nginx/sites-enabled
  service: openresty
supervisor:
  conf_path: /etc/supervisord.d/vh.ini
  service: supervisord
restart:
  attempts: 3
  delay_ms: 250
"#;
        fs::write(&path, yaml).unwrap();
        let settings = load(&path).unwrap();
        assert_eq!(settings.config_path, Path::new("/var/lib/vh/vh.json"));
        assert_eq!(settings.www_user, "http");
        assert_eq!(settings.nginx.service, "openresty");
        assert_eq!(settings.supervisor.service, "supervisord");
        assert_eq!(settings.restart.attempts, 3);
        assert_eq!(settings.restart.delay_ms, 250);
    }

    #[test]
    fn partial_settings_keep_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "nginx:\n  service: openresty\n").unwrap();
        let settings = load(&path).unwrap();
        assert_eq!(settings.nginx.service, "openresty");
        assert_eq!(settings.nginx.conf_dir, Path::new("/etc/nginx/conf.d"));
        assert_eq!(settings.www_user, "www-data");
        assert_eq!(settings.restart.attempts, 10);
    }

    #[test]
    fn missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(settings.config_path, Path::new("/etc/vh/vh.json"));
    }

    #[test]
    fn zero_attempts_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "restart:\n  attempts: 0\n").unwrap();
        assert!(matches!(load(&path), Err(VhError::Settings(_))));
    }
}
