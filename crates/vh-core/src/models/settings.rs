use std::path::PathBuf;

use serde::Deserialize;

/// Host-level settings: where artifacts live and how services are driven.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub config_path: PathBuf,
    pub www_user: String,
    pub nginx: NginxSettings,
    pub supervisor: SupervisorSettings,
    pub restart: RestartSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("/etc/vh/vh.json"),
            www_user: "www-data".to_string(),
            nginx: NginxSettings::default(),
            supervisor: SupervisorSettings::default(),
            restart: RestartSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NginxSettings {
    pub conf_dir: PathBuf,
    pub service: String,
}

impl Default for NginxSettings {
    fn default() -> Self {
        Self {
            conf_dir: PathBuf::from("/etc/nginx/conf.d"),
            service: "nginx".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SupervisorSettings {
    pub conf_path: PathBuf,
    pub service: String,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            conf_path: PathBuf::from("/etc/supervisor/conf.d/vh.conf"),
            service: "supervisor".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RestartSettings {
    pub attempts: u32,
    pub delay_ms: u64,
}

impl Default for RestartSettings {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay_ms: 1000,
        }
    }
}
