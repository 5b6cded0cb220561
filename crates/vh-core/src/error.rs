use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum VhError {
    #[error("failed to load {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("component '{component}' failed to write its configuration: {reason}")]
    ConfigurationWrite { component: String, reason: String },

    #[error("restart of '{service}' failed: {reason}")]
    Restart { service: String, reason: String },

    #[error("check failed: {0}")]
    Check(String),

    #[error("no webserver component registered")]
    NoWebserver,

    #[error("webserver component '{0}' conflicts with an already registered webserver")]
    DuplicateWebserver(String),

    #[error("component '{0}' is already registered")]
    DuplicateComponent(String),

    #[error("restartable service '{0}' is already registered")]
    DuplicateService(String),

    #[error("command failed: {0}")]
    Command(String),

    #[error("invalid settings: {0}")]
    Settings(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, VhError>;
