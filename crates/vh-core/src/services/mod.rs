pub mod artifact;
pub mod checks;
pub mod component;
pub mod manager;
pub mod restart;
pub mod settings_loader;
pub mod store;
pub mod supervisorctl;
pub mod systemctl;
