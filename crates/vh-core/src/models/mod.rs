pub mod check;
pub mod config;
pub mod location;
pub mod settings;
pub mod website;

pub use check::SanityCheck;
pub use config::Config;
pub use location::{backend_id, Backend, MatchKind, WebsiteLocation};
pub use settings::Settings;
pub use website::{slugify, LocatedBackend, Website, WebsiteDomain, WebsitePort, WILDCARD_HOST};
