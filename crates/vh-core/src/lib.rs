pub mod components;
pub mod error;
pub mod models;
pub mod services;
