pub mod config;
pub mod engine;
pub mod error;

pub use config::Configuration;
pub use engine::Rejector;
