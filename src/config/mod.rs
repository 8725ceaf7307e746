//! Node configuration
//!
//! Environment-backed settings with compiled defaults. Every socket the
//! node opens takes its location from here so tests can isolate nodes.

pub mod settings;

pub use settings::Config;
