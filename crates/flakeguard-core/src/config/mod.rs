//! Retry configuration loading

mod loader;

pub use loader::{embedded_defaults_yaml, ConfigLoader, ENV_PREFIX};
