pub mod schema;

pub use schema::{resolve_config_dir, Config, HttpConfig, SessionConfig, CONFIG_DIR_ENV};
