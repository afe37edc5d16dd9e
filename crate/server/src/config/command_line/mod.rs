mod clap_config;
mod http_config;
mod keys_config;
mod logging;
mod session_config;

pub use clap_config::{ClapConfig, WARDEN_CONF_ENV};
pub use http_config::HttpConfig;
pub use keys_config::KeysConfig;
pub use logging::LoggingConfig;
pub use session_config::SessionConfig;
