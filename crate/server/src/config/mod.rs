mod command_line;
mod params;

pub use command_line::{
    ClapConfig, HttpConfig, KeysConfig, LoggingConfig, SessionConfig, WARDEN_CONF_ENV,
};
pub use params::{KeysParams, ServerParams};
