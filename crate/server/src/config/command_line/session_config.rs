use clap::Args;
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_ISSUER: &str = "https://warden.local";
pub(crate) const DEFAULT_SESSION_LIFETIME_SECS: u64 = 3600;
pub(crate) const DEFAULT_SESSION_COOKIE_NAME: &str = "_warden_session";

#[derive(Debug, Args, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// The `iss` claim of the session tokens signed and accepted by this server
    #[clap(long, env = "WARDEN_ISSUER", default_value = DEFAULT_ISSUER)]
    pub issuer: String,

    /// Lifetime of a session token, in seconds
    #[clap(long, env = "WARDEN_SESSION_LIFETIME", default_value_t = DEFAULT_SESSION_LIFETIME_SECS)]
    pub session_lifetime: u64,

    /// The name of the cookie carrying a session token
    #[clap(long, env = "WARDEN_SESSION_COOKIE", default_value = DEFAULT_SESSION_COOKIE_NAME)]
    pub session_cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            issuer: DEFAULT_ISSUER.to_owned(),
            session_lifetime: DEFAULT_SESSION_LIFETIME_SECS,
            session_cookie_name: DEFAULT_SESSION_COOKIE_NAME.to_owned(),
        }
    }
}
