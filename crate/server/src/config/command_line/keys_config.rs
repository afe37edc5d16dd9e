use std::path::PathBuf;

use clap::Args;
use serde::{Deserialize, Serialize};

/// Key material used to sign session tokens and personal access tokens.
///
/// Keys are referenced as `<key id>=<path to a PEM private key>`.
#[derive(Debug, Default, Args, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct KeysConfig {
    /// The key currently used to sign session tokens, as `<id>=<path>`.
    /// Session tokens are disabled when not set.
    #[clap(long, env = "WARDEN_SIGNING_KEY", verbatim_doc_comment)]
    pub signing_key: Option<String>,

    /// Historical keys still accepted to verify session tokens, as `<id>=<path>`.
    /// Repeat the option (or separate with commas) to add several keys.
    /// Once a key is rotated out of signing, move it here until the tokens it signed have expired.
    #[clap(
        long = "validating-key",
        env = "WARDEN_VALIDATING_KEYS",
        value_delimiter = ',',
        verbatim_doc_comment
    )]
    pub validating_keys: Vec<String>,

    /// A file holding the symmetric secret used to sign personal access tokens.
    #[clap(long, env = "WARDEN_PAT_SECRET_FILE")]
    pub pat_secret_file: Option<PathBuf>,

    /// Use the bytes of the signing key file as personal access token secret
    /// when no dedicated secret file is configured.
    #[clap(
        long,
        env = "WARDEN_PAT_USE_SIGNING_KEY",
        default_value = "false",
        verbatim_doc_comment
    )]
    pub pat_use_signing_key: bool,
}
