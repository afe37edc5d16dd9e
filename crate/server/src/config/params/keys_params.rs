use std::{fmt, sync::Arc};

use tracing::info;
use warden_credentials::{HmacSecret, KeyPath, KeySet, SessionSigner};

use crate::{config::KeysConfig, error::WardenError, result::KResult, warden_bail};

/// The signers built from the key configuration, loaded once at startup.
pub struct KeysParams {
    /// RS256 signer over the key set, when a signing key is configured
    pub session_signer: Option<SessionSigner>,
    /// HS256 signer for personal access tokens, when a secret is configured
    pub pat_signer: Option<SessionSigner>,
}

impl KeysParams {
    pub fn try_from(config: &KeysConfig) -> KResult<Self> {
        let signing = config
            .signing_key
            .as_deref()
            .map(str::parse::<KeyPath>)
            .transpose()?;
        let validating = config
            .validating_keys
            .iter()
            .map(|key| key.parse::<KeyPath>())
            .collect::<Result<Vec<_>, _>>()?;

        let key_set = match signing {
            Some(signing) => Some(Arc::new(KeySet::load(&signing, &validating)?)),
            None if validating.is_empty() => None,
            None => warden_bail!(WardenError::ConfigurationError(
                "validating keys are configured but no signing key".to_owned()
            )),
        };

        let pat_secret = match (&config.pat_secret_file, config.pat_use_signing_key, &key_set) {
            (Some(path), _, _) => {
                info!("personal access token secret loaded from {}", path.display());
                Some(HmacSecret::load(path)?)
            }
            (None, true, Some(key_set)) => {
                info!(
                    "personal access tokens signed with the bytes of key {}",
                    key_set.signing().id()
                );
                Some(HmacSecret::from_key(key_set.signing()))
            }
            (None, true, None) => warden_bail!(WardenError::ConfigurationError(
                "--pat-use-signing-key requires a signing key".to_owned()
            )),
            (None, false, _) => None,
        };

        Ok(Self {
            session_signer: key_set.map(SessionSigner::Rs256),
            pat_signer: pat_secret.map(SessionSigner::Hs256),
        })
    }
}

impl fmt::Debug for KeysParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeysParams")
            .field(
                "session tokens",
                &self.session_signer.as_ref().map(SessionSigner::algorithm),
            )
            .field("personal access tokens", &self.pat_signer.is_some())
            .finish()
    }
}
