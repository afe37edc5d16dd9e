//! RSA key material used to sign and verify session tokens.
//!
//! A [`KeySet`] holds exactly one signing key and any number of historical
//! validating keys. It is built once at startup and never mutated: rotating
//! keys means building a new set where the previous signing key has moved to
//! the validating list.

use std::{
    collections::HashMap,
    fmt::{self, Display},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use jsonwebtoken::{DecodingKey, EncodingKey};
use openssl::pkey::{Id, PKey};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::{credential_ensure, error::CredentialError, error::result::CResult};

/// A private RSA key and the ID under which tokens reference it.
pub struct Key {
    id: String,
    /// The PEM bytes exactly as read from disk
    raw: Zeroizing<Vec<u8>>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Key {
    /// Read a PEM encoded RSA private key from `path`.
    ///
    /// # Errors
    ///
    /// `ConfigError` when the file cannot be read or does not hold an RSA private key.
    pub fn load(id: &str, path: &Path) -> CResult<Self> {
        debug!("loading key {id} from {}", path.display());
        let pem = fs::read(path).map_err(|e| {
            CredentialError::ConfigError(format!(
                "key {id}: unable to read {}: {e}",
                path.display()
            ))
        })?;
        Self::from_pem(id, pem)
    }

    /// Parse a PEM encoded RSA private key (PKCS#1 or PKCS#8).
    ///
    /// # Errors
    ///
    /// `ConfigError` when the ID is empty, the PEM cannot be parsed or the key is not RSA.
    pub fn from_pem(id: &str, pem: Vec<u8>) -> CResult<Self> {
        credential_ensure!(
            !id.trim().is_empty(),
            CredentialError::ConfigError("key ID must not be empty".to_owned())
        );
        let raw = Zeroizing::new(pem);

        let private_key = PKey::private_key_from_pem(&raw).map_err(|e| {
            CredentialError::ConfigError(format!("key {id}: unable to parse the private key: {e}"))
        })?;
        credential_ensure!(
            private_key.id() == Id::RSA,
            CredentialError::ConfigError(format!(
                "key {id}: expected an RSA private key, found key type {}",
                private_key.id().as_raw()
            ))
        );
        let rsa = private_key.rsa()?;

        // normalise to PKCS#1 so that both PEM flavours end up identical
        let private_pem = Zeroizing::new(rsa.private_key_to_pem()?);
        let public_pem = rsa.public_key_to_pem_pkcs1()?;
        let encoding_key = EncodingKey::from_rsa_pem(&private_pem).map_err(|e| {
            CredentialError::ConfigError(format!("key {id}: invalid signing key: {e}"))
        })?;
        let decoding_key = DecodingKey::from_rsa_pem(&public_pem).map_err(|e| {
            CredentialError::ConfigError(format!("key {id}: invalid verification key: {e}"))
        })?;

        Ok(Self {
            id: id.to_owned(),
            raw,
            encoding_key,
            decoding_key,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The key file content, used as HMAC secret when the key doubles as one.
    #[must_use]
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub(crate) const fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub(crate) const fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("id", &self.id)
            .field("raw", &"***")
            .finish()
    }
}

/// A key ID together with the file holding the key, written `<id>=<path>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    pub id: String,
    pub path: PathBuf,
}

impl FromStr for KeyPath {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, path) = s.split_once('=').ok_or_else(|| {
            CredentialError::ConfigError(format!("invalid key reference {s:?}: expected <id>=<path>"))
        })?;
        let (id, path) = (id.trim(), path.trim());
        credential_ensure!(
            !id.is_empty() && !path.is_empty(),
            CredentialError::ConfigError(format!(
                "invalid key reference {s:?}: both the key ID and the path are required"
            ))
        );
        Ok(Self {
            id: id.to_owned(),
            path: PathBuf::from(path),
        })
    }
}

impl Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.id, self.path.display())
    }
}

#[derive(Debug, Clone, Copy)]
enum KeySlot {
    Signing,
    Validating(usize),
}

/// The signing key plus the historical keys still accepted for verification.
pub struct KeySet {
    signing: Key,
    validating: Vec<Key>,
    index: HashMap<String, KeySlot>,
}

impl KeySet {
    /// Assemble a key set from already parsed keys.
    ///
    /// # Errors
    ///
    /// `ConfigError` if a key ID appears more than once.
    pub fn new(signing: Key, validating: Vec<Key>) -> CResult<Self> {
        let mut index = HashMap::with_capacity(validating.len() + 1);
        index.insert(signing.id.clone(), KeySlot::Signing);
        for (position, key) in validating.iter().enumerate() {
            if index
                .insert(key.id.clone(), KeySlot::Validating(position))
                .is_some()
            {
                return Err(CredentialError::ConfigError(format!(
                    "duplicate key ID: {}",
                    key.id
                )));
            }
        }
        Ok(Self {
            signing,
            validating,
            index,
        })
    }

    /// Load the signing key and the validating keys from disk.
    ///
    /// # Errors
    ///
    /// `ConfigError` if any key file is missing or invalid, or if two keys share an ID.
    pub fn load(signing: &KeyPath, validating: &[KeyPath]) -> CResult<Self> {
        let signing_key = Key::load(&signing.id, &signing.path)?;
        let validating_keys = validating
            .iter()
            .map(|key_path| Key::load(&key_path.id, &key_path.path))
            .collect::<CResult<Vec<_>>>()?;
        let key_set = Self::new(signing_key, validating_keys)?;
        info!(
            "key set loaded: signing key {}, validating keys {:?}",
            key_set.signing.id,
            key_set.validating_ids()
        );
        Ok(key_set)
    }

    #[must_use]
    pub const fn signing(&self) -> &Key {
        &self.signing
    }

    #[must_use]
    pub fn validating(&self) -> &[Key] {
        &self.validating
    }

    /// Resolve the key named by a token header.
    ///
    /// # Errors
    ///
    /// `UnknownKeyId` when neither the signing key nor a validating key has this ID.
    pub fn lookup(&self, key_id: &str) -> CResult<&Key> {
        match self.index.get(key_id) {
            Some(KeySlot::Signing) => Ok(&self.signing),
            Some(KeySlot::Validating(position)) => self
                .validating
                .get(*position)
                .ok_or_else(|| CredentialError::UnknownKeyId(key_id.to_owned())),
            None => Err(CredentialError::UnknownKeyId(key_id.to_owned())),
        }
    }

    fn validating_ids(&self) -> Vec<&str> {
        self.validating.iter().map(Key::id).collect()
    }
}

impl fmt::Debug for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySet")
            .field("signing", &self.signing.id)
            .field("validating", &self.validating_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use openssl::{ec::EcGroup, ec::EcKey, nid::Nid, pkey::PKey};

    use super::{Key, KeyPath, KeySet};
    use crate::{
        error::CredentialError,
        test_utils::{rsa_private_key_pem, write_file, write_rsa_key},
    };

    fn assert_config_error<T: std::fmt::Debug>(result: Result<T, CredentialError>) {
        match result {
            Err(CredentialError::ConfigError(_)) => {}
            other => panic!("expected a configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_key_set() {
        let dir = tempfile::tempdir().unwrap();
        let signing = KeyPath {
            id: "k2".to_owned(),
            path: write_rsa_key(dir.path(), "k2.pem"),
        };
        let validating = vec![KeyPath {
            id: "k1".to_owned(),
            path: write_rsa_key(dir.path(), "k1.pem"),
        }];

        let key_set = KeySet::load(&signing, &validating).unwrap();
        assert_eq!(key_set.signing().id(), "k2");
        assert_eq!(key_set.validating().len(), 1);
        assert_eq!(key_set.lookup("k2").unwrap().id(), "k2");
        assert_eq!(key_set.lookup("k1").unwrap().id(), "k1");
        assert_eq!(
            key_set.lookup("k0").unwrap_err(),
            CredentialError::UnknownKeyId("k0".to_owned())
        );
    }

    #[test]
    fn test_raw_bytes_are_file_content() {
        let pem = rsa_private_key_pem();
        let key = Key::from_pem("k1", pem.clone()).unwrap();
        assert_eq!(key.raw_bytes(), pem.as_slice());
        assert!(!format!("{key:?}").contains("PRIVATE"));
    }

    #[test]
    fn test_missing_key_file() {
        assert_config_error(Key::load("k1", &PathBuf::from("/does/not/exist.pem")));
    }

    #[test]
    fn test_unparsable_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "garbage.pem", b"this is not a key");
        assert_config_error(Key::load("k1", &path));
    }

    #[test]
    fn test_non_rsa_key_is_rejected() {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let ec_key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();
        let pem = ec_key.private_key_to_pem_pkcs8().unwrap();
        assert_config_error(Key::from_pem("ec", pem));
    }

    #[test]
    fn test_empty_key_id() {
        assert_config_error(Key::from_pem(" ", rsa_private_key_pem()));
    }

    #[test]
    fn test_duplicate_key_ids() {
        let signing = Key::from_pem("k1", rsa_private_key_pem()).unwrap();
        let validating = vec![
            Key::from_pem("k0", rsa_private_key_pem()).unwrap(),
            Key::from_pem("k1", rsa_private_key_pem()).unwrap(),
        ];
        assert_config_error(KeySet::new(signing, validating));
    }

    #[test]
    fn test_key_path_parsing() {
        let key_path: KeyPath = "k1=/etc/warden/k1.pem".parse().unwrap();
        assert_eq!(key_path.id, "k1");
        assert_eq!(key_path.path, PathBuf::from("/etc/warden/k1.pem"));
        assert_eq!(key_path.to_string(), "k1=/etc/warden/k1.pem");

        assert_config_error("k1".parse::<KeyPath>());
        assert_config_error("=/etc/warden/k1.pem".parse::<KeyPath>());
        assert_config_error("k1=".parse::<KeyPath>());
    }
}
