//! Personal access tokens.
//!
//! Wire form: `gitpod_pat_<signature>.<value>` where `value` is 40 random
//! alphanumeric characters and `signature` the unpadded base64url
//! HMAC-SHA256 of `value`. Only [`PersonalAccessToken::value_hash`] is ever
//! stored.

use std::fmt::{self, Display};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use openssl::{memcmp, rand::rand_bytes, sha::sha256};
use tracing::trace;
use zeroize::Zeroizing;

use crate::{
    credential_ensure,
    error::{CredentialError, MalformedReason, result::CResult},
    jws::SessionSigner,
};

pub const PERSONAL_ACCESS_TOKEN_PREFIX: &str = "gitpod_pat_";

/// Number of characters of the secret value.
pub const VALUE_LENGTH: usize = 40;

const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

// Largest multiple of 62 that fits in a byte: bytes at or above are redrawn.
const REJECTION_THRESHOLD: u8 = 248;

#[derive(Clone, PartialEq, Eq)]
pub struct PersonalAccessToken {
    signature: String,
    value: Zeroizing<String>,
}

impl PersonalAccessToken {
    /// Draw a fresh value and sign it.
    ///
    /// # Errors
    ///
    /// `ConfigError` when no signer is configured or the signer is not HS256.
    pub fn generate(signer: Option<&SessionSigner>) -> CResult<Self> {
        let signer = signer.ok_or_else(|| {
            CredentialError::ConfigError("personal access tokens are disabled".to_owned())
        })?;
        let value = Zeroizing::new(random_value()?);
        let signature = sign(signer, &value)?;
        Ok(Self { signature, value })
    }

    /// Take a token apart and check its signature.
    ///
    /// # Errors
    ///
    /// `MalformedToken` when the structure is wrong, `SignatureMismatch` when
    /// the signature does not match the value.
    pub fn parse(token: &str, signer: &SessionSigner) -> CResult<Self> {
        credential_ensure!(
            !token.is_empty(),
            CredentialError::MalformedToken(MalformedReason::Empty)
        );
        let remainder = token
            .strip_prefix(PERSONAL_ACCESS_TOKEN_PREFIX)
            .ok_or(CredentialError::MalformedToken(MalformedReason::MissingPrefix))?;
        let (signature, value) = remainder
            .split_once('.')
            .ok_or(CredentialError::MalformedToken(MalformedReason::MissingSeparator))?;
        credential_ensure!(
            !signature.is_empty(),
            CredentialError::MalformedToken(MalformedReason::EmptySignature)
        );
        credential_ensure!(
            !value.is_empty(),
            CredentialError::MalformedToken(MalformedReason::EmptyValue)
        );

        let expected = sign(signer, value)?;
        if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            trace!("personal access token signature mismatch");
            return Err(CredentialError::SignatureMismatch(
                "personal access token signature does not match its value".to_owned(),
            ));
        }

        Ok(Self {
            signature: signature.to_owned(),
            value: Zeroizing::new(value.to_owned()),
        })
    }

    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The secret value. Shown to its owner once, never persisted.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Lowercase hex SHA-256 of the value, the storage lookup key.
    #[must_use]
    pub fn value_hash(&self) -> String {
        hash_value(&self.value)
    }
}

impl Display for PersonalAccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{PERSONAL_ACCESS_TOKEN_PREFIX}{}.{}",
            self.signature,
            self.value.as_str()
        )
    }
}

impl fmt::Debug for PersonalAccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersonalAccessToken")
            .field("signature", &self.signature)
            .field("value", &"***")
            .finish()
    }
}

/// SHA-256 hex digest of a token value.
#[must_use]
pub fn hash_value(value: &str) -> String {
    hex::encode(sha256(value.as_bytes()))
}

fn sign(signer: &SessionSigner, value: &str) -> CResult<String> {
    let mac = signer.sign_bytes(value.as_bytes())?;
    Ok(URL_SAFE_NO_PAD.encode(mac))
}

// The encoded forms are compared: distinct base64 strings never pass even
// when they would decode to the same bytes.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && memcmp::eq(a, b)
}

fn random_value() -> CResult<String> {
    let mut value = String::with_capacity(VALUE_LENGTH);
    let mut buffer = Zeroizing::new([0_u8; 64]);
    while value.len() < VALUE_LENGTH {
        rand_bytes(&mut buffer[..])?;
        for byte in buffer.iter().copied() {
            if value.len() == VALUE_LENGTH {
                break;
            }
            if byte < REJECTION_THRESHOLD {
                value.push(char::from(ALPHABET[usize::from(byte % 62)]));
            }
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

    use super::{
        PERSONAL_ACCESS_TOKEN_PREFIX, PersonalAccessToken, VALUE_LENGTH, constant_time_eq,
        hash_value,
    };
    use crate::{
        error::{CredentialError, MalformedReason},
        test_utils::{hs256_signer, rs256_signer, rsa_key},
    };

    #[test]
    fn test_generate_and_parse() {
        let signer = hs256_signer(b"pat-secret");
        let token = PersonalAccessToken::generate(Some(&signer)).unwrap();
        let wire = token.to_string();

        assert!(wire.starts_with(PERSONAL_ACCESS_TOKEN_PREFIX));
        assert_eq!(token.value().len(), VALUE_LENGTH);
        assert!(token.value().bytes().all(|b| b.is_ascii_alphanumeric()));
        // 32 bytes of HMAC, unpadded base64url
        assert_eq!(token.signature().len(), 43);

        let parsed = PersonalAccessToken::parse(&wire, &signer).unwrap();
        assert_eq!(parsed, token);
        assert_eq!(parsed.signature(), token.signature());
        assert_eq!(parsed.value(), token.value());
    }

    #[test]
    fn test_values_are_distinct() {
        let signer = hs256_signer(b"pat-secret");
        let values: HashSet<String> = (0..50)
            .map(|_| {
                PersonalAccessToken::generate(Some(&signer))
                    .unwrap()
                    .value()
                    .to_owned()
            })
            .collect();
        assert_eq!(values.len(), 50);
    }

    #[test]
    fn test_single_character_tamper_is_detected() {
        let signer = hs256_signer(b"pat-secret");
        let wire = PersonalAccessToken::generate(Some(&signer))
            .unwrap()
            .to_string();

        for position in PERSONAL_ACCESS_TOKEN_PREFIX.len()..wire.len() {
            let original = wire.as_bytes()[position];
            if original == b'.' {
                continue;
            }
            let replacement = if original == b'a' { b'b' } else { b'a' };
            let mut tampered = wire.clone().into_bytes();
            tampered[position] = replacement;
            let tampered = String::from_utf8(tampered).unwrap();

            assert!(
                matches!(
                    PersonalAccessToken::parse(&tampered, &signer),
                    Err(CredentialError::SignatureMismatch(_))
                ),
                "tampering at position {position} went unnoticed"
            );
        }

        // a separator in place of the first signature character leaves it empty
        let signature_start = PERSONAL_ACCESS_TOKEN_PREFIX.len();
        let mut tampered = wire.into_bytes();
        tampered[signature_start] = b'.';
        let tampered = String::from_utf8(tampered).unwrap();
        assert!(matches!(
            PersonalAccessToken::parse(&tampered, &signer),
            Err(CredentialError::MalformedToken(MalformedReason::EmptySignature))
        ));
    }

    #[test]
    fn test_different_secret_is_rejected() {
        let token = PersonalAccessToken::generate(Some(&hs256_signer(b"pat-secret"))).unwrap();
        assert!(matches!(
            PersonalAccessToken::parse(&token.to_string(), &hs256_signer(b"other-secret")),
            Err(CredentialError::SignatureMismatch(_))
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        let signer = hs256_signer(b"pat-secret");
        let cases = [
            ("", MalformedReason::Empty),
            ("gitpod_yolo_fooo", MalformedReason::MissingPrefix),
            ("gitpod_pat_foo", MalformedReason::MissingSeparator),
            ("gitpod_pat_.value", MalformedReason::EmptySignature),
            ("gitpod_pat_signature.", MalformedReason::EmptyValue),
        ];
        for (input, reason) in cases {
            assert_eq!(
                PersonalAccessToken::parse(input, &signer).unwrap_err(),
                CredentialError::MalformedToken(reason),
                "input: {input:?}"
            );
        }
        assert!(matches!(
            PersonalAccessToken::parse("gitpod_pat_signature.value", &signer),
            Err(CredentialError::SignatureMismatch(_))
        ));
    }

    #[test]
    fn test_known_token_parses() {
        let signer = hs256_signer(b"secret");
        let value = "6ZDQVanpaTKj9hQuji0thCe8KFCcmEDGpsaTkSSb";
        let signature = URL_SAFE_NO_PAD.encode(signer.sign_bytes(value.as_bytes()).unwrap());
        let wire = format!("{PERSONAL_ACCESS_TOKEN_PREFIX}{signature}.{value}");
        let token = PersonalAccessToken::parse(&wire, &signer).unwrap();
        assert_eq!(token.value(), value);
        assert_eq!(token.to_string(), wire);
    }

    #[test]
    fn test_value_hash() {
        let signer = hs256_signer(b"pat-secret");
        let token = PersonalAccessToken::generate(Some(&signer)).unwrap();
        let parsed = PersonalAccessToken::parse(&token.to_string(), &signer).unwrap();

        assert_eq!(token.value_hash(), parsed.value_hash());
        assert_eq!(token.value_hash(), hash_value(token.value()));
        assert_eq!(token.value_hash().len(), 64);
        assert_eq!(
            hash_value("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(hash_value("abc"), hash_value("abd"));
    }

    #[test]
    fn test_signer_required() {
        assert!(matches!(
            PersonalAccessToken::generate(None),
            Err(CredentialError::ConfigError(_))
        ));
        let rs256 = rs256_signer(rsa_key("k1"), vec![]);
        assert!(matches!(
            PersonalAccessToken::generate(Some(&rs256)),
            Err(CredentialError::ConfigError(_))
        ));
    }

    #[test]
    fn test_debug_redacts_value() {
        let signer = hs256_signer(b"pat-secret");
        let token = PersonalAccessToken::generate(Some(&signer)).unwrap();
        assert!(!format!("{token:?}").contains(token.value()));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }
}
