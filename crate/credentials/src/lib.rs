pub mod context;
pub mod credentials;
mod error;
pub mod jws;
pub mod keys;
pub mod pat;
pub mod store;
pub mod tokens;

pub use context::AuthToken;
pub use credentials::{Credentials, MAX_SESSION_LIFETIME_SECS};
pub use error::{
    CredentialError, MalformedReason,
    result::{CResult, CResultHelper},
};
pub use jws::{
    ExpectedClaims, HmacSecret, SessionClaims, SessionSigner, SigningAlgorithm, VerifyOptions,
};
pub use keys::{Key, KeyPath, KeySet};
pub use pat::{PERSONAL_ACCESS_TOKEN_PREFIX, PersonalAccessToken};
pub use store::{InMemoryTokenStore, PersonalAccessTokenRecord, TokenStore};
pub use tokens::{CreateToken, PersonalAccessTokens};

#[cfg(test)]
mod test_utils;
