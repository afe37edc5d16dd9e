use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use openssl::rsa::Rsa;

use crate::{
    jws::{HmacSecret, SessionSigner},
    keys::{Key, KeySet},
};

pub(crate) fn rsa_private_key_pem() -> Vec<u8> {
    Rsa::generate(2048)
        .and_then(|rsa| rsa.private_key_to_pem())
        .expect("RSA key generation should succeed")
}

pub(crate) fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("temporary file should be writable");
    path
}

pub(crate) fn write_rsa_key(dir: &Path, name: &str) -> PathBuf {
    write_file(dir, name, &rsa_private_key_pem())
}

pub(crate) fn rsa_key(id: &str) -> Key {
    Key::from_pem(id, rsa_private_key_pem()).expect("generated key should parse")
}

pub(crate) fn rs256_signer(signing: Key, validating: Vec<Key>) -> SessionSigner {
    SessionSigner::Rs256(Arc::new(
        KeySet::new(signing, validating).expect("key IDs should be unique"),
    ))
}

pub(crate) fn hs256_signer(secret: &[u8]) -> SessionSigner {
    SessionSigner::Hs256(HmacSecret::new(secret.to_vec()).expect("secret should not be empty"))
}
