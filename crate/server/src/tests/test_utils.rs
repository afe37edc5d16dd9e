#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use actix_http::Request;
use actix_web::{
    App,
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::{
        StatusCode,
        header::{AUTHORIZATION, COOKIE},
    },
    test::{self, TestRequest, call_service, read_body},
    web::Data,
};
use chrono::Duration;
use openssl::{rand::rand_bytes, rsa::Rsa};
use serde::{Serialize, de::DeserializeOwned};
use tempfile::TempDir;
use warden_credentials::{Credentials, KeyPath, KeySet, SessionSigner};
use warden_logger::log_init;

use crate::{
    config::{ClapConfig, KeysConfig, ServerParams, SessionConfig},
    core::Warden,
    routes,
};

pub(crate) const TEST_USER: &str = "user-1";

/// Key material written to a temporary directory, removed on drop.
pub(crate) struct TestKeys {
    _dir: TempDir,
    /// `k1`, the current signing key
    pub signing: PathBuf,
    /// `k0`, the previous signing key, still validating
    pub previous: PathBuf,
    /// `k2`, a key the server knows nothing about
    pub foreign: PathBuf,
    pub pat_secret: PathBuf,
}

fn write_rsa_key(dir: &Path, name: &str) -> PathBuf {
    let pem = Rsa::generate(2048)
        .and_then(|rsa| rsa.private_key_to_pem())
        .expect("RSA key generation should succeed");
    let path = dir.join(name);
    fs::write(&path, pem).unwrap();
    path
}

pub(crate) fn test_keys() -> TestKeys {
    let dir = TempDir::new().unwrap();
    let signing = write_rsa_key(dir.path(), "k1.pem");
    let previous = write_rsa_key(dir.path(), "k0.pem");
    let foreign = write_rsa_key(dir.path(), "k2.pem");

    let mut secret = [0_u8; 32];
    rand_bytes(&mut secret).unwrap();
    let pat_secret = dir.path().join("pat.secret");
    fs::write(&pat_secret, secret).unwrap();

    TestKeys {
        _dir: dir,
        signing,
        previous,
        foreign,
        pat_secret,
    }
}

pub(crate) fn key_path(id: &str, path: &Path) -> String {
    format!("{id}={}", path.display())
}

pub(crate) fn test_clap_config(keys: &TestKeys) -> ClapConfig {
    ClapConfig {
        keys: KeysConfig {
            signing_key: Some(key_path("k1", &keys.signing)),
            validating_keys: vec![key_path("k0", &keys.previous)],
            pat_secret_file: Some(keys.pat_secret.clone()),
            pat_use_signing_key: false,
        },
        ..Default::default()
    }
}

pub(crate) fn test_warden(clap_config: ClapConfig) -> Arc<Warden> {
    log_init(option_env!("RUST_LOG"), false);
    let params = ServerParams::try_from(clap_config).expect("cannot create server params");
    Arc::new(Warden::instantiate(Arc::new(params)))
}

/// Credentials signing with a single key, to forge tokens the server may or
/// may not accept.
pub(crate) fn credentials_signing_with(id: &str, path: &Path) -> Credentials {
    let key_set = KeySet::load(&key_path(id, path).parse::<KeyPath>().unwrap(), &[]).unwrap();
    Credentials::new(
        &SessionConfig::default().issuer,
        Duration::hours(1),
        Some(SessionSigner::Rs256(Arc::new(key_set))),
        None,
    )
    .unwrap()
}

pub(crate) async fn test_app(
    warden: Arc<Warden>,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(Data::new(warden))
            .configure(routes::configure),
    )
    .await
}

/// A session token for `user_id` signed by the server.
pub(crate) fn session_token(warden: &Warden, user_id: &str) -> String {
    warden
        .credentials()
        .issue_session_token(user_id)
        .unwrap()
        .0
}

pub(crate) fn bearer(request: TestRequest, token: &str) -> TestRequest {
    request.insert_header((AUTHORIZATION, format!("Bearer {token}")))
}

pub(crate) fn cookie(request: TestRequest, cookie: &str) -> TestRequest {
    request.insert_header((COOKIE, cookie.to_owned()))
}

/// Send a request and return its status and body.
pub(crate) async fn send<S, B>(app: &S, request: TestRequest) -> (StatusCode, String)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = call_service(app, request.to_request()).await;
    let status = res.status();
    let body = read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

/// Send a request expected to succeed and deserialize its JSON body.
pub(crate) async fn send_json<S, B, R>(app: &S, request: TestRequest) -> R
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
    R: DeserializeOwned,
{
    let (status, body) = send(app, request).await;
    assert!(status.is_success(), "{status}: {body}");
    serde_json::from_str(&body).unwrap()
}

pub(crate) fn json_post<O: Serialize>(uri: &str, data: &O) -> TestRequest {
    TestRequest::post().uri(uri).set_json(data)
}
