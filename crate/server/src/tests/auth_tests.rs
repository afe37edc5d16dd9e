#![allow(clippy::unwrap_used)]

use actix_web::{
    App, HttpResponse,
    http::StatusCode,
    test::{self, TestRequest},
    web::{self, Bytes},
};
use chrono::{Duration, Utc};
use warden_client::types::{CredentialKind, HealthResponse, SessionResponse, WhoAmIResponse};
use warden_credentials::AuthToken;

use super::test_utils::{
    TEST_USER, bearer, cookie, credentials_signing_with, send, send_json, session_token,
    test_app, test_clap_config, test_keys, test_warden,
};
use crate::middlewares::{AuthTransformer, RequestToken};

#[actix_web::test]
async fn test_health_needs_no_credential() {
    let keys = test_keys();
    let app = test_app(test_warden(test_clap_config(&keys))).await;

    let health: HealthResponse = send_json(&app, TestRequest::get().uri("/health")).await;
    assert_eq!(health.status, "UP");
}

#[actix_web::test]
async fn test_missing_credential() {
    let keys = test_keys();
    let app = test_app(test_warden(test_clap_config(&keys))).await;

    let (status, body) = send(&app, TestRequest::get().uri("/api/whoami")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("No access token"), "{body}");

    // a scheme other than bearer is not a credential
    let (status, _) = send(
        &app,
        TestRequest::get()
            .uri("/api/whoami")
            .insert_header(("authorization", "Basic dXNlcjpwYXNz")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_bearer_session_token() {
    let keys = test_keys();
    let warden = test_warden(test_clap_config(&keys));
    let token = session_token(&warden, TEST_USER);
    let app = test_app(warden).await;

    let whoami: WhoAmIResponse =
        send_json(&app, bearer(TestRequest::get().uri("/api/whoami"), &token)).await;
    assert_eq!(whoami.user_id, TEST_USER);
    assert_eq!(whoami.credential, CredentialKind::SessionToken);
}

#[actix_web::test]
async fn test_session_cookie() {
    let keys = test_keys();
    let warden = test_warden(test_clap_config(&keys));
    let token = session_token(&warden, TEST_USER);
    let app = test_app(warden).await;

    let whoami: WhoAmIResponse = send_json(
        &app,
        cookie(
            TestRequest::get().uri("/api/whoami"),
            &format!("theme=dark; _warden_session={token}"),
        ),
    )
    .await;
    assert_eq!(whoami.user_id, TEST_USER);
    assert_eq!(whoami.credential, CredentialKind::SessionCookie);

    // cookies, but not the session one
    let (status, body) = send(
        &app,
        cookie(TestRequest::get().uri("/api/whoami"), "theme=dark"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("_warden_session"), "{body}");
}

#[actix_web::test]
async fn test_bearer_takes_precedence_over_cookie() {
    let keys = test_keys();
    let warden = test_warden(test_clap_config(&keys));
    let token = session_token(&warden, TEST_USER);
    let app = test_app(warden).await;

    let request = cookie(
        bearer(TestRequest::get().uri("/api/whoami"), "not-a-jwt"),
        &format!("_warden_session={token}"),
    );
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_expired_session_token() {
    let keys = test_keys();
    let warden = test_warden(test_clap_config(&keys));
    let (token, _) = warden
        .credentials()
        .issue_session_token_at(TEST_USER, Utc::now() - Duration::hours(2))
        .unwrap();
    let app = test_app(warden).await;

    let (status, body) = send(&app, bearer(TestRequest::get().uri("/api/whoami"), &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("expired"), "{body}");
}

#[actix_web::test]
async fn test_tampered_session_token() {
    let keys = test_keys();
    let warden = test_warden(test_clap_config(&keys));
    let token = session_token(&warden, TEST_USER);
    let app = test_app(warden).await;

    let mut tampered = token.into_bytes();
    let index = tampered.len() - 10;
    tampered[index] = if tampered[index] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered).unwrap();

    let (status, _) = send(
        &app,
        bearer(TestRequest::get().uri("/api/whoami"), &tampered),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_rotated_keys() {
    let keys = test_keys();
    let app = test_app(test_warden(test_clap_config(&keys))).await;

    // signed before the rotation, with the key now only validating
    let (token, _) = credentials_signing_with("k0", &keys.previous)
        .issue_session_token(TEST_USER)
        .unwrap();
    let whoami: WhoAmIResponse =
        send_json(&app, bearer(TestRequest::get().uri("/api/whoami"), &token)).await;
    assert_eq!(whoami.user_id, TEST_USER);

    // unknown key ID
    let (token, _) = credentials_signing_with("k2", &keys.foreign)
        .issue_session_token(TEST_USER)
        .unwrap();
    let (status, _) = send(&app, bearer(TestRequest::get().uri("/api/whoami"), &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // known key ID, wrong key
    let (token, _) = credentials_signing_with("k0", &keys.foreign)
        .issue_session_token(TEST_USER)
        .unwrap();
    let (status, _) = send(&app, bearer(TestRequest::get().uri("/api/whoami"), &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_session_exchange() {
    let keys = test_keys();
    let warden = test_warden(test_clap_config(&keys));
    let token = session_token(&warden, TEST_USER);
    let app = test_app(warden.clone()).await;

    let session: SessionResponse =
        send_json(&app, bearer(TestRequest::post().uri("/api/session"), &token)).await;
    assert!(session.expires_at > Utc::now());

    let claims = warden
        .credentials()
        .verify_session_token(&session.token)
        .unwrap();
    assert_eq!(claims.sub, TEST_USER);
    assert_eq!(claims.iss, warden.credentials().issuer());
}

async fn streaming_whoami(token: RequestToken) -> HttpResponse {
    let kind = match token.0 {
        AuthToken::AccessToken(_) => "bearer",
        AuthToken::CookieToken(_) => "cookie",
    };
    let chunks =
        ["credential", ": ", kind].map(|chunk| Ok::<_, std::io::Error>(Bytes::from(chunk)));
    HttpResponse::Ok().streaming(futures::stream::iter(chunks))
}

#[actix_web::test]
async fn test_streaming_responses_are_guarded() {
    let app = test::init_service(
        App::new().service(
            web::scope("/stream")
                .wrap(AuthTransformer::new())
                .route("", web::get().to(streaming_whoami)),
        ),
    )
    .await;

    let (status, _) = send(&app, TestRequest::get().uri("/stream")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, bearer(TestRequest::get().uri("/stream"), "abc")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "credential: bearer");

    let (status, body) = send(&app, cookie(TestRequest::get().uri("/stream"), "a=b")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "credential: cookie");
}
