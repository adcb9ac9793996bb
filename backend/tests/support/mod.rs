//! Shared helpers for backend integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`; this
//! module builds the production `App` over an in-memory store and offers a
//! few request helpers on top of `actix_web::test`.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use actix_web::cookie::{Cookie, Key, SameSite};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::test as actix_test;
use coredump::inbound::http::session_config::SessionSettings;
use coredump::middleware::ACCESS_TOKEN_COOKIE;
use coredump::outbound::MemoryStore;
use coredump::server::{AppDependencies, SESSION_COOKIE, ServerConfig, build_app};
use coredump::settings::Environment;
use mockable::DefaultClock;
use serde_json::{Value, json};

pub const TOKEN_SECRET: &[u8] = b"integration-token-secret";
pub const PASSWORD: &str = "correct horse battery";

/// Dependencies for `environment` over an empty store.
pub fn dependencies(environment: Environment) -> AppDependencies {
    let config = ServerConfig::new(SessionSettings {
        key: Key::generate(),
        cookie_secure: false,
        same_site: SameSite::Lax,
    })
    .with_environment(environment)
    .with_public_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/public"))
    .with_token(TOKEN_SECRET, Duration::from_secs(3600))
    .with_body_limit(16 * 1024);
    AppDependencies::new(
        config,
        MemoryStore::new(Arc::new(DefaultClock)),
        Arc::new(DefaultClock),
    )
    .expect("app dependencies")
}

/// Initialise the full application.
pub async fn app(
    deps: AppDependencies,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    actix_test::init_service(build_app(deps)).await
}

/// Cookie named `name` set by `res`, if any.
pub fn cookie_named(res: &ServiceResponse, name: &str) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == name)
        .map(Cookie::into_owned)
}

pub async fn body_text(res: ServiceResponse) -> String {
    String::from_utf8(actix_test::read_body(res).await.to_vec()).expect("utf8 body")
}

pub async fn body_json(res: ServiceResponse) -> Value {
    serde_json::from_slice(&actix_test::read_body(res).await).expect("json body")
}

/// Signed-in member: the API token and the signed cookie carrying it.
pub struct Member {
    pub token: String,
    pub cookie: Cookie<'static>,
}

/// Register `username` through `POST /users`.
pub async fn sign_up<S>(app: &S, username: &str) -> Member
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri("/users")
            .set_json(json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": PASSWORD,
                "confirmPassword": PASSWORD,
            }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), actix_web::http::StatusCode::CREATED);
    let cookie = cookie_named(&res, ACCESS_TOKEN_COOKIE).expect("access cookie");
    let body = body_json(res).await;
    let token = body["token"].as_str().expect("token").to_owned();
    Member { token, cookie }
}

/// Render `/postQuestion` for `member`, returning the session cookie and the
/// embedded CSRF token.
pub async fn ask_form<S>(app: &S, member: &Member) -> (Cookie<'static>, String)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = actix_test::call_service(
        app,
        actix_test::TestRequest::get()
            .uri("/postQuestion")
            .cookie(member.cookie.clone())
            .to_request(),
    )
    .await;
    assert!(res.status().is_success());
    let session = cookie_named(&res, SESSION_COOKIE).expect("session cookie");
    let html = body_text(res).await;
    (session, csrf_token(&html))
}

/// Token embedded in the hidden `_csrf` field.
pub fn csrf_token(html: &str) -> String {
    let marker = r#"name="_csrf" value=""#;
    let start = html.find(marker).expect("csrf field") + marker.len();
    let rest = &html[start..];
    let end = rest.find('"').expect("closing quote");
    rest[..end].to_owned()
}
