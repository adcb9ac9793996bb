//! Tests for users API handlers.

use super::*;
use crate::domain::ports::{
    MockAccountService, MockQuestionsCommand, MockQuestionsQuery, MockUsersQuery,
};
use crate::domain::{Error, UserId};
use crate::inbound::http::state::HttpStatePorts;
use crate::middleware::ACCESS_TOKEN_COOKIE;
use actix_web::cookie::Key;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[fixture]
fn issuer() -> TokenIssuer {
    TokenIssuer::new(b"users-secret", Duration::from_secs(3600), Arc::new(DefaultClock))
}

fn registering_accounts() -> MockAccountService {
    let mut accounts = MockAccountService::new();
    accounts.expect_register().returning(|account| {
        Ok(User::new(
            UserId::random(),
            account.username().clone(),
            account.email().clone(),
        ))
    });
    accounts
}

async fn app(
    accounts: MockAccountService,
    issuer: TokenIssuer,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    let state = HttpState::new(HttpStatePorts {
        accounts: Arc::new(accounts),
        users: Arc::new(MockUsersQuery::new()),
        questions: Arc::new(MockQuestionsQuery::new()),
        question_commands: Arc::new(MockQuestionsCommand::new()),
    });
    actix_test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .app_data(web::Data::new(issuer))
            .app_data(web::Data::new(CookieSigner::new(Key::generate(), false)))
            .configure(configure),
    )
    .await
}

fn signup_request(confirm: &str) -> SignupRequest {
    SignupRequest {
        username: "ada".into(),
        email: "ada@example.com".into(),
        password: "correct horse".into(),
        confirm_password: confirm.into(),
    }
}

async fn json_body(response: ServiceResponse) -> Value {
    let body = actix_test::read_body(response).await;
    serde_json::from_slice(&body).expect("json body")
}

#[rstest]
#[actix_web::test]
async fn signup_issues_a_verifiable_token(issuer: TokenIssuer) {
    let app = app(registering_accounts(), issuer.clone()).await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/users")
            .set_json(signup_request("correct horse"))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == ACCESS_TOKEN_COOKIE)
        .expect("access cookie")
        .into_owned();
    assert!(cookie.http_only().unwrap_or(false));

    let body: TokenResponse = serde_json::from_value(json_body(response).await).expect("shape");
    assert_ne!(cookie.value(), body.token, "cookie value is signed");
    let identity = issuer.verify(&body.token).expect("token verifies");
    assert_eq!(identity.username().as_ref(), "ada");
    assert_eq!(body.user.email().as_ref(), "ada@example.com");
}

#[rstest]
#[actix_web::test]
async fn signup_accepts_form_bodies(issuer: TokenIssuer) {
    let app = app(registering_accounts(), issuer).await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/users")
            .set_form(signup_request("correct horse"))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[rstest]
#[actix_web::test]
async fn signup_reports_every_invalid_field(issuer: TokenIssuer) {
    let mut accounts = MockAccountService::new();
    accounts.expect_register().never();
    let app = app(accounts, issuer).await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/users")
            .set_json(SignupRequest {
                username: String::new(),
                email: "nope".into(),
                password: "short".into(),
                confirm_password: "other".into(),
            })
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value = json_body(response).await;
    assert_eq!(value["title"], "Bad request.");
    let fields: Vec<&str> = value["errors"]
        .as_array()
        .expect("errors array")
        .iter()
        .filter_map(|error| error["field"].as_str())
        .collect();
    assert_eq!(fields, ["username", "email", "password", "confirmPassword"]);
}

#[rstest]
#[case("", "pw", "email")]
#[case("ada@example.com", "", "password")]
#[actix_web::test]
async fn login_validates_fields(
    issuer: TokenIssuer,
    #[case] email: &str,
    #[case] password: &str,
    #[case] field: &str,
) {
    let app = app(MockAccountService::new(), issuer).await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/users/token")
            .set_json(LoginRequest {
                email: email.into(),
                password: password.into(),
            })
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value = json_body(response).await;
    assert_eq!(value["errors"][0]["field"], field);
}

#[rstest]
#[actix_web::test]
async fn login_rejects_bad_credentials(issuer: TokenIssuer) {
    let mut accounts = MockAccountService::new();
    accounts
        .expect_authenticate()
        .returning(|_| Err(Error::unauthorized("The provided credentials were invalid.")));
    let app = app(accounts, issuer).await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/users/token")
            .set_form([("email", "ada@example.com"), ("password", "wrong password")])
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(
        response
            .response()
            .cookies()
            .all(|cookie| cookie.name() != ACCESS_TOKEN_COOKIE)
    );
}

#[rstest]
#[actix_web::test]
async fn login_returns_token_for_valid_credentials(issuer: TokenIssuer) {
    let mut accounts = MockAccountService::new();
    accounts
        .expect_authenticate()
        .withf(|credentials| credentials.email().as_ref() == "ada@example.com")
        .returning(|credentials| {
            Ok(User::new(
                UserId::random(),
                crate::domain::Username::new("ada").expect("username"),
                credentials.email().clone(),
            ))
        });
    let app = app(accounts, issuer.clone()).await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/users/token")
            .set_json(LoginRequest {
                email: "ada@example.com".into(),
                password: "correct horse".into(),
            })
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: TokenResponse = serde_json::from_value(json_body(response).await).expect("shape");
    assert!(issuer.verify(&body.token).is_ok());
}

#[rstest]
#[actix_web::test]
async fn logout_expires_the_cookie(issuer: TokenIssuer) {
    let app = app(MockAccountService::new(), issuer).await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post().uri("/users/logout").to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookie = response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == ACCESS_TOKEN_COOKIE)
        .expect("removal cookie")
        .into_owned();
    assert_eq!(cookie.value(), "");
    assert_eq!(
        cookie.max_age(),
        Some(actix_web::cookie::time::Duration::ZERO)
    );
}
