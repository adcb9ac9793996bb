//! Users API handlers.
//!
//! ```text
//! POST /users        {"username":"ada","email":"ada@example.com","password":"…","confirmPassword":"…"}
//! POST /users/token  {"email":"ada@example.com","password":"…"}
//! POST /users/logout
//! ```
//!
//! Bodies may be JSON or URL-encoded so the signup and login forms post
//! straight to these routes. Successful signup and login set the signed
//! `access_token` cookie and also return the token for API clients.

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    Error, LoginCredentials, LoginValidationError, NewAccount, SignupValidationError, User,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::token::TokenIssuer;
use crate::middleware::CookieSigner;

const BAD_REQUEST_TITLE: &str = "Bad request.";

/// Signup body for `POST /users`.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Login body for `POST /users/token`.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body returned by signup and login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub user: User,
}

type Body<T> = web::Either<web::Json<T>, web::Form<T>>;

fn into_inner<T>(body: Body<T>) -> T {
    match body {
        web::Either::Left(json) => json.into_inner(),
        web::Either::Right(form) => form.into_inner(),
    }
}

fn map_signup_validation_error(err: SignupValidationError) -> Error {
    Error::invalid_request(err.to_string())
        .with_title(BAD_REQUEST_TITLE)
        .with_details(json!(err.fields()))
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    let field = match err {
        LoginValidationError::InvalidEmail => "email",
        LoginValidationError::EmptyPassword => "password",
    };
    Error::invalid_request(err.to_string())
        .with_title(BAD_REQUEST_TITLE)
        .with_details(json!([{ "field": field, "message": err.to_string() }]))
}

fn cookie_max_age(issuer: &TokenIssuer) -> CookieDuration {
    CookieDuration::seconds(i64::try_from(issuer.ttl().as_secs()).unwrap_or(i64::MAX))
}

fn issue(
    status: actix_web::http::StatusCode,
    user: User,
    issuer: &TokenIssuer,
    signer: &CookieSigner,
) -> ApiResult<HttpResponse> {
    let token = issuer.issue(&user)?;
    let cookie = signer.access_cookie(token.clone(), cookie_max_age(issuer));
    Ok(HttpResponse::build(status)
        .cookie(cookie)
        .json(TokenResponse { token, user }))
}

/// Register a new account and sign it in.
#[post("/users")]
pub async fn signup(
    state: web::Data<HttpState>,
    issuer: web::Data<TokenIssuer>,
    signer: web::Data<CookieSigner>,
    payload: Body<SignupRequest>,
) -> ApiResult<HttpResponse> {
    let request = into_inner(payload);
    let account = NewAccount::try_from_parts(
        &request.username,
        &request.email,
        &request.password,
        &request.confirm_password,
    )
    .map_err(map_signup_validation_error)?;
    let user = state.accounts.register(account).await?;
    issue(
        actix_web::http::StatusCode::CREATED,
        user,
        &issuer,
        &signer,
    )
}

/// Exchange email and password for an access token.
#[post("/users/token")]
pub async fn login(
    state: web::Data<HttpState>,
    issuer: web::Data<TokenIssuer>,
    signer: web::Data<CookieSigner>,
    payload: Body<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let request = into_inner(payload);
    let credentials = LoginCredentials::try_from_parts(&request.email, &request.password)
        .map_err(map_login_validation_error)?;
    let user = state.accounts.authenticate(&credentials).await?;
    issue(actix_web::http::StatusCode::OK, user, &issuer, &signer)
}

/// Clear the access cookie.
#[post("/users/logout")]
pub async fn logout(signer: web::Data<CookieSigner>) -> HttpResponse {
    HttpResponse::NoContent()
        .cookie(signer.removal_cookie())
        .finish()
}

/// Register the users API.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(signup).service(login).service(logout);
}

#[cfg(test)]
mod tests;
