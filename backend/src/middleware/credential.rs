//! Access-credential extraction.
//!
//! Reads the signed `access_token` cookie, falling back to an
//! `Authorization: Bearer` header and then an `access_token` query
//! parameter, and stores the raw token in request extensions as a
//! [`Credential`]. Nothing here decodes the token; a cookie
//! whose signature does not verify is simply ignored.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::cookie::{Cookie, CookieJar, Key, SameSite, time::Duration as CookieDuration};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use actix_web::{Error, HttpMessage};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::debug;

/// Name of the cookie carrying the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Raw access token presented with the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Signs and verifies the `access_token` cookie.
#[derive(Clone)]
pub struct CookieSigner {
    key: Key,
    secure: bool,
}

impl CookieSigner {
    /// Build a signer with the session signing key.
    pub fn new(key: Key, secure: bool) -> Self {
        Self { key, secure }
    }

    /// Signed, HTTP-only cookie holding `token`.
    ///
    /// # Examples
    /// ```
    /// use actix_web::cookie::{Key, time::Duration};
    /// use coredump::middleware::CookieSigner;
    ///
    /// let signer = CookieSigner::new(Key::generate(), false);
    /// let cookie = signer.access_cookie("abc".to_owned(), Duration::minutes(5));
    /// assert_ne!(cookie.value(), "abc");
    /// assert_eq!(signer.verify(&cookie).as_deref(), Some("abc"));
    /// ```
    pub fn access_cookie(&self, token: String, max_age: CookieDuration) -> Cookie<'static> {
        let cookie = Cookie::build(ACCESS_TOKEN_COOKIE, token)
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(max_age)
            .finish();
        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key).add(cookie);
        jar.get(ACCESS_TOKEN_COOKIE)
            .cloned()
            .unwrap_or_else(|| Cookie::new(ACCESS_TOKEN_COOKIE, ""))
    }

    /// Expired cookie that clears `access_token` in the browser.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(ACCESS_TOKEN_COOKIE, "")
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .finish();
        cookie.make_removal();
        cookie
    }

    /// Verified value of a signed cookie, if the signature holds.
    pub fn verify(&self, cookie: &Cookie<'_>) -> Option<String> {
        let mut jar = CookieJar::new();
        jar.add_original(cookie.clone().into_owned());
        jar.signed(&self.key)
            .get(cookie.name())
            .map(|verified| verified.value().to_owned())
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_owned())
}

fn query_token(query: &str) -> Option<String> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).ok()?;
    pairs
        .into_iter()
        .find(|(name, value)| name == ACCESS_TOKEN_COOKIE && !value.is_empty())
        .map(|(_, value)| value)
}

fn extract(req: &ServiceRequest, signer: &CookieSigner) -> Option<Credential> {
    if let Some(cookie) = req.cookie(ACCESS_TOKEN_COOKIE) {
        match signer.verify(&cookie) {
            Some(token) if !token.is_empty() => return Some(Credential(token)),
            Some(_) => {}
            None => debug!("access_token cookie failed signature check"),
        }
    }
    bearer_token(req.headers())
        .or_else(|| query_token(req.query_string()))
        .map(Credential)
}

/// Middleware attaching a [`Credential`] to requests that carry one.
#[derive(Clone)]
pub struct BearerCredential {
    signer: Rc<CookieSigner>,
}

impl BearerCredential {
    /// Extract credentials verified with `signer`.
    pub fn new(signer: CookieSigner) -> Self {
        Self {
            signer: Rc::new(signer),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerCredential
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerCredentialMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerCredentialMiddleware {
            service,
            signer: Rc::clone(&self.signer),
        }))
    }
}

/// Service wrapper produced by [`BearerCredential`].
pub struct BearerCredentialMiddleware<S> {
    service: S,
    signer: Rc<CookieSigner>,
}

impl<S, B> Service<ServiceRequest> for BearerCredentialMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some(credential) = extract(&req, &self.signer) {
            req.extensions_mut().insert(credential);
        }
        Box::pin(self.service.call(req))
    }
}
