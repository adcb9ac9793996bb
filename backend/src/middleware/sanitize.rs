//! Request body HTML sanitisation.
//!
//! JSON and URL-encoded bodies are buffered, every string value is passed
//! through an [`ammonia`] allow-list, and the rewritten body replaces the
//! original payload before handlers see it. Other content types stream
//! through untouched. Bodies that fail to parse are forwarded unchanged so the
//! handler's own extractor reports the error.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{CONTENT_LENGTH, HeaderValue};
use actix_web::web::{Bytes, BytesMut};
use actix_web::{Error, HttpMessage};
use ammonia::Builder;
use futures_util::StreamExt;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use serde_json::Value;
use tracing::debug;

use crate::domain::Error as DomainError;

/// Tags that survive sanitisation.
pub const ALLOWED_TAGS: [&str; 15] = [
    "u", "b", "i", "em", "strong", "a", "code", "p", "h1", "h2", "h3", "h4", "ul", "li", "ol",
];

/// Allow-list applied to user-submitted HTML.
///
/// Only `href` on `a` is kept as an attribute. Content of `script` and
/// `style` is dropped along with the element; other disallowed elements are
/// unwrapped and their text kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizerPolicy {
    tags: HashSet<&'static str>,
    tag_attributes: HashMap<&'static str, HashSet<&'static str>>,
}

impl Default for SanitizerPolicy {
    fn default() -> Self {
        Self {
            tags: ALLOWED_TAGS.into_iter().collect(),
            tag_attributes: HashMap::from([("a", HashSet::from(["href"]))]),
        }
    }
}

impl SanitizerPolicy {
    /// Build the cleaner for this policy.
    pub fn build(&self) -> Sanitizer {
        let mut builder = Builder::default();
        builder
            .tags(self.tags.clone())
            .tag_attributes(self.tag_attributes.clone())
            .generic_attributes(HashSet::new())
            .link_rel(None);
        Sanitizer { builder }
    }
}

/// Cleaner produced by [`SanitizerPolicy::build`].
pub struct Sanitizer {
    builder: Builder<'static>,
}

impl Sanitizer {
    /// Clean one string.
    ///
    /// # Examples
    /// ```
    /// use coredump::middleware::SanitizerPolicy;
    ///
    /// let sanitizer = SanitizerPolicy::default().build();
    /// assert_eq!(sanitizer.clean("<b>hi</b><script>x()</script>"), "<b>hi</b>");
    /// ```
    pub fn clean(&self, text: &str) -> String {
        self.builder.clean(text).to_string()
    }

    /// Clean every string inside a JSON document; keys are left alone.
    pub fn clean_json(&self, value: Value) -> Value {
        match value {
            Value::String(text) => Value::String(self.clean(&text)),
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|item| self.clean_json(item)).collect())
            }
            Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(key, field)| (key, self.clean_json(field)))
                    .collect(),
            ),
            other => other,
        }
    }

    /// Clean the values of a URL-encoded form, or `None` if it does not parse.
    pub fn clean_form(&self, body: &[u8]) -> Option<String> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body).ok()?;
        let cleaned: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(key, value)| (key, self.clean(&value)))
            .collect();
        serde_urlencoded::to_string(cleaned).ok()
    }

    fn rewrite(&self, kind: BodyKind, body: &[u8]) -> Option<Vec<u8>> {
        match kind {
            BodyKind::Json => {
                let value: Value = serde_json::from_slice(body).ok()?;
                serde_json::to_vec(&self.clean_json(value)).ok()
            }
            BodyKind::Form => self.clean_form(body).map(String::into_bytes),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum BodyKind {
    Json,
    Form,
}

fn body_kind(req: &ServiceRequest) -> Option<BodyKind> {
    let content_type = req.content_type().to_ascii_lowercase();
    if content_type == "application/json" || content_type.ends_with("+json") {
        Some(BodyKind::Json)
    } else if content_type == "application/x-www-form-urlencoded" {
        Some(BodyKind::Form)
    } else {
        None
    }
}

fn replay(bytes: Bytes) -> Payload {
    let (_, mut payload) = actix_http::h1::Payload::create(true);
    payload.unread_data(bytes);
    Payload::from(payload)
}

async fn read_limited(payload: &mut Payload, limit: usize) -> Result<BytesMut, Error> {
    let mut body = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk?;
        if body.len() + chunk.len() > limit {
            return Err(DomainError::payload_too_large(format!(
                "request body exceeds {limit} bytes"
            ))
            .into());
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Middleware rewriting JSON and form bodies through a [`Sanitizer`].
#[derive(Clone)]
pub struct SanitizeBody {
    sanitizer: Rc<Sanitizer>,
    limit: usize,
}

impl SanitizeBody {
    /// Sanitise with `policy`, rejecting bodies larger than `limit` bytes.
    pub fn new(policy: &SanitizerPolicy, limit: usize) -> Self {
        Self {
            sanitizer: Rc::new(policy.build()),
            limit,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SanitizeBody
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = SanitizeBodyMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SanitizeBodyMiddleware {
            service: Rc::new(service),
            sanitizer: Rc::clone(&self.sanitizer),
            limit: self.limit,
        }))
    }
}

/// Service wrapper produced by [`SanitizeBody`].
pub struct SanitizeBodyMiddleware<S> {
    service: Rc<S>,
    sanitizer: Rc<Sanitizer>,
    limit: usize,
}

impl<S, B> Service<ServiceRequest> for SanitizeBodyMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let Some(kind) = body_kind(&req) else {
            return Box::pin(async move {
                service.call(req).await.map(ServiceResponse::map_into_left_body)
            });
        };
        let sanitizer = Rc::clone(&self.sanitizer);
        let limit = self.limit;
        Box::pin(async move {
            let mut payload = req.take_payload();
            let body = match read_limited(&mut payload, limit).await {
                Ok(body) => body.freeze(),
                Err(err) => return Ok(req.error_response(err).map_into_right_body()),
            };
            let body = if body.is_empty() {
                body
            } else {
                match sanitizer.rewrite(kind, &body) {
                    Some(cleaned) => Bytes::from(cleaned),
                    None => {
                        debug!(?kind, "unparseable body forwarded unsanitised");
                        body
                    }
                }
            };
            req.headers_mut()
                .insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
            req.set_payload(replay(body));
            service.call(req).await.map(ServiceResponse::map_into_left_body)
        })
    }
}
