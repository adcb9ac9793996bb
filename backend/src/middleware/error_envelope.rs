//! Terminal error handling.
//!
//! Every error leaving the inner services is logged once and rewritten into
//! the `{title, message, errors, stack}` envelope. Inner middleware should
//! report failures as `Ok(req.error_response(err))`; the request is never
//! held here because actix needs unique ownership of it while routing.
//! Stacks are only rendered outside production.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::error::InternalError;
use actix_web::{Error, HttpResponse};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{error, warn};

use crate::inbound::http::error::ErrorBody;
use crate::settings::Environment;

fn render(error: &Error, production: bool) -> HttpResponse {
    let status = error.as_response_error().status_code();
    if status.is_server_error() {
        error!(%status, error = %error, details = ?error, "request failed");
    } else {
        warn!(%status, error = %error, "request rejected");
    }
    HttpResponse::build(status).json(ErrorBody::from_actix(error, production))
}

/// Middleware writing all error responses in the JSON envelope.
#[derive(Clone)]
pub struct ErrorEnvelope {
    production: bool,
}

impl ErrorEnvelope {
    /// Render envelopes for `environment`.
    pub fn new(environment: Environment) -> Self {
        Self {
            production: environment.is_production(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ErrorEnvelope
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = ErrorEnvelopeMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ErrorEnvelopeMiddleware {
            service: Rc::new(service),
            production: self.production,
        }))
    }
}

/// Service wrapper produced by [`ErrorEnvelope`].
pub struct ErrorEnvelopeMiddleware<S> {
    service: Rc<S>,
    production: bool,
}

impl<S, B> Service<ServiceRequest> for ErrorEnvelopeMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let production = self.production;
        Box::pin(async move {
            match service.call(req).await {
                Ok(res) => {
                    let Some(rendered) = res.response().error().map(|err| render(err, production))
                    else {
                        return Ok(res.map_into_boxed_body());
                    };
                    Ok(res.into_response(rendered))
                }
                // No request is left to pair a response with, so the envelope
                // travels inside the error and actix writes it out.
                Err(err) => {
                    let rendered = render(&err, production);
                    Err(InternalError::from_response(err, rendered).into())
                }
            }
        })
    }
}
