//! Authentication guards used by HTTP handlers.
//!
//! [`Viewer`] is the soft gate: it never fails and yields a guest when the
//! request has no credential or the credential does not verify. [`Identity`]
//! is the hard gate and rejects with 401. Both decode at most once per
//! request; the result is cached in request extensions.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest, web};
use futures_util::future::{Ready, ready};
use tracing::error;

use crate::domain::{Error, Identity, Viewer};
use crate::middleware::Credential;

use super::token::TokenIssuer;

fn resolve_viewer(req: &HttpRequest) -> Result<Viewer, Error> {
    if let Some(viewer) = req.extensions().get::<Viewer>() {
        return Ok(viewer.clone());
    }
    let credential = req.extensions().get::<Credential>().cloned();
    let viewer = match credential {
        None => Viewer::Guest,
        Some(credential) => {
            let issuer = req.app_data::<web::Data<TokenIssuer>>().ok_or_else(|| {
                error!("token issuer missing from app data");
                Error::internal("authentication is not configured")
            })?;
            issuer
                .identify(credential.as_str())
                .map_or(Viewer::Guest, Viewer::Member)
        }
    };
    req.extensions_mut().insert(viewer.clone());
    Ok(viewer)
}

impl FromRequest for Viewer {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(resolve_viewer(req))
    }
}

impl FromRequest for Identity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(resolve_viewer(req).and_then(|viewer| {
            viewer
                .into_identity()
                .ok_or_else(|| Error::unauthorized("login required"))
        }))
    }
}
