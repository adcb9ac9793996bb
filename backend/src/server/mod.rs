//! Server construction and middleware wiring.
//!
//! Middleware, outermost first: request tracing, the encrypted cookie
//! session, the terminal error envelope, credential extraction and body
//! sanitisation. Routes are tried in registration order: pages, the users,
//! questions and search APIs, then static files. Anything left over is a
//! 404 in the standard error envelope.

mod config;
mod demo;

pub use config::ServerConfig;
pub use demo::{DEMO_PASSWORD, seed_demo_data};

use std::sync::Arc;

use actix_files::Files;
use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, guard, web};
use mockable::{Clock, DefaultClock};
use tracing::info;

use crate::domain::PasswordAccountService;
use crate::inbound::http::error::{form_payload_error, json_payload_error, not_found};
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::inbound::http::token::TokenIssuer;
use crate::inbound::http::views::Views;
use crate::inbound::http::{pages, questions, search, users};
use crate::middleware::{BearerCredential, CookieSigner, ErrorEnvelope, SanitizeBody, Trace};
use crate::outbound::MemoryStore;

/// Cookie name of the encrypted session holding the CSRF secret.
pub const SESSION_COOKIE: &str = "session";

/// Shared, per-process state cloned into every worker's `App`.
#[derive(Clone)]
pub struct AppDependencies {
    http_state: web::Data<HttpState>,
    tokens: web::Data<TokenIssuer>,
    views: web::Data<Views>,
    signer: web::Data<CookieSigner>,
    config: Arc<ServerConfig>,
}

impl AppDependencies {
    /// Wire the HTTP adapter to `store`.
    ///
    /// # Errors
    /// Fails when the embedded templates do not compile.
    pub fn new(
        config: ServerConfig,
        store: MemoryStore,
        clock: Arc<dyn Clock>,
    ) -> std::io::Result<Self> {
        let views = Views::embedded()
            .map_err(|err| std::io::Error::other(format!("templates failed to compile: {err}")))?;
        let http_state = HttpState::new(HttpStatePorts {
            accounts: Arc::new(PasswordAccountService::new(Arc::new(store.clone()))),
            users: Arc::new(store.clone()),
            questions: Arc::new(store.clone()),
            question_commands: Arc::new(store),
        });
        let tokens = TokenIssuer::new(&config.token_secret, config.token_ttl, clock);
        let signer = CookieSigner::new(config.key.clone(), config.cookie_secure);
        Ok(Self {
            http_state: web::Data::new(http_state),
            tokens: web::Data::new(tokens),
            views: web::Data::new(views),
            signer: web::Data::new(signer),
            config: Arc::new(config),
        })
    }

    /// Port bundle handed to handlers.
    pub fn http_state(&self) -> &HttpState {
        &self.http_state
    }

    /// Issuer for access tokens.
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }
}

/// Build the application for one worker.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        http_state,
        tokens,
        views,
        signer,
        config,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), config.key.clone())
        .cookie_name(SESSION_COOKIE.into())
        .cookie_path("/".into())
        .cookie_secure(config.cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(config.same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build();

    let json = web::JsonConfig::default()
        .limit(config.body_limit)
        .error_handler(json_payload_error);
    let form = web::FormConfig::default()
        .limit(config.body_limit)
        .error_handler(form_payload_error);

    let assets = Files::new("/", &config.public_dir)
        .guard(guard::Any(guard::Get()).or(guard::Head()))
        .default_handler(web::to(not_found));

    App::new()
        .app_data(http_state)
        .app_data(tokens)
        .app_data(views)
        .app_data(signer.clone())
        .app_data(json)
        .app_data(form)
        .configure(pages::configure)
        .configure(users::configure)
        .configure(questions::configure)
        .configure(search::configure)
        .service(assets)
        .default_service(web::to(not_found))
        .wrap(SanitizeBody::new(&config.sanitizer, config.body_limit))
        .wrap(BearerCredential::new(signer.get_ref().clone()))
        .wrap(ErrorEnvelope::new(config.environment))
        .wrap(session)
        .wrap(Trace)
}

/// Construct an Actix HTTP server for `config`, seeding demo content first
/// when enabled.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when seeding, template compilation or
/// binding the socket fails.
pub async fn create_server(config: ServerConfig) -> std::io::Result<Server> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let store = MemoryStore::new(clock.clone());
    let bind_addr = config.bind_addr();
    let environment = config.environment();
    let demo_data = config.demo_data;
    let deps = AppDependencies::new(config, store, clock)?;

    if demo_data {
        let state = deps.http_state();
        seed_demo_data(state.accounts.as_ref(), state.question_commands.as_ref())
            .await
            .map_err(|err| std::io::Error::other(format!("demo seeding failed: {err}")))?;
    }

    let server = HttpServer::new(move || build_app(deps.clone()))
        .bind(bind_addr)?
        .run();
    info!(%bind_addr, %environment, "server listening");
    Ok(server)
}
