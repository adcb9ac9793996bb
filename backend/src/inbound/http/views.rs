//! Server-rendered views.
//!
//! Templates are compiled into the binary and share `layout.html`. Every
//! render receives `signed_in` and `username` for the navigation bar.

use actix_web::HttpResponse;
use actix_web::http::header::ContentType;
use serde::Serialize;
use tera::{Context, Tera};

use crate::domain::{Error, Viewer};

/// Views the page controller can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Banner,
    Login,
    Signup,
    Users,
    Main,
    AddQuestion,
}

impl View {
    fn template(self) -> &'static str {
        match self {
            Self::Banner => "banner.html",
            Self::Login => "login.html",
            Self::Signup => "signup.html",
            Self::Users => "users.html",
            Self::Main => "main.html",
            Self::AddQuestion => "add-question.html",
        }
    }
}

const TEMPLATES: [(&str, &str); 7] = [
    ("layout.html", include_str!("../../../templates/layout.html")),
    ("banner.html", include_str!("../../../templates/banner.html")),
    ("login.html", include_str!("../../../templates/login.html")),
    ("signup.html", include_str!("../../../templates/signup.html")),
    ("users.html", include_str!("../../../templates/users.html")),
    ("main.html", include_str!("../../../templates/main.html")),
    (
        "add-question.html",
        include_str!("../../../templates/add-question.html"),
    ),
];

/// Compiled template set.
pub struct Views {
    tera: Tera,
}

impl Views {
    /// Compile the embedded templates.
    pub fn embedded() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;
        Ok(Self { tera })
    }

    /// Render `view` for `viewer` with view-specific `data`.
    ///
    /// `data` must serialise to a map; its keys become template variables.
    pub fn render<T: Serialize>(
        &self,
        view: View,
        viewer: &Viewer,
        data: &T,
    ) -> Result<HttpResponse, Error> {
        let mut context = Context::from_serialize(data)
            .map_err(|err| Error::internal("invalid view data").with_cause(&err))?;
        context.insert("signed_in", &viewer.identity().is_some());
        context.insert(
            "username",
            &viewer
                .identity()
                .map(|identity| identity.username().to_string())
                .unwrap_or_default(),
        );
        let html = self
            .tera
            .render(view.template(), &context)
            .map_err(|err| {
                Error::internal(format!("failed to render {}", view.template())).with_cause(&err)
            })?;
        Ok(HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(html))
    }
}
