//! Question search.
//!
//! ```text
//! GET /search?term=borrow
//! ```

use actix_web::{get, web};
use serde::Deserialize;

use crate::domain::Question;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Upper bound on search hits returned in one response.
pub const SEARCH_LIMIT: usize = 20;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub term: String,
}

/// Questions matching `term`, newest first. A blank term matches nothing.
#[get("/search")]
pub async fn search(
    state: web::Data<HttpState>,
    params: web::Query<SearchParams>,
) -> ApiResult<web::Json<Vec<Question>>> {
    let term = params.into_inner().term;
    let hits = state.questions.search(term.trim(), SEARCH_LIMIT).await?;
    Ok(web::Json(hits))
}

/// Register the search API.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(search);
}
