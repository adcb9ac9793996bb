//! Questions API handlers.
//!
//! ```text
//! POST /questions       title, body, _csrf (form or JSON; token also accepted in `csrf-token`)
//! GET  /questions/{id}
//! ```

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Error, Identity, NewQuestion, QuestionId, QuestionValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::csrf::{submitted_token, verify_token};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Body of the add-question form.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct QuestionRequest {
    pub title: String,
    pub body: String,
    #[serde(rename = "_csrf", skip_serializing_if = "Option::is_none")]
    pub csrf: Option<String>,
}

type Body<T> = web::Either<web::Json<T>, web::Form<T>>;

fn map_question_validation_error(err: QuestionValidationError) -> Error {
    Error::invalid_request(err.to_string())
        .with_title("Bad request.")
        .with_details(json!([{ "field": err.field(), "message": err.to_string() }]))
}

/// Post a question as the signed-in user.
#[post("/questions")]
pub async fn create_question(
    req: HttpRequest,
    identity: Identity,
    session: SessionContext,
    state: web::Data<HttpState>,
    payload: Body<QuestionRequest>,
) -> ApiResult<HttpResponse> {
    let request = match payload {
        web::Either::Left(json) => json.into_inner(),
        web::Either::Right(form) => form.into_inner(),
    };
    let token = submitted_token(&req, request.csrf.as_deref());
    verify_token(&session, token.as_deref())?;

    let submission = NewQuestion::try_new(&request.title, &request.body)
        .map_err(map_question_validation_error)?;
    let question = state.question_commands.create(&identity, submission).await?;
    info!(question_id = %question.id(), user_id = %identity.user_id(), "question posted");
    Ok(HttpResponse::Created().json(question))
}

/// Fetch one question.
#[get("/questions/{id}")]
pub async fn get_question(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let not_found = || Error::not_found("question not found");
    let id = Uuid::parse_str(&path.into_inner()).map_err(|_| not_found())?;
    let question = state
        .questions
        .find(QuestionId::from_uuid(id))
        .await?
        .ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(question))
}

/// Register the questions API.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_question).service(get_question);
}
