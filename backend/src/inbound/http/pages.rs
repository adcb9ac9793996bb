//! Server-rendered page routes.
//!
//! ```text
//! GET /             banner
//! GET /login        login form
//! GET /signup       signup form
//! GET /users        user list
//! GET /main         newest questions, personalised for members
//! GET /postQuestion ask form carrying a CSRF token
//! ```
//!
//! Failures propagate as [`crate::domain::Error`] so the terminal error
//! handler renders them; pages never render their own error views.

use actix_web::{HttpResponse, get, web};
use serde_json::json;

use crate::domain::Viewer;
use crate::domain::ports::FEED_SIZE;
use crate::inbound::http::ApiResult;
use crate::inbound::http::csrf::issue_token;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::views::{View, Views};

/// Landing page.
#[get("/")]
pub async fn banner(views: web::Data<Views>, viewer: Viewer) -> ApiResult<HttpResponse> {
    views.render(View::Banner, &viewer, &json!({}))
}

#[get("/login")]
pub async fn login_page(views: web::Data<Views>, viewer: Viewer) -> ApiResult<HttpResponse> {
    views.render(View::Login, &viewer, &json!({}))
}

#[get("/signup")]
pub async fn signup_page(views: web::Data<Views>, viewer: Viewer) -> ApiResult<HttpResponse> {
    views.render(View::Signup, &viewer, &json!({}))
}

/// Every registered user.
#[get("/users")]
pub async fn users_page(
    state: web::Data<HttpState>,
    views: web::Data<Views>,
    viewer: Viewer,
) -> ApiResult<HttpResponse> {
    let users = state.users.list_users().await?;
    views.render(View::Users, &viewer, &json!({ "users": users }))
}

/// The question feed. Guests see the same feed without the greeting.
#[get("/main")]
pub async fn main_page(
    state: web::Data<HttpState>,
    views: web::Data<Views>,
    viewer: Viewer,
) -> ApiResult<HttpResponse> {
    let questions = state.questions.recent(FEED_SIZE).await?;
    views.render(View::Main, &viewer, &json!({ "questions": questions }))
}

/// Ask form. Each render carries a fresh token for this session.
#[get("/postQuestion")]
pub async fn add_question_page(
    session: SessionContext,
    views: web::Data<Views>,
    viewer: Viewer,
) -> ApiResult<HttpResponse> {
    let csrf_token = issue_token(&session)?;
    views.render(
        View::AddQuestion,
        &viewer,
        &json!({ "csrf_token": csrf_token }),
    )
}

/// Register every page route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(banner)
        .service(login_page)
        .service(signup_page)
        .service(users_page)
        .service(main_page)
        .service(add_question_page);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        MockAccountService, MockQuestionsCommand, MockQuestionsQuery, MockUsersQuery,
    };
    use crate::domain::{Error, NewQuestion, Question, QuestionId, User, UserId, Username};
    use crate::inbound::http::state::HttpStatePorts;
    use crate::inbound::http::test_utils::test_session_middleware;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use std::sync::Arc;

    fn state(users: MockUsersQuery, questions: MockQuestionsQuery) -> HttpState {
        HttpState::new(HttpStatePorts {
            accounts: Arc::new(MockAccountService::new()),
            users: Arc::new(users),
            questions: Arc::new(questions),
            question_commands: Arc::new(MockQuestionsCommand::new()),
        })
    }

    fn question(title: &str) -> Question {
        Question::new(
            QuestionId::random(),
            UserId::random(),
            Username::new("ada").expect("username"),
            NewQuestion::try_new(title, "<p>body</p>").expect("question"),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
                .single()
                .expect("timestamp"),
        )
    }

    async fn get(state: HttpState, path: &str) -> (StatusCode, String) {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(web::Data::new(Views::embedded().expect("templates")))
                .wrap(test_session_middleware())
                .configure(configure),
        )
        .await;
        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri(path).to_request()).await;
        let status = res.status();
        let body = actix_test::read_body(res).await;
        (status, String::from_utf8(body.to_vec()).expect("utf8"))
    }

    #[rstest]
    #[case("/", "Dump your core")]
    #[case("/login", "action=\"/users/token\"")]
    #[case("/signup", "name=\"confirmPassword\"")]
    #[actix_web::test]
    async fn static_pages_render(#[case] path: &str, #[case] marker: &str) {
        let (status, body) = get(state(MockUsersQuery::new(), MockQuestionsQuery::new()), path).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(marker), "{path} missing {marker}");
    }

    #[actix_web::test]
    async fn users_page_lists_usernames() {
        let mut users = MockUsersQuery::new();
        users.expect_list_users().times(1).returning(|| {
            Ok(vec![
                User::try_from_strings(
                    "3fa85f64-5717-4562-b3fc-2c963f66afa6",
                    "grace",
                    "grace@example.com",
                )
                .expect("user"),
            ])
        });
        let (status, body) = get(state(users, MockQuestionsQuery::new()), "/users").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<li>grace</li>"));
    }

    #[actix_web::test]
    async fn main_page_requests_the_feed_size() {
        let mut questions = MockQuestionsQuery::new();
        questions
            .expect_recent()
            .withf(|limit| *limit == FEED_SIZE)
            .times(1)
            .returning(|_| Ok(vec![question("Why borrowck?")]));
        let (status, body) = get(state(MockUsersQuery::new(), questions), "/main").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"data-signed-in="false""#));
        assert!(body.contains("Why borrowck?"));
        assert!(body.contains("<p>body</p>"));
        assert!(body.contains("2024-05-01 12:00"));
    }

    #[actix_web::test]
    async fn feed_failures_propagate() {
        let mut questions = MockQuestionsQuery::new();
        questions
            .expect_recent()
            .returning(|_| Err(Error::internal("store offline")));
        let (status, _) = get(state(MockUsersQuery::new(), questions), "/main").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn ask_form_embeds_a_token() {
        let (status, body) = get(
            state(MockUsersQuery::new(), MockQuestionsQuery::new()),
            "/postQuestion",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"name="_csrf" value=""#));
        assert!(!body.contains(r#"name="_csrf" value="""#));
    }
}
