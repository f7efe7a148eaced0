#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web};
use decideguide_api::handlers::AppState;
use decideguide_api::helpers::database::open_in_memory;
use decideguide_api::storage::{LocalObjectStore, SqliteSurveyStorage};
use decideguide_core::DEFAULT_MAX_UPLOAD_BYTES;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

/// Isolated application state: a migrated in-memory database and a
/// temporary uploads directory.
pub struct TestApp {
    pub state: web::Data<AppState>,
    pub max_upload_bytes: usize,
    pub uploads_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_upload_limit(DEFAULT_MAX_UPLOAD_BYTES)
    }

    pub fn with_upload_limit(max_upload_bytes: usize) -> Self {
        let db = open_in_memory().expect("in-memory database");
        let uploads_dir = TempDir::new().expect("uploads dir");

        let storage = Arc::new(SqliteSurveyStorage::new(db));
        let objects = Arc::new(LocalObjectStore::new(uploads_dir.path()));
        let state = web::Data::new(AppState::new(storage, objects, max_upload_bytes));

        Self {
            state,
            max_upload_bytes,
            uploads_dir,
        }
    }
}

/// Build the service with the same routes and extractor configs as the
/// server.
macro_rules! init_app {
    ($test_app:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($test_app.state.clone())
                .app_data(decideguide_api::json_config())
                .app_data(decideguide_api::payload_config($test_app.max_upload_bytes))
                .configure(decideguide_api::routes::configure_routes),
        )
        .await
    };
}

/// Send a request and decode the JSON body, `Null` when there is none.
pub async fn send<S, B>(app: &S, req: actix_http::Request) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&body).into_owned())
        })
    };
    (status, json)
}

pub async fn post<S, B>(app: &S, uri: &str, body: Value) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    send(app, test::TestRequest::post().uri(uri).set_json(body).to_request()).await
}

pub async fn put<S, B>(app: &S, uri: &str, body: Value) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    send(app, test::TestRequest::put().uri(uri).set_json(body).to_request()).await
}

pub async fn patch<S, B>(app: &S, uri: &str, body: Value) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    send(app, test::TestRequest::patch().uri(uri).set_json(body).to_request()).await
}

pub async fn get<S, B>(app: &S, uri: &str) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    send(app, test::TestRequest::get().uri(uri).to_request()).await
}

pub async fn delete<S, B>(app: &S, uri: &str) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    send(app, test::TestRequest::delete().uri(uri).to_request()).await
}

pub async fn create_survey<S, B>(app: &S, name: &str) -> i64
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = post(app, "/api/surveys", json!({ "name": name })).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().expect("survey id")
}

pub async fn create_question<S, B>(app: &S, survey_id: i64, text: &str, position: i64) -> i64
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = post(
        app,
        &format!("/api/surveys/{}/questions", survey_id),
        json!({ "text": text, "order_position": position }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().expect("question id")
}

pub async fn create_resource<S, B>(app: &S, kind: &str, body: Value) -> i64
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = post(app, &format!("/api/resources/{}", kind), body).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().expect("resource id")
}

/// Ids of the reference tree: Q1 (yes -> Q2, terminate T1 on no) and Q2
/// (no -> Q1, terminate T2 unconditionally, action A2 on yes).
pub struct ReferenceTree {
    pub survey_id: i64,
    pub q1: i64,
    pub q2: i64,
}

pub async fn reference_tree<S, B>(app: &S) -> ReferenceTree
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let survey_id = create_survey(app, "Reference").await;
    let q1 = create_question(app, survey_id, "<p>Q1</p>", 0).await;
    let q2 = create_question(app, survey_id, "<p>Q2</p>", 1).await;
    let t1 = create_resource(app, "terminates", json!({ "content": "T1" })).await;
    let t2 = create_resource(app, "terminates", json!({ "content": "T2" })).await;
    let a2 = create_resource(app, "actions", json!({ "content": "Book a review" })).await;

    let (status, body) = patch(
        app,
        &format!("/api/questions/{}", q1),
        json!({
            "yes_leads_to": q2,
            "terminate_id": t1,
            "terminate_trigger": "no",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, body) = patch(
        app,
        &format!("/api/questions/{}", q2),
        json!({
            "no_leads_to": q1,
            "terminate_id": t2,
            "action_id": a2,
            "action_trigger": "yes",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    ReferenceTree { survey_id, q1, q2 }
}
