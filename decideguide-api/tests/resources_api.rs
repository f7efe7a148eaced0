#[macro_use]
mod common;

use actix_web::http::StatusCode;
use common::{
    create_question, create_resource, create_survey, delete, get, patch, post, put, TestApp,
};
use serde_json::json;

#[actix_rt::test]
async fn test_resource_libraries_start_empty() {
    let test_app = TestApp::new();
    let app = init_app!(test_app);

    let (status, body) = get(&app, "/api/resources").await;

    assert_eq!(status, StatusCode::OK);
    for kind in ["hints", "learns", "actions", "terminates"] {
        assert_eq!(body[kind], json!([]), "{}", kind);
    }
}

#[actix_rt::test]
async fn test_titled_resource_crud() {
    let test_app = TestApp::new();
    let app = init_app!(test_app);

    let id = create_resource(
        &app,
        "hints",
        json!({ "title": "Deposit", "content": "<p>Keep your receipt</p>" }),
    )
    .await;

    let (status, body) = get(&app, &format!("/api/resources/hints/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Deposit");

    let (status, body) = put(
        &app,
        &format!("/api/resources/hints/{}", id),
        json!({ "title": "Deposit (updated)", "content": "<p>Photograph the flat</p>" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["content"], "<p>Photograph the flat</p>");

    let (_, body) = get(&app, "/api/resources").await;
    assert_eq!(body["hints"].as_array().unwrap().len(), 1);
    assert_eq!(body["hints"][0]["title"], "Deposit (updated)");

    let (status, _) = delete(&app, &format!("/api/resources/hints/{}", id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = get(&app, &format!("/api/resources/hints/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_resource_validation() {
    let test_app = TestApp::new();
    let app = init_app!(test_app);

    let (status, _) = post(
        &app,
        "/api/resources/learns",
        json!({ "title": "  ", "content": "<p>Body</p>" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(
        &app,
        "/api/resources/actions",
        json!({ "content": "<p><br></p>" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post(
        &app,
        "/api/resources/widgets",
        json!({ "content": "anything" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[actix_rt::test]
async fn test_deleting_resource_detaches_it_from_questions() {
    let test_app = TestApp::new();
    let app = init_app!(test_app);
    let survey_id = create_survey(&app, "Detach").await;
    let q1 = create_question(&app, survey_id, "<p>Q1</p>", 0).await;
    let terminate = create_resource(&app, "terminates", json!({ "content": "Stop" })).await;
    let learn = create_resource(
        &app,
        "learns",
        json!({ "title": "Rights", "content": "<p>Read more</p>" }),
    )
    .await;
    patch(
        &app,
        &format!("/api/questions/{}", q1),
        json!({ "terminate_id": terminate, "terminate_trigger": "yes", "learn_id": learn }),
    )
    .await;

    let (status, _) = delete(&app, &format!("/api/resources/terminates/{}", terminate)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = get(&app, &format!("/api/surveys/{}", survey_id)).await;
    let question = &body["questions"][0];
    assert!(question["terminate_id"].is_null());
    assert!(question["terminate_trigger"].is_null());
    assert_eq!(question["learn_id"], learn);
}

#[actix_rt::test]
async fn test_edited_action_text_reaches_the_plan() {
    let test_app = TestApp::new();
    let app = init_app!(test_app);
    let survey_id = create_survey(&app, "Shared action").await;
    let q1 = create_question(&app, survey_id, "<p>Q1</p>", 0).await;
    let action = create_resource(&app, "actions", json!({ "content": "Old advice" })).await;
    patch(
        &app,
        &format!("/api/questions/{}", q1),
        json!({ "action_id": action }),
    )
    .await;

    let (status, _) = put(
        &app,
        &format!("/api/resources/actions/{}", action),
        json!({ "content": "New advice" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, started) = post(&app, &format!("/api/surveys/{}/sessions", survey_id), json!({})).await;
    let session_id = started["session"]["id"].as_i64().unwrap();
    let (_, body) = post(
        &app,
        &format!("/api/sessions/{}/answers", session_id),
        json!({ "question_id": q1, "answer": false }),
    )
    .await;

    assert_eq!(body["state"]["reason"], "normal");
    assert_eq!(body["action_plan"]["actions"], json!(["New advice"]));
}

#[actix_rt::test]
async fn test_deleted_terminate_no_longer_ends_open_session() {
    let test_app = TestApp::new();
    let app = init_app!(test_app);
    let survey_id = create_survey(&app, "Open session").await;
    let q1 = create_question(&app, survey_id, "<p>Q1</p>", 0).await;
    let q2 = create_question(&app, survey_id, "<p>Q2</p>", 1).await;
    let terminate = create_resource(&app, "terminates", json!({ "content": "T1" })).await;
    patch(
        &app,
        &format!("/api/questions/{}", q1),
        json!({ "no_leads_to": q2, "terminate_id": terminate, "terminate_trigger": "no" }),
    )
    .await;

    let (_, started) = post(&app, &format!("/api/surveys/{}/sessions", survey_id), json!({})).await;
    let session_id = started["session"]["id"].as_i64().unwrap();

    let (status, _) = delete(&app, &format!("/api/resources/terminates/{}", terminate)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = post(
        &app,
        &format!("/api/sessions/{}/answers", session_id),
        json!({ "question_id": q1, "answer": false }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["state"]["state"], "in_progress");
    assert_eq!(body["current_question"]["id"], q2);
    assert!(body["action_plan"]["terminate_message"].is_null());
}

#[actix_rt::test]
async fn test_edited_action_reaches_open_session() {
    let test_app = TestApp::new();
    let app = init_app!(test_app);
    let survey_id = create_survey(&app, "Open plan").await;
    let q1 = create_question(&app, survey_id, "<p>Q1</p>", 0).await;
    let action = create_resource(&app, "actions", json!({ "content": "Old advice" })).await;
    patch(
        &app,
        &format!("/api/questions/{}", q1),
        json!({ "action_id": action }),
    )
    .await;

    let (_, started) = post(&app, &format!("/api/surveys/{}/sessions", survey_id), json!({})).await;
    let session_id = started["session"]["id"].as_i64().unwrap();

    put(
        &app,
        &format!("/api/resources/actions/{}", action),
        json!({ "content": "New advice" }),
    )
    .await;

    let (_, body) = post(
        &app,
        &format!("/api/sessions/{}/answers", session_id),
        json!({ "question_id": q1, "answer": true }),
    )
    .await;

    assert_eq!(body["state"]["reason"], "normal");
    assert_eq!(body["action_plan"]["actions"], json!(["New advice"]));
}
