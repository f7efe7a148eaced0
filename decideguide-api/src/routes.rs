//! Route table shared by the server and the integration tests.

use crate::handlers::{health, notes, questions, resources, sessions, surveys, uploads};
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .route("/version", web::get().to(health::version))
            // Surveys and their trees
            .route("/surveys", web::get().to(surveys::list_surveys))
            .route("/surveys", web::post().to(surveys::create_survey))
            .route("/surveys/{id}", web::get().to(surveys::get_survey))
            .route("/surveys/{id}", web::put().to(surveys::rename_survey))
            .route("/surveys/{id}", web::delete().to(surveys::delete_survey))
            .route(
                "/surveys/{id}/questions",
                web::post().to(questions::create_question),
            )
            .route(
                "/surveys/{id}/questions/order",
                web::put().to(questions::reorder_questions),
            )
            .route("/surveys/{id}/notes", web::get().to(notes::get_note))
            .route("/surveys/{id}/notes", web::put().to(notes::save_note))
            .route(
                "/surveys/{id}/sessions",
                web::get().to(surveys::list_sessions),
            )
            .route(
                "/surveys/{id}/sessions",
                web::post().to(sessions::start_session),
            )
            .route(
                "/questions/{id}",
                web::patch().to(questions::update_question),
            )
            .route(
                "/questions/{id}",
                web::delete().to(questions::delete_question),
            )
            // Resource libraries
            .route("/resources", web::get().to(resources::list_resources))
            .route(
                "/resources/{kind}",
                web::post().to(resources::create_resource),
            )
            .route(
                "/resources/{kind}/{id}",
                web::get().to(resources::get_resource),
            )
            .route(
                "/resources/{kind}/{id}",
                web::put().to(resources::update_resource),
            )
            .route(
                "/resources/{kind}/{id}",
                web::delete().to(resources::delete_resource),
            )
            // Respondent sessions
            .route("/sessions/{id}", web::get().to(sessions::get_session))
            .route(
                "/sessions/{id}/answers",
                web::post().to(sessions::answer_question),
            )
            .route(
                "/sessions/{id}/navigate",
                web::post().to(sessions::navigate),
            )
            .route(
                "/sessions/{id}/reset",
                web::post().to(sessions::reset_session),
            )
            .route("/sessions/{id}/plan", web::get().to(sessions::get_plan))
            .route(
                "/sessions/{id}/uploads",
                web::post().to(uploads::upload_file),
            )
            .route(
                "/sessions/{id}/uploads",
                web::get().to(uploads::list_uploads),
            ),
    );
}
