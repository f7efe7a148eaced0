use actix_web::web;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub mod config;
pub mod error;
pub mod handlers;
pub mod helpers;
pub mod logging;
pub mod routes;
pub mod storage;

pub type DbConnection = Arc<Mutex<Connection>>;

/// Malformed JSON bodies answer with the same error shape as every other
/// rejected request.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| error::ApiError::InvalidRequest(err.to_string()).into())
}

/// Raw-body limit for uploads. One byte of headroom lets an oversized file
/// reach the upload service, which reports the configured limit.
pub fn payload_config(max_upload_bytes: usize) -> web::PayloadConfig {
    web::PayloadConfig::new(max_upload_bytes.saturating_add(1))
}
