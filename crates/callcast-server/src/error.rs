use log::debug;
use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the HTTP layer.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid JSON")]
    InvalidJson,
    #[error("Payload too large")]
    PayloadTooLarge,
    #[error("failed to read request body: {0}")]
    BodyRead(#[from] std::io::Error),
    #[error("cannot resolve listen address (host={host})")]
    Address { host: String },
    #[error("server failed: {0}")]
    Launch(String),
}

impl ServerError {
    pub fn status(&self) -> Status {
        match self {
            ServerError::InvalidJson | ServerError::BodyRead(_) => Status::BadRequest,
            ServerError::PayloadTooLarge => Status::PayloadTooLarge,
            ServerError::Address { .. } | ServerError::Launch(_) => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for ServerError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        debug!("request failed (status={}, err={})", status.code, self);
        (status, Json(json!({ "detail": self.to_string() }))).respond_to(request)
    }
}
