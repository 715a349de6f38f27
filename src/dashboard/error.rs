//! Error types for the dashboard handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::ExplainError;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Explain(#[from] ExplainError),
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            DashboardError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            DashboardError::Explain(err) => match err {
                ExplainError::MissingData(_) | ExplainError::InvalidKey { .. } => {
                    (StatusCode::NOT_FOUND, err.to_string())
                }
                ExplainError::UnsupportedConfiguration { .. } | ExplainError::Configuration(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
                }
                other => {
                    tracing::error!(detail = %other, "Dashboard internal error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "An internal error occurred".to_string(),
                    )
                }
            },
        };

        let body = Json(json!({
            "error": true,
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
