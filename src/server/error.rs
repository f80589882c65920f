use super::html;
use crate::error::ColunchError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use log::{error, warn};

/// Error returned by request handlers, rendered as an HTML fragment
#[derive(Debug)]
pub struct AppError(pub ColunchError);

pub type Result<T, E = AppError> = std::result::Result<T, E>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ColunchError::NotFound(_) => StatusCode::NOT_FOUND,
            ColunchError::EmptyInput
            | ColunchError::UnsupportedSource(_)
            | ColunchError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            ColunchError::Upstream { .. }
            | ColunchError::Transport(_)
            | ColunchError::MissingField { .. }
            | ColunchError::UnexpectedReply(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self.0);
        } else {
            warn!("{}", self.0);
        }
        (status, Html(html::error_message(&self.0))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<ColunchError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
