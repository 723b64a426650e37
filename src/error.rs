use crate::query::QueryError;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use serde::Serialize;
use thiserror::Error;

/// Every failure a handler can answer with. The body is always
/// `{"message": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} for the user is required")]
    MissingField(&'static str),
    #[error("password for the user is too long")]
    PasswordTooLong,
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("Username is already taken.")]
    UsernameTaken,
    #[error("User not found")]
    UserNotFound,
    #[error("wrong credentials")]
    WrongCredentials,
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Invalid bearer token")]
    InvalidToken,
    #[error("{0}")]
    Internal(&'static str),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_) | ApiError::PasswordTooLong => StatusCode::BAD_REQUEST,
            ApiError::Query(QueryError::UnknownSortColumn(_)) => StatusCode::BAD_REQUEST,
            ApiError::Query(QueryError::Unrecognized) => StatusCode::NOT_FOUND,
            ApiError::UsernameTaken => StatusCode::CONFLICT,
            ApiError::UserNotFound => StatusCode::NOT_FOUND,
            ApiError::WrongCredentials | ApiError::MissingToken | ApiError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            message: self.to_string(),
        })
    }
}

/// Logs the underlying failure and hides it behind a short message.
pub fn log_error<E: std::fmt::Debug>(err: E, message: &'static str) -> ApiError {
    error!("{}: {:?}", message, err);
    ApiError::Internal(message)
}
