use axum::{http::StatusCode, response::IntoResponse, Json};

use crate::{Error, ErrorType};

/// HTTP response builder for Error enum
impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error_type {
            ErrorType::LabelMe => StatusCode::INTERNAL_SERVER_ERROR,

            ErrorType::FailedValidation { .. } => StatusCode::BAD_REQUEST,
            ErrorType::DuplicateLocation => StatusCode::CONFLICT,
            ErrorType::FileTooSmall => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorType::FileTooLarge { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorType::FileTypeNotAllowed => StatusCode::BAD_REQUEST,

            ErrorType::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
            ErrorType::NotFound => StatusCode::NOT_FOUND,

            ErrorType::ClassifierUnavailable => StatusCode::BAD_GATEWAY,
            ErrorType::DispatchFailed { .. } => StatusCode::BAD_GATEWAY,
            ErrorType::WeatherUnavailable => StatusCode::BAD_GATEWAY,

            ErrorType::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ErrorType::InvalidCredentials => StatusCode::UNAUTHORIZED,

            ErrorType::DatabaseError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorType::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(&self)).into_response()
    }
}
