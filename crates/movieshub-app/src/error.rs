use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde::Serialize;

pub type MovieResult<T> = std::result::Result<T, MovieError>;

/// Business level failures of movie operations.
#[derive(Debug, thiserror::Error)]
pub enum MovieError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Storage failure: {0}")]
    Store(movieshub_dal::Error),
}

impl From<movieshub_dal::Error> for MovieError {
    fn from(value: movieshub_dal::Error) -> Self {
        match value {
            movieshub_dal::Error::RecordNotFound(what) => {
                MovieError::NotFound(format!("{what} not found"))
            }
            movieshub_dal::Error::InvalidOrderByField(field) => {
                MovieError::Validation(format!("Cannot sort by field '{field}'"))
            }
            other => MovieError::Store(other),
        }
    }
}

impl From<garde::Report> for MovieError {
    fn from(report: garde::Report) -> Self {
        MovieError::Validation(report.to_string())
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) | ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {self}");
        } else {
            tracing::debug!("Request rejected: {self}");
        }
        let body = ErrorBody {
            error: self.to_string(),
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<MovieError> for ApiError {
    fn from(value: MovieError) -> Self {
        match value {
            MovieError::NotFound(msg) => ApiError::ResourceNotFound(msg),
            MovieError::Validation(msg) => ApiError::InvalidRequest(msg),
            MovieError::Store(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dal_error_translation() {
        let err: MovieError = movieshub_dal::Error::RecordNotFound("Movie 3".into()).into();
        assert!(matches!(err, MovieError::NotFound(ref m) if m == "Movie 3 not found"));

        let err: MovieError = movieshub_dal::Error::InvalidOrderByField("created".into()).into();
        assert!(matches!(err, MovieError::Validation(_)));

        let err: MovieError =
            movieshub_dal::Error::DatabaseError(movieshub_dal::SqlxError::PoolClosed).into();
        assert!(matches!(err, MovieError::Store(_)));
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(MovieError::NotFound("x".into())), 404),
            (ApiError::from(MovieError::Validation("x".into())), 400),
            (ApiError::InvalidQuery("x".into()), 400),
            (ApiError::InternalError("x".into()), 500),
        ];
        for (err, code) in cases {
            assert_eq!(code, err.into_response().status().as_u16());
        }
    }
}
