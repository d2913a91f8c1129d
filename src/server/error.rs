use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::error;

pub type AppResult<T> = Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// missing or malformed input from the caller
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// couldn't talk to an external origin at all
    #[error("upstream fetch error: {0}")]
    UpstreamFetch(String),

    /// an external origin answered but not with a success, the status goes back to the caller
    #[error("upstream status {}", .0.as_u16())]
    UpstreamStatus(StatusCode),

    #[error("internal server error")]
    InternalServerError,

    #[error("internal server error: {0}")]
    InternalServerErrorWithContext(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::UpstreamFetch(_) => StatusCode::BAD_GATEWAY,
            Error::UpstreamStatus(status) => *status,
            Error::InternalServerError | Error::InternalServerErrorWithContext(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::InternalServerErrorWithContext(format!("{:#}", err))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // storage details stay in the logs
        let body = match &self {
            Error::InternalServerErrorWithContext(context) => {
                error!("internal error: {}", context);
                Error::InternalServerError.to_string()
            }
            _ => self.to_string(),
        };

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}
