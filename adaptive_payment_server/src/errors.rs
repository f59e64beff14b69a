use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use adaptive_payment_engine::{traits::StoreError, TransitionError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The requested transition is not allowed. {0}")]
    PreconditionFailed(String),
    #[error("The return could not be accepted. {0}")]
    ReturnRejected(String),
    #[error("The notification could not be verified. {0}")]
    IpnRejected(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::PreconditionFailed(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            // Browser-return failures are 500-class so the sender sees a hard failure rather than a confirmation.
            Self::ReturnRejected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // 5xx tells the processor to retry the delivery per its own policy.
            Self::IpnRejected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<TransitionError> for ServerError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::Precondition(m) => Self::PreconditionFailed(m),
            TransitionError::ReturnRejected(m) => Self::ReturnRejected(m),
            TransitionError::Processor(m) => Self::BackendError(m),
            TransitionError::Ipn(e) => Self::IpnRejected(e.to_string()),
            TransitionError::Receiver(e) => Self::PreconditionFailed(e.to_string()),
            TransitionError::Store(StoreError::NotFound(r)) => Self::NoRecordFound(r.to_string()),
            TransitionError::Store(StoreError::Backend(m)) => Self::BackendError(m),
        }
    }
}
