use crate::types::{NodeIdentity, Slot};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
#[cfg(feature = "backtrace")]
use backtrace::Backtrace;
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    reason: ErrorReason,
    #[cfg(feature = "backtrace")]
    bt: Backtrace,
}

impl AppError {
    pub(crate) fn new(reason: ErrorReason) -> Self {
        Self {
            reason,
            #[cfg(feature = "backtrace")]
            bt: Backtrace::new(),
        }
    }

    pub fn reason(&self) -> &ErrorReason {
        &self.reason
    }

    pub fn status_code(&self) -> StatusCode {
        match self.reason() {
            ErrorReason::InvalidPath(_) => StatusCode::BAD_REQUEST,
            ErrorReason::Missing { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<ErrorReason>,
{
    fn from(reason: E) -> Self {
        Self::new(reason.into())
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", &self.reason)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.reason.source()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[cfg(feature = "backtrace")]
        trace!("request failed: {}\n{:?}", self.reason, self.bt);

        (self.status_code(), self.reason.to_string()).into_response()
    }
}

#[derive(Debug, Error)]
pub enum ErrorReason {
    #[error("failed to load the configuration")]
    Config(#[from] config::ConfigError),
    #[error("IO error")]
    Io(#[from] std::io::Error),
    #[error("PEM decoding error: {0}")]
    PemDecode(#[from] pem::PemError),
    #[error("X509 certificate parsing error: {0}")]
    X509(#[from] x509_certificate::X509CertificateError),
    #[error("failed to resolve the caller identity: {0}")]
    Resolver(String),
    #[error("invalid node identity {0:?}")]
    InvalidIdentity(String),
    #[error("invalid path=[{0}] use /cert, /key, /days or /sh paths")]
    InvalidPath(String),
    #[error("please provide a cert or a key")]
    UnrecognizedContent,
    #[error("no {slot} for {identity}")]
    Missing { slot: Slot, identity: NodeIdentity },
    #[error("failed to persist the {slot} for {identity}: {source}")]
    Persistence {
        slot: Slot,
        identity: NodeIdentity,
        #[source]
        source: std::io::Error,
    },
}
