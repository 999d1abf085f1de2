use thiserror::Error;

/// Control-plane failures. Everything except `Bind` is a rejected request
/// and leaves the parameter store untouched.
#[derive(Debug, Error, PartialEq)]
pub enum ControlError {
    #[error("failed to bind control server on {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("missing {0} param")]
    MissingParam(&'static str),

    #[error("invalid {0}")]
    InvalidValue(&'static str),

    #[error("invalid param")]
    InvalidParam { name: String, value: String },

    #[error("no params")]
    NoParams,

    #[error("missing name")]
    MissingName,

    #[error("not found")]
    NotFound,
}

impl ControlError {
    pub fn status(&self) -> u16 {
        match self {
            ControlError::Bind { .. } => 500,
            ControlError::NotFound => 404,
            _ => 400,
        }
    }
}

pub type Result<T> = std::result::Result<T, ControlError>;
