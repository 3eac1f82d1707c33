use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::flows::FlowTransitionError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    FlowTransition(#[from] FlowTransitionError),
    #[error("invalid inquiry: {0}")]
    InvalidInquiry(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("generation backend unavailable: {0}")]
    Backend(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl From<ConfigError> for ApplicationError {
    fn from(value: ConfigError) -> Self {
        Self::Configuration(value.to_string())
    }
}

/// Coarse error buckets surfaced at the CLI boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    BadRequest,
    ServiceUnavailable,
    Internal,
}

impl ErrorClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::ServiceUnavailable => "service_unavailable",
            Self::Internal => "internal",
        }
    }

    pub fn user_message(self) -> &'static str {
        match self {
            Self::BadRequest => "The inquiry could not be processed. Check inputs and try again.",
            Self::ServiceUnavailable => {
                "The support service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal => "An unexpected internal error occurred.",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{class}: {message}")]
pub struct InterfaceError {
    pub class: ErrorClass,
    pub message: String,
    pub correlation_id: String,
}

impl InterfaceError {
    pub fn error_class(&self) -> &'static str {
        self.class.as_str()
    }

    pub fn user_message(&self) -> &'static str {
        self.class.user_message()
    }
}

impl ApplicationError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Domain(_) => ErrorClass::BadRequest,
            Self::Backend(_) => ErrorClass::ServiceUnavailable,
            Self::Configuration(_) => ErrorClass::Internal,
        }
    }

    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        InterfaceError {
            class: self.class(),
            message: self.to_string(),
            correlation_id: correlation_id.into(),
        }
    }
}
