//! Decode errors shared by both format drivers.

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Empty numeric token")]
    EmptyToken,

    #[error("Invalid numeric token '{token}'")]
    InvalidToken { token: String },

    #[error("Integer '{token}' does not fit in 32 bits")]
    Overflow { token: String },

    #[error("Invalid float '{token}'")]
    InvalidFloat { token: String },

    #[error("Expected {expected} fields, found {found}")]
    MissingField { expected: usize, found: usize },
}

impl DecodeError {
    pub(crate) fn invalid(token: &str) -> Self {
        Self::InvalidToken {
            token: token.to_owned(),
        }
    }

    /// The offending token, when the error carries one.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::InvalidToken { token }
            | Self::Overflow { token }
            | Self::InvalidFloat { token } => Some(token),
            Self::EmptyToken | Self::MissingField { .. } => None,
        }
    }
}

pub type DecodeResult<T> = Result<T, DecodeError>;
