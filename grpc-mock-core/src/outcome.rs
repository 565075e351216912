//! Call outcome — the single result every dispatched call produces.

use serde_json::Value;
use tonic::{Code, Status};

/// Structured error surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallError {
    /// Raw gRPC status code. Injected codes are passed through untouched.
    pub code: i32,
    pub message: String,
}

impl CallError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(Code::Unavailable as i32, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Code::NotFound as i32, message)
    }

    /// The not-found error for a method with no usable mock artifact.
    pub fn missing_mock(method: &str) -> Self {
        Self::not_found(format!("mock response not found for method {method}"))
    }

    pub fn grpc_code(&self) -> Code {
        Code::from_i32(self.code)
    }
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

// Codes outside 0..=16 go out as Unknown (2): tonic has no way to put a raw
// number on the wire.
impl From<CallError> for Status {
    fn from(err: CallError) -> Self {
        Status::new(err.grpc_code(), err.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// Content document, unmodified.
    Success(Value),
    Failure(CallError),
}

impl CallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn into_result(self) -> Result<Value, CallError> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(err) => Err(err),
        }
    }
}
