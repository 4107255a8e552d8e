//! Error types.
//!
//! Only [`ScriptError`] ever reaches the caller of an evaluation API: it
//! reports context-stack misuse by a function handler.  Accessor and handler
//! failures are swallowed by the evaluator and degrade to "no result".

/// Context-stack discipline violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("no script context available")]
    NoContext,

    #[error("no saved script context available")]
    EmptyContextStack,
}

/// Failure to read a named member from a context value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("no such method: {0}")]
    NoSuchMethod(String),

    #[error("non existent key: {0}")]
    NoSuchKey(String),

    #[error("accessor failed: {0}")]
    Failed(String),
}

/// Failure raised by a function handler.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FunctionError {
    #[error("{function}: invalid argument {index}: {reason}")]
    InvalidArgument {
        function: String,
        index: usize,
        reason: String,
    },

    #[error("{0}")]
    Script(#[from] ScriptError),

    #[error("{0}")]
    Failed(String),
}

impl FunctionError {
    pub fn invalid_argument(function: &str, index: usize, reason: impl Into<String>) -> Self {
        FunctionError::InvalidArgument {
            function: function.to_owned(),
            index,
            reason: reason.into(),
        }
    }
}

impl From<String> for FunctionError {
    fn from(msg: String) -> Self {
        FunctionError::Failed(msg)
    }
}
