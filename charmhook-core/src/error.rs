// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Hook framework error types

use thiserror::Error;

/// Result type for hook framework operations
pub type HookResult<T> = Result<T, HookError>;

/// Broad classification of a [`HookError`].
///
/// Callers use this to tell an invocation that broke the framework's
/// assumptions apart from an ordinary runtime failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The agent or the framework itself broke an invariant.
    ContractViolation,
    /// A registered handler returned an error.
    Handler,
    /// An external hook tool failed or produced unusable output.
    Tool,
    /// Persistent state could not be read or written.
    State,
    /// The invocation environment or configuration is incomplete.
    Config,
    /// Anything else (I/O, serialization).
    Other,
}

/// Errors that can occur while running a hook
#[derive(Debug, Error)]
pub enum HookError {
    // Contract violations
    #[error("Invalid hook name: {0:?}")]
    InvalidHookName(String),

    #[error("Relation id {0} does not belong to any known relation")]
    UnknownRelationId(String),

    #[error("Tool runner closed twice")]
    RunnerClosedTwice,

    #[error("Invalid arguments to {command}: {reason}")]
    InvalidToolArgs { command: String, reason: String },

    // Handler errors
    #[error("Handler {handler} failed: {source}")]
    HandlerFailed {
        handler: String,
        #[source]
        source: anyhow::Error,
    },

    // Tool errors
    #[error("Hook tool {command} failed: {message}")]
    ToolFailed { command: String, message: String },

    #[error("Unexpected output from {command}: {message}")]
    ToolOutput { command: String, message: String },

    // State errors
    #[error("Invalid state name: {0:?}")]
    InvalidStateName(String),

    #[error("State I/O error for {name}: {source}")]
    StateIo {
        name: String,
        #[source]
        source: std::io::Error,
    },

    // Config errors
    #[error("Missing environment variable: {0}")]
    MissingEnv(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Hook {0} is not a relation hook")]
    NotRelationHook(String),
}

impl HookError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            HookError::InvalidHookName(_)
            | HookError::UnknownRelationId(_)
            | HookError::RunnerClosedTwice
            | HookError::InvalidToolArgs { .. } => ErrorKind::ContractViolation,
            HookError::HandlerFailed { .. } => ErrorKind::Handler,
            HookError::ToolFailed { .. } | HookError::ToolOutput { .. } => ErrorKind::Tool,
            HookError::InvalidStateName(_) | HookError::StateIo { .. } => ErrorKind::State,
            HookError::MissingEnv(_) | HookError::ConfigError(_) => ErrorKind::Config,
            HookError::IoError(_)
            | HookError::SerializationError(_)
            | HookError::NotRelationHook(_) => ErrorKind::Other,
        }
    }

    /// Whether this error means an invariant of the hook contract was broken.
    pub fn is_contract_violation(&self) -> bool {
        self.kind() == ErrorKind::ContractViolation
    }

    /// A hook tool was called with arguments it cannot accept.
    pub fn invalid_args(command: &str, reason: impl Into<String>) -> Self {
        HookError::InvalidToolArgs {
            command: command.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for HookError {
    fn from(e: serde_json::Error) -> Self {
        HookError::SerializationError(e.to_string())
    }
}

impl From<toml::de::Error> for HookError {
    fn from(e: toml::de::Error) -> Self {
        HookError::ConfigError(e.to_string())
    }
}
