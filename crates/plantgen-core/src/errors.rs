//! Structured error types shared across plantgen crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`PlantgenError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (offending keys, values, table names).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the plantgen pipeline.
///
/// Every variant is fatal: a generation call that returns one of these has
/// produced no table at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum PlantgenError {
    /// Malformed scalar parameters, probability tables or user table schemas.
    #[error("input error: {0}")]
    Input(ErrorInfo),
    /// Requested population exceeds what the tillering model can produce.
    #[error("cardinality error: {0}")]
    Cardinality(ErrorInfo),
    /// A generated axis or phytomer could not be matched to user data.
    #[error("reconcile error: {0}")]
    Reconcile(ErrorInfo),
    /// Reconciled leaf dynamics are not usable for phenology derivation.
    #[error("dynamics error: {0}")]
    Dynamics(ErrorInfo),
    /// Violated preconditions of the time-of-death scheduler.
    #[error("schedule error: {0}")]
    Schedule(ErrorInfo),
    /// Serialization, parsing and file errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl PlantgenError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            PlantgenError::Input(info)
            | PlantgenError::Cardinality(info)
            | PlantgenError::Reconcile(info)
            | PlantgenError::Dynamics(info)
            | PlantgenError::Schedule(info)
            | PlantgenError::Serde(info) => info,
        }
    }

    /// Shorthand for an [`PlantgenError::Input`] error.
    pub fn input(code: &str, message: impl Into<String>) -> Self {
        PlantgenError::Input(ErrorInfo::new(code, message))
    }

    /// Shorthand for a [`PlantgenError::Serde`] error.
    pub fn serde(code: &str, err: impl ToString) -> Self {
        PlantgenError::Serde(ErrorInfo::new(code, err.to_string()))
    }
}
