// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the payment bridge.

use std::fmt;

use thiserror::Error;

use crate::types::{ErrorClass, RejectCode};

/// Keys every `startPay` parameter bag must carry, in the order they are
/// reported to the caller.
pub const REQUIRED_FIELDS: [&str; 5] = ["preOrderId", "jwtToken", "publicKey", "language", "isTest"];

/// Top-level error type for all bridge operations.
#[derive(Debug, Error)]
pub enum PayBridgeError {
    // -- Boundary errors --
    #[error("RedotPayBridge module not loaded")]
    ModuleNotLoaded,

    #[error("{0}")]
    InvalidParameters(ParamErrors),

    #[error("a payment session is already in progress")]
    PaymentInProgress,

    // -- Launch errors --
    #[error("no presentation host available")]
    NoPresentationHost,

    #[error("failed to start payment: {0}")]
    StartPayFailed(String),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PayBridgeError {
    /// Stable code reported to the calling application on rejection.
    ///
    /// Both launch failures share `START_PAY_FAILED`, which is what hosts match
    /// on. The adapter wraps any other launch error in `StartPayFailed`.
    pub fn code(&self) -> RejectCode {
        match self {
            Self::ModuleNotLoaded => RejectCode::ModuleNotLoaded,
            Self::InvalidParameters(_) => RejectCode::InvalidParams,
            Self::PaymentInProgress => RejectCode::PaymentInProgress,
            Self::NoPresentationHost | Self::StartPayFailed(_) => RejectCode::StartPayFailed,
            Self::Bridge(_) => RejectCode::BridgeError,
            Self::PlatformUnavailable => RejectCode::PlatformUnavailable,
            Self::Io(_) => RejectCode::IoError,
            Self::Serialization(_) => RejectCode::SerializationError,
        }
    }

    /// How the caller should treat this failure. Nothing in the bridge retries
    /// on its own; the class only drives what the host tells the user.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidParameters(_) => ErrorClass::UserAction,
            Self::NoPresentationHost | Self::PaymentInProgress | Self::Io(_) => {
                ErrorClass::Transient
            }
            Self::ModuleNotLoaded
            | Self::StartPayFailed(_)
            | Self::Bridge(_)
            | Self::PlatformUnavailable
            | Self::Serialization(_) => ErrorClass::Permanent,
        }
    }
}

/// What is wrong with a single parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    /// Key absent or `null`.
    Missing,
    /// Key present with the wrong JSON type.
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
}

/// One rejected parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub problem: FieldProblem,
}

/// Every problem found in a parameter bag, not just the first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamErrors {
    issues: Vec<FieldIssue>,
}

impl ParamErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn missing(&mut self, field: &'static str) {
        self.issues.push(FieldIssue {
            field,
            problem: FieldProblem::Missing,
        });
    }

    pub fn wrong_type(&mut self, field: &'static str, expected: &'static str, found: &'static str) {
        self.issues.push(FieldIssue {
            field,
            problem: FieldProblem::WrongType { expected, found },
        });
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    /// Names of the offending fields, in report order.
    pub fn fields(&self) -> Vec<&'static str> {
        self.issues.iter().map(|i| i.field).collect()
    }
}

impl fmt::Display for ParamErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Missing required parameters: {}", REQUIRED_FIELDS.join(", "))?;
        if self.issues.is_empty() {
            return Ok(());
        }
        let details: Vec<String> = self
            .issues
            .iter()
            .map(|issue| match &issue.problem {
                FieldProblem::Missing => format!("{}: missing", issue.field),
                FieldProblem::WrongType { expected, found } => {
                    format!("{}: expected {expected}, found {found}", issue.field)
                }
            })
            .collect();
        write!(f, " ({})", details.join("; "))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PayBridgeError>;
