// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the payment bridge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PayBridgeError;
use crate::fingerprint::fingerprint;

/// Unique identifier for one presented payment sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated `startPay` request.
///
/// Only produced by the parameter validator; immutable afterwards. The JWT
/// and public key are redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct PaymentRequestConfig {
    pre_order_id: String,
    jwt_token: String,
    public_key: String,
    language: String,
    is_test: bool,
}

impl PaymentRequestConfig {
    pub fn new(
        pre_order_id: impl Into<String>,
        jwt_token: impl Into<String>,
        public_key: impl Into<String>,
        language: impl Into<String>,
        is_test: bool,
    ) -> Self {
        Self {
            pre_order_id: pre_order_id.into(),
            jwt_token: jwt_token.into(),
            public_key: public_key.into(),
            language: language.into(),
            is_test,
        }
    }

    /// Pre-order identifier from the merchant's order-creation endpoint.
    pub fn pre_order_id(&self) -> &str {
        &self.pre_order_id
    }

    /// Merchant JWT from the merchant login endpoint.
    pub fn jwt_token(&self) -> &str {
        &self.jwt_token
    }

    /// PEM-formatted public key.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_test(&self) -> bool {
        self.is_test
    }
}

impl std::fmt::Debug for PaymentRequestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentRequestConfig")
            .field("pre_order_id", &self.pre_order_id)
            .field("jwt_token", &format_args!("<{}>", fingerprint(&self.jwt_token)))
            .field("public_key", &format_args!("<{}>", fingerprint(&self.public_key)))
            .field("language", &self.language)
            .field("is_test", &self.is_test)
            .finish()
    }
}

/// Codes a rejected `startPay` call carries across the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectCode {
    ModuleNotLoaded,
    InvalidParams,
    StartPayFailed,
    PaymentInProgress,
    BridgeError,
    PlatformUnavailable,
    IoError,
    SerializationError,
}

impl RejectCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModuleNotLoaded => "MODULE_NOT_LOADED",
            Self::InvalidParams => "INVALID_PARAMS",
            Self::StartPayFailed => "START_PAY_FAILED",
            Self::PaymentInProgress => "PAYMENT_IN_PROGRESS",
            Self::BridgeError => "BRIDGE_ERROR",
            Self::PlatformUnavailable => "PLATFORM_UNAVAILABLE",
            Self::IoError => "IO_ERROR",
            Self::SerializationError => "SERIALIZATION_ERROR",
        }
    }
}

impl std::fmt::Display for RejectCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected call: the `(code, message)` pair handed to the promise's reject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub code: RejectCode,
    pub message: String,
    /// Not part of the wire payload; absent when parsed from a bare
    /// `{code, message}` pair.
    #[serde(default)]
    pub class: ErrorClass,
}

impl From<&PayBridgeError> for Rejection {
    fn from(err: &PayBridgeError) -> Self {
        let code = err.code();
        let message = match err {
            PayBridgeError::NoPresentationHost => {
                "Failed to start payment: no presentation host available".to_owned()
            }
            PayBridgeError::StartPayFailed(detail) => format!("Failed to start payment: {detail}"),
            other => other.to_string(),
        };
        Self {
            code,
            message,
            class: err.class(),
        }
    }
}

/// The single result of one `startPay` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The payment sheet was launched.
    Success,
    Failure(Rejection),
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Success => None,
            Self::Failure(r) => Some(r),
        }
    }

    /// Wire payload: `{"success": true}` or `{"code": ..., "message": ...}`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Success => serde_json::json!({ "success": true }),
            Self::Failure(r) => serde_json::json!({ "code": r.code, "message": r.message }),
        }
    }
}

impl From<PayBridgeError> for PaymentOutcome {
    fn from(err: PayBridgeError) -> Self {
        Self::Failure(Rejection::from(&err))
    }
}

/// Where a call or session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Nothing in flight.
    Idle,
    /// Checking the parameter bag.
    Validating,
    /// Environment applied, sheet being put on screen.
    Presenting,
    /// Sheet on screen, waiting for the SDK to dismiss it.
    Active,
    /// Sheet dismissed; the session has been released.
    Dismissed,
}

/// Why the SDK asked for its sheet to be dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DismissReason {
    /// User closed the sheet.
    UserClosed,
    /// Payment flow reached its end inside the SDK.
    FlowCompleted,
    Unknown,
}

/// Record of a finished session, delivered once dismissal has been carried out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClosed {
    pub id: SessionId,
    pub reason: DismissReason,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
}

/// Classification of errors for what the caller may do next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Environment not ready (no window yet, another sheet up); the caller may try again later.
    Transient,
    /// Caller must fix its input.
    UserAction,
    /// Retrying will not help.
    #[default]
    Permanent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParamErrors;

    #[test]
    fn debug_output_redacts_secrets() {
        let config = PaymentRequestConfig::new("PO1", "secret-jwt", "-----BEGIN PUBLIC KEY-----", "en", true);
        let dbg = format!("{config:?}");
        assert!(dbg.contains("PO1"));
        assert!(!dbg.contains("secret-jwt"));
        assert!(!dbg.contains("BEGIN PUBLIC KEY"));
    }

    #[test]
    fn success_payload_shape() {
        assert_eq!(
            PaymentOutcome::Success.to_json(),
            serde_json::json!({ "success": true })
        );
    }

    #[test]
    fn rejection_payload_uses_wire_code() {
        let outcome = PaymentOutcome::from(PayBridgeError::InvalidParameters(ParamErrors::new()));
        let json = outcome.to_json();
        assert_eq!(json["code"], "INVALID_PARAMS");
        assert!(json["message"]
            .as_str()
            .is_some_and(|m| m.starts_with("Missing required parameters")));
    }

    #[test]
    fn no_host_reads_as_start_failure() {
        let rejection = Rejection::from(&PayBridgeError::NoPresentationHost);
        assert_eq!(rejection.code, RejectCode::StartPayFailed);
        assert_eq!(
            rejection.message,
            "Failed to start payment: no presentation host available"
        );
    }

    #[test]
    fn rejection_keeps_error_class_off_the_wire() {
        let outcome = PaymentOutcome::from(PayBridgeError::NoPresentationHost);
        assert_eq!(outcome.rejection().map(|r| r.class), Some(ErrorClass::Transient));
        assert!(outcome.to_json().get("class").is_none());

        let parsed: Rejection = serde_json::from_value(outcome.to_json()).unwrap();
        assert_eq!(parsed.code, RejectCode::StartPayFailed);
        assert_eq!(parsed.class, ErrorClass::Permanent);
    }

    #[test]
    fn reject_code_serde_matches_as_str() {
        for code in [
            RejectCode::ModuleNotLoaded,
            RejectCode::InvalidParams,
            RejectCode::StartPayFailed,
            RejectCode::PaymentInProgress,
        ] {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, code.as_str());
        }
    }
}
