// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Alert text for rejected payment launches.
//
// The host shows one alert per rejection. Title and body follow what the
// merchant sample app shows; the suggestion is extra body text a host may add.

use crate::error::PayBridgeError;
use crate::types::{ErrorClass, RejectCode, Rejection};

/// Severity of a rejection from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Try again in a moment (no window yet, another sheet still open).
    Transient,
    /// Something the merchant app sent needs fixing.
    ActionRequired,
    /// The app build itself is broken for payments.
    Permanent,
}

/// A rejection rendered for an alert dialog.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Alert title.
    pub title: String,
    /// Alert body.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Whether offering a "Try again" button makes sense.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a rejection received across the bridge into alert text.
///
/// Title and body follow the code; whether to offer a retry follows the
/// rejection's class.
pub fn humanize_rejection(rejection: &Rejection) -> HumanError {
    let (title, message, suggestion) = match rejection.code {
        RejectCode::ModuleNotLoaded => (
            "Error",
            "RedotPayBridge module not loaded".to_owned(),
            "Payments are not available in this build of the app.",
        ),
        RejectCode::InvalidParams => (
            "Failed",
            format!("Payment failed to start: {}", rejection.message),
            "Check the order details and sign in again, then retry.",
        ),
        RejectCode::PaymentInProgress => (
            "Failed",
            format!("Payment failed to start: {}", rejection.message),
            "Finish or close the open payment first.",
        ),
        RejectCode::StartPayFailed => (
            "Failed",
            format!("Payment failed to start: {}", rejection.message),
            match rejection.class {
                ErrorClass::Transient => "Wait for the app to finish opening, then try again.",
                _ => "Please try again later.",
            },
        ),
        RejectCode::BridgeError
        | RejectCode::PlatformUnavailable
        | RejectCode::IoError
        | RejectCode::SerializationError => (
            "Error",
            format!("Payment error: {}", rejection.message),
            "Please try again later.",
        ),
    };

    let severity = match rejection.class {
        ErrorClass::Transient => Severity::Transient,
        ErrorClass::UserAction => Severity::ActionRequired,
        ErrorClass::Permanent => Severity::Permanent,
    };

    HumanError {
        title: title.into(),
        message,
        suggestion: suggestion.into(),
        retriable: severity == Severity::Transient,
        severity,
    }
}

/// Convenience for native-side callers holding the error itself.
pub fn humanize_error(err: &PayBridgeError) -> HumanError {
    humanize_rejection(&Rejection::from(err))
}
