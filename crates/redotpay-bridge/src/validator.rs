// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Parameter validation for `startPay`.
//
// The caller hands over a loosely typed parameter bag. Each required key is
// checked for presence and JSON type only; values are not interpreted, so an
// empty string is still a valid string. Every problem is collected before
// failing.

use serde_json::{Map, Value};
use tracing::warn;

use redotpay_core::error::{ParamErrors, PayBridgeError, Result};
use redotpay_core::types::PaymentRequestConfig;

/// Turn a parameter bag into a validated request.
pub fn validate(params: &Value) -> Result<PaymentRequestConfig> {
    let Some(bag) = params.as_object() else {
        let mut errors = ParamErrors::new();
        errors.wrong_type("config", "object", json_type_name(params));
        return Err(PayBridgeError::InvalidParameters(errors));
    };

    let mut errors = ParamErrors::new();
    let pre_order_id = string_field(bag, "preOrderId", &mut errors);
    let jwt_token = string_field(bag, "jwtToken", &mut errors);
    let public_key = string_field(bag, "publicKey", &mut errors);
    let language = string_field(bag, "language", &mut errors);
    let is_test = bool_field(bag, "isTest", &mut errors);

    match (pre_order_id, jwt_token, public_key, language, is_test) {
        (Some(pre_order_id), Some(jwt_token), Some(public_key), Some(language), Some(is_test)) => {
            for (field, value) in [
                ("preOrderId", pre_order_id),
                ("jwtToken", jwt_token),
                ("publicKey", public_key),
            ] {
                if value.is_empty() {
                    warn!(field, "startPay parameter is an empty string");
                }
            }
            Ok(PaymentRequestConfig::new(
                pre_order_id,
                jwt_token,
                public_key,
                language,
                is_test,
            ))
        }
        _ => Err(PayBridgeError::InvalidParameters(errors)),
    }
}

fn string_field<'a>(
    bag: &'a Map<String, Value>,
    field: &'static str,
    errors: &mut ParamErrors,
) -> Option<&'a str> {
    match bag.get(field) {
        None | Some(Value::Null) => {
            errors.missing(field);
            None
        }
        Some(Value::String(s)) => Some(s.as_str()),
        Some(other) => {
            errors.wrong_type(field, "string", json_type_name(other));
            None
        }
    }
}

fn bool_field(bag: &Map<String, Value>, field: &'static str, errors: &mut ParamErrors) -> Option<bool> {
    match bag.get(field) {
        None | Some(Value::Null) => {
            errors.missing(field);
            None
        }
        Some(Value::Bool(b)) => Some(*b),
        Some(other) => {
            errors.wrong_type(field, "boolean", json_type_name(other));
            None
        }
    }
}

/// JSON type name as a JavaScript caller would recognise it.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
