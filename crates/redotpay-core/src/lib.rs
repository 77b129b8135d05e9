// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// RedotPay bridge — core types and error definitions shared across all crates.

pub mod config;
pub mod environment;
pub mod error;
pub mod fingerprint;
pub mod human_errors;
pub mod types;

pub use config::BridgeConfig;
pub use environment::{EnvironmentSnapshot, RuntimeEnvironment};
pub use error::PayBridgeError;
pub use types::*;
