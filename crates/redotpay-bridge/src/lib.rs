// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! RedotPay — native payment bridge.
//!
//! The host application calls [`RedotPayBridge::start_pay`] with a loosely
//! typed parameter bag. The bridge validates it, applies the payment
//! environment, presents the SDK's payment sheet over the current top-level
//! window on the main context, and settles a single outcome once the sheet is
//! (or is not) on screen. The SDK's own payment logic stays opaque behind the
//! [`traits::PaymentPlatform`] seam.

pub mod adapter;
pub mod executor;
pub mod orchestrator;
pub mod session;
pub mod traits;
pub mod validator;

#[cfg(target_os = "ios")]
pub mod ios;

#[cfg(not(target_os = "ios"))]
pub mod stub;

use std::sync::Arc;

use redotpay_core::config::BridgeConfig;
use redotpay_core::error::Result;

pub use adapter::{PendingPayment, RedotPayBridge};
pub use orchestrator::PaymentOrchestrator;
pub use session::{DismissSignal, LaunchedSession, SessionController};

/// Platform implementation for the target operating system.
pub fn platform(config: &BridgeConfig) -> Result<Arc<dyn traits::PaymentPlatform>> {
    #[cfg(target_os = "ios")]
    {
        // iOS: objc2 message sends into UIKit and the SDK's classes.
        Ok(Arc::new(ios::IosPlatform::new(config)))
    }
    #[cfg(not(target_os = "ios"))]
    {
        // DESKTOP/CI: no SDK linked, the module probe fails.
        let _ = config;
        Ok(Arc::new(stub::StubPlatform::unavailable()?))
    }
}

/// Build the bridge for this platform.
pub fn bridge(config: BridgeConfig) -> Result<RedotPayBridge> {
    let platform = platform(&config)?;
    Ok(RedotPayBridge::new(platform, config))
}
