// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge adapter — the `startPay` entry point the host application calls.
//
// Turns the orchestrator's synchronous launch result into one asynchronous
// outcome. The outcome is settled when the launch is known to have succeeded
// or failed; what the user later does inside the sheet is not reported here.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use redotpay_core::config::BridgeConfig;
use redotpay_core::environment::RuntimeEnvironment;
use redotpay_core::error::{PayBridgeError, Result};
use redotpay_core::types::{PaymentOutcome, SessionState};

use crate::orchestrator::PaymentOrchestrator;
use crate::traits::PaymentPlatform;
use crate::validator;

/// The native payment module as seen by the host application.
pub struct RedotPayBridge {
    platform: Arc<dyn PaymentPlatform>,
    orchestrator: Arc<PaymentOrchestrator>,
    environment: RuntimeEnvironment,
    module_name: String,
    in_flight: Arc<AtomicBool>,
}

impl RedotPayBridge {
    pub fn new(platform: Arc<dyn PaymentPlatform>, config: BridgeConfig) -> Self {
        Self::with_environment(platform, config, RuntimeEnvironment::new())
    }

    /// Share an existing environment handle instead of creating one.
    pub fn with_environment(
        platform: Arc<dyn PaymentPlatform>,
        config: BridgeConfig,
        environment: RuntimeEnvironment,
    ) -> Self {
        let orchestrator = Arc::new(PaymentOrchestrator::new(Arc::clone(&platform), &config));
        Self {
            platform,
            orchestrator,
            environment,
            module_name: config.module_name,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Name the module is registered under.
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// The module must be set up on the main queue.
    pub fn requires_main_queue_setup() -> bool {
        true
    }

    pub fn environment(&self) -> &RuntimeEnvironment {
        &self.environment
    }

    pub fn orchestrator(&self) -> &PaymentOrchestrator {
        &self.orchestrator
    }

    /// Where the bridge currently is. `Validating` covers a call that has been
    /// accepted but has not reached presentation yet.
    pub fn state(&self) -> SessionState {
        match self.orchestrator.sessions().state() {
            SessionState::Idle | SessionState::Dismissed if self.in_flight.load(Ordering::Acquire) => {
                SessionState::Validating
            }
            state => state,
        }
    }

    /// Start a payment and wait for the launch outcome.
    ///
    /// Never fails outright; every problem becomes a `Failure` outcome.
    pub async fn start_pay(&self, params: &Value) -> PaymentOutcome {
        match self.begin_pay(params) {
            Ok(pending) => pending.await,
            Err(e) => e.into(),
        }
    }

    /// Accept a `startPay` call and return its pending outcome.
    ///
    /// # Errors
    ///
    /// `ModuleNotLoaded` before any pending outcome exists, without looking at
    /// `params`. Everything else is delivered through the returned future.
    pub fn begin_pay(&self, params: &Value) -> Result<PendingPayment> {
        if !self.platform.is_module_loaded() {
            warn!(module = %self.module_name, "payment module not loaded");
            return Err(PayBridgeError::ModuleNotLoaded);
        }

        let (tx, rx) = oneshot::channel();
        let pending = PendingPayment { rx };

        let Some(guard) = InFlightGuard::acquire(&self.in_flight) else {
            debug!("startPay rejected, another call is in flight");
            settle(tx, PayBridgeError::PaymentInProgress.into());
            return Ok(pending);
        };
        if self.orchestrator.sessions().is_busy() {
            debug!("startPay rejected, a payment sheet is still open");
            settle(tx, PayBridgeError::PaymentInProgress.into());
            return Ok(pending);
        }

        let request = match validator::validate(params) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "startPay parameters rejected");
                settle(tx, e.into());
                return Ok(pending);
            }
        };

        let orchestrator = Arc::clone(&self.orchestrator);
        let environment = self.environment.clone();
        self.platform.main_context().run_on_main(Box::new(move || {
            let outcome = match orchestrator.launch(&request, &environment) {
                Ok(launched) => {
                    info!(session = %launched.id, "payment sheet launched");
                    PaymentOutcome::Success
                }
                Err(e) => {
                    warn!(error = %e, "payment sheet failed to launch");
                    PaymentOutcome::from(launch_failure(e))
                }
            };
            drop(guard);
            settle(tx, outcome);
        }));

        Ok(pending)
    }
}

/// A launch that did not put a sheet on screen rejects as `START_PAY_FAILED`.
/// Only a busy slot keeps its own code.
fn launch_failure(err: PayBridgeError) -> PayBridgeError {
    match err {
        PayBridgeError::PaymentInProgress
        | PayBridgeError::NoPresentationHost
        | PayBridgeError::StartPayFailed(_) => err,
        other => PayBridgeError::StartPayFailed(other.to_string()),
    }
}

fn settle(tx: oneshot::Sender<PaymentOutcome>, outcome: PaymentOutcome) {
    if tx.send(outcome).is_err() {
        debug!("startPay caller stopped waiting for the outcome");
    }
}

/// Outcome of an accepted `startPay` call. Resolves exactly once.
#[derive(Debug)]
pub struct PendingPayment {
    rx: oneshot::Receiver<PaymentOutcome>,
}

impl Future for PendingPayment {
    type Output = PaymentOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                PayBridgeError::StartPayFailed("main context dropped the request".into()).into()
            })
        })
    }
}

/// Marks a call as in flight until dropped.
struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use redotpay_core::types::RejectCode;

    use super::*;

    #[test]
    fn launch_errors_collapse_to_start_pay_failed() {
        for err in [
            PayBridgeError::Bridge("presentViewController failed".into()),
            PayBridgeError::PlatformUnavailable,
            PayBridgeError::StartPayFailed("sdk refused".into()),
            PayBridgeError::NoPresentationHost,
        ] {
            assert_eq!(launch_failure(err).code(), RejectCode::StartPayFailed);
        }
    }

    #[test]
    fn launch_failure_keeps_detail_and_busy_code() {
        let mapped = launch_failure(PayBridgeError::Bridge("presentViewController failed".into()));
        assert_eq!(
            PaymentOutcome::from(mapped).rejection().map(|r| r.message.clone()),
            Some("Failed to start payment: platform bridge error: presentViewController failed".into())
        );
        assert!(matches!(
            launch_failure(PayBridgeError::PaymentInProgress),
            PayBridgeError::PaymentInProgress
        ));
        assert!(matches!(
            launch_failure(PayBridgeError::NoPresentationHost),
            PayBridgeError::NoPresentationHost
        ));
    }
}
