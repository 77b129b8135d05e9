// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub platform for desktop/CI builds where the payment SDK is unavailable.
//
// `StubPlatform::unavailable()` behaves like an app built without the SDK:
// the module probe fails. `StubPlatform::simulated()` stands in for a device
// with a headless window so the whole launch path can run off-device. It
// records what it was asked to do.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use redotpay_core::environment::EnvironmentSnapshot;
use redotpay_core::error::{PayBridgeError, Result};
use redotpay_core::types::DismissReason;

use crate::executor::MainQueue;
use crate::session::DismissSignal;
use crate::traits::*;

/// Desktop stand-in for the native payment module.
pub struct StubPlatform {
    loaded: bool,
    host_available: AtomicBool,
    fail_preload: AtomicBool,
    fail_environment: AtomicBool,
    main: Arc<MainQueue>,
    log: Arc<StubLog>,
}

/// What the stub has been asked to do.
#[derive(Default)]
struct StubLog {
    refuse_presentation: AtomicBool,
    preloads: AtomicUsize,
    host_lookups: AtomicUsize,
    presentations: AtomicUsize,
    dismissals: AtomicUsize,
    environments: Mutex<Vec<EnvironmentSnapshot>>,
    presented_orders: Mutex<Vec<String>>,
    signal: Mutex<Option<DismissSignal>>,
}

impl StubPlatform {
    /// No SDK linked: every call fails the module probe.
    pub fn unavailable() -> std::io::Result<Self> {
        Self::build(false)
    }

    /// SDK present with a headless window to present on.
    pub fn simulated() -> std::io::Result<Self> {
        Self::build(true)
    }

    fn build(loaded: bool) -> std::io::Result<Self> {
        Ok(Self {
            loaded,
            host_available: AtomicBool::new(true),
            fail_preload: AtomicBool::new(false),
            fail_environment: AtomicBool::new(false),
            main: Arc::new(MainQueue::spawn("redotpay-main")?),
            log: Arc::default(),
        })
    }

    /// Simulate the app having (or not yet having) a foreground window.
    pub fn set_host_available(&self, available: bool) {
        self.host_available.store(available, Ordering::SeqCst);
    }

    /// Make the resource preload report a failure.
    pub fn set_preload_fails(&self, fails: bool) {
        self.fail_preload.store(fails, Ordering::SeqCst);
    }

    /// Make pushing the environment into the SDK fail.
    pub fn set_environment_fails(&self, fails: bool) {
        self.fail_environment.store(fails, Ordering::SeqCst);
    }

    /// Make the SDK refuse to build its payment controller.
    pub fn set_presentation_refused(&self, refused: bool) {
        self.log.refuse_presentation.store(refused, Ordering::SeqCst);
    }

    /// Simulate the SDK asking for its sheet to be closed. Returns `false` if
    /// no sheet was presented or the signal had already fired.
    pub fn dismiss_sheet(&self, reason: DismissReason) -> bool {
        let signal = lock(&self.log.signal).clone();
        signal.is_some_and(|s| s.fire(reason))
    }

    pub fn preload_count(&self) -> usize {
        self.log.preloads.load(Ordering::SeqCst)
    }

    pub fn host_lookup_count(&self) -> usize {
        self.log.host_lookups.load(Ordering::SeqCst)
    }

    pub fn presentation_count(&self) -> usize {
        self.log.presentations.load(Ordering::SeqCst)
    }

    pub fn dismissal_count(&self) -> usize {
        self.log.dismissals.load(Ordering::SeqCst)
    }

    /// Environments pushed into the SDK, oldest first.
    pub fn applied_environments(&self) -> Vec<EnvironmentSnapshot> {
        lock(&self.log.environments).clone()
    }

    /// Pre-order ids of every presented sheet, oldest first.
    pub fn presented_orders(&self) -> Vec<String> {
        lock(&self.log.presented_orders).clone()
    }
}

impl PaymentPlatform for StubPlatform {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }

    fn main_context(&self) -> Arc<dyn MainContext> {
        self.main.clone()
    }
}

impl NativeModuleProbe for StubPlatform {
    fn is_module_loaded(&self) -> bool {
        self.loaded
    }
}

impl ResourcePreloader for StubPlatform {
    fn preload_resources(&self) -> Result<()> {
        self.log.preloads.fetch_add(1, Ordering::SeqCst);
        if self.fail_preload.load(Ordering::SeqCst) {
            return Err(PayBridgeError::Bridge("stub font bundle missing".into()));
        }
        Ok(())
    }
}

impl EnvironmentSink for StubPlatform {
    fn apply_environment(&self, env: &EnvironmentSnapshot) -> Result<()> {
        if !self.loaded {
            tracing::warn!("EnvironmentSink::apply_environment called on unavailable stub");
            return Err(PayBridgeError::PlatformUnavailable);
        }
        if self.fail_environment.load(Ordering::SeqCst) {
            return Err(PayBridgeError::Bridge("stub could not set SDK environment".into()));
        }
        lock(&self.log.environments).push(env.clone());
        Ok(())
    }
}

impl PresentationHostResolver for StubPlatform {
    fn resolve_host(&self) -> Option<Box<dyn PresentationHost>> {
        self.log.host_lookups.fetch_add(1, Ordering::SeqCst);
        if !self.loaded || !self.host_available.load(Ordering::SeqCst) {
            return None;
        }
        Some(Box::new(StubHost {
            log: Arc::clone(&self.log),
        }))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Headless top-level window.
struct StubHost {
    log: Arc<StubLog>,
}

impl PresentationHost for StubHost {
    fn describe(&self) -> String {
        "headless window".into()
    }

    fn present_payment(
        self: Box<Self>,
        request: &PresentationRequest<'_>,
        on_dismiss: DismissSignal,
    ) -> Result<Box<dyn PresentedSheet>> {
        tracing::info!(
            pre_order = request.pre_order_id,
            animated = request.animated,
            "stub: presenting payment sheet"
        );
        if self.log.refuse_presentation.load(Ordering::SeqCst) {
            tracing::warn!("stub: SDK refused to build the payment controller");
            return Err(PayBridgeError::Bridge("payment controller refused".into()));
        }
        self.log.presentations.fetch_add(1, Ordering::SeqCst);
        lock(&self.log.presented_orders).push(request.pre_order_id.to_owned());
        *lock(&self.log.signal) = Some(on_dismiss);
        Ok(Box::new(StubSheet {
            log: Arc::clone(&self.log),
        }))
    }
}

struct StubSheet {
    log: Arc<StubLog>,
}

impl PresentedSheet for StubSheet {
    fn dismiss(self: Box<Self>, animated: bool) {
        tracing::info!(animated, "stub: dismissing payment sheet");
        self.log.dismissals.fetch_add(1, Ordering::SeqCst);
    }
}
