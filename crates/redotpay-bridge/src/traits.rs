// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the native side of the payment
// bridge.
//
// The SDK's payment logic is opaque; these traits only cover what the bridge
// orchestrates around it: probing for the SDK, preloading its resources,
// pushing the environment into it, finding a window to present on, and
// running work on the UI thread.

use std::sync::Arc;

use redotpay_core::environment::EnvironmentSnapshot;
use redotpay_core::error::Result;

use crate::session::DismissSignal;

/// Unit of work scheduled onto the UI thread.
pub type MainJob = Box<dyn FnOnce() + Send + 'static>;

/// Unified bridge that groups the native capabilities one launch needs.
pub trait PaymentPlatform:
    NativeModuleProbe + ResourcePreloader + EnvironmentSink + PresentationHostResolver + Send + Sync
{
    /// Human-readable platform name (e.g. "iOS", "Desktop (stub)").
    fn platform_name(&self) -> &str;

    /// The serialized UI-affine context all presentation work runs on.
    fn main_context(&self) -> Arc<dyn MainContext>;
}

/// Whether the native payment SDK is linked into this process.
pub trait NativeModuleProbe {
    fn is_module_loaded(&self) -> bool;
}

/// Fonts and other assets the payment sheet wants registered before it draws.
pub trait ResourcePreloader {
    /// Called from a background thread; failure is logged by the caller only.
    fn preload_resources(&self) -> Result<()>;
}

/// Receives the process-wide environment before the sheet is created.
pub trait EnvironmentSink {
    fn apply_environment(&self, env: &EnvironmentSnapshot) -> Result<()>;
}

/// Locates the container the payment sheet is presented over.
pub trait PresentationHostResolver {
    /// The current top-level container, or `None` while none exists (app
    /// still launching, no foreground scene). Absence is not an error.
    fn resolve_host(&self) -> Option<Box<dyn PresentationHost>>;
}

/// A top-level container able to present a modal payment sheet.
///
/// Only held for the duration of one presentation call.
pub trait PresentationHost {
    /// Short description for logs (e.g. the root controller's class).
    fn describe(&self) -> String;

    /// Present the SDK's payment sheet full-screen. `on_dismiss` must be fired
    /// by the platform when the SDK asks for the sheet to go away.
    fn present_payment(
        self: Box<Self>,
        request: &PresentationRequest<'_>,
        on_dismiss: DismissSignal,
    ) -> Result<Box<dyn PresentedSheet>>;
}

/// Handle to a payment sheet currently on screen.
pub trait PresentedSheet: Send {
    /// Remove the sheet. Always invoked on the main context.
    fn dismiss(self: Box<Self>, animated: bool);
}

/// Serialized UI-thread executor.
pub trait MainContext: Send + Sync {
    /// Queue `job` to run on the UI thread. Jobs run in submission order.
    fn run_on_main(&self, job: MainJob);
}

/// What the SDK needs to build its payment sheet.
#[derive(Debug, Clone, Copy)]
pub struct PresentationRequest<'a> {
    pub pre_order_id: &'a str,
    pub public_key: &'a str,
    pub jwt_token: &'a str,
    pub animated: bool,
}
