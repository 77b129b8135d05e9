// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Payment session orchestrator — the SDK entry point.
//
// A launch runs these steps in order, on the main context:
//
// 1. Fire-and-forget resource preload on a background thread.
// 2. Set the test-mode flag.
// 3. Set the language.
// 4. Resolve a presentation host; none means the launch fails.
// 5. Present the sheet full-screen and hand it to the session controller.
//
// Success means the sheet is on screen, not that the payment went through.

use std::sync::Arc;

use tracing::{debug, info, warn};

use redotpay_core::config::BridgeConfig;
use redotpay_core::environment::RuntimeEnvironment;
use redotpay_core::error::{PayBridgeError, Result};
use redotpay_core::fingerprint::fingerprint;
use redotpay_core::types::PaymentRequestConfig;

use crate::session::{LaunchedSession, SessionController};
use crate::traits::{PaymentPlatform, PresentationRequest};

/// Drives one launch against a platform.
pub struct PaymentOrchestrator {
    platform: Arc<dyn PaymentPlatform>,
    sessions: SessionController,
    preload_resources: bool,
    animated: bool,
}

impl PaymentOrchestrator {
    pub fn new(platform: Arc<dyn PaymentPlatform>, config: &BridgeConfig) -> Self {
        let sessions = SessionController::new(platform.main_context(), config.animated);
        Self {
            platform,
            sessions,
            preload_resources: config.preload_resources,
            animated: config.animated,
        }
    }

    pub fn sessions(&self) -> &SessionController {
        &self.sessions
    }

    /// Boolean form of [`launch`](Self::launch): `true` iff a sheet was put
    /// on screen.
    pub fn start_pay(&self, request: &PaymentRequestConfig, env: &RuntimeEnvironment) -> bool {
        match self.launch(request, env) {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "payment launch failed");
                false
            }
        }
    }

    /// Apply the environment and present the payment sheet.
    ///
    /// Must run on the platform's main context.
    ///
    /// # Errors
    ///
    /// - `PaymentInProgress` if a sheet is already presenting or on screen.
    /// - `NoPresentationHost` if there is no window to present on.
    /// - Whatever the platform reports if environment or presentation fails.
    pub fn launch(
        &self,
        request: &PaymentRequestConfig,
        env: &RuntimeEnvironment,
    ) -> Result<LaunchedSession> {
        let pending = self.sessions.begin()?;
        info!(
            session = %pending.id(),
            platform = self.platform.platform_name(),
            pre_order = request.pre_order_id(),
            jwt = %fingerprint(request.jwt_token()),
            language = request.language(),
            is_test = request.is_test(),
            "launching payment sheet"
        );

        if self.preload_resources {
            self.spawn_preload();
        }

        env.set_test_mode(request.is_test());
        env.set_language(request.language());
        if let Err(e) = self.platform.apply_environment(&env.snapshot()) {
            self.sessions.abandon(pending);
            return Err(e);
        }

        let Some(host) = self.platform.resolve_host() else {
            warn!(session = %pending.id(), "no presentation host available");
            self.sessions.abandon(pending);
            return Err(PayBridgeError::NoPresentationHost);
        };
        debug!(session = %pending.id(), host = %host.describe(), "presentation host resolved");

        let presentation = PresentationRequest {
            pre_order_id: request.pre_order_id(),
            public_key: request.public_key(),
            jwt_token: request.jwt_token(),
            animated: self.animated,
        };
        match host.present_payment(&presentation, pending.dismiss_signal()) {
            Ok(sheet) => Ok(self.sessions.activate(pending, sheet)),
            Err(e) => {
                self.sessions.abandon(pending);
                Err(e)
            }
        }
    }

    /// Detached preload; the launch never waits for it.
    fn spawn_preload(&self) {
        let platform = Arc::clone(&self.platform);
        let job = move || {
            if let Err(e) = platform.preload_resources() {
                warn!(error = %e, "payment resource preload failed");
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(job);
            }
            Err(_) => {
                if let Err(e) = std::thread::Builder::new()
                    .name("redotpay-preload".into())
                    .spawn(job)
                {
                    warn!(error = %e, "could not start resource preload thread");
                }
            }
        }
    }
}
