// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session lifecycle controller.
//
// Owns the single payment sheet on screen. The SDK reports dismissal through a
// one-shot `DismissSignal`; the controller then removes the sheet on the main
// context and releases the session. Only one session may be presenting or
// active at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use redotpay_core::error::{PayBridgeError, Result};
use redotpay_core::types::{DismissReason, SessionClosed, SessionId, SessionState};

use crate::traits::{MainContext, PresentedSheet};

type DismissHandler = Box<dyn FnOnce(DismissReason) + Send + 'static>;

// ---------------------------------------------------------------------------
// DismissSignal
// ---------------------------------------------------------------------------

/// Single-fire dismissal callback handed to the platform with the sheet.
///
/// Clones share one underlying signal. Only the first `fire` runs the
/// handler; later calls are no-ops.
#[derive(Clone)]
pub struct DismissSignal {
    inner: Arc<SignalInner>,
}

struct SignalInner {
    fired: AtomicBool,
    handler: Mutex<Option<DismissHandler>>,
}

impl DismissSignal {
    pub fn new(handler: impl FnOnce(DismissReason) + Send + 'static) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                fired: AtomicBool::new(false),
                handler: Mutex::new(Some(Box::new(handler))),
            }),
        }
    }

    /// Signal dismissal. Returns `false` if the signal had already fired.
    pub fn fire(&self, reason: DismissReason) -> bool {
        if self.inner.fired.swap(true, Ordering::AcqRel) {
            debug!(?reason, "dismissal already signalled, ignoring");
            return false;
        }
        let handler = self
            .inner
            .handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handler) = handler {
            handler(reason);
        }
        true
    }

    pub fn has_fired(&self) -> bool {
        self.inner.fired.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for DismissSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DismissSignal")
            .field("fired", &self.has_fired())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// One payment sheet on screen. Never reused.
struct PresentationSession {
    id: SessionId,
    sheet: Box<dyn PresentedSheet>,
    opened_at: DateTime<Utc>,
    closed_tx: oneshot::Sender<SessionClosed>,
}

impl PresentationSession {
    fn close(self, reason: DismissReason, animated: bool) -> SessionClosed {
        self.sheet.dismiss(animated);
        let record = SessionClosed {
            id: self.id,
            reason,
            opened_at: self.opened_at,
            closed_at: Utc::now(),
        };
        // Nobody may be listening; the adapter drops its end.
        let _ = self.closed_tx.send(record.clone());
        record
    }
}

/// A reserved slot for a sheet that is about to be presented.
pub struct PendingSession {
    id: SessionId,
    signal: DismissSignal,
    closed_tx: oneshot::Sender<SessionClosed>,
    closed_rx: oneshot::Receiver<SessionClosed>,
}

impl PendingSession {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The callback to wire into the SDK's dismissal hook.
    pub fn dismiss_signal(&self) -> DismissSignal {
        self.signal.clone()
    }
}

/// A sheet that made it onto the screen.
#[derive(Debug)]
pub struct LaunchedSession {
    pub id: SessionId,
    closed: oneshot::Receiver<SessionClosed>,
}

impl LaunchedSession {
    /// Resolves once the sheet has been dismissed. `None` if the controller
    /// was torn down first.
    pub async fn closed(self) -> Option<SessionClosed> {
        self.closed.await.ok()
    }
}

enum Slot {
    Idle,
    Presenting {
        id: SessionId,
        dismissed_early: Option<DismissReason>,
    },
    Active(PresentationSession),
    Dismissed(SessionClosed),
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

/// Tracks the one payment session the process may have.
#[derive(Clone)]
pub struct SessionController {
    slot: Arc<Mutex<Slot>>,
    main: Arc<dyn MainContext>,
    animated: bool,
}

impl SessionController {
    pub fn new(main: Arc<dyn MainContext>, animated: bool) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::Idle)),
            main,
            animated,
        }
    }

    /// Reserve the session slot ahead of presentation.
    ///
    /// # Errors
    ///
    /// `PaymentInProgress` while another sheet is presenting or on screen.
    pub fn begin(&self) -> Result<PendingSession> {
        let mut slot = self.lock();
        if matches!(*slot, Slot::Presenting { .. } | Slot::Active(_)) {
            return Err(PayBridgeError::PaymentInProgress);
        }
        let id = SessionId::new();
        *slot = Slot::Presenting {
            id,
            dismissed_early: None,
        };
        drop(slot);

        let (closed_tx, closed_rx) = oneshot::channel();
        let signal = {
            let slot = Arc::downgrade(&self.slot);
            let main = Arc::clone(&self.main);
            let animated = self.animated;
            DismissSignal::new(move |reason| {
                main.run_on_main(Box::new(move || {
                    if let Some(slot) = slot.upgrade() {
                        finish(&slot, id, reason, animated);
                    }
                }));
            })
        };

        debug!(session = %id, "session slot reserved");
        Ok(PendingSession {
            id,
            signal,
            closed_tx,
            closed_rx,
        })
    }

    /// Take ownership of a presented sheet.
    ///
    /// If the SDK already signalled dismissal while the sheet was being
    /// presented, the sheet is removed straight away.
    pub fn activate(&self, pending: PendingSession, sheet: Box<dyn PresentedSheet>) -> LaunchedSession {
        let PendingSession {
            id,
            closed_tx,
            closed_rx,
            ..
        } = pending;
        let session = PresentationSession {
            id,
            sheet,
            opened_at: Utc::now(),
            closed_tx,
        };

        let mut slot = self.lock();
        match std::mem::replace(&mut *slot, Slot::Idle) {
            Slot::Presenting {
                id: current,
                dismissed_early: None,
            } if current == id => {
                info!(session = %id, "payment session active");
                *slot = Slot::Active(session);
            }
            Slot::Presenting {
                id: current,
                dismissed_early: Some(reason),
            } if current == id => {
                debug!(session = %id, ?reason, "sheet dismissed before activation");
                *slot = Slot::Dismissed(session.close(reason, self.animated));
            }
            other => {
                *slot = other;
                error!(session = %id, "activated a session that was not presenting, removing sheet");
                session.close(DismissReason::Unknown, self.animated);
            }
        }

        LaunchedSession { id, closed: closed_rx }
    }

    /// Release a reservation whose presentation failed.
    pub fn abandon(&self, pending: PendingSession) {
        let mut slot = self.lock();
        if matches!(*slot, Slot::Presenting { id, .. } if id == pending.id) {
            *slot = Slot::Idle;
            debug!(session = %pending.id, "session reservation abandoned");
        }
    }

    pub fn state(&self) -> SessionState {
        match *self.lock() {
            Slot::Idle => SessionState::Idle,
            Slot::Presenting { .. } => SessionState::Presenting,
            Slot::Active(_) => SessionState::Active,
            Slot::Dismissed(_) => SessionState::Dismissed,
        }
    }

    /// Id of the sheet currently on screen.
    pub fn active_session(&self) -> Option<SessionId> {
        match &*self.lock() {
            Slot::Active(session) => Some(session.id),
            _ => None,
        }
    }

    /// Whether a new session would be refused right now.
    pub fn is_busy(&self) -> bool {
        matches!(*self.lock(), Slot::Presenting { .. } | Slot::Active(_))
    }

    /// Record of the most recently dismissed session, until the next begins.
    pub fn last_closed(&self) -> Option<SessionClosed> {
        match &*self.lock() {
            Slot::Dismissed(record) => Some(record.clone()),
            _ => None,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Runs on the main context once the SDK has signalled dismissal.
fn finish(slot: &Mutex<Slot>, id: SessionId, reason: DismissReason, animated: bool) {
    let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
    match std::mem::replace(&mut *slot, Slot::Idle) {
        Slot::Active(session) if session.id == id => {
            info!(session = %id, ?reason, "payment sheet dismissed");
            *slot = Slot::Dismissed(session.close(reason, animated));
        }
        Slot::Presenting { id: current, .. } if current == id => {
            *slot = Slot::Presenting {
                id,
                dismissed_early: Some(reason),
            };
        }
        other => {
            *slot = other;
            debug!(session = %id, "dismissal for a session that is no longer held");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::traits::MainJob;

    struct Inline;

    impl MainContext for Inline {
        fn run_on_main(&self, job: MainJob) {
            job();
        }
    }

    struct CountingSheet(Arc<AtomicUsize>);

    impl PresentedSheet for CountingSheet {
        fn dismiss(self: Box<Self>, _animated: bool) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn controller() -> SessionController {
        SessionController::new(Arc::new(Inline), false)
    }

    #[tokio::test]
    async fn double_fire_dismisses_once() {
        let sessions = controller();
        let dismissals = Arc::new(AtomicUsize::new(0));

        let pending = sessions.begin().unwrap();
        let signal = pending.dismiss_signal();
        let launched = sessions.activate(pending, Box::new(CountingSheet(dismissals.clone())));
        let id = launched.id;
        assert_eq!(sessions.active_session(), Some(id));

        assert!(signal.fire(DismissReason::UserClosed));
        assert!(!signal.fire(DismissReason::FlowCompleted));

        assert_eq!(dismissals.load(Ordering::SeqCst), 1);
        assert_eq!(sessions.state(), SessionState::Dismissed);
        let closed = launched.closed().await.unwrap();
        assert_eq!(closed.id, id);
        assert_eq!(closed.reason, DismissReason::UserClosed);
        assert!(closed.closed_at >= closed.opened_at);
    }

    #[test]
    fn second_session_refused_while_active() {
        let sessions = controller();
        let pending = sessions.begin().unwrap();
        let _launched = sessions.activate(pending, Box::new(CountingSheet(Arc::default())));

        assert!(matches!(sessions.begin(), Err(PayBridgeError::PaymentInProgress)));
        assert!(sessions.is_busy());
    }

    #[test]
    fn second_session_refused_while_presenting() {
        let sessions = controller();
        let _pending = sessions.begin().unwrap();
        assert_eq!(sessions.state(), SessionState::Presenting);
        assert!(matches!(sessions.begin(), Err(PayBridgeError::PaymentInProgress)));
    }

    #[test]
    fn new_session_allowed_after_dismissal() {
        let sessions = controller();
        let pending = sessions.begin().unwrap();
        let signal = pending.dismiss_signal();
        let first = sessions.activate(pending, Box::new(CountingSheet(Arc::default())));
        signal.fire(DismissReason::FlowCompleted);

        assert_eq!(sessions.last_closed().map(|c| c.id), Some(first.id));
        let second = sessions.begin().unwrap();
        assert_ne!(second.id(), first.id);
    }

    #[test]
    fn dismissal_before_activation_removes_sheet_immediately() {
        let sessions = controller();
        let dismissals = Arc::new(AtomicUsize::new(0));

        let pending = sessions.begin().unwrap();
        pending.dismiss_signal().fire(DismissReason::UserClosed);
        assert_eq!(dismissals.load(Ordering::SeqCst), 0);

        sessions.activate(pending, Box::new(CountingSheet(dismissals.clone())));
        assert_eq!(dismissals.load(Ordering::SeqCst), 1);
        assert_eq!(sessions.state(), SessionState::Dismissed);
        assert!(sessions.active_session().is_none());
    }

    #[test]
    fn abandon_frees_the_slot() {
        let sessions = controller();
        let pending = sessions.begin().unwrap();
        sessions.abandon(pending);
        assert_eq!(sessions.state(), SessionState::Idle);
        assert!(sessions.begin().is_ok());
    }

    #[test]
    fn stale_signal_does_not_touch_next_session() {
        let sessions = controller();
        let dismissals = Arc::new(AtomicUsize::new(0));

        let abandoned = sessions.begin().unwrap();
        let stale = abandoned.dismiss_signal();
        sessions.abandon(abandoned);

        let pending = sessions.begin().unwrap();
        let _launched = sessions.activate(pending, Box::new(CountingSheet(dismissals.clone())));
        stale.fire(DismissReason::Unknown);

        assert_eq!(dismissals.load(Ordering::SeqCst), 0);
        assert_eq!(sessions.state(), SessionState::Active);
    }
}
