// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dedicated UI-affine thread for platforms without a native main queue
// (desktop builds, CI, the demo host).

use std::sync::mpsc;
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

use tracing::{debug, error};

use crate::traits::{MainContext, MainJob};

/// A single thread that runs submitted jobs one at a time, in order.
pub struct MainQueue {
    sender: Mutex<Option<mpsc::Sender<MainJob>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    thread_id: ThreadId,
}

impl MainQueue {
    /// Start the queue thread.
    pub fn spawn(name: &str) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<MainJob>();
        let worker = thread::Builder::new().name(name.to_owned()).spawn(move || {
            while let Ok(job) = rx.recv() {
                job();
            }
            debug!("main queue drained");
        })?;
        let thread_id = worker.thread().id();
        Ok(Self {
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            thread_id,
        })
    }

    /// Whether the caller is running on the queue thread.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Stop accepting jobs and wait for queued ones to finish.
    ///
    /// Must not be called from the queue thread itself.
    pub fn shutdown(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            if self.is_current() {
                return;
            }
            if worker.join().is_err() {
                error!("main queue thread panicked");
            }
        }
    }
}

impl MainContext for MainQueue {
    fn run_on_main(&self, job: MainJob) {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match sender.as_ref() {
            Some(tx) => {
                if tx.send(job).is_err() {
                    error!("main queue thread is gone, dropping job");
                }
            }
            None => error!("main queue shut down, dropping job"),
        }
    }
}

impl Drop for MainQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}
