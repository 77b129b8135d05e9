// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Process-wide payment environment (test mode, display language).
//
// The SDK's sheet reads these values while it is on screen. Rather than a
// hidden singleton the environment is an explicit handle passed into each
// launch; clones share state, so whoever launched last wins.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// Language applied before any call has set one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Point-in-time copy of the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    /// Route the sheet to the SDK's test backend.
    pub is_test: bool,
    /// Language code the sheet renders in.
    pub language: String,
}

impl Default for EnvironmentSnapshot {
    fn default() -> Self {
        Self {
            is_test: false,
            language: DEFAULT_LANGUAGE.to_owned(),
        }
    }
}

/// Shared, last-write-wins environment handle.
#[derive(Debug, Clone, Default)]
pub struct RuntimeEnvironment {
    inner: Arc<Mutex<EnvironmentSnapshot>>,
}

impl RuntimeEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_test_mode(&self, is_test: bool) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_test = is_test;
    }

    pub fn set_language(&self, language: &str) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .language = language.to_owned();
    }

    pub fn is_test(&self) -> bool {
        self.snapshot().is_test
    }

    pub fn language(&self) -> String {
        self.snapshot().language
    }

    pub fn snapshot(&self) -> EnvironmentSnapshot {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
