// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Short SHA-256 fingerprints so secrets can be correlated in logs without
// being written there.

use sha2::{Digest, Sha256};

/// Number of hex characters kept from the digest.
const FINGERPRINT_LEN: usize = 12;

/// Compute the SHA-256 of `data` as lowercase hex.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Truncated digest of a secret, suitable for `tracing` fields.
///
/// Empty input is reported as `empty` rather than hashed, since that case is
/// the one worth spotting in a log.
pub fn fingerprint(secret: &str) -> String {
    if secret.is_empty() {
        return "empty".to_owned();
    }
    let mut digest = hash_bytes(secret.as_bytes());
    digest.truncate(FINGERPRINT_LEN);
    digest
}
