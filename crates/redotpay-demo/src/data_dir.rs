// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Where the demo looks for its bridge config when none is given.

use std::path::PathBuf;

const CONFIG_FILE: &str = "bridge.json";

/// `$XDG_CONFIG_HOME/redotpay/bridge.json`, falling back to `~/.config`.
pub fn default_config_path() -> PathBuf {
    config_base().join("redotpay").join(CONFIG_FILE)
}

fn config_base() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config");
    }
    // Last resort
    PathBuf::from("/tmp")
}
