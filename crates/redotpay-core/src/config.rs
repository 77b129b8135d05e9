// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// Settings for the native payment module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Name the JavaScript side looks the module up by.
    pub module_name: String,
    /// Native SDK class probed to decide whether the module is loaded.
    pub sdk_class: String,
    /// Kick off the background font/resource preload on each launch.
    pub preload_resources: bool,
    /// Animate presenting and dismissing the payment sheet.
    pub animated: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            module_name: "RedotpayRNBridge".into(),
            sdk_class: "RedotPayPaymentController".into(),
            preload_resources: true,
            animated: true,
        }
    }
}

impl BridgeConfig {
    /// Read a config file. Keys absent from the file take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Read a config file, falling back to defaults if it is missing or bad.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if path.exists() {
                    warn!(path = %path.display(), error = %e, "ignoring unreadable bridge config");
                }
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.json");
        let config = BridgeConfig {
            module_name: "PayModule".into(),
            animated: false,
            ..Default::default()
        };

        config.save(&path).unwrap();
        assert_eq!(BridgeConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.json");
        std::fs::write(&path, r#"{ "preload_resources": false }"#).unwrap();

        let config = BridgeConfig::load(&path).unwrap();
        assert!(!config.preload_resources);
        assert_eq!(config.module_name, "RedotpayRNBridge");
    }

    #[test]
    fn missing_or_corrupt_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert_eq!(BridgeConfig::load_or_default(&missing), BridgeConfig::default());

        let corrupt = dir.path().join("corrupt.json");
        std::fs::write(&corrupt, "not json").unwrap();
        assert_eq!(BridgeConfig::load_or_default(&corrupt), BridgeConfig::default());
    }
}
