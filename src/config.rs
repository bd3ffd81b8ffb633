// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Invoicedesk", "invoicedesk"));

pub const ENV_BASE_URL: &str = "INVOICEDESK_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "INVOICEDESK_TIMEOUT_SECS";
pub const ENV_PAGE_SIZE: &str = "INVOICEDESK_PAGE_SIZE";

/// Largest page the invoice service accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub timeout_secs: u64,
    pub page_size: u32,
    pub export_dir: Option<PathBuf>,
    /// Defaults for voucher generation; the service fills in its own when unset.
    pub maker: Option<String>,
    pub voucher_type: Option<String>,
    pub department: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            timeout_secs: 60,
            page_size: 20,
            export_dir: None,
            maker: None,
            voucher_type: None,
            department: None,
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(s).context("Invalid config TOML")?;
        Ok(cfg)
    }

    /// Apply `INVOICEDESK_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("Invalid {} '{}'", ENV_TIMEOUT_SECS, secs))?;
        }
        if let Some(size) = lookup(ENV_PAGE_SIZE) {
            self.page_size = size
                .trim()
                .parse()
                .with_context(|| format!("Invalid {} '{}'", ENV_PAGE_SIZE, size))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("base_url must not be empty");
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be positive");
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            bail!(
                "page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE,
                self.page_size
            );
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific config dir")?;
    Ok(proj.config_dir().join("config.toml"))
}

/// Config file (if present) layered under environment overrides.
pub fn load() -> Result<Config> {
    let path = config_path()?;
    let mut cfg = if path.exists() {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Read config at {}", path.display()))?;
        Config::from_toml_str(&raw).with_context(|| format!("Parse {}", path.display()))?
    } else {
        Config::default()
    };
    cfg.apply_overrides(|key| std::env::var(key).ok())?;
    cfg.validate()?;
    tracing::debug!(base_url = %cfg.base_url, page_size = cfg.page_size, "configuration loaded");
    Ok(cfg)
}
