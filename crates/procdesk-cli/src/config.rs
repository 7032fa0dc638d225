// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use procdesk_app::{Credential, EntitySchema, Session};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "procdesk";
pub const CONFIG_ENV: &str = "PROCDESK_CONFIG_PATH";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_VIEW: &str = "suppliers";
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub remote: Remote,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            remote: Remote::default(),
            session: SessionConfig::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Remote {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Remote {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    pub user: Option<String>,
    pub token: Option<String>,
    pub cookie: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub page_size: Option<i64>,
    pub default_view: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_ENV} to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [remote], [session], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(base_url) = &self.remote.base_url {
            procdesk_remote::parse_base_url(base_url)
                .with_context(|| format!("invalid [remote] in {}", path.display()))?;
        }

        if let Some(timeout) = &self.remote.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed.is_zero() {
                bail!(
                    "remote.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(page_size) = self.ui.page_size
            && page_size <= 0
        {
            bail!(
                "ui.page_size in {} must be positive, got {}",
                path.display(),
                page_size
            );
        }

        if let Some(view) = &self.ui.default_view
            && EntitySchema::builtin(view).is_none()
        {
            bail!(
                "ui.default_view {:?} in {} is not a known view; run `procdesk --list-views`",
                view,
                path.display()
            );
        }

        if self.session.token.is_some() && self.session.cookie.is_some() {
            bail!(
                "[session] in {} sets both token and cookie; keep one",
                path.display()
            );
        }

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.remote.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.remote.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    /// `None` keeps each view's own page size.
    pub fn page_size(&self) -> Option<usize> {
        self.ui
            .page_size
            .and_then(|size| usize::try_from(size).ok())
    }

    pub fn default_view(&self) -> &str {
        self.ui.default_view.as_deref().unwrap_or(DEFAULT_VIEW)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn session(&self) -> Session {
        let session = Session::new(self.session.user.as_deref().unwrap_or_default());
        match (&self.session.token, &self.session.cookie) {
            (Some(token), _) => session.with_credential(Credential::Bearer(token.clone())),
            (None, Some(cookie)) => session.with_credential(Credential::Cookie(cookie.clone())),
            (None, None) => session,
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# procdesk config\n# Place this file at: {}\n\nversion = 1\n\n[remote]\nbase_url = \"{}\"\ntimeout = \"{}\"\n\n[session]\nuser = \"buyer@example.com\"\n# One of:\n# token = \"<bearer token>\"\n# cookie = \"connect.sid=<value>\"\n\n[ui]\n# page_size = 10\ndefault_view = \"{}\"\n\n[log]\n# Overridden by PROCDESK_LOG\nlevel = \"{}\"\n",
            path.display(),
            DEFAULT_BASE_URL,
            DEFAULT_TIMEOUT,
            DEFAULT_VIEW,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}
