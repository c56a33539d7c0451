//! TOML audit settings.
//!
//! Every key is optional; absent keys keep the value of the snapshot the
//! transaction was staged from. String values may reference environment
//! variables as `${NAME}`.
//!
//! ```toml
//! log = "info"
//! throw_exceptions = false
//! thread_pattern = "${REACTOR_THREADS}"
//! latency_file = "medium"
//! latency_network = "low"
//! latency_cpu = ""
//! bootstrap_delay = 500
//! ```

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use log::{info, Level};
use regex::Regex;
use serde::Deserialize;

use crate::config::{ConfigError, ConfigTransaction};
use crate::engine::AuditEngine;
use crate::report::LOG_TARGET;

/// Parsed settings document
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditSettings {
    pub log: Option<String>,
    pub throw_exceptions: Option<bool>,
    pub thread_pattern: Option<String>,
    pub latency_file: Option<String>,
    pub latency_network: Option<String>,
    pub latency_cpu: Option<String>,
    /// Milliseconds
    pub bootstrap_delay: Option<u64>,
}

impl AuditSettings {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Substitute `${NAME}` references using `lookup`
    pub fn resolve(self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let expand = |value: Option<String>| value.map(|v| expand_vars(&v, &lookup)).transpose();
        Ok(Self {
            log: expand(self.log)?,
            throw_exceptions: self.throw_exceptions,
            thread_pattern: expand(self.thread_pattern)?,
            latency_file: expand(self.latency_file)?,
            latency_network: expand(self.latency_network)?,
            latency_cpu: expand(self.latency_cpu)?,
            bootstrap_delay: self.bootstrap_delay,
        })
    }

    /// Apply every present key to `tx`
    pub fn apply<'e>(&self, mut tx: ConfigTransaction<'e>) -> Result<ConfigTransaction<'e>, ConfigError> {
        if let Some(log) = &self.log {
            let level = Level::from_str(log.trim()).map_err(|_| ConfigError::InvalidLogLevel(log.clone()))?;
            tx = tx.log(level)?;
        }
        if let Some(throw) = self.throw_exceptions {
            tx = tx.throw_exceptions(throw)?;
        }
        if let Some(pattern) = &self.thread_pattern {
            tx = tx.thread_pattern(pattern)?;
        }
        if let Some(level) = &self.latency_file {
            tx = tx.latency_file(level)?;
        }
        if let Some(level) = &self.latency_network {
            tx = tx.latency_network(level)?;
        }
        if let Some(level) = &self.latency_cpu {
            tx = tx.latency_cpu(level)?;
        }
        if let Some(millis) = self.bootstrap_delay {
            tx = tx.bootstrap_delay(millis)?;
        }
        Ok(tx)
    }
}

fn var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("literal pattern compiles"))
}

fn expand_vars(value: &str, lookup: &impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
    let mut expanded = String::with_capacity(value.len());
    let mut last = 0;
    for caps in var_pattern().captures_iter(value) {
        let Some(whole) = caps.get(0) else { continue };
        let name = &caps[1];
        let resolved = lookup(name).ok_or_else(|| ConfigError::UndefinedVariable(name.to_string()))?;
        expanded.push_str(&value[last..whole.start()]);
        expanded.push_str(&resolved);
        last = whole.end();
    }
    expanded.push_str(&value[last..]);
    Ok(expanded)
}

fn from_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

impl AuditEngine {
    /// Stage the settings file at `path` on top of the current snapshot.
    /// Nothing is published until the returned transaction is committed.
    pub fn load_settings(&self, path: impl AsRef<Path>) -> Result<ConfigTransaction<'_>, ConfigError> {
        let path = path.as_ref();
        let settings = AuditSettings::from_path(path)?.resolve(from_env)?;
        let tx = settings.apply(self.begin())?;
        info!(target: LOG_TARGET, "Staged audit settings from {}", path.display());
        Ok(tx)
    }

    /// Same as [`load_settings`](Self::load_settings) for an in-memory document
    pub fn settings_from_str(&self, text: &str) -> Result<ConfigTransaction<'_>, ConfigError> {
        let settings = AuditSettings::from_toml(text)?.resolve(from_env)?;
        settings.apply(self.begin())
    }
}
