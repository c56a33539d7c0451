// Audit configuration snapshots and the transaction that publishes them.
// Readers never see a configuration being composed: every change is staged
// on a private copy and published as a whole by `commit()`.
// This module provides:
// 1. The immutable configuration snapshot read on every audited call
// 2. The built-in default and the strict preset
// 3. A staging transaction with Draft/Sealed states and validating setters
// 4. The configuration error taxonomy
//
// Lifecycle:
// - begin(): copy the current snapshot into a Draft transaction
// - setters: validate input, mutate the staging copy only
// - seal(): forbid further edits, commit still allowed
// - commit(): stamp version + publish time, swap into the engine slot

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::Level;
use thiserror::Error;

use crate::engine::AuditEngine;
use crate::latency::{LatencyLevel, LatencyThresholds, ResourceKind};
use crate::thread_filter::ThreadNamePattern;

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while building or loading a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid latency level: {0:?} (expected low, medium, high or empty)")]
    InvalidLatency(String),

    #[error("Invalid log level: {0:?}")]
    InvalidLogLevel(String),

    #[error("Invalid thread pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Transaction is sealed, no further edits allowed")]
    Sealed,

    #[error("Undefined variable ${{{0}}} in audit settings")]
    UndefinedVariable(String),

    #[error("Failed to read audit settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Audit settings parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

// ============================================================================
// Configuration Snapshot
// ============================================================================

/// Immutable policy snapshot.
///
/// Once published a snapshot never changes; the next commit replaces it.
#[derive(Debug, Clone)]
pub struct AuditConfiguration {
    /// Level used for violation log records
    log_level: Level,
    /// Raise a fault instead of logging
    throw_on_violation: bool,
    /// Threads admitted to auditing
    thread_pattern: ThreadNamePattern,
    /// Per-kind latency floors
    thresholds: LatencyThresholds,
    /// Silence window after publication
    bootstrap_delay: Duration,
    /// Set when the staging transaction was sealed
    sealed: bool,
    /// When this snapshot was published
    published_at: Instant,
    /// Commit counter, 0 until the first commit of an engine
    version: u64,
}

impl AuditConfiguration {
    /// Preset auditing every kind at the lowest level and throwing
    pub fn strict() -> Self {
        Self {
            log_level: Level::Warn,
            throw_on_violation: true,
            thread_pattern: ThreadNamePattern::match_all(),
            thresholds: LatencyThresholds::uniform(LatencyLevel::Low),
            bootstrap_delay: Duration::ZERO,
            sealed: true,
            published_at: Instant::now(),
            version: 0,
        }
    }

    pub fn log_level(&self) -> Level {
        self.log_level
    }

    pub fn throw_on_violation(&self) -> bool {
        self.throw_on_violation
    }

    pub fn thread_pattern(&self) -> &ThreadNamePattern {
        &self.thread_pattern
    }

    pub fn thresholds(&self) -> &LatencyThresholds {
        &self.thresholds
    }

    pub fn latency(&self, kind: ResourceKind) -> Option<LatencyLevel> {
        self.thresholds.get(kind)
    }

    pub fn bootstrap_delay(&self) -> Duration {
        self.bootstrap_delay
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn published_at(&self) -> Instant {
        self.published_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// True while `now` falls inside the bootstrap window of this snapshot
    pub fn in_bootstrap_grace(&self, now: Instant) -> bool {
        !self.bootstrap_delay.is_zero() && now.saturating_duration_since(self.published_at) < self.bootstrap_delay
    }

    pub(crate) fn stamp(mut self, version: u64, published_at: Instant) -> Self {
        self.version = version;
        self.published_at = published_at;
        self
    }
}

impl Default for AuditConfiguration {
    fn default() -> Self {
        Self {
            log_level: Level::Warn,
            throw_on_violation: false,
            thread_pattern: ThreadNamePattern::match_all(),
            thresholds: LatencyThresholds::uniform(LatencyLevel::Low),
            bootstrap_delay: Duration::ZERO,
            sealed: false,
            published_at: Instant::now(),
            version: 0,
        }
    }
}

// ============================================================================
// Transaction
// ============================================================================

/// Edit state of a staging transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Draft,
    Sealed,
}

/// Staging copy of a configuration, published by [`ConfigTransaction::commit`].
///
/// Setters consume the transaction and hand it back on success, so a chain
/// reads `engine.begin().log(Level::Info)?.latency_file("low")?.commit()`.
/// A failed setter drops the transaction; nothing was published.
#[must_use = "a transaction has no effect until committed"]
pub struct ConfigTransaction<'e> {
    engine: &'e AuditEngine,
    staging: AuditConfiguration,
    state: TransactionState,
}

impl<'e> ConfigTransaction<'e> {
    pub(crate) fn new(engine: &'e AuditEngine, mut staging: AuditConfiguration) -> Self {
        staging.sealed = false;
        Self {
            engine,
            staging,
            state: TransactionState::Draft,
        }
    }

    pub(crate) fn sealed(engine: &'e AuditEngine, staging: AuditConfiguration) -> Self {
        Self::new(engine, staging).seal()
    }

    fn ensure_draft(&self) -> Result<(), ConfigError> {
        match self.state {
            TransactionState::Draft => Ok(()),
            TransactionState::Sealed => Err(ConfigError::Sealed),
        }
    }

    /// Log level of violation records
    pub fn log(mut self, level: Level) -> Result<Self, ConfigError> {
        self.ensure_draft()?;
        self.staging.log_level = level;
        Ok(self)
    }

    /// Raise faults instead of logging
    pub fn throw_exceptions(mut self, throw: bool) -> Result<Self, ConfigError> {
        self.ensure_draft()?;
        self.staging.throw_on_violation = throw;
        Ok(self)
    }

    /// Regex that admitted thread names must match in full
    pub fn thread_pattern(mut self, pattern: &str) -> Result<Self, ConfigError> {
        self.ensure_draft()?;
        self.staging.thread_pattern = ThreadNamePattern::new(pattern)?;
        Ok(self)
    }

    /// Typed threshold setter; `None` disables the kind
    pub fn latency(mut self, kind: ResourceKind, level: Option<LatencyLevel>) -> Result<Self, ConfigError> {
        self.ensure_draft()?;
        self.staging.thresholds.set(kind, level);
        Ok(self)
    }

    fn latency_named(self, kind: ResourceKind, level: &str) -> Result<Self, ConfigError> {
        self.ensure_draft()?;
        let parsed = LatencyLevel::parse_threshold(level)?;
        self.latency(kind, parsed)
    }

    pub fn latency_file(self, level: &str) -> Result<Self, ConfigError> {
        self.latency_named(ResourceKind::File, level)
    }

    pub fn latency_network(self, level: &str) -> Result<Self, ConfigError> {
        self.latency_named(ResourceKind::Network, level)
    }

    pub fn latency_cpu(self, level: &str) -> Result<Self, ConfigError> {
        self.latency_named(ResourceKind::Cpu, level)
    }

    /// Grace window in milliseconds, measured from the commit
    pub fn bootstrap_delay(mut self, millis: u64) -> Result<Self, ConfigError> {
        self.ensure_draft()?;
        self.staging.bootstrap_delay = Duration::from_millis(millis);
        Ok(self)
    }

    /// Forbid further edits. The transaction can still be committed.
    pub fn seal(mut self) -> Self {
        self.state = TransactionState::Sealed;
        self.staging.sealed = true;
        self
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn is_sealed(&self) -> bool {
        self.state == TransactionState::Sealed
    }

    /// Preview of what `commit()` will publish (unstamped)
    pub fn staged(&self) -> &AuditConfiguration {
        &self.staging
    }

    /// Publish the staging copy as the engine's current configuration
    pub fn commit(self) -> Arc<AuditConfiguration> {
        self.engine.publish(self.staging)
    }
}

impl fmt::Debug for ConfigTransaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigTransaction")
            .field("state", &self.state)
            .field("staging", &self.staging)
            .finish()
    }
}
