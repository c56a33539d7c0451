// Latency classification for intercepted operations.
// Every intercepted operation carries a resource kind and a latency level;
// the active configuration holds one optional threshold per kind.
// This module provides:
// 1. The totally ordered latency scale (LOW < MEDIUM < HIGH)
// 2. Resource kind classification (file, network, cpu)
// 3. A copyable threshold table checked on every intercepted call
// 4. The violation predicate used on the hot path (no allocation)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

// ============================================================================
// Core Types
// ============================================================================

/// Severity of a potentially blocking operation.
///
/// The derive order is the severity order: a threshold of `Medium` admits
/// `Medium` and `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LatencyLevel {
    Low,
    Medium,
    High,
}

impl LatencyLevel {
    /// Parse a threshold value; an empty string disables the threshold.
    pub fn parse_threshold(value: &str) -> Result<Option<LatencyLevel>, ConfigError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed.parse().map(Some)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LatencyLevel::Low => "LOW",
            LatencyLevel::Medium => "MEDIUM",
            LatencyLevel::High => "HIGH",
        }
    }
}

impl FromStr for LatencyLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(LatencyLevel::Low),
            "medium" => Ok(LatencyLevel::Medium),
            "high" => Ok(LatencyLevel::High),
            _ => Err(ConfigError::InvalidLatency(s.to_string())),
        }
    }
}

impl fmt::Display for LatencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain of an intercepted operation. Each kind is thresholded independently
/// and maps to its own fault variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    File,
    Network,
    Cpu,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [ResourceKind::File, ResourceKind::Network, ResourceKind::Cpu];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::File => "file",
            ResourceKind::Network => "network",
            ResourceKind::Cpu => "cpu",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Thresholds
// ============================================================================

/// One optional threshold per resource kind. `None` disables auditing for
/// that kind entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LatencyThresholds {
    pub file: Option<LatencyLevel>,
    pub network: Option<LatencyLevel>,
    pub cpu: Option<LatencyLevel>,
}

impl LatencyThresholds {
    /// Every kind audited at the given floor
    pub fn uniform(level: LatencyLevel) -> Self {
        Self {
            file: Some(level),
            network: Some(level),
            cpu: Some(level),
        }
    }

    /// Nothing audited
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: ResourceKind) -> Option<LatencyLevel> {
        match kind {
            ResourceKind::File => self.file,
            ResourceKind::Network => self.network,
            ResourceKind::Cpu => self.cpu,
        }
    }

    pub fn set(&mut self, kind: ResourceKind, level: Option<LatencyLevel>) {
        match kind {
            ResourceKind::File => self.file = level,
            ResourceKind::Network => self.network = level,
            ResourceKind::Cpu => self.cpu = level,
        }
    }
}

/// True iff `kind` has a threshold and `observed` is at or above it.
#[inline]
pub fn is_violation(thresholds: &LatencyThresholds, kind: ResourceKind, observed: LatencyLevel) -> bool {
    match thresholds.get(kind) {
        Some(threshold) => observed >= threshold,
        None => false,
    }
}
