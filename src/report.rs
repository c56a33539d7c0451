// Violation reporting: log records, observer sinks and kind-specific faults.
// A reported violation goes down exactly one path:
// 1. Log mode: one `log` record at the configured level, plus delivery of
//    the same record to every attached sink; the caller continues
// 2. Throw mode: a kind-specific fault returned to the caller as `Err`,
//    carrying the purged stack; no log record is emitted
//
// Sinks are the hook point for embedding code (test harnesses counting
// reports, metrics exporters). They are attached and detached at runtime.
// Logging and sink delivery run with auditing suppressed on the reporting
// thread.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::Level;
use parking_lot::RwLock;
use thiserror::Error;

use crate::config::AuditConfiguration;
use crate::latency::{LatencyLevel, ResourceKind};
use crate::stack::{CallContextFingerprint, Frame};
use crate::suppress;

/// `log` target used for violation records
pub const LOG_TARGET: &str = "reactive_audit";

// ============================================================================
// Violation Details
// ============================================================================

/// Everything known about one reported violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationDetails {
    /// Domain of the offending operation
    kind: ResourceKind,
    /// Latency class of the offending operation
    latency: LatencyLevel,
    /// Name of the intercepted operation, e.g. `File::read`
    operation: String,
    /// Thread the operation ran on
    thread: String,
    /// Purged call path
    fingerprint: CallContextFingerprint,
}

impl ViolationDetails {
    pub fn new(
        kind: ResourceKind,
        latency: LatencyLevel,
        operation: impl Into<String>,
        thread: impl Into<String>,
        fingerprint: CallContextFingerprint,
    ) -> Self {
        Self {
            kind,
            latency,
            operation: operation.into(),
            thread: thread.into(),
            fingerprint,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn latency(&self) -> LatencyLevel {
        self.latency
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn thread(&self) -> &str {
        &self.thread
    }

    pub fn fingerprint(&self) -> &CallContextFingerprint {
        &self.fingerprint
    }

    /// Purged stack, most recent application frame first
    pub fn stack_trace(&self) -> &[Frame] {
        self.fingerprint.frames()
    }

    /// Human-readable description
    pub fn message(&self) -> String {
        format!(
            "{} may block ({} latency) on reactive thread '{}', called at {}",
            self.operation,
            self.latency,
            self.thread,
            self.fingerprint.call_site()
        )
    }
}

impl fmt::Display for ViolationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

// ============================================================================
// Faults
// ============================================================================

/// Fault raised in throw mode, one variant per resource kind
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditViolation {
    #[error("File latency violation: {0}")]
    File(ViolationDetails),

    #[error("Network latency violation: {0}")]
    Network(ViolationDetails),

    #[error("CPU latency violation: {0}")]
    Cpu(ViolationDetails),
}

impl AuditViolation {
    pub fn details(&self) -> &ViolationDetails {
        match self {
            AuditViolation::File(details) | AuditViolation::Network(details) | AuditViolation::Cpu(details) => {
                details
            }
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.details().kind()
    }

    pub fn latency(&self) -> LatencyLevel {
        self.details().latency()
    }

    pub fn message(&self) -> String {
        self.details().message()
    }

    pub fn stack_trace(&self) -> &[Frame] {
        self.details().stack_trace()
    }

    pub fn fingerprint(&self) -> &CallContextFingerprint {
        self.details().fingerprint()
    }
}

impl From<ViolationDetails> for AuditViolation {
    fn from(details: ViolationDetails) -> Self {
        match details.kind() {
            ResourceKind::File => AuditViolation::File(details),
            ResourceKind::Network => AuditViolation::Network(details),
            ResourceKind::Cpu => AuditViolation::Cpu(details),
        }
    }
}

// ============================================================================
// Log Records & Sinks
// ============================================================================

/// Record emitted in log mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationRecord {
    /// Level the record was logged at
    pub level: Level,
    /// Reported violation
    pub details: ViolationDetails,
}

impl fmt::Display for ViolationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} latency {} [{}]: {}",
            self.details.kind(),
            self.details.latency(),
            self.details.fingerprint().digest(),
            self.details
        )
    }
}

/// Observer of violation records
pub trait ReportSink: Send + Sync {
    fn on_violation(&self, record: &ViolationRecord);
}

/// Handle returned by [`SinkRegistry::attach`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkId(u64);

/// Attached sinks, in attach order
#[derive(Default)]
pub struct SinkRegistry {
    sinks: RwLock<Vec<(SinkId, Arc<dyn ReportSink>)>>,
    next_id: AtomicU64,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, sink: Arc<dyn ReportSink>) -> SinkId {
        let id = SinkId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.sinks.write().push((id, sink));
        id
    }

    /// Returns false if `id` was not attached
    pub fn detach(&self, id: SinkId) -> bool {
        let mut sinks = self.sinks.write();
        let before = sinks.len();
        sinks.retain(|(attached, _)| *attached != id);
        sinks.len() != before
    }

    pub fn clear(&self) {
        self.sinks.write().clear();
    }

    pub fn len(&self) -> usize {
        self.sinks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.read().is_empty()
    }

    /// Deliver `record` to every sink. The list is snapshotted first so a
    /// sink may attach or detach without deadlocking.
    pub fn publish(&self, record: &ViolationRecord) {
        let sinks: Vec<Arc<dyn ReportSink>> = self.sinks.read().iter().map(|(_, sink)| Arc::clone(sink)).collect();
        for sink in sinks {
            sink.on_violation(record);
        }
    }
}

impl fmt::Debug for SinkRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkRegistry").field("attached", &self.len()).finish()
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Log or throw `details` according to `config`
pub fn report(
    config: &AuditConfiguration,
    sinks: &SinkRegistry,
    details: ViolationDetails,
) -> Result<(), AuditViolation> {
    if config.throw_on_violation() {
        return Err(AuditViolation::from(details));
    }

    let record = ViolationRecord {
        level: config.log_level(),
        details,
    };
    // a sink or logger doing audited I/O must not report from inside a report
    suppress::suppressed(|| {
        log::log!(target: LOG_TARGET, record.level, "{}", record);
        sinks.publish(&record);
    });
    Ok(())
}
