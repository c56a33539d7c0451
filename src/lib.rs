pub mod latency;
pub mod thread_filter;
pub mod config;
pub mod stack;
pub mod dedup;
pub mod report;
pub mod suppress;
pub mod engine;
pub mod settings;
pub mod intercept;

pub use latency::{is_violation, LatencyLevel, LatencyThresholds, ResourceKind};

pub use thread_filter::{thread_name, ThreadNamePattern, UNNAMED_THREAD};

pub use config::{
    AuditConfiguration,     // Immutable configuration snapshot
    ConfigError,            // Configuration error taxonomy
    ConfigTransaction,      // Staging transaction published by commit()
    TransactionState,       // Draft / Sealed
};

pub use stack::{CallContextFingerprint, CaptureError, Frame, StackSanitizer};

pub use dedup::DedupCache;

// Re-export reporting types
pub use report::{
    AuditViolation, ReportSink, SinkId, SinkRegistry, ViolationDetails, ViolationRecord,
    LOG_TARGET,
};

pub use suppress::{is_suppressed, suppress, suppressed, SuppressGuard};

pub use engine::{
    AuditEngine,            // Decision engine and configuration owner
    AuditStats,             // Diagnostic counters snapshot
};

pub use settings::AuditSettings;

pub use intercept::{metadata_probe, AuditedFile, AuditedWriter};
