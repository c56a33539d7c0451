//! # Audit Engine
//!
//! Single entry point for the interception layer and owner of the shared
//! audit state:
//! 1. Current configuration snapshot behind one atomically swapped pointer
//! 2. Dedup cache of already reported call contexts
//! 3. Attached report sinks
//! 4. Non-fatal diagnostic counters
//!
//! `audit()` runs synchronously on the caller's thread. The fast path (a
//! snapshot load and a threshold comparison) neither locks nor allocates;
//! fingerprinting only happens once a call is a candidate violation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use arc_swap::{ArcSwap, Guard};
use log::{debug, info, Level};
use parking_lot::Mutex;
use serde::Serialize;

use crate::config::{AuditConfiguration, ConfigTransaction};
use crate::dedup::DedupCache;
use crate::latency::{self, LatencyLevel, ResourceKind};
use crate::report::{self, AuditViolation, SinkRegistry, ViolationDetails, LOG_TARGET};
use crate::stack::{CallContextFingerprint, StackSanitizer};
use crate::suppress;
use crate::thread_filter;

// ================================================================================================
// DIAGNOSTICS
// ================================================================================================

#[derive(Debug, Default)]
struct AuditCounters {
    violations: AtomicU64,
    exempt_threads: AtomicU64,
    suppressed: AtomicU64,
    grace_skipped: AtomicU64,
    capture_failures: AtomicU64,
    duplicates: AtomicU64,
    reported: AtomicU64,
}

impl AuditCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of the engine's diagnostic counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AuditStats {
    /// Calls at or above their kind's threshold
    pub violations: u64,
    /// Violations on threads outside the pattern
    pub exempt_threads: u64,
    /// Violations inside a suppressed region
    pub suppressed: u64,
    /// Violations inside the bootstrap window
    pub grace_skipped: u64,
    /// Violations dropped because no fingerprint could be taken
    pub capture_failures: u64,
    /// Violations on an already reported call context
    pub duplicates: u64,
    /// Violations logged or thrown
    pub reported: u64,
    /// Call contexts currently remembered
    pub dedup_entries: usize,
}

// ================================================================================================
// ENGINE
// ================================================================================================

/// Audit decision engine.
///
/// Most processes use the shared instance from [`AuditEngine::global`];
/// separate instances are independent (own configuration, cache and sinks).
pub struct AuditEngine {
    /// Current snapshot, replaced wholesale on commit
    slot: ArcSwap<AuditConfiguration>,
    /// Serializes writers and holds the last published version
    commit_lock: Mutex<u64>,
    /// Already reported call contexts
    dedup: DedupCache,
    /// Observers of log-mode records
    sinks: SinkRegistry,
    /// Internal frame predicate
    sanitizer: StackSanitizer,
    counters: AuditCounters,
}

impl AuditEngine {
    pub fn new() -> Self {
        Self::with_sanitizer(StackSanitizer::default())
    }

    /// Engine purging frames with a custom predicate
    pub fn with_sanitizer(sanitizer: StackSanitizer) -> Self {
        Self {
            slot: ArcSwap::from_pointee(AuditConfiguration::default()),
            commit_lock: Mutex::new(0),
            dedup: DedupCache::new(),
            sinks: SinkRegistry::new(),
            sanitizer,
            counters: AuditCounters::default(),
        }
    }

    /// Process-wide engine used by the interception layer
    pub fn global() -> &'static AuditEngine {
        static GLOBAL: OnceLock<AuditEngine> = OnceLock::new();
        GLOBAL.get_or_init(AuditEngine::new)
    }

    // ============================================================================================
    // CONFIGURATION
    // ============================================================================================

    /// Start a transaction staged from the current snapshot
    pub fn begin(&self) -> ConfigTransaction<'_> {
        ConfigTransaction::new(self, self.current().as_ref().clone())
    }

    /// Sealed transaction auditing everything at LOW in throw mode
    pub fn strict(&self) -> ConfigTransaction<'_> {
        ConfigTransaction::sealed(self, AuditConfiguration::strict())
    }

    pub(crate) fn publish(&self, staging: AuditConfiguration) -> Arc<AuditConfiguration> {
        let mut version = self.commit_lock.lock();
        *version += 1;
        let snapshot = Arc::new(staging.stamp(*version, Instant::now()));
        self.slot.store(Arc::clone(&snapshot));
        drop(version);

        debug!(
            target: LOG_TARGET,
            "Published audit configuration v{}: pattern={:?} thresholds={:?} throw={} bootstrap={}ms",
            snapshot.version(),
            snapshot.thread_pattern().as_str(),
            snapshot.thresholds(),
            snapshot.throw_on_violation(),
            snapshot.bootstrap_delay().as_millis()
        );
        snapshot
    }

    /// Republish the built-in default and forget every reported context
    pub fn reset(&self) {
        let snapshot = self.publish(AuditConfiguration::default());
        self.dedup.clear();
        info!(target: LOG_TARGET, "Audit state reset (configuration v{})", snapshot.version());
    }

    /// Current snapshot
    pub fn current(&self) -> Arc<AuditConfiguration> {
        self.slot.load_full()
    }

    pub fn log_level(&self) -> Level {
        self.slot.load().log_level()
    }

    pub fn is_throw(&self) -> bool {
        self.slot.load().throw_on_violation()
    }

    pub fn thread_pattern(&self) -> String {
        self.slot.load().thread_pattern().as_str().to_string()
    }

    pub fn latency(&self, kind: ResourceKind) -> Option<LatencyLevel> {
        self.slot.load().latency(kind)
    }

    pub fn file_latency(&self) -> Option<LatencyLevel> {
        self.latency(ResourceKind::File)
    }

    pub fn network_latency(&self) -> Option<LatencyLevel> {
        self.latency(ResourceKind::Network)
    }

    pub fn cpu_latency(&self) -> Option<LatencyLevel> {
        self.latency(ResourceKind::Cpu)
    }

    pub fn bootstrap_delay(&self) -> Duration {
        self.slot.load().bootstrap_delay()
    }

    /// True if a thread called `name` is audited under the current snapshot
    pub fn is_thread_name_match(&self, name: &str) -> bool {
        self.slot.load().thread_pattern().admits(name)
    }

    // ============================================================================================
    // ACCESSORS
    // ============================================================================================

    pub fn sinks(&self) -> &SinkRegistry {
        &self.sinks
    }

    pub fn sanitizer(&self) -> &StackSanitizer {
        &self.sanitizer
    }

    pub fn stats(&self) -> AuditStats {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        AuditStats {
            violations: load(&self.counters.violations),
            exempt_threads: load(&self.counters.exempt_threads),
            suppressed: load(&self.counters.suppressed),
            grace_skipped: load(&self.counters.grace_skipped),
            capture_failures: load(&self.counters.capture_failures),
            duplicates: load(&self.counters.duplicates),
            reported: load(&self.counters.reported),
            dedup_entries: self.dedup.len(),
        }
    }

    // ============================================================================================
    // AUDIT
    // ============================================================================================

    /// Audit an operation of `kind` with latency `level`.
    ///
    /// Returns `Err` only in throw mode, for the first occurrence of a call
    /// context.
    pub fn audit(&self, kind: ResourceKind, level: LatencyLevel) -> Result<(), AuditViolation> {
        let operation = match kind {
            ResourceKind::File => "file operation",
            ResourceKind::Network => "network operation",
            ResourceKind::Cpu => "cpu-bound operation",
        };
        self.audit_operation(kind, level, operation)
    }

    /// Same as [`audit`](Self::audit), naming the intercepted operation
    pub fn audit_operation(
        &self,
        kind: ResourceKind,
        level: LatencyLevel,
        operation: &str,
    ) -> Result<(), AuditViolation> {
        let config = self.slot.load();
        if !latency::is_violation(config.thresholds(), kind, level) {
            return Ok(());
        }
        AuditCounters::bump(&self.counters.violations);

        let current = thread::current();
        let thread_name = thread_filter::thread_name(&current);
        if !config.thread_pattern().admits(thread_name) {
            AuditCounters::bump(&self.counters.exempt_threads);
            return Ok(());
        }
        if suppress::is_suppressed() {
            AuditCounters::bump(&self.counters.suppressed);
            return Ok(());
        }
        if config.in_bootstrap_grace(Instant::now()) {
            AuditCounters::bump(&self.counters.grace_skipped);
            return Ok(());
        }

        // slow path: keep the snapshot alive without pinning a guard slot
        let config = Guard::into_inner(config);

        let fingerprint = match CallContextFingerprint::capture(&self.sanitizer) {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                AuditCounters::bump(&self.counters.capture_failures);
                debug!(target: LOG_TARGET, "Skipping {} {} report: {}", kind, level, e);
                return Ok(());
            }
        };
        if !self.dedup.mark_if_absent(fingerprint.clone()) {
            AuditCounters::bump(&self.counters.duplicates);
            return Ok(());
        }
        AuditCounters::bump(&self.counters.reported);

        let details = ViolationDetails::new(kind, level, operation, thread_name, fingerprint);
        report::report(&config, &self.sinks, details)
    }
}

impl Default for AuditEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AuditEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditEngine")
            .field("version", &self.slot.load().version())
            .field("dedup_entries", &self.dedup.len())
            .field("sinks", &self.sinks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportSink, ViolationRecord};
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::sync::Barrier;

    #[derive(Default)]
    struct CountingSink {
        count: AtomicUsize,
    }

    impl CountingSink {
        fn count(&self) -> usize {
            self.count.load(Ordering::SeqCst)
        }
    }

    impl ReportSink for CountingSink {
        fn on_violation(&self, _record: &ViolationRecord) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting(engine: &AuditEngine) -> Arc<CountingSink> {
        let sink = Arc::new(CountingSink::default());
        engine.sinks().attach(sink.clone());
        sink
    }

    fn log_mode(engine: &AuditEngine) {
        engine
            .begin()
            .thread_pattern(".*")
            .unwrap()
            .latency_file("LOW")
            .unwrap()
            .log(Level::Info)
            .unwrap()
            .throw_exceptions(false)
            .unwrap()
            .commit();
    }

    #[inline(never)]
    fn latency_call_1(engine: &AuditEngine) -> Result<(), AuditViolation> {
        engine.audit_operation(ResourceKind::File, LatencyLevel::Low, "File::free_space")
    }

    #[inline(never)]
    fn latency_call_2(engine: &AuditEngine) -> Result<(), AuditViolation> {
        engine.audit_operation(ResourceKind::File, LatencyLevel::Low, "File::free_space")
    }

    #[inline(never)]
    fn latency_call_3(engine: &AuditEngine) -> Result<(), AuditViolation> {
        latency_call_1(engine)
    }

    #[inline(never)]
    fn latency_call_4(engine: &AuditEngine) -> Result<(), AuditViolation> {
        latency_call_1(engine)?;
        latency_call_2(engine)
    }

    #[inline(never)]
    fn file_call_low(engine: &AuditEngine) -> Result<(), AuditViolation> {
        engine.audit(ResourceKind::File, LatencyLevel::Low)
    }

    #[inline(never)]
    fn file_call_medium(engine: &AuditEngine) -> Result<(), AuditViolation> {
        engine.audit(ResourceKind::File, LatencyLevel::Medium)
    }

    #[inline(never)]
    fn file_call_high(engine: &AuditEngine) -> Result<(), AuditViolation> {
        engine.audit(ResourceKind::File, LatencyLevel::High)
    }

    #[test]
    fn test_set_all_params() {
        let engine = AuditEngine::new();
        engine
            .begin()
            .log(Level::Debug)
            .unwrap()
            .throw_exceptions(true)
            .unwrap()
            .thread_pattern("")
            .unwrap()
            .latency_file("high")
            .unwrap()
            .latency_network("medium")
            .unwrap()
            .latency_cpu("low")
            .unwrap()
            .bootstrap_delay(10)
            .unwrap()
            .commit();
        assert_eq!(engine.log_level(), Level::Debug);
        assert!(engine.is_throw());
        assert_eq!(engine.thread_pattern(), "");
        assert_eq!(engine.file_latency(), Some(LatencyLevel::High));
        assert_eq!(engine.network_latency(), Some(LatencyLevel::Medium));
        assert_eq!(engine.cpu_latency(), Some(LatencyLevel::Low));
        assert_eq!(engine.bootstrap_delay(), Duration::from_millis(10));

        engine
            .begin()
            .log(Level::Warn)
            .unwrap()
            .throw_exceptions(false)
            .unwrap()
            .thread_pattern("abc")
            .unwrap()
            .latency_file("")
            .unwrap()
            .latency_network("")
            .unwrap()
            .latency_cpu("")
            .unwrap()
            .bootstrap_delay(0)
            .unwrap()
            .commit();
        assert_eq!(engine.log_level(), Level::Warn);
        assert!(!engine.is_throw());
        assert_eq!(engine.thread_pattern(), "abc");
        assert_eq!(engine.file_latency(), None);
        assert_eq!(engine.network_latency(), None);
        assert_eq!(engine.cpu_latency(), None);
        assert_eq!(engine.bootstrap_delay(), Duration::ZERO);
    }

    #[test]
    fn test_commit_versions_increase() {
        let engine = AuditEngine::new();
        assert_eq!(engine.current().version(), 0);
        let first = engine.begin().commit();
        let second = engine.strict().commit();
        assert_eq!(first.version(), 1);
        assert_eq!(second.version(), 2);
        assert!(second.published_at() >= first.published_at());
    }

    #[test]
    fn test_current_thread_matches_strict() {
        let engine = AuditEngine::new();
        engine.strict().commit();
        let name = thread_filter::thread_name(&thread::current()).to_string();
        assert!(engine.is_thread_name_match(&name));
    }

    #[test]
    fn test_current_thread_excluded() {
        let engine = AuditEngine::new();
        engine.begin().thread_pattern("no-such-thread").unwrap().commit();
        let name = thread_filter::thread_name(&thread::current()).to_string();
        assert!(!engine.is_thread_name_match(&name));
    }

    #[test]
    fn test_sealed_then_setter_never_commits() {
        let engine = AuditEngine::new();
        let result = engine.begin().seal().log(Level::Warn);
        assert!(matches!(result, Err(crate::config::ConfigError::Sealed)));
        assert_eq!(engine.current().version(), 0);
    }

    #[test]
    fn test_same_call_site_logged_once() {
        let engine = AuditEngine::new();
        log_mode(&engine);
        let sink = counting(&engine);

        for i in 0..5 {
            let before = sink.count();
            latency_call_1(&engine).unwrap();
            let expected = if i == 0 { 1 } else { 0 };
            assert_eq!(sink.count() - before, expected, "iteration {}", i);
        }
        let stats = engine.stats();
        assert_eq!(stats.reported, 1);
        assert_eq!(stats.duplicates, 4);
    }

    #[test]
    fn test_wrapped_call_site_is_new_context() {
        enum Site {
            Direct,
            Wrapped,
        }

        let engine = AuditEngine::new();
        log_mode(&engine);
        let sink = counting(&engine);

        let plan = [(Site::Direct, 1), (Site::Wrapped, 1), (Site::Direct, 0), (Site::Wrapped, 0)];
        for (step, (site, expected)) in plan.into_iter().enumerate() {
            let before = sink.count();
            match site {
                Site::Direct => latency_call_1(&engine).unwrap(),
                Site::Wrapped => latency_call_3(&engine).unwrap(),
            }
            assert_eq!(sink.count() - before, expected, "step {}", step);
        }
    }

    #[test]
    fn test_log_if_new_across_threads() {
        let engine = AuditEngine::new();
        log_mode(&engine);
        let sink = counting(&engine);

        let ctx1 = || latency_call_1(&engine).unwrap();
        let ctx2 = || latency_call_2(&engine).unwrap();
        let ctx3 = || latency_call_3(&engine).unwrap();
        let ctx4 = || latency_call_4(&engine).unwrap();

        let step = |f: &(dyn Fn() + Sync), expected: usize| {
            let before = sink.count();
            thread::scope(|s| {
                s.spawn(f);
            });
            assert_eq!(sink.count() - before, expected);
        };
        step(&ctx1, 1);
        step(&ctx2, 1);
        step(&ctx1, 0);
        step(&ctx3, 1);
        step(&ctx4, 2);
        step(&ctx3, 0);
        step(&ctx4, 0);
    }

    #[test]
    fn test_threshold_floor_through_engine() {
        let engine = AuditEngine::new();
        engine.begin().latency_file("MEDIUM").unwrap().commit();
        let sink = counting(&engine);

        file_call_low(&engine).unwrap();
        assert_eq!(sink.count(), 0);
        file_call_medium(&engine).unwrap();
        assert_eq!(sink.count(), 1);
        file_call_high(&engine).unwrap();
        assert_eq!(sink.count(), 2);

        let stats = engine.stats();
        assert_eq!(stats.violations, 2);
        assert_eq!(stats.duplicates, 0);
    }

    #[test]
    fn test_repeat_on_one_line_is_one_context() {
        let engine = AuditEngine::new();
        let sink = counting(&engine);
        latency_call_1(&engine).unwrap(); latency_call_1(&engine).unwrap();
        assert_eq!(sink.count(), 1);
        assert_eq!(engine.stats().duplicates, 1);
    }

    #[test]
    fn test_capture_failure_is_skipped_and_counted() {
        // an empty prefix marks every resolved frame internal
        let engine = AuditEngine::with_sanitizer(StackSanitizer::new(vec![String::new()], Vec::new()));
        engine.strict().commit();
        let sink = counting(&engine);

        assert!(latency_call_1(&engine).is_ok());
        assert_eq!(sink.count(), 0);
        let stats = engine.stats();
        assert_eq!(stats.capture_failures, 1);
        assert_eq!(stats.reported, 0);
        assert_eq!(stats.dedup_entries, 0);
    }

    #[test]
    fn test_disabled_kind_is_never_flagged() {
        let engine = AuditEngine::new();
        engine.begin().latency_file("").unwrap().commit();
        let sink = counting(&engine);

        for level in [LatencyLevel::Low, LatencyLevel::Medium, LatencyLevel::High] {
            engine.audit(ResourceKind::File, level).unwrap();
        }
        assert_eq!(sink.count(), 0);
        assert_eq!(engine.stats().violations, 0);
        assert_eq!(engine.stats().dedup_entries, 0);
    }

    #[test]
    fn test_exempt_thread_is_not_fingerprinted() {
        let engine = AuditEngine::new();
        engine.begin().thread_pattern("reactor-\\d+").unwrap().commit();
        let sink = counting(&engine);

        latency_call_1(&engine).unwrap();
        assert_eq!(sink.count(), 0);
        let stats = engine.stats();
        assert_eq!(stats.exempt_threads, 1);
        assert_eq!(stats.dedup_entries, 0);

        thread::scope(|s| {
            thread::Builder::new()
                .name("reactor-1".to_string())
                .spawn_scoped(s, || latency_call_1(&engine).unwrap())
                .unwrap();
        });
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn test_suppressed_region_is_ignored() {
        let engine = AuditEngine::new();
        let sink = counting(&engine);
        {
            let _guard = suppress::suppress();
            latency_call_1(&engine).unwrap();
        }
        assert_eq!(sink.count(), 0);
        assert_eq!(engine.stats().suppressed, 1);
        assert_eq!(engine.stats().dedup_entries, 0);

        latency_call_1(&engine).unwrap();
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn test_bootstrap_grace_silences_after_commit() {
        let engine = AuditEngine::new();
        engine.begin().bootstrap_delay(60_000).unwrap().commit();
        let sink = counting(&engine);

        latency_call_1(&engine).unwrap();
        assert_eq!(sink.count(), 0);
        assert_eq!(engine.stats().grace_skipped, 1);
        assert_eq!(engine.stats().dedup_entries, 0);

        engine.begin().bootstrap_delay(0).unwrap().commit();
        latency_call_1(&engine).unwrap();
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn test_strict_throws_with_clean_stack() {
        let engine = AuditEngine::new();
        engine.strict().commit();

        let err = latency_call_1(&engine).unwrap_err();
        assert!(matches!(err, AuditViolation::File(_)));
        assert_eq!(err.latency(), LatencyLevel::Low);
        assert!(err.message().contains("File::free_space"));

        let crate_prefix = concat!(env!("CARGO_CRATE_NAME"), "::");
        for frame in err.stack_trace() {
            if let Some(function) = frame.function() {
                let path = function.trim_start_matches('<');
                assert!(
                    !(path.starts_with(crate_prefix) && !path.contains("::tests::")),
                    "engine frame leaked: {}",
                    function
                );
            }
        }
        let top = err.stack_trace()[0].function().unwrap_or("");
        assert!(top.ends_with("latency_call_1"), "top frame {}", top);
    }

    #[test]
    fn test_throw_mode_does_not_log() {
        let engine = AuditEngine::new();
        engine.strict().commit();
        let sink = counting(&engine);
        assert!(latency_call_2(&engine).is_err());
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_throw_mode_reports_once_per_context() {
        let engine = AuditEngine::new();
        engine.strict().commit();
        let mut errors = 0;
        for _ in 0..3 {
            if latency_call_2(&engine).is_err() {
                errors += 1;
            }
        }
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_reset_restores_default_and_clears_cache() {
        let engine = AuditEngine::new();
        log_mode(&engine);
        let sink = counting(&engine);

        for _ in 0..2 {
            latency_call_1(&engine).unwrap();
        }
        assert_eq!(sink.count(), 1);

        engine.reset();
        assert_eq!(engine.stats().dedup_entries, 0);
        assert_eq!(engine.log_level(), Level::Warn);
        assert!(!engine.is_throw());
        assert_eq!(engine.thread_pattern(), ".*");

        for _ in 0..2 {
            latency_call_1(&engine).unwrap();
        }
        assert_eq!(sink.count(), 2);
    }

    #[test]
    fn test_concurrent_first_hit_reported_once() {
        const THREADS: usize = 8;
        let engine = AuditEngine::new();
        log_mode(&engine);
        let sink = counting(&engine);
        let barrier = Barrier::new(THREADS);

        let worker = || {
            barrier.wait();
            latency_call_1(&engine).unwrap();
        };
        thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(worker);
            }
        });

        assert_eq!(sink.count(), 1);
        let stats = engine.stats();
        assert_eq!(stats.reported, 1);
        assert_eq!(stats.duplicates, (THREADS - 1) as u64);
    }

    #[test]
    fn test_publish_is_atomic_for_readers() {
        let engine = AuditEngine::new();
        let done = AtomicBool::new(false);

        thread::scope(|s| {
            s.spawn(|| {
                for i in 0..500 {
                    let tx = if i % 2 == 0 {
                        engine
                            .begin()
                            .log(Level::Error)
                            .unwrap()
                            .throw_exceptions(true)
                            .unwrap()
                            .thread_pattern("alpha")
                            .unwrap()
                            .bootstrap_delay(1)
                            .unwrap()
                    } else {
                        engine
                            .begin()
                            .log(Level::Info)
                            .unwrap()
                            .throw_exceptions(false)
                            .unwrap()
                            .thread_pattern("beta")
                            .unwrap()
                            .bootstrap_delay(2)
                            .unwrap()
                    };
                    tx.commit();
                }
                done.store(true, Ordering::SeqCst);
            });

            for _ in 0..4 {
                s.spawn(|| {
                    let mut last_version = 0;
                    while !done.load(Ordering::SeqCst) {
                        let config = engine.current();
                        assert!(config.version() >= last_version);
                        last_version = config.version();
                        match config.thread_pattern().as_str() {
                            "alpha" => {
                                assert!(config.throw_on_violation());
                                assert_eq!(config.log_level(), Level::Error);
                                assert_eq!(config.bootstrap_delay(), Duration::from_millis(1));
                            }
                            "beta" => {
                                assert!(!config.throw_on_violation());
                                assert_eq!(config.log_level(), Level::Info);
                                assert_eq!(config.bootstrap_delay(), Duration::from_millis(2));
                            }
                            ".*" => assert_eq!(config.version(), 0),
                            other => panic!("unexpected pattern {}", other),
                        }
                    }
                });
            }
        });

        assert_eq!(engine.current().version(), 500);
    }

    #[test]
    fn test_global_is_shared() {
        assert!(std::ptr::eq(AuditEngine::global(), AuditEngine::global()));
    }
}
