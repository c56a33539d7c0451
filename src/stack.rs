//! # Call-context fingerprints
//!
//! A fingerprint identifies "this code path": the calling thread's stack with
//! every frame of the audit engine (and of the stack walker) removed.
//!
//! - Frames are captured with the `backtrace` crate and demangled without the
//!   symbol hash, so a frame reads `my_app::handlers::upload`.
//! - [`StackSanitizer`] decides which frames are internal: a fixed prefix list,
//!   minus an allow-list of test markers so the engine's own unit tests keep
//!   their frames.
//! - Two fingerprints are equal iff their purged stacks are frame-for-frame
//!   identical. Reaching the same operation through one extra wrapper frame
//!   gives a different fingerprint.
//!
//! Capturing is comparatively expensive and only happens after the fast-path
//! checks already classified the call as a candidate violation.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use thiserror::Error;

// ================================================================================================
// FRAMES
// ================================================================================================

/// One resolved (or unresolved) stack frame.
///
/// Frames with a source line compare by function, file and line; the
/// instruction pointer only identifies frames without one.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Demangled function path without the trailing hash
    function: Option<String>,
    /// Source file, when debug info is available
    file: Option<String>,
    /// Source line, when debug info is available
    line: Option<u32>,
    /// Instruction pointer of the frame
    address: usize,
}

impl Frame {
    /// Build a frame from symbol information
    pub fn new(function: impl Into<String>, file: Option<&str>, line: Option<u32>) -> Self {
        Self {
            function: Some(function.into()),
            file: file.map(str::to_string),
            line,
            address: 0,
        }
    }

    /// Frame whose symbol could not be resolved
    pub fn unresolved(address: usize) -> Self {
        Self {
            function: None,
            file: None,
            line: None,
            address,
        }
    }

    fn at(mut self, address: usize) -> Self {
        self.address = address;
        self
    }

    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    pub fn address(&self) -> usize {
        self.address
    }

    fn key(&self) -> FrameKey<'_> {
        match (self.function.as_deref(), self.line) {
            (Some(function), Some(line)) => FrameKey::Source {
                function,
                file: self.file.as_deref(),
                line,
            },
            _ => FrameKey::Address(self.address),
        }
    }
}

#[derive(PartialEq, Eq, Hash)]
enum FrameKey<'a> {
    Source {
        function: &'a str,
        file: Option<&'a str>,
        line: u32,
    },
    Address(usize),
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Frame {}

impl Hash for Frame {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.function {
            Some(function) => f.write_str(function)?,
            None => write!(f, "<unknown> @ {:#x}", self.address)?,
        }
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, " ({}:{})", file, line),
            (Some(file), None) => write!(f, " ({})", file),
            _ => Ok(()),
        }
    }
}

// ================================================================================================
// SANITIZER
// ================================================================================================

/// Predicate separating engine-internal frames from application frames.
///
/// A frame is internal when its function path starts with one of the
/// internal prefixes and contains none of the allowed markers. Trait-impl
/// paths such as `<my_crate::Foo as std::io::Read>::read` are matched on the
/// implementing type.
///
/// Purging first cuts the leading region (the stack walker, the engine and
/// any runtime glue interleaved with them), then drops internal frames
/// still present further down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSanitizer {
    internal_prefixes: Vec<String>,
    allowed_markers: Vec<String>,
    runtime_prefixes: Vec<String>,
}

impl StackSanitizer {
    pub fn new(internal_prefixes: Vec<String>, allowed_markers: Vec<String>) -> Self {
        Self {
            internal_prefixes,
            allowed_markers,
            runtime_prefixes: default_runtime_prefixes(),
        }
    }

    pub fn with_internal_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.internal_prefixes.push(prefix.into());
        self
    }

    pub fn with_allowed_marker(mut self, marker: impl Into<String>) -> Self {
        self.allowed_markers.push(marker.into());
        self
    }

    pub fn internal_prefixes(&self) -> &[String] {
        &self.internal_prefixes
    }

    pub fn allowed_markers(&self) -> &[String] {
        &self.allowed_markers
    }

    /// True if `frame` belongs to the engine and must be purged
    pub fn is_internal(&self, frame: &Frame) -> bool {
        let Some(function) = frame.function() else {
            return false;
        };
        let path = function.trim_start_matches('<');
        self.internal_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
            && !self.allowed_markers.iter().any(|marker| path.contains(marker.as_str()))
    }

    /// Unresolved frames, bare C symbols and std/core/alloc frames. These may
    /// sit between engine frames at the top of the stack.
    fn is_glue(&self, frame: &Frame) -> bool {
        match frame.function() {
            None => true,
            Some(function) => {
                let path = function.trim_start_matches('<');
                !path.contains("::") || self.runtime_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
            }
        }
    }

    /// Number of frames above the first application frame that belong to
    /// the walker, the engine or glue between them. With engine frames but
    /// no application frame below them, the whole stack is leading.
    fn leading_len(&self, frames: &[Frame]) -> usize {
        let mut end = 0;
        for (index, frame) in frames.iter().enumerate() {
            if self.is_internal(frame) {
                end = index + 1;
            } else if !self.is_glue(frame) {
                return end;
            }
        }
        if end > 0 {
            frames.len()
        } else {
            0
        }
    }

    /// Drop the leading region and every internal frame, keeping the order
    /// (most recent first)
    pub fn purge(&self, mut frames: Vec<Frame>) -> Vec<Frame> {
        let leading = self.leading_len(&frames);
        frames.drain(..leading);
        frames.retain(|frame| !self.is_internal(frame));
        frames
    }
}

fn default_runtime_prefixes() -> Vec<String> {
    ["std::", "core::", "alloc::"].iter().map(|prefix| prefix.to_string()).collect()
}

impl Default for StackSanitizer {
    fn default() -> Self {
        Self {
            internal_prefixes: vec![format!("{}::", env!("CARGO_CRATE_NAME")), "backtrace::".to_string()],
            allowed_markers: vec!["::tests::".to_string(), "::test::".to_string()],
            runtime_prefixes: default_runtime_prefixes(),
        }
    }
}

// ================================================================================================
// FINGERPRINT
// ================================================================================================

/// Why a fingerprint could not be produced
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("No application frame left after purging {0} captured frames")]
    Empty(usize),

    #[error("Stack walk panicked")]
    Panicked,
}

/// Identity of a call path: the ordered, purged frame sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallContextFingerprint {
    frames: Arc<[Frame]>,
}

impl CallContextFingerprint {
    /// Purge `frames` with `sanitizer`; fails when nothing remains
    pub fn from_frames(frames: Vec<Frame>, sanitizer: &StackSanitizer) -> Result<Self, CaptureError> {
        let captured = frames.len();
        let purged = sanitizer.purge(frames);
        if purged.is_empty() {
            return Err(CaptureError::Empty(captured));
        }
        Ok(Self {
            frames: purged.into(),
        })
    }

    /// Fingerprint the calling thread's current stack
    pub fn capture(sanitizer: &StackSanitizer) -> Result<Self, CaptureError> {
        let frames = panic::catch_unwind(AssertUnwindSafe(capture_frames)).map_err(|_| CaptureError::Panicked)?;
        Self::from_frames(frames, sanitizer)
    }

    /// Purged frames, most recent first
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Innermost application frame: where the audited operation was called
    pub fn call_site(&self) -> &Frame {
        &self.frames[0]
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Short hex digest used to correlate log records
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for frame in self.frames.iter() {
            match frame.key() {
                FrameKey::Source { function, file, line } => {
                    hasher.update(function.as_bytes());
                    hasher.update(file.unwrap_or("").as_bytes());
                    hasher.update(line.to_le_bytes());
                }
                FrameKey::Address(address) => hasher.update(address.to_le_bytes()),
            }
        }
        let hex = format!("{:x}", hasher.finalize());
        hex[..16].to_string()
    }
}

impl fmt::Display for CallContextFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.digest(), self.call_site())
    }
}

/// Walk and resolve the current thread's stack, most recent frame first
pub fn capture_frames() -> Vec<Frame> {
    let mut frames = Vec::new();
    backtrace::trace(|raw| {
        let address = raw.ip() as usize;
        let mut resolved = false;
        backtrace::resolve_frame(raw, |symbol| {
            resolved = true;
            let frame = match symbol.name() {
                Some(name) => {
                    let file = symbol.filename().map(|path| path.display().to_string());
                    Frame::new(format!("{:#}", name), file.as_deref(), symbol.lineno())
                }
                None => Frame::unresolved(address),
            };
            frames.push(frame.at(address));
        });
        if !resolved {
            frames.push(Frame::unresolved(address));
        }
        true
    });
    frames
}
