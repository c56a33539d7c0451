//! Thread-name admission filter.
//!
//! Only threads whose name matches the configured pattern are audited.
//! Matching is whole-name: the source pattern is anchored before compiling,
//! so `reactor` admits a thread called `reactor` but not `reactor-1`.

use std::fmt;
use std::thread::Thread;

use regex::Regex;

use crate::config::ConfigError;

/// Name used for threads spawned without one.
pub const UNNAMED_THREAD: &str = "<unnamed>";

/// Compiled thread-name pattern that remembers its source text.
#[derive(Clone)]
pub struct ThreadNamePattern {
    source: String,
    compiled: Regex,
}

impl ThreadNamePattern {
    /// Compile `source`, anchored to the whole thread name.
    pub fn new(source: &str) -> Result<Self, ConfigError> {
        let compiled = Regex::new(&format!("^(?:{})$", source)).map_err(|e| ConfigError::InvalidPattern {
            pattern: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            compiled,
        })
    }

    /// Pattern admitting every thread
    pub fn match_all() -> Self {
        Self {
            source: ".*".to_string(),
            compiled: Regex::new("^(?:.*)$").expect("literal pattern compiles"),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True if `thread_name` is audited under this pattern
    pub fn admits(&self, thread_name: &str) -> bool {
        self.compiled.is_match(thread_name)
    }
}

/// Name `thread` is matched under
pub fn thread_name(thread: &Thread) -> &str {
    thread.name().unwrap_or(UNNAMED_THREAD)
}

impl PartialEq for ThreadNamePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for ThreadNamePattern {}

impl fmt::Debug for ThreadNamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ThreadNamePattern").field(&self.source).finish()
    }
}

impl fmt::Display for ThreadNamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
