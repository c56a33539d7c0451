// Reference interception layer: std I/O types wrapped so every blocking
// call is audited before it runs.
// Latency classes:
// - open / create / metadata: File, LOW
// - read / write / seek / flush / new_line: File, HIGH
//
// In throw mode the fault surfaces as `io::Error` (kind `Other`) with the
// `AuditViolation` kept as its source; the underlying call is not made.

use std::fs::{self, File, Metadata, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::engine::AuditEngine;
use crate::latency::{LatencyLevel, ResourceKind};
use crate::report::AuditViolation;

impl From<AuditViolation> for io::Error {
    fn from(violation: AuditViolation) -> Self {
        io::Error::new(io::ErrorKind::Other, violation)
    }
}

fn audit_file(engine: &AuditEngine, level: LatencyLevel, operation: &str) -> io::Result<()> {
    engine.audit_operation(ResourceKind::File, level, operation)?;
    Ok(())
}

/// Audited `fs::metadata`
pub fn metadata_probe(engine: &AuditEngine, path: impl AsRef<Path>) -> io::Result<Metadata> {
    audit_file(engine, LatencyLevel::Low, "fs::metadata")?;
    fs::metadata(path)
}

// ============================================================================
// Files
// ============================================================================

/// `File` whose every operation is audited
#[derive(Debug)]
pub struct AuditedFile<'e> {
    engine: &'e AuditEngine,
    file: File,
}

impl<'e> AuditedFile<'e> {
    pub fn open(engine: &'e AuditEngine, path: impl AsRef<Path>) -> io::Result<Self> {
        audit_file(engine, LatencyLevel::Low, "File::open")?;
        Ok(Self {
            engine,
            file: File::open(path)?,
        })
    }

    pub fn create(engine: &'e AuditEngine, path: impl AsRef<Path>) -> io::Result<Self> {
        audit_file(engine, LatencyLevel::Low, "File::create")?;
        Ok(Self {
            engine,
            file: File::create(path)?,
        })
    }

    pub fn open_with(engine: &'e AuditEngine, path: impl AsRef<Path>, options: &OpenOptions) -> io::Result<Self> {
        audit_file(engine, LatencyLevel::Low, "OpenOptions::open")?;
        Ok(Self {
            engine,
            file: options.open(path)?,
        })
    }

    pub fn get_ref(&self) -> &File {
        &self.file
    }

    pub fn into_inner(self) -> File {
        self.file
    }
}

impl Read for AuditedFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        audit_file(self.engine, LatencyLevel::High, "File::read")?;
        self.file.read(buf)
    }
}

impl Write for AuditedFile<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        audit_file(self.engine, LatencyLevel::High, "File::write")?;
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        audit_file(self.engine, LatencyLevel::High, "File::flush")?;
        self.file.flush()
    }
}

impl Seek for AuditedFile<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        audit_file(self.engine, LatencyLevel::High, "File::seek")?;
        self.file.seek(pos)
    }
}

// ============================================================================
// Writers
// ============================================================================

/// Line-oriented writer over any sink
#[derive(Debug)]
pub struct AuditedWriter<'e, W: Write> {
    engine: &'e AuditEngine,
    inner: W,
}

impl<'e, W: Write> AuditedWriter<'e, W> {
    pub fn new(engine: &'e AuditEngine, inner: W) -> Self {
        Self { engine, inner }
    }

    /// Write the platform line separator
    pub fn new_line(&mut self) -> io::Result<()> {
        audit_file(self.engine, LatencyLevel::High, "Writer::new_line")?;
        self.inner.write_all(b"\n")
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for AuditedWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        audit_file(self.engine, LatencyLevel::High, "Writer::write")?;
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        audit_file(self.engine, LatencyLevel::High, "Writer::flush")?;
        self.inner.flush()
    }
}
