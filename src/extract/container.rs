//! Access to named streams inside an Office binary container.
//!
//! Extractors never parse the compound-file layer themselves. They ask a
//! [`StreamContainer`] whether a stream exists and for its full contents.

use crate::error::{RedactorError, RedactorResult};
use std::collections::HashMap;
use std::io::{Cursor, Read};

/// Signature at the start of every OLE2 compound file.
pub const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Returns true when `bytes` starts with the compound-file signature.
pub fn is_ole(bytes: &[u8]) -> bool {
    bytes.starts_with(&OLE_MAGIC)
}

/// Read access to the named streams of a document container.
pub trait StreamContainer {
    fn exists(&self, name: &str) -> bool;

    /// Reads a whole stream. Fails with [`RedactorError::MissingStream`] when absent.
    fn read_stream(&mut self, name: &str) -> RedactorResult<Vec<u8>>;
}

/// Compound-file container over an in-memory upload.
pub struct OleContainer<'a> {
    inner: cfb::CompoundFile<Cursor<&'a [u8]>>,
}

impl<'a> OleContainer<'a> {
    pub fn open(bytes: &'a [u8]) -> RedactorResult<Self> {
        let inner = cfb::CompoundFile::open(Cursor::new(bytes)).map_err(|e| {
            RedactorError::BackendError {
                backend: "cfb".to_string(),
                message: "Failed to open compound file".to_string(),
                source: Some(Box::new(e)),
            }
        })?;
        Ok(Self { inner })
    }
}

impl StreamContainer for OleContainer<'_> {
    fn exists(&self, name: &str) -> bool {
        self.inner.is_stream(stream_path(name))
    }

    fn read_stream(&mut self, name: &str) -> RedactorResult<Vec<u8>> {
        if !self.exists(name) {
            return Err(RedactorError::missing_stream(name));
        }
        let mut stream =
            self.inner
                .open_stream(stream_path(name))
                .map_err(|e| RedactorError::BackendError {
                    backend: "cfb".to_string(),
                    message: format!("Failed to open stream '{}'", name),
                    source: Some(Box::new(e)),
                })?;
        let mut data = Vec::new();
        stream.read_to_end(&mut data)?;
        tracing::debug!(stream = name, bytes = data.len(), "read container stream");
        Ok(data)
    }
}

fn stream_path(name: &str) -> String {
    format!("/{}", name)
}

/// Container backed by a map of already-separated streams.
///
/// Useful when a host has extracted the streams by other means.
#[derive(Debug, Clone, Default)]
pub struct MemoryContainer {
    streams: HashMap<String, Vec<u8>>,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stream(mut self, name: &str, data: Vec<u8>) -> Self {
        self.streams.insert(name.to_string(), data);
        self
    }
}

impl StreamContainer for MemoryContainer {
    fn exists(&self, name: &str) -> bool {
        self.streams.contains_key(name)
    }

    fn read_stream(&mut self, name: &str) -> RedactorResult<Vec<u8>> {
        self.streams
            .get(name)
            .cloned()
            .ok_or_else(|| RedactorError::missing_stream(name))
    }
}
