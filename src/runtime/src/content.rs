// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Request content streams.
//!
//! The retry engine needs to send the same body on every attempt. Content
//! streams that support `mark()` and `reset()` can be rewound before a retry.
//! Streams that cannot be rewound make the request non-retryable once their
//! content was consumed.

use bytes::Bytes;
use std::io::{Read, Result};
use std::sync::{Arc, Mutex};

/// The default limit on how many bytes may be read after a mark and still
/// allow a reset.
pub const DEFAULT_READ_LIMIT: usize = 128 * 1024 + 1;

/// A request body.
pub trait ContentStream: Read + Send + std::fmt::Debug {
    /// Returns true if this stream implements [mark][Self::mark] and
    /// [reset][Self::reset].
    fn mark_supported(&self) -> bool {
        false
    }

    /// Remembers the current position, a later [reset][Self::reset] rewinds
    /// to it, as long as no more than `read_limit` bytes are consumed.
    fn mark(&mut self, _read_limit: usize) {}

    /// Rewinds to the last mark.
    fn reset(&mut self) -> Result<()> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "the content stream does not support mark and reset",
        ))
    }

    /// The number of bytes left in the stream, if known.
    fn content_length(&self) -> Option<u64> {
        None
    }
}

/// A content stream shared by the request, its per-attempt copies, and the
/// transport.
pub type SharedContent = Arc<Mutex<dyn ContentStream>>;

fn lock(content: &SharedContent) -> Result<std::sync::MutexGuard<'_, dyn ContentStream + 'static>> {
    content
        .lock()
        .map_err(|e| std::io::Error::other(format!("content stream lock poisoned: {e}")))
}

/// Reads the remaining content into memory.
pub fn read_all(content: &SharedContent) -> Result<Bytes> {
    let mut guard = lock(content)?;
    let mut buffer = Vec::new();
    guard.read_to_end(&mut buffer)?;
    Ok(Bytes::from(buffer))
}

/// Marks the content at its current position, if supported.
pub fn mark(content: &SharedContent, read_limit: usize) -> Result<()> {
    let mut guard = lock(content)?;
    if guard.mark_supported() {
        guard.mark(read_limit);
    }
    Ok(())
}

/// Rewinds the content to its last mark.
pub fn reset(content: &SharedContent) -> Result<()> {
    lock(content)?.reset()
}

pub fn mark_supported(content: &SharedContent) -> Result<bool> {
    Ok(lock(content)?.mark_supported())
}

pub fn content_length(content: &SharedContent) -> Result<Option<u64>> {
    Ok(lock(content)?.content_length())
}

/// An in-memory body, it can always be rewound.
#[derive(Clone, Debug, Default)]
pub struct BytesContent {
    data: Bytes,
    position: usize,
    mark: usize,
}

impl BytesContent {
    pub fn new<T: Into<Bytes>>(data: T) -> Self {
        Self {
            data: data.into(),
            position: 0,
            mark: 0,
        }
    }

    /// Creates a [SharedContent] with the given data.
    pub fn shared<T: Into<Bytes>>(data: T) -> SharedContent {
        Arc::new(Mutex::new(Self::new(data)))
    }
}

impl Read for BytesContent {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let remaining = &self.data[self.position..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.position += n;
        Ok(n)
    }
}

impl ContentStream for BytesContent {
    fn mark_supported(&self) -> bool {
        true
    }

    fn mark(&mut self, _read_limit: usize) {
        self.mark = self.position;
    }

    fn reset(&mut self) -> Result<()> {
        self.position = self.mark;
        Ok(())
    }

    fn content_length(&self) -> Option<u64> {
        Some((self.data.len() - self.position) as u64)
    }
}

/// Wraps any reader and keeps the bytes read after the last mark, so it can
/// rewind as long as the read limit is not exceeded.
#[derive(Debug)]
pub struct BufferedContent<R> {
    inner: R,
    buffer: Vec<u8>,
    position: usize,
    read_limit: Option<usize>,
}

impl<R> BufferedContent<R>
where
    R: Read + Send + std::fmt::Debug,
{
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            position: 0,
            read_limit: None,
        }
    }
}

impl<R: Read> Read for BufferedContent<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.position < self.buffer.len() {
            let n = (self.buffer.len() - self.position).min(buf.len());
            buf[..n].copy_from_slice(&self.buffer[self.position..self.position + n]);
            self.position += n;
            return Ok(n);
        }
        let n = self.inner.read(buf)?;
        if let Some(limit) = self.read_limit {
            if self.buffer.len() + n > limit {
                // Too much data since the mark, the mark is no longer valid.
                self.read_limit = None;
                self.buffer.clear();
                self.position = 0;
            } else {
                self.buffer.extend_from_slice(&buf[..n]);
                self.position = self.buffer.len();
            }
        }
        Ok(n)
    }
}

impl<R> ContentStream for BufferedContent<R>
where
    R: Read + Send + std::fmt::Debug,
{
    fn mark_supported(&self) -> bool {
        true
    }

    fn mark(&mut self, read_limit: usize) {
        // Bytes not yet replayed stay buffered, they follow the new mark.
        self.buffer.drain(..self.position);
        self.position = 0;
        self.read_limit = Some(read_limit);
    }

    fn reset(&mut self) -> Result<()> {
        match self.read_limit {
            Some(_) => {
                self.position = 0;
                Ok(())
            }
            None => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "resetting to invalid mark",
            )),
        }
    }
}

/// A one-shot body, it cannot be rewound.
#[derive(Debug)]
pub struct ReaderContent<R> {
    inner: R,
    length: Option<u64>,
    consumed: u64,
}

impl<R> ReaderContent<R>
where
    R: Read + Send + std::fmt::Debug,
{
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            length: None,
            consumed: 0,
        }
    }

    /// Declares the total length of the stream.
    pub fn with_content_length(mut self, v: u64) -> Self {
        self.length = Some(v);
        self
    }
}

impl<R: Read> Read for ReaderContent<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed += n as u64;
        Ok(n)
    }
}

impl<R> ContentStream for ReaderContent<R>
where
    R: Read + Send + std::fmt::Debug,
{
    fn content_length(&self) -> Option<u64> {
        self.length.map(|l| l.saturating_sub(self.consumed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    type TestResult = anyhow::Result<()>;

    fn read_n<R: Read>(r: &mut R, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0_u8; n];
        let mut filled = 0;
        while filled < n {
            let count = r.read(&mut buf[filled..])?;
            if count == 0 {
                break;
            }
            filled += count;
        }
        buf.truncate(filled);
        Ok(buf)
    }

    #[test]
    fn bytes_content() -> TestResult {
        let mut content = BytesContent::new("hello world");
        assert!(content.mark_supported());
        assert_eq!(content.content_length(), Some(11));
        content.mark(DEFAULT_READ_LIMIT);
        assert_eq!(read_n(&mut content, 5)?, b"hello");
        assert_eq!(content.content_length(), Some(6));
        content.reset()?;
        assert_eq!(read_n(&mut content, 100)?, b"hello world");

        content.reset()?;
        let _ = read_n(&mut content, 6)?;
        content.mark(DEFAULT_READ_LIMIT);
        assert_eq!(read_n(&mut content, 100)?, b"world");
        content.reset()?;
        assert_eq!(read_n(&mut content, 100)?, b"world");
        Ok(())
    }

    #[test]
    fn buffered_content_rewinds() -> TestResult {
        let mut content = BufferedContent::new(Cursor::new(b"0123456789".to_vec()));
        assert!(content.mark_supported());
        content.mark(8);
        assert_eq!(read_n(&mut content, 4)?, b"0123");
        content.reset()?;
        assert_eq!(read_n(&mut content, 6)?, b"012345");
        content.reset()?;
        assert_eq!(read_n(&mut content, 2)?, b"01");
        content.mark(8);
        assert_eq!(read_n(&mut content, 100)?, b"23456789");
        content.reset()?;
        assert_eq!(read_n(&mut content, 100)?, b"23456789");
        Ok(())
    }

    #[test]
    fn buffered_content_read_limit() -> TestResult {
        let mut content = BufferedContent::new(Cursor::new(b"0123456789".to_vec()));
        content.mark(4);
        assert_eq!(read_n(&mut content, 10)?, b"0123456789");
        let err = content.reset().unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        Ok(())
    }

    #[test]
    fn buffered_content_without_mark() {
        let mut content = BufferedContent::new(Cursor::new(b"abc".to_vec()));
        assert!(content.reset().is_err());
    }

    #[test]
    fn reader_content() -> TestResult {
        let mut content =
            ReaderContent::new(Cursor::new(b"abcdef".to_vec())).with_content_length(6);
        assert!(!content.mark_supported());
        content.mark(DEFAULT_READ_LIMIT);
        assert_eq!(read_n(&mut content, 2)?, b"ab");
        assert_eq!(content.content_length(), Some(4));
        let err = content.reset().unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);
        Ok(())
    }

    #[test]
    fn shared_helpers() -> TestResult {
        let content = BytesContent::shared("payload");
        assert!(mark_supported(&content)?);
        mark(&content, DEFAULT_READ_LIMIT)?;
        assert_eq!(content_length(&content)?, Some(7));
        assert_eq!(read_all(&content)?, Bytes::from_static(b"payload"));
        assert_eq!(content_length(&content)?, Some(0));
        reset(&content)?;
        assert_eq!(read_all(&content)?, Bytes::from_static(b"payload"));
        Ok(())
    }
}
