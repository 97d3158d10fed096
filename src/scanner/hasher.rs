//! Streaming file hasher with pluggable digest functions.
//!
//! # Overview
//!
//! A [`DigestFunction`] turns a byte stream into a fixed-form digest. Its
//! associated `Digest` type is what the deduplication registry is keyed on,
//! so the registry always matches the chosen function.
//!
//! Three functions are provided:
//!
//! | Function | Digest | Notes |
//! |---|---|---|
//! | [`Sha256Base64`] | `String` | SHA-256, standard base64 text (default) |
//! | [`Blake3Digest`] | `blake3::Hash` | fast, cryptographic |
//! | [`Crc32Digest`] | `u32` | fastest, collisions are possible |
//!
//! [`Hasher`] opens a file and streams its entire content exactly once
//! through the configured function using a bounded read buffer.
//!
//! # Example
//!
//! ```no_run
//! use rmdupes::scanner::{Blake3Digest, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new(Blake3Digest).with_buffer_size(256 * 1024);
//! let hashed = hasher.hash_file(Path::new("photo.jpg")).unwrap();
//! println!("{} ({} bytes)", hashed.digest, hashed.bytes);
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use super::HashError;

/// Default read buffer size per worker (64 KiB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Largest accepted read buffer size per worker (64 MiB).
pub const MAX_READ_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// A deterministic function from a byte stream to a digest.
///
/// Implementations must return the same digest for the same bytes and are
/// assumed never to map two different contents to the same digest.
pub trait DigestFunction: Send + Sync {
    /// Digest value; also the deduplication registry key.
    type Digest: Clone + Eq + std::hash::Hash + fmt::Debug + fmt::Display + Send + 'static;

    /// Short algorithm name for logs and reports.
    fn name(&self) -> &'static str;

    /// Consume `reader` to the end and return the digest of everything read.
    ///
    /// # Errors
    ///
    /// Any read error is returned as-is; no digest is produced for a
    /// partially read stream.
    fn digest(&self, reader: &mut dyn BufRead) -> io::Result<Self::Digest>;
}

/// Feed every chunk of `reader` to `sink` until end of stream.
fn stream_chunks(reader: &mut dyn BufRead, mut sink: impl FnMut(&[u8])) -> io::Result<()> {
    loop {
        let len = match reader.fill_buf() {
            Ok([]) => return Ok(()),
            Ok(chunk) => {
                sink(chunk);
                chunk.len()
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        reader.consume(len);
    }
}

/// SHA-256 encoded as standard base64 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Base64;

impl DigestFunction for Sha256Base64 {
    type Digest = String;

    fn name(&self) -> &'static str {
        "sha256"
    }

    fn digest(&self, reader: &mut dyn BufRead) -> io::Result<String> {
        let mut hasher = Sha256::new();
        stream_chunks(reader, |chunk| hasher.update(chunk))?;
        Ok(STANDARD.encode(hasher.finalize()))
    }
}

/// BLAKE3 32-byte hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Digest;

impl DigestFunction for Blake3Digest {
    type Digest = blake3::Hash;

    fn name(&self) -> &'static str {
        "blake3"
    }

    fn digest(&self, reader: &mut dyn BufRead) -> io::Result<blake3::Hash> {
        let mut hasher = blake3::Hasher::new();
        stream_chunks(reader, |chunk| {
            hasher.update(chunk);
        })?;
        Ok(hasher.finalize())
    }
}

/// CRC32 (IEEE) checksum.
///
/// Much weaker than the cryptographic digests: two different files can share
/// a checksum, in which case one of them is deleted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32Digest;

impl DigestFunction for Crc32Digest {
    type Digest = u32;

    fn name(&self) -> &'static str {
        "crc32"
    }

    fn digest(&self, reader: &mut dyn BufRead) -> io::Result<u32> {
        let mut hasher = crc32fast::Hasher::new();
        stream_chunks(reader, |chunk| hasher.update(chunk))?;
        Ok(hasher.finalize())
    }
}

/// Digest selection for configuration and the command line.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256, base64 encoded
    #[default]
    Sha256,
    /// BLAKE3
    Blake3,
    /// CRC32 (fast, not collision resistant)
    Crc32,
}

impl DigestAlgorithm {
    /// Whether equal digests can be trusted to mean equal content.
    #[must_use]
    pub fn is_collision_resistant(self) -> bool {
        !matches!(self, Self::Crc32)
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Blake3 => write!(f, "blake3"),
            Self::Crc32 => write!(f, "crc32"),
        }
    }
}

/// Digest of a fully streamed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedContent<D> {
    /// Digest of the whole content
    pub digest: D,
    /// Number of bytes streamed through the digest
    pub bytes: u64,
}

/// Counts bytes as they are read.
struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

/// Marker carried by the I/O error that ends an aborted stream.
#[derive(Debug)]
struct StreamAborted;

impl fmt::Display for StreamAborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hashing aborted")
    }
}

impl std::error::Error for StreamAborted {}

/// Whether `error` was raised because the stream was aborted.
fn is_abort(error: &io::Error) -> bool {
    error.get_ref().is_some_and(|inner| inner.is::<StreamAborted>())
}

/// Fails every read once `should_abort` returns true.
struct AbortOnSignal<R, F> {
    inner: R,
    should_abort: F,
}

impl<R, F: Fn() -> bool> AbortOnSignal<R, F> {
    fn check(&self) -> io::Result<()> {
        if (self.should_abort)() {
            return Err(io::Error::other(StreamAborted));
        }
        Ok(())
    }
}

impl<R: Read, F: Fn() -> bool> Read for AbortOnSignal<R, F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.check()?;
        self.inner.read(buf)
    }
}

impl<R: BufRead, F: Fn() -> bool> BufRead for AbortOnSignal<R, F> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.check()?;
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt);
    }
}

/// Streams files through a [`DigestFunction`].
#[derive(Debug, Clone)]
pub struct Hasher<D> {
    function: D,
    buffer_size: usize,
}

impl<D: DigestFunction> Hasher<D> {
    /// Create a hasher with the default read buffer size.
    #[must_use]
    pub fn new(function: D) -> Self {
        Self {
            function,
            buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }

    /// Set the read buffer size, clamped to `1..=MAX_READ_BUFFER_SIZE`.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.clamp(1, MAX_READ_BUFFER_SIZE);
        self
    }

    /// Read buffer size in bytes.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Stream an arbitrary reader through the digest function.
    ///
    /// # Errors
    ///
    /// Returns the first read error encountered.
    pub fn hash_reader<R: Read>(&self, reader: R) -> io::Result<HashedContent<D::Digest>> {
        self.hash_reader_with_abort(reader, || false)
    }

    /// Like [`hash_reader`](Self::hash_reader), but every read fails once
    /// `should_abort` returns true.
    ///
    /// # Errors
    ///
    /// Returns the first read error, or an abort error.
    pub fn hash_reader_with_abort<R: Read>(
        &self,
        reader: R,
        should_abort: impl Fn() -> bool,
    ) -> io::Result<HashedContent<D::Digest>> {
        let buffered = BufReader::with_capacity(
            self.buffer_size,
            CountingReader {
                inner: reader,
                count: 0,
            },
        );
        let mut reader = AbortOnSignal {
            inner: buffered,
            should_abort,
        };
        let digest = self.function.digest(&mut reader)?;
        Ok(HashedContent {
            digest,
            bytes: reader.inner.into_inner().count,
        })
    }

    /// Open `path` and hash its entire content.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or fully read.
    pub fn hash_file(&self, path: &Path) -> Result<HashedContent<D::Digest>, HashError> {
        self.hash_file_with_abort(path, || false)
    }

    /// Open `path` and hash its content, giving up as soon as `should_abort`
    /// returns true.
    ///
    /// `should_abort` is polled before every buffer refill, so an abort takes
    /// effect within one buffer of data.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::Aborted`] when stopped early, or another
    /// [`HashError`] if the file cannot be opened or fully read.
    pub fn hash_file_with_abort(
        &self,
        path: &Path,
        should_abort: impl Fn() -> bool,
    ) -> Result<HashedContent<D::Digest>, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let hashed = self
            .hash_reader_with_abort(file, should_abort)
            .map_err(|e| {
                if is_abort(&e) {
                    HashError::Aborted(path.to_path_buf())
                } else {
                    HashError::from_io(path, e)
                }
            })?;
        log::trace!(
            "{} {} ({} bytes): {}",
            self.function.name(),
            path.display(),
            hashed.bytes,
            hashed.digest
        );
        Ok(hashed)
    }
}
