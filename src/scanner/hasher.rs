//! SHA-256 content fingerprinting with streaming reads.
//!
//! # Overview
//!
//! [`Fingerprinter`] reads a file sequentially in fixed-size blocks and feeds
//! each block into a SHA-256 accumulator. Peak memory is one block regardless
//! of file size.
//!
//! Two files with identical bytes always produce the same [`Fingerprint`].
//! Different contents produce different fingerprints with overwhelming
//! probability, which is not a proof of inequality; see [`contents_equal`]
//! for an exact comparison.
//!
//! # Example
//!
//! ```no_run
//! use dupesweep::scanner::{fingerprint_to_hex, Fingerprinter};
//! use std::path::Path;
//!
//! let fingerprinter = Fingerprinter::new();
//! let digest = fingerprinter.fingerprint(Path::new("Cargo.toml")).unwrap();
//! println!("{}", fingerprint_to_hex(&digest));
//! ```

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use super::ReadError;

/// Default read block size (64 KiB).
pub const BLOCK_SIZE: usize = 64 * 1024;

/// Smallest block size accepted by [`Fingerprinter::with_block_size`].
pub const MIN_BLOCK_SIZE: usize = 4 * 1024;

/// A SHA-256 content digest.
pub type Fingerprint = [u8; 32];

/// Streaming content fingerprinter.
#[derive(Debug, Clone, Copy)]
pub struct Fingerprinter {
    block_size: usize,
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Fingerprinter {
    /// Create a fingerprinter using [`BLOCK_SIZE`] reads.
    #[must_use]
    pub fn new() -> Self {
        Self {
            block_size: BLOCK_SIZE,
        }
    }

    /// Use a custom read block size. Values below 4 KiB are raised to 4 KiB.
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(MIN_BLOCK_SIZE);
        self
    }

    /// Configured read block size in bytes.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Fingerprint the file at `path`.
    ///
    /// The file is opened read-only and closed before returning, on success
    /// and on error alike.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError`] if the file cannot be opened or a read fails
    /// partway through.
    pub fn fingerprint(&self, path: &Path) -> Result<Fingerprint, ReadError> {
        self.fingerprint_counted(path).map(|(digest, _)| digest)
    }

    /// Like [`fingerprint`](Self::fingerprint), also returning how many bytes
    /// were actually read, which can differ from the size seen at walk time.
    ///
    /// # Errors
    ///
    /// Same as [`fingerprint`](Self::fingerprint).
    pub fn fingerprint_counted(&self, path: &Path) -> Result<(Fingerprint, u64), ReadError> {
        let file = File::open(path).map_err(|e| ReadError::from_io(path, e))?;
        let (digest, bytes) = self
            .stream(file)
            .map_err(|e| ReadError::from_io(path, e))?;
        log::trace!("Fingerprinted {} ({} bytes)", path.display(), bytes);
        Ok((digest, bytes))
    }

    /// Fingerprint everything readable from `reader`.
    ///
    /// # Errors
    ///
    /// Propagates any read error other than `Interrupted`, which is retried.
    pub fn fingerprint_reader<R: Read>(&self, reader: R) -> io::Result<Fingerprint> {
        self.stream(reader).map(|(digest, _)| digest)
    }

    fn stream<R: Read>(&self, mut reader: R) -> io::Result<(Fingerprint, u64)> {
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; self.block_size];
        let mut total = 0u64;

        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..n]);
            total += n as u64;
        }

        Ok((hasher.finalize().into(), total))
    }
}

/// Compare two files byte for byte.
///
/// Reads both files in [`BLOCK_SIZE`] chunks and stops at the first
/// difference. Files of different length are unequal without reading.
///
/// # Errors
///
/// Returns [`ReadError`] for whichever file could not be read.
pub fn contents_equal(a: &Path, b: &Path) -> Result<bool, ReadError> {
    let mut file_a = File::open(a).map_err(|e| ReadError::from_io(a, e))?;
    let mut file_b = File::open(b).map_err(|e| ReadError::from_io(b, e))?;

    let len_a = file_a
        .metadata()
        .map_err(|e| ReadError::from_io(a, e))?
        .len();
    let len_b = file_b
        .metadata()
        .map_err(|e| ReadError::from_io(b, e))?
        .len();
    if len_a != len_b {
        return Ok(false);
    }

    let mut buf_a = vec![0u8; BLOCK_SIZE];
    let mut buf_b = vec![0u8; BLOCK_SIZE];

    loop {
        let n = read_full(&mut file_a, &mut buf_a).map_err(|e| ReadError::from_io(a, e))?;
        let m = read_full(&mut file_b, &mut buf_b).map_err(|e| ReadError::from_io(b, e))?;

        if n != m || buf_a[..n] != buf_b[..m] {
            return Ok(false);
        }
        if n == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` as far as the reader allows, returning the number of bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Render a fingerprint as lowercase hexadecimal (64 characters).
#[must_use]
pub fn fingerprint_to_hex(fingerprint: &Fingerprint) -> String {
    use std::fmt::Write;

    fingerprint
        .iter()
        .fold(String::with_capacity(64), |mut acc, byte| {
            let _ = write!(acc, "{:02x}", byte);
            acc
        })
}
