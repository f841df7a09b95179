//! Streaming SHA-1 digests rendered as uppercase hex.

use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::error::{ManifestError, Result};

/// Read size for streaming hashes. Memory use per file stays at this bound.
pub const CHUNK_SIZE: usize = 8192;

/// Hash everything `reader` yields until EOF.
pub fn sha1_of_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha1::new();
    let mut buf = [0u8; CHUNK_SIZE];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode_upper(hasher.finalize()))
}

/// Hash the file at `path`. The handle is closed before this returns.
pub fn sha1_of_file(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| ManifestError::from_io(path, e))?;
    sha1_of_reader(file).map_err(|e| ManifestError::from_io(path, e))
}

pub fn sha1_of_bytes(bytes: &[u8]) -> String {
    hex::encode_upper(Sha1::digest(bytes))
}
