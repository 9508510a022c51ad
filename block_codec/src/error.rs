use std::io::Error as IoError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("stream is not dbin encoded (found magic bytes {found:?})")]
    InvalidMagic { found: [u8; 4] },
    #[error("unsupported dbin format version {version}")]
    UnsupportedVersion { version: u8 },
    #[error("unexpected dbin content type {found:?} (expected {expected:?})")]
    UnexpectedContentType { expected: String, found: String },
    #[error("dbin message truncated after {read} of {expected} bytes")]
    TruncatedMessage { expected: u32, read: usize },
    #[error("dbin message of {length} bytes does not fit a 32-bit length prefix")]
    MessageTooLarge { length: usize },
    #[error("failed to encode or decode block record")]
    Decode(#[from] bincode::Error),
    #[error(transparent)]
    Io(#[from] IoError),
}
