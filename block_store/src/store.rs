use core::ops::ControlFlow;
use std::{
    io::{Error as IoError, Read},
    path::PathBuf,
};

use anyhow::Result;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::local::LocalStore;

/// Called for every listed key. Returning [`ControlFlow::Break`] stops the listing.
pub type Visitor<'visitor> = dyn FnMut(&str) -> Result<ControlFlow<()>> + 'visitor;

/// A blob store holding one object per bundle.
pub trait BlockStore {
    /// Lists the keys starting with `prefix` in lexicographic order.
    fn walk(&self, prefix: &str, cancel: &CancellationToken, visitor: &mut Visitor) -> Result<()>;

    fn open_object(&self, key: &str, cancel: &CancellationToken) -> Result<Box<dyn Read + Send>>;
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("operation was cancelled")]
    Cancelled,
    #[error("store directory {path:?} does not exist or is not a directory")]
    MissingDirectory { path: PathBuf },
    #[error("object {key:?} does not exist in the store")]
    ObjectNotFound { key: String },
    #[error("store URL {url} cannot be converted to a local path")]
    InvalidFileUrl { url: Url },
    #[error("unsupported store scheme {scheme:?} (only local directories and file:// are supported)")]
    UnsupportedScheme { scheme: String },
}

/// Builds a store from a local path or a `file://` URL.
pub fn open_store(location: &str) -> Result<Box<dyn BlockStore + Send + Sync>> {
    if !location.contains("://") {
        return Ok(Box::new(LocalStore::new(location)?));
    }

    let url = Url::parse(location)?;

    if url.scheme() != "file" {
        return Err(Error::UnsupportedScheme {
            scheme: url.scheme().to_owned(),
        }
        .into());
    }

    let path = url
        .to_file_path()
        .map_err(|()| Error::InvalidFileUrl { url: url.clone() })?;

    Ok(Box::new(LocalStore::new(path)?))
}

pub(crate) fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<(), Error> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    Ok(())
}

/// Fails reads once the token is cancelled so that long object reads stop promptly.
pub struct CancellableRead<R> {
    inner: R,
    cancel: CancellationToken,
}

impl<R> CancellableRead<R> {
    pub fn new(inner: R, cancel: CancellationToken) -> Self {
        Self { inner, cancel }
    }
}

impl<R: Read> Read for CancellableRead<R> {
    fn read(&mut self, buffer: &mut [u8]) -> std::io::Result<usize> {
        ensure_not_cancelled(&self.cancel).map_err(IoError::other)?;
        self.inner.read(buffer)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use anyhow::anyhow;
    use tempfile::TempDir;
    use test_case::test_case;

    use super::*;

    #[test]
    fn open_store_accepts_plain_path_and_file_url() -> Result<()> {
        let directory = TempDir::new()?;

        let file_url = Url::from_directory_path(directory.path())
            .map_err(|()| anyhow!("temporary directory path is not absolute"))?;

        open_store(&directory.path().to_string_lossy())?;
        open_store(file_url.as_str())?;

        Ok(())
    }

    #[test_case("gs://bucket/merged-blocks" => "gs"; "google cloud storage")]
    #[test_case("s3://bucket/merged-blocks" => "s3"; "amazon s3")]
    fn open_store_rejects_remote_schemes(location: &str) -> String {
        match open_store(location).map(|_| ()).map_err(anyhow::Error::downcast::<Error>) {
            Err(Ok(Error::UnsupportedScheme { scheme })) => scheme,
            _ => panic!("{location} should be rejected"),
        }
    }

    #[test]
    fn open_store_rejects_missing_directory() -> Result<()> {
        let directory = TempDir::new()?;
        let missing = directory.path().join("missing");

        let error = open_store(&missing.to_string_lossy())
            .map(|_| ())
            .expect_err("missing directory should be rejected");

        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::MissingDirectory { .. }),
        ));

        Ok(())
    }

    #[test]
    fn cancellable_read_stops_after_cancellation() {
        let cancel = CancellationToken::new();
        let mut reader = CancellableRead::new(Cursor::new(vec![1, 2, 3, 4]), cancel.clone());
        let mut buffer = [0; 2];

        assert_eq!(reader.read(&mut buffer).ok(), Some(2));

        cancel.cancel();

        assert!(reader.read(&mut buffer).is_err());
    }
}
