use std::{
    io::{BufReader, Read},
    path::PathBuf,
};

use anyhow::Result;
use fs_err::File;
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::store::{ensure_not_cancelled, BlockStore, CancellableRead, Error, Visitor};

const ZSTD_EXTENSION: &str = ".zst";

/// Bundles stored as files in a single local directory.
///
/// Objects whose key ends with `.zst` are decompressed while being read.
pub struct LocalStore {
    directory: PathBuf,
}

impl LocalStore {
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, Error> {
        let directory = directory.into();

        if !directory.metadata().is_ok_and(|metadata| metadata.is_dir()) {
            return Err(Error::MissingDirectory { path: directory });
        }

        Ok(Self { directory })
    }

    fn sorted_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = vec![];

        for entry in fs_err::read_dir(&self.directory)? {
            let entry = entry?;

            if !entry.file_type()?.is_file() {
                continue;
            }

            // Keys are always ASCII. Anything else cannot be a bundle.
            let Ok(key) = entry.file_name().into_string() else {
                continue;
            };

            if key.starts_with(prefix) {
                keys.push(key);
            }
        }

        keys.sort_unstable();

        Ok(keys)
    }
}

impl BlockStore for LocalStore {
    fn walk(&self, prefix: &str, cancel: &CancellationToken, visitor: &mut Visitor) -> Result<()> {
        ensure_not_cancelled(cancel)?;

        let keys = self.sorted_keys(prefix)?;

        debug!(
            "listed {} objects with prefix {prefix:?} in {:?}",
            keys.len(),
            self.directory,
        );

        for key in keys {
            ensure_not_cancelled(cancel)?;

            if visitor(&key)?.is_break() {
                break;
            }
        }

        Ok(())
    }

    fn open_object(&self, key: &str, cancel: &CancellationToken) -> Result<Box<dyn Read + Send>> {
        ensure_not_cancelled(cancel)?;

        let file = File::open(self.directory.join(key))?;

        let reader: Box<dyn Read + Send> = if key.ends_with(ZSTD_EXTENSION) {
            Box::new(zstd::stream::read::Decoder::new(file)?)
        } else {
            Box::new(BufReader::new(file))
        };

        Ok(Box::new(CancellableRead::new(reader, cancel.clone())))
    }
}
