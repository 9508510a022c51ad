use core::ops::{Bound, ControlFlow};
use std::{
    collections::BTreeMap,
    io::{Cursor, Read},
    sync::Arc,
};

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::store::{ensure_not_cancelled, BlockStore, CancellableRead, Error, Visitor};

#[derive(Default)]
pub struct InMemoryStore {
    objects: BTreeMap<String, Arc<[u8]>>,
}

impl<K: Into<String>, V: Into<Arc<[u8]>>> FromIterator<(K, V)> for InMemoryStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(objects: I) -> Self {
        let objects = objects
            .into_iter()
            .map(|(key, bytes)| (key.into(), bytes.into()))
            .collect();

        Self { objects }
    }
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.objects.insert(key.into(), bytes.into());
    }
}

impl BlockStore for InMemoryStore {
    fn walk(&self, prefix: &str, cancel: &CancellationToken, visitor: &mut Visitor) -> Result<()> {
        let keys = self
            .objects
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(prefix));

        for key in keys {
            ensure_not_cancelled(cancel)?;

            if let ControlFlow::Break(()) = visitor(key)? {
                break;
            }
        }

        Ok(())
    }

    fn open_object(&self, key: &str, cancel: &CancellationToken) -> Result<Box<dyn Read + Send>> {
        ensure_not_cancelled(cancel)?;

        let bytes = self
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| Error::ObjectNotFound {
                key: key.to_owned(),
            })?;

        Ok(Box::new(CancellableRead::new(
            Cursor::new(bytes),
            cancel.clone(),
        )))
    }
}
