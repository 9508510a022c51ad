use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The fields of a merged block that continuity and fork checks rely on.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Block {
    pub number: u64,
    pub id: String,
    pub previous_id: String,
    /// Last irreversible block number reported by the producer of this block.
    pub lib_num: u64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl Block {
    #[must_use]
    pub fn block_ref(&self) -> BlockRef {
        BlockRef::new(self.number, self.id.clone())
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, Display)]
#[display("#{number} ({id})")]
pub struct BlockRef {
    pub number: u64,
    pub id: String,
}

impl BlockRef {
    #[must_use]
    pub fn new(number: u64, id: impl Into<String>) -> Self {
        Self {
            number,
            id: id.into(),
        }
    }
}
