pub use crate::{
    block::{Block, BlockRef},
    dbin::{DbinHeader, DbinReader, DbinWriter},
    decoder::{
        encode_bundle, BlockDecoder, BlockReader, BundleWriter, DbinBlockDecoder, BLOCK_HEADER,
    },
    error::Error,
};

mod block;
mod dbin;
mod decoder;
mod error;
