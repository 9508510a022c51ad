pub use crate::{
    key_parser::{KeyParser, RegexKeyParser},
    local::LocalStore,
    memory::InMemoryStore,
    store::{open_store, BlockStore, CancellableRead, Error, Visitor},
};

mod key_parser;
mod local;
mod memory;
mod store;
