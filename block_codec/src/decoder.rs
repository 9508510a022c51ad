use std::io::{Read, Write};

use crate::{
    block::Block,
    dbin::{DbinHeader, DbinReader, DbinWriter},
    error::Error,
};

pub const BLOCK_HEADER: DbinHeader = DbinHeader {
    content_type: *b"BLK",
    content_version: *b"00",
};

/// Sequential access to the blocks of a single bundle.
pub trait BlockReader {
    /// Returns `Ok(None)` once the bundle is exhausted.
    fn read_block(&mut self) -> Result<Option<Block>, Error>;
}

/// Turns the raw bytes of a bundle object into a [`BlockReader`].
pub trait BlockDecoder {
    fn block_reader(&self, input: Box<dyn Read + Send>)
        -> Result<Box<dyn BlockReader + Send>, Error>;
}

/// Decodes bundles written by [`BundleWriter`].
#[derive(Clone, Copy, Default, Debug)]
pub struct DbinBlockDecoder;

impl BlockDecoder for DbinBlockDecoder {
    fn block_reader(
        &self,
        input: Box<dyn Read + Send>,
    ) -> Result<Box<dyn BlockReader + Send>, Error> {
        let reader = DbinReader::new(input)?;
        let content_type = reader.header().content_type;

        if content_type != BLOCK_HEADER.content_type {
            return Err(Error::UnexpectedContentType {
                expected: String::from_utf8_lossy(&BLOCK_HEADER.content_type).into_owned(),
                found: String::from_utf8_lossy(&content_type).into_owned(),
            });
        }

        Ok(Box::new(DbinBlockReader { reader }))
    }
}

struct DbinBlockReader<R> {
    reader: DbinReader<R>,
}

impl<R: Read> BlockReader for DbinBlockReader<R> {
    fn read_block(&mut self) -> Result<Option<Block>, Error> {
        self.reader
            .read_message()?
            .map(|message| bincode::deserialize(&message))
            .transpose()
            .map_err(Into::into)
    }
}

pub struct BundleWriter<W> {
    writer: DbinWriter<W>,
}

impl<W: Write> BundleWriter<W> {
    pub fn new(writer: W) -> Result<Self, Error> {
        DbinWriter::new(writer, BLOCK_HEADER).map(|writer| Self { writer })
    }

    pub fn write_block(&mut self, block: &Block) -> Result<(), Error> {
        let message = bincode::serialize(block)?;
        self.writer.write_message(&message)
    }

    pub fn finish(self) -> W {
        self.writer.into_inner()
    }
}

/// Encodes `blocks` as a complete bundle object.
pub fn encode_bundle<'block>(
    blocks: impl IntoIterator<Item = &'block Block>,
) -> Result<Vec<u8>, Error> {
    let mut writer = BundleWriter::new(Vec::new())?;

    for block in blocks {
        writer.write_block(block)?;
    }

    Ok(writer.finish())
}
