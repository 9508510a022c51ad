use std::io::{Error as IoError, ErrorKind, Read, Write};

use byteorder::{BigEndian, ByteOrder as _, WriteBytesExt as _};

use crate::error::Error;

const MAGIC: [u8; 4] = *b"dbin";
const FORMAT_VERSION: u8 = 0;

/// `dbin` streams start with `dbin`, a format version byte and a fixed-size content description.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DbinHeader {
    pub content_type: [u8; 3],
    pub content_version: [u8; 2],
}

pub struct DbinReader<R> {
    reader: R,
    header: DbinHeader,
}

impl<R: Read> DbinReader<R> {
    pub fn new(mut reader: R) -> Result<Self, Error> {
        let mut magic = [0; 4];
        reader.read_exact(&mut magic)?;

        if magic != MAGIC {
            return Err(Error::InvalidMagic { found: magic });
        }

        let mut version = [0; 1];
        reader.read_exact(&mut version)?;

        let [version] = version;

        if version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion { version });
        }

        let mut content_type = [0; 3];
        let mut content_version = [0; 2];

        reader.read_exact(&mut content_type)?;
        reader.read_exact(&mut content_version)?;

        Ok(Self {
            reader,
            header: DbinHeader {
                content_type,
                content_version,
            },
        })
    }

    #[must_use]
    pub const fn header(&self) -> DbinHeader {
        self.header
    }

    /// Reads the next length-prefixed message.
    /// Returns `Ok(None)` if the stream ends cleanly between two messages.
    pub fn read_message(&mut self) -> Result<Option<Vec<u8>>, Error> {
        let mut length_prefix = [0; 4];

        if !read_exact_or_eof(&mut self.reader, &mut length_prefix)? {
            return Ok(None);
        }

        let expected = BigEndian::read_u32(&length_prefix);

        // `Read::take` keeps a corrupted length prefix from triggering a huge allocation.
        let mut message = Vec::new();
        let read = self
            .reader
            .by_ref()
            .take(expected.into())
            .read_to_end(&mut message)?;

        if u64::try_from(read).ok() != Some(u64::from(expected)) {
            return Err(Error::TruncatedMessage { expected, read });
        }

        Ok(Some(message))
    }
}

pub struct DbinWriter<W> {
    writer: W,
}

impl<W: Write> DbinWriter<W> {
    pub fn new(mut writer: W, header: DbinHeader) -> Result<Self, Error> {
        let DbinHeader {
            content_type,
            content_version,
        } = header;

        writer.write_all(&MAGIC)?;
        writer.write_u8(FORMAT_VERSION)?;
        writer.write_all(&content_type)?;
        writer.write_all(&content_version)?;

        Ok(Self { writer })
    }

    pub fn write_message(&mut self, message: &[u8]) -> Result<(), Error> {
        let length = u32::try_from(message.len()).map_err(|_| Error::MessageTooLarge {
            length: message.len(),
        })?;

        self.writer.write_u32::<BigEndian>(length)?;
        self.writer.write_all(message)?;

        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn read_exact_or_eof(reader: &mut impl Read, buffer: &mut [u8]) -> Result<bool, IoError> {
    let mut filled = 0;

    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => return Err(ErrorKind::UnexpectedEof.into()),
            Ok(count) => filled += count,
            Err(error) if error.kind() == ErrorKind::Interrupted => {}
            Err(error) => return Err(error),
        }
    }

    Ok(true)
}
