use std::io::Write;

use anyhow::Result;
use archive_checker::BlockObserver;
use block_codec::Block;
use chrono::{DateTime, SecondsFormat};

/// Prints one line per block in `stats` mode.
pub struct BlockStatsPrinter<W> {
    writer: W,
}

impl<W: Write> BlockStatsPrinter<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> BlockObserver for BlockStatsPrinter<W> {
    fn observe(&mut self, block: &Block) -> Result<()> {
        let produced_at = i64::try_from(block.timestamp)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
            .map_or_else(
                || format!("{} ms", block.timestamp),
                |time| time.to_rfc3339_opts(SecondsFormat::Millis, true),
            );

        writeln!(
            self.writer,
            "Block {} (prev: {}): LIB #{}, produced at {produced_at}",
            block.block_ref(),
            block.previous_id,
            block.lib_num,
        )?;

        Ok(())
    }
}
