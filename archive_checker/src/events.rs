use anyhow::Result;
use block_codec::BlockRef;
use block_range::BlockSpan;

use crate::report::CheckSummary;

/// Everything a check can find out about an archive, in the order it was found.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum CheckEvent {
    Covered(BlockSpan),
    Missing(BlockSpan),
    /// The trailing covered span ends after the last block that could be linked to the LIB.
    ForkIssue {
        span: BlockSpan,
        last_linkable: u64,
    },
    UnlinkableBlock {
        block: BlockRef,
    },
    LargeUnlinkableGap {
        run_length: u64,
        last_linked: Option<u64>,
        first_unlinkable: u64,
    },
    ShortSegment {
        key: String,
        blocks_found: u64,
        expected: u64,
    },
    SegmentUnreadable {
        key: String,
        error: String,
    },
    SegmentReadFailed {
        key: String,
        blocks_read: u64,
        error: String,
    },
    BlockDetails {
        number: u64,
        rendered: String,
    },
    BlockRenderFailed {
        block: BlockRef,
        error: String,
    },
}

/// Receives findings as the walk progresses.
///
/// Errors returned by a sink abort the check.
pub trait ReportSink {
    fn emit(&mut self, event: CheckEvent) -> Result<()>;

    fn summarize(&mut self, _summary: &CheckSummary) -> Result<()> {
        Ok(())
    }
}

impl ReportSink for Vec<CheckEvent> {
    fn emit(&mut self, event: CheckEvent) -> Result<()> {
        self.push(event);
        Ok(())
    }
}
