use std::io::Write;

use anyhow::Result;
use block_range::{pretty_block_num, BlockRange};

use crate::events::{CheckEvent, ReportSink};

/// What a finished walk concluded about the requested range.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CheckSummary {
    pub block_range: BlockRange,
    pub bundle_count: u64,
    pub hole_found: bool,
    pub lowest_block_seen: Option<u64>,
    pub highest_block_seen: Option<u64>,
    /// Set when a closed range was not fully present at its edges.
    pub incomplete: bool,
    /// Set to the last block linkable to the LIB when later blocks could not be linked.
    pub last_linkable_block: Option<u64>,
}

impl CheckSummary {
    #[must_use]
    pub const fn has_fork_issue(&self) -> bool {
        self.last_linkable_block.is_some()
    }

    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        !self.hole_found && !self.incomplete && !self.has_fork_issue()
    }
}

/// Renders findings as the human readable lines operators grep for.
pub struct TextReporter<W> {
    writer: W,
}

impl<W: Write> TextReporter<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for TextReporter<W> {
    fn emit(&mut self, event: CheckEvent) -> Result<()> {
        let writer = &mut self.writer;

        match event {
            CheckEvent::Covered(span) => writeln!(writer, "✅ Range {span}")?,
            CheckEvent::Missing(span) => writeln!(
                writer,
                "❌ Range {span} (Missing, [{}])",
                span.reproc_range(),
            )?,
            CheckEvent::ForkIssue {
                span,
                last_linkable,
            } => writeln!(
                writer,
                "🔶 Range {span} has issues with forks, last linkable block number: {last_linkable}",
            )?,
            CheckEvent::UnlinkableBlock { block } => writeln!(
                writer,
                "🔶 Block #{} is not linkable at this point",
                block.number,
            )?,
            CheckEvent::LargeUnlinkableGap {
                run_length,
                last_linked,
                first_unlinkable,
            } => writeln!(
                writer,
                "❌ Large gap of {run_length} unlinkable blocks found in chain. \
                 Last linked block: {}, first unlinkable block: {first_unlinkable}.",
                last_linked.map_or_else(|| "none".to_owned(), |number| number.to_string()),
            )?,
            CheckEvent::ShortSegment {
                key,
                blocks_found,
                expected,
            } => writeln!(
                writer,
                "🔶 Segment {key} contained only {blocks_found} blocks (< {expected}), \
                 this can happen on some chains",
            )?,
            CheckEvent::SegmentUnreadable { key, error } => {
                writeln!(writer, "❌ Unable to read blocks segment {key}: {error}")?;
            }
            CheckEvent::SegmentReadFailed {
                key,
                blocks_read,
                error,
            } => writeln!(
                writer,
                "❌ Unable to read all blocks from segment {key} \
                 after reading {blocks_read} blocks: {error}",
            )?,
            CheckEvent::BlockDetails { rendered, .. } => writeln!(writer, "{rendered}")?,
            CheckEvent::BlockRenderFailed { block, error } => {
                writeln!(writer, "❌ Unable to print full block {block}: {error}")?;
            }
        }

        Ok(())
    }

    fn summarize(&mut self, summary: &CheckSummary) -> Result<()> {
        let writer = &mut self.writer;

        writeln!(writer)?;
        writeln!(writer, "Summary:")?;

        if summary.incomplete {
            writeln!(
                writer,
                "> 🔶 Incomplete range {}, started at block {} and stopped at block: {}",
                summary.block_range,
                pretty_optional_block_num(summary.lowest_block_seen),
                pretty_optional_block_num(summary.highest_block_seen),
            )?;
        }

        if let Some(last_linkable) = summary.last_linkable_block {
            writeln!(
                writer,
                "> 🔶 Fork issues found, last linkable block: {}",
                pretty_block_num(last_linkable),
            )?;
        }

        if summary.hole_found {
            writeln!(writer, "> 🆘 Holes found!")?;
        } else {
            writeln!(writer, "> 🆗 No hole found")?;
        }

        writer.flush()?;

        Ok(())
    }
}

fn pretty_optional_block_num(number: Option<u64>) -> String {
    number.map_or_else(|| "none".to_owned(), pretty_block_num)
}

#[cfg(test)]
mod tests {
    use block_codec::BlockRef;
    use block_range::BlockSpan;
    use test_case::test_case;

    use super::*;

    fn render(event: CheckEvent) -> Result<String> {
        let mut reporter = TextReporter::new(vec![]);
        reporter.emit(event)?;
        Ok(String::from_utf8(reporter.into_inner())?)
    }

    fn summary(block_range: BlockRange) -> CheckSummary {
        CheckSummary {
            block_range,
            bundle_count: 3,
            hole_found: false,
            lowest_block_seen: Some(0),
            highest_block_seen: Some(299),
            incomplete: false,
            last_linkable_block: None,
        }
    }

    #[test_case(
        CheckEvent::Covered(BlockSpan::new(0, 99)) => "✅ Range [#0, #99]\n";
        "covered"
    )]
    #[test_case(
        CheckEvent::Missing(BlockSpan::new(100, 299)) => "❌ Range [#100, #299] (Missing, [100:300])\n";
        "missing"
    )]
    #[test_case(
        CheckEvent::ForkIssue { span: BlockSpan::new(0, 199), last_linkable: 150 }
            => "🔶 Range [#0, #199] has issues with forks, last linkable block number: 150\n";
        "fork issue"
    )]
    #[test_case(
        CheckEvent::UnlinkableBlock { block: BlockRef::new(42, "42a") }
            => "🔶 Block #42 is not linkable at this point\n";
        "unlinkable block"
    )]
    #[test_case(
        CheckEvent::ShortSegment { key: "0000000100".to_owned(), blocks_found: 60, expected: 100 }
            => "🔶 Segment 0000000100 contained only 60 blocks (< 100), this can happen on some chains\n";
        "short segment"
    )]
    fn event_lines(event: CheckEvent) -> String {
        render(event).expect("rendering into a vector should not fail")
    }

    #[test]
    fn large_gap_without_linked_block() -> Result<()> {
        let line = render(CheckEvent::LargeUnlinkableGap {
            run_length: 200,
            last_linked: None,
            first_unlinkable: 5,
        })?;

        assert_eq!(
            line,
            "❌ Large gap of 200 unlinkable blocks found in chain. \
             Last linked block: none, first unlinkable block: 5.\n",
        );

        Ok(())
    }

    #[test]
    fn healthy_summary() -> Result<()> {
        let mut reporter = TextReporter::new(vec![]);
        let summary = summary(BlockRange::closed(0, 300)?);

        assert!(summary.is_healthy());

        reporter.summarize(&summary)?;

        assert_eq!(
            String::from_utf8(reporter.into_inner())?,
            "\nSummary:\n> 🆗 No hole found\n",
        );

        Ok(())
    }

    #[test]
    fn unhealthy_summary_lists_every_problem() -> Result<()> {
        let mut reporter = TextReporter::new(vec![]);

        let summary = CheckSummary {
            hole_found: true,
            incomplete: true,
            last_linkable_block: Some(1_250),
            ..summary(BlockRange::closed(0, 1_000_000)?)
        };

        assert!(summary.has_fork_issue());
        assert!(!summary.is_healthy());

        reporter.summarize(&summary)?;

        let output = String::from_utf8(reporter.into_inner())?;

        assert!(output.contains(
            "> 🔶 Incomplete range [#0, #1 000 000), started at block #0 and stopped at block: #299"
        ));
        assert!(output.contains("> 🔶 Fork issues found, last linkable block: #1 250"));
        assert!(output.ends_with("> 🆘 Holes found!\n"));

        Ok(())
    }
}
