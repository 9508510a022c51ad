use core::{num::NonZeroU64, ops::ControlFlow};

use anyhow::Result;
use block_range::{round_to_bundle_end, round_to_bundle_start, BlockRange, BlockSpan};
use log::{debug, warn};

use crate::{
    events::{CheckEvent, ReportSink},
    linkability::LinkabilityState,
    report::CheckSummary,
};

/// A covered span is reported after this many bundles even without a hole.
pub const PROGRESS_FLUSH_INTERVAL: u64 = 10_000;

/// Everything the walk remembers between bundles.
///
/// Memory use does not depend on the number of bundles walked.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TrackingState {
    pub expected_next_base: u64,
    pub current_run_start: u64,
    pub lowest_block_seen: Option<u64>,
    pub highest_block_seen: Option<u64>,
    pub hole_found: bool,
    pub bundle_count: u64,
    pub linkability: LinkabilityState,
}

/// Checks that bundle base numbers follow each other without gaps.
#[derive(Clone, Copy, Debug)]
pub struct ContinuityTracker {
    block_range: BlockRange,
    bundle_size: NonZeroU64,
}

impl ContinuityTracker {
    #[must_use]
    pub const fn new(block_range: BlockRange, bundle_size: NonZeroU64) -> Self {
        Self {
            block_range,
            bundle_size,
        }
    }

    #[must_use]
    pub fn initial_state(self) -> TrackingState {
        TrackingState {
            expected_next_base: round_to_bundle_start(self.block_range.start(), self.bundle_size),
            current_run_start: self.block_range.start(),
            lowest_block_seen: None,
            highest_block_seen: None,
            hole_found: false,
            bundle_count: 0,
            linkability: LinkabilityState::default(),
        }
    }

    /// Accounts for a listed bundle and reports the gap before it, if any.
    ///
    /// Returns `false` for bundles that must not be processed any further.
    pub fn begin_bundle(
        self,
        state: &mut TrackingState,
        base_number: u64,
        sink: &mut dyn ReportSink,
    ) -> Result<bool> {
        let bundle_size = self.bundle_size.get();

        if base_number.saturating_add(bundle_size - 1) < self.block_range.start() {
            debug!("bundle {base_number} ends before {}", self.block_range);
            return Ok(false);
        }

        if base_number < state.expected_next_base {
            warn!(
                "bundle {base_number} overlaps blocks already accounted for \
                 (expected bundle {}), skipping it",
                state.expected_next_base,
            );
            return Ok(false);
        }

        if base_number != state.expected_next_base {
            // A progress flush right before the gap leaves nothing to cover.
            if state.bundle_count > 0 && state.current_run_start < state.expected_next_base {
                sink.emit(CheckEvent::Covered(BlockSpan::new(
                    state.current_run_start,
                    state.expected_next_base - 1,
                )))?;
            }

            sink.emit(CheckEvent::Missing(BlockSpan::new(
                state.expected_next_base,
                base_number - 1,
            )))?;

            state.hole_found = true;
            state.current_run_start = base_number;
        }

        state.expected_next_base = base_number + bundle_size;
        state.bundle_count += 1;

        Ok(true)
    }

    pub fn record_blocks(self, state: &mut TrackingState, lowest: u64, highest: u64) {
        state.lowest_block_seen =
            Some(state.lowest_block_seen.map_or(lowest, |seen| seen.min(lowest)));
        state.highest_block_seen =
            Some(state.highest_block_seen.map_or(highest, |seen| seen.max(highest)));
    }

    /// Assumes the bundle holds every block it should.
    pub fn record_full_bundle(self, state: &mut TrackingState, base_number: u64) {
        self.record_blocks(
            state,
            base_number,
            round_to_bundle_end(base_number, self.bundle_size),
        );
    }

    /// Flushes progress and decides whether the walk has reached the end of the range.
    pub fn end_bundle(
        self,
        state: &mut TrackingState,
        base_number: u64,
        sink: &mut dyn ReportSink,
    ) -> Result<ControlFlow<()>> {
        let bundle_end = round_to_bundle_end(base_number, self.bundle_size);

        if state.bundle_count % PROGRESS_FLUSH_INTERVAL == 0 {
            sink.emit(CheckEvent::Covered(BlockSpan::new(
                state.current_run_start,
                bundle_end,
            )))?;

            state.current_run_start = bundle_end + 1;
        }

        if self
            .block_range
            .last_block()
            .is_some_and(|last_block| bundle_end >= last_block)
        {
            debug!("bundle {base_number} reaches the end of {}", self.block_range);
            return Ok(ControlFlow::Break(()));
        }

        Ok(ControlFlow::Continue(()))
    }

    /// Reports the trailing run and concludes the walk.
    pub fn finish(
        self,
        state: &TrackingState,
        first_streamable_block: u64,
        sink: &mut dyn ReportSink,
    ) -> Result<CheckSummary> {
        let last_linkable_block = state
            .linkability
            .last_linked_block
            .as_ref()
            .map(|block| block.number)
            .filter(|last_linked| {
                state
                    .highest_block_seen
                    .is_some_and(|highest| *last_linked < highest)
            });

        if let Some(highest) = state.highest_block_seen {
            if state.current_run_start <= highest {
                let span = BlockSpan::new(state.current_run_start, highest);

                let event = match last_linkable_block {
                    Some(last_linkable) => CheckEvent::ForkIssue {
                        span,
                        last_linkable,
                    },
                    None => CheckEvent::Covered(span),
                };

                sink.emit(event)?;
            }
        }

        let incomplete = self.block_range.last_block().is_some_and(|last_block| {
            match (state.lowest_block_seen, state.highest_block_seen) {
                (Some(lowest), Some(highest)) => {
                    highest < last_block
                        || (lowest > self.block_range.start() && lowest > first_streamable_block)
                }
                _ => true,
            }
        });

        Ok(CheckSummary {
            block_range: self.block_range,
            bundle_count: state.bundle_count,
            hole_found: state.hole_found,
            lowest_block_seen: state.lowest_block_seen,
            highest_block_seen: state.highest_block_seen,
            incomplete,
            last_linkable_block,
        })
    }
}
