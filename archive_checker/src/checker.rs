use core::ops::ControlFlow;

use anyhow::Result;
use block_codec::{Block, BlockDecoder, DbinBlockDecoder};
use block_range::walk_prefix;
use block_store::{BlockStore, Error as StoreError, KeyParser, RegexKeyParser};
use fork_db::{ForkDatabase, ForkDb};
use log::{debug, info};
use tokio_util::sync::CancellationToken;

use crate::{
    config::CheckConfig,
    continuity::ContinuityTracker,
    events::ReportSink,
    linkability::ForkLinkabilityTracker,
    report::CheckSummary,
    segment::{BlockObserver, SegmentValidator},
};

/// Walks the bundles of a store covering a block range and reports what is missing.
///
/// Every run starts from a fresh fork database, so running a check twice over the same store
/// produces the same findings.
pub struct ArchiveChecker<'store, F = ForkDb> {
    store: &'store dyn BlockStore,
    decoder: Box<dyn BlockDecoder + 'store>,
    key_parser: Box<dyn KeyParser + 'store>,
    observer: Box<dyn BlockObserver + 'store>,
    fork_db: F,
    config: CheckConfig,
}

impl<'store> ArchiveChecker<'store> {
    #[must_use]
    pub fn new(store: &'store dyn BlockStore, config: CheckConfig) -> Self {
        Self {
            store,
            decoder: Box::new(DbinBlockDecoder),
            key_parser: Box::new(RegexKeyParser::default()),
            observer: Box::new(ignore_block),
            fork_db: ForkDb::new(),
            config,
        }
    }
}

impl<'store, F: ForkDatabase> ArchiveChecker<'store, F> {
    #[must_use]
    pub fn with_decoder(mut self, decoder: impl BlockDecoder + 'store) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    #[must_use]
    pub fn with_key_parser(mut self, key_parser: impl KeyParser + 'store) -> Self {
        self.key_parser = Box::new(key_parser);
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl BlockObserver + 'store) -> Self {
        self.observer = Box::new(observer);
        self
    }

    #[must_use]
    pub fn with_fork_db<G: ForkDatabase>(self, fork_db: G) -> ArchiveChecker<'store, G> {
        let Self {
            store,
            decoder,
            key_parser,
            observer,
            config,
            ..
        } = self;

        ArchiveChecker {
            store,
            decoder,
            key_parser,
            observer,
            fork_db,
            config,
        }
    }

    pub fn run(
        self,
        sink: &mut dyn ReportSink,
        cancel: &CancellationToken,
    ) -> Result<CheckSummary> {
        let Self {
            store,
            decoder,
            key_parser,
            mut observer,
            fork_db,
            config,
        } = self;

        let block_range = config.block_range.ensure_resolved()?;
        let config = CheckConfig {
            block_range,
            ..config
        };

        let tracker = ContinuityTracker::new(block_range, config.bundle_size);
        let mut state = tracker.initial_state();
        let reads_blocks = config.print_details.reads_blocks();
        let prefix = walk_prefix(block_range, config.bundle_size);

        let mut validator = SegmentValidator::new(
            store,
            decoder.as_ref(),
            config,
            cancel,
            ForkLinkabilityTracker::new(fork_db),
            observer.as_mut(),
        );

        info!(
            "checking bundles of {} blocks in {block_range} (walk prefix: {prefix:?})",
            config.bundle_size,
        );

        store.walk(&prefix, cancel, &mut |key| {
            let Some(base_number) = key_parser.base_number(key) else {
                debug!("skipping object {key:?} that does not name a bundle");
                return Ok(ControlFlow::Continue(()));
            };

            if !tracker.begin_bundle(&mut state, base_number, sink)? {
                return Ok(ControlFlow::Continue(()));
            }

            if reads_blocks {
                let stats = validator.validate(key, base_number, &mut state.linkability, sink)?;

                if let (Some(lowest), Some(highest)) = (stats.lowest, stats.highest) {
                    tracker.record_blocks(&mut state, lowest, highest);
                }

                if cancel.is_cancelled() {
                    return Err(StoreError::Cancelled.into());
                }
            } else {
                tracker.record_full_bundle(&mut state, base_number);
            }

            tracker.end_bundle(&mut state, base_number, sink)
        })?;

        let summary = tracker.finish(&state, config.first_streamable_block, sink)?;

        sink.summarize(&summary)?;

        debug!("check finished: {summary:?}");

        Ok(summary)
    }
}

const fn ignore_block(_block: &Block) -> Result<()> {
    Ok(())
}
