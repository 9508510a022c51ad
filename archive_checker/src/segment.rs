use anyhow::Result;
use block_codec::{Block, BlockDecoder};
use block_range::round_to_bundle_end;
use block_store::BlockStore;
use fork_db::ForkDatabase;
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::{
    config::{CheckConfig, PrintDetails},
    events::{CheckEvent, ReportSink},
    linkability::{ForkLinkabilityTracker, LinkabilityState},
};

/// Receives every in-range block of a deep check in [`PrintDetails::Stats`] mode.
///
/// Errors returned by an observer abort the check.
pub trait BlockObserver {
    fn observe(&mut self, block: &Block) -> Result<()>;
}

impl<F: FnMut(&Block) -> Result<()>> BlockObserver for F {
    fn observe(&mut self, block: &Block) -> Result<()> {
        self(block)
    }
}

/// Block numbers actually decoded from one bundle.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct SegmentStats {
    pub blocks_read: u64,
    pub lowest: Option<u64>,
    pub highest: Option<u64>,
}

impl SegmentStats {
    fn record(&mut self, number: u64) {
        self.blocks_read += 1;
        self.lowest = Some(self.lowest.map_or(number, |lowest| lowest.min(number)));
        self.highest = Some(self.highest.map_or(number, |highest| highest.max(number)));
    }
}

/// Decodes bundles and checks each of their blocks.
///
/// Problems with a single bundle are reported and never abort the walk.
pub struct SegmentValidator<'run, F> {
    store: &'run dyn BlockStore,
    decoder: &'run dyn BlockDecoder,
    config: CheckConfig,
    cancel: &'run CancellationToken,
    linkability: ForkLinkabilityTracker<F>,
    observer: &'run mut dyn BlockObserver,
}

impl<'run, F: ForkDatabase> SegmentValidator<'run, F> {
    pub fn new(
        store: &'run dyn BlockStore,
        decoder: &'run dyn BlockDecoder,
        config: CheckConfig,
        cancel: &'run CancellationToken,
        linkability: ForkLinkabilityTracker<F>,
        observer: &'run mut dyn BlockObserver,
    ) -> Self {
        Self {
            store,
            decoder,
            config,
            cancel,
            linkability,
            observer,
        }
    }

    pub fn validate(
        &mut self,
        key: &str,
        base_number: u64,
        state: &mut LinkabilityState,
        sink: &mut dyn ReportSink,
    ) -> Result<SegmentStats> {
        let mut stats = SegmentStats::default();

        let reader = self
            .store
            .open_object(key, self.cancel)
            .and_then(|input| self.decoder.block_reader(input).map_err(Into::into));

        let mut reader = match reader {
            Ok(reader) => reader,
            Err(error) => {
                sink.emit(CheckEvent::SegmentUnreadable {
                    key: key.to_owned(),
                    error: format!("{error:#}"),
                })?;

                return Ok(stats);
            }
        };

        let block_range = self.config.block_range;

        loop {
            let block = match reader.read_block() {
                Ok(Some(block)) => block,
                Ok(None) => break,
                Err(error) => {
                    sink.emit(CheckEvent::SegmentReadFailed {
                        key: key.to_owned(),
                        blocks_read: stats.blocks_read,
                        error: error.to_string(),
                    })?;

                    return Ok(stats);
                }
            };

            if block.number < block_range.start() {
                continue;
            }

            if block_range.stop().is_some_and(|stop| block.number >= stop) {
                debug!("bundle {key} reached the end of {block_range} at block {}", block.number);
                break;
            }

            stats.record(block.number);

            self.linkability.observe(&block, state, sink)?;

            match self.config.print_details {
                PrintDetails::NoDetails => {}
                PrintDetails::Stats => self.observer.observe(&block)?,
                PrintDetails::Full => sink.emit(render_block(&block))?,
            }
        }

        let expected = self.expected_block_count(base_number);

        if stats.blocks_read < expected {
            sink.emit(CheckEvent::ShortSegment {
                key: key.to_owned(),
                blocks_found: stats.blocks_read,
                expected,
            })?;
        }

        Ok(stats)
    }

    /// Number of in-range blocks a complete bundle starting at `base_number` holds.
    fn expected_block_count(&self, base_number: u64) -> u64 {
        let CheckConfig {
            bundle_size,
            block_range,
            first_streamable_block,
            ..
        } = self.config;

        let first = base_number
            .max(first_streamable_block)
            .max(block_range.start());

        let last = match block_range.last_block() {
            Some(last_block) => round_to_bundle_end(base_number, bundle_size).min(last_block),
            None => round_to_bundle_end(base_number, bundle_size),
        };

        if first > last {
            return 0;
        }

        last - first + 1
    }
}

fn render_block(block: &Block) -> CheckEvent {
    match serde_json::to_string_pretty(block) {
        Ok(rendered) => CheckEvent::BlockDetails {
            number: block.number,
            rendered,
        },
        Err(error) => CheckEvent::BlockRenderFailed {
            block: block.block_ref(),
            error: error.to_string(),
        },
    }
}
