use anyhow::Result;
use block_codec::{Block, BlockRef};
use fork_db::{ForkDatabase, ForkDb};
use log::trace;

use crate::events::{CheckEvent, ReportSink};

const LARGE_GAP_REPORT_INTERVAL: u64 = 100;

/// Linkability bookkeeping carried across bundles.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct LinkabilityState {
    pub last_linked_block: Option<BlockRef>,
    pub first_unlinkable_block: Option<BlockRef>,
    pub unlinkable_run_length: u64,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Linkability {
    Linked,
    Unlinkable,
}

/// Feeds decoded blocks into a fork database and reports blocks that do not reach its LIB.
///
/// The first block ever observed becomes the LIB.
/// Linked blocks advance the LIB to the number they report and purge everything below it.
pub struct ForkLinkabilityTracker<F = ForkDb> {
    fork_db: F,
}

impl Default for ForkLinkabilityTracker {
    fn default() -> Self {
        Self::new(ForkDb::new())
    }
}

impl<F: ForkDatabase> ForkLinkabilityTracker<F> {
    pub const fn new(fork_db: F) -> Self {
        Self { fork_db }
    }

    pub const fn fork_db(&self) -> &F {
        &self.fork_db
    }

    pub fn observe(
        &mut self,
        block: &Block,
        state: &mut LinkabilityState,
        sink: &mut dyn ReportSink,
    ) -> Result<Linkability> {
        let block_ref = block.block_ref();

        if !self.fork_db.has_lib() {
            self.fork_db.init_lib(block_ref.clone());
        }

        self.fork_db.add_link(block_ref.clone(), &block.previous_id);

        if self.fork_db.reversible_segment(&block_ref).is_none() {
            state.unlinkable_run_length += 1;

            let first_unlinkable = state
                .first_unlinkable_block
                .get_or_insert_with(|| block_ref.clone())
                .number;

            sink.emit(CheckEvent::UnlinkableBlock { block: block_ref })?;

            let run_length = state.unlinkable_run_length;

            if run_length >= LARGE_GAP_REPORT_INTERVAL
                && run_length % LARGE_GAP_REPORT_INTERVAL == 0
            {
                sink.emit(CheckEvent::LargeUnlinkableGap {
                    run_length,
                    last_linked: state.last_linked_block.as_ref().map(|block| block.number),
                    first_unlinkable,
                })?;
            }

            return Ok(Linkability::Unlinkable);
        }

        self.fork_db.set_lib(&block_ref, block.lib_num);
        self.fork_db.purge_before_lib();

        trace!("block {block_ref} is linkable");

        state.last_linked_block = Some(block_ref);
        state.first_unlinkable_block = None;
        state.unlinkable_run_length = 0;

        Ok(Linkability::Linked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(number: u64, previous_id: &str, lib_num: u64) -> Block {
        Block {
            number,
            id: format!("{number}a"),
            previous_id: previous_id.to_owned(),
            lib_num,
            timestamp: number * 1_000,
        }
    }

    fn chain(numbers: impl IntoIterator<Item = u64>) -> Vec<Block> {
        numbers
            .into_iter()
            .map(|number| {
                let previous_id = number.checked_sub(1).map(|parent| format!("{parent}a"));
                block(number, previous_id.as_deref().unwrap_or(""), number.saturating_sub(5))
            })
            .collect()
    }

    #[test]
    fn first_block_becomes_lib_and_is_linked() -> Result<()> {
        let mut tracker = ForkLinkabilityTracker::default();
        let mut state = LinkabilityState::default();
        let mut events = vec![];

        let linkability = tracker.observe(&block(10, "9a", 0), &mut state, &mut events)?;

        assert_eq!(linkability, Linkability::Linked);
        assert_eq!(tracker.fork_db().lib(), Some(&BlockRef::new(10, "10a")));
        assert_eq!(state.last_linked_block, Some(BlockRef::new(10, "10a")));
        assert!(events.is_empty());

        Ok(())
    }

    #[test]
    fn broken_parent_link_is_reported_until_chain_relinks() -> Result<()> {
        let mut tracker = ForkLinkabilityTracker::default();
        let mut state = LinkabilityState::default();
        let mut events = vec![];

        for block in chain(0..=5) {
            tracker.observe(&block, &mut state, &mut events)?;
        }

        // Block 6 claims a parent that was never seen.
        let orphan = block(6, "5b", 1);

        assert_eq!(
            tracker.observe(&orphan, &mut state, &mut events)?,
            Linkability::Unlinkable,
        );
        assert_eq!(state.unlinkable_run_length, 1);
        assert_eq!(state.first_unlinkable_block, Some(BlockRef::new(6, "6a")));
        assert_eq!(state.last_linked_block, Some(BlockRef::new(5, "5a")));

        // Block 7 extends block 6, which is still detached from the LIB.
        assert_eq!(
            tracker.observe(&block(7, "6a", 1), &mut state, &mut events)?,
            Linkability::Unlinkable,
        );
        assert_eq!(state.unlinkable_run_length, 2);

        assert_eq!(
            events,
            [
                CheckEvent::UnlinkableBlock {
                    block: BlockRef::new(6, "6a"),
                },
                CheckEvent::UnlinkableBlock {
                    block: BlockRef::new(7, "7a"),
                },
            ],
        );

        Ok(())
    }

    #[test]
    fn large_gap_is_reported_every_hundred_unlinkable_blocks() -> Result<()> {
        let mut tracker = ForkLinkabilityTracker::default();
        let mut state = LinkabilityState::default();
        let mut events = vec![];

        tracker.observe(&block(0, "", 0), &mut state, &mut events)?;

        for number in 2..=201 {
            let previous_id = format!("{}a", number - 1);
            tracker.observe(&block(number, &previous_id, 0), &mut state, &mut events)?;
        }

        let gaps = events
            .iter()
            .filter_map(|event| match event {
                CheckEvent::LargeUnlinkableGap {
                    run_length,
                    last_linked,
                    first_unlinkable,
                } => Some((*run_length, *last_linked, *first_unlinkable)),
                _ => None,
            })
            .collect::<Vec<_>>();

        assert_eq!(gaps, [(100, Some(0), 2), (200, Some(0), 2)]);

        Ok(())
    }

    #[test]
    fn linked_blocks_keep_fork_db_bounded() -> Result<()> {
        let mut tracker = ForkLinkabilityTracker::default();
        let mut state = LinkabilityState::default();
        let mut events = vec![];

        for block in chain(0..10_000) {
            tracker.observe(&block, &mut state, &mut events)?;
        }

        assert!(events.is_empty());
        assert!(tracker.fork_db().link_count() <= 6);
        assert_eq!(
            tracker.fork_db().lib().map(|lib| lib.number),
            Some(9_999 - 5),
        );

        Ok(())
    }
}
