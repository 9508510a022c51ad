use std::collections::HashMap;

use block_codec::BlockRef;
use log::debug;

/// Tracks parent links between blocks and answers whether a block can be traced back to the
/// last irreversible block (LIB).
///
/// What counts as a resolvable reversible segment is up to the implementation.
/// [`ForkDb`] requires an unbroken chain of parent links ending at the LIB.
pub trait ForkDatabase {
    fn has_lib(&self) -> bool;

    fn lib(&self) -> Option<&BlockRef>;

    fn init_lib(&mut self, block: BlockRef);

    fn add_link(&mut self, block: BlockRef, parent_id: &str);

    /// Returns the blocks between the LIB (exclusive) and `up_to` (inclusive) in ascending order,
    /// or `None` if `up_to` cannot be linked to the LIB yet.
    fn reversible_segment(&self, up_to: &BlockRef) -> Option<Vec<BlockRef>>;

    /// Moves the LIB to the ancestor of `head` numbered `lib_num`.
    fn set_lib(&mut self, head: &BlockRef, lib_num: u64);

    /// Forgets links older than the LIB and returns how many were removed.
    fn purge_before_lib(&mut self) -> usize;

    fn link_count(&self) -> usize;
}

struct Link {
    number: u64,
    parent_id: String,
}

#[derive(Default)]
pub struct ForkDb {
    links: HashMap<String, Link>,
    lib: Option<BlockRef>,
}

impl ForkDb {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn parent_of(&self, block: &BlockRef) -> Option<BlockRef> {
        let link = self.links.get(&block.id)?;

        let parent = match &self.lib {
            Some(lib) if lib.id == link.parent_id => lib.clone(),
            _ => BlockRef::new(
                self.links.get(&link.parent_id)?.number,
                link.parent_id.clone(),
            ),
        };

        // Parent links must go strictly backwards. Anything else is corrupted data.
        (parent.number < block.number).then_some(parent)
    }
}

impl ForkDatabase for ForkDb {
    fn has_lib(&self) -> bool {
        self.lib.is_some()
    }

    fn lib(&self) -> Option<&BlockRef> {
        self.lib.as_ref()
    }

    fn init_lib(&mut self, block: BlockRef) {
        debug!("initializing LIB to {block}");
        self.lib = Some(block);
    }

    fn add_link(&mut self, block: BlockRef, parent_id: &str) {
        let BlockRef { number, id } = block;

        self.links.entry(id).or_insert_with(|| Link {
            number,
            parent_id: parent_id.to_owned(),
        });
    }

    fn reversible_segment(&self, up_to: &BlockRef) -> Option<Vec<BlockRef>> {
        let lib = self.lib.as_ref()?;
        let mut segment = vec![];
        let mut current = up_to.clone();

        while current.id != lib.id {
            // Walked past the LIB without meeting it, so `up_to` is on another branch.
            if current.number <= lib.number {
                return None;
            }

            let parent = self.parent_of(&current)?;
            segment.push(current);
            current = parent;
        }

        segment.reverse();

        Some(segment)
    }

    fn set_lib(&mut self, head: &BlockRef, lib_num: u64) {
        let Some(lib) = &self.lib else {
            return;
        };

        // The LIB never moves backwards.
        if lib_num <= lib.number {
            return;
        }

        let mut current = head.clone();

        while current.number > lib_num {
            match self.parent_of(&current) {
                Some(parent) => current = parent,
                None => return,
            }
        }

        if current.number == lib_num {
            self.lib = Some(current);
        }
    }

    fn purge_before_lib(&mut self) -> usize {
        let Some(lib) = &self.lib else {
            return 0;
        };

        let lib_number = lib.number;
        let before = self.links.len();

        self.links.retain(|_, link| link.number >= lib_number);

        let purged = before - self.links.len();

        if purged > 0 {
            debug!("purged {purged} links before LIB #{lib_number}");
        }

        purged
    }

    fn link_count(&self) -> usize {
        self.links.len()
    }
}
