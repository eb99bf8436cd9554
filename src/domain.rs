use std::fmt::{Debug, Formatter};
use bit_set::BitSet;

use crate::{GridConfig, SlotId, WordId};

/// The live candidate set for every slot, stored as one bitset over vocabulary indices per slot.
/// Domains only ever shrink.
#[derive(Clone, PartialEq, Eq)]
pub struct Domains {
    by_slot: Vec<BitSet>,
}

impl Debug for Domains {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.by_slot.iter().map(|options| options.len()))
            .finish()
    }
}

impl Domains {
    /// Give every slot the whole vocabulary.
    pub fn full(config: &GridConfig) -> Domains {
        let word_count = config.words.len();
        let mut all_words = BitSet::with_capacity(word_count);
        for word_id in 0..word_count {
            all_words.insert(word_id);
        }

        Domains {
            by_slot: config.slot_ids().map(|_| all_words.clone()).collect(),
        }
    }

    pub fn get(&self, slot_id: SlotId) -> &BitSet {
        &self.by_slot[slot_id]
    }

    pub fn len(&self, slot_id: SlotId) -> usize {
        self.by_slot[slot_id].len()
    }

    pub fn is_empty(&self, slot_id: SlotId) -> bool {
        self.by_slot[slot_id].is_empty()
    }

    pub fn contains(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.by_slot[slot_id].contains(word_id)
    }

    /// Remove a word from a slot's domain, returning whether it was present.
    pub fn remove(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        self.by_slot[slot_id].remove(word_id)
    }

    /// Keep only the words of a slot's domain matching `keep`, returning whether anything was
    /// removed.
    pub fn retain<F>(&mut self, slot_id: SlotId, mut keep: F) -> bool
        where
            F: FnMut(WordId) -> bool
    {
        let doomed: Vec<WordId> = self.by_slot[slot_id].iter().filter(|&word_id| !keep(word_id)).collect();

        for &word_id in &doomed {
            self.by_slot[slot_id].remove(word_id);
        }

        !doomed.is_empty()
    }

    /// The first slot with nothing left to choose from, if any.
    pub fn first_empty_slot(&self) -> Option<SlotId> {
        self.by_slot.iter().position(|options| options.is_empty())
    }
}
