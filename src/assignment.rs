use bit_set::BitSet;

use crate::{Choice, GridConfig, SlotId, WordId};

/// A partial fill: at most one word per slot. The search never mutates an assignment it has
/// handed to a recursive call; it extends a copy instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Indexed by SlotId.
    words: Vec<Option<WordId>>,
    /// Every word placed in some slot.
    used: BitSet,
    assigned_count: usize,
}

impl Assignment {
    /// The assignment with nothing filled in.
    pub fn empty(config: &GridConfig) -> Assignment {
        Assignment {
            words: vec![None; config.slot_count()],
            used: BitSet::with_capacity(config.words.len()),
            assigned_count: 0,
        }
    }

    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.words[slot_id]
    }

    pub fn is_assigned(&self, slot_id: SlotId) -> bool {
        self.words[slot_id].is_some()
    }

    pub fn is_word_used(&self, word_id: WordId) -> bool {
        self.used.contains(word_id)
    }

    /// Number of slots with a word.
    pub fn len(&self) -> usize {
        self.assigned_count
    }

    pub fn is_empty(&self) -> bool {
        self.assigned_count == 0
    }

    /// Whether every slot in the grid has a word.
    pub fn is_complete(&self, config: &GridConfig) -> bool {
        self.assigned_count == config.slot_count()
    }

    /// Return a copy of this assignment with `slot_id` set to `word_id`, replacing whatever the
    /// slot held before.
    pub fn extended(&self, slot_id: SlotId, word_id: WordId) -> Assignment {
        let mut result = self.clone();

        if let Some(previous) = result.words[slot_id].replace(word_id) {
            if !result.words.iter().any(|&word| word == Some(previous)) {
                result.used.remove(previous);
            }
        } else {
            result.assigned_count += 1;
        }
        result.used.insert(word_id);

        result
    }

    /// The filled slots, in slot order.
    pub fn choices(&self) -> Vec<Choice> {
        self.words.iter().enumerate()
            .filter_map(|(slot_id, word)| word.map(|word_id| Choice { slot_id, word_id }))
            .collect()
    }

    /// Check that placing `word_id` in the unassigned slot `slot_id` keeps this (consistent)
    /// assignment consistent. Only already-assigned crossings are looked at.
    pub fn is_consistent_extension(&self, config: &GridConfig, slot_id: SlotId, word_id: WordId) -> bool {
        let slot_config = &config.slot_configs[slot_id];
        let word = &config.words[word_id];

        if word.len() != slot_config.length || self.used.contains(word_id) {
            return false;
        }

        slot_config.crossings.iter().zip(&word.chars).all(|(crossing, glyph)| match crossing {
            Some(crossing) => match self.words[crossing.other_slot_id] {
                Some(other_word_id) => {
                    config.words[other_word_id].chars.get(crossing.other_slot_cell) == Some(glyph)
                }
                None => true,
            },
            None => true,
        })
    }

    /// Check the whole assignment: distinct words, matching lengths, and agreement on every
    /// crossing where both slots are filled.
    pub fn is_consistent(&self, config: &GridConfig) -> bool {
        if self.used.len() != self.assigned_count {
            return false;
        }

        self.choices().iter().all(|&Choice { slot_id, word_id }| {
            let word = &config.words[word_id];
            word.len() == config.slot_configs[slot_id].length &&
                config.neighbors(slot_id).all(|neighbor| {
                    match (self.words[neighbor], config.overlap(slot_id, neighbor)) {
                        (Some(neighbor_word_id), Some((cell, neighbor_cell))) => {
                            word.chars.get(cell) == config.words[neighbor_word_id].chars.get(neighbor_cell)
                        }
                        _ => true,
                    }
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::grid::generate_grid_config;
    use crate::Direction::{Across, Down};
    use crate::{Assignment, Choice, GridConfig, GridEntry};

    /// cat / at / cow / ow / ox with an across slot of 3 crossing a down slot of 2 at (1, 0).
    fn crossing_config() -> GridConfig {
        generate_grid_config(&["cat", "at", "cow", "ow", "ox"], &[
            GridEntry { loc: (0, 0), len: 3, dir: Across },
            GridEntry { loc: (1, 0), len: 2, dir: Down },
        ]).unwrap()
    }

    #[test]
    fn test_extending_leaves_the_original_untouched() {
        let config = crossing_config();
        let empty = Assignment::empty(&config);
        let one = empty.extended(0, 0);

        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
        assert_eq!(one.get(0), Some(0));
        assert!(one.is_word_used(0));
        assert!(!one.is_complete(&config));
        assert!(one.extended(1, 1).is_complete(&config));
    }

    #[test]
    fn test_replacing_a_slot_frees_its_word() {
        let config = crossing_config();
        let assignment = Assignment::empty(&config).extended(0, 0).extended(0, 2);

        assert_eq!(assignment.len(), 1);
        assert!(!assignment.is_word_used(0));
        assert!(assignment.is_word_used(2));
        assert_eq!(assignment.choices(), vec![Choice { slot_id: 0, word_id: 2 }]);
    }

    #[test]
    fn test_extension_checks() {
        let config = crossing_config();
        let assignment = Assignment::empty(&config).extended(0, 0);

        // "at" agrees with the "a" in "cat".
        assert!(assignment.is_consistent_extension(&config, 1, 1));
        // "ow" doesn't.
        assert!(!assignment.is_consistent_extension(&config, 1, 3));
        // Wrong length.
        assert!(!assignment.is_consistent_extension(&config, 1, 2));

        let cow = Assignment::empty(&config).extended(0, 2);
        assert!(cow.is_consistent_extension(&config, 1, 3));
        assert!(cow.is_consistent_extension(&config, 1, 4));
        assert!(!cow.is_consistent_extension(&config, 1, 1));
    }

    #[test]
    fn test_duplicate_words_are_inconsistent() {
        let config = generate_grid_config(&["cat", "dog"], &[
            GridEntry { loc: (0, 0), len: 3, dir: Across },
            GridEntry { loc: (0, 2), len: 3, dir: Across },
        ]).unwrap();
        let assignment = Assignment::empty(&config).extended(0, 0);

        assert!(!assignment.is_consistent_extension(&config, 1, 0));
        assert!(!assignment.extended(1, 0).is_consistent(&config));
        assert!(assignment.extended(1, 1).is_consistent(&config));
    }

    #[test]
    fn test_whole_assignment_consistency() {
        let config = crossing_config();
        let empty = Assignment::empty(&config);

        assert!(empty.is_consistent(&config));
        assert!(empty.extended(0, 0).extended(1, 1).is_consistent(&config));
        assert!(!empty.extended(0, 0).extended(1, 3).is_consistent(&config));
        assert!(!empty.extended(0, 1).is_consistent(&config));
    }
}
