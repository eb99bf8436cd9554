use std::cmp::Reverse;
use std::collections::HashMap;
use instant::Instant;
use log::debug;
use thiserror::Error;

use crate::consistency::{
    ac3, enforce_node_consistency, ArcConsistencyFailure, ArcConsistencySuccess,
};
use crate::{Assignment, Choice, Domains, GridConfig, SlotId, Statistics, WordId};

/// Settings for a single solve.
#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    /// Give up after visiting this many search states.
    pub node_limit: Option<u64>,
}

/// A struct representing the results of a fill operation.
#[derive(Debug, Clone)]
pub struct FillSuccess {
    pub statistics: Statistics,
    /// One choice per slot, in slot order.
    pub choices: Vec<Choice>,
}

impl FillSuccess {
    /// The word chosen for a slot.
    pub fn word<'a>(&self, config: &'a GridConfig, slot_id: SlotId) -> Option<&'a str> {
        self.choices.iter()
            .find(|choice| choice.slot_id == slot_id)
            .map(|choice| config.words[choice.word_id].string.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FillFailure {
    /// Propagation left a slot with no options before any word was placed.
    #[error("slot {slot_id} has no remaining options")]
    Inconsistent { slot_id: SlotId },
    /// Every branch of the search was tried.
    #[error("no fill exists for this grid and word list")]
    Exhausted,
    #[error("gave up after visiting {limit} search states")]
    NodeLimitExceeded { limit: u64 },
}

impl FillFailure {
    /// Whether this failure proves that the puzzle has no fill, as opposed to the search being cut
    /// short.
    pub fn is_unsatisfiable(&self) -> bool {
        !matches!(self, FillFailure::NodeLimitExceeded { .. })
    }
}

/// The state of one solve: the grid being filled, the live domains for every slot, and the
/// running statistics.
#[derive(Debug)]
pub struct Filler<'a> {
    config: &'a GridConfig,
    domains: Domains,
    options: SolveOptions,
    statistics: Statistics,
}

impl<'a> Filler<'a> {
    pub fn new(config: &'a GridConfig, options: SolveOptions) -> Filler<'a> {
        Filler {
            config,
            domains: Domains::full(config),
            statistics: Statistics::new(options.node_limit),
            options,
        }
    }

    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Prune the domains before searching: lengths first, then a full arc consistency pass.
    pub fn enforce_consistency(&mut self) -> Result<(), FillFailure> {
        enforce_node_consistency(self.config, &mut self.domains);

        if let Some(slot_id) = self.domains.first_empty_slot() {
            debug!("slot {} has no words of length {}", slot_id, self.config.slot_configs[slot_id].length);
            return Err(FillFailure::Inconsistent { slot_id });
        }

        match ac3(self.config, &mut self.domains, None) {
            Ok(ArcConsistencySuccess { revisions }) => {
                self.statistics.revisions += revisions;
                debug!("arc consistency settled after {} revisions: {:?}", revisions, self.domains);
                Ok(())
            }
            Err(ArcConsistencyFailure { slot_id }) => {
                debug!("arc consistency emptied slot {}", slot_id);
                Err(FillFailure::Inconsistent { slot_id })
            }
        }
    }

    /// Choose the unfilled slot with the fewest remaining options. Ties go to the slot with the
    /// most crossings, then to the lowest slot id.
    pub fn select_unassigned_slot(&self, assignment: &Assignment) -> Option<SlotId> {
        self.config.slot_ids()
            .filter(|&slot_id| !assignment.is_assigned(slot_id))
            .min_by_key(|&slot_id| {
                (self.domains.len(slot_id), Reverse(self.config.degree(slot_id)), slot_id)
            })
    }

    /// Return the options for `slot_id` ordered by how many options they would rule out for the
    /// unfilled crossing slots, fewest first. Ties keep word list order.
    pub fn order_domain_values(&self, slot_id: SlotId, assignment: &Assignment) -> Vec<WordId> {
        let words = &self.config.words;

        // For each unfilled crossing: the cell it crosses, how many live options it has, and how
        // many of those put each letter in the shared cell.
        let crossing_glyph_counts: Vec<(usize, usize, HashMap<char, usize>)> =
            self.config.slot_configs[slot_id].crossings.iter().enumerate()
                .filter_map(|(cell_idx, crossing)| crossing.as_ref().map(|crossing| (cell_idx, crossing)))
                .filter(|(_, crossing)| !assignment.is_assigned(crossing.other_slot_id))
                .map(|(cell_idx, crossing)| {
                    let mut total = 0;
                    let mut glyph_counts: HashMap<char, usize> = HashMap::new();

                    for word_id in self.domains.get(crossing.other_slot_id) {
                        if assignment.is_word_used(word_id) {
                            continue;
                        }
                        total += 1;
                        if let Some(&glyph) = words[word_id].chars.get(crossing.other_slot_cell) {
                            *glyph_counts.entry(glyph).or_insert(0) += 1;
                        }
                    }

                    (cell_idx, total, glyph_counts)
                })
                .collect();

        let mut options: Vec<(usize, WordId)> = self.domains.get(slot_id).iter().map(|word_id| {
            let word = &words[word_id];
            let eliminated: usize = crossing_glyph_counts.iter().map(|(cell_idx, total, glyph_counts)| {
                let compatible = word.chars.get(*cell_idx)
                    .and_then(|glyph| glyph_counts.get(glyph))
                    .copied()
                    .unwrap_or(0);
                total - compatible
            }).sum();

            (eliminated, word_id)
        }).collect();
        options.sort_unstable();

        options.into_iter().map(|(_, word_id)| word_id).collect()
    }

    /// Depth-first search from `assignment`, which must be consistent. Returns the first complete
    /// assignment found, `None` if this branch has none, or an error if the node limit runs out.
    pub fn backtrack(&mut self, assignment: Assignment) -> Result<Option<Assignment>, FillFailure> {
        if let Some(limit) = self.options.node_limit {
            if self.statistics.states >= limit {
                return Err(FillFailure::NodeLimitExceeded { limit });
            }
        }
        self.statistics.states += 1;

        if assignment.is_complete(self.config) {
            return Ok(Some(assignment));
        }

        let slot_id = match self.select_unassigned_slot(&assignment) {
            Some(slot_id) => slot_id,
            None => return Ok(None),
        };

        for word_id in self.order_domain_values(slot_id, &assignment) {
            if !assignment.is_consistent_extension(self.config, slot_id, word_id) {
                continue;
            }

            if let Some(result) = self.backtrack(assignment.extended(slot_id, word_id))? {
                return Ok(Some(result));
            }
        }

        self.statistics.backtracks += 1;
        Ok(None)
    }

    /// Prune the domains and then search for a fill.
    pub fn solve(mut self) -> Result<FillSuccess, FillFailure> {
        let start = Instant::now();

        self.enforce_consistency()?;
        let result = self.backtrack(Assignment::empty(self.config));

        self.statistics.duration = start.elapsed();
        debug!("search finished: {:?}", self.statistics);

        match result? {
            Some(assignment) => {
                debug_assert!(assignment.is_consistent(self.config));
                Ok(FillSuccess {
                    statistics: self.statistics,
                    choices: assignment.choices(),
                })
            }
            None => Err(FillFailure::Exhausted),
        }
    }
}

/// Search for a valid fill for the given grid.
pub fn find_fill(config: &GridConfig) -> Result<FillSuccess, FillFailure> {
    find_fill_with_options(config, &SolveOptions::default())
}

/// Search for a valid fill for the given grid, with a custom node limit.
pub fn find_fill_with_options(
    config: &GridConfig,
    options: &SolveOptions,
) -> Result<FillSuccess, FillFailure> {
    Filler::new(config, options.clone()).solve()
}

#[cfg(test)]
mod tests {
    use crate::grid::{generate_grid_config, generate_grid_config_from_template_string};
    use crate::search::{
        find_fill, find_fill_with_options, FillFailure, FillSuccess, Filler, SolveOptions,
    };
    use crate::Direction::{Across, Down};
    use crate::{Assignment, GridConfig, GridEntry};

    fn assert_sound(config: &GridConfig, result: &FillSuccess) {
        let assignment = result.choices.iter().fold(Assignment::empty(config), |assignment, choice| {
            assignment.extended(choice.slot_id, choice.word_id)
        });

        assert!(assignment.is_complete(config), "fill is incomplete: {:?}", result.choices);
        assert!(assignment.is_consistent(config), "fill is inconsistent: {:?}", result.choices);
    }

    fn word_id(config: &GridConfig, word: &str) -> usize {
        config.words.iter().position(|w| w.string == word).unwrap()
    }

    /// ABC
    ///   D
    ///   EFG
    fn chain_config() -> GridConfig {
        generate_grid_config(&["CAT", "DOG", "TEN", "GAS", "NOD"], &[
            GridEntry { loc: (0, 0), len: 3, dir: Across },
            GridEntry { loc: (2, 0), len: 3, dir: Down },
            GridEntry { loc: (2, 2), len: 3, dir: Across },
        ]).unwrap()
    }

    #[test]
    fn test_single_slot_takes_first_word_of_its_length() {
        let config = generate_grid_config(&["cat", "dog", "ox"], &[
            GridEntry { loc: (0, 0), len: 3, dir: Across },
        ]).unwrap();

        let mut filler = Filler::new(&config, SolveOptions::default());
        filler.enforce_consistency().unwrap();
        assert!(!filler.domains().contains(0, word_id(&config, "ox")));

        let result = find_fill(&config).expect("Failed to find a fill");
        assert_eq!(result.word(&config, 0), Some("cat"));
    }

    #[test]
    fn test_crossing_pair_agrees_on_shared_cell() {
        let config = generate_grid_config(&["cat", "at", "cow", "ow"], &[
            GridEntry { loc: (0, 0), len: 3, dir: Across },
            GridEntry { loc: (1, 0), len: 2, dir: Down },
        ]).unwrap();

        let result = find_fill(&config).expect("Failed to find a fill");
        assert_sound(&config, &result);

        let across = result.word(&config, 0).unwrap();
        let down = result.word(&config, 1).unwrap();
        assert_eq!(across.chars().nth(1), down.chars().next());
        assert_eq!((across, down), ("cat", "at"));
    }

    #[test]
    fn test_missing_length_fails_before_search() {
        let config = generate_grid_config(&["cat", "dog"], &[
            GridEntry { loc: (0, 0), len: 4, dir: Across },
        ]).unwrap();

        let mut filler = Filler::new(&config, SolveOptions::default());
        assert_eq!(filler.enforce_consistency(), Err(FillFailure::Inconsistent { slot_id: 0 }));
        assert_eq!(filler.statistics().states, 0);

        let failure = find_fill(&config).expect_err("Found an impossible fill??");
        assert_eq!(failure, FillFailure::Inconsistent { slot_id: 0 });
        assert!(failure.is_unsatisfiable());
    }

    #[test]
    fn test_disconnected_slots_get_distinct_words() {
        let config = generate_grid_config(&["cat", "dog", "cow"], &[
            GridEntry { loc: (0, 0), len: 3, dir: Across },
            GridEntry { loc: (0, 2), len: 3, dir: Across },
            GridEntry { loc: (0, 4), len: 3, dir: Across },
        ]).unwrap();

        let result = find_fill(&config).expect("Failed to find a fill");
        assert_sound(&config, &result);

        let mut words: Vec<_> = config.slot_ids().map(|slot_id| result.word(&config, slot_id).unwrap()).collect();
        words.sort();
        assert_eq!(words, vec!["cat", "cow", "dog"]);
    }

    #[test]
    fn test_too_few_words_exhausts_search() {
        let config = generate_grid_config(&["cat"], &[
            GridEntry { loc: (0, 0), len: 3, dir: Across },
            GridEntry { loc: (0, 2), len: 3, dir: Across },
        ]).unwrap();

        let failure = find_fill(&config).expect_err("Found an impossible fill??");
        assert_eq!(failure, FillFailure::Exhausted);
        assert!(failure.is_unsatisfiable());
    }

    #[test]
    fn test_symmetric_square_needs_repeated_words() {
        // Four slots but only two words to go around.
        let config = generate_grid_config_from_template_string(
            &["AB", "BA"],
            "\
            __\n\
            __\n\
            ",
        ).unwrap();

        assert_eq!(find_fill(&config).unwrap_err(), FillFailure::Exhausted);
    }

    #[test]
    fn test_node_limit_stops_search() {
        let config = generate_grid_config(&["cat", "at", "cow", "ow"], &[
            GridEntry { loc: (0, 0), len: 3, dir: Across },
            GridEntry { loc: (1, 0), len: 2, dir: Down },
        ]).unwrap();

        let failure = find_fill_with_options(&config, &SolveOptions { node_limit: Some(1) })
            .expect_err("Search should have been cut short");
        assert_eq!(failure, FillFailure::NodeLimitExceeded { limit: 1 });
        assert!(!failure.is_unsatisfiable());

        let result = find_fill_with_options(&config, &SolveOptions { node_limit: Some(3) })
            .expect("Three states are enough");
        assert_eq!(result.statistics.states, 3);
        assert_eq!(result.statistics.node_limit, Some(3));
    }

    #[test]
    fn test_slot_selection_prefers_small_domains() {
        let config = chain_config();
        let mut filler = Filler::new(&config, SolveOptions::default());
        let empty = Assignment::empty(&config);

        filler.domains.retain(2, |word_id| word_id < 2);
        assert_eq!(filler.select_unassigned_slot(&empty), Some(2));
    }

    #[test]
    fn test_slot_selection_breaks_ties_by_degree_then_id() {
        let config = chain_config();
        let filler = Filler::new(&config, SolveOptions::default());
        let empty = Assignment::empty(&config);

        // Same domain sizes everywhere, and only the middle slot crosses two others.
        assert_eq!(filler.select_unassigned_slot(&empty), Some(1));

        let middle_filled = empty.extended(1, word_id(&config, "TEN"));
        assert_eq!(filler.select_unassigned_slot(&middle_filled), Some(0));

        let all_filled = middle_filled.extended(0, 0).extended(2, 4);
        assert_eq!(filler.select_unassigned_slot(&all_filled), None);
    }

    #[test]
    fn test_values_ordered_by_eliminations() {
        let config = generate_grid_config(&["cow", "cat", "at", "ax", "ow"], &[
            GridEntry { loc: (0, 0), len: 3, dir: Across },
            GridEntry { loc: (1, 0), len: 2, dir: Down },
        ]).unwrap();

        let mut filler = Filler::new(&config, SolveOptions::default());
        filler.enforce_consistency().unwrap();
        let empty = Assignment::empty(&config);

        // "cat" leaves two options for the down slot, "cow" only one.
        let ordered: Vec<_> = filler.order_domain_values(0, &empty).into_iter()
            .map(|word_id| config.words[word_id].string.as_str())
            .collect();
        assert_eq!(ordered, vec!["cat", "cow"]);

        // Once the down slot is filled, it no longer counts and word list order wins.
        let down_filled = empty.extended(1, word_id(&config, "ow"));
        let ordered: Vec<_> = filler.order_domain_values(0, &down_filled).into_iter()
            .map(|word_id| config.words[word_id].string.as_str())
            .collect();
        assert_eq!(ordered, vec!["cow", "cat"]);
    }

    #[test]
    fn test_used_words_dont_count_as_eliminated() {
        let config = generate_grid_config(&["cow", "cat", "at", "ax", "ow", "ox"], &[
            GridEntry { loc: (0, 0), len: 3, dir: Across },
            GridEntry { loc: (1, 0), len: 2, dir: Down },
            GridEntry { loc: (0, 2), len: 2, dir: Across },
        ]).unwrap();

        let mut filler = Filler::new(&config, SolveOptions::default());
        filler.enforce_consistency().unwrap();

        // All four two letter words are live: both candidates rule out two, so list order wins.
        let empty = Assignment::empty(&config);
        let ordered = filler.order_domain_values(0, &empty);
        assert_eq!(ordered, vec![word_id(&config, "cow"), word_id(&config, "cat")]);

        // With "ox" spent on the other slot, "cow" rules out two of the three left.
        let ox_used = empty.extended(2, word_id(&config, "ox"));
        let ordered = filler.order_domain_values(0, &ox_used);
        assert_eq!(ordered, vec![word_id(&config, "cat"), word_id(&config, "cow")]);

        let ax_used = ox_used.extended(2, word_id(&config, "ax"));
        let ordered = filler.order_domain_values(0, &ax_used);
        assert_eq!(ordered, vec![word_id(&config, "cow"), word_id(&config, "cat")]);
    }

    #[test]
    fn test_find_fill_for_ring() {
        let config = generate_grid_config_from_template_string(
            &["CAT", "COW", "WET", "TOT", "DOG", "EGG", "ACE", "OWL"],
            "\
            ___\n\
            _#_\n\
            ___\n\
            ",
        ).unwrap();

        let result = find_fill(&config).expect("Failed to find a fill");
        assert_sound(&config, &result);
        assert_eq!(result.choices.len(), 4);
        assert!(result.statistics.states >= 5);
    }

    #[test]
    fn test_fill_is_deterministic() {
        let config = generate_grid_config_from_template_string(
            &["CAT", "COW", "WET", "TOT", "DOG", "EGG", "ACE", "OWL", "TWO", "TOW", "CWT"],
            "\
            ___\n\
            _#_\n\
            ___\n\
            ",
        ).unwrap();

        let first = find_fill(&config).expect("Failed to find a fill");
        let second = find_fill(&config).expect("Failed to find a fill");

        assert_sound(&config, &first);
        assert_eq!(first.choices, second.choices);
        assert_eq!(first.statistics.states, second.statistics.states);
    }
}
