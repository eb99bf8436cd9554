use std::collections::{HashSet, VecDeque};

use crate::{Domains, GridConfig, SlotId};

/// A directed constraint between two crossing slots: the first slot's domain is checked against
/// the second's.
pub type Arc = (SlotId, SlotId);

/// Remove every option whose length doesn't match its slot.
pub fn enforce_node_consistency(config: &GridConfig, domains: &mut Domains) {
    for slot_config in &config.slot_configs {
        domains.retain(slot_config.id, |word_id| {
            config.words[word_id].len() == slot_config.length
        });
    }
}

/// Make slot `x` arc consistent with slot `y`, removing every option for `x` that doesn't agree
/// with at least one option for `y` on their shared cell. Returns whether anything was removed.
pub fn revise(config: &GridConfig, domains: &mut Domains, x: SlotId, y: SlotId) -> bool {
    let (x_cell, y_cell) = match config.overlap(x, y) {
        Some(overlap) => overlap,
        None => return false,
    };

    // Every letter `y` can still place in the shared cell.
    let supported: HashSet<char> = domains.get(y).iter()
        .filter_map(|word_id| config.words[word_id].chars.get(y_cell).copied())
        .collect();

    domains.retain(x, |word_id| {
        config.words[word_id].chars.get(x_cell)
            .map(|glyph| supported.contains(glyph))
            .unwrap_or(false)
    })
}

/// FIFO worklist of arcs used by `ac3`. An arc that is already waiting isn't added again.
#[derive(Debug)]
struct ConsistencyQueue {
    queue: VecDeque<Arc>,
    queued: HashSet<Arc>,
}

impl ConsistencyQueue {
    fn with_initial_queue<Items>(items: Items) -> ConsistencyQueue
        where
            Items: IntoIterator<Item=Arc>
    {
        let mut queue = ConsistencyQueue { queue: VecDeque::new(), queued: HashSet::new() };
        for arc in items {
            queue.enqueue(arc);
        }
        queue
    }

    fn pop_front(&mut self) -> Option<Arc> {
        let arc = self.queue.pop_front()?;
        self.queued.remove(&arc);
        Some(arc)
    }

    fn enqueue(&mut self, arc: Arc) {
        if self.queued.insert(arc) {
            self.queue.push_back(arc);
        }
    }
}

/// Results from a call to `ac3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many revisions removed at least one option.
    pub revisions: u64,
}

/// Some slot was left with no options, so the puzzle can't be filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub slot_id: SlotId,
}

pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Make the domains arc consistent. If `arcs` is `None`, start from every arc in the grid (both
/// directions of every crossing); otherwise start from the given arcs only.
///
/// Whenever `revise(x, y)` shrinks the domain of `x`, the arcs queued next point into `x`: `(z, x)`
/// for every other neighbor `z`, so each neighbor is rechecked against what is left of `x`.
pub fn ac3(
    config: &GridConfig,
    domains: &mut Domains,
    arcs: Option<Vec<Arc>>,
) -> ArcConsistencyResult {
    let mut queue = match arcs {
        Some(arcs) => ConsistencyQueue::with_initial_queue(arcs),
        None => ConsistencyQueue::with_initial_queue(
            config.slot_ids().flat_map(|x| config.neighbors(x).map(move |y| (x, y)))
        ),
    };

    let mut revisions = 0;

    while let Some((x, y)) = queue.pop_front() {
        if !revise(config, domains, x, y) {
            continue;
        }
        revisions += 1;

        if domains.is_empty(x) {
            return Err(ArcConsistencyFailure { slot_id: x });
        }

        // Options for `x` are gone, so every other crossing slot has to be rechecked against it.
        for z in config.neighbors(x) {
            if z != y {
                queue.enqueue((z, x));
            }
        }
    }

    Ok(ArcConsistencySuccess { revisions })
}
