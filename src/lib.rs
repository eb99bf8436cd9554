use std::fmt::{Debug, Formatter};
use std::ops::Range;
use bit_set::BitSet;
use instant::Duration;
use smallvec::SmallVec;

pub mod assignment;
pub mod consistency;
pub mod domain;
pub mod grid;
pub mod search;

pub use assignment::Assignment;
pub use consistency::{
    ac3, enforce_node_consistency, revise, Arc, ArcConsistencyFailure, ArcConsistencyResult,
    ArcConsistencySuccess,
};
pub use domain::Domains;
pub use grid::{
    generate_grid_config, generate_grid_config_from_template_string, load_word_list, render_grid,
    GridEntry, GridError,
};
pub use search::{
    find_fill, find_fill_with_options, FillFailure, FillSuccess, Filler, SolveOptions,
};

/// The expected maximum length for a single slot. Longer slots still work, they just spill onto
/// the heap.
pub const MAX_SLOT_LENGTH: usize = 21;

/// An identifier for a given slot, based on its index in the Grid's `slot_configs` field.
pub type SlotId = usize;

/// An identifier for a given word, based on its index in the Grid's `words` field.
pub type WordId = usize;

/// Zero-indexed x and y coords for a cell in the grid, where y = 0 in the top row.
pub type GridCoord = (usize, usize);

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Across,
    Down,
}

/// A struct representing a word from the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,
    pub chars: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    pub fn new(string: &str) -> Word {
        Word {
            string: string.to_string(),
            chars: string.chars().collect(),
        }
    }

    /// Length in characters, which is what gets compared against slot lengths.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

/// A struct representing a crossing between one slot and another, referencing the other slot's id
/// and the location of the intersection within the other slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// A struct representing a slot in the grid. Slots never change once the grid is built.
#[derive(Clone)]
pub struct SlotConfig {
    pub id: SlotId,
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,
    /// Indexed by cell within the slot.
    pub crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]>,
}

impl SlotConfig {
    /// Generate the coords for each cell of this slot.
    pub fn cell_coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.length).map(move |cell_idx| match self.direction {
            Direction::Across => (self.start_cell.0 + cell_idx, self.start_cell.1),
            Direction::Down => (self.start_cell.0, self.start_cell.1 + cell_idx),
        })
    }
}

impl Debug for SlotConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotConfig")
            .field("id", &self.id)
            .field("start_cell", &self.start_cell)
            .field("direction", &self.direction)
            .field("length", &self.length)
            .field("crossings", &self.crossings)
            .finish()
    }
}

/// The static description of a puzzle: the grid geometry, its slots and the crossings between
/// them, and the vocabulary every slot draws from.
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
    /// Indexed by `y * width + x`.
    pub open_cells: BitSet,
    pub slot_configs: Vec<SlotConfig>,
    pub words: Vec<Word>,
}

impl Debug for GridConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridConfig")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("slot_configs", &self.slot_configs)
            .field("words", &(["(", &self.words.len().to_string(), " entries)"].join("")))
            .finish()
    }
}

impl GridConfig {
    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }

    pub fn slot_ids(&self) -> Range<SlotId> {
        0..self.slot_configs.len()
    }

    /// The slots sharing a cell with the given slot, in cell order.
    pub fn neighbors(&self, slot_id: SlotId) -> impl Iterator<Item = SlotId> + '_ {
        self.slot_configs[slot_id]
            .crossings
            .iter()
            .flatten()
            .map(|crossing| crossing.other_slot_id)
    }

    pub fn degree(&self, slot_id: SlotId) -> usize {
        self.neighbors(slot_id).count()
    }

    /// Return the offsets `(in_a, in_b)` of the cell shared by two slots, if there is one.
    pub fn overlap(&self, slot_a: SlotId, slot_b: SlotId) -> Option<(usize, usize)> {
        self.slot_configs[slot_a]
            .crossings
            .iter()
            .enumerate()
            .find_map(|(cell_idx, crossing)| match crossing {
                Some(crossing) if crossing.other_slot_id == slot_b => {
                    Some((cell_idx, crossing.other_slot_cell))
                }
                _ => None,
            })
    }

    pub fn is_open(&self, (x, y): GridCoord) -> bool {
        x < self.width && y < self.height && self.open_cells.contains(y * self.width + x)
    }
}

/// A struct recording a slot assignment made during the filling process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub slot_id: SlotId,
    pub word_id: WordId,
}

/// A struct tracking statistics about the filling process.
#[derive(Debug, Clone)]
pub struct Statistics {
    pub node_limit: Option<u64>,
    /// Number of search nodes (calls into the backtracking step) visited.
    pub states: u64,
    /// Number of search nodes abandoned after every candidate failed.
    pub backtracks: u64,
    /// Number of arc revisions that removed at least one candidate.
    pub revisions: u64,
    pub duration: Duration,
}

impl Statistics {
    fn new(node_limit: Option<u64>) -> Statistics {
        Statistics {
            node_limit,
            states: 0,
            backtracks: 0,
            revisions: 0,
            duration: Duration::from_millis(0),
        }
    }
}
