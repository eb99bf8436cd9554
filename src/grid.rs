use std::collections::{HashMap, HashSet};
use bit_set::BitSet;
use log::{debug, warn};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{Choice, Crossing, Direction, GridConfig, GridCoord, SlotConfig, Word, MAX_SLOT_LENGTH};

/// Problems with a grid description or word list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("the word list has no usable words")]
    EmptyWordList,
    #[error("entry {index} has zero length")]
    EmptyEntry { index: usize },
    #[error("more than two entries cover cell {loc:?}")]
    OvercrowdedCell { loc: GridCoord },
    #[error("entries {first} and {second} share more than one cell")]
    ParallelOverlap { first: usize, second: usize },
}

/// An across or down entry in the input to `generate_grid_config`.
#[derive(Debug, Clone)]
pub struct GridEntry {
    pub loc: GridCoord,
    pub len: usize,
    pub dir: Direction,
}

impl GridEntry {
    /// Generate the coords for each cell of this entry.
    fn cell_coords(&self) -> Vec<GridCoord> {
        (0..self.len).map(|cell_idx| {
            match self.dir {
                Direction::Across => (self.loc.0 + cell_idx, self.loc.1),
                Direction::Down => (self.loc.0, self.loc.1 + cell_idx),
            }
        }).collect()
    }
}

/// Read a word list with one word per line. Words are trimmed and upper-cased, and blank lines
/// are skipped.
pub fn load_word_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.to_uppercase())
        .collect()
}

/// Deduplicate the word list, keeping the first occurrence of each word.
fn build_words<S: AsRef<str>>(word_list: &[S]) -> Result<Vec<Word>, GridError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(word_list.len());
    let mut words = Vec::with_capacity(word_list.len());

    for word in word_list {
        let word = word.as_ref();
        if word.is_empty() {
            warn!("skipping empty word in word list");
            continue;
        }
        if seen.insert(word) {
            words.push(Word::new(word));
        }
    }

    if words.is_empty() {
        return Err(GridError::EmptyWordList);
    }
    if words.len() < word_list.len() {
        debug!("dropped {} duplicate or empty words", word_list.len() - words.len());
    }

    Ok(words)
}

/// Build the slots and their crossings from a list of entries on a grid of the given size.
fn build_grid_config<S: AsRef<str>>(
    word_list: &[S],
    entries: &[GridEntry],
    width: usize,
    height: usize,
    open_cells: BitSet,
) -> Result<GridConfig, GridError> {
    let words = build_words(word_list)?;

    // Build a map from cell location to (entry index, cell index within entry), which we can then
    // use to calculate crossings.
    let mut cell_by_loc: HashMap<GridCoord, SmallVec<[(usize, usize); 2]>> = HashMap::new();

    for (entry_idx, entry) in entries.iter().enumerate() {
        if entry.len == 0 {
            return Err(GridError::EmptyEntry { index: entry_idx });
        }

        for (cell_idx, loc) in entry.cell_coords().into_iter().enumerate() {
            let cell = cell_by_loc.entry(loc).or_default();
            if cell.len() == 2 {
                return Err(GridError::OvercrowdedCell { loc });
            }
            cell.push((entry_idx, cell_idx));
        }
    }

    let mut slot_configs = Vec::with_capacity(entries.len());

    for (entry_idx, entry) in entries.iter().enumerate() {
        let crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]> =
            entry.cell_coords().iter().map(|loc| {
                cell_by_loc[loc].iter()
                    .find(|&&(other_entry_idx, _)| other_entry_idx != entry_idx)
                    .map(|&(other_slot_id, other_slot_cell)| Crossing { other_slot_id, other_slot_cell })
            }).collect();

        let mut crossed: HashSet<usize> = HashSet::new();
        for crossing in crossings.iter().flatten() {
            if !crossed.insert(crossing.other_slot_id) {
                return Err(GridError::ParallelOverlap { first: entry_idx, second: crossing.other_slot_id });
            }
        }

        slot_configs.push(SlotConfig {
            id: entry_idx,
            start_cell: entry.loc,
            direction: entry.dir,
            length: entry.len,
            crossings,
        });
    }

    let config = GridConfig { width, height, open_cells, slot_configs, words };
    debug!("built {}x{} grid with {} slots and {} words", width, height, config.slot_count(), config.words.len());

    Ok(config)
}

/// Generate a GridConfig from explicit entries. The grid is just big enough to hold every
/// entry, and the cells no entry covers are blocks.
pub fn generate_grid_config<S: AsRef<str>>(
    word_list: &[S],
    entries: &[GridEntry],
) -> Result<GridConfig, GridError> {
    let cells: Vec<GridCoord> = entries.iter().flat_map(|entry| entry.cell_coords()).collect();
    let width = cells.iter().map(|&(x, _)| x + 1).max().unwrap_or(0);
    let height = cells.iter().map(|&(_, y)| y + 1).max().unwrap_or(0);

    let mut open_cells = BitSet::with_capacity(width * height);
    for (x, y) in cells {
        open_cells.insert(y * width + x);
    }

    build_grid_config(word_list, entries, width, height, open_cells)
}

/// Generate a grid config from a string template, with `_` or `.` representing open cells and
/// anything else representing blocks. Short lines are padded with blocks, and an empty line in the
/// middle of the template is a row of blocks. Blank lines before the first row and after the last
/// are ignored.
pub fn generate_grid_config_from_template_string<S: AsRef<str>>(
    word_list: &[S],
    template: &str,
) -> Result<GridConfig, GridError> {
    let lines: Vec<&str> = template
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let is_blank = |line: &&str| line.trim().is_empty();
    let first_row = lines.iter().position(|line| !is_blank(line)).unwrap_or(lines.len());
    let end_row = lines.iter().rposition(|line| !is_blank(line)).map_or(first_row, |last| last + 1);

    let rows: Vec<Vec<bool>> =
        lines[first_row..end_row].iter().map(|line| {
            line.chars().map(|cell| cell == '_' || cell == '.').collect()
        }).collect();

    let height = rows.len();
    let width = rows.iter().map(|row| row.len()).max().unwrap_or(0);
    let is_open = |x: usize, y: usize| rows[y].get(x).copied().unwrap_or(false);

    let mut open_cells = BitSet::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            if is_open(x, y) {
                open_cells.insert(y * width + x);
            }
        }
    }

    // Maximal runs of more than one open cell, scanning `outer` lines of `inner` cells each.
    fn find_runs<F>(outer: usize, inner: usize, is_open: F, dir: Direction) -> Vec<GridEntry>
        where
            F: Fn(usize, usize) -> bool
    {
        let mut result = vec![];

        for line in 0..outer {
            let mut run_start: Option<usize> = None;

            for cell in 0..=inner {
                let open = cell < inner && is_open(line, cell);
                match (open, run_start) {
                    (true, None) => run_start = Some(cell),
                    (false, Some(start)) => {
                        if cell - start > 1 {
                            let loc = match dir {
                                Direction::Across => (start, line),
                                Direction::Down => (line, start),
                            };
                            result.push(GridEntry { loc, len: cell - start, dir });
                        }
                        run_start = None;
                    }
                    _ => {}
                }
            }
        }

        result
    }

    let mut entries = find_runs(height, width, |y, x| is_open(x, y), Direction::Across);
    entries.extend(find_runs(width, height, |x, y| is_open(x, y), Direction::Down));

    build_grid_config(word_list, &entries, width, height, open_cells)
}

/// Turn the given grid config and fill choices into a rendered string: `#` for blocks, `_` for
/// open cells without a letter.
pub fn render_grid(config: &GridConfig, choices: &[Choice]) -> String {
    let mut grid: Vec<Vec<char>> =
        (0..config.height).map(|y| {
            (0..config.width).map(|x| if config.is_open((x, y)) { '_' } else { '#' }).collect()
        }).collect();

    for &Choice { slot_id, word_id } in choices {
        let slot_config = &config.slot_configs[slot_id];
        let word = &config.words[word_id];

        for ((x, y), &glyph) in slot_config.cell_coords().zip(&word.chars) {
            grid[y][x] = glyph;
        }
    }

    grid.iter().map(|row| row.iter().collect::<String>()).collect::<Vec<_>>().join("\n")
}
