use std::fs;
use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use cspfill::{
    find_fill_with_options, generate_grid_config_from_template_string, load_word_list, render_grid,
    SolveOptions,
};

/// Fill a crossword grid with words from a word list.
#[derive(Parser)]
#[command(name = "cspfill", version)]
struct Cli {
    /// Grid structure file: `_` for open cells, anything else for blocks
    structure: PathBuf,

    /// Word list file, one word per line
    words: PathBuf,

    /// Write the filled grid to this file as well as printing it
    output: Option<PathBuf>,

    /// Give up after visiting this many search states
    #[arg(short, long)]
    node_limit: Option<u64>,

    /// Print search statistics
    #[arg(short, long)]
    stats: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let structure = fs::read_to_string(&cli.structure)
        .with_context(|| format!("failed to read structure file {}", cli.structure.display()))?;
    let words = load_word_list(
        &fs::read_to_string(&cli.words)
            .with_context(|| format!("failed to read word list {}", cli.words.display()))?
    );
    info!("loaded {} words", words.len());

    let grid_config = generate_grid_config_from_template_string(&words, &structure)
        .context("failed to build grid")?;

    let options = SolveOptions { node_limit: cli.node_limit };
    match find_fill_with_options(&grid_config, &options) {
        Ok(result) => {
            let display_grid = render_grid(&grid_config, &result.choices);

            if cli.stats {
                println!("{:?}", result.statistics);
            }
            println!("{}", display_grid);

            if let Some(output) = &cli.output {
                fs::write(output, display_grid + "\n")
                    .with_context(|| format!("failed to write {}", output.display()))?;
                info!("written filled grid to {}", output.display());
            }
        }
        Err(failure) => {
            info!("fill failed: {}", failure);
            println!("No solution.");
        }
    }

    Ok(())
}
