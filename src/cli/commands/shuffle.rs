//! `shuffle` command handler.

use tracing::info;

use crate::cli::args::ShuffleArgs;
use crate::error::MovingWindowError;
use crate::randomize::{ConstrainedShuffle, RunLengthShuffler, load_stimuli};

/// Print the stimulus list as JSON in a constrained random order.
///
/// # Errors
///
/// Returns an I/O or YAML error if the list cannot be read, or a
/// randomize error if no order satisfies `--max-run`.
pub fn run(args: &ShuffleArgs) -> Result<(), MovingWindowError> {
    let items = load_stimuli(&args.stimuli)?;
    let mut shuffler = args
        .seed
        .map_or_else(RunLengthShuffler::new, RunLengthShuffler::seeded);
    let ordered = shuffler.shuffle(&items, args.max_run)?;
    info!(
        items = ordered.len(),
        max_run = args.max_run,
        seed = ?args.seed,
        "stimulus list ordered"
    );
    println!("{}", serde_json::to_string_pretty(&ordered)?);
    Ok(())
}
