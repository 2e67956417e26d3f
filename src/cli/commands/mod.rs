//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod completions;
pub mod measures;
pub mod shuffle;
pub mod trial;
pub mod version;

use crate::cli::args::{Cli, Commands, TrialSubcommand};
use crate::error::MovingWindowError;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
#[allow(clippy::unused_async)] // handlers are synchronous; main awaits alongside signal handling
pub async fn dispatch(cli: Cli) -> Result<(), MovingWindowError> {
    match cli.command {
        Commands::Trial(cmd) => match cmd.subcommand {
            TrialSubcommand::Run(args) => trial::run(&args),
            TrialSubcommand::Validate(args) => trial::validate(&args),
        },
        Commands::Measures(args) => measures::run(&args),
        Commands::Shuffle(args) => shuffle::run(&args),
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}
