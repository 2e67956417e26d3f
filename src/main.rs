//! `moving-window` - Moving-window self-paced reading trials

use clap::Parser;

use moving_window::cli::args::{Cli, LogFormatArg};
use moving_window::cli::commands;
use moving_window::error::ExitCode;
use moving_window::observability::{LogFormat, init_logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        let format = match cli.log_format {
            LogFormatArg::Human => LogFormat::Human,
            LogFormatArg::Json => LogFormat::Json,
        };
        init_logging(format, cli.verbose, cli.color);
    }

    // Commands hold no state worth flushing; a signal ends the process.
    tokio::spawn(async {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to register SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => std::process::exit(ExitCode::INTERRUPTED),
            _ = sigterm.recv() => std::process::exit(ExitCode::TERMINATED),
        }
    });

    let result = commands::dispatch(cli).await;

    match result {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
