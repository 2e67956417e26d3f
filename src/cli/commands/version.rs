//! Version information display.

use crate::cli::args::{OutputFormat, VersionArgs};

/// Print the package name and version.
pub fn run(args: &VersionArgs) {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    match args.format {
        OutputFormat::Human => println!("{name} {version}"),
        OutputFormat::Json => {
            let info = serde_json::json!({ "name": name, "version": version });
            println!("{info}");
        }
    }
}
