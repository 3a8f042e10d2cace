//! Module describing all commands and options of the `rtkqactl` driver.
//!
//! Two main commands:
//!
//! - `scan` runs the whole pipeline over a mission folder tree and emits
//!   the three layer collections as one JSON document,
//! - `check` resolves the metadata tool and reports its version.
//!
//! `completion` is here to configure the various shells.
//!

use std::path::PathBuf;

use clap::{crate_description, crate_name, crate_version, Parser};
use clap_complete::shells::Shell;

/// CLI options
#[derive(Parser)]
#[clap(name = crate_name!(), about = crate_description!())]
#[clap(version = crate_version!())]
pub struct Opts {
    /// Settings file.
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// Hierarchical log output.
    #[clap(long)]
    pub tree: bool,
    /// Verbose mode.
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// Sub-commands (see below).
    #[clap(subcommand)]
    pub subcmd: SubCommand,
}

// ------

/// All sub-commands:
///
/// `scan [-o FILE] [-T METERS] [-B SIZE] DIR`
/// `check`
/// `completion SHELL`
///
#[derive(Debug, Parser)]
pub enum SubCommand {
    /// Run the pipeline over a mission folder
    Scan(ScanOpts),
    /// Check the metadata extraction tool
    Check,
    /// Generate completion scripts
    Completion(ComplOpts),
}

// ------

/// Options for `scan`.
///
#[derive(Debug, Parser)]
pub struct ScanOpts {
    /// Output file, stdout by default.
    #[clap(short = 'o', long)]
    pub output: Option<PathBuf>,
    /// Photo/log match tolerance in meters.
    #[clap(short = 'T', long)]
    pub tolerance: Option<f64>,
    /// Images per metadata tool invocation.
    #[clap(short = 'B', long)]
    pub batch_size: Option<usize>,
    /// Mission folder to scan.
    pub folder: PathBuf,
}

#[derive(Debug, Parser)]
pub struct ComplOpts {
    /// Shell to generate for
    #[clap(value_parser)]
    pub shell: Shell,
}
