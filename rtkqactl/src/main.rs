use std::fs;
use std::io;

use clap::{crate_description, crate_version, CommandFactory, Parser};
use clap_complete::generate;
use eyre::Result;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::trace;

use rtkqa_common::{init_logging, load_config};
use rtkqa_engine::{run, RunSummary};
use rtkqa_exif::{ExifTool, Extractor};

use crate::cli::{Opts, ScanOpts, SubCommand};
use crate::config::Settings;

mod cli;
mod config;

/// Binary name
pub const NAME: &str = env!("CARGO_BIN_NAME");
/// Binary version
pub const VERSION: &str = crate_version!();

fn main() -> Result<()> {
    let opts = Opts::parse();

    // Initialise logging early.
    //
    init_logging(opts.tree)?;

    let settings: Settings = load_config(opts.config.as_deref())?;

    banner();

    match &opts.subcmd {
        SubCommand::Scan(sopts) => {
            trace!("scan");

            scan(&settings, sopts)
        }

        SubCommand::Check => {
            trace!("check");

            let tool = ExifTool::new(settings.exiftool_path.clone());
            let ver = tool.ensure()?;
            eprintln!("{} {ver} found.", tool.name());
            Ok(())
        }

        // Standalone completion generation
        //
        SubCommand::Completion(copts) => {
            let generator = copts.shell;
            generate(generator, &mut Opts::command(), NAME, &mut io::stdout());
            Ok(())
        }
    }
}

/// Handle `scan DIR`: run the pipeline, emit the layers as JSON, print
/// the per-flight summary and collected warnings on stderr.
///
fn scan(settings: &Settings, sopts: &ScanOpts) -> Result<()> {
    let mut cfg = settings.engine_config();
    if let Some(t) = sopts.tolerance {
        cfg.match_tolerance_m = t;
    }
    if let Some(b) = sopts.batch_size {
        cfg.batch_size = b;
    }

    let tool = ExifTool::new(settings.exiftool_path.clone());
    let out = run(&sopts.folder, &cfg, &tool)?;

    let json = serde_json::to_string_pretty(&out.layers)?;
    match &sopts.output {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    eprintln!("{}", summary_table(&out.summary));
    for w in &out.summary.warnings {
        eprintln!("warning: {w}");
    }
    eprintln!(
        "Loaded {} photos across {} flight(s).",
        out.summary.photos,
        out.summary.flights.len()
    );
    Ok(())
}

fn summary_table(summary: &RunSummary) -> String {
    let mut b = Builder::default();
    b.push_record(["flight", "photos", "rmse l/m/h", "route points", "windows"]);
    for f in &summary.flights {
        b.push_record([
            f.flight_id.clone(),
            f.photos.to_string(),
            format!("{}/{}/{}", f.rmse_low, f.rmse_medium, f.rmse_high),
            f.route_points.to_string(),
            f.windows.to_string(),
        ]);
    }
    b.build().with(Style::modern()).to_string()
}

/// Display banner
///
fn banner() {
    eprintln!("{}/{}\n{}", NAME, VERSION, crate_description!());
}
