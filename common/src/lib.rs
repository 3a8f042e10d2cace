//! This library shares plumbing amongst all rtkqa crates: the logging
//! initializer and the settings-file loading engine.
//!

mod config;
mod logging;

use clap::{crate_name, crate_version};
pub use config::*;
pub use logging::*;

const NAME: &str = crate_name!();
const VERSION: &str = crate_version!();

pub fn version() -> String {
    format!("{}/{}", NAME, VERSION)
}
