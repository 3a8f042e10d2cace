//! Common logging initializer.

use eyre::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_tree::HierarchicalLayer;

/// Initialise tracing early.
///
/// Filters come from the environment (`RUST_LOG`). The default output is a
/// compact single-line format; `use_tree` switches to hierarchical output,
/// which is easier to read when spans nest during a folder scan.
///
pub fn init_logging(use_tree: bool) -> Result<()> {
    let filter = EnvFilter::from_default_env();

    let fmt = if use_tree {
        None
    } else {
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
    };

    let tree = if use_tree {
        Some(
            HierarchicalLayer::new(2)
                .with_ansi(true)
                .with_targets(true)
                .with_bracketed_fields(true),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt)
        .with(tree)
        .init();

    Ok(())
}
