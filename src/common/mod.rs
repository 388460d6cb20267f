//! Commonly used code.

use std::ops::Range;

use byte_unit::{Byte, UnitType};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

pub mod cancel;
pub mod io;
#[cfg(test)]
pub mod testing;

pub use cancel::CancellationToken;

/// Commonly used command line arguments.
#[derive(Parser, Debug, Default)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

/// Helper to print the current memory resident set size via `tracing`.
pub fn trace_rss_now() {
    let rss = procfs::process::Process::myself()
        .and_then(|me| me.stat())
        .map(|stat| stat.rss * procfs::page_size());
    match rss {
        Ok(rss) => match Byte::from_u128(rss as u128) {
            Some(bytes) => tracing::debug!(
                "RSS now: {}",
                bytes.get_appropriate_unit(UnitType::Binary)
            ),
            None => tracing::debug!("RSS now: {} bytes", rss),
        },
        Err(e) => tracing::debug!("could not determine RSS: {}", e),
    }
}

/// Whether two half-open ranges share at least one position.
pub fn overlaps(lhs: &Range<i32>, rhs: &Range<i32>) -> bool {
    std::cmp::max(lhs.start, rhs.start) < std::cmp::min(lhs.end, rhs.end)
}

/// The version of `mgsync` package.
#[cfg(not(test))]
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// This allows us to override the version to `0.0.0` in tests.
pub fn version() -> &'static str {
    #[cfg(test)]
    return "0.0.0";
    #[cfg(not(test))]
    return VERSION;
}
