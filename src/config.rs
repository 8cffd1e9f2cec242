use std::path::PathBuf;

use clap::Parser;
use hmm_annotator::data::labels::IndexPolicy;
use hmm_annotator::data::SessionConfig;

/// Manual HMM state labeling for nightly SSINS time series.
///
/// The storage root must contain `raw_data/`; labels are written to
/// `annotations/` next to it. Set `RUST_LOG=info` for a session log.
#[derive(Debug, Parser)]
#[command(name = "hmm-annotator", version, about)]
pub struct Cli {
    /// Storage root to open on startup (otherwise use File → Open root…).
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Reject a selection that reaches past the end of the series instead
    /// of labeling the in-range part.
    #[arg(long)]
    pub strict_indices: bool,

    /// Number of pointing filter buttons (pointings 0..N).
    #[arg(long, default_value_t = 5, value_name = "N")]
    pub pointings: u8,

    /// Print recording counts for --root as JSON and exit.
    #[arg(long, requires = "root")]
    pub summary: bool,
}

/// Settings the UI needs after startup.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub session: SessionConfig,
    pub pointings: u8,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        let index_policy = if self.strict_indices {
            IndexPolicy::Strict
        } else {
            IndexPolicy::Ignore
        };
        Settings {
            session: SessionConfig { index_policy },
            pointings: self.pointings,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            pointings: 5,
        }
    }
}
