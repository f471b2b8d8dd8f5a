//! # img-dedup CLI
//!
//! Command-line interface for the similar image finder.
//!
//! ## Usage
//! ```bash
//! img-dedup scan ~/Pictures --recursive --threshold 0.85
//! img-dedup scan ~/Pictures --output json
//! img-dedup clean ~/Pictures --dry-run --report report.json
//! ```

mod cli;

use similar_image_finder::Result;

fn main() -> Result<()> {
    cli::run()
}
