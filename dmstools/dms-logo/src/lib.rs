//! Logo and coverage plots for deep-mutational-scanning codon tables
//!
//! Each sample's codon table is filtered (quality, variant count, mutated
//! codons only, codon range), aggregated into a per-codon residue frequency
//! matrix and drawn as a multi-row logo plot. Rows are fixed-size codon
//! windows; when a region table is given, each row carries a band of
//! colored region bars laid out by `dms-annot`. A depth-per-codon chart is
//! written next to every logo plot.
//!
//! ```shell
//! dms-logo --input mutant.codon,wildtype.codon --samplename mutant,wildtype \
//!     --regions domains.csv --outdir plots --non-syn-only
//! ```

use anyhow::Result;
use config::ArgCheck;

pub mod cli;
pub mod core;
pub mod matrix;
pub mod render;
pub mod utils;

pub fn lib_dms_logo(args: Vec<String>) -> Result<()> {
    let args = cli::Args::from(args);
    args.check()?;
    crate::core::plot_logos(args)
}
