pub mod fns;
pub use fns::*;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// numeric values
pub const MIN_THREADS: usize = 1;
pub const FIRST_CODON: u64 = 9;
pub const ROW_WIDTH: u64 = 42;
pub const MIN_LABEL_LENGTH: u64 = 3;
pub const MIN_QUALITY: f64 = 24.0;
pub const MIN_COUNT: u64 = 100;
pub const ALL_CODONS: &str = "0-0";

// residues
pub const STOP_RESIDUE: &str = ".";
pub const STOP_RESIDUE_ALIAS: &str = "X";

// file names
pub const LOGO_SUFFIX: &str = "logoplot.svg";
pub const COVERAGE_SUFFIX: &str = "coverage.svg";
pub const NT_CHANGES_SUFFIX: &str = "nt_changes.svg";
pub const AA_CHANGES_SUFFIX: &str = "aa_changes.svg";
pub const AA_CHANGES_OVERLAY: &str = "aa_changes_sample_overlay.svg";
pub const AA_DIVERSITY: &str = "aa_diversity.svg";
pub const ROW_SUMMARY: &str = "rows.tsv";

// colorblind-safe sample colors, cycled when --colors is not given
pub const SAMPLE_PALETTE: [&str; 8] = [
    "#999999", "#E69F00", "#56B4E9", "#009E73", "#F0E442", "#0072B2", "#D55E00", "#CC79A7",
];

// accepted table extensions
pub const TABLE_EXTENSIONS: [&str; 4] = ["csv", "tsv", "codon", "txt"];

// flags
pub const NON_SYN_ONLY: bool = false;
pub const INCLUDE_STOP: bool = false;
