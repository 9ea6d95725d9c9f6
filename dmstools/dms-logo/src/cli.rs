use clap::{ArgAction, Parser, ValueEnum};
use config::{
    ArgCheck, CliError, ALL_CODONS, FIRST_CODON, INCLUDE_STOP, MIN_COUNT, MIN_LABEL_LENGTH,
    MIN_QUALITY, NON_SYN_ONLY, ROW_WIDTH, SAMPLE_PALETTE,
};
use hashbrown::HashSet;
use std::path::PathBuf;

/// What to do with a row whose window boundary no region covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MissingPolicy {
    /// render the row without an annotation band
    Skip,
    /// fail the whole sample
    Abort,
}

#[derive(Debug, Parser)]
#[command(name = "dms-logo")]
#[command(about = "Per-codon logo and coverage plots for deep-mutational-scanning tables")]
#[command(version = config::VERSION)]
pub struct Args {
    #[arg(
        short = 'i',
        long = "input",
        required = true,
        value_name = "PATHS",
        value_delimiter = ',',
        num_args = 1..,
        help = "Paths to per-sample codon tables delimited by comma"
    )]
    pub input: Vec<PathBuf>,

    #[arg(
        short = 'r',
        long = "regions",
        required = false,
        value_name = "PATHS",
        value_delimiter = ',',
        num_args = 1..,
        help = "Paths to region tables (start,end,color,region_name) sorted by start"
    )]
    pub regions: Vec<PathBuf>,

    #[arg(
        short = 'n',
        long = "samplename",
        required = false,
        value_name = "NAMES",
        value_delimiter = ',',
        num_args = 1..,
        help = "Sample names in the same order as --input [default: file stems]"
    )]
    pub samples: Vec<String>,

    #[arg(
        long = "colors",
        required = false,
        value_name = "COLORS",
        value_delimiter = ',',
        num_args = 1..,
        help = "Line colors in the same order as --input [default: colorblind palette]"
    )]
    pub colors: Vec<String>,

    #[arg(
        short = 'o',
        long = "outdir",
        value_name = "DIR",
        default_value = ".",
        help = "Output directory for the plots"
    )]
    pub outdir: PathBuf,

    #[arg(
        long = "merged",
        help = "Flag to read inputs as precomputed POSITION,AA,MERGE_FRAC tables",
        value_name = "FLAG",
        default_missing_value("true"),
        default_value("false"),
        num_args(0..=1),
        require_equals(true),
        action = ArgAction::Set,
    )]
    pub merged: bool,

    #[arg(
        short = 'q',
        long = "qual",
        value_name = "QUALITY",
        default_value_t = MIN_QUALITY,
        help = "Minimum mean of forward/reverse mean-min quality"
    )]
    pub qual: f64,

    #[arg(
        short = 'c',
        long = "counts",
        value_name = "COUNT",
        default_value_t = MIN_COUNT,
        help = "Minimum variant count"
    )]
    pub counts: u64,

    #[arg(
        long = "pos",
        value_name = "RANGE",
        default_value = ALL_CODONS,
        help = "Inclusive codon range to keep, e.g. 7-100 [0-0 keeps all]"
    )]
    pub pos: String,

    #[arg(
        long = "non-syn-only",
        help = "Flag to drop synonymous amino acid changes",
        value_name = "FLAG",
        default_missing_value("true"),
        default_value_t = NON_SYN_ONLY,
        num_args(0..=1),
        require_equals(true),
        action = ArgAction::Set,
    )]
    pub non_syn_only: bool,

    #[arg(
        long = "include-stop",
        help = "Flag to keep stop codons (drawn as X)",
        value_name = "FLAG",
        default_missing_value("true"),
        default_value_t = INCLUDE_STOP,
        num_args(0..=1),
        require_equals(true),
        action = ArgAction::Set,
    )]
    pub include_stop: bool,

    #[arg(
        short = 's',
        long = "first",
        value_name = "CODON",
        default_value_t = FIRST_CODON,
        help = "First codon position to plot"
    )]
    pub first: u64,

    #[arg(
        short = 'w',
        long = "width",
        value_name = "WIDTH",
        default_value_t = ROW_WIDTH,
        help = "Number of codon positions per row"
    )]
    pub width: u64,

    #[arg(
        short = 'm',
        long = "min-label",
        value_name = "LENGTH",
        default_value_t = MIN_LABEL_LENGTH,
        help = "Minimum segment length for a label (exclusive unless --inclusive)"
    )]
    pub min_label: u64,

    #[arg(
        long = "inclusive",
        help = "Flag to label segments whose length equals --min-label",
        value_name = "FLAG",
        default_missing_value("true"),
        default_value("false"),
        num_args(0..=1),
        require_equals(true),
        action = ArgAction::Set,
    )]
    pub inclusive: bool,

    #[arg(
        long = "on-missing",
        value_enum,
        value_name = "POLICY",
        default_value_t = MissingPolicy::Skip,
        help = "Policy for rows whose boundaries are not annotated"
    )]
    pub on_missing: MissingPolicy,

    #[arg(
        long = "ymax",
        value_name = "HEIGHT",
        help = "Fixed y-axis limit shared by all rows [default: tallest stack]"
    )]
    pub y_max: Option<f64>,

    #[arg(
        short = 't',
        long = "threads",
        help = "Number of threads",
        value_name = "THREADS",
        default_value_t = num_cpus::get()
    )]
    pub threads: usize,
}

impl ArgCheck for Args {
    fn get_inputs(&self) -> &Vec<PathBuf> {
        &self.input
    }

    fn get_optional(&self) -> Option<&Vec<PathBuf>> {
        Some(&self.regions)
    }

    fn optional_name(&self) -> &'static str {
        "region table"
    }
}

impl Args {
    pub fn from(args: Vec<String>) -> Self {
        let mut full_args = vec![env!("CARGO_PKG_NAME").to_string()];
        full_args.extend(args);

        Args::parse_from(full_args)
    }

    /// Names, tables and colors of every sample, in input order.
    ///
    /// Names default to the file stem and colors to the palette; names must
    /// be unique because they key the output files.
    pub fn resolve_samples(&self) -> Result<Vec<Sample>, CliError> {
        let given = [
            (self.samples.len(), "sample names"),
            (self.colors.len(), "colors"),
        ];
        for (given, what) in given {
            if given != 0 && given != self.input.len() {
                return Err(CliError::InvalidInput(format!(
                    "ERROR: {} {} for {} input tables",
                    given,
                    what,
                    self.input.len()
                )));
            }
        }

        let mut seen = HashSet::new();
        let mut samples = Vec::with_capacity(self.input.len());

        for (i, path) in self.input.iter().enumerate() {
            let name = match self.samples.get(i) {
                Some(name) => name.trim().to_string(),
                None => path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
                    .unwrap_or_else(|| format!("sample_{}", i + 1)),
            };

            if !seen.insert(name.clone()) {
                return Err(CliError::InvalidInput(format!(
                    "ERROR: sample name '{}' is shared by several inputs, set --samplename",
                    name
                )));
            }

            let color = match self.colors.get(i) {
                Some(color) => color.trim().to_string(),
                None => SAMPLE_PALETTE[i % SAMPLE_PALETTE.len()].to_string(),
            };

            samples.push(Sample {
                name,
                path: path.clone(),
                color,
            });
        }

        Ok(samples)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub name: String,
    pub path: PathBuf,
    pub color: String,
}
