use clap::{ArgAction, Parser};
use config::{ArgCheck, MIN_LABEL_LENGTH, ROW_WIDTH};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "dms-annot")]
#[command(about = "Lays out region annotations over paginated codon rows")]
#[command(version = config::VERSION)]
pub struct Args {
    #[arg(
        short = 'r',
        long = "regions",
        required = true,
        value_name = "PATHS",
        value_delimiter = ',',
        num_args = 1..,
        help = "Paths to region tables (start,end,color,region_name) sorted by start"
    )]
    pub regions: Vec<PathBuf>,

    #[arg(
        short = 's',
        long = "first",
        value_name = "CODON",
        help = "First codon position to page [default: first region start]"
    )]
    pub first: Option<u64>,

    #[arg(
        short = 'e',
        long = "last",
        value_name = "CODON",
        help = "Last codon position to page [default: last region end]"
    )]
    pub last: Option<u64>,

    #[arg(
        short = 'w',
        long = "width",
        help = "Number of codon positions per row",
        value_name = "WIDTH",
        default_value_t = ROW_WIDTH
    )]
    pub width: u64,

    #[arg(
        short = 'm',
        long = "min-label",
        help = "Minimum segment length for a label (exclusive unless --inclusive)",
        value_name = "LENGTH",
        default_value_t = MIN_LABEL_LENGTH
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
        short = 'o',
        long = "output",
        required = false,
        value_name = "PATH",
        help = "Path to write the JSON layout [default: stdout]"
    )]
    pub output: Option<PathBuf>,
}

impl ArgCheck for Args {
    fn get_inputs(&self) -> &Vec<PathBuf> {
        &self.regions
    }
}

impl Args {
    pub fn from(args: Vec<String>) -> Self {
        let mut full_args = vec![env!("CARGO_PKG_NAME").to_string()];
        full_args.extend(args);

        Args::parse_from(full_args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_from_raw_vector() {
        let args = Args::from(
            ["--regions", "a.csv,b.csv", "--width", "30", "--inclusive"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );

        assert_eq!(args.regions.len(), 2);
        assert_eq!(args.width, 30);
        assert!(args.inclusive);
        assert_eq!(args.min_label, MIN_LABEL_LENGTH);
        assert!(args.first.is_none());
        assert!(args.output.is_none());
    }
}
