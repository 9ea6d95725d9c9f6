use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::TABLE_EXTENSIONS;

// os
#[cfg(not(windows))]
const TICK_SETTINGS: (&str, u64) = ("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ", 80);
#[cfg(windows)]
const TICK_SETTINGS: (&str, u64) = (r"+-x| ", 200);

/// return a pre-configured progress bar
pub fn get_progress_bar(length: u64, msg: &str) -> ProgressBar {
    let progress_bar = ProgressBar::new(length);

    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars(TICK_SETTINGS.0)
        .template(" {spinner} {msg:<30} {wide_bar} ETA {eta_precise} ")
    {
        progress_bar.set_style(style);
    }

    progress_bar.enable_steady_tick(Duration::from_millis(TICK_SETTINGS.1));
    progress_bar.set_message(msg.to_owned());

    progress_bar
}

/// write any collection of lines to a file
pub fn write_collection<P: AsRef<Path>>(data: &[String], fname: P) -> std::io::Result<()> {
    log::info!(
        "Lines in {}: {:?}. Writing...",
        fname.as_ref().display(),
        data.len()
    );
    let mut writer = BufWriter::new(File::create(fname)?);

    for line in data.iter() {
        writeln!(writer, "{}", line)?;
    }

    writer.flush()
}

/// argument checker for all subcommands
pub trait ArgCheck {
    fn check(&self) -> Result<(), CliError> {
        self.validate_args()
    }

    fn validate_args(&self) -> Result<(), CliError> {
        self.check_inputs()?;

        match self.get_optional() {
            Some(tables) if !tables.is_empty() => self.check_optional()?,
            Some(_) => log::warn!("No {} provided. Skipping...", self.optional_name()),
            None => (),
        };

        Ok(())
    }

    fn check_inputs(&self) -> Result<(), CliError> {
        if self.get_inputs().is_empty() {
            let err = "No input tables provided".to_string();
            return Err(CliError::InvalidInput(err));
        }
        for input in self.get_inputs() {
            validate(input)?;
        }

        Ok(())
    }

    fn check_optional(&self) -> Result<(), CliError> {
        for table in self.get_optional().into_iter().flatten() {
            validate(table)?;
        }
        Ok(())
    }

    fn optional_name(&self) -> &'static str {
        "optional table"
    }

    fn get_inputs(&self) -> &Vec<PathBuf>;

    fn get_optional(&self) -> Option<&Vec<PathBuf>> {
        None
    }
}

/// error handling for CLI
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// argument validation
pub fn validate(arg: &PathBuf) -> Result<(), CliError> {
    if !arg.exists() {
        return Err(CliError::InvalidInput(format!(
            "ERROR: {:?} does not exist",
            arg
        )));
    }

    if !arg.is_file() {
        return Err(CliError::InvalidInput(format!(
            "ERROR: {:?} is not a file",
            arg
        )));
    }

    match arg.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if TABLE_EXTENSIONS.contains(&ext) => (),
        _ => {
            return Err(CliError::InvalidInput(format!(
                "ERROR: file {:?} is not a table ({})",
                arg,
                TABLE_EXTENSIONS.join(", ")
            )))
        }
    }

    match std::fs::metadata(arg) {
        Ok(metadata) if metadata.len() == 0 => Err(CliError::InvalidInput(format!(
            "ERROR: file {:?} is empty",
            arg
        ))),
        Ok(_) => Ok(()),
        Err(e) => Err(CliError::IoError(e)),
    }
}

/// tab-separated for .tsv/.codon/.txt tables, comma-separated otherwise
pub fn delimiter_of<P: AsRef<Path>>(path: P) -> u8 {
    match path.as_ref().extension().and_then(|ext| ext.to_str()) {
        Some("tsv") | Some("codon") | Some("txt") => b'\t',
        _ => b',',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct Dummy {
        inputs: Vec<PathBuf>,
        optional: Vec<PathBuf>,
    }

    impl ArgCheck for Dummy {
        fn get_inputs(&self) -> &Vec<PathBuf> {
            &self.inputs
        }

        fn get_optional(&self) -> Option<&Vec<PathBuf>> {
            Some(&self.optional)
        }
    }

    #[test]
    fn test_validate_accepts_non_empty_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "start,end,color,region_name").unwrap();

        assert!(validate(&file.path().to_path_buf()).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_and_foreign_files() {
        let empty = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        assert!(matches!(
            validate(&empty.path().to_path_buf()),
            Err(CliError::InvalidInput(_))
        ));

        let mut bed = tempfile::Builder::new().suffix(".bed").tempfile().unwrap();
        writeln!(bed, "chr1\t0\t10").unwrap();
        assert!(validate(&bed.path().to_path_buf()).is_err());

        assert!(validate(&PathBuf::from("/definitely/not/here.csv")).is_err());
    }

    #[test]
    fn test_arg_check_requires_inputs() {
        let args = Dummy {
            inputs: Vec::new(),
            optional: Vec::new(),
        };
        assert!(args.check().is_err());

        let mut file = tempfile::Builder::new().suffix(".codon").tempfile().unwrap();
        writeln!(file, "POSITION\tAA").unwrap();
        let args = Dummy {
            inputs: vec![file.path().to_path_buf()],
            optional: Vec::new(),
        };
        assert!(args.check().is_ok());
    }

    #[test]
    fn test_delimiter_of() {
        assert_eq!(delimiter_of("a.csv"), b',');
        assert_eq!(delimiter_of("a.codon"), b'\t');
        assert_eq!(delimiter_of("a.tsv"), b'\t');
        assert_eq!(delimiter_of("a"), b',');
    }
}
