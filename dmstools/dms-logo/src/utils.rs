use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use config::{delimiter_of, STOP_RESIDUE};

/// One codon variant call; extra columns in the table are ignored
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct CodonRecord {
    pub position: u64,
    pub ref_codon: String,
    pub codon: String,
    pub ref_aa: String,
    pub aa: String,
    pub cnt: u64,
    pub denom: u64,
    pub fwd_mean_min_qual: f64,
    pub rev_mean_min_qual: f64,
}

impl CodonRecord {
    pub fn mean_quality(&self) -> f64 {
        (self.fwd_mean_min_qual + self.rev_mean_min_qual) / 2.0
    }

    pub fn is_synonymous(&self) -> bool {
        self.ref_aa == self.aa
    }

    /// number of nucleotides that differ from the reference codon
    pub fn nt_changes(&self) -> usize {
        self.ref_codon
            .bytes()
            .zip(self.codon.bytes())
            .filter(|(r, c)| !r.eq_ignore_ascii_case(c))
            .count()
    }

    pub fn mutation_class(&self) -> MutationClass {
        if self.aa == STOP_RESIDUE {
            MutationClass::Stop
        } else if self.is_synonymous() {
            MutationClass::Synonymous
        } else {
            MutationClass::Nonsynonymous
        }
    }
}

/// Effect of a codon change on the encoded residue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationClass {
    Synonymous,
    Nonsynonymous,
    Stop,
}

impl MutationClass {
    pub const ALL: [MutationClass; 3] = [
        MutationClass::Synonymous,
        MutationClass::Nonsynonymous,
        MutationClass::Stop,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MutationClass::Synonymous => "synonymous",
            MutationClass::Nonsynonymous => "nonsynonymous",
            MutationClass::Stop => "stop",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            MutationClass::Synonymous => "blue",
            MutationClass::Nonsynonymous => "green",
            MutationClass::Stop => "gold",
        }
    }
}

/// Precomputed logo cell: `POSITION,AA,MERGE_FRAC`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct MergeRecord {
    pub position: u64,
    pub aa: String,
    pub merge_frac: f64,
}

/// Inclusive codon range; `0-0` keeps everything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodonRange {
    pub start: u64,
    pub end: u64,
}

impl CodonRange {
    pub fn parse(range: &str) -> Result<Self> {
        let (start, end) = range
            .split_once('-')
            .with_context(|| format!("ERROR: codon range '{}' is not <start>-<end>", range))?;

        let start = start
            .trim()
            .parse::<u64>()
            .with_context(|| format!("ERROR: bad range start in '{}'", range))?;
        let end = end
            .trim()
            .parse::<u64>()
            .with_context(|| format!("ERROR: bad range end in '{}'", range))?;

        if start > end {
            bail!("ERROR: codon range '{}' starts after it ends", range);
        }

        Ok(Self { start, end })
    }

    pub fn is_all(&self) -> bool {
        self.start == 0 && self.end == 0
    }

    pub fn contains(&self, position: u64) -> bool {
        self.is_all() || (self.start <= position && position <= self.end)
    }
}

fn parse_table<T: DeserializeOwned, R: Read>(reader: R, delimiter: u8) -> Result<Vec<T>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    rdr.deserialize::<T>()
        .enumerate()
        .map(|(idx, row)| row.with_context(|| format!("ERROR: bad row {}", idx + 1)))
        .collect()
}

fn read_table<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Vec<T>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("ERROR: cannot open {}", path.display()))?;

    parse_table(file, delimiter_of(path))
        .with_context(|| format!("ERROR: cannot parse {}", path.display()))
}

pub fn parse_codon_table<R: Read>(reader: R, delimiter: u8) -> Result<Vec<CodonRecord>> {
    parse_table(reader, delimiter)
}

pub fn read_codon_table<P: AsRef<Path>>(path: P) -> Result<Vec<CodonRecord>> {
    read_table(path)
}

pub fn parse_merge_table<R: Read>(reader: R, delimiter: u8) -> Result<Vec<MergeRecord>> {
    parse_table(reader, delimiter)
}

pub fn read_merge_table<P: AsRef<Path>>(path: P) -> Result<Vec<MergeRecord>> {
    read_table(path)
}

/// Keeps mutated codons passing the quality, count and range filters.
pub fn filter_records(
    records: Vec<CodonRecord>,
    min_quality: f64,
    min_count: u64,
    range: &CodonRange,
) -> Vec<CodonRecord> {
    let total = records.len();
    let kept = records
        .into_iter()
        .filter(|record| record.mean_quality() >= min_quality)
        .filter(|record| record.cnt >= min_count)
        .filter(|record| record.ref_codon != record.codon)
        .filter(|record| range.contains(record.position))
        .collect::<Vec<_>>();

    log::info!("Records kept after filtering: {}/{}", kept.len(), total);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODONS: &str = "POSITION\tREF_CODON\tCODON\tREF_AA\tAA\tCNT\tDENOM\tFWD_MEAN_MIN_QUAL\tREV_MEAN_MIN_QUAL\tFWD_CNT
10\tGAC\tGAC\tD\tD\t9000\t10000\t36.0\t35.0\t4500
10\tGAC\tGAA\tD\tE\t400\t10000\t30.0\t30.0\t200
10\tGAC\tTAA\tD\t.\t150\t10000\t30.0\t28.0\t75
10\tGAC\tGAT\tD\tD\t120\t10000\t20.0\t20.0\t60
11\tGTA\tGCA\tV\tA\t50\t8000\t34.0\t34.0\t25
12\tGAA\tGAG\tE\tE\t300\t6000\t33.0\t31.0\t150
";

    #[test]
    fn test_parse_codon_table_ignores_extra_columns() {
        let records = parse_codon_table(CODONS.as_bytes(), b'\t').unwrap();

        assert_eq!(records.len(), 6);
        assert_eq!(records[1].aa, "E");
        assert_eq!(records[1].cnt, 400);
        assert_eq!(records[2].mean_quality(), 29.0);
        assert!(records[0].is_synonymous());
    }

    #[test]
    fn test_nt_changes_and_mutation_class() {
        let records = parse_codon_table(CODONS.as_bytes(), b'\t').unwrap();

        assert_eq!(records[0].nt_changes(), 0);
        assert_eq!(records[1].nt_changes(), 1);
        assert_eq!(records[2].nt_changes(), 2);
        assert_eq!(records[4].nt_changes(), 1);

        assert_eq!(records[1].mutation_class(), MutationClass::Nonsynonymous);
        assert_eq!(records[2].mutation_class(), MutationClass::Stop);
        assert_eq!(records[3].mutation_class(), MutationClass::Synonymous);
    }

    #[test]
    fn test_filter_records() {
        let records = parse_codon_table(CODONS.as_bytes(), b'\t').unwrap();
        let all = CodonRange::parse("0-0").unwrap();

        let kept = filter_records(records.clone(), 24.0, 100, &all);
        let kept = kept
            .iter()
            .map(|r| (r.position, r.codon.as_str()))
            .collect::<Vec<_>>();

        // ref codon, low quality and low count rows are gone
        assert_eq!(kept, vec![(10, "GAA"), (10, "TAA"), (12, "GAG")]);

        let range = CodonRange::parse("11-12").unwrap();
        let kept = filter_records(records, 0.0, 0, &range);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_codon_range_parse() {
        assert_eq!(
            CodonRange::parse(" 7 - 100").unwrap(),
            CodonRange { start: 7, end: 100 }
        );
        assert!(CodonRange::parse("0-0").unwrap().is_all());
        assert!(CodonRange::parse("100-7").is_err());
        assert!(CodonRange::parse("7").is_err());
        assert!(CodonRange::parse("a-b").is_err());
    }

    #[test]
    fn test_read_merge_table_from_tempfile() {
        use std::io::Write;

        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "POSITION,AA,MERGE_FRAC,NOTE\n9,A,0.5,x\n9,G,0.25,y\n10,A,1.0,z\n").unwrap();

        let rows = read_merge_table(file.path()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].merge_frac, 0.25);
        assert_eq!(rows[2].position, 10);
    }
}
