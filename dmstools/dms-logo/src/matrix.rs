//! Per-codon residue matrices feeding the logo plots
//!
//! Rows are codon positions in ascending order, columns are residues in
//! lexicographic order. A cell holds the height of that residue's glyph.

use anyhow::{bail, Result};
use hashbrown::HashMap;

use std::collections::{BTreeMap, BTreeSet};

use config::{STOP_RESIDUE, STOP_RESIDUE_ALIAS};

use crate::utils::{CodonRecord, MergeRecord, MutationClass};

#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyMatrix {
    positions: Vec<u64>,
    residues: Vec<String>,
    values: Vec<Vec<f64>>,
}

/// '.' would render like an I or L, so stops are drawn as 'X'
fn residue_name(aa: &str) -> String {
    if aa == STOP_RESIDUE {
        STOP_RESIDUE_ALIAS.to_string()
    } else {
        aa.to_string()
    }
}

impl FrequencyMatrix {
    /// Mutational frequency per codon: for every residue, the summed variant
    /// counts divided by the mean depth of that codon.
    pub fn from_records(records: &[CodonRecord], non_syn_only: bool, include_stop: bool) -> Self {
        let mut depth: BTreeMap<u64, (u64, usize)> = BTreeMap::new();
        let mut counts: HashMap<(u64, String), u64> = HashMap::new();
        let mut residues = BTreeSet::new();

        for record in records
            .iter()
            .filter(|record| !(non_syn_only && record.is_synonymous()))
        {
            let aa = residue_name(&record.aa);

            let (sum, n) = depth.entry(record.position).or_insert((0, 0));
            *sum += record.denom;
            *n += 1;

            *counts.entry((record.position, aa.clone())).or_insert(0) += record.cnt;
            residues.insert(aa);
        }

        if !include_stop {
            residues.remove(STOP_RESIDUE_ALIAS);
        }

        let residues = residues.into_iter().collect::<Vec<_>>();
        let positions = depth.keys().copied().collect::<Vec<_>>();
        let values = depth
            .iter()
            .map(|(position, (sum, n))| {
                let mean_depth = *sum as f64 / *n as f64;
                residues
                    .iter()
                    .map(|aa| {
                        let count = counts
                            .get(&(*position, aa.clone()))
                            .copied()
                            .unwrap_or(0);
                        if mean_depth > 0.0 {
                            count as f64 / mean_depth
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            positions,
            residues,
            values,
        }
    }

    /// Pivots `POSITION x AA -> MERGE_FRAC`; absent cells are 0.
    pub fn from_merge_table(rows: &[MergeRecord]) -> Result<Self> {
        let mut cells: BTreeMap<u64, HashMap<String, f64>> = BTreeMap::new();
        let mut residues = BTreeSet::new();

        for row in rows {
            let aa = residue_name(&row.aa);
            let column = cells.entry(row.position).or_default();

            if column.insert(aa.clone(), row.merge_frac).is_some() {
                bail!(
                    "ERROR: duplicate entry for residue {} at position {}",
                    aa,
                    row.position
                );
            }
            residues.insert(aa);
        }

        let residues = residues.into_iter().collect::<Vec<_>>();
        let positions = cells.keys().copied().collect::<Vec<_>>();
        let values = cells
            .values()
            .map(|column| {
                residues
                    .iter()
                    .map(|aa| column.get(aa).copied().unwrap_or(0.0))
                    .collect()
            })
            .collect();

        Ok(Self {
            positions,
            residues,
            values,
        })
    }

    pub fn positions(&self) -> &[u64] {
        &self.positions
    }

    pub fn residues(&self) -> &[String] {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn first_position(&self) -> Option<u64> {
        self.positions.first().copied()
    }

    pub fn last_position(&self) -> Option<u64> {
        self.positions.last().copied()
    }

    pub fn column(&self, position: u64) -> Option<&[f64]> {
        self.positions
            .binary_search(&position)
            .ok()
            .map(|idx| self.values[idx].as_slice())
    }

    pub fn value(&self, position: u64, residue: &str) -> Option<f64> {
        let col = self.residues.iter().position(|aa| aa == residue)?;
        self.column(position).map(|column| column[col])
    }

    /// positions inside `[start, end]` with their columns
    pub fn rows(&self, start: u64, end: u64) -> impl Iterator<Item = (u64, &[f64])> + '_ {
        let lo = self.positions.partition_point(|&p| p < start);
        let hi = self.positions.partition_point(|&p| p <= end);

        self.positions[lo..hi.max(lo)]
            .iter()
            .copied()
            .zip(self.values[lo..hi.max(lo)].iter().map(|v| v.as_slice()))
    }

    /// tallest stack of positive values over all positions
    pub fn max_stack(&self) -> f64 {
        self.values
            .iter()
            .map(|column| column.iter().filter(|v| **v > 0.0).sum::<f64>())
            .fold(0.0, f64::max)
    }
}

/// Mean depth (`DENOM`) per codon position.
pub fn coverage(records: &[CodonRecord]) -> Vec<(u64, f64)> {
    let mut depth: BTreeMap<u64, (u64, usize)> = BTreeMap::new();

    for record in records {
        let (sum, n) = depth.entry(record.position).or_insert((0, 0));
        *sum += record.denom;
        *n += 1;
    }

    depth
        .into_iter()
        .map(|(position, (sum, n))| (position, sum as f64 / n as f64))
        .collect()
}

/// Per-codon mutational frequency split into named classes.
///
/// Each cell is the summed `CNT` of the class at that codon divided by the
/// mean `DENOM` of every record at that codon.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeFrequencies {
    labels: Vec<&'static str>,
    positions: Vec<u64>,
    values: Vec<Vec<f64>>,
}

impl ChangeFrequencies {
    fn tally<F>(records: &[CodonRecord], labels: Vec<&'static str>, class_of: F) -> Self
    where
        F: Fn(&CodonRecord) -> Option<usize>,
    {
        let mut tallies: BTreeMap<u64, (u64, usize, Vec<u64>)> = BTreeMap::new();

        for record in records {
            let (sum, n, counts) = tallies
                .entry(record.position)
                .or_insert_with(|| (0, 0, vec![0; labels.len()]));
            *sum += record.denom;
            *n += 1;

            if let Some(idx) = class_of(record) {
                counts[idx] += record.cnt;
            }
        }

        let positions = tallies.keys().copied().collect();
        let values = tallies
            .values()
            .map(|(sum, n, counts)| {
                let mean_depth = *sum as f64 / *n as f64;
                counts
                    .iter()
                    .map(|count| {
                        if mean_depth > 0.0 {
                            *count as f64 / mean_depth
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            labels,
            positions,
            values,
        }
    }

    /// One-, two- and three-nucleotide changes plus their sum.
    pub fn by_nt_changes(records: &[CodonRecord]) -> Self {
        let labels = vec!["single nucleotide", "double nucleotide", "triple nucleotide"];
        let mut freqs = Self::tally(records, labels, |record| match record.nt_changes() {
            n @ 1..=3 => Some(n - 1),
            _ => None,
        });

        freqs.labels.push("sum of all nucleotides");
        for column in freqs.values.iter_mut() {
            let total = column.iter().sum();
            column.push(total);
        }

        freqs
    }

    /// Synonymous, nonsynonymous and stop changes.
    pub fn by_mutation_class(records: &[CodonRecord]) -> Self {
        let labels = MutationClass::ALL.iter().map(|class| class.name()).collect();
        Self::tally(records, labels, |record| {
            MutationClass::ALL
                .iter()
                .position(|class| *class == record.mutation_class())
        })
    }

    pub fn labels(&self) -> &[&'static str] {
        &self.labels
    }

    pub fn positions(&self) -> &[u64] {
        &self.positions
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn value(&self, position: u64, label: &str) -> Option<f64> {
        let col = self.labels.iter().position(|l| *l == label)?;
        let row = self.positions.binary_search(&position).ok()?;
        Some(self.values[row][col])
    }

    /// (position, frequency) points of one class
    pub fn series(&self, label: &str) -> Option<Vec<(u64, f64)>> {
        let col = self.labels.iter().position(|l| *l == label)?;
        Some(
            self.positions
                .iter()
                .copied()
                .zip(self.values.iter().map(|column| column[col]))
                .collect(),
        )
    }
}

/// Number of distinct residues observed at every codon
#[derive(Debug, Clone, PartialEq)]
pub struct AaDiversity {
    per_codon: Vec<(u64, usize)>,
}

impl AaDiversity {
    pub fn from_records(records: &[CodonRecord]) -> Self {
        let mut residues: BTreeMap<u64, BTreeSet<&str>> = BTreeMap::new();
        for record in records {
            residues
                .entry(record.position)
                .or_default()
                .insert(record.aa.as_str());
        }

        Self {
            per_codon: residues
                .into_iter()
                .map(|(position, set)| (position, set.len()))
                .collect(),
        }
    }

    pub fn per_codon(&self) -> &[(u64, usize)] {
        &self.per_codon
    }

    pub fn is_empty(&self) -> bool {
        self.per_codon.is_empty()
    }

    pub fn max(&self) -> usize {
        self.per_codon.iter().map(|(_, n)| *n).max().unwrap_or(0)
    }

    pub fn mean(&self) -> f64 {
        if self.per_codon.is_empty() {
            return 0.0;
        }
        let total = self.per_codon.iter().map(|(_, n)| *n).sum::<usize>();
        total as f64 / self.per_codon.len() as f64
    }
}
