use anyhow::{bail, Context, Result};
use dashmap::{DashMap, DashSet};
use rayon::prelude::*;
use svg::Document;

use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use config::{
    get_progress_bar, write_collection, AA_CHANGES_OVERLAY, AA_CHANGES_SUFFIX, AA_DIVERSITY,
    COVERAGE_SUFFIX, LOGO_SUFFIX, NT_CHANGES_SUFFIX, ROW_SUMMARY,
};
use dms_annot::{paginate, read_regions, LabelThreshold, Offsets, RegionSet};

use crate::cli::{Args, Sample};
use crate::matrix::{coverage, AaDiversity, ChangeFrequencies, FrequencyMatrix};
use crate::render::{
    render_coverage, render_logo, render_panels, ChartLayout, LogoOptions, Panel, RowReport,
    Series,
};
use crate::utils::{
    filter_records, read_codon_table, read_merge_table, CodonRange, CodonRecord, MutationClass,
};

const FREQUENCY_LABEL: &str = "Frequency of mutation";
const DIVERSITY_LABEL: &str = "Distinct amino acids";
const DIVERSITY_Y_MAX: f64 = 22.0;

/// Plots every sample in parallel and writes a per-row summary.
///
/// Codon tables also get per-sample mutation-class charts and, once all
/// samples are done, charts comparing them.
pub fn plot_logos(args: Args) -> Result<()> {
    let regions = if args.regions.is_empty() {
        None
    } else {
        Some(read_regions(&args.regions)?)
    };

    let samples = args.resolve_samples()?;
    let range = CodonRange::parse(&args.pos)?;

    create_dir_all(&args.outdir)
        .with_context(|| format!("ERROR: cannot create {}", args.outdir.display()))?;

    let accumulator = ParallelAccumulator::default();
    let pb = get_progress_bar(samples.len() as u64, "Plotting samples...");

    samples
        .par_iter()
        .try_for_each(|sample| -> Result<()> {
            let reports = plot_sample(sample, &args, regions.as_ref(), &range, &accumulator)
                .with_context(|| format!("ERROR: failed to plot sample {}", sample.name))?;

            accumulator.rows.insert(sample.name.clone(), reports);
            pb.inc(1);
            Ok(())
        })?;

    pb.finish_and_clear();

    if !args.merged {
        plot_sample_overlays(&samples, &args.outdir, &accumulator)?;
    }

    let summary = accumulator.summary();
    write_collection(&summary, args.outdir.join(ROW_SUMMARY))?;
    log::info!(
        "Files written: {}, rows plotted: {}",
        accumulator.files.len(),
        summary.len().saturating_sub(1)
    );

    Ok(())
}

fn plot_sample(
    sample: &Sample,
    args: &Args,
    regions: Option<&RegionSet>,
    range: &CodonRange,
    accumulator: &ParallelAccumulator,
) -> Result<Vec<RowReport>> {
    let name = sample.name.as_str();
    log::info!("Plotting {} from {}", name, sample.path.display());

    let (matrix, title) = if args.merged {
        let rows = read_merge_table(&sample.path)?;
        let rows = rows
            .into_iter()
            .filter(|row| range.contains(row.position))
            .collect::<Vec<_>>();
        (FrequencyMatrix::from_merge_table(&rows)?, name.to_string())
    } else {
        let records = filter_records(
            read_codon_table(&sample.path)?,
            args.qual,
            args.counts,
            range,
        );
        plot_codon_charts(sample, &records, &args.outdir, accumulator)?;

        let kind = if args.non_syn_only {
            "Nonsynonymous"
        } else {
            "All"
        };
        (
            FrequencyMatrix::from_records(&records, args.non_syn_only, args.include_stop),
            format!("{} mutations for {} library", kind, name),
        )
    };

    let last = match matrix.last_position() {
        Some(last) => last,
        None => bail!("ERROR: no codon positions left to plot for {}", name),
    };
    if args.first > last {
        bail!(
            "ERROR: --first {} is past the last plotted codon {} of {}",
            args.first,
            last,
            name
        );
    }
    let windows = paginate(args.first, last, args.width)
        .with_context(|| format!("ERROR: cannot page [{}, {}]", args.first, last))?;

    let options = LogoOptions {
        title,
        y_max: args.y_max,
        offsets: Offsets::default(),
        threshold: LabelThreshold::new(args.min_label, args.inclusive),
        on_missing: args.on_missing,
        ..LogoOptions::default()
    };

    let (document, reports) = render_logo(&matrix, &windows, regions, &options)?;
    save(
        &document,
        output_path(&args.outdir, name, LOGO_SUFFIX),
        accumulator,
    )?;

    Ok(reports)
}

/// Depth, nucleotide-change and mutation-class charts of one codon table.
fn plot_codon_charts(
    sample: &Sample,
    records: &[CodonRecord],
    outdir: &Path,
    accumulator: &ParallelAccumulator,
) -> Result<()> {
    if records.is_empty() {
        return Ok(());
    }
    let name = sample.name.as_str();

    let depth = coverage(records);
    let document = render_coverage(&format!("Depth per codon in {} sample", name), &depth)?;
    save(
        &document,
        output_path(outdir, name, COVERAGE_SUFFIX),
        accumulator,
    )?;

    let nt_changes = ChangeFrequencies::by_nt_changes(records);
    let panels = nt_changes
        .labels()
        .iter()
        .map(|label| Panel {
            title: label.to_string(),
            y_label: FREQUENCY_LABEL.to_string(),
            y_max: None,
            series: vec![Series::new(
                name,
                &sample.color,
                nt_changes.series(label).unwrap_or_default(),
            )],
        })
        .collect::<Vec<_>>();
    let document = render_panels(
        &format!("Frequency of nucleotide changes per codon in {} sample", name),
        &panels,
        ChartLayout::GRID,
    )?;
    save(
        &document,
        output_path(outdir, name, NT_CHANGES_SUFFIX),
        accumulator,
    )?;

    let classes = ChangeFrequencies::by_mutation_class(records);
    let class_series = MutationClass::ALL
        .iter()
        .map(|class| {
            Series::new(
                class.name(),
                class.color(),
                classes.series(class.name()).unwrap_or_default(),
            )
        })
        .collect::<Vec<_>>();
    let mut panels = class_series
        .iter()
        .map(|series| Panel {
            title: series.label.clone(),
            y_label: FREQUENCY_LABEL.to_string(),
            y_max: None,
            series: vec![series.clone()],
        })
        .collect::<Vec<_>>();
    panels.push(Panel {
        title: "overlay".to_string(),
        y_label: FREQUENCY_LABEL.to_string(),
        y_max: None,
        series: class_series,
    });
    let document = render_panels(
        &format!("Frequency of mutational changes per codon in {} sample", name),
        &panels,
        ChartLayout::GRID,
    )?;
    save(
        &document,
        output_path(outdir, name, AA_CHANGES_SUFFIX),
        accumulator,
    )?;

    accumulator.profiles.insert(
        sample.name.clone(),
        SampleProfile {
            classes,
            diversity: AaDiversity::from_records(records),
        },
    );

    Ok(())
}

/// Mutation classes and amino acid diversity of all samples, one line each.
fn plot_sample_overlays(
    samples: &[Sample],
    outdir: &Path,
    accumulator: &ParallelAccumulator,
) -> Result<()> {
    let profiles = samples
        .iter()
        .filter_map(|sample| {
            accumulator
                .profiles
                .get(&sample.name)
                .map(|profile| (sample, profile.value().clone()))
        })
        .collect::<Vec<_>>();

    if profiles.is_empty() {
        log::warn!("No codon records left to compare across samples. Skipping...");
        return Ok(());
    }

    let panels = MutationClass::ALL
        .iter()
        .map(|class| Panel {
            title: class.name().to_string(),
            y_label: FREQUENCY_LABEL.to_string(),
            y_max: None,
            series: profiles
                .iter()
                .map(|(sample, profile)| {
                    Series::new(
                        &sample.name,
                        &sample.color,
                        profile.classes.series(class.name()).unwrap_or_default(),
                    )
                })
                .collect(),
        })
        .collect::<Vec<_>>();
    let document = render_panels(
        "Frequency of mutational changes per codon",
        &panels,
        ChartLayout::STRIP,
    )?;
    save(&document, outdir.join(AA_CHANGES_OVERLAY), accumulator)?;

    let stats = profiles
        .iter()
        .map(|(sample, profile)| {
            format!(
                "{}: max diversity is {}, mean diversity is {:.2}",
                sample.name,
                profile.diversity.max(),
                profile.diversity.mean()
            )
        })
        .collect::<Vec<_>>();
    for line in &stats {
        log::info!("{}", line);
    }

    let panel = Panel {
        title: stats.join("; "),
        y_label: DIVERSITY_LABEL.to_string(),
        y_max: Some(DIVERSITY_Y_MAX),
        series: profiles
            .iter()
            .map(|(sample, profile)| {
                let points = profile
                    .diversity
                    .per_codon()
                    .iter()
                    .map(|(position, n)| (*position, *n as f64))
                    .collect();
                Series::new(&sample.name, &sample.color, points)
            })
            .collect(),
    };
    let document = render_panels(
        "Amino acid diversity per codon position",
        &[panel],
        ChartLayout::WIDE,
    )?;
    save(&document, outdir.join(AA_DIVERSITY), accumulator)?;

    Ok(())
}

fn save(document: &Document, out: PathBuf, accumulator: &ParallelAccumulator) -> Result<()> {
    svg::save(&out, document).with_context(|| format!("ERROR: cannot write {}", out.display()))?;
    accumulator.files.insert(out);
    Ok(())
}

fn output_path(outdir: &Path, name: &str, suffix: &str) -> PathBuf {
    outdir.join(format!("{}_{}", name, suffix))
}

#[derive(Debug, Clone)]
pub struct SampleProfile {
    pub classes: ChangeFrequencies,
    pub diversity: AaDiversity,
}

pub struct ParallelAccumulator {
    pub rows: DashMap<String, Vec<RowReport>>,
    pub profiles: DashMap<String, SampleProfile>,
    pub files: DashSet<PathBuf>,
}

impl Default for ParallelAccumulator {
    fn default() -> Self {
        Self {
            rows: DashMap::new(),
            profiles: DashMap::new(),
            files: DashSet::new(),
        }
    }
}

impl ParallelAccumulator {
    /// tab-separated summary, header first, samples in name order
    pub fn summary(&self) -> Vec<String> {
        let mut samples = self
            .rows
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect::<Vec<_>>();
        samples.sort_by(|a, b| a.0.cmp(&b.0));

        let mut lines =
            vec!["sample\trow\tstart\tend\tstatus\tsegments\tlabels\treason".to_string()];
        for (sample, reports) in samples {
            for report in reports {
                lines.push(format!(
                    "{}\t{}\t{}\t{}\t{}",
                    sample,
                    report.window.index,
                    report.window.start,
                    report.window.end,
                    report.status
                ));
            }
        }

        lines
    }
}
