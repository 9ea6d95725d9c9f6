//! Annotation layout for banded deep-mutational-scanning plots
//!
//! Multi-row logo plots carry a band of colored bars above every row, one bar
//! per protein region (domain, arch, linker) crossing that row. This crate
//! splits each row window into per-region segments, decides which segments
//! are long enough to host a centered caption, and hands the result to a
//! rendering backend through the [`draw::Canvas`] trait.
//!
//! Run as a tool, `dms-annot` pages a codon range into rows and writes the
//! per-row layout as JSON:
//!
//! ```shell
//! dms-annot --regions domains.csv --first 9 --width 42 --output layout.json
//! ```

use anyhow::Result;
use config::ArgCheck;

pub mod cli;
pub mod core;
pub mod draw;
pub mod utils;
pub mod window;

pub use crate::core::{
    layout, layout_with, region_at, LabelThreshold, LayoutError, Region, RegionSet, Segment,
};
pub use crate::draw::{annotate, Canvas, Offsets};
pub use crate::utils::{layout_rows, read_regions, write_layouts, RowLayout};
pub use crate::window::{paginate, Window};

use cli::Args;

pub fn lib_dms_annot(args: Vec<String>) -> Result<()> {
    let args = cli::Args::from(args);
    args.check()?;
    run_layout(args).map(|_| ())
}

/// Loads the regions, pages the requested range and lays out every row.
pub fn run_layout(args: Args) -> Result<Vec<RowLayout>> {
    let regions = read_regions(&args.regions)?;
    let (span_start, span_end) = regions.span();

    let first = args.first.unwrap_or(span_start);
    let last = args.last.unwrap_or(span_end);
    let windows = paginate(first, last, args.width)?;
    log::info!(
        "Paging [{}, {}] into {} rows of {} codons",
        first,
        last,
        windows.len(),
        args.width
    );

    let threshold = LabelThreshold::new(args.min_label, args.inclusive);
    let rows = layout_rows(&regions, &windows, threshold);

    let failed = rows.iter().filter(|row| !row.is_ok()).count();
    if failed > 0 {
        log::warn!("{} of {} rows could not be annotated", failed, rows.len());
    }

    write_layouts(&rows, args.output.as_ref())?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_run_layout_with_tempfile() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(
            file,
            "start,end,color,region_name\n1,64,#8dd3c7,E3\n65,79,#ffffb3,N link\n80,198,#bebada,A domain\n"
        )
        .unwrap();
        let out = tempfile::Builder::new().suffix(".json").tempfile().unwrap();

        let args = Args {
            regions: vec![file.path().to_path_buf()],
            first: Some(9),
            last: None,
            width: 42,
            min_label: 7,
            inclusive: false,
            output: Some(out.path().to_path_buf()),
        };

        let rows = run_layout(args).unwrap();
        let bounds = rows
            .iter()
            .map(|row| (row.window.start, row.window.end))
            .collect::<Vec<_>>();

        assert_eq!(bounds, vec![(9, 50), (51, 92), (93, 134), (135, 176), (177, 198)]);
        assert!(rows.iter().all(|row| row.is_ok()));

        let second = rows[1].segments.as_ref().unwrap();
        assert_eq!(
            second
                .iter()
                .map(|s| (s.draw_start, s.draw_end, s.region_identifier, s.label_eligible))
                .collect::<Vec<_>>(),
            vec![(51, 64, 0, true), (65, 79, 1, true), (80, 92, 2, true)]
        );
        assert!(std::fs::metadata(out.path()).unwrap().len() > 0);
    }
}
