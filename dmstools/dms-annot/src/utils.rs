use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use config::delimiter_of;

use crate::core::{LabelThreshold, Region, RegionSet, Segment};
use crate::window::Window;

/// One row of a region table: `start,end,color,region_name`
#[derive(Debug, Clone, Deserialize)]
struct RegionRecord {
    start: u64,
    end: u64,
    color: String,
    region_name: String,
}

/// Parses region rows in file order; identifiers are assigned by
/// [`RegionSet::new`].
pub fn parse_regions<R: Read>(reader: R, delimiter: u8) -> Result<Vec<Region>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    rdr.deserialize::<RegionRecord>()
        .enumerate()
        .map(|(idx, record)| {
            let record = record.with_context(|| format!("ERROR: bad region row {}", idx + 1))?;
            Ok(Region::new(
                idx,
                record.start,
                record.end,
                record.color,
                record.region_name,
            ))
        })
        .collect()
}

/// Reads one or more region tables, concatenated in the given order.
pub fn read_regions<P: AsRef<Path>>(paths: &[P]) -> Result<RegionSet> {
    let mut regions = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("ERROR: cannot open region table {}", path.display()))?;
        let rows = parse_regions(file, delimiter_of(path))
            .with_context(|| format!("ERROR: cannot parse region table {}", path.display()))?;
        regions.extend(rows);
    }

    let set = RegionSet::new(regions)?;
    log::info!("Regions loaded: {}", set.len());

    Ok(set)
}

/// Layout outcome for one row: segments, or the reason there are none
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowLayout {
    pub window: Window,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<Segment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RowLayout {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs the engine over every row; a failing row does not stop the others.
pub fn layout_rows(
    regions: &RegionSet,
    windows: &[Window],
    threshold: LabelThreshold,
) -> Vec<RowLayout> {
    windows
        .iter()
        .map(
            |window| match regions.layout(window.start, window.end, threshold) {
                Ok(segments) => RowLayout {
                    window: *window,
                    segments: Some(segments),
                    error: None,
                },
                Err(e) => {
                    log::warn!(
                        "Row {} [{}, {}] left unannotated: {}",
                        window.index,
                        window.start,
                        window.end,
                        e
                    );
                    RowLayout {
                        window: *window,
                        segments: None,
                        error: Some(e.to_string()),
                    }
                }
            },
        )
        .collect()
}

/// Writes the per-row layout as pretty JSON to `output`, or stdout.
pub fn write_layouts(rows: &[RowLayout], output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("ERROR: cannot create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, rows)?;
            writeln!(writer)?;
            writer.flush()?;
            log::info!("Layout written to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, rows)?;
            writeln!(handle)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::paginate;
    use std::io::Write;

    const TABLE: &str = "start,end,color,region_name
1,64,#8dd3c7,E3
65,79,#ffffb3,N link
80,198,#bebada,A domain
199,236,#fb8072,Arch 1
";

    #[test]
    fn test_parse_regions_from_csv() {
        let regions = parse_regions(TABLE.as_bytes(), b',').unwrap();

        assert_eq!(regions.len(), 4);
        assert_eq!(regions[1].label, "N link");
        assert_eq!(regions[1].color, "#ffffb3");
        assert_eq!((regions[3].start, regions[3].end), (199, 236));
    }

    #[test]
    fn test_read_regions_from_tempfiles() {
        let mut first = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(first, "{}", TABLE).unwrap();

        let mut second = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        write!(
            second,
            "start\tend\tcolor\tregion_name\n237\t295\t#80b1d3\tB domain\n"
        )
        .unwrap();

        let set = read_regions(&[first.path(), second.path()]).unwrap();
        assert_eq!(set.len(), 5);
        assert_eq!(set.span(), (1, 295));
        assert_eq!(set.get(4).map(|r| r.label.as_str()), Some("B domain"));
    }

    #[test]
    fn test_read_regions_rejects_unsorted_tables() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "start,end,color,region_name\n20,30,red,B\n1,10,blue,A\n").unwrap();

        assert!(read_regions(&[file.path()]).is_err());
    }

    #[test]
    fn test_layout_rows_keeps_going_after_failure() {
        let regions = RegionSet::new(parse_regions(TABLE.as_bytes(), b',').unwrap()).unwrap();
        let windows = paginate(9, 250, 100).unwrap();

        let rows = layout_rows(&regions, &windows, LabelThreshold::default());

        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_ok());
        assert_eq!(rows[0].segments.as_ref().map(|s| s.len()), Some(3));
        assert!(rows[1].is_ok());
        assert!(!rows[2].is_ok());
        assert!(rows[2].segments.is_none());
        assert!(rows[2]
            .error
            .as_ref()
            .is_some_and(|e| e.contains("position 250")));
    }

    #[test]
    fn test_write_layouts_json() {
        let regions = RegionSet::new(parse_regions(TABLE.as_bytes(), b',').unwrap()).unwrap();
        let windows = paginate(60, 90, 31).unwrap();
        let rows = layout_rows(&regions, &windows, LabelThreshold::Exclusive(5));

        let out = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let path = out.path().to_path_buf();
        write_layouts(&rows, Some(&path)).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let segments = json[0]["segments"].as_array().unwrap();

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0]["draw_start"], 60);
        assert_eq!(segments[0]["draw_end"], 64);
        assert_eq!(segments[0]["label_eligible"], false);
        assert_eq!(segments[1]["region_identifier"], 1);
        assert_eq!(segments[1]["label_eligible"], true);
        assert!(json[0].get("error").is_none());
    }
}
