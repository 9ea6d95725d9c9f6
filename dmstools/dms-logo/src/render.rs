//! SVG backend for logo rows, annotation bands and coverage charts.
//!
//! Every row is drawn into its own group: the annotation band on top, the
//! stacked residue glyphs in the middle and the codon axis at the bottom.
//! Codon `p` occupies the cell `[p - 0.5, p + 0.5]` in data coordinates.

use anyhow::{anyhow, bail, Result};
use svg::node::element::{Group, Line, Polyline, Rectangle, Text};
use svg::{Document, Node};

use dms_annot::{annotate, Canvas, LabelThreshold, Offsets, RegionSet, Window};

use crate::cli::MissingPolicy;
use crate::matrix::FrequencyMatrix;

const MARGIN_LEFT: f64 = 56.0;
const MARGIN_RIGHT: f64 = 24.0;
const TITLE_HEIGHT: f64 = 36.0;
const BAND_HEIGHT: f64 = 14.0;
const BAND_GAP: f64 = 6.0;
const AXIS_HEIGHT: f64 = 28.0;
const GLYPH_EM: f64 = 100.0;
// monospace advance and cap height as a fraction of the em box
const GLYPH_ADVANCE: f64 = 0.6;
const GLYPH_CAP: f64 = 0.72;
const TICK_EVERY: u64 = 5;


#[derive(Debug, Clone)]
pub struct LogoOptions {
    pub title: String,
    pub codon_width: f64,
    pub logo_height: f64,
    pub y_max: Option<f64>,
    pub offsets: Offsets,
    pub threshold: LabelThreshold,
    pub on_missing: MissingPolicy,
}

impl Default for LogoOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            codon_width: 14.0,
            logo_height: 120.0,
            y_max: None,
            offsets: Offsets::default(),
            threshold: LabelThreshold::default(),
            on_missing: MissingPolicy::Skip,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowStatus {
    Annotated { segments: usize, labels: usize },
    Unannotated(String),
    NoRegions,
}

impl std::fmt::Display for RowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowStatus::Annotated { segments, labels } => {
                write!(f, "annotated\t{}\t{}\t", segments, labels)
            }
            RowStatus::Unannotated(reason) => write!(f, "unannotated\t0\t0\t{}", reason),
            RowStatus::NoRegions => write!(f, "no-regions\t0\t0\t"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowReport {
    pub window: Window,
    pub status: RowStatus,
}

/// Canvas drawing one plot row into an SVG group
pub struct SvgCanvas {
    group: Group,
    row_start: u64,
    x0: f64,
    codon_width: f64,
}

impl SvgCanvas {
    pub fn new(row_start: u64, x0: f64, codon_width: f64) -> Self {
        Self {
            group: Group::new(),
            row_start,
            x0,
            codon_width,
        }
    }

    /// data coordinate to pixels; the row's first cell starts at `x0`
    pub fn to_px(&self, x: f64) -> f64 {
        self.x0 + (x - (self.row_start as f64 - 0.5)) * self.codon_width
    }

    fn push<T: Into<Box<dyn Node>>>(&mut self, node: T) {
        let group = std::mem::replace(&mut self.group, Group::new());
        self.group = group.add(node);
    }

    /// Stacks the positive cells of one codon, smallest at the bottom.
    pub fn draw_stack(
        &mut self,
        position: u64,
        column: &[f64],
        residues: &[String],
        baseline: f64,
        px_per_unit: f64,
    ) {
        let mut cells = column
            .iter()
            .zip(residues.iter())
            .filter(|(value, _)| **value > 0.0)
            .collect::<Vec<_>>();
        cells.sort_by(|a, b| a.0.total_cmp(b.0));

        let x_left = self.to_px(position as f64 - 0.5);
        let sx = self.codon_width / (GLYPH_ADVANCE * GLYPH_EM);
        let mut y_bottom = baseline;

        for (value, residue) in cells {
            let height = value * px_per_unit;
            let sy = height / (GLYPH_CAP * GLYPH_EM);

            self.push(
                Text::new(residue.clone())
                    .set("x", 0)
                    .set("y", 0)
                    .set("font-family", "monospace")
                    .set("font-weight", "bold")
                    .set("font-size", GLYPH_EM)
                    .set("fill", residue_color(residue))
                    .set(
                        "transform",
                        format!(
                            "translate({:.3},{:.3}) scale({:.5},{:.5})",
                            x_left, y_bottom, sx, sy
                        ),
                    ),
            );
            y_bottom -= height;
        }
    }

    pub fn draw_axis(&mut self, window: &Window, baseline: f64, logo_height: f64, y_max: f64) {
        let left = self.to_px(window.start as f64 - 0.5);
        let right = self.to_px(window.end as f64 + 0.5);

        self.push(
            Line::new()
                .set("x1", left)
                .set("y1", baseline)
                .set("x2", right)
                .set("y2", baseline)
                .set("stroke", "#000000")
                .set("stroke-width", 1),
        );
        self.push(
            Line::new()
                .set("x1", left)
                .set("y1", baseline)
                .set("x2", left)
                .set("y2", baseline - logo_height)
                .set("stroke", "#000000")
                .set("stroke-width", 1),
        );

        for (value, y) in [(0.0, baseline), (y_max, baseline - logo_height)] {
            self.push(
                Text::new(format!("{:.2}", value))
                    .set("x", left - 4.0)
                    .set("y", y + 3.0)
                    .set("text-anchor", "end")
                    .set("font-family", "monospace")
                    .set("font-size", 9)
                    .set("fill", "#111111"),
            );
        }

        for position in window.start..=window.end {
            if position != window.start && position % TICK_EVERY != 0 {
                continue;
            }
            let x = self.to_px(position as f64);
            self.push(
                Line::new()
                    .set("x1", x)
                    .set("y1", baseline)
                    .set("x2", x)
                    .set("y2", baseline + 4.0)
                    .set("stroke", "#000000")
                    .set("stroke-width", 1),
            );
            self.push(
                Text::new(position.to_string())
                    .set("x", x)
                    .set("y", baseline + 14.0)
                    .set("text-anchor", "middle")
                    .set("font-family", "monospace")
                    .set("font-size", 9)
                    .set("fill", "#111111"),
            );
        }
    }

    pub fn into_group(self) -> Group {
        self.group
    }
}

impl Canvas for SvgCanvas {
    fn draw_bar(&mut self, x_start: f64, x_end: f64, y: f64, color: &str) {
        let (x1, x2) = (self.to_px(x_start), self.to_px(x_end));
        self.push(
            Rectangle::new()
                .set("x", x1)
                .set("y", y - BAND_HEIGHT / 2.0)
                .set("width", (x2 - x1).max(0.0))
                .set("height", BAND_HEIGHT)
                .set("fill", color.to_string())
                .set("fill-opacity", 0.5),
        );
    }

    fn draw_text(&mut self, x_center: f64, y: f64, label: &str) {
        self.push(
            Text::new(label.to_string())
                .set("x", self.to_px(x_center))
                .set("y", y + 4.0)
                .set("text-anchor", "middle")
                .set("font-family", "sans-serif")
                .set("font-size", 10)
                .set("fill", "#111111"),
        );
    }
}

/// Residue colors grouped by side-chain chemistry
pub fn residue_color(residue: &str) -> &'static str {
    match residue {
        "D" | "E" => "#d62728",
        "K" | "R" | "H" => "#1f77b4",
        "S" | "T" | "N" | "Q" => "#2ca02c",
        "A" | "V" | "L" | "I" | "M" => "#333333",
        "F" | "W" | "Y" => "#9467bd",
        "G" | "P" => "#ff7f0e",
        "C" => "#bcbd22",
        "X" => "#7f7f7f",
        _ => "#000000",
    }
}

/// Renders a paginated logo plot, one group per window.
///
/// Annotation failures follow `options.on_missing`: `Skip` leaves the row
/// without a band, `Abort` fails the whole plot.
pub fn render_logo(
    matrix: &FrequencyMatrix,
    windows: &[Window],
    regions: Option<&RegionSet>,
    options: &LogoOptions,
) -> Result<(Document, Vec<RowReport>)> {
    if windows.is_empty() {
        bail!("ERROR: nothing to plot, no rows were paged");
    }

    let widest = windows.iter().map(|w| w.len()).max().unwrap_or(1) as f64;
    let row_height = BAND_HEIGHT + BAND_GAP + options.logo_height + AXIS_HEIGHT;
    let width = MARGIN_LEFT + widest * options.codon_width + MARGIN_RIGHT;
    let height = TITLE_HEIGHT + windows.len() as f64 * row_height;
    let y_max = options
        .y_max
        .unwrap_or_else(|| matrix.max_stack())
        .max(f64::EPSILON);

    let mut document = Document::new()
        .set("viewBox", (0, 0, width, height))
        .set("width", width)
        .set("height", height)
        .add(
            Rectangle::new()
                .set("x", 0)
                .set("y", 0)
                .set("width", width)
                .set("height", height)
                .set("fill", "#ffffff"),
        )
        .add(
            Text::new(options.title.clone())
                .set("x", width / 2.0)
                .set("y", TITLE_HEIGHT * 0.66)
                .set("text-anchor", "middle")
                .set("font-family", "sans-serif")
                .set("font-size", 15)
                .set("fill", "#111111"),
        );

    let mut reports = Vec::with_capacity(windows.len());

    for (i, window) in windows.iter().enumerate() {
        let top = TITLE_HEIGHT + i as f64 * row_height;
        let baseline = top + BAND_HEIGHT + BAND_GAP + options.logo_height;
        let mut canvas = SvgCanvas::new(window.start, MARGIN_LEFT, options.codon_width);

        let status = match regions {
            None => RowStatus::NoRegions,
            Some(set) => match set.layout(window.start, window.end, options.threshold) {
                Ok(segments) => {
                    let labels = annotate(
                        &mut canvas,
                        set.regions(),
                        &segments,
                        top + BAND_HEIGHT / 2.0,
                        options.offsets,
                    )?;
                    RowStatus::Annotated {
                        segments: segments.len(),
                        labels,
                    }
                }
                Err(e) => match options.on_missing {
                    MissingPolicy::Abort => {
                        return Err(anyhow!(e).context(format!(
                            "ERROR: cannot annotate row {} [{}, {}]",
                            window.index, window.start, window.end
                        )));
                    }
                    MissingPolicy::Skip => {
                        log::warn!(
                            "Row {} [{}, {}] left unannotated: {}",
                            window.index,
                            window.start,
                            window.end,
                            e
                        );
                        RowStatus::Unannotated(e.to_string())
                    }
                },
            },
        };

        let px_per_unit = options.logo_height / y_max;
        for (position, column) in matrix.rows(window.start, window.end) {
            canvas.draw_stack(position, column, matrix.residues(), baseline, px_per_unit);
        }
        canvas.draw_axis(window, baseline, options.logo_height, y_max);

        document = document.add(canvas.into_group());
        reports.push(RowReport {
            window: *window,
            status,
        });
    }

    Ok((document, reports))
}

/// One line in a chart panel
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub color: String,
    pub points: Vec<(u64, f64)>,
}

impl Series {
    pub fn new(label: &str, color: &str, points: Vec<(u64, f64)>) -> Self {
        Self {
            label: label.to_string(),
            color: color.to_string(),
            points,
        }
    }
}

/// A framed line plot; the y axis starts at 0 and ends at `y_max` or the
/// tallest point
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub y_label: String,
    pub y_max: Option<f64>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartLayout {
    pub columns: usize,
    pub panel_width: f64,
    pub panel_height: f64,
}

impl ChartLayout {
    pub const SINGLE: ChartLayout = ChartLayout {
        columns: 1,
        panel_width: 800.0,
        panel_height: 300.0,
    };
    pub const WIDE: ChartLayout = ChartLayout {
        columns: 1,
        panel_width: 1000.0,
        panel_height: 360.0,
    };
    pub const GRID: ChartLayout = ChartLayout {
        columns: 2,
        panel_width: 420.0,
        panel_height: 260.0,
    };
    pub const STRIP: ChartLayout = ChartLayout {
        columns: 3,
        panel_width: 340.0,
        panel_height: 260.0,
    };
}

fn tick_label(value: f64) -> String {
    if value >= 100.0 {
        format!("{:.0}", value)
    } else if value >= 1.0 {
        format!("{:.1}", value)
    } else {
        format!("{:.3}", value)
    }
}

fn chart_text(text: String, x: f64, y: f64, anchor: &str, size: u32) -> Text {
    Text::new(text)
        .set("x", x)
        .set("y", y)
        .set("text-anchor", anchor.to_string())
        .set("font-family", "sans-serif")
        .set("font-size", size)
        .set("fill", "#111111")
}

fn chart_line(x1: f64, y1: f64, x2: f64, y2: f64) -> Line {
    Line::new()
        .set("x1", x1)
        .set("y1", y1)
        .set("x2", x2)
        .set("y2", y2)
        .set("stroke", "#000000")
        .set("stroke-width", 1)
}

fn draw_panel(panel: &Panel, ox: f64, oy: f64, layout: &ChartLayout) -> Group {
    let left = ox + MARGIN_LEFT + 8.0;
    let right = ox + layout.panel_width - MARGIN_RIGHT;
    let top = oy + 28.0;
    let bottom = oy + layout.panel_height - AXIS_HEIGHT - 12.0;

    let points = panel.series.iter().flat_map(|series| series.points.iter());
    let first = points.clone().map(|(p, _)| *p).min().unwrap_or(0);
    let last = points.clone().map(|(p, _)| *p).max().unwrap_or(first);
    let y_max = panel
        .y_max
        .unwrap_or_else(|| points.map(|(_, v)| *v).fold(0.0, f64::max))
        .max(f64::EPSILON);
    let span = (last - first).max(1) as f64;

    let mut group = Group::new()
        .add(chart_text(
            panel.title.clone(),
            (left + right) / 2.0,
            oy + 18.0,
            "middle",
            12,
        ))
        .add(chart_line(left, bottom, right, bottom))
        .add(chart_line(left, bottom, left, top))
        .add(chart_text(first.to_string(), left, bottom + 14.0, "middle", 10))
        .add(chart_text(last.to_string(), right, bottom + 14.0, "middle", 10))
        .add(chart_text(tick_label(y_max), left - 4.0, top + 4.0, "end", 10))
        .add(chart_text("0".to_string(), left - 4.0, bottom + 4.0, "end", 10))
        .add(chart_text(
            "Codon position".to_string(),
            (left + right) / 2.0,
            oy + layout.panel_height - 8.0,
            "middle",
            10,
        ))
        .add(
            chart_text(
                panel.y_label.clone(),
                ox + 14.0,
                (top + bottom) / 2.0,
                "middle",
                10,
            )
            .set(
                "transform",
                format!("rotate(-90 {:.2} {:.2})", ox + 14.0, (top + bottom) / 2.0),
            ),
        );

    for series in panel.series.iter().filter(|s| !s.points.is_empty()) {
        let coords = series
            .points
            .iter()
            .map(|(position, value)| {
                let x = left + (*position - first) as f64 / span * (right - left);
                let y = bottom - value.min(y_max) / y_max * (bottom - top);
                format!("{:.2},{:.2}", x, y)
            })
            .collect::<Vec<_>>()
            .join(" ");

        group = group.add(
            Polyline::new()
                .set("points", coords)
                .set("fill", "none")
                .set("stroke", series.color.clone())
                .set("stroke-opacity", 0.8)
                .set("stroke-width", 1),
        );
    }

    if panel.series.len() > 1 {
        for (i, series) in panel.series.iter().enumerate() {
            let y = top + 10.0 + i as f64 * 14.0;
            group = group
                .add(
                    Line::new()
                        .set("x1", right - 110.0)
                        .set("y1", y - 3.0)
                        .set("x2", right - 94.0)
                        .set("y2", y - 3.0)
                        .set("stroke", series.color.clone())
                        .set("stroke-width", 4),
                )
                .add(chart_text(series.label.clone(), right - 90.0, y, "start", 10));
        }
    }

    group
}

/// Draws `panels` on a grid, row-major, under a common title.
pub fn render_panels(title: &str, panels: &[Panel], layout: ChartLayout) -> Result<Document> {
    if panels
        .iter()
        .all(|panel| panel.series.iter().all(|s| s.points.is_empty()))
    {
        bail!("ERROR: no points to plot for '{}'", title);
    }

    let columns = layout.columns.max(1);
    let rows = panels.len().div_ceil(columns);
    let width = columns as f64 * layout.panel_width;
    let height = TITLE_HEIGHT + rows as f64 * layout.panel_height;

    let mut document = Document::new()
        .set("viewBox", (0, 0, width, height))
        .set("width", width)
        .set("height", height)
        .add(
            Rectangle::new()
                .set("x", 0)
                .set("y", 0)
                .set("width", width)
                .set("height", height)
                .set("fill", "#ffffff"),
        )
        .add(
            chart_text(title.to_string(), width / 2.0, TITLE_HEIGHT * 0.66, "middle", 14)
                .set("font-weight", "bold"),
        );

    for (i, panel) in panels.iter().enumerate() {
        let ox = (i % columns) as f64 * layout.panel_width;
        let oy = TITLE_HEIGHT + (i / columns) as f64 * layout.panel_height;
        document = document.add(draw_panel(panel, ox, oy, &layout));
    }

    Ok(document)
}

/// Line chart of mean depth per codon.
pub fn render_coverage(title: &str, coverage: &[(u64, f64)]) -> Result<Document> {
    if coverage.is_empty() {
        bail!("ERROR: no coverage to plot");
    }

    let panel = Panel {
        title: String::new(),
        y_label: "Depth (avg reads per codon)".to_string(),
        y_max: None,
        series: vec![Series::new("depth", "#000000", coverage.to_vec())],
    };

    render_panels(title, &[panel], ChartLayout::SINGLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MergeRecord;
    use dms_annot::{paginate, Region};

    fn matrix() -> FrequencyMatrix {
        let rows = (9..=30u64)
            .flat_map(|position| {
                [("A", 0.25), ("G", 0.5)].map(|(aa, frac)| MergeRecord {
                    position,
                    aa: aa.to_string(),
                    merge_frac: frac,
                })
            })
            .collect::<Vec<_>>();
        FrequencyMatrix::from_merge_table(&rows).unwrap()
    }

    fn regions() -> RegionSet {
        RegionSet::new(vec![
            Region::new(0, 1, 15, "#8dd3c7", "E3"),
            Region::new(0, 16, 28, "#bebada", "A domain"),
        ])
        .unwrap()
    }

    #[test]
    fn test_svg_canvas_maps_cells() {
        let canvas = SvgCanvas::new(9, 50.0, 10.0);

        assert_eq!(canvas.to_px(8.5), 50.0);
        assert_eq!(canvas.to_px(9.0), 55.0);
        assert_eq!(canvas.to_px(10.5), 70.0);
    }

    #[test]
    fn test_render_logo_skips_unannotated_rows() {
        let windows = paginate(9, 30, 10).unwrap();
        let (document, reports) =
            render_logo(&matrix(), &windows, Some(&regions()), &LogoOptions::default()).unwrap();

        assert_eq!(reports.len(), 3);
        assert_eq!(
            reports[0].status,
            RowStatus::Annotated {
                segments: 2,
                labels: 1
            }
        );
        assert_eq!(
            reports[1].status,
            RowStatus::Annotated {
                segments: 1,
                labels: 1
            }
        );
        assert!(matches!(reports[2].status, RowStatus::Unannotated(_)));

        let svg = document.to_string();
        assert!(svg.contains("A domain"));
        assert!(svg.contains("E3"));
    }

    #[test]
    fn test_render_logo_aborts_when_asked() {
        let windows = paginate(9, 30, 10).unwrap();
        let options = LogoOptions {
            on_missing: MissingPolicy::Abort,
            ..LogoOptions::default()
        };

        assert!(render_logo(&matrix(), &windows, Some(&regions()), &options).is_err());
    }

    #[test]
    fn test_render_logo_without_regions() {
        let windows = paginate(9, 30, 42).unwrap();
        let (_, reports) = render_logo(&matrix(), &windows, None, &LogoOptions::default()).unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].status, RowStatus::NoRegions);
        assert!(render_logo(&matrix(), &[], None, &LogoOptions::default()).is_err());
    }

    #[test]
    fn test_render_coverage() {
        let document = render_coverage("depth", &[(9, 100.0), (10, 250.0), (12, 50.0)]).unwrap();
        let svg = document.to_string();

        assert!(svg.contains("polyline"));
        assert!(svg.contains("Codon position"));
        assert!(render_coverage("depth", &[]).is_err());
    }

    #[test]
    fn test_render_panels_grid_and_legend() {
        let panels = vec![
            Panel {
                title: "synonymous".to_string(),
                y_label: "Frequency".to_string(),
                y_max: None,
                series: vec![Series::new("mutant", "#E69F00", vec![(9, 0.01), (10, 0.02)])],
            },
            Panel {
                title: "overlay".to_string(),
                y_label: "Frequency".to_string(),
                y_max: Some(0.065),
                series: vec![
                    Series::new("mutant", "#E69F00", vec![(9, 0.01), (10, 0.02)]),
                    Series::new("wildtype", "#56B4E9", vec![(9, 0.001)]),
                ],
            },
            Panel {
                title: "empty".to_string(),
                y_label: "Frequency".to_string(),
                y_max: None,
                series: Vec::new(),
            },
        ];

        let svg = render_panels("changes", &panels, ChartLayout::GRID)
            .unwrap()
            .to_string();

        assert_eq!(svg.matches("<polyline").count(), 3);
        assert!(svg.contains("wildtype"));
        assert!(svg.contains("0.065"));
        // three panels on two columns need two rows
        let height = TITLE_HEIGHT + 2.0 * ChartLayout::GRID.panel_height;
        assert!(svg.contains(&format!("height=\"{}\"", height)));

        let blank = Panel {
            series: vec![Series::new("mutant", "#E69F00", Vec::new())],
            ..panels[2].clone()
        };
        assert!(render_panels("changes", &[blank], ChartLayout::GRID).is_err());
    }

    #[test]
    fn test_row_status_fields_are_rectangular() {
        let statuses = [
            RowStatus::Annotated {
                segments: 2,
                labels: 1,
            },
            RowStatus::Unannotated("position 0 is not covered".to_string()),
            RowStatus::NoRegions,
        ];

        for status in statuses {
            assert_eq!(status.to_string().split('\t').count(), 4);
        }
    }

    #[test]
    fn test_residue_color() {
        assert_eq!(residue_color("E"), "#d62728");
        assert_eq!(residue_color("X"), "#7f7f7f");
        assert_eq!(residue_color("?"), "#000000");
    }
}
