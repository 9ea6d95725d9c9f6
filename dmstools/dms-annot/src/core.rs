//! Interval-annotation layout engine
//!
//! Given a sorted list of labeled regions (protein domains, arches, linkers)
//! and one plotting window `[window_start, window_end]`, the engine splits the
//! window into the sub-intervals that fall inside each region, clipping at the
//! window boundaries, and flags the segments long enough to carry a label.
//!
//! All coordinates are inclusive codon positions. The engine never re-sorts
//! its input and never falls back to a default region: a window boundary that
//! no region covers is reported as [`LayoutError::RegionNotFound`].

use serde::Serialize;
use thiserror::Error;

use config::MIN_LABEL_LENGTH;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub identifier: usize,
    pub start: u64,
    pub end: u64,
    pub color: String,
    pub label: String,
}

impl Region {
    pub fn new<C: Into<String>, L: Into<String>>(
        identifier: usize,
        start: u64,
        end: u64,
        color: C,
        label: L,
    ) -> Self {
        Self {
            identifier,
            start,
            end,
            color: color.into(),
            label: label.into(),
        }
    }

    #[inline(always)]
    pub fn contains(&self, position: u64) -> bool {
        self.start <= position && position <= self.end
    }
}

/// A clipped piece of one region inside one window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub draw_start: u64,
    pub draw_end: u64,
    pub region_identifier: usize,
    pub label_eligible: bool,
}

impl Segment {
    fn new(draw_start: u64, draw_end: u64, region: &Region, threshold: LabelThreshold) -> Self {
        let length = draw_end - draw_start;
        Self {
            draw_start,
            draw_end,
            region_identifier: region.identifier,
            label_eligible: threshold.admits(length),
        }
    }

    /// arithmetic length, `draw_end - draw_start`
    pub fn len(&self) -> u64 {
        self.draw_end - self.draw_start
    }

    pub fn is_empty(&self) -> bool {
        self.draw_start == self.draw_end
    }
}

/// Minimum-length policy deciding which segments get a text label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelThreshold {
    /// label iff `length > n`
    Exclusive(u64),
    /// label iff `length >= n`
    Inclusive(u64),
}

impl LabelThreshold {
    #[inline(always)]
    pub fn admits(&self, length: u64) -> bool {
        match *self {
            LabelThreshold::Exclusive(min) => length > min,
            LabelThreshold::Inclusive(min) => length >= min,
        }
    }

    pub fn new(min_length: u64, inclusive: bool) -> Self {
        if inclusive {
            LabelThreshold::Inclusive(min_length)
        } else {
            LabelThreshold::Exclusive(min_length)
        }
    }
}

impl Default for LabelThreshold {
    fn default() -> Self {
        LabelThreshold::Exclusive(MIN_LABEL_LENGTH)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("position {position} is not annotated by any region")]
    RegionNotFound { position: u64 },
    #[error("invalid window: start {start} is greater than end {end}")]
    InvalidWindow { start: u64, end: u64 },
    #[error("invalid region list: {0}")]
    InvalidRegionList(String),
    #[error("region list is empty")]
    EmptyRegionList,
    #[error("row width must be greater than 0")]
    InvalidPageWidth,
}

/// Index of the region covering `position`.
///
/// `regions` must be sorted by start and pairwise disjoint, which makes
/// their ends ascending too and lets a binary search stand in for a scan.
pub fn region_at(regions: &[Region], position: u64) -> Result<usize, LayoutError> {
    let idx = regions.partition_point(|region| region.end < position);

    match regions.get(idx) {
        Some(region) if region.start <= position => Ok(idx),
        _ => Err(LayoutError::RegionNotFound { position }),
    }
}

/// Splits `[window_start, window_end]` into per-region segments, labeling
/// those strictly longer than `min_label_length`.
///
/// `regions` must be sorted by start and pairwise disjoint. This is not
/// checked here: on an unsorted or overlapping slice the boundary lookups
/// and the clipping are unspecified. Build a [`RegionSet`] to have the
/// list validated once, or use [`RegionSet::layout`].
///
/// # Example
///
/// ```rust
/// use dms_annot::{layout, LayoutError, Region, RegionSet};
///
/// let set = RegionSet::new(vec![
///     Region::new(0, 1, 10, "#8dd3c7", "A"),
///     Region::new(0, 11, 20, "#ffffb3", "B"),
///     Region::new(0, 21, 30, "#bebada", "C"),
/// ])
/// .unwrap();
///
/// let bounds = layout(set.regions(), 5, 25, 7)
///     .unwrap()
///     .iter()
///     .map(|s| (s.draw_start, s.draw_end, s.region_identifier))
///     .collect::<Vec<_>>();
/// assert_eq!(bounds, vec![(5, 10, 0), (11, 20, 1), (21, 25, 2)]);
///
/// // overlapping tables never reach the engine
/// let overlapping = RegionSet::new(vec![
///     Region::new(0, 1, 10, "#8dd3c7", "A"),
///     Region::new(0, 8, 20, "#ffffb3", "B"),
/// ]);
/// assert!(matches!(overlapping, Err(LayoutError::InvalidRegionList(_))));
/// ```
pub fn layout(
    regions: &[Region],
    window_start: u64,
    window_end: u64,
    min_label_length: u64,
) -> Result<Vec<Segment>, LayoutError> {
    layout_with(
        regions,
        window_start,
        window_end,
        LabelThreshold::Exclusive(min_label_length),
    )
}

/// Same as [`layout`] with an explicit label policy.
///
/// Shares the precondition of [`layout`]: `regions` sorted by start and
/// pairwise disjoint, as guaranteed by [`RegionSet`]. Segments come back in
/// region order. On error nothing is returned, not even the segments
/// computed before the failing boundary.
pub fn layout_with(
    regions: &[Region],
    window_start: u64,
    window_end: u64,
    threshold: LabelThreshold,
) -> Result<Vec<Segment>, LayoutError> {
    if window_start > window_end {
        return Err(LayoutError::InvalidWindow {
            start: window_start,
            end: window_end,
        });
    }

    if regions.is_empty() {
        return Err(LayoutError::EmptyRegionList);
    }

    let first = region_at(regions, window_start)?;
    let last = region_at(regions, window_end)?;

    if first == last {
        return Ok(vec![Segment::new(
            window_start,
            window_end,
            &regions[first],
            threshold,
        )]);
    }

    let spanned = &regions[first..=last];

    // interior positions must be covered as well
    for pair in spanned.windows(2) {
        if pair[1].start > pair[0].end + 1 {
            return Err(LayoutError::RegionNotFound {
                position: pair[0].end + 1,
            });
        }
    }

    let segments = spanned
        .iter()
        .enumerate()
        .map(|(i, region)| {
            let draw_start = if i == 0 {
                region.start.max(window_start)
            } else {
                region.start
            };
            let draw_end = if i == spanned.len() - 1 {
                region.end.min(window_end)
            } else {
                region.end
            };

            Segment::new(draw_start, draw_end, region, threshold)
        })
        .collect();

    Ok(segments)
}

/// Regions validated once at load time: non-empty, well-formed, sorted by
/// start and non-overlapping. Identifiers are the 0-based rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSet {
    regions: Vec<Region>,
}

impl RegionSet {
    pub fn new(mut regions: Vec<Region>) -> Result<Self, LayoutError> {
        if regions.is_empty() {
            return Err(LayoutError::EmptyRegionList);
        }

        for region in regions.iter() {
            if region.end < region.start {
                return Err(LayoutError::InvalidRegionList(format!(
                    "region '{}' ends ({}) before it starts ({})",
                    region.label, region.end, region.start
                )));
            }
        }

        for pair in regions.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.start <= prev.end {
                return Err(LayoutError::InvalidRegionList(format!(
                    "region '{}' [{}, {}] overlaps or precedes '{}' [{}, {}]",
                    next.label, next.start, next.end, prev.label, prev.start, prev.end
                )));
            }
        }

        regions
            .iter_mut()
            .enumerate()
            .for_each(|(rank, region)| region.identifier = rank);

        Ok(Self { regions })
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn get(&self, identifier: usize) -> Option<&Region> {
        self.regions.get(identifier)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// first start and last end
    pub fn span(&self) -> (u64, u64) {
        // non-empty by construction
        let first = &self.regions[0];
        let last = &self.regions[self.regions.len() - 1];
        (first.start, last.end)
    }

    pub fn region_at(&self, position: u64) -> Result<&Region, LayoutError> {
        region_at(&self.regions, position).map(|idx| &self.regions[idx])
    }

    pub fn layout(
        &self,
        window_start: u64,
        window_end: u64,
        threshold: LabelThreshold,
    ) -> Result<Vec<Segment>, LayoutError> {
        layout_with(&self.regions, window_start, window_end, threshold)
    }
}
