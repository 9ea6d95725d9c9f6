//! Presentation step between the layout engine and a rendering backend.
//!
//! The engine works in exact codon coordinates. Display padding (bars that
//! reach the edges of the first and last codon cell, labels centered on the
//! padded bar) is applied here, uniformly to every segment.

use crate::core::{LayoutError, Region, Segment};

/// Rendering capability used to draw annotation bands
pub trait Canvas {
    fn draw_bar(&mut self, x_start: f64, x_end: f64, y: f64, color: &str);
    fn draw_text(&mut self, x_center: f64, y: f64, label: &str);
}

/// Padding added to both ends of every bar, in codon units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offsets {
    pub left: f64,
    pub right: f64,
}

impl Default for Offsets {
    fn default() -> Self {
        Self {
            left: 0.5,
            right: 0.5,
        }
    }
}

impl Offsets {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    pub fn span(&self, segment: &Segment) -> (f64, f64) {
        (
            segment.draw_start as f64 - self.left,
            segment.draw_end as f64 + self.right,
        )
    }

    pub fn center(&self, segment: &Segment) -> f64 {
        let (x_start, x_end) = self.span(segment);
        (x_start + x_end) / 2.0
    }
}

/// Draws one bar per segment and a label for each label-eligible one.
/// Returns the number of labels drawn.
pub fn annotate<C: Canvas + ?Sized>(
    canvas: &mut C,
    regions: &[Region],
    segments: &[Segment],
    y: f64,
    offsets: Offsets,
) -> Result<usize, LayoutError> {
    // resolve every region first so a bad identifier leaves the canvas untouched
    let resolved = segments
        .iter()
        .map(|segment| {
            regions
                .iter()
                .find(|region| region.identifier == segment.region_identifier)
                .map(|region| (segment, region))
                .ok_or_else(|| {
                    LayoutError::InvalidRegionList(format!(
                        "segment [{}, {}] refers to unknown region {}",
                        segment.draw_start, segment.draw_end, segment.region_identifier
                    ))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut labels = 0;
    for (segment, region) in resolved {
        let (x_start, x_end) = offsets.span(segment);
        canvas.draw_bar(x_start, x_end, y, &region.color);

        if segment.label_eligible {
            canvas.draw_text(offsets.center(segment), y, &region.label);
            labels += 1;
        }
    }

    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::layout;

    #[derive(Default)]
    struct Recorder {
        bars: Vec<(f64, f64, f64, String)>,
        texts: Vec<(f64, f64, String)>,
    }

    impl Canvas for Recorder {
        fn draw_bar(&mut self, x_start: f64, x_end: f64, y: f64, color: &str) {
            self.bars.push((x_start, x_end, y, color.to_string()));
        }

        fn draw_text(&mut self, x_center: f64, y: f64, label: &str) {
            self.texts.push((x_center, y, label.to_string()));
        }
    }

    fn abc() -> Vec<Region> {
        vec![
            Region::new(1, 1, 10, "red", "A"),
            Region::new(2, 11, 20, "green", "B"),
            Region::new(3, 21, 30, "blue", "C"),
        ]
    }

    #[test]
    fn test_annotate_draws_bars_and_eligible_labels() {
        let regions = abc();
        let segments = layout(&regions, 5, 22, 3).unwrap();
        let mut canvas = Recorder::default();

        let labels = annotate(&mut canvas, &regions, &segments, 1.1, Offsets::default()).unwrap();

        assert_eq!(labels, 2);
        assert_eq!(
            canvas.bars,
            vec![
                (4.5, 10.5, 1.1, "red".to_string()),
                (10.5, 20.5, 1.1, "green".to_string()),
                (20.5, 22.5, 1.1, "blue".to_string()),
            ]
        );
        assert_eq!(
            canvas.texts,
            vec![(7.5, 1.1, "A".to_string()), (15.5, 1.1, "B".to_string())]
        );
    }

    #[test]
    fn test_offsets_are_applied_uniformly() {
        let regions = abc();
        let segments = layout(&regions, 1, 30, 0).unwrap();
        let offsets = Offsets::new(1.0, 1.0);
        let mut canvas = Recorder::default();

        annotate(&mut canvas, &regions, &segments, 0.0, offsets).unwrap();

        for ((x_start, x_end, _, _), segment) in canvas.bars.iter().zip(segments.iter()) {
            assert_eq!(*x_start, segment.draw_start as f64 - 1.0);
            assert_eq!(*x_end, segment.draw_end as f64 + 1.0);
        }
    }

    #[test]
    fn test_annotate_rejects_unknown_region_without_drawing() {
        let regions = abc();
        let mut segments = layout(&regions, 5, 25, 0).unwrap();
        segments[2].region_identifier = 42;
        let mut canvas = Recorder::default();

        assert!(matches!(
            annotate(&mut canvas, &regions, &segments, 0.0, Offsets::default()),
            Err(LayoutError::InvalidRegionList(_))
        ));
        assert!(canvas.bars.is_empty());
    }
}
