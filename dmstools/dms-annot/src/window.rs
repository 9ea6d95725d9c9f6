use serde::Serialize;

use crate::core::LayoutError;

/// One row of a paginated plot, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub index: usize,
    pub start: u64,
    pub end: u64,
}

impl Window {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn contains(&self, position: u64) -> bool {
        self.start <= position && position <= self.end
    }
}

/// Splits `[first, last]` into consecutive rows of `width` positions; the
/// last row is clamped at `last`.
pub fn paginate(first: u64, last: u64, width: u64) -> Result<Vec<Window>, LayoutError> {
    if width == 0 {
        return Err(LayoutError::InvalidPageWidth);
    }

    if first > last {
        return Err(LayoutError::InvalidWindow {
            start: first,
            end: last,
        });
    }

    let mut windows = Vec::with_capacity(((last - first) / width + 1) as usize);
    let mut start = first;

    while start <= last {
        let end = start.saturating_add(width - 1).min(last);
        windows.push(Window {
            index: windows.len(),
            start,
            end,
        });

        if end == last {
            break;
        }
        start = end + 1;
    }

    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_default_rows() {
        let windows = paginate(9, 140, 42).unwrap();
        let bounds = windows
            .iter()
            .map(|w| (w.index, w.start, w.end))
            .collect::<Vec<_>>();

        assert_eq!(
            bounds,
            vec![(0, 9, 50), (1, 51, 92), (2, 93, 134), (3, 135, 140)]
        );
    }

    #[test]
    fn test_paginate_rows_are_contiguous() {
        for width in 1..20u64 {
            let windows = paginate(3, 97, width).unwrap();

            assert_eq!(windows[0].start, 3);
            assert_eq!(windows[windows.len() - 1].end, 97);
            for pair in windows.windows(2) {
                assert_eq!(pair[0].end + 1, pair[1].start);
                assert_eq!(pair[0].len(), width);
            }
        }
    }

    #[test]
    fn test_paginate_single_position_and_errors() {
        assert_eq!(
            paginate(7, 7, 42).unwrap(),
            vec![Window {
                index: 0,
                start: 7,
                end: 7
            }]
        );
        assert_eq!(paginate(1, 10, 0), Err(LayoutError::InvalidPageWidth));
        assert_eq!(
            paginate(10, 1, 5),
            Err(LayoutError::InvalidWindow { start: 10, end: 1 })
        );
    }

    #[test]
    fn test_paginate_near_u64_max() {
        let windows = paginate(u64::MAX - 3, u64::MAX, 3).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].end, u64::MAX);
    }
}
