use super::derive::YearView;

// ---------------------------------------------------------------------------
// Year-range predicate over a derived year view
// ---------------------------------------------------------------------------

/// Inclusive year range selected in the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        if start <= end {
            YearRange { start, end }
        } else {
            YearRange { start: end, end: start }
        }
    }

    /// The preferred range pulled inside `bounds`, falling back to the full
    /// bounds when the two do not overlap.
    pub fn clamped(preferred: YearRange, bounds: (i32, i32)) -> Self {
        let (min, max) = bounds;
        if preferred.end < min || preferred.start > max {
            return YearRange::new(min, max);
        }
        YearRange::new(preferred.start.max(min), preferred.end.min(max))
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }
}

/// Return the `(row, year)` pairs of `view` whose year lies in `range`.
///
/// `None` means no range is active and every row of the view passes.
pub fn filtered_rows(view: &YearView, range: Option<&YearRange>) -> Vec<(usize, i32)> {
    match range {
        None => view.rows.clone(),
        Some(range) => view
            .rows
            .iter()
            .copied()
            .filter(|&(_, year)| range.contains(year))
            .collect(),
    }
}
