use serde::Serialize;

use crate::record::VisitorRecord;

/// Dashboard counters shown above the grid. Always recomputed from the
/// full row set; never patched incrementally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryStats {
    pub total: usize,
    pub male: usize,
    pub female: usize,
}

/// Counts rows per gender code, case-insensitively. Rows with a missing or
/// unrecognized gender still count toward the total.
pub fn summarize(rows: &[VisitorRecord]) -> SummaryStats {
    let mut stats = SummaryStats {
        total: rows.len(),
        ..SummaryStats::default()
    };
    for row in rows {
        match row.gender.as_deref().map(str::to_lowercase).as_deref() {
            Some("m") => stats.male += 1,
            Some("f") => stats.female += 1,
            _ => {}
        }
    }
    stats
}
