//! Text table builder for CLI output.
//!
//! Formats the benchmark grid as aligned, human-readable lines for text mode.

use crate::bench::BenchTable;
use crate::model::Algorithm;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Group digits with commas ("100000" -> "100,000").
pub(crate) fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Build an aligned table from the benchmark grid.
pub(crate) fn build_bench_summary(table: &BenchTable) -> TextSummary {
    let mut headers = vec!["Array Size".to_string()];
    headers.extend(
        Algorithm::ALL
            .iter()
            .map(|a| format!("{} (ms)", a.label())),
    );

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(table.sizes().len());
    for (row, &size) in table.sizes().iter().enumerate() {
        let mut cells = vec![group_thousands(size)];
        for col in 0..Algorithm::ALL.len() {
            let cell = table
                .cell(row, col)
                .map(|c| c.text())
                .unwrap_or_else(|_| "-".into());
            cells.push(cell);
        }
        rows.push(cells);
    }

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|r| r[i].len())
                .chain(std::iter::once(h.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let fmt_row = |cells: &[String]| {
        cells
            .iter()
            .zip(widths.iter().copied())
            .map(|(c, w)| format!("{c:>w$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut lines = vec![fmt_row(&headers)];
    lines.push(widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
    lines.extend(rows.iter().map(|r| fmt_row(r)));

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(100), "100");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(100000), "100,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }
}
