// Temperature history reader.
//
// Extracts an ordered `Series` of readings from a GISTEMP-style CSV table:
//
//   Land-Ocean: Northern Hemispheric Means        <- row 0, title
//   Year,Jan,Feb,...,Dec,J-D,D-N,DJF,MAM,JJA,SON  <- row 1, column header
//   1880,-.36,-.50,...,-.21,***,...               <- one row per year
//
// The first two rows are skipped. From every further row the cells in columns
// 1..14 (the twelve months plus the annual mean) are scanned left to right;
// cells holding the missing-value sentinel (`***` by default) are skipped and
// the rest must parse as finite floats. Readings are appended in column order
// across rows in row order. Rows may be ragged; a short row contributes the
// window cells it has.
//
// `|` is the quote character, matching how these tables are usually exported.

use crate::error::{Result, SonifyError};
use std::fs::File;
use std::io::Read;
use std::ops::Range;
use std::path::Path;

/// Default token marking a missing monthly value.
pub const DEFAULT_MISSING_SENTINEL: &str = "***";

/// An ordered, non-empty sequence of finite readings.
#[derive(Debug, Clone, PartialEq)]
pub struct Series(Vec<f64>);

impl Series {
    /// Wrap `values`, rejecting empty input and NaN/infinite readings.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(SonifyError::invalid("series has no readings"));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(SonifyError::invalid(format!(
                "reading {pos} is not finite ({})",
                values[pos]
            )));
        }
        Ok(Series(values))
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// A `Series` is never empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl AsRef<[f64]> for Series {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// Where the readings live inside the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    /// Leading rows to skip (title and column header).
    pub header_rows: usize,
    /// Half-open column window holding the monthly values.
    pub columns: Range<usize>,
    pub missing_sentinel: String,
}

impl Default for TableLayout {
    fn default() -> Self {
        TableLayout {
            header_rows: 2,
            columns: 1..14,
            missing_sentinel: DEFAULT_MISSING_SENTINEL.to_string(),
        }
    }
}

impl TableLayout {
    pub fn with_sentinel(sentinel: impl Into<String>) -> Self {
        TableLayout {
            missing_sentinel: sentinel.into(),
            ..Default::default()
        }
    }
}

/// Read every reading from `source`.
pub fn read<R: Read>(source: R, layout: &TableLayout) -> Result<Series> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(b',')
        .quote(b'|')
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut readings = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if row < layout.header_rows {
            continue;
        }
        for (column, cell) in record.iter().enumerate() {
            if !layout.columns.contains(&column) || cell == layout.missing_sentinel {
                continue;
            }
            let value = cell
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| SonifyError::Parse {
                    row,
                    column,
                    cell: cell.to_string(),
                })?;
            readings.push(value);
        }
    }

    tracing::debug!(readings = readings.len(), "read temperature history");
    Series::new(readings)
}

/// Open and read the CSV file at `path`.
pub fn read_path(path: &Path, layout: &TableLayout) -> Result<Series> {
    let file = File::open(path).map_err(|e| SonifyError::io(path, e))?;
    read(file, layout)
}

/// Read from an in-memory table.
pub fn read_str(text: &str, layout: &TableLayout) -> Result<Series> {
    read(text.as_bytes(), layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Land-Ocean: Northern Hemispheric Means\n\
        Year,Jan,Feb,Mar,Apr,May,Jun,Jul,Aug,Sep,Oct,Nov,Dec,J-D,D-N,DJF,MAM,JJA,SON\n";

    fn table(rows: &[&str]) -> String {
        let mut text = HEADER.to_string();
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_reads_month_window_in_order() {
        let text = table(&[
            "1880,-.36,-.50,-.23,-.29,-.06,-.16,-.17,-.25,-.22,-.30,-.42,-.40,-.28,***,***",
            "1881,-.30,-.21,-.03,.05,.05,-.19,.00,-.03,-.25,-.43,-.36,-.22,-.16,-.18,-.31",
        ]);
        let series = read_str(&text, &TableLayout::default()).unwrap();
        assert_eq!(series.len(), 26);
        assert_eq!(series.values()[0], -0.36);
        assert_eq!(series.values()[12], -0.28); // J-D annual mean is in the window
        assert_eq!(series.values()[13], -0.30); // first cell of 1881
        assert_eq!(series.values()[25], -0.16);
    }

    #[test]
    fn test_missing_sentinel_is_skipped() {
        let full = table(&["2020,1,2,3,4,5,6,7,8,9,10,11,12,6.5,x,x,x,x,x"]);
        let gap = table(&["2020,1,2,3,***,5,6,7,8,9,10,11,12,6.5,x,x,x,x,x"]);
        let full = read_str(&full, &TableLayout::default()).unwrap();
        let gap = read_str(&gap, &TableLayout::default()).unwrap();
        assert_eq!(gap.len(), full.len() - 1);
        assert_eq!(gap.values(), &[1.0, 2.0, 3.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 6.5]);
    }

    #[test]
    fn test_cells_outside_window_are_ignored() {
        // Column 0 (year) and columns from 14 on are never parsed.
        let text = table(&["not-a-year,1,2,3,4,5,6,7,8,9,10,11,12,13,garbage"]);
        let series = read_str(&text, &TableLayout::default()).unwrap();
        assert_eq!(series.len(), 13);
    }

    #[test]
    fn test_short_rows_contribute_what_they_have() {
        let text = table(&["2024,1.1,1.2,***"]);
        let series = read_str(&text, &TableLayout::default()).unwrap();
        assert_eq!(series.values(), &[1.1, 1.2]);
    }

    #[test]
    fn test_unparseable_cell_is_parse_error() {
        let text = table(&["1880,.1,.2,oops,.4"]);
        match read_str(&text, &TableLayout::default()) {
            Err(SonifyError::Parse { row, column, cell }) => {
                assert_eq!((row, column), (2, 3));
                assert_eq!(cell, "oops");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_cell_is_parse_error() {
        let text = table(&["1880,.1,NaN"]);
        assert!(matches!(
            read_str(&text, &TableLayout::default()),
            Err(SonifyError::Parse { column: 2, .. })
        ));
    }

    #[test]
    fn test_header_only_table_is_invalid() {
        assert!(matches!(
            read_str(HEADER, &TableLayout::default()),
            Err(SonifyError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_series_is_never_empty() {
        assert!(matches!(
            Series::new(Vec::new()),
            Err(SonifyError::InvalidArgument(_))
        ));
        let series = Series::new(vec![0.5]).unwrap();
        assert!(!series.is_empty());
    }

    #[test]
    fn test_custom_sentinel() {
        let text = table(&["1880,.1,NA,.3"]);
        let series = read_str(&text, &TableLayout::with_sentinel("NA")).unwrap();
        assert_eq!(series.values(), &[0.1, 0.3]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_path(
            Path::new("/nonexistent/history.csv"),
            &TableLayout::default(),
        );
        assert!(matches!(err, Err(SonifyError::Io { .. })));
    }
}
