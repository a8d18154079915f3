//! In-memory table: the input cells and the appended result columns.
//!
//! Delimited text (CSV, or TSV by extension) goes through `csv`; Excel and
//! OpenDocument workbooks are read with `calamine` (first worksheet) and
//! written as `.xlsx` with `rust_xlsxwriter`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use calamine::Reader;
use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::core::{Result, SentimentError};
use crate::pipelines::sentiment::SentimentResult;

/// Column names hinting at free text, checked case-insensitively.
pub const TEXT_COLUMN_KEYWORDS: [&str; 7] = [
    "feedback",
    "comment",
    "review",
    "response",
    "text",
    "message",
    "description",
];

/// A column counts as textual when its first non-empty value is longer than this.
const MIN_SAMPLE_CHARS: usize = 5;

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// On-disk layout, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Delimited(u8),
    Workbook,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Self {
        match extension(path).as_deref() {
            Some(ext) if WORKBOOK_EXTENSIONS.contains(&ext) => TableFormat::Workbook,
            Some("tsv") | Some("tab") => TableFormat::Delimited(b'\t'),
            _ => TableFormat::Delimited(b','),
        }
    }
}

/// `<base>`, `<base>_score`, `<base>_confidence`.
pub fn result_column_names(base: &str) -> [String; 3] {
    [
        base.to_string(),
        format!("{base}_score"),
        format!("{base}_confidence"),
    ]
}

pub fn default_result_base(source_column: &str) -> String {
    format!("{source_column}_sentiment_results")
}

/// `<dir>/<stem>_sentiment_analysis_<YYYYmmdd_HHMMSS>.<ext>` next to the
/// input. Workbooks come out as `.xlsx`, tab-separated files keep their
/// extension and everything else is written as `.csv`.
pub fn default_output_path(input: &Path, now: DateTime<Local>) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("table");
    let ext = match TableFormat::from_path(input) {
        TableFormat::Workbook => "xlsx".to_string(),
        TableFormat::Delimited(b'\t') => extension(input).unwrap_or_else(|| "tsv".into()),
        TableFormat::Delimited(_) => "csv".to_string(),
    };
    let name = format!(
        "{stem}_sentiment_analysis_{}.{ext}",
        now.format("%Y%m%d_%H%M%S")
    );
    input.with_file_name(name)
}

/// Plain decimal text that Excel should see as a number. Leading zeros
/// (identifiers, postcodes) stay text.
fn as_number(value: &str) -> Option<f64> {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let leading_zero = digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.");
    if leading_zero || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    value.parse().ok().filter(|n: &f64| n.is_finite())
}

fn excel_column(col: usize) -> Result<u16> {
    u16::try_from(col)
        .map_err(|_| SentimentError::Workbook(format!("column {col} is beyond the sheet limit")))
}

fn excel_row(row: usize) -> Result<u32> {
    u32::try_from(row)
        .map_err(|_| SentimentError::Workbook(format!("row {row} is beyond the sheet limit")))
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    /// Cells that were not valid UTF-8, by `(row, column)`. They are never
    /// analyzed and are written back byte for byte.
    undecodable: HashMap<(usize, usize), Vec<u8>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers,
            rows,
            undecodable: HashMap::new(),
        }
    }

    /// Reads a table with a header row. Delimited rows may be shorter or
    /// longer than the header; workbooks are read from their first sheet.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SentimentError::InputNotFound(path.to_path_buf()));
        }

        let table = match TableFormat::from_path(path) {
            TableFormat::Delimited(delimiter) => Self::load_delimited(path, delimiter)?,
            TableFormat::Workbook => Self::load_workbook(path)?,
        };
        debug!(
            path = %path.display(),
            rows = table.len(),
            columns = table.headers.len(),
            undecodable = table.undecodable.len(),
            "loaded table"
        );
        Ok(table)
    }

    fn load_delimited(path: &Path, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_path(path)?;
        let headers = reader
            .byte_headers()?
            .iter()
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect();

        let mut rows = Vec::new();
        let mut undecodable = HashMap::new();
        for (row, record) in reader.byte_records().enumerate() {
            let record = record?;
            let mut cells = Vec::with_capacity(record.len());
            for (column, field) in record.iter().enumerate() {
                match std::str::from_utf8(field) {
                    Ok(text) => cells.push(text.to_string()),
                    Err(e) => {
                        warn!(
                            row,
                            column,
                            error = %e,
                            "cell is not valid UTF-8, it will be left unanalyzed"
                        );
                        undecodable.insert((row, column), field.to_vec());
                        cells.push(String::from_utf8_lossy(field).into_owned());
                    }
                }
            }
            rows.push(cells);
        }

        Ok(Self {
            headers,
            rows,
            undecodable,
        })
    }

    fn load_workbook(path: &Path) -> Result<Self> {
        let mut workbook = calamine::open_workbook_auto(path)?;
        let range = workbook.worksheet_range_at(0).ok_or_else(|| {
            SentimentError::Workbook(format!("{} has no worksheets", path.display()))
        })??;

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());
        let headers = rows.next().unwrap_or_default();
        Ok(Self::new(headers, rows.collect()))
    }

    /// Writes the table in the format implied by `path`. Only `.xlsx` is
    /// supported among workbook formats.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        match TableFormat::from_path(path) {
            TableFormat::Delimited(delimiter) => self.save_delimited(path, delimiter),
            TableFormat::Workbook if extension(path).as_deref() == Some("xlsx") => {
                self.save_workbook(path)
            }
            TableFormat::Workbook => Err(SentimentError::Config(format!(
                "cannot write {}: workbooks are written as .xlsx",
                path.display()
            ))),
        }
    }

    fn save_delimited(&self, path: &Path, delimiter: u8) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_path(path)?;
        writer.write_record(&self.headers)?;
        for (r, row) in self.rows.iter().enumerate() {
            let record: Vec<&[u8]> = row
                .iter()
                .enumerate()
                .map(|(c, cell)| {
                    self.undecodable
                        .get(&(r, c))
                        .map_or(cell.as_bytes(), Vec::as_slice)
                })
                .collect();
            writer.write_record(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn save_workbook(&self, path: &Path) -> Result<()> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();

        for (col, header) in self.headers.iter().enumerate() {
            if !header.is_empty() {
                sheet.write_string(0, excel_column(col)?, header)?;
            }
        }
        for (r, row) in self.rows.iter().enumerate() {
            let sheet_row = excel_row(r + 1)?;
            for (col, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let sheet_col = excel_column(col)?;
                match as_number(value) {
                    Some(number) => sheet.write_number(sheet_row, sheet_col, number)?,
                    None => sheet.write_string(sheet_row, sheet_col, value)?,
                };
            }
        }

        workbook.save(path)?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| SentimentError::ColumnNotFound {
                column: name.to_string(),
                available: self.headers.clone(),
            })
    }

    /// One entry per row; `None` where the row has no such cell or the cell
    /// could not be decoded.
    pub fn text_cells(&self, column: usize) -> Vec<Option<&str>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(r, row)| {
                row.get(column)
                    .filter(|_| !self.undecodable.contains_key(&(r, column)))
                    .map(String::as_str)
            })
            .collect()
    }

    fn is_textual(&self, column: usize) -> bool {
        let mut values = self
            .rows
            .iter()
            .filter_map(|row| row.get(column))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty());
        let Some(first) = values.next() else {
            return false;
        };
        let all_numeric = std::iter::once(first)
            .chain(values)
            .all(|v| v.parse::<f64>().is_ok());
        !all_numeric && first.chars().count() > MIN_SAMPLE_CHARS
    }

    /// Picks the column to analyse when none was named: the first textual
    /// column whose name contains a [`TEXT_COLUMN_KEYWORDS`] entry, else the
    /// first textual column.
    pub fn detect_text_column(&self) -> Result<usize> {
        let textual: Vec<usize> = (0..self.headers.len())
            .filter(|&idx| self.is_textual(idx))
            .collect();

        textual
            .iter()
            .copied()
            .find(|&idx| {
                let name = self.headers[idx].to_lowercase();
                TEXT_COLUMN_KEYWORDS.iter().any(|k| name.contains(k))
            })
            .or_else(|| textual.first().copied())
            .ok_or(SentimentError::NoTextColumn)
    }

    /// Validates the result columns for analysing `source`: none of them may
    /// be the source column itself, and existing ones need `overwrite`.
    pub fn check_output_columns(&self, base: &str, source: usize, overwrite: bool) -> Result<()> {
        if let Some(source_name) = self.headers.get(source) {
            if result_column_names(base).contains(source_name) {
                return Err(SentimentError::OutputOverwritesSource(source_name.clone()));
            }
        }
        self.check_existing(base, overwrite)
    }

    fn check_existing(&self, base: &str, overwrite: bool) -> Result<()> {
        if overwrite {
            return Ok(());
        }
        match result_column_names(base)
            .into_iter()
            .find(|name| self.headers.contains(name))
        {
            Some(existing) => Err(SentimentError::OutputColumnExists(existing)),
            None => Ok(()),
        }
    }

    /// Adds (or with `overwrite`, replaces) the label, score and confidence
    /// columns. Numbers are written with three decimals. Cells beyond the
    /// header are kept; new columns go after the widest row.
    pub fn append_results(
        &mut self,
        base: &str,
        results: &[SentimentResult],
        overwrite: bool,
    ) -> Result<()> {
        if results.len() != self.rows.len() {
            return Err(SentimentError::Config(format!(
                "{} results for {} rows",
                results.len(),
                self.rows.len()
            )));
        }
        self.check_existing(base, overwrite)?;

        let width = self
            .rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(self.headers.len());
        if width > self.headers.len() {
            warn!(
                header = self.headers.len(),
                widest_row = width,
                "rows extend past the header, adding unnamed columns"
            );
            self.headers.resize(width, String::new());
        }
        self.pad_rows();

        let columns = result_column_names(base).map(|name| self.ensure_column(name));

        for (r, (row, result)) in self.rows.iter_mut().zip(results).enumerate() {
            let [label_col, score_col, confidence_col] = columns;
            row[label_col] = result.label.to_string();
            row[score_col] = format!("{:.3}", result.score);
            row[confidence_col] = format!("{:.3}", result.confidence);
            for col in columns {
                self.undecodable.remove(&(r, col));
            }
        }
        Ok(())
    }

    fn pad_rows(&mut self) {
        let width = self.headers.len();
        for row in &mut self.rows {
            if row.len() < width {
                row.resize(width, String::new());
            }
        }
    }

    fn ensure_column(&mut self, name: String) -> usize {
        if let Some(idx) = self.headers.iter().position(|h| *h == name) {
            return idx;
        }
        self.headers.push(name);
        self.pad_rows();
        self.headers.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::sentiment::Label;
    use chrono::TimeZone;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn survey() -> Table {
        Table::new(
            strings(&["id", "name", "customer_feedback", "rating"]),
            vec![
                strings(&["1", "Alice Smith", "Great service, thanks!", "5"]),
                strings(&["2", "Bob Jones", "", "2"]),
                strings(&["3", "Carol White"]),
            ],
        )
    }

    #[test]
    fn keyword_column_wins_over_earlier_text() {
        assert_eq!(survey().detect_text_column().unwrap(), 2);
    }

    #[test]
    fn falls_back_to_first_textual_column() {
        let table = Table::new(
            strings(&["id", "notes"]),
            vec![strings(&["1", "arrived late again"])],
        );
        assert_eq!(table.detect_text_column().unwrap(), 1);

        let numeric = Table::new(strings(&["id"]), vec![strings(&["12345678"])]);
        assert!(matches!(
            numeric.detect_text_column(),
            Err(SentimentError::NoTextColumn)
        ));
    }

    #[test]
    fn ragged_rows_become_missing_cells() {
        let table = survey();
        assert_eq!(
            table.text_cells(2),
            vec![Some("Great service, thanks!"), Some(""), None]
        );
    }

    #[test]
    fn unknown_column_lists_headers() {
        let err = survey().column_index("comments").unwrap_err();
        match err {
            SentimentError::ColumnNotFound { available, .. } => assert_eq!(available.len(), 4),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn results_append_three_columns() {
        let mut table = survey();
        let results = [
            SentimentResult {
                label: Label::Positive,
                score: 0.61234,
                confidence: 0.61234,
            },
            SentimentResult::neutral(),
            SentimentResult::neutral(),
        ];
        table.append_results("fb", &results, false).unwrap();

        assert_eq!(&table.headers()[4..], &strings(&["fb", "fb_score", "fb_confidence"]));
        assert_eq!(&table.rows()[0][4..], &strings(&["Positive", "0.612", "0.612"]));
        assert_eq!(table.rows()[2].len(), 7);
        assert_eq!(table.rows()[2][4], "Neutral");
    }

    #[test]
    fn existing_columns_need_overwrite() {
        let mut table = survey();
        let results = vec![SentimentResult::neutral(); 3];
        table.append_results("fb", &results, false).unwrap();

        let err = table.append_results("fb", &results, false).unwrap_err();
        assert!(matches!(err, SentimentError::OutputColumnExists(ref c) if c == "fb"));

        table.append_results("fb", &results, true).unwrap();
        assert_eq!(table.headers().len(), 7);
    }

    #[test]
    fn mismatched_result_count_is_rejected() {
        let mut table = survey();
        assert!(table.append_results("fb", &[], false).is_err());
    }

    #[test]
    fn default_names() {
        assert_eq!(default_result_base("comment"), "comment_sentiment_results");
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let output = |input: &str| default_output_path(Path::new(input), now);
        assert_eq!(
            output("/data/survey.tsv"),
            PathBuf::from("/data/survey_sentiment_analysis_20240309_140507.tsv")
        );
        assert_eq!(
            output("/data/survey.XLS"),
            PathBuf::from("/data/survey_sentiment_analysis_20240309_140507.xlsx")
        );
        assert_eq!(
            output("/data/survey.txt"),
            PathBuf::from("/data/survey_sentiment_analysis_20240309_140507.csv")
        );
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(TableFormat::from_path(Path::new("a.xlsx")), TableFormat::Workbook);
        assert_eq!(TableFormat::from_path(Path::new("a.ods")), TableFormat::Workbook);
        assert_eq!(TableFormat::from_path(Path::new("a.TAB")), TableFormat::Delimited(b'\t'));
        assert_eq!(TableFormat::from_path(Path::new("a")), TableFormat::Delimited(b','));
    }

    #[test]
    fn cells_past_the_header_survive_append() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("wide.csv");
        std::fs::write(&input, "id,comment\n1,fine,extra1,extra2\n2,ok\n").unwrap();

        let mut table = Table::load(&input).unwrap();
        table
            .append_results("s", &[SentimentResult::neutral(); 2], false)
            .unwrap();

        assert_eq!(
            table.headers(),
            &strings(&["id", "comment", "", "", "s", "s_score", "s_confidence"])
        );
        assert_eq!(
            table.rows()[0],
            strings(&["1", "fine", "extra1", "extra2", "Neutral", "0.000", "0.000"])
        );
        assert_eq!(
            table.rows()[1],
            strings(&["2", "ok", "", "", "Neutral", "0.000", "0.000"])
        );
    }

    #[test]
    fn undecodable_cells_are_skipped_and_kept() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("latin1.csv");
        std::fs::write(&input, b"id,comment\n1,great service\n2,caf\xe9 was awful\n").unwrap();

        let mut table = Table::load(&input).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.text_cells(1), vec![Some("great service"), None]);

        table
            .append_results("s", &[SentimentResult::neutral(); 2], false)
            .unwrap();
        let output = dir.path().join("out.csv");
        table.save(&output).unwrap();

        let written = std::fs::read(&output).unwrap();
        let needle = b"caf\xe9 was awful,Neutral";
        assert!(written.windows(needle.len()).any(|w| w == needle));
    }

    #[test]
    fn result_columns_may_not_replace_the_source() {
        let table = survey();
        let err = table
            .check_output_columns("customer_feedback", 2, true)
            .unwrap_err();
        assert!(matches!(err, SentimentError::OutputOverwritesSource(ref c) if c == "customer_feedback"));
        assert!(err.is_configuration());

        assert!(table.check_output_columns("fb", 2, false).is_ok());
        assert!(table.check_output_columns("name", 2, true).is_ok());
        assert!(matches!(
            table.check_output_columns("name", 2, false),
            Err(SentimentError::OutputColumnExists(_))
        ));
    }

    #[test]
    fn xlsx_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey.xlsx");

        let mut table = Table::new(
            strings(&["ticket", "customer_feedback", "zip"]),
            vec![
                strings(&["1001", "Great service, thanks!", "02134"]),
                strings(&["1002", "Still waiting", "90210"]),
            ],
        );
        let results = [
            SentimentResult {
                label: Label::Positive,
                score: 0.5,
                confidence: 0.75,
            },
            SentimentResult::neutral(),
        ];
        table.append_results("fb", &results, false).unwrap();
        table.save(&path).unwrap();

        let loaded = Table::load(&path).unwrap();
        assert_eq!(loaded.headers(), table.headers());
        assert_eq!(loaded.len(), 2);
        assert_eq!(
            loaded.text_cells(1),
            vec![Some("Great service, thanks!"), Some("Still waiting")]
        );
        assert_eq!(loaded.rows()[0][0], "1001");
        assert_eq!(loaded.rows()[0][2], "02134");
        assert_eq!(loaded.rows()[0][3], "Positive");
        assert_eq!(loaded.rows()[1][3], "Neutral");
        let score: f32 = loaded.rows()[0][4].parse().unwrap();
        let confidence: f32 = loaded.rows()[0][5].parse().unwrap();
        assert!((score - 0.5).abs() < 1e-6);
        assert!((confidence - 0.75).abs() < 1e-6);
    }

    #[test]
    fn only_xlsx_workbooks_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let err = survey().save(dir.path().join("out.xls")).unwrap_err();
        assert!(matches!(err, SentimentError::Config(_)));
    }

    #[test]
    fn numeric_text_keeps_leading_zeros() {
        assert_eq!(as_number("0.612"), Some(0.612));
        assert_eq!(as_number("-1"), Some(-1.0));
        assert_eq!(as_number("02134"), None);
        assert_eq!(as_number("inf"), None);
        assert_eq!(as_number(""), None);
    }

    #[test]
    fn csv_round_trip_keeps_quoted_commas() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(
            &input,
            "id,comment\n1,\"Fast, friendly, helpful\"\n2\n",
        )
        .unwrap();

        let mut table = Table::load(&input).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.text_cells(1), vec![Some("Fast, friendly, helpful"), None]);

        table
            .append_results("s", &[SentimentResult::neutral(); 2], false)
            .unwrap();
        let output = dir.path().join("out.tsv");
        table.save(&output).unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("id\tcomment\ts\ts_score\ts_confidence\n"));
        assert!(written.contains("Fast, friendly, helpful\tNeutral\t0.000\t0.000"));
    }

    #[test]
    fn missing_input_is_reported() {
        let err = Table::load("/no/such/table.csv").unwrap_err();
        assert!(matches!(err, SentimentError::InputNotFound(_)));
    }
}
