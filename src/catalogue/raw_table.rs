//! Untyped tabular source as read from a CSV file.
//!
//! Cells are kept as text: typing happens once, during normalization, under an explicit
//! column specification. Lines starting with `#` are treated as comments (VizieR exports
//! carry such headers), header names are trimmed, and ragged rows are accepted (missing
//! trailing cells read as empty).
use std::io::{Read, Write};

use camino::Utf8Path;

use crate::almanac_errors::Result;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        RawTable { headers, rows }
    }

    /// Build a table from string literals, mostly useful in tests and for synthesized sources.
    pub fn from_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    /// Read a delimited text source.
    ///
    /// Arguments
    /// -----------------
    /// * `reader`: any byte source holding the CSV text (header line first).
    /// * `delimiter`: field separator (`b','` or `b';'` for the usual catalogue exports).
    ///
    /// Return
    /// ----------
    /// * The parsed table, or a CSV/IO error.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .comment(Some(b'#'))
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<String>>();

        let rows = csv_reader
            .records()
            .map(|record| Ok(record?.iter().map(|c| c.to_string()).collect()))
            .collect::<Result<Vec<Vec<String>>>>()?;

        Ok(RawTable { headers, rows })
    }

    /// Read a delimited text file from disk.
    pub fn from_csv_path(path: &Utf8Path, delimiter: u8) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file), delimiter)
    }

    /// Write the table back as delimited text, header line first.
    pub fn write_csv<W: Write>(&self, writer: W, delimiter: u8) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_writer(writer);
        csv_writer.write_record(&self.headers)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell text at `(row, col)`; missing trailing cells of a ragged row read as `""`.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }
}
