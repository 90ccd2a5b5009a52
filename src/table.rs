use serde::Serialize;

use crate::error::{Error, Result};

/// In-memory tabular payload uploaded as a CSV resource.
///
/// The table is serialized when a request is built and nothing is kept
/// around once the upload has been sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Builds a table from records that are structs with named fields.
    ///
    /// The header row comes from the field names, the same way
    /// `csv::Writer::serialize` derives it. Records without field names
    /// (tuples, sequences) give no header and are rejected; maps are not
    /// supported by `csv` at all.
    pub fn from_records<I, T>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Serialize,
    {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let mut count = 0usize;
        for record in records {
            writer.serialize(record)?;
            count += 1;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| Error::Encode(csv::Error::from(e.into_error())))?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes.as_slice());
        let mut lines = Vec::with_capacity(count + 1);
        for record in reader.records() {
            lines.push(record?.iter().map(str::to_string).collect::<Vec<_>>());
        }

        if count == 0 {
            return Ok(Self::default());
        }
        // A header was written only if there is one line more than records.
        if lines.len() != count + 1 {
            return Err(Error::Encode(csv::Error::from(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "records must be structs with named fields",
            ))));
        }
        let rows = lines.split_off(1);
        let columns = lines.pop().unwrap_or_default();
        Ok(Self { columns, rows })
    }

    pub fn push_row<I, S>(&mut self, row: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_row<I, S>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_row(row);
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
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

    /// Header row followed by every data row, no index column.
    ///
    /// Rows may be ragged; the server decides whether that is acceptable.
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());
        if !self.columns.is_empty() {
            writer.write_record(&self.columns)?;
        }
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| Error::Encode(csv::Error::from(e.into_error())))
    }
}
