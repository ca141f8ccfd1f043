//! Result writer: CSV and JSON files
//!
//! CSV is written RFC 4180 style (quote only when needed, CRLF line endings)
//! with a header row even when there are no records. JSON is a pretty-printed
//! array of objects that all share the header's key set, `[]` when empty.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::info;

use crate::error::{ConfigError, WriteError};
use crate::record::{Record, RecordSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    /// Format implied by the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(OutputFormat::Csv),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// Where and how the records are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    path: PathBuf,
    format: OutputFormat,
}

impl OutputSpec {
    /// Infer the format from the extension; anything but `.csv`/`.json` is refused
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let format = OutputFormat::from_path(&path)
            .ok_or_else(|| ConfigError::UnsupportedOutput(path.display().to_string()))?;
        Ok(Self { path, format })
    }

    /// Explicit format, whatever the extension says
    pub fn new(path: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

/// Write every record of `records` to `spec`; returns the number written
pub fn write(records: &RecordSet, spec: &OutputSpec) -> Result<usize, WriteError> {
    let path = spec.path();
    let file = File::create(path).map_err(|source| io_error(path, source))?;
    let mut writer = BufWriter::new(file);

    match spec.format() {
        OutputFormat::Csv => write_csv(records, &mut writer).map_err(|source| WriteError::Csv {
            path: path.to_path_buf(),
            source,
        })?,
        OutputFormat::Json => write_json(records, &mut writer, path)?,
    }

    writer.flush().map_err(|source| io_error(path, source))?;

    info!(
        path = %path.display(),
        format = spec.format().name(),
        records = records.len(),
        "wrote output"
    );
    Ok(records.len())
}

fn write_csv<W: Write>(records: &RecordSet, writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);

    csv_writer.write_record(records.fields())?;
    for record in records.records() {
        csv_writer.write_record(records.row(record))?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn write_json<W: Write>(records: &RecordSet, mut writer: W, path: &Path) -> Result<(), WriteError> {
    let rows: Vec<AlignedRow<'_>> = records
        .records()
        .iter()
        .map(|record| AlignedRow {
            fields: records.fields(),
            record,
        })
        .collect();

    serde_json::to_writer_pretty(&mut writer, &rows).map_err(|source| WriteError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writeln!(writer).map_err(|source| io_error(path, source))
}

/// Serializes a record with exactly the set's keys, in header order
struct AlignedRow<'a> {
    fields: &'a [String],
    record: &'a Record,
}

impl Serialize for AlignedRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in self.fields {
            map.serialize_entry(field, self.record.get_or_missing(field))?;
        }
        map.end()
    }
}

/// Read a file produced by `write` back into records
///
/// CSV takes its fields from the header row; JSON from the first object, so
/// an empty JSON array comes back with no fields.
pub fn read(spec: &OutputSpec) -> Result<RecordSet, WriteError> {
    let path = spec.path();
    match spec.format() {
        OutputFormat::Csv => read_csv(path),
        OutputFormat::Json => read_json(path),
    }
}

fn read_csv(path: &Path) -> Result<RecordSet, WriteError> {
    let csv_error = |source| WriteError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(csv_error)?;
    let fields: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(String::from)
        .collect();

    let mut set = RecordSet::new(fields.clone());
    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        let mut record = Record::new();
        for (field, value) in fields.iter().zip(row.iter()) {
            record.insert(field.as_str(), value);
        }
        set.push(record);
    }
    Ok(set)
}

fn read_json(path: &Path) -> Result<RecordSet, WriteError> {
    let file = File::open(path).map_err(|source| io_error(path, source))?;
    let value: serde_json::Value =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| WriteError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    if !value.is_array() {
        return Err(WriteError::Format {
            path: path.to_path_buf(),
            reason: "top-level value is not an array".to_string(),
        });
    }

    let records: Vec<Record> = serde_json::from_value(value).map_err(|e| WriteError::Format {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let fields = records
        .first()
        .map(|r| r.field_names().map(String::from).collect())
        .unwrap_or_default();

    Ok(RecordSet::with_records(fields, records))
}

fn io_error(path: &Path, source: std::io::Error) -> WriteError {
    WriteError::Io {
        path: path.to_path_buf(),
        source,
    }
}
