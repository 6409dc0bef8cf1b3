use crate::schema::{COLUMN_COUNT, COLUMNS, Column, DecodeAnomaly, Presence};
use crate::task::{Task, TaskId};
use csv::{ByteRecord, StringRecord};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

/// The source could not be tokenized at all; no tasks are produced.
#[derive(Debug)]
pub enum ImportError {
    Io(io::Error),
    Csv(csv::Error),
    EmptySource,
    HeaderEncoding(String),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Io(err) => write!(f, "io error: {err}"),
            ImportError::Csv(err) => write!(f, "csv error: {err}"),
            ImportError::EmptySource => write!(f, "source contains no header row"),
            ImportError::HeaderEncoding(msg) => write!(f, "header is not valid UTF-8: {msg}"),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<io::Error> for ImportError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for ImportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

pub type ImportResult<T> = Result<T, ImportError>;

/// A cell that did not decode cleanly. The task was still produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldAnomaly {
    pub line: u64,
    pub task_id: TaskId,
    pub column: Column,
    pub anomaly: DecodeAnomaly,
}

impl fmt::Display for FieldAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: task '{}' column {}: {}",
            self.line, self.task_id, self.column, self.anomaly
        )
    }
}

/// A row that did not fit the header. Rows with the wrong number of fields
/// still produce a task; rows that are not valid UTF-8 do not.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowError {
    ColumnCount {
        line: u64,
        expected: usize,
        found: usize,
    },
    Encoding {
        line: u64,
        message: String,
    },
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowError::ColumnCount {
                line,
                expected,
                found,
            } => write!(f, "line {line}: expected {expected} fields, found {found}"),
            RowError::Encoding { line, message } => {
                write!(f, "line {line}: invalid UTF-8: {message}")
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportOutcome {
    pub tasks: Vec<Task>,
    pub anomalies: Vec<FieldAnomaly>,
    pub row_errors: Vec<RowError>,
    /// Required columns absent from the header. Their cells decode as empty.
    pub missing_columns: Vec<Column>,
    pub skipped_blank_rows: usize,
}

impl ImportOutcome {
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty() && self.row_errors.is_empty() && self.missing_columns.is_empty()
    }
}

/// Maps each canonical column to its position in the source header.
struct HeaderMap {
    positions: [Option<usize>; COLUMN_COUNT],
    width: usize,
}

impl HeaderMap {
    fn from_record(record: &StringRecord) -> Self {
        let mut positions = [None; COLUMN_COUNT];
        for (idx, name) in record.iter().enumerate() {
            let name = if idx == 0 {
                name.trim_start_matches('\u{feff}')
            } else {
                name
            };
            if let Some(slot) = COLUMNS.iter().position(|spec| spec.column.name() == name) {
                // first occurrence wins
                positions[slot].get_or_insert(idx);
            }
        }
        Self {
            positions,
            width: record.len(),
        }
    }

    fn missing_required(&self) -> Vec<Column> {
        COLUMNS
            .iter()
            .zip(self.positions.iter())
            .filter(|(spec, pos)| spec.presence == Presence::Required && pos.is_none())
            .map(|(spec, _)| spec.column)
            .collect()
    }

    fn cell<'r>(&self, record: &'r StringRecord, slot: usize) -> &'r str {
        self.positions[slot]
            .and_then(|idx| record.get(idx))
            .unwrap_or("")
    }
}

/// A line holding nothing but whitespace. Rows of empty cells (`,,,`) are
/// data and decode like any other row.
fn is_blank(record: &ByteRecord) -> bool {
    record.len() <= 1
        && record
            .iter()
            .all(|field| field.iter().all(u8::is_ascii_whitespace))
}

fn decode_row(
    header: &HeaderMap,
    record: &StringRecord,
    line: u64,
    anomalies: &mut Vec<FieldAnomaly>,
) -> Task {
    let mut task = Task::blank();
    let mut row_anomalies = Vec::new();
    for (slot, spec) in COLUMNS.iter().enumerate() {
        if let Err(anomaly) = spec.decode(header.cell(record, slot), &mut task) {
            row_anomalies.push((spec.column, anomaly));
        }
    }
    for (column, anomaly) in row_anomalies {
        warn!(line, task_id = %task.id, %column, %anomaly, "field did not decode");
        anomalies.push(FieldAnomaly {
            line,
            task_id: task.id.clone(),
            column,
            anomaly,
        });
    }
    task
}

/// Decodes CSV text with a header row into tasks, preserving row order.
///
/// Only a source that cannot be tokenized fails the whole call. Bad cells and
/// malformed rows are reported in the outcome.
pub fn import_tasks<R: io::Read>(source: R) -> ImportResult<ImportOutcome> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source);
    let mut records = reader.byte_records();

    let header_record = match records.next() {
        Some(record) => record?,
        None => return Err(ImportError::EmptySource),
    };
    if is_blank(&header_record) {
        return Err(ImportError::EmptySource);
    }
    let header_record = StringRecord::from_byte_record(header_record)
        .map_err(|err| ImportError::HeaderEncoding(err.utf8_error().to_string()))?;
    let header = HeaderMap::from_record(&header_record);

    let mut outcome = ImportOutcome {
        missing_columns: header.missing_required(),
        ..ImportOutcome::default()
    };
    for column in &outcome.missing_columns {
        warn!(%column, "required column missing from header");
    }

    for record in records {
        let record = record?;
        let line = record.position().map_or(0, |pos| pos.line());
        if is_blank(&record) {
            debug!(line, "skipping blank row");
            outcome.skipped_blank_rows += 1;
            continue;
        }
        if record.len() != header.width {
            // still decoded: short rows fall back to column defaults and
            // cells past the header width are ignored
            let err = RowError::ColumnCount {
                line,
                expected: header.width,
                found: record.len(),
            };
            warn!(%err, "row width does not match header");
            outcome.row_errors.push(err);
        }
        let record = match StringRecord::from_byte_record(record) {
            Ok(record) => record,
            Err(err) => {
                let err = RowError::Encoding {
                    line,
                    message: err.utf8_error().to_string(),
                };
                warn!(%err, "skipping malformed row");
                outcome.row_errors.push(err);
                continue;
            }
        };
        let task = decode_row(&header, &record, line, &mut outcome.anomalies);
        outcome.tasks.push(task);
    }

    info!(
        tasks = outcome.tasks.len(),
        anomalies = outcome.anomalies.len(),
        row_errors = outcome.row_errors.len(),
        "csv import finished"
    );
    Ok(outcome)
}

pub fn import_tasks_from_str(text: &str) -> ImportResult<ImportOutcome> {
    import_tasks(text.as_bytes())
}

pub fn import_tasks_from_path<P: AsRef<Path>>(path: P) -> ImportResult<ImportOutcome> {
    let file = File::open(path)?;
    import_tasks(file)
}
