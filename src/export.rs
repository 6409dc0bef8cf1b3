use crate::schema::{self, COLUMNS};
use crate::task::Task;
use chrono::{DateTime, Utc};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

pub const EXPORT_CONTENT_TYPE: &str = "text/csv;charset=utf-8";

#[derive(Debug)]
pub enum ExportError {
    Io(io::Error),
    Csv(csv::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Io(err) => write!(f, "io error: {err}"),
            ExportError::Csv(err) => write!(f, "csv error: {err}"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<io::Error> for ExportError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for ExportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Writes the canonical header and one row per task, every column always
/// present, in the order given.
pub fn export_tasks<W: io::Write>(tasks: &[Task], sink: W) -> ExportResult<()> {
    let mut writer = csv::WriterBuilder::new().from_writer(sink);
    writer.write_record(schema::header())?;
    for task in tasks {
        writer.write_record(COLUMNS.iter().map(|spec| spec.encode(task)))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_tasks_to_string(tasks: &[Task]) -> ExportResult<String> {
    let mut buffer = Vec::new();
    export_tasks(tasks, &mut buffer)?;
    String::from_utf8(buffer).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err).into())
}

pub fn export_tasks_to_path<P: AsRef<Path>>(tasks: &[Task], path: P) -> ExportResult<()> {
    let file = File::create(path)?;
    export_tasks(tasks, file)
}

/// Serialized CSV ready to hand to the user as a download.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub content: String,
    pub row_count: usize,
}

impl ExportArtifact {
    pub fn from_tasks(tasks: &[Task], generated_at: DateTime<Utc>) -> ExportResult<Self> {
        let content = export_tasks_to_string(tasks)?;
        let artifact = Self {
            file_name: Self::file_name_for(generated_at),
            content_type: EXPORT_CONTENT_TYPE,
            content,
            row_count: tasks.len(),
        };
        info!(file = %artifact.file_name, rows = artifact.row_count, "csv export ready");
        Ok(artifact)
    }

    /// `gantt-export-<unix millis>.csv`
    pub fn file_name_for(generated_at: DateTime<Utc>) -> String {
        format!("gantt-export-{}.csv", generated_at.timestamp_millis())
    }

    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P) -> ExportResult<PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        std::fs::write(&path, self.content.as_bytes())?;
        Ok(path)
    }
}
