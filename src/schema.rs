//! Column layout and field rules shared by the importer and the exporter.

use crate::task::{DateValue, Task, TaskId, TaskType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;

/// Type tag applied when a row leaves `type` empty.
pub const DEFAULT_TASK_TYPE: &str = "task";

/// Calendar form used for `start` and `end` in both directions.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const SAMPLE_FILE_NAME: &str = "sample-gantt.csv";

pub const SAMPLE_CSV: &str = include_str!("../assets/sample-gantt.csv");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Id,
    Text,
    Start,
    End,
    Duration,
    Progress,
    Parent,
    Type,
}

impl Column {
    pub const fn name(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Text => "text",
            Column::Start => "start",
            Column::End => "end",
            Column::Duration => "duration",
            Column::Progress => "progress",
            Column::Parent => "parent",
            Column::Type => "type",
        }
    }

    /// Header names are matched exactly, case included.
    pub fn from_name(name: &str) -> Option<Self> {
        COLUMNS
            .iter()
            .map(|spec| spec.column)
            .find(|column| column.name() == name)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    /// The column may be missing from an input header. Output always has it.
    Optional,
}

/// What an empty cell decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultPolicy {
    /// Empty text is a legitimate value and is kept.
    Verbatim,
    /// The field is left carrying its invalid marker and an anomaly is raised.
    Sentinel,
    /// The field is left absent.
    Absent,
    /// The cell is decoded as if it held this literal.
    Literal(&'static str),
}

/// Why a cell did not decode to its expected type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DecodeAnomaly {
    Missing,
    InvalidDate(String),
    InvalidInteger(String),
    InvalidNumber(String),
}

impl fmt::Display for DecodeAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeAnomaly::Missing => write!(f, "missing value"),
            DecodeAnomaly::InvalidDate(raw) => write!(f, "invalid date '{raw}'"),
            DecodeAnomaly::InvalidInteger(raw) => write!(f, "invalid integer '{raw}'"),
            DecodeAnomaly::InvalidNumber(raw) => write!(f, "invalid number '{raw}'"),
        }
    }
}

pub type DecodeFn = fn(&str, &mut Task) -> Result<(), DecodeAnomaly>;
pub type EncodeFn = fn(&Task) -> String;

pub struct ColumnSpec {
    pub column: Column,
    pub presence: Presence,
    pub default: DefaultPolicy,
    decode: DecodeFn,
    encode: EncodeFn,
}

impl ColumnSpec {
    /// Decodes one cell into `task`, applying this column's default policy to
    /// empty cells. The task is always updated; an anomaly only reports it.
    pub fn decode(&self, cell: &str, task: &mut Task) -> Result<(), DecodeAnomaly> {
        if !cell.is_empty() {
            return (self.decode)(cell, task);
        }
        match self.default {
            DefaultPolicy::Verbatim => (self.decode)(cell, task),
            DefaultPolicy::Sentinel => Err(DecodeAnomaly::Missing),
            DefaultPolicy::Absent => Ok(()),
            DefaultPolicy::Literal(value) => (self.decode)(value, task),
        }
    }

    pub fn encode(&self, task: &Task) -> String {
        (self.encode)(task)
    }
}

pub const COLUMN_COUNT: usize = 8;

/// Canonical columns in output order. Decoding runs in the same order.
pub const COLUMNS: [ColumnSpec; COLUMN_COUNT] = [
    ColumnSpec {
        column: Column::Id,
        presence: Presence::Required,
        default: DefaultPolicy::Verbatim,
        decode: decode_id,
        encode: encode_id,
    },
    ColumnSpec {
        column: Column::Text,
        presence: Presence::Required,
        default: DefaultPolicy::Verbatim,
        decode: decode_text,
        encode: encode_text,
    },
    ColumnSpec {
        column: Column::Start,
        presence: Presence::Required,
        default: DefaultPolicy::Sentinel,
        decode: decode_start,
        encode: encode_start,
    },
    ColumnSpec {
        column: Column::End,
        presence: Presence::Required,
        default: DefaultPolicy::Absent,
        decode: decode_end,
        encode: encode_end,
    },
    ColumnSpec {
        column: Column::Duration,
        presence: Presence::Required,
        default: DefaultPolicy::Sentinel,
        decode: decode_duration,
        encode: encode_duration,
    },
    ColumnSpec {
        column: Column::Progress,
        presence: Presence::Required,
        default: DefaultPolicy::Sentinel,
        decode: decode_progress,
        encode: encode_progress,
    },
    ColumnSpec {
        column: Column::Parent,
        presence: Presence::Optional,
        default: DefaultPolicy::Absent,
        decode: decode_parent,
        encode: encode_parent,
    },
    ColumnSpec {
        column: Column::Type,
        presence: Presence::Optional,
        default: DefaultPolicy::Literal(DEFAULT_TASK_TYPE),
        decode: decode_type,
        encode: encode_type,
    },
];

pub fn header() -> impl Iterator<Item = &'static str> {
    COLUMNS.iter().map(|spec| spec.column.name())
}

fn decode_id(cell: &str, task: &mut Task) -> Result<(), DecodeAnomaly> {
    task.id = TaskId::new(cell);
    Ok(())
}

fn decode_text(cell: &str, task: &mut Task) -> Result<(), DecodeAnomaly> {
    task.text = cell.to_string();
    Ok(())
}

fn decode_start(cell: &str, task: &mut Task) -> Result<(), DecodeAnomaly> {
    task.start = DateValue::parse(cell);
    if task.start.is_valid() {
        Ok(())
    } else {
        Err(DecodeAnomaly::InvalidDate(cell.to_string()))
    }
}

fn decode_end(cell: &str, task: &mut Task) -> Result<(), DecodeAnomaly> {
    let end = DateValue::parse(cell);
    let valid = end.is_valid();
    task.end = Some(end);
    if valid {
        Ok(())
    } else {
        Err(DecodeAnomaly::InvalidDate(cell.to_string()))
    }
}

fn decode_duration(cell: &str, task: &mut Task) -> Result<(), DecodeAnomaly> {
    task.duration = parse_leading_int(cell);
    match task.duration {
        Some(_) => Ok(()),
        None => Err(DecodeAnomaly::InvalidInteger(cell.to_string())),
    }
}

fn decode_progress(cell: &str, task: &mut Task) -> Result<(), DecodeAnomaly> {
    task.progress = parse_float(cell);
    match task.progress {
        Some(_) => Ok(()),
        None => Err(DecodeAnomaly::InvalidNumber(cell.to_string())),
    }
}

fn decode_parent(cell: &str, task: &mut Task) -> Result<(), DecodeAnomaly> {
    task.parent = Some(TaskId::new(cell));
    Ok(())
}

fn decode_type(cell: &str, task: &mut Task) -> Result<(), DecodeAnomaly> {
    task.task_type = TaskType::parse(cell);
    Ok(())
}

fn encode_id(task: &Task) -> String {
    task.id.to_string()
}

fn encode_text(task: &Task) -> String {
    task.text.clone()
}

fn encode_start(task: &Task) -> String {
    task.start.to_string()
}

fn encode_end(task: &Task) -> String {
    task.end.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn encode_duration(task: &Task) -> String {
    task.duration.map(|days| days.to_string()).unwrap_or_default()
}

fn encode_progress(task: &Task) -> String {
    task.progress.map(format_number).unwrap_or_default()
}

fn encode_parent(task: &Task) -> String {
    task.parent.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn encode_type(task: &Task) -> String {
    task.task_type.as_str().to_string()
}

/// Accepts `YYYY-MM-DD`, or an RFC 3339 timestamp reduced to its UTC date.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Base-10 integer from the leading digits of `text`, after optional
/// whitespace and sign. Anything after the digits is ignored, so `"5.9"` is 5.
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    let magnitude = rest[..end].parse::<i64>().ok()?;
    if negative {
        magnitude.checked_neg()
    } else {
        Some(magnitude)
    }
}

/// Decimal number read from the longest numeric prefix of `text`, after
/// leading whitespace: `"0.5 done"` is 0.5 and `"50%"` is 50. An exponent is
/// only taken when digits follow it. Non-finite values are rejected.
pub fn parse_float(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let digits_from = |mut idx: usize| {
        while bytes.get(idx).is_some_and(u8::is_ascii_digit) {
            idx += 1;
        }
        idx
    };

    let mut end = match bytes.first() {
        Some(b'+' | b'-') => 1,
        _ => 0,
    };
    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        has_digits |= frac_end > end + 1;
        if has_digits {
            end = frac_end;
        }
    }
    if !has_digits {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    trimmed[..end]
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Shortest decimal text that reads back as the same value (`1`, `0.5`).
pub fn format_number(value: f64) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn columns_are_in_canonical_order() {
        let names: Vec<&str> = header().collect();
        assert_eq!(
            names,
            vec!["id", "text", "start", "end", "duration", "progress", "parent", "type"]
        );
        assert_eq!(Column::from_name("parent"), Some(Column::Parent));
        assert_eq!(Column::from_name("Parent"), None);
    }

    #[test]
    fn only_parent_and_type_are_optional() {
        let optional: Vec<Column> = COLUMNS
            .iter()
            .filter(|spec| spec.presence == Presence::Optional)
            .map(|spec| spec.column)
            .collect();
        assert_eq!(optional, vec![Column::Parent, Column::Type]);
    }

    #[test]
    fn leading_int_ignores_trailing_text() {
        assert_eq!(parse_leading_int("5.9"), Some(5));
        assert_eq!(parse_leading_int("  7 days"), Some(7));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("+4"), Some(4));
        assert_eq!(parse_leading_int("0x10"), Some(0));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
    }

    #[test]
    fn float_reads_the_longest_numeric_prefix() {
        assert_eq!(parse_float("0.5"), Some(0.5));
        assert_eq!(parse_float(" 1 "), Some(1.0));
        assert_eq!(parse_float("1e-1"), Some(0.1));
        assert_eq!(parse_float("0.5abc"), Some(0.5));
        assert_eq!(parse_float("50%"), Some(50.0));
        assert_eq!(parse_float("1e-1x"), Some(0.1));
        assert_eq!(parse_float("2e"), Some(2.0));
        assert_eq!(parse_float(".25"), Some(0.25));
        assert_eq!(parse_float("3."), Some(3.0));
        assert_eq!(parse_float("-0.5"), Some(-0.5));
        assert_eq!(parse_float("1e999"), None);
        assert_eq!(parse_float("NaN"), None);
        assert_eq!(parse_float("Infinity"), None);
        assert_eq!(parse_float("."), None);
        assert_eq!(parse_float("-"), None);
        assert_eq!(parse_float("done"), None);
        assert_eq!(parse_float(""), None);
    }

    #[test]
    fn dates_accept_calendar_and_timestamp_forms() {
        assert_eq!(parse_date("2024-01-05"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date("2024-01-05T00:00:00.000Z"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date("2024-01-05T23:30:00-02:00"), Some(d(2024, 1, 6)));
        assert_eq!(parse_date("05/01/2024"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(format_date(d(2024, 1, 5)), "2024-01-05");
    }

    #[test]
    fn empty_cells_follow_column_defaults() {
        let mut task = Task::blank();
        for spec in &COLUMNS {
            let result = spec.decode("", &mut task);
            match spec.default {
                DefaultPolicy::Sentinel => assert_eq!(result, Err(DecodeAnomaly::Missing)),
                _ => assert_eq!(result, Ok(())),
            }
        }
        assert_eq!(task.task_type, TaskType::Task);
        assert!(task.parent.is_none());
        assert!(task.end.is_none());
        assert!(task.duration.is_none());
        assert!(task.progress.is_none());
        assert!(!task.start.is_valid());
    }

    #[test]
    fn numbers_encode_in_natural_form() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(0.25), "0.25");
    }
}
