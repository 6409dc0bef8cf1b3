use crate::schema;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Identifier of a task. Ids are opaque text; uniqueness is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Serialize for TaskId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Timeline engines hand ids back as numbers as often as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseId {
    Text(String),
    Integer(i64),
    Number(f64),
}

impl LooseId {
    fn into_text(self) -> String {
        match self {
            LooseId::Text(text) => text,
            LooseId::Integer(value) => value.to_string(),
            LooseId::Number(value) => schema::format_number(value),
        }
    }

    /// Zero, like the empty string, marks a root task in engine payloads.
    fn is_root_marker(&self) -> bool {
        match self {
            LooseId::Text(text) => text.is_empty(),
            LooseId::Integer(value) => *value == 0,
            LooseId::Number(value) => *value == 0.0,
        }
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        LooseId::deserialize(deserializer).map(|id| Self(id.into_text()))
    }
}

/// Kind of timeline item. The vocabulary is open: unknown tags are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskType {
    Task,
    Project,
    Milestone,
    Other(String),
}

impl TaskType {
    pub fn parse(value: &str) -> Self {
        match value {
            "task" => TaskType::Task,
            "project" => TaskType::Project,
            "milestone" => TaskType::Milestone,
            "" => TaskType::default(),
            other => TaskType::Other(other.to_string()),
        }
    }

    /// Never empty: an empty `Other` tag reads as the default type.
    pub fn as_str(&self) -> &str {
        match self {
            TaskType::Task => "task",
            TaskType::Project => "project",
            TaskType::Milestone => "milestone",
            TaskType::Other(other) if other.is_empty() => schema::DEFAULT_TASK_TYPE,
            TaskType::Other(other) => other,
        }
    }
}

impl Default for TaskType {
    fn default() -> Self {
        TaskType::parse(schema::DEFAULT_TASK_TYPE)
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TaskType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(match value.as_deref() {
            None | Some("") => TaskType::default(),
            Some(tag) => TaskType::parse(tag),
        })
    }
}

/// A calendar date as carried by a task.
///
/// `Raw` holds text that did not pass the shared date rule: either a cell that
/// failed to decode on import or a foreign value handed back by the timeline
/// engine. It is written back verbatim on export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateValue {
    Date(NaiveDate),
    Raw(String),
}

impl DateValue {
    pub fn parse(text: &str) -> Self {
        match schema::parse_date(text) {
            Some(date) => DateValue::Date(date),
            None => DateValue::Raw(text.to_string()),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, DateValue::Date(_))
    }
}

impl Default for DateValue {
    fn default() -> Self {
        DateValue::Raw(String::new())
    }
}

impl From<NaiveDate> for DateValue {
    fn from(value: NaiveDate) -> Self {
        DateValue::Date(value)
    }
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateValue::Date(date) => f.write_str(&schema::format_date(*date)),
            DateValue::Raw(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for DateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(DateValue::parse(&text))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub start: DateValue,
    #[serde(default, deserialize_with = "de::optional_date")]
    pub end: Option<DateValue>,
    /// Whole days. `None` means the source value was not a number.
    #[serde(default, deserialize_with = "de::duration")]
    pub duration: Option<i64>,
    /// Completion fraction, nominally 0..=1. `None` means not a number.
    #[serde(default, deserialize_with = "de::progress")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de::parent")]
    pub parent: Option<TaskId>,
    #[serde(rename = "type", default)]
    pub task_type: TaskType,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, text: impl Into<String>, start: impl Into<DateValue>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            start: start.into(),
            end: None,
            duration: None,
            progress: None,
            parent: None,
            task_type: TaskType::default(),
        }
    }

    /// Starting point for the row decoder; every column overwrites its field.
    pub(crate) fn blank() -> Self {
        Self::new(TaskId::new(""), "", DateValue::default())
    }
}

mod de {
    use super::{DateValue, LooseId, TaskId};
    use crate::schema;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LooseNumber {
        Integer(i64),
        Float(f64),
        Text(String),
    }

    pub(super) fn optional_date<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateValue>, D::Error> {
        let text = Option::<String>::deserialize(deserializer)?;
        Ok(text
            .filter(|text| !text.is_empty())
            .map(|text| DateValue::parse(&text)))
    }

    pub(super) fn duration<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        Ok(match Option::<LooseNumber>::deserialize(deserializer)? {
            None => None,
            Some(LooseNumber::Integer(value)) => Some(value),
            Some(LooseNumber::Float(value)) => {
                schema::parse_leading_int(&schema::format_number(value))
            }
            Some(LooseNumber::Text(text)) => schema::parse_leading_int(&text),
        })
    }

    pub(super) fn progress<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<LooseNumber>::deserialize(deserializer)? {
            None => None,
            Some(LooseNumber::Integer(value)) => Some(value as f64),
            Some(LooseNumber::Float(value)) => Some(value).filter(|v| v.is_finite()),
            Some(LooseNumber::Text(text)) => schema::parse_float(&text),
        })
    }

    pub(super) fn parent<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<TaskId>, D::Error> {
        let id = Option::<LooseId>::deserialize(deserializer)?;
        Ok(id
            .filter(|id| !id.is_root_marker())
            .map(|id| TaskId::new(id.into_text())))
    }
}
