//! Boundary with the timeline engine that renders and edits tasks.

use crate::task::{Task, TaskId};
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeJsonError;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

/// One tier of the time axis, e.g. months over days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scale {
    pub unit: String,
    pub step: u32,
    pub format: String,
}

impl Scale {
    pub fn new(unit: impl Into<String>, step: u32, format: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            step,
            format: format.into(),
        }
    }
}

/// Display configuration handed to the engine alongside the tasks. The core
/// does not interpret it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineConfig {
    #[serde(default)]
    pub links: Vec<serde_json::Value>,
    #[serde(default = "TimelineConfig::default_scales")]
    pub scales: Vec<Scale>,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            links: Vec::new(),
            scales: Self::default_scales(),
        }
    }
}

#[derive(Debug)]
pub enum TimelineConfigError {
    Io(io::Error),
    Serialization(SerdeJsonError),
}

impl fmt::Display for TimelineConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimelineConfigError::Io(err) => write!(f, "io error: {err}"),
            TimelineConfigError::Serialization(err) => write!(f, "serialization error: {err}"),
        }
    }
}

impl std::error::Error for TimelineConfigError {}

impl From<io::Error> for TimelineConfigError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<SerdeJsonError> for TimelineConfigError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Serialization(value)
    }
}

impl TimelineConfig {
    fn default_scales() -> Vec<Scale> {
        vec![Scale::new("month", 1, "MMMM yyyy"), Scale::new("day", 1, "d")]
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, TimelineConfigError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), TimelineConfigError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

/// An edit made by the user inside the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEdit {
    Add(Task),
    Update(Task),
    Delete(TaskId),
}

/// Notification the engine reports back after applying an edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "task", rename_all = "snake_case")]
pub enum TaskEvent {
    Added(Task),
    Updated(Task),
    Deleted(TaskId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimelineError {
    NotReady,
    DuplicateId(TaskId),
    UnknownTask(TaskId),
}

impl fmt::Display for TimelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimelineError::NotReady => write!(f, "timeline has no tasks loaded"),
            TimelineError::DuplicateId(id) => write!(f, "task {id} already exists"),
            TimelineError::UnknownTask(id) => write!(f, "task {id} not found"),
        }
    }
}

impl std::error::Error for TimelineError {}

pub trait TimelineEngine {
    /// Replaces whatever the engine shows with `tasks`.
    fn mount(&mut self, tasks: Vec<Task>, config: &TimelineConfig);
    fn unmount(&mut self);
    fn is_ready(&self) -> bool;
    /// Current tasks in display order, edits included.
    fn snapshot(&self) -> Vec<Task>;
    fn apply(&mut self, edit: TaskEdit) -> Result<TaskEvent, TimelineError>;

    fn find(&self, id: &TaskId) -> Option<Task> {
        self.snapshot().into_iter().find(|task| &task.id == id)
    }
}

/// Headless engine that keeps tasks in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTimeline {
    tasks: Vec<Task>,
    config: TimelineConfig,
    ready: bool,
}

impl InMemoryTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| &task.id == id)
    }
}

impl TimelineEngine for InMemoryTimeline {
    fn mount(&mut self, tasks: Vec<Task>, config: &TimelineConfig) {
        // an empty collection is never rendered
        self.ready = !tasks.is_empty();
        self.tasks = tasks;
        self.config = config.clone();
    }

    fn unmount(&mut self) {
        self.tasks.clear();
        self.ready = false;
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn snapshot(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    fn apply(&mut self, edit: TaskEdit) -> Result<TaskEvent, TimelineError> {
        if !self.ready {
            return Err(TimelineError::NotReady);
        }
        match edit {
            TaskEdit::Add(task) => {
                if self.position(&task.id).is_some() {
                    return Err(TimelineError::DuplicateId(task.id));
                }
                self.tasks.push(task.clone());
                Ok(TaskEvent::Added(task))
            }
            TaskEdit::Update(task) => {
                let idx = self
                    .position(&task.id)
                    .ok_or_else(|| TimelineError::UnknownTask(task.id.clone()))?;
                self.tasks[idx] = task.clone();
                Ok(TaskEvent::Updated(task))
            }
            TaskEdit::Delete(id) => {
                let idx = self
                    .position(&id)
                    .ok_or_else(|| TimelineError::UnknownTask(id.clone()))?;
                self.tasks.remove(idx);
                Ok(TaskEvent::Deleted(id))
            }
        }
    }

    fn find(&self, id: &TaskId) -> Option<Task> {
        self.position(id).map(|idx| self.tasks[idx].clone())
    }
}
