use crate::export::{ExportArtifact, ExportResult};
use crate::import::{self, ImportOutcome, ImportResult};
use crate::task::Task;
use crate::timeline::{
    InMemoryTimeline, Scale, TaskEdit, TaskEvent, TimelineConfig, TimelineEngine, TimelineError,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io;
use tracing::{debug, info, warn};

/// What the engine is currently showing, with its display configuration.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineView {
    pub tasks: Vec<Task>,
    pub links: Vec<serde_json::Value>,
    pub scales: Vec<Scale>,
}

/// State of one user session: the loaded collection, the engine showing it,
/// the uploaded file name and the last user-visible error.
pub struct Session<E = InMemoryTimeline> {
    engine: E,
    config: TimelineConfig,
    tasks: Vec<Task>,
    file_name: Option<String>,
    error: Option<String>,
}

impl Session<InMemoryTimeline> {
    pub fn new() -> Self {
        Self::with_engine(InMemoryTimeline::new(), TimelineConfig::default())
    }
}

impl Default for Session<InMemoryTimeline> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: TimelineEngine> Session<E> {
    pub fn with_engine(engine: E, config: TimelineConfig) -> Self {
        Self {
            engine,
            config,
            tasks: Vec::new(),
            file_name: None,
            error: None,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The collection as imported, before any engine edits.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn timeline_config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Takes effect immediately when tasks are on display.
    pub fn set_timeline_config(&mut self, config: TimelineConfig) {
        self.config = config;
        if self.engine.is_ready() {
            let current = self.engine.snapshot();
            self.engine.mount(current, &self.config);
        }
    }

    pub fn timeline_view(&self) -> TimelineView {
        TimelineView {
            tasks: self.engine.snapshot(),
            links: self.config.links.clone(),
            scales: self.config.scales.clone(),
        }
    }

    /// Decodes an uploaded file and, on success, replaces the current
    /// collection. A source that cannot be read leaves the previous
    /// collection in place and sets the user-visible error.
    pub fn import<R: io::Read>(
        &mut self,
        file_name: impl Into<String>,
        source: R,
    ) -> ImportResult<ImportOutcome> {
        let file_name = file_name.into();
        info!(file = %file_name, "importing csv");
        self.file_name = Some(file_name);
        match import::import_tasks(source) {
            Ok(outcome) => {
                self.tasks = outcome.tasks.clone();
                self.engine.mount(outcome.tasks.clone(), &self.config);
                self.error = None;
                Ok(outcome)
            }
            Err(err) => {
                warn!(%err, "csv import failed");
                self.error = Some(format!("Error reading CSV file: {err}"));
                Err(err)
            }
        }
    }

    pub fn clear(&mut self) {
        debug!(tasks = self.tasks.len(), "clearing session");
        self.tasks.clear();
        self.engine.unmount();
        self.file_name = None;
        self.error = None;
    }

    /// Forwards an edit to the engine. Events are only observed, not checked.
    pub fn apply(&mut self, edit: TaskEdit) -> Result<TaskEvent, TimelineError> {
        let event = self.engine.apply(edit)?;
        match &event {
            TaskEvent::Added(task) => info!(task_id = %task.id, "timeline task added"),
            TaskEvent::Updated(task) => info!(task_id = %task.id, "timeline task updated"),
            TaskEvent::Deleted(id) => info!(task_id = %id, "timeline task deleted"),
        }
        Ok(event)
    }

    pub fn can_export(&self) -> bool {
        self.engine.is_ready() && !self.tasks.is_empty()
    }

    /// Serializes the engine's current tasks. Returns `Ok(None)` without
    /// reporting anything when nothing is loaded or the engine is idle.
    pub fn export_csv(&self, generated_at: DateTime<Utc>) -> ExportResult<Option<ExportArtifact>> {
        if !self.can_export() {
            debug!("export requested with nothing loaded");
            return Ok(None);
        }
        let snapshot = self.engine.snapshot();
        ExportArtifact::from_tasks(&snapshot, generated_at).map(Some)
    }
}
