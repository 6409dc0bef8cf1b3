pub mod export;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod import;
pub mod schema;
pub mod session;
pub mod task;
pub mod timeline;

pub use export::{
    EXPORT_CONTENT_TYPE, ExportArtifact, ExportError, export_tasks, export_tasks_to_path,
    export_tasks_to_string,
};
pub use import::{
    FieldAnomaly, ImportError, ImportOutcome, RowError, import_tasks, import_tasks_from_path,
    import_tasks_from_str,
};
pub use schema::{COLUMNS, Column, DEFAULT_TASK_TYPE, DecodeAnomaly};
pub use session::{Session, TimelineView};
pub use task::{DateValue, Task, TaskId, TaskType};
pub use timeline::{
    InMemoryTimeline, Scale, TaskEdit, TaskEvent, TimelineConfig, TimelineEngine, TimelineError,
};
