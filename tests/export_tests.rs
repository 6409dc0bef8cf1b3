use chrono::{NaiveDate, TimeZone, Utc};
use gantt_csv::{
    DateValue, EXPORT_CONTENT_TYPE, ExportArtifact, Task, TaskId, TaskType, export_tasks_to_path,
    export_tasks_to_string,
};
use tempfile::{NamedTempFile, tempdir};

const HEADER: &str = "id,text,start,end,duration,progress,parent,type";

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn design_task() -> Task {
    let mut task = Task::new("1", "Design", d(2024, 1, 1));
    task.end = Some(d(2024, 1, 5).into());
    task.duration = Some(4);
    task.progress = Some(0.5);
    task.task_type = TaskType::Project;
    task
}

fn lines(content: &str) -> Vec<&str> {
    content.lines().collect()
}

#[test]
fn writes_canonical_header_and_row() {
    let csv = export_tasks_to_string(&[design_task()]).unwrap();
    assert_eq!(
        lines(&csv),
        vec![HEADER, "1,Design,2024-01-01,2024-01-05,4,0.5,,project"]
    );
}

#[test]
fn empty_collection_writes_only_the_header() {
    let csv = export_tasks_to_string(&[]).unwrap();
    assert_eq!(lines(&csv), vec![HEADER]);
}

#[test]
fn absent_fields_still_emit_every_column() {
    let task = Task::new("7", "Open ended", d(2024, 3, 1));
    let csv = export_tasks_to_string(&[task]).unwrap();
    let row = lines(&csv)[1];
    assert_eq!(row, "7,Open ended,2024-03-01,,,,,task");
    assert_eq!(row.split(',').count(), 8);
}

#[test]
fn parent_reference_and_custom_type_round_out_the_row() {
    let mut task = Task::new("2", "Interviews", d(2024, 1, 2));
    task.parent = Some(TaskId::new("1"));
    task.duration = Some(3);
    task.progress = Some(1.0);
    task.task_type = TaskType::parse("review");
    let csv = export_tasks_to_string(&[task]).unwrap();
    assert_eq!(lines(&csv)[1], "2,Interviews,2024-01-02,,3,1,1,review");
}

#[test]
fn raw_dates_pass_through_verbatim() {
    let mut task = Task::new("3", "Foreign", DateValue::Raw("next week".into()));
    task.end = Some(DateValue::Raw("TBD".into()));
    let csv = export_tasks_to_string(&[task]).unwrap();
    assert_eq!(lines(&csv)[1], "3,Foreign,next week,TBD,,,,task");
}

#[test]
fn out_of_range_progress_is_not_clamped() {
    let mut task = design_task();
    task.progress = Some(1.25);
    task.duration = Some(-2);
    let csv = export_tasks_to_string(&[task]).unwrap();
    assert_eq!(
        lines(&csv)[1],
        "1,Design,2024-01-01,2024-01-05,-2,1.25,,project"
    );
}

#[test]
fn text_needing_quotes_is_quoted() {
    let mut task = design_task();
    task.text = "Design, \"final\"".into();
    let csv = export_tasks_to_string(&[task]).unwrap();
    assert_eq!(
        lines(&csv)[1],
        "1,\"Design, \"\"final\"\"\",2024-01-01,2024-01-05,4,0.5,,project"
    );
}

#[test]
fn rows_follow_collection_order() {
    let tasks: Vec<Task> = ["c", "a", "b"]
        .iter()
        .map(|id| Task::new(*id, id.to_uppercase(), d(2024, 1, 1)))
        .collect();
    let csv = export_tasks_to_string(&tasks).unwrap();
    let ids: Vec<&str> = lines(&csv)
        .iter()
        .skip(1)
        .map(|row| row.split(',').next().unwrap())
        .collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}

#[test]
fn artifact_is_named_after_generation_time() {
    let generated_at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
    let artifact = ExportArtifact::from_tasks(&[design_task()], generated_at).unwrap();
    assert_eq!(artifact.file_name, "gantt-export-1700000000123.csv");
    assert_eq!(artifact.content_type, EXPORT_CONTENT_TYPE);
    assert_eq!(artifact.row_count, 1);
    assert!(artifact.content.starts_with(HEADER));

    let dir = tempdir().unwrap();
    let path = artifact.write_to_dir(dir.path()).unwrap();
    assert_eq!(path, dir.path().join("gantt-export-1700000000123.csv"));
    assert_eq!(std::fs::read_to_string(path).unwrap(), artifact.content);
}

#[test]
fn writes_to_a_file() {
    let file = NamedTempFile::new().unwrap();
    export_tasks_to_path(&[design_task()], file.path()).unwrap();
    let written = std::fs::read_to_string(file.path()).unwrap();
    assert_eq!(lines(&written).len(), 2);
}

#[test]
fn empty_type_tag_exports_as_default() {
    assert_eq!(TaskType::parse(""), TaskType::Task);

    let mut task = Task::new("4", "Untyped", d(2024, 2, 1));
    task.task_type = TaskType::Other(String::new());
    let csv = export_tasks_to_string(&[task]).unwrap();
    assert_eq!(lines(&csv)[1], "4,Untyped,2024-02-01,,,,,task");
}
