use gantt_csv::{
    Task, export_tasks_to_path, export_tasks_to_string, import_tasks_from_path,
    import_tasks_from_str, schema::SAMPLE_CSV,
};
use serde_json::json;
use tempfile::NamedTempFile;

const HEADER: &str = "id,text,start,end,duration,progress,parent,type";

fn round_trip(csv: &str) -> String {
    let outcome = import_tasks_from_str(csv).unwrap();
    export_tasks_to_string(&outcome.tasks).unwrap()
}

fn data_rows(csv: &str) -> Vec<String> {
    csv.lines().skip(1).map(ToOwned::to_owned).collect()
}

#[test]
fn design_row_survives_import_and_export() {
    let csv = format!("{HEADER}\n1,Design,2024-01-01,2024-01-05,4,0.5,,project\n");
    let exported = round_trip(&csv);
    assert_eq!(
        exported.lines().collect::<Vec<_>>(),
        vec![HEADER, "1,Design,2024-01-01,2024-01-05,4,0.5,,project"]
    );
}

#[test]
fn canonical_sample_is_reproduced_row_for_row() {
    let exported = round_trip(SAMPLE_CSV);
    assert_eq!(data_rows(&exported), data_rows(SAMPLE_CSV));
    assert_eq!(exported.lines().next(), Some(HEADER));
}

#[test]
fn defaults_are_written_back_explicitly() {
    let csv = "id,text,start,end,duration,progress\n5,Review,2024-04-01,2024-04-02,1,0\n";
    let exported = round_trip(csv);
    assert_eq!(
        data_rows(&exported),
        vec!["5,Review,2024-04-01,2024-04-02,1,0,,task"]
    );
}

#[test]
fn numeric_text_round_trips_by_value() {
    let csv = format!("{HEADER}\n1,A,2024-01-01,2024-01-03,02,0.50,,task\n");
    let exported = round_trip(&csv);
    let row = &data_rows(&exported)[0];
    let cells: Vec<&str> = row.split(',').collect();
    assert_eq!(&cells[..4], &["1", "A", "2024-01-01", "2024-01-03"]);
    assert_eq!(cells[4].parse::<i64>().unwrap(), 2);
    assert_eq!(cells[5].parse::<f64>().unwrap(), 0.5);
}

#[test]
fn row_order_is_preserved_for_many_rows() {
    let ids: Vec<String> = (0..40).map(|i| ((i * 17) % 40).to_string()).collect();
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for id in &ids {
        csv.push_str(&format!("{id},Task {id},2024-05-01,,1,0,,task\n"));
    }

    let outcome = import_tasks_from_str(&csv).unwrap();
    let imported: Vec<&str> = outcome.tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(imported, ids.iter().map(String::as_str).collect::<Vec<_>>());

    let exported = export_tasks_to_string(&outcome.tasks).unwrap();
    let exported_ids: Vec<String> = data_rows(&exported)
        .iter()
        .map(|row| row.split(',').next().unwrap().to_string())
        .collect();
    assert_eq!(exported_ids, ids);
}

#[test]
fn invalid_cells_stay_invalid_after_a_round_trip() {
    let csv = format!("{HEADER}\n1,A,someday,,n/a,lots,,task\n");
    let first = round_trip(&csv);
    assert_eq!(data_rows(&first), vec!["1,A,someday,,,,,task"]);

    let second = round_trip(&first);
    assert_eq!(second, first);
}

#[test]
fn file_round_trip_preserves_tasks() {
    let source = NamedTempFile::new().unwrap();
    std::fs::write(source.path(), SAMPLE_CSV).unwrap();
    let imported = import_tasks_from_path(source.path()).unwrap().tasks;

    let target = NamedTempFile::new().unwrap();
    export_tasks_to_path(&imported, target.path()).unwrap();
    let reloaded = import_tasks_from_path(target.path()).unwrap().tasks;

    assert_eq!(imported, reloaded);
}

#[test]
fn engine_payloads_export_in_canonical_form() {
    let payload = json!([
        {
            "id": 7,
            "text": "Kickoff",
            "start": "2024-03-01T00:00:00.000Z",
            "end": "2024-03-04T00:00:00.000Z",
            "duration": 3,
            "progress": 0.25,
            "parent": 0,
            "type": "",
            "$level": 1,
            "open": true
        },
        {
            "id": "8",
            "text": "Follow-up",
            "start": "2024-03-05",
            "end": null,
            "duration": 2.0,
            "progress": 1,
            "parent": 7,
            "type": "milestone"
        }
    ]);
    let tasks: Vec<Task> = serde_json::from_value(payload).unwrap();
    let exported = export_tasks_to_string(&tasks).unwrap();
    assert_eq!(
        data_rows(&exported),
        vec![
            "7,Kickoff,2024-03-01,2024-03-04,3,0.25,,task",
            "8,Follow-up,2024-03-05,,2,1,7,milestone",
        ]
    );
}

#[test]
fn task_json_round_trip_matches_decoded_model() {
    let csv = format!("{HEADER}\n1,Design,2024-01-01,2024-01-05,4,0.5,,project\n");
    let tasks = import_tasks_from_str(&csv).unwrap().tasks;
    let json = serde_json::to_string(&tasks).unwrap();
    let decoded: Vec<Task> = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, tasks);
}
