use gantt_csv::schema::{self, COLUMNS, SAMPLE_CSV};
use gantt_csv::{
    DateValue, ImportOutcome, Session, Task, TaskEdit, TaskId, TaskType, TimelineConfig,
    TimelineEngine,
};
use chrono::Utc;
use std::fs::{self, File};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

fn render_row(widths: &[usize], cells: &[&str]) -> String {
    let mut line = String::from("|");
    for (ci, cell) in cells.iter().enumerate() {
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(widths[ci].saturating_sub(cell.chars().count())));
        line.push_str(" |");
    }
    line
}

fn render_tasks_as_text_table(tasks: &[Task]) -> String {
    let col_names: Vec<&str> = schema::header().collect();
    let rows: Vec<Vec<String>> = tasks
        .iter()
        .map(|task| COLUMNS.iter().map(|spec| spec.encode(task)).collect())
        .collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.chars().count()).collect();
    for row in &rows {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::new();
    sep.push('+');
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&widths, &col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&render_row(&widths, &cells));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show current timeline tasks\n  status                             Show loaded file, task count and last error\n  import <path>                      Load tasks from a CSV file (replaces current tasks)\n  export [dir]                       Write gantt-export-<millis>.csv into dir (default .)\n  clear                              Discard loaded tasks\n  sample <path>                      Write the sample CSV file\n  add <id> <YYYY-MM-DD> <duration> <text...>\n                                     Add a task to the timeline\n  delete <id>                        Delete a task\n  text     <id> <text...>            Set label\n  start    <id> <YYYY-MM-DD>         Set start date\n  end      <id> <YYYY-MM-DD|->       Set or clear end date\n  duration <id> <days>               Set duration\n  progress <id> <float>              Set progress (0-1)\n  parent   <id> <parent_id|->        Set or clear parent\n  type     <id> <task|project|milestone|...>\n                                     Set type\n  timeline show                      Show timeline scales and links\n  timeline default                   Reset timeline config to month/day scales\n  timeline set <json_path>           Load timeline config from JSON file\n  timeline save <json_path>          Save timeline config to JSON file\n  quit|exit                          Exit"
    );
}

fn print_status(session: &Session) {
    println!("File               : {}", session.file_name().unwrap_or("-"));
    println!("Imported tasks     : {}", session.tasks().len());
    println!("Timeline tasks     : {}", session.engine().snapshot().len());
    println!("Export available   : {}", session.can_export());
    if let Some(error) = session.error() {
        println!("Error              : {}", error);
    }
}

fn print_timeline_config(config: &TimelineConfig) {
    for scale in &config.scales {
        println!(
            "Scale              : unit={} step={} format={}",
            scale.unit, scale.step, scale.format
        );
    }
    println!("Links              : {}", config.links.len());
}

fn print_import_report(outcome: &ImportOutcome) {
    for column in &outcome.missing_columns {
        println!("Warning: header is missing column '{}'.", column);
    }
    for err in &outcome.row_errors {
        println!("Skipped row: {}", err);
    }
    for anomaly in &outcome.anomalies {
        println!("Warning: {}", anomaly);
    }
}

/// Applies `edit` to a copy of task `id` and hands it back to the timeline.
fn update_task<F>(session: &mut Session, id: &str, edit: F)
where
    F: FnOnce(&mut Task),
{
    let Some(mut task) = session.engine().find(&TaskId::new(id)) else {
        println!("Task {} not found.", id);
        return;
    };
    edit(&mut task);
    match session.apply(TaskEdit::Update(task)) {
        Ok(_) => {
            println!("Task {} updated.", id);
            println!("{}", render_tasks_as_text_table(&session.engine().snapshot()));
        }
        Err(e) => println!("Error: {}", e),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let mut session = Session::new();

    println!("Gantt CSV (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => {
                println!("{}", render_tasks_as_text_table(&session.engine().snapshot()));
            }
            "status" => print_status(&session),
            "import" => match parts.next() {
                Some(path) => match File::open(path) {
                    Ok(file) => {
                        let name = std::path::Path::new(path)
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_else(|| path.to_string());
                        match session.import(name, file) {
                            Ok(outcome) => {
                                print_import_report(&outcome);
                                println!(
                                    "Imported {} tasks from {}.",
                                    outcome.tasks.len(),
                                    path
                                );
                                println!(
                                    "{}",
                                    render_tasks_as_text_table(&session.engine().snapshot())
                                );
                            }
                            Err(_) => {
                                println!("{}", session.error().unwrap_or("Import failed."));
                            }
                        }
                    }
                    Err(e) => println!("Error reading {}: {}", path, e),
                },
                None => println!("Usage: import <path>"),
            },
            "export" => {
                let dir = parts.next().unwrap_or(".");
                match session.export_csv(Utc::now()) {
                    Ok(Some(artifact)) => match artifact.write_to_dir(dir) {
                        Ok(path) => println!(
                            "Exported {} tasks to {}.",
                            artifact.row_count,
                            path.display()
                        ),
                        Err(e) => println!("Error writing export: {}", e),
                    },
                    Ok(None) => println!("Nothing to export."),
                    Err(e) => println!("Error exporting: {}", e),
                }
            }
            "clear" => {
                session.clear();
                println!("Data cleared.");
            }
            "sample" => match parts.next() {
                Some(path) => match fs::write(path, SAMPLE_CSV) {
                    Ok(_) => println!("Sample written to {}.", path),
                    Err(e) => println!("Error writing {}: {}", path, e),
                },
                None => println!("Usage: sample <path>"),
            },
            "add" => {
                let id_s = parts.next();
                let start_s = parts.next();
                let dur_s = parts.next();
                let text = parts.collect::<Vec<_>>().join(" ");
                match (id_s, start_s, dur_s) {
                    (Some(id), Some(start_s), Some(dur_s)) => {
                        let Some(start) = schema::parse_date(start_s) else {
                            println!("Invalid date (YYYY-MM-DD)");
                            continue;
                        };
                        let Some(duration) = schema::parse_leading_int(dur_s) else {
                            println!("Invalid duration");
                            continue;
                        };
                        let mut task = Task::new(id, text, start);
                        task.duration = Some(duration);
                        task.progress = Some(0.0);
                        match session.apply(TaskEdit::Add(task)) {
                            Ok(_) => {
                                println!("Task {} added.", id);
                                println!(
                                    "{}",
                                    render_tasks_as_text_table(&session.engine().snapshot())
                                );
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: add <id> <YYYY-MM-DD> <duration> <text...>"),
                }
            }
            "delete" => match parts.next() {
                Some(id) => match session.apply(TaskEdit::Delete(TaskId::new(id))) {
                    Ok(_) => {
                        println!("Deleted task {}.", id);
                        println!("{}", render_tasks_as_text_table(&session.engine().snapshot()));
                    }
                    Err(e) => println!("Error: {}", e),
                },
                None => println!("Usage: delete <id>"),
            },
            "text" => {
                let id_s = parts.next();
                let text = parts.collect::<Vec<_>>().join(" ");
                match id_s {
                    Some(id) => update_task(&mut session, id, |task| task.text = text),
                    None => println!("Usage: text <id> <text...>"),
                }
            }
            "start" | "end" => {
                let id_s = parts.next();
                let date_s = parts.next();
                match (id_s, date_s) {
                    (Some(id), Some("-")) if cmd == "end" => {
                        update_task(&mut session, id, |task| task.end = None)
                    }
                    (Some(id), Some(date_s)) => {
                        let Some(date) = schema::parse_date(date_s) else {
                            println!("Invalid date (YYYY-MM-DD)");
                            continue;
                        };
                        if cmd == "start" {
                            update_task(&mut session, id, |task| task.start = DateValue::Date(date))
                        } else {
                            update_task(&mut session, id, |task| {
                                task.end = Some(DateValue::Date(date))
                            })
                        }
                    }
                    _ => println!("Usage: {} <id> <YYYY-MM-DD>", cmd),
                }
            }
            "duration" => match (parts.next(), parts.next()) {
                (Some(id), Some(val_s)) => match schema::parse_leading_int(val_s) {
                    Some(days) => update_task(&mut session, id, |task| task.duration = Some(days)),
                    None => println!("Invalid duration"),
                },
                _ => println!("Usage: duration <id> <days>"),
            },
            "progress" => match (parts.next(), parts.next()) {
                (Some(id), Some(val_s)) => match schema::parse_float(val_s) {
                    Some(value) => {
                        update_task(&mut session, id, |task| task.progress = Some(value))
                    }
                    None => println!("Invalid float"),
                },
                _ => println!("Usage: progress <id> <float>"),
            },
            "parent" => match (parts.next(), parts.next()) {
                (Some(id), Some("-")) => update_task(&mut session, id, |task| task.parent = None),
                (Some(id), Some(parent)) => update_task(&mut session, id, |task| {
                    task.parent = Some(TaskId::new(parent))
                }),
                _ => println!("Usage: parent <id> <parent_id|->"),
            },
            "type" => match (parts.next(), parts.next()) {
                (Some(id), Some(tag)) => {
                    update_task(&mut session, id, |task| task.task_type = TaskType::parse(tag))
                }
                _ => println!("Usage: type <id> <task|project|milestone|...>"),
            },
            "timeline" => match parts.next() {
                Some("show") | None => print_timeline_config(session.timeline_config()),
                Some("default") => {
                    session.set_timeline_config(TimelineConfig::default());
                    println!("Timeline config reset to default.");
                    print_timeline_config(session.timeline_config());
                }
                Some("set") => match parts.next() {
                    Some(path) => match TimelineConfig::load_json(path) {
                        Ok(config) => {
                            session.set_timeline_config(config);
                            println!("Timeline config updated from {}.", path);
                            print_timeline_config(session.timeline_config());
                        }
                        Err(e) => println!("Error loading {}: {}", path, e),
                    },
                    None => println!("Usage: timeline set <json_path>"),
                },
                Some("save") => match parts.next() {
                    Some(path) => match session.timeline_config().save_json(path) {
                        Ok(_) => println!("Timeline config saved to {}.", path),
                        Err(e) => println!("Error writing {}: {}", path, e),
                    },
                    None => println!("Usage: timeline save <json_path>"),
                },
                Some(other) => {
                    println!("Unknown timeline command '{}'.", other);
                    println!("Usage: timeline show|default|set <json_path>|save <json_path>");
                }
            },
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}
