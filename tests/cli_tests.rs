#![cfg(feature = "cli_api")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::tempdir;

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.write_stdin(script.to_string()).assert()
}

fn escaped(path: &std::path::Path) -> String {
    path.to_string_lossy().replace('\\', "\\\\")
}

#[test]
fn cli_exports_nothing_before_import() {
    run_cli("export\nquit\n")
        .success()
        .stdout(str_contains("Nothing to export."));
}

#[test]
fn cli_imports_sample_and_exports_to_directory() {
    let dir = tempdir().expect("create temp dir");
    let sample = dir.path().join("sample.csv");
    let script = format!(
        "sample {sample}\nimport {sample}\nexport {out}\nquit\n",
        sample = escaped(&sample),
        out = escaped(dir.path()),
    );
    run_cli(&script)
        .success()
        .stdout(str_contains("Imported 7 tasks from"))
        .stdout(str_contains("Exported 7 tasks to"));

    let exported: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .starts_with("gantt-export-")
        })
        .collect();
    assert_eq!(exported.len(), 1);
    let content = std::fs::read_to_string(exported[0].path()).unwrap();
    assert_eq!(
        content.lines().next(),
        Some("id,text,start,end,duration,progress,parent,type")
    );
    assert_eq!(content.lines().count(), 8);
}

#[test]
fn cli_progress_edit_shows_in_table() {
    let dir = tempdir().expect("create temp dir");
    let sample = dir.path().join("sample.csv");
    let script = format!(
        "sample {sample}\nimport {sample}\nprogress 2 0.75\nquit\n",
        sample = escaped(&sample),
    );
    run_cli(&script)
        .success()
        .stdout(str_contains("Task 2 updated."))
        .stdout(str_contains("0.75"));
}

#[test]
fn cli_clear_disables_export() {
    let dir = tempdir().expect("create temp dir");
    let sample = dir.path().join("sample.csv");
    let script = format!(
        "sample {sample}\nimport {sample}\nclear\nexport {out}\nquit\n",
        sample = escaped(&sample),
        out = escaped(dir.path()),
    );
    run_cli(&script)
        .success()
        .stdout(str_contains("Data cleared."))
        .stdout(str_contains("Nothing to export."));
}

#[test]
fn cli_reports_missing_file() {
    run_cli("import /definitely/not/here.csv\nquit\n")
        .success()
        .stdout(str_contains("Error reading /definitely/not/here.csv"));
}

#[test]
fn cli_rejects_unknown_command() {
    run_cli("frobnicate\nquit\n")
        .success()
        .stdout(str_contains("Unknown command. Type 'help'."));
}
