use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use claimflow_cli::commands::export::ExportArgs;
use claimflow_cli::commands::{config, dashboard, demo, export, import};
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn demo_seeds_reference_users_and_claims() {
    with_env(&[], || {
        let result = demo::run(None);
        assert_eq!(result.exit_code, 0, "expected demo seeding to succeed");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "demo");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["users"].as_array().map(Vec::len), Some(4));
        assert_eq!(payload["data"]["stats"]["total"], 4);
        assert_eq!(payload["data"]["stats"]["pending"], 1);
        assert_eq!(payload["data"]["stats"]["under_review"], 2);
        assert_eq!(payload["data"]["stats"]["approved"], 1);
        assert_eq!(payload["data"]["stats"]["rejected"], 0);
        assert!(payload["data"]["export_path"].is_null());
    });
}

#[test]
fn demo_writes_combined_backup_when_asked() {
    let dir = TempDir::new().expect("temp dir");
    with_env(&[], || {
        let result = demo::run(Some(dir.path()));
        assert_eq!(result.exit_code, 0, "expected demo backup to succeed");

        let payload = parse_payload(&result.output);
        let path = payload["data"]["export_path"].as_str().expect("export path");
        let contents = fs::read_to_string(path).expect("backup file");
        assert!(contents.starts_with("USERS\n"));
        assert!(contents.contains("\nCLAIMS\n"));
        assert!(contents.contains("JMhr@work.com"));
    });
}

#[test]
fn dashboard_shows_administrator_queue_and_oversight() {
    with_env(&[], || {
        let result = dashboard::run("ASadmin@work.com");
        assert_eq!(result.exit_code, 0, "expected dashboard to render");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "dashboard");
        assert_eq!(payload["data"]["display_name"], "Adam Sandler");
        assert_eq!(payload["data"]["review_queue"].as_array().map(Vec::len), Some(1));
        assert_eq!(payload["data"]["review_queue"][0]["title"], "Exam marking");
        assert_eq!(payload["data"]["oversight"]["total_users"], 4);
        assert_eq!(payload["data"]["oversight"]["hr_pending"], 0);
    });
}

#[test]
fn dashboard_for_lecturer_has_no_review_queue() {
    with_env(&[], || {
        let result = dashboard::run("jdlecturer@work.com");
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["claims"].as_array().map(Vec::len), Some(4));
        assert_eq!(payload["data"]["review_queue"].as_array().map(Vec::len), Some(0));
        assert!(payload["data"]["oversight"].is_null());
    });
}

#[test]
fn dashboard_rejects_unknown_email() {
    with_env(&[], || {
        let result = dashboard::run("nobody@work.com");
        assert_eq!(result.exit_code, 5);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "not_found");
    });
}

#[test]
fn export_writes_filtered_claims_with_configured_prefix() {
    let dir = TempDir::new().expect("temp dir");
    with_env(&[("CLAIMFLOW_EXPORT_FILE_PREFIX", "nightly")], || {
        let args = ExportArgs { status: "approved".to_string(), ..ExportArgs::default() };
        let result = export::run(&args, dir.path());
        assert_eq!(result.exit_code, 0, "expected export to succeed: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["rows"], 1);
        let path = PathBuf::from(payload["data"]["path"].as_str().expect("export path"));
        let file_name = path.file_name().and_then(|name| name.to_str()).expect("file name");
        assert!(file_name.starts_with("nightly_"), "unexpected file name {file_name}");
        assert!(file_name.ends_with(".csv"));

        let contents = fs::read_to_string(&path).expect("export file");
        let mut lines = contents.lines();
        assert!(lines.next().expect("header").starts_with("Id,Title,Description,LecturerName"));
        let row = lines.next().expect("approved row");
        assert!(row.contains("Monthly Report"));
        assert!(row.contains(",Approved,"));
    });
}

#[test]
fn export_rejects_unknown_status() {
    let dir = TempDir::new().expect("temp dir");
    with_env(&[], || {
        let args = ExportArgs { status: "paid".to_string(), ..ExportArgs::default() };
        let result = export::run(&args, dir.path());
        assert_eq!(result.exit_code, 5);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "validation");
    });
}

#[test]
fn import_creates_claims_from_new_rows_only() {
    let dir = TempDir::new().expect("temp dir");
    let file = dir.path().join("claims.csv");
    fs::write(
        &file,
        "Id,Title,Description,LecturerName,HoursWorked,HourlyRate,TotalAmount,Status\n\
         0,Marking,Exam scripts,,3,300,900,Pending\n\
         5,Existing,Already stored,John Doe,1,1,1,Approved\n",
    )
    .expect("write csv");
    let out = dir.path().join("out");

    with_env(&[("CLAIMFLOW_IMPORT_PLACEHOLDER_LECTURER", "Visiting Lecturer")], || {
        let result = import::run(&file, Some(&out));
        assert_eq!(result.exit_code, 0, "expected import to succeed: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["imported"], 1);
        assert_eq!(payload["data"]["skipped"], 1);

        let path = payload["data"]["export_path"].as_str().expect("export path");
        let contents = fs::read_to_string(path).expect("re-export");
        let row = contents.lines().nth(1).expect("imported row");
        assert!(row.starts_with("1,Marking,Exam scripts,Visiting Lecturer,"));
        assert!(row.contains(",Pending,"));
    });
}

#[test]
fn import_rejects_files_without_csv_extension() {
    let dir = TempDir::new().expect("temp dir");
    let file = dir.path().join("claims.txt");
    fs::write(&file, "Id,Title\n").expect("write file");

    with_env(&[], || {
        let result = import::run(&file, None);
        assert_eq!(result.exit_code, 5);
        assert_eq!(parse_payload(&result.output)["error_class"], "validation");
    });
}

#[test]
fn import_reports_io_failure_for_missing_file() {
    let dir = TempDir::new().expect("temp dir");
    let file = dir.path().join("missing.csv");

    with_env(&[], || {
        let result = import::run(&file, None);
        assert_eq!(result.exit_code, 4);
        assert_eq!(parse_payload(&result.output)["error_class"], "io");
    });
}

#[test]
fn config_reports_env_sources() {
    with_env(&[("CLAIMFLOW_LOG_LEVEL", "warn")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let message = payload["message"].as_str().expect("config listing");
        assert!(message.contains("- logging.level = warn (source: env (CLAIMFLOW_LOG_LEVEL))"));
        assert!(message.contains("- export.file_prefix = claims_export (source: default)"));
    });
}

#[test]
fn commands_fail_with_config_exit_code_on_invalid_settings() {
    with_env(&[("CLAIMFLOW_LOGGING_LEVEL", "verbose")], || {
        for result in [config::run(), demo::run(None)] {
            assert_eq!(result.exit_code, 2);
            let payload = parse_payload(&result.output);
            assert_eq!(payload["error_class"], "config_validation");
        }
    });
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "CLAIMFLOW_IMPORT_PLACEHOLDER_LECTURER",
        "CLAIMFLOW_IMPORT_REQUIRE_CSV_EXTENSION",
        "CLAIMFLOW_EXPORT_FILE_PREFIX",
        "CLAIMFLOW_LOGGING_LEVEL",
        "CLAIMFLOW_LOGGING_FORMAT",
        "CLAIMFLOW_LOG_LEVEL",
        "CLAIMFLOW_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid json")
}
