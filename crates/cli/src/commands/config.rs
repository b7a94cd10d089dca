use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use toml::Value;

use crate::commands::{load_config, CommandResult};

/// Lists every effective setting together with where its value came from.
pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields: [(&str, &[&str], String); 5] = [
        (
            "import.placeholder_lecturer",
            &["CLAIMFLOW_IMPORT_PLACEHOLDER_LECTURER"],
            config.import.placeholder_lecturer.clone(),
        ),
        (
            "import.require_csv_extension",
            &["CLAIMFLOW_IMPORT_REQUIRE_CSV_EXTENSION"],
            config.import.require_csv_extension.to_string(),
        ),
        (
            "export.file_prefix",
            &["CLAIMFLOW_EXPORT_FILE_PREFIX"],
            config.export.file_prefix.clone(),
        ),
        (
            "logging.level",
            &["CLAIMFLOW_LOGGING_LEVEL", "CLAIMFLOW_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        (
            "logging.format",
            &["CLAIMFLOW_LOGGING_FORMAT", "CLAIMFLOW_LOG_FORMAT"],
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, env_keys, value) in &fields {
        let source = field_source(
            key_path,
            env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(key_path, value, source));
    }

    CommandResult::success("config", lines.join("\n"))
}

fn detect_config_path() -> Option<PathBuf> {
    ["claimflow.toml", "config/claimflow.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
