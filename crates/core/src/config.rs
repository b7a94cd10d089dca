use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::DEFAULT_PLACEHOLDER_LECTURER;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppConfig {
    pub import: ImportConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImportConfig {
    /// Lecturer recorded on imported rows that carry no lecturer name.
    pub placeholder_lecturer: String,
    pub require_csv_extension: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportConfig {
    pub file_prefix: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub placeholder_lecturer: Option<String>,
    pub require_csv_extension: Option<bool>,
    pub export_file_prefix: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            import: ImportConfig {
                placeholder_lecturer: DEFAULT_PLACEHOLDER_LECTURER.to_string(),
                require_csv_extension: true,
            },
            export: ExportConfig { file_prefix: "claims_export".to_string() },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("claimflow.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(import) = patch.import {
            if let Some(placeholder_lecturer) = import.placeholder_lecturer {
                self.import.placeholder_lecturer = placeholder_lecturer;
            }
            if let Some(require_csv_extension) = import.require_csv_extension {
                self.import.require_csv_extension = require_csv_extension;
            }
        }

        if let Some(export) = patch.export {
            if let Some(file_prefix) = export.file_prefix {
                self.export.file_prefix = file_prefix;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CLAIMFLOW_IMPORT_PLACEHOLDER_LECTURER") {
            self.import.placeholder_lecturer = value;
        }
        if let Some(value) = read_env("CLAIMFLOW_IMPORT_REQUIRE_CSV_EXTENSION") {
            self.import.require_csv_extension =
                parse_bool("CLAIMFLOW_IMPORT_REQUIRE_CSV_EXTENSION", &value)?;
        }

        if let Some(value) = read_env("CLAIMFLOW_EXPORT_FILE_PREFIX") {
            self.export.file_prefix = value;
        }

        let log_level =
            read_env("CLAIMFLOW_LOGGING_LEVEL").or_else(|| read_env("CLAIMFLOW_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CLAIMFLOW_LOGGING_FORMAT").or_else(|| read_env("CLAIMFLOW_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(placeholder_lecturer) = overrides.placeholder_lecturer {
            self.import.placeholder_lecturer = placeholder_lecturer;
        }
        if let Some(require_csv_extension) = overrides.require_csv_extension {
            self.import.require_csv_extension = require_csv_extension;
        }
        if let Some(file_prefix) = overrides.export_file_prefix {
            self.export.file_prefix = file_prefix;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_import(&self.import)?;
        validate_export(&self.export)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

impl ImportConfig {
    /// Whether an uploaded file name passes the extension check.
    pub fn accepts_file_name(&self, file_name: &str) -> bool {
        !self.require_csv_extension
            || Path::new(file_name)
                .extension()
                .and_then(|extension| extension.to_str())
                .is_some_and(|extension| extension.eq_ignore_ascii_case("csv"))
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("claimflow.toml"), PathBuf::from("config/claimflow.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_import(import: &ImportConfig) -> Result<(), ConfigError> {
    if import.placeholder_lecturer.trim().is_empty() {
        return Err(ConfigError::Validation(
            "import.placeholder_lecturer must not be empty".to_string(),
        ));
    }
    if import.placeholder_lecturer.contains(',') {
        return Err(ConfigError::Validation(
            "import.placeholder_lecturer cannot contain a comma; it would corrupt exported rows"
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_export(export: &ExportConfig) -> Result<(), ConfigError> {
    let prefix = export.file_prefix.trim();
    if prefix.is_empty() {
        return Err(ConfigError::Validation("export.file_prefix must not be empty".to_string()));
    }
    if prefix.contains(['/', '\\']) {
        return Err(ConfigError::Validation(
            "export.file_prefix must be a file name, not a path".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    import: Option<ImportPatch>,
    export: Option<ExportPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ImportPatch {
    placeholder_lecturer: Option<String>,
    require_csv_extension: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ExportPatch {
    file_prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
