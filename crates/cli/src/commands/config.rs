use std::env;
use std::fs;
use std::path::Path;

use cardwise_core::config::{resolve_config_path, AppConfig, LoadOptions};
use serde::Serialize;
use toml::Value;

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct ConfigField {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run(options: LoadOptions) -> CommandResult {
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            );
        }
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let fields = vec![
        ConfigField {
            key: "database.url",
            value: config.database.url.clone(),
            source: source("database.url", &["CARDWISE_DATABASE_URL"]),
        },
        ConfigField {
            key: "database.max_connections",
            value: config.database.max_connections.to_string(),
            source: source("database.max_connections", &["CARDWISE_DATABASE_MAX_CONNECTIONS"]),
        },
        ConfigField {
            key: "database.timeout_secs",
            value: config.database.timeout_secs.to_string(),
            source: source("database.timeout_secs", &["CARDWISE_DATABASE_TIMEOUT_SECS"]),
        },
        ConfigField {
            key: "recommendations.top_n",
            value: config.recommendations.top_n.to_string(),
            source: source("recommendations.top_n", &["CARDWISE_RECOMMENDATIONS_TOP_N"]),
        },
        ConfigField {
            key: "recommendations.default_currency",
            value: config.recommendations.default_currency.clone(),
            source: source(
                "recommendations.default_currency",
                &["CARDWISE_RECOMMENDATIONS_DEFAULT_CURRENCY"],
            ),
        },
        ConfigField {
            key: "import.auto_approve",
            value: config.import.auto_approve.to_string(),
            source: source("import.auto_approve", &["CARDWISE_IMPORT_AUTO_APPROVE"]),
        },
        ConfigField {
            key: "logging.level",
            value: config.logging.level.clone(),
            source: source("logging.level", &["CARDWISE_LOGGING_LEVEL", "CARDWISE_LOG_LEVEL"]),
        },
        ConfigField {
            key: "logging.format",
            value: config.logging.format.as_str().to_string(),
            source: source("logging.format", &["CARDWISE_LOGGING_FORMAT", "CARDWISE_LOG_FORMAT"]),
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(fields.iter().map(|field| render_line(field.key, &field.value, &field.source)));

    let data = serde_json::to_value(&fields).ok();
    CommandResult::success_with_data("config", lines.join("\n"), data)
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

fn render_line(key: &str, value: &str, source: &str) -> String {
    format!("- {key} = {value} (source: {source})")
}
