pub mod cards;
pub mod click;
pub mod config;
pub mod import;
pub mod migrate;
pub mod recommend;
pub mod review;
pub mod seed;
pub mod stats;

use std::future::Future;

use cardwise_core::config::{AppConfig, LoadOptions};
use cardwise_core::errors::{ApplicationError, InterfaceError};
use cardwise_db::{connect, migrations, DbPool};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Error class, message and exit code of a failed command.
pub(crate) type Failure = (&'static str, String, u8);

/// Message and optional JSON payload of a successful command.
pub(crate) struct Completed {
    pub message: String,
    pub data: Option<Value>,
}

impl Completed {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), data: None }
    }

    pub fn with_data(message: impl Into<String>, data: impl Serialize) -> Result<Self, Failure> {
        let data = serde_json::to_value(data)
            .map_err(|error| ("serialization", error.to_string(), 1u8))?;
        Ok(Self { message: message.into(), data: Some(data) })
    }
}

/// Loads config, opens the database, applies pending migrations and runs
/// `work` on a current-thread runtime.
pub(crate) fn with_database<F, Fut>(
    command: &str,
    options: LoadOptions,
    work: F,
) -> CommandResult
where
    F: FnOnce(AppConfig, DbPool) -> Fut,
    Fut: Future<Output = Result<Completed, Failure>>,
{
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                command,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let outcome = work(config, pool.clone()).await;
        pool.close().await;
        outcome
    });

    match result {
        Ok(completed) => {
            CommandResult::success_with_data(command, completed.message, completed.data)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(command, error_class, message, exit_code)
        }
    }
}

/// Fresh id tying one command run to its log events and error output.
pub(crate) fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Maps an application error onto the error class and exit code reported to
/// operators.
pub(crate) fn application_failure(error: ApplicationError, correlation_id: &str) -> Failure {
    let interface = error.into_interface(correlation_id);
    let (error_class, exit_code) = match &interface {
        InterfaceError::BadRequest { .. } => ("invalid_input", 6),
        InterfaceError::NotFound { .. } => ("not_found", 7),
        InterfaceError::ServiceUnavailable { .. } => ("persistence", 8),
        InterfaceError::Internal { .. } => ("internal", 9),
    };
    let message = format!(
        "{} ({interface}; correlation_id={})",
        interface.user_message(),
        interface.correlation_id()
    );
    (error_class, message, exit_code)
}

#[cfg(test)]
mod tests {
    use cardwise_core::errors::{ApplicationError, DomainError};
    use cardwise_core::CampaignId;
    use serde_json::Value;

    use uuid::Uuid;

    use super::{application_failure, new_correlation_id, CommandResult};

    #[test]
    fn success_payload_omits_data_when_absent() {
        let result = CommandResult::success("migrate", "applied pending migrations");
        let payload: Value = serde_json::from_str(&result.output).expect("json");

        assert_eq!(payload["status"], "ok");
        assert!(payload.get("data").is_none());
        assert!(payload["error_class"].is_null());
    }

    #[test]
    fn correlation_ids_are_unique_uuids() {
        let first = new_correlation_id();
        let second = new_correlation_id();

        assert_ne!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn application_errors_map_to_exit_codes() {
        let invalid = ApplicationError::Domain(DomainError::InvalidInput("cart".to_string()));
        let (class, message, code) = application_failure(invalid, "req-1");
        assert_eq!((class, code), ("invalid_input", 6));
        assert!(message.contains("correlation_id=req-1"));

        let missing =
            ApplicationError::Domain(DomainError::UnknownCampaign { campaign_id: CampaignId(3) });
        assert_eq!(application_failure(missing, "req-2").2, 7);

        let storage = ApplicationError::Persistence("locked".to_string());
        assert_eq!(application_failure(storage, "req-3").0, "persistence");
    }
}
