pub mod config;
pub mod doctor;
pub mod simulate;

use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandFailure<'a> {
    command: &'a str,
    status: &'static str,
    error_class: &'a str,
    message: String,
}

impl CommandResult {
    /// Plain text for operators, exit code 0.
    pub fn text(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    /// Pretty JSON report, exit code 0. A payload that cannot be encoded becomes a failure.
    pub fn report<T: Serialize>(command: &str, payload: &T) -> Self {
        match serde_json::to_string_pretty(payload) {
            Ok(output) => Self { exit_code: 0, output },
            Err(error) => Self::failure(command, "serialization", error.to_string(), 1),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload =
            CommandFailure { command, status: "error", error_class, message: message.into() };
        let output = serde_json::to_string(&payload).unwrap_or_else(|_| {
            format!(
                "{{\"command\":\"{command}\",\"status\":\"error\",\
                 \"error_class\":\"{error_class}\"}}"
            )
        });
        Self { exit_code, output }
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;
    use serde_json::Value;

    use crate::commands::CommandResult;

    #[derive(Serialize)]
    struct Totals {
        ticks: u64,
        units_fulfilled: u64,
    }

    #[test]
    fn report_renders_payload_with_success_code() {
        let result = CommandResult::report("simulate", &Totals { ticks: 3, units_fulfilled: 17 });

        assert_eq!(result.exit_code, 0);
        let payload: Value = serde_json::from_str(&result.output).expect("valid json");
        assert_eq!(payload["units_fulfilled"], 17);
    }

    #[test]
    fn failure_carries_class_and_exit_code() {
        let result = CommandResult::failure("simulate", "event_sink", "disk \"full\"", 1);

        assert_eq!(result.exit_code, 1);
        let payload: Value = serde_json::from_str(&result.output).expect("valid json");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "event_sink");
        assert_eq!(payload["message"], "disk \"full\"");
    }

    #[test]
    fn text_passes_output_through() {
        let result = CommandResult::text("effective config");

        assert_eq!(result.exit_code, 0);
        assert_eq!(result.output, "effective config");
    }
}
