//! Built-in tools invokable through `tool/execute`
//!
//! Tools are pure functions of their parameters; none of them touch sessions
//! or the upstream provider.

use std::sync::OnceLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Number, Value};

use crate::domain::calculator;
use crate::errors::AppError;

/// Largest magnitude emitted as a JSON integer rather than a float.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Calculate,
    GetTime,
}

impl Tool {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "calculate" => Some(Self::Calculate),
            "get-time" => Some(Self::GetTime),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Calculate => "calculate",
            Self::GetTime => "get-time",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CalculateParams {
    pub expression: String,
}

pub fn execute_tool(name: &str, parameters: Value) -> Result<Value, AppError> {
    let Some(tool) = Tool::from_name(name) else {
        return Err(AppError::validation(format!("unsupported tool: {name}")));
    };

    match tool {
        Tool::Calculate => {
            let params: CalculateParams = serde_json::from_value(parameters).map_err(|err| {
                AppError::validation(format!("invalid calculate parameters: {err}"))
            })?;
            calculate(&params.expression)
        }
        Tool::GetTime => Ok(time_snapshot(Utc::now())),
    }
}

fn expression_allow_list() -> &'static Regex {
    static ALLOW_LIST: OnceLock<Regex> = OnceLock::new();
    ALLOW_LIST.get_or_init(|| {
        Regex::new(r"^[0-9+\-*/().\s]+$").expect("expression allow-list pattern")
    })
}

pub fn calculate(expression: &str) -> Result<Value, AppError> {
    if !expression_allow_list().is_match(expression) {
        return Err(AppError::validation(
            "invalid expression: only numbers and arithmetic operators are allowed",
        ));
    }

    let value = calculator::evaluate(expression)
        .map_err(|err| AppError::validation(format!("invalid expression: {err}")))?;

    Ok(json!({ "result": number_value(value) }))
}

#[allow(clippy::cast_possible_truncation)]
fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
        return Value::Number(Number::from(value as i64));
    }

    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

pub fn time_snapshot(now: DateTime<Utc>) -> Value {
    json!({
        "time": now.to_rfc3339_opts(SecondsFormat::Millis, true),
        "timestamp": now.timestamp_millis(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use serde_json::json;

    use super::{calculate, execute_tool, time_snapshot, Tool};

    #[test]
    fn calculate_follows_precedence() {
        let result = execute_tool("calculate", json!({"expression": "2+2*3"}))
            .expect("calculation succeeds");
        assert_eq!(result, json!({"result": 8}));
    }

    #[test]
    fn calculate_keeps_fractions() {
        let result = calculate("7 / 2").expect("calculation succeeds");
        assert_eq!(result, json!({"result": 3.5}));
    }

    #[test]
    fn calculate_rejects_disallowed_characters() {
        for expression in ["2+alert(1)", "1; 2", "Math.PI", "2^3", ""] {
            let error = calculate(expression).expect_err("expected invalid expression");
            assert!(
                error.to_string().starts_with("invalid expression"),
                "unexpected error for {expression:?}: {error}"
            );
        }
    }

    #[test]
    fn calculate_rejects_allowed_but_malformed_input() {
        let error = calculate("(1 + ").expect_err("expected syntax error");
        assert!(error.to_string().contains("unexpected end"));

        let error = calculate("4 / 0").expect_err("expected non-finite error");
        assert!(error.to_string().contains("not a finite number"));
    }

    #[test]
    fn calculate_requires_expression_parameter() {
        let error = execute_tool("calculate", json!({})).expect_err("missing expression");
        assert!(error.to_string().contains("invalid calculate parameters"));

        let error =
            execute_tool("calculate", json!({"expression": 4})).expect_err("non-string expression");
        assert!(error.to_string().contains("invalid calculate parameters"));
    }

    #[test]
    fn get_time_reports_one_instant() {
        let before = Utc::now().timestamp_millis();
        let result = execute_tool("get-time", json!(null)).expect("get-time succeeds");
        let after = Utc::now().timestamp_millis();

        let timestamp = result["timestamp"].as_i64().expect("integer timestamp");
        assert!(timestamp >= before && timestamp <= after);

        let parsed = DateTime::parse_from_rfc3339(result["time"].as_str().expect("time string"))
            .expect("ISO-8601 time");
        assert_eq!(parsed.timestamp_millis(), timestamp);
    }

    #[test]
    fn time_snapshot_uses_millisecond_utc_format() {
        let instant = DateTime::parse_from_rfc3339("2026-02-27T12:34:56.789Z")
            .expect("valid instant")
            .with_timezone(&Utc);

        assert_eq!(
            time_snapshot(instant),
            json!({"time": "2026-02-27T12:34:56.789Z", "timestamp": 1_772_195_696_789_i64})
        );
    }

    #[test]
    fn unknown_tool_is_rejected() {
        let error = execute_tool("rm-rf", json!({})).expect_err("expected unsupported tool");
        assert_eq!(error.to_string(), "unsupported tool: rm-rf");
        assert_eq!(Tool::from_name("get-time").map(Tool::name), Some("get-time"));
    }
}
