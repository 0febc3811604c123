//! Builtin handler bodies
//!
//! Configuration cannot carry code, so a function entry binds its name and
//! required fields to one of these builtins. Library users registering
//! their own `FunctionSpec`s bypass this module entirely.

use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::time::sleep;

use conflux_config::FunctionConfig;
use conflux_engine::{EngineResult, FunctionSpec, Handler};

fn echo_value(input: &JsonValue) -> JsonValue {
    input.get("echo").cloned().unwrap_or(JsonValue::Null)
}

/// Materialize a declared function entry into a validated registration
pub fn build_spec(config: &FunctionConfig) -> EngineResult<FunctionSpec> {
    use conflux_config::BuiltinHandler::*;

    let handler = match config.builtin {
        Echo => Handler::sync(|input| Ok(echo_value(&input))),
        DelayedEcho => {
            let delay = Duration::from_millis(config.delay_ms);
            Handler::async_fn(move |input: JsonValue| async move {
                sleep(delay).await;
                Ok(echo_value(&input))
            })
        }
        Sum => Handler::sync(|input| {
            let a = input
                .get("a")
                .and_then(JsonValue::as_f64)
                .ok_or_else(|| "field 'a' is not a number".to_string())?;
            let b = input
                .get("b")
                .and_then(JsonValue::as_f64)
                .ok_or_else(|| "field 'b' is not a number".to_string())?;
            Ok(JsonValue::from(a + b))
        }),
        Concat => Handler::sync(|input| {
            let left = input
                .get("left")
                .and_then(JsonValue::as_str)
                .ok_or_else(|| "field 'left' is not a string".to_string())?;
            let right = input
                .get("right")
                .and_then(JsonValue::as_str)
                .ok_or_else(|| "field 'right' is not a string".to_string())?;
            Ok(JsonValue::from(format!("{}{}", left, right)))
        }),
    };

    FunctionSpec::new(&config.name, config.required_fields.clone(), handler)
}
