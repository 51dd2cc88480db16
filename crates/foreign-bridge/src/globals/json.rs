//! `JSON`: text encoding of values.

use serde_json::Value;

use crate::value::{HostFailure, HostObject, HostValue, Invocation};

pub(super) fn namespace() -> HostObject {
    HostObject::new("JSON")
        .with(
            "stringify",
            HostValue::function(|_, args| {
                let Some(value) = args.get(0) else {
                    return Ok(Invocation::nothing());
                };
                let pretty = args.get(1).and_then(Value::as_u64).is_some_and(|indent| indent > 0);
                let encoded = if pretty {
                    serde_json::to_string_pretty(value)
                } else {
                    serde_json::to_string(value)
                };
                encoded
                    .map(Invocation::ready)
                    .map_err(|error| HostFailure::type_error(error.to_string()))
            }),
        )
        .with(
            "parse",
            HostValue::function(|_, args| {
                let text = args
                    .get(0)
                    .and_then(Value::as_str)
                    .ok_or_else(|| HostFailure::type_error("JSON.parse expects a string"))?;
                serde_json::from_str::<Value>(text)
                    .map(Invocation::ready)
                    .map_err(|error| HostFailure::named("SyntaxError", error.to_string()))
            }),
        )
}
