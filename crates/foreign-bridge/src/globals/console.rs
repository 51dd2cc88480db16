//! `console`: forwards script-style logging to `tracing`.

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::value::{HostObject, HostValue, Invocation};

const CONSOLE_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::console");

#[derive(Debug, Clone, Copy)]
enum ConsoleMethod {
    Log,
    Info,
    Warn,
    Error,
    Debug,
}

impl ConsoleMethod {
    const ALL: [(&'static str, Self); 5] = [
        ("log", Self::Log),
        ("info", Self::Info),
        ("warn", Self::Warn),
        ("error", Self::Error),
        ("debug", Self::Debug),
    ];

    fn write(self, message: &str) {
        match self {
            Self::Log | Self::Info => info!(target: CONSOLE_TARGET, "{message}"),
            Self::Warn => warn!(target: CONSOLE_TARGET, "{message}"),
            Self::Error => error!(target: CONSOLE_TARGET, "{message}"),
            Self::Debug => debug!(target: CONSOLE_TARGET, "{message}"),
        }
    }
}

pub(super) fn namespace() -> HostObject {
    ConsoleMethod::ALL
        .into_iter()
        .fold(HostObject::new("console"), |console, (name, method)| {
            console.with(
                name,
                HostValue::function(move |_, args| {
                    method.write(&render(args.values()));
                    Ok(Invocation::nothing())
                }),
            )
        })
}

/// Joins arguments with spaces; strings are written without quotes.
fn render(values: &[Value]) -> String {
    values
        .iter()
        .map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::value::Arguments;

    #[test]
    fn renders_like_a_script_console() {
        let rendered = render(&[json!("total"), json!(3), json!({"ok": true}), json!(null)]);
        assert_eq!(rendered, r#"total 3 {"ok":true} null"#);
    }

    #[test]
    fn every_method_returns_nothing() {
        let console = HostValue::from(namespace());
        for (name, _) in ConsoleMethod::ALL {
            let function = console.property(name).as_invocable().expect("console method");
            let invocation = function
                .invoke(&console, Arguments::new(vec![json!("hello")]))
                .expect("logging succeeds");
            assert!(matches!(invocation, Invocation::Immediate(None)));
        }
    }
}
