//! `counter`: shared mutable state reached through the call receiver.

use std::sync::Arc;

use serde_json::Value;

use crate::value::{HostFailure, HostObject, HostValue, Invocation};

pub(super) fn namespace() -> HostObject {
    HostObject::new("counter")
        .with("count", Value::from(0_i64))
        .with(
            "increment",
            HostValue::function(|receiver, args| {
                let step = args.get(0).and_then(Value::as_i64).unwrap_or(1);
                let owner = owner(receiver)?;
                let next = read(owner).saturating_add(step);
                owner.define("count", Value::from(next));
                Ok(Invocation::ready(next))
            }),
        )
        .with(
            "get",
            HostValue::function(|receiver, _| Ok(Invocation::ready(read(owner(receiver)?)))),
        )
}

fn owner(receiver: &HostValue) -> Result<&HostObject, HostFailure> {
    receiver
        .as_object()
        .map(Arc::as_ref)
        .ok_or_else(|| HostFailure::type_error("counter methods must be called on an object"))
}

fn read(owner: &HostObject) -> i64 {
    owner
        .get("count")
        .to_data()
        .as_ref()
        .and_then(Value::as_i64)
        .unwrap_or_default()
}
