//! `Math`: numeric helpers over JSON numbers.

use serde_json::Value;

use crate::value::{Arguments, HostFailure, HostObject, HostValue, Invocation};

/// Largest magnitude below which every integral `f64` is exact.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

pub(super) fn namespace() -> HostObject {
    HostObject::new("Math")
        .with("max", variadic(f64::NEG_INFINITY, f64::max))
        .with("min", variadic(f64::INFINITY, f64::min))
        .with("abs", unary(f64::abs))
        .with("floor", unary(f64::floor))
        .with("ceil", unary(f64::ceil))
        .with("round", unary(round_half_up))
        .with("sqrt", unary(f64::sqrt))
        .with(
            "pow",
            HostValue::function(|_, args| {
                let base = operand(&args, 0);
                let exponent = operand(&args, 1);
                Ok(Invocation::ready(number(base.powf(exponent))))
            }),
        )
}

fn unary(operation: fn(f64) -> f64) -> HostValue {
    HostValue::function(move |_, args| Ok(Invocation::ready(number(operation(operand(&args, 0))))))
}

/// Folds every argument; a single non-numeric argument poisons the result.
fn variadic(identity: f64, combine: fn(f64, f64) -> f64) -> HostValue {
    HostValue::function(move |_, args: Arguments| -> Result<Invocation, HostFailure> {
        let folded = args.values().iter().try_fold(identity, |acc, value| {
            value.as_f64().map(|number| combine(acc, number))
        });
        Ok(Invocation::ready(folded.map_or(Value::Null, number)))
    })
}

fn operand(args: &Arguments, index: usize) -> f64 {
    args.get(index).and_then(Value::as_f64).unwrap_or(f64::NAN)
}

/// Rounds halves towards positive infinity, so `-2.5` becomes `-2`.
#[expect(clippy::float_arithmetic, reason = "rounding is defined arithmetically")]
fn round_half_up(value: f64) -> f64 {
    // Compare the fraction rather than adding 0.5, which can round up.
    let floor = value.floor();
    if value - floor >= 0.5 { floor + 1.0 } else { floor }
}

/// Converts a result to JSON, keeping integral values integral.
///
/// Non-finite values have no JSON form and become `null`.
#[expect(clippy::float_cmp, reason = "an exact integral check is intended")]
#[expect(
    clippy::cast_possible_truncation,
    reason = "the value is integral and inside the exactly representable range"
)]
fn number(value: f64) -> Value {
    if !value.is_finite() {
        return Value::Null;
    }
    if value.trunc() == value && value.abs() < MAX_SAFE_INTEGER {
        return Value::from(value as i64);
    }
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn call(name: &str, args: Vec<Value>) -> Option<Value> {
        let math = HostValue::from(namespace());
        let function = math.property(name).as_invocable().expect("math function");
        match function.invoke(&math, Arguments::new(args)).expect("math never fails") {
            Invocation::Immediate(value) => value,
            Invocation::Deferred(_) => panic!("math is synchronous"),
        }
    }

    #[rstest]
    #[case("max", vec![json!(3), json!(7)], json!(7))]
    #[case("min", vec![json!(3), json!(-7.5)], json!(-7.5))]
    #[case("max", vec![], json!(null))]
    #[case("max", vec![json!(1), json!("two")], json!(null))]
    #[case("abs", vec![json!(-4)], json!(4))]
    #[case("floor", vec![json!(2.7)], json!(2))]
    #[case("ceil", vec![json!(2.1)], json!(3))]
    #[case("round", vec![json!(-2.5)], json!(-2))]
    #[case("round", vec![json!(2.5)], json!(3))]
    #[case("round", vec![json!(0.499_999_999_999_999_94)], json!(0))]
    #[case("round", vec![json!(-0.5)], json!(0))]
    #[case("sqrt", vec![json!(2.25)], json!(1.5))]
    #[case("sqrt", vec![json!(-1)], json!(null))]
    #[case("pow", vec![json!(2), json!(10)], json!(1024))]
    #[case("abs", vec![json!("x")], json!(null))]
    fn computes_like_a_script_host(#[case] name: &str, #[case] args: Vec<Value>, #[case] expected: Value) {
        assert_eq!(call(name, args), Some(expected));
    }
}
