//! `system.math`: arithmetic.
//!
//! The folding operators (`sum`, `sub`, `mul`, `div`) ignore non-numeric
//! arguments and return null when none is numeric.

use std::sync::LazyLock;

use regex::Regex;

use crate::script::error::FunctionError;
use crate::script::registry::{FunctionDescriptor, Module};
use crate::script::value::Value;

use super::str_arg;

static LEADING_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)").expect("leading integer pattern"));

static NON_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9]").expect("non digit pattern"));

type Op = fn(&Value, &Value) -> Result<Value, String>;

fn fold(name: &'static str, args: &[Value], op: Op) -> Result<Value, FunctionError> {
    let mut numbers = args.iter().filter_map(Value::as_number);
    let Some(mut acc) = numbers.next() else {
        return Ok(Value::Null);
    };
    for n in numbers {
        acc = op(&acc, &n).map_err(|e| FunctionError::Failed(format!("{name}: {e}")))?;
    }
    Ok(acc)
}

fn folding(name: &'static str, op: Op, description: &str) -> FunctionDescriptor {
    FunctionDescriptor::new(name, move |_, args| fold(name, args, op))
        .syntax("value1, value2, ...")
        .description(description)
}

/// Integer prefix of a value, as a cast would read it (`"12abc"` is 12).
fn to_int(value: &Value) -> i64 {
    match value {
        Value::Str(s) if value.as_number().is_none() => LEADING_INT
            .captures(s)
            .and_then(|caps| caps[1].parse().ok())
            .unwrap_or(0),
        other => other.as_int(),
    }
}

pub fn module() -> Module {
    Module::new("system.math", "Math functions")
        .function(folding("sum", |a, b| Ok(a.arith_add(b)), "Sum value1 with value2 and so on."))
        .function(folding("sub", |a, b| Ok(a.arith_sub(b)), "Subtract value2 and so on from value1."))
        .function(folding("mul", |a, b| Ok(a.arith_mul(b)), "Multiply value1 with value2 and so on."))
        .function(folding("div", Value::arith_div, "Divide value1 by value2 and so on."))
        .function(
            FunctionDescriptor::new("mod", |_, args| {
                if !(args[0].is_numeric() && args[1].is_numeric()) {
                    return Ok(Value::Null);
                }
                args[0].arith_rem(&args[1]).map_err(|e| FunctionError::Failed(format!("mod: {e}")))
            })
            .min_params(2)
            .syntax("value1, value2")
            .description("Remainder of value1 divided by value2."),
        )
        .function(
            FunctionDescriptor::new("inc", |_, args| {
                Ok(args[0].as_number().map_or(Value::Null, |n| n.arith_add(&Value::Int(1))))
            })
            .min_params(1)
            .syntax("value")
            .description("Increase value by 1."),
        )
        .function(
            FunctionDescriptor::new("dec", |_, args| {
                Ok(args[0].as_number().map_or(Value::Null, |n| n.arith_sub(&Value::Int(1))))
            })
            .min_params(1)
            .syntax("value")
            .description("Decrease value by 1."),
        )
        .function(
            FunctionDescriptor::new("int", |_, args| Ok(Value::Int(to_int(&args[0]))))
                .min_params(1)
                .syntax("v")
                .description("Cast value as integer."),
        )
        .function(
            FunctionDescriptor::new("numonly", |_, args| {
                Ok(Value::Str(NON_DIGIT.replace_all(&str_arg(args, 0), "").into_owned()))
            })
            .min_params(1)
            .syntax("value")
            .description("Remove everything but digits from value."),
        )
}
