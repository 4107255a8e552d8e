//! `system.counter`: named counters and alphabetic series.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::script::error::FunctionError;
use crate::script::registry::{FunctionDescriptor, Module};
use crate::script::value::Value;

use super::{arg, int_arg, lock, str_arg};

type Counters = Arc<Mutex<HashMap<String, Value>>>;

const ALPHA: &str = "abcdefghijklmnopqrstuvwxyz";

/// Bijective base-N spelling of `value` over `digits`: 1 is `a`, 26 is
/// `z`, 27 is `aa`.  Zero and negatives give an empty string.
fn series(mut value: i64, digits: &[char]) -> String {
    let base = digits.len() as i64;
    let mut out = Vec::new();
    while value > 0 {
        let rem = (value - 1) % base;
        out.push(digits[rem as usize]);
        value = (value - 1) / base;
    }
    out.iter().rev().collect()
}

/// Counter functions share one table; each handler gets its own handle.
fn step(counters: Counters, name: &'static str, delta: i64) -> FunctionDescriptor {
    FunctionDescriptor::new(name, move |_, args| {
        let mut table = lock(&counters)?;
        let Some(current) = table.get_mut(&str_arg(args, 0)) else {
            return Ok(Value::Null);
        };
        *current = current.arith_add(&Value::Int(delta));
        Ok(current.clone())
    })
    .min_params(1)
    .syntax("id")
}

pub fn module() -> Module {
    let counters: Counters = Arc::default();
    let (get, set, reset) = (Arc::clone(&counters), Arc::clone(&counters), Arc::clone(&counters));

    Module::new("system.counter", "Counter functions")
        .function(
            FunctionDescriptor::new("cget", move |_, args| {
                Ok(lock(&get)?.get(&str_arg(args, 0)).cloned().unwrap_or_default())
            })
            .min_params(1)
            .syntax("id")
            .description("Get the counter value of id."),
        )
        .function(
            FunctionDescriptor::new("cset", move |_, args| {
                let value = arg(args, 1);
                lock(&set)?.insert(str_arg(args, 0), value.clone());
                Ok(value)
            })
            .min_params(2)
            .syntax("id, value")
            .description("Set the counter value of id."),
        )
        .function(
            FunctionDescriptor::new("creset", move |_, args| {
                lock(&reset)?.insert(str_arg(args, 0), Value::Int(0));
                Ok(Value::Int(0))
            })
            .min_params(1)
            .syntax("id")
            .description("Set the counter value of id to zero."),
        )
        .function(step(Arc::clone(&counters), "cinc", 1).description("Increase the counter value of id by one."))
        .function(step(counters, "cdec", -1).description("Decrease the counter value of id by one."))
        .function(
            FunctionDescriptor::new("series", |_, args| {
                let kind = args.get(1).map_or_else(|| "alpha".to_owned(), Value::to_string);
                if kind != "alpha" {
                    return Err(FunctionError::invalid_argument("series", 1, format!("unknown series '{kind}'")));
                }
                let digits: Vec<char> = ALPHA.chars().collect();
                Ok(Value::Str(series(int_arg(args, 0), &digits)))
            })
            .min_params(1)
            .syntax("value, type")
            .description("Spell value as an alphabetic series: 1 is a, 27 is aa."),
        )
}
