//! `system.logic`: conditions and comparisons.
//!
//! Comparisons are numeric when both operands are numeric and by string
//! form otherwise.  Results are `1` or `0`.

use std::cmp::Ordering;

use crate::script::error::FunctionError;
use crate::script::registry::{FunctionDescriptor, Module};
use crate::script::value::Value;

use super::{arg, flag, str_arg};

/// Apply comparison operator `op` (`eq`/`=`, `neq`/`<>`, `leq`/`<=`,
/// `geq`/`>=`, `ls`/`<`, `gr`/`>`).
fn compare(op: &str, a: &Value, b: &Value) -> Option<bool> {
    let ord = a.loose_cmp(b);
    let result = match op.to_ascii_lowercase().as_str() {
        "eq" | "=" => ord == Ordering::Equal,
        "neq" | "<>" => ord != Ordering::Equal,
        "leq" | "<=" => ord != Ordering::Greater,
        "geq" | ">=" => ord != Ordering::Less,
        "ls" | "<" => ord == Ordering::Less,
        "gr" | ">" => ord == Ordering::Greater,
        _ => return None,
    };
    Some(result)
}

fn comparison(name: &'static str, symbol: &str) -> FunctionDescriptor {
    FunctionDescriptor::new(name, move |_, args| {
        Ok(flag(compare(name, &args[0], &args[1]).unwrap_or(false)))
    })
    .min_params(2)
    .syntax("expr1, expr2")
    .description(format!("Evaluate comparison expr1 {symbol} expr2."))
}

pub fn module() -> Module {
    Module::new("system.logic", "Logic functions")
        .function(
            FunctionDescriptor::new("if", |_, args| {
                let pick = if args[0].as_bool() { 1 } else { 2 };
                Ok(arg(args, pick))
            })
            .min_params(2)
            .logic()
            .syntax("cond, true, false")
            .description(
                "Evaluate a condition and return `true` or `false` expression.\n\
                 Only the selected expression is evaluated.",
            ),
        )
        .function(
            FunctionDescriptor::new("cmp", |_, args| {
                let op = str_arg(args, 0);
                compare(&op, &args[1], &args[2])
                    .map(flag)
                    .ok_or_else(|| FunctionError::invalid_argument("cmp", 0, format!("unknown operator '{op}'")))
            })
            .min_params(3)
            .syntax("op, expr1, expr2")
            .description(
                "Compare expr1 and expr2 using operator op.\n\
                 Operators: =, <>, <, <=, >, >= (or eq, neq, ls, leq, gr, geq).",
            ),
        )
        .function(comparison("eq", "="))
        .function(comparison("neq", "<>"))
        .function(comparison("leq", "<="))
        .function(comparison("geq", ">="))
        .function(comparison("ls", "<"))
        .function(comparison("gr", ">"))
        .function(
            FunctionDescriptor::new("and", |_, args| {
                Ok(flag(!args.is_empty() && args.iter().all(Value::as_bool)))
            })
            .syntax("expr1, expr2, ...")
            .description("Evaluate AND conditions."),
        )
        .function(
            FunctionDescriptor::new("or", |_, args| Ok(flag(args.iter().any(Value::as_bool))))
                .syntax("expr1, expr2, ...")
                .description("Evaluate OR conditions."),
        )
        .function(
            FunctionDescriptor::new("not", |_, args| Ok(flag(!args[0].as_bool())))
                .min_params(1)
                .syntax("cond")
                .description("Negate the condition."),
        )
        .function(
            FunctionDescriptor::new("isnull", |_, args| Ok(flag(args[0].is_null())))
                .min_params(1)
                .syntax("expr")
                .description("Evaluate if expression is null."),
        )
}
