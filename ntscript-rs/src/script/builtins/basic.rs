//! `system.core`: script construction helpers.

use crate::script::registry::{FunctionDescriptor, Module};
use crate::script::tokenizer::{
    FUNCTION_IDENTIFIER, FUNCTION_PARAM_END, FUNCTION_PARAM_START, PARAM_SEPARATOR, VARIABLE_IDENTIFIER,
};
use crate::script::value::Value;

use super::str_arg;

pub fn module() -> Module {
    Module::new("system.core", "Core functions")
        .function(
            FunctionDescriptor::new("func", |_, args| {
                let params: Vec<String> = args[1..].iter().map(Value::to_string).collect();
                Ok(Value::Str(format!(
                    "{FUNCTION_IDENTIFIER}{}{FUNCTION_PARAM_START}{}{FUNCTION_PARAM_END}",
                    str_arg(args, 0),
                    params.join(&PARAM_SEPARATOR.to_string()),
                )))
            })
            .min_params(1)
            .syntax("name, parameter1, parameter2, ...")
            .description(
                "Create a script function call as text.\n\
                 Generally used to pass a script as parameter to another function.",
            ),
        )
        .function(
            FunctionDescriptor::new("var", |_, args| {
                Ok(Value::Str(format!("{VARIABLE_IDENTIFIER}{}", str_arg(args, 0))))
            })
            .min_params(1)
            .syntax("var")
            .description("Create a script variable as text. Can be combined with #func()."),
        )
        .function(
            FunctionDescriptor::new("null", |_, _| Ok(Value::Null))
                .description("Return NULL value."),
        )
        .function(
            FunctionDescriptor::new("ctx", |script, _| Ok(script.context().cloned().unwrap_or_default()))
                .description("Get the current script context."),
        )
}
