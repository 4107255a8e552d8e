//! `system.array`: iteration and named lists.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::script::parser::Parser;
use crate::script::registry::{FunctionDescriptor, Module};
use crate::script::value::Value;

use super::{arg, lock, str_arg};

type Lists = Arc<Mutex<HashMap<String, Vec<Value>>>>;

pub fn module() -> Module {
    let lists: Lists = Arc::default();
    let (create, add, concat, count) = (
        Arc::clone(&lists),
        Arc::clone(&lists),
        Arc::clone(&lists),
        lists,
    );

    Module::new("system.array", "Array and list functions")
        .function(
            FunctionDescriptor::new("each", |script, args| {
                let items: Vec<Value> = match &args[0] {
                    Value::List(items) => items.to_vec(),
                    Value::Map(map) => map.values().cloned().collect(),
                    _ => return Ok(Value::Null),
                };
                let Some(tree) = Parser::parse(&str_arg(args, 1)).into_token() else {
                    return Ok(Value::Null);
                };
                script.sub_script(|sub| {
                    sub.set_objects(items).each_with(false, |s| {
                        s.evaluate_token(&tree);
                    });
                });
                Ok(Value::Null)
            })
            .min_params(2)
            .syntax("objects, expr")
            .description(
                "Evaluate expr once for each member of objects, \
                 with the member as the script context.",
            ),
        )
        .function(
            FunctionDescriptor::new("lcreate", move |_, args| {
                lock(&create)?.insert(str_arg(args, 0), Vec::new());
                Ok(Value::Null)
            })
            .min_params(1)
            .syntax("name")
            .description("Create an empty list named name."),
        )
        .function(
            FunctionDescriptor::new("ladd", move |_, args| {
                lock(&add)?.entry(str_arg(args, 0)).or_default().push(arg(args, 1));
                Ok(Value::Null)
            })
            .min_params(2)
            .syntax("name, value")
            .description("Add value to the list named name, creating it when needed."),
        )
        .function(
            FunctionDescriptor::new("lconcat", move |_, args| {
                let delim = args.get(1).map_or_else(|| " ".to_owned(), Value::to_string);
                let lists = lock(&concat)?;
                Ok(lists.get(&str_arg(args, 0)).map_or(Value::Null, |values| {
                    let parts: Vec<String> = values.iter().map(Value::to_string).collect();
                    Value::Str(parts.join(&delim))
                }))
            })
            .min_params(1)
            .syntax("name, delimiter")
            .description("Concatenate the list values, separated by delimiter (default a space)."),
        )
        .function(
            FunctionDescriptor::new("lcount", move |_, args| {
                Ok(Value::from(lock(&count)?.get(&str_arg(args, 0)).map_or(0, Vec::len)))
            })
            .min_params(1)
            .syntax("name")
            .description("Number of values in the list named name."),
        )
}
