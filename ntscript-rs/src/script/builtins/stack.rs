//! `system.stack`: named value slots.
//!
//! Each id holds one value: `spush` replaces it and `spop` reads it back
//! without removing it.  `sclr` empties every slot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::script::registry::{FunctionDescriptor, Module};
use crate::script::value::Value;

use super::{arg, flag, lock, str_arg};

pub fn module() -> Module {
    let stacks: Arc<Mutex<HashMap<String, Value>>> = Arc::default();
    let (clear, exist, push, pop) = (
        Arc::clone(&stacks),
        Arc::clone(&stacks),
        Arc::clone(&stacks),
        stacks,
    );

    Module::new("system.stack", "Stack functions")
        .function(
            FunctionDescriptor::new("sclr", move |_, _| {
                lock(&clear)?.clear();
                Ok(Value::Null)
            })
            .description("Clear stacks."),
        )
        .function(
            FunctionDescriptor::new("sexist", move |_, args| {
                Ok(flag(lock(&exist)?.contains_key(&str_arg(args, 0))))
            })
            .min_params(1)
            .syntax("id")
            .description("Check if stack id exists."),
        )
        .function(
            FunctionDescriptor::new("spush", move |_, args| {
                lock(&push)?.insert(str_arg(args, 0), arg(args, 1));
                Ok(Value::Null)
            })
            .min_params(2)
            .syntax("id, value")
            .description("Push value to stack id."),
        )
        .function(
            FunctionDescriptor::new("spop", move |_, args| {
                Ok(lock(&pop)?.get(&str_arg(args, 0)).cloned().unwrap_or_default())
            })
            .min_params(1)
            .syntax("id")
            .description("Pop the value from stack id."),
        )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::script::builtins::system_registry;
    use crate::script::value::Value;
    use crate::script::Script;

    #[test]
    fn slots() {
        let mut s = Script::new(Arc::new(system_registry()));
        assert_eq!(s.evaluate("#sexist(a)"), Value::Int(0));
        s.evaluate("#spush(a,1)#spush(a,2)");
        assert_eq!(s.evaluate("#sexist(a)"), Value::Int(1));
        assert_eq!(s.evaluate("#spop(a)#spop(a)"), Value::from("22"));
        s.evaluate("#sclr()");
        assert_eq!(s.evaluate("#spop(a)"), Value::Null);
    }
}
