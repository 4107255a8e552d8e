//! `system.context`: iteration position.

use crate::script::registry::{FunctionDescriptor, Module};
use crate::script::value::Value;

pub fn module() -> Module {
    Module::new("system.context", "Context functions")
        .function(
            FunctionDescriptor::new("recno", |script, _| Ok(Value::from(script.recno())))
                .description("Get the current record number, starting at 1."),
        )
        .function(
            FunctionDescriptor::new("reccnt", |script, _| Ok(Value::from(script.rec_count())))
                .description("Get the number of records."),
        )
}
