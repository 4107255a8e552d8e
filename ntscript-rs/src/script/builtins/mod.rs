//! Standard function library.
//!
//! [`SystemProvider`] supplies one [`Module`] per family:
//!
//! | Module id         | Functions                                           |
//! |-------------------|-----------------------------------------------------|
//! | `system.core`     | `func`, `var`, `null`, `ctx`                        |
//! | `system.context`  | `recno`, `reccnt`                                   |
//! | `system.logic`    | `if`, `cmp`, `eq` … `gr`, `and`, `or`, `not`, `isnull` |
//! | `system.string`   | `len`, `upper`, `concatw`, `substr`, …              |
//! | `system.math`     | `sum`, `sub`, `mul`, `div`, `mod`, `inc`, `dec`, … |
//! | `system.array`    | `each`, `lcreate`, `ladd`, `lconcat`, `lcount`      |
//! | `system.counter`  | `cget`, `cset`, `creset`, `cinc`, `cdec`, `series`  |
//! | `system.stack`    | `sclr`, `sexist`, `spush`, `spop`                   |
//! | `system.date`     | `fmtdate`, `dtafter`, `dtbefore`, `dtpart`, `time`  |
//!
//! Stateful modules (lists, counters, stacks) keep their state per
//! registry, behind a `Mutex`.

use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use super::error::FunctionError;
use super::registry::{Module, Provider, Registry};
use super::value::Value;

pub mod array;
pub mod basic;
pub mod context;
pub mod counter;
pub mod date;
pub mod logic;
pub mod math;
pub mod stack;
pub mod string;

/// Ids of every module [`SystemProvider`] can supply.
pub const MODULE_IDS: [&str; 9] = [
    "system.core",
    "system.context",
    "system.logic",
    "system.string",
    "system.math",
    "system.array",
    "system.counter",
    "system.stack",
    "system.date",
];

/// Provider of the `system.*` modules.
#[derive(Debug, Clone, Default)]
pub struct SystemProvider {
    only: Option<Vec<String>>,
}

impl SystemProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply only the modules whose id is listed.
    pub fn only<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SystemProvider {
            only: Some(ids.into_iter().map(Into::into).collect()),
        }
    }
}

impl Provider for SystemProvider {
    fn modules(&self) -> Vec<Module> {
        [
            basic::module(),
            context::module(),
            logic::module(),
            string::module(),
            math::module(),
            array::module(),
            counter::module(),
            stack::module(),
            date::module(),
        ]
        .into_iter()
        .filter(|m| match &self.only {
            Some(ids) => ids.iter().any(|id| id == m.id()),
            None => true,
        })
        .collect()
    }
}

/// A fresh registry holding the full standard library.
pub fn system_registry() -> Registry {
    let mut registry = Registry::new();
    registry.bootstrap(&[&SystemProvider::new()], Vec::new());
    registry
}

static SHARED: LazyLock<Arc<Registry>> = LazyLock::new(|| Arc::new(system_registry()));

/// Process-wide standard registry, built on first use.
pub fn shared_registry() -> Arc<Registry> {
    Arc::clone(&SHARED)
}

// ── Argument helpers ──────────────────────────────────────────────────────────

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or_default()
}

fn str_arg(args: &[Value], i: usize) -> String {
    args.get(i).map(Value::to_string).unwrap_or_default()
}

fn int_arg(args: &[Value], i: usize) -> i64 {
    args.get(i).map_or(0, Value::as_int)
}

/// Lock module state, reporting a poisoned lock as a handler failure.
fn lock<T>(state: &Mutex<T>) -> Result<MutexGuard<'_, T>, FunctionError> {
    state
        .lock()
        .map_err(|_| FunctionError::Failed("module state poisoned".into()))
}

/// Script booleans are `1` and `0`.
fn flag(b: bool) -> Value {
    Value::Int(b as i64)
}
