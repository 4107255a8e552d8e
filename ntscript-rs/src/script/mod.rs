//! Template-expression engine.
//!
//! Text containing `#function(args)` calls and `$variable.path` references
//! is tokenized into a [`Token`] tree and evaluated by a [`Script`]:
//!
//! - `$name` / `$a.b.c` read members of the active *context* (a map or a
//!   host object, see [`context`])
//! - `#name(p1, p2)` calls a function from the shared [`Registry`]; the
//!   standard library lives in [`builtins`]
//! - parameters may be quoted with `'` or `"`; markers inside quotes are
//!   still evaluated
//! - unknown names and malformed calls never fail evaluation
//!
//! # Quick start
//!
//! ```rust
//! use ntscript::script::{builtins, Script, Value, ValueMap};
//!
//! let mut script = Script::new(builtins::shared_registry());
//! script.set_context(ValueMap::new().with("name", "world"));
//! let out = script.evaluate("Hello #upper($name)!");
//! assert_eq!(out, Value::from("Hello WORLD!"));
//! ```

pub mod builtins;
pub mod context;
pub mod cursor;
pub mod error;
pub mod interp;
pub mod iter;
pub mod parser;
pub mod registry;
pub mod token;
pub mod tokenizer;
pub mod value;

// Re-exports for convenience.
pub use context::{ContextHandler, ContextResolver, Priority};
pub use error::{AccessError, FunctionError, ScriptError};
pub use interp::Script;
pub use iter::{ContextSource, PartialObject};
pub use parser::{ParsedScript, Parser};
pub use registry::{FunctionDescriptor, Listener, Module, Provider, Registry};
pub use token::{FunctionCall, Token, TokenKind};
pub use value::{ScriptObject, Value, ValueMap};
