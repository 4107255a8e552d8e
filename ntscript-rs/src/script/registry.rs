//! Function registry.
//!
//! Functions are grouped into [`Module`]s.  A module is admitted once per
//! id; each of its functions is then reachable by name (and alias).  Name
//! collisions are resolved first-come: a later function or alias with a
//! taken name is skipped.
//!
//! Modules arrive either directly ([`Registry::register_module`]) or from
//! [`Provider`]s during [`Registry::bootstrap`], after which every
//! [`Listener`] gets a chance to add its own.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use super::error::FunctionError;
use super::interp::Script;
use super::tokenizer::{is_identifier, FUNCTION_IDENTIFIER, FUNCTION_PARAM_END, FUNCTION_PARAM_START};
use super::value::Value;

/// Function implementation: receives the calling script and the evaluated
/// arguments.
pub type Handler = Arc<dyn Fn(&mut Script, &[Value]) -> Result<Value, FunctionError> + Send + Sync>;

// ── FunctionDescriptor ────────────────────────────────────────────────────────

/// A callable script function and its metadata.
#[derive(Clone)]
pub struct FunctionDescriptor {
    name: String,
    alias: Option<String>,
    min_params: usize,
    logic: bool,
    module_id: String,
    syntax: String,
    description: String,
    handler: Handler,
}

impl fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("min_params", &self.min_params)
            .field("logic", &self.logic)
            .field("module_id", &self.module_id)
            .finish_non_exhaustive()
    }
}

impl FunctionDescriptor {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Script, &[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        FunctionDescriptor {
            name: name.into(),
            alias: None,
            min_params: 0,
            logic: false,
            module_id: String::new(),
            syntax: String::new(),
            description: String::new(),
            handler: Arc::new(handler),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn min_params(mut self, n: usize) -> Self {
        self.min_params = n;
        self
    }

    /// Mark as a logic function: argument 1 is only evaluated when
    /// argument 0 is truthy, argument 2 only when it is falsy.
    pub fn logic(mut self) -> Self {
        self.logic = true;
        self
    }

    /// Parameter list shown by [`Registry::dump`], e.g. `s, count`.
    pub fn syntax(mut self, syntax: impl Into<String>) -> Self {
        self.syntax = syntax.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn required_params(&self) -> usize {
        self.min_params
    }

    pub fn is_logic(&self) -> bool {
        self.logic
    }

    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    pub fn syntax_text(&self) -> &str {
        &self.syntax
    }

    pub fn description_text(&self) -> &str {
        &self.description
    }

    pub fn call(&self, script: &mut Script, args: &[Value]) -> Result<Value, FunctionError> {
        (self.handler)(script, args)
    }
}

// ── Module ────────────────────────────────────────────────────────────────────

/// A named group of functions.
#[derive(Debug, Clone)]
pub struct Module {
    id: String,
    description: String,
    functions: Vec<Arc<FunctionDescriptor>>,
}

impl Module {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Module {
            id: id.into(),
            description: description.into(),
            functions: Vec::new(),
        }
    }

    /// Add a function, stamping it with this module's id.
    pub fn function(mut self, mut descriptor: FunctionDescriptor) -> Self {
        descriptor.module_id = self.id.clone();
        self.functions.push(Arc::new(descriptor));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn functions(&self) -> &[Arc<FunctionDescriptor>] {
        &self.functions
    }
}

/// A source of modules registered at bootstrap.
pub trait Provider {
    fn modules(&self) -> Vec<Module>;
}

/// Hooks into registry bootstrap and iteration.
pub trait Listener: Send + Sync {
    /// Called once every provider has registered; may add modules.
    fn on_modules_registered(&self, _registry: &mut Registry) {}

    /// Called after the iterator moved to a new record.
    fn on_context_change(&self, _script: &Script) {}
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// Name → function table plus the admitted modules.
#[derive(Default)]
pub struct Registry {
    functions: HashMap<String, Arc<FunctionDescriptor>>,
    modules: Vec<Module>,
    listeners: Vec<Arc<dyn Listener>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("modules", &self.modules.iter().map(Module::id).collect::<Vec<_>>())
            .field("functions", &self.functions.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every provider's modules, then notify and keep `listeners`.
    pub fn bootstrap(&mut self, providers: &[&dyn Provider], listeners: Vec<Arc<dyn Listener>>) {
        for provider in providers {
            self.add_provider(*provider);
        }
        for listener in listeners {
            listener.on_modules_registered(self);
            self.listeners.push(listener);
        }
        debug!(
            "registry ready: {} modules, {} names",
            self.modules.len(),
            self.functions.len()
        );
    }

    pub fn add_provider(&mut self, provider: &dyn Provider) {
        for module in provider.modules() {
            self.register_module(module);
        }
    }

    pub fn add_listener(&mut self, listener: Arc<dyn Listener>) {
        self.listeners.push(listener);
    }

    pub fn listeners(&self) -> &[Arc<dyn Listener>] {
        &self.listeners
    }

    /// Admit `module` unless its id is empty or already registered.
    pub fn register_module(&mut self, module: Module) -> bool {
        if module.id.is_empty() {
            warn!("module without id ignored");
            return false;
        }
        if self.module(&module.id).is_some() {
            debug!("module '{}' already registered", module.id);
            return false;
        }
        for descriptor in &module.functions {
            self.insert(Arc::clone(descriptor));
        }
        debug!("registered module '{}' ({} functions)", module.id, module.functions.len());
        self.modules.push(module);
        true
    }

    /// Register a standalone function under its name and alias.
    pub fn add(&mut self, descriptor: FunctionDescriptor) -> bool {
        self.insert(Arc::new(descriptor))
    }

    fn insert(&mut self, descriptor: Arc<FunctionDescriptor>) -> bool {
        let name = descriptor.name.clone();
        if !is_identifier(&name) {
            warn!("invalid function name '{name}' rejected");
            return false;
        }
        if self.functions.contains_key(&name) {
            debug!("function '{name}' already registered, skipped");
            return false;
        }
        if let Some(alias) = &descriptor.alias {
            self.insert_alias(alias, &descriptor);
        }
        self.functions.insert(name, descriptor);
        true
    }

    fn insert_alias(&mut self, alias: &str, descriptor: &Arc<FunctionDescriptor>) -> bool {
        if !is_identifier(alias) {
            warn!("invalid alias '{alias}' rejected");
            return false;
        }
        if self.functions.contains_key(alias) {
            debug!("alias '{alias}' already taken, skipped");
            return false;
        }
        self.functions.insert(alias.to_owned(), Arc::clone(descriptor));
        true
    }

    /// Make `alias` another name for the registered function `existing`.
    pub fn add_alias(&mut self, alias: &str, existing: &str) -> bool {
        match self.functions.get(existing).cloned() {
            Some(descriptor) => self.insert_alias(alias, &descriptor),
            None => false,
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn is_logic(&self, name: &str) -> bool {
        self.functions.get(name).is_some_and(|f| f.logic)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<FunctionDescriptor>> {
        self.functions.get(name)
    }

    pub fn module(&self, id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Whether `name` is registered and accepts `count` arguments.
    pub fn accepts(&self, name: &str, count: usize) -> bool {
        self.functions.get(name).is_some_and(|f| count >= f.min_params)
    }

    /// Invoke `name`; `None` when it is unknown or given too few arguments.
    pub fn call(
        &self,
        script: &mut Script,
        name: &str,
        args: &[Value],
    ) -> Option<Result<Value, FunctionError>> {
        let descriptor = self.functions.get(name)?;
        if args.len() < descriptor.min_params {
            debug!(
                "{name}: {} argument(s) given, {} required",
                args.len(),
                descriptor.min_params
            );
            return None;
        }
        Some(descriptor.call(script, args))
    }

    /// Human-readable function listing, optionally limited to one module.
    pub fn dump(&self, module_filter: Option<&str>, width: usize) -> Vec<String> {
        let rule = |c: char| c.to_string().repeat(width);
        let mut out = vec![
            rule('*'),
            format!("ntscript version {}", env!("CARGO_PKG_VERSION")),
            rule('*'),
            String::new(),
            "Available functions:".to_owned(),
            String::new(),
        ];
        let mut count = 0;
        for module in &self.modules {
            if module_filter.is_some_and(|id| id != module.id) {
                continue;
            }
            out.push(rule('-'));
            out.push(format!("{} ({})", module.description, module.id));
            out.push(rule('-'));
            for f in &module.functions {
                // Skip functions shadowed by an earlier registration.
                if !self.get(&f.name).is_some_and(|g| Arc::ptr_eq(g, f)) {
                    continue;
                }
                out.push(format!(
                    "{FUNCTION_IDENTIFIER}{}{FUNCTION_PARAM_START}{}{FUNCTION_PARAM_END}",
                    f.name, f.syntax
                ));
                if !f.description.is_empty() {
                    wrap_text(&mut out, &f.description, width, 5);
                }
                out.push(String::new());
                count += 1;
            }
            out.push(String::new());
        }
        out.push(format!("Total functions: {count}"));
        out
    }
}

/// Word-wrap `text` into `out`, indenting every line by `indent` spaces.
fn wrap_text(out: &mut Vec<String>, text: &str, width: usize, indent: usize) {
    let max = width.saturating_sub(indent).max(1);
    let pad = " ".repeat(indent);
    for line in text.lines() {
        if line.trim().is_empty() {
            out.push(String::new());
            continue;
        }
        let mut current = String::new();
        for word in line.split_whitespace() {
            let needed = if current.is_empty() { 0 } else { 1 } + word.chars().count();
            if !current.is_empty() && current.chars().count() + needed > max {
                out.push(format!("{pad}{current}"));
                current.clear();
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            out.push(format!("{pad}{current}"));
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
