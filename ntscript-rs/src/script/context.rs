//! Context resolution.
//!
//! A *context* is the host value that `$name` is looked up in.  Which
//! lookup strategy applies is decided by a prioritized list of
//! [`ContextHandler`]s: the first handler (highest band first, insertion
//! order within a band) that can handle the value owns it.
//!
//! Two handlers are installed at [`Priority::Low`] by default:
//!
//! - [`ObjectContext`] for [`Value::Object`]: `$name` calls `getName`.
//! - [`MapContext`] for [`Value::Map`]: `$name` tries `name`, `Name`,
//!   `name` lowercased and `NAME`, first hit wins.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use log::debug;

use super::error::AccessError;
use super::tokenizer::{is_identifier, VARIABLE_SEPARATOR};
use super::value::{name_variants, Value, ValueMap};

/// Deferred read of one member of a context value.
pub type Accessor = Box<dyn FnOnce() -> Result<Value, AccessError>>;

/// Handler priority band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

/// A lookup strategy for one family of host values.
pub trait ContextHandler: Send {
    fn can_handle(&self, context: &Value) -> bool;

    /// Build an accessor for `name`, or `None` when the name cannot be
    /// addressed in this context at all.
    fn accessor(&self, context: &Value, name: &str) -> Option<Accessor>;

    /// An identifying key and a display label for the context value.
    fn key_value(&self, _context: &Value) -> Option<(Value, String)> {
        None
    }
}

// ── ObjectContext ─────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ObjectContext;

impl ContextHandler for ObjectContext {
    fn can_handle(&self, context: &Value) -> bool {
        matches!(context, Value::Object(_))
    }

    fn accessor(&self, context: &Value, name: &str) -> Option<Accessor> {
        let Value::Object(obj) = context else {
            return None;
        };
        if !is_identifier(name) {
            return None;
        }
        let obj = Arc::clone(obj);
        let method = format!("get{name}");
        Some(Box::new(move || obj.call(&method)))
    }

    fn key_value(&self, context: &Value) -> Option<(Value, String)> {
        let Value::Object(obj) = context else {
            return None;
        };
        let id = obj.call("getId").ok()?;
        Some((id, obj.to_text()))
    }
}

// ── MapContext ────────────────────────────────────────────────────────────────

/// Key index for one map, built on first access.
#[derive(Debug)]
struct MapAdapter {
    index: HashMap<String, usize>,
}

impl MapAdapter {
    fn new(map: &ValueMap) -> Self {
        let index = map
            .keys()
            .enumerate()
            .map(|(i, k)| (k.to_owned(), i))
            .collect();
        MapAdapter { index }
    }

    fn lookup(&self, map: &ValueMap, name: &str) -> Option<Value> {
        name_variants(name)
            .iter()
            .find_map(|n| self.index.get(n))
            .and_then(|&i| map.entries().get(i))
            .map(|(_, v)| v.clone())
    }
}

/// Map lookups, with one memoized [`MapAdapter`] per distinct map.
///
/// Adapters are keyed by the identity of the map's allocation and hold only
/// a weak reference to it.  Entries whose map has been dropped are pruned
/// whenever the memo doubles in size, so it tracks the maps still alive
/// rather than every map ever seen.
#[derive(Debug)]
pub struct MapContext {
    adapters: RefCell<HashMap<usize, (Weak<ValueMap>, Arc<MapAdapter>)>>,
    prune_at: Cell<usize>,
}

const MIN_PRUNE_AT: usize = 64;

impl Default for MapContext {
    fn default() -> Self {
        MapContext {
            adapters: RefCell::default(),
            prune_at: Cell::new(MIN_PRUNE_AT),
        }
    }
}

impl MapContext {
    fn adapter(&self, map: &Arc<ValueMap>) -> Arc<MapAdapter> {
        let key = Arc::as_ptr(map) as usize;
        let mut adapters = self.adapters.borrow_mut();
        if let Some((weak, adapter)) = adapters.get(&key) {
            if weak.upgrade().is_some_and(|m| Arc::ptr_eq(&m, map)) {
                return Arc::clone(adapter);
            }
        }
        if adapters.len() >= self.prune_at.get() {
            adapters.retain(|_, (weak, _)| weak.strong_count() > 0);
            self.prune_at.set((adapters.len() * 2).max(MIN_PRUNE_AT));
        }
        let adapter = Arc::new(MapAdapter::new(map));
        adapters.insert(key, (Arc::downgrade(map), Arc::clone(&adapter)));
        adapter
    }

    /// Number of maps currently memoized.
    pub fn memoized(&self) -> usize {
        self.adapters.borrow().len()
    }
}

impl ContextHandler for MapContext {
    fn can_handle(&self, context: &Value) -> bool {
        matches!(context, Value::Map(_))
    }

    fn accessor(&self, context: &Value, name: &str) -> Option<Accessor> {
        let Value::Map(map) = context else {
            return None;
        };
        if !is_identifier(name) {
            return None;
        }
        let adapter = self.adapter(map);
        let map = Arc::clone(map);
        let name = name.to_owned();
        Some(Box::new(move || {
            adapter
                .lookup(&map, &name)
                .ok_or(AccessError::NoSuchKey(name))
        }))
    }

    fn key_value(&self, context: &Value) -> Option<(Value, String)> {
        let Value::Map(map) = context else {
            return None;
        };
        let mut values = map.values();
        let first = values.next()?.clone();
        let rest: Vec<String> = values.map(Value::to_string).collect();
        let label = if rest.is_empty() {
            first.to_string()
        } else {
            rest.join(" - ")
        };
        Some((first, label))
    }
}

// ── ContextResolver ───────────────────────────────────────────────────────────

/// Ordered set of context handlers.
pub struct ContextResolver {
    handlers: Vec<(Priority, Box<dyn ContextHandler>)>,
}

impl Default for ContextResolver {
    fn default() -> Self {
        let mut resolver = ContextResolver::empty();
        resolver.install(ObjectContext, Priority::Low);
        resolver.install(MapContext::default(), Priority::Low);
        resolver
    }
}

impl std::fmt::Debug for ContextResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextResolver")
            .field("handlers", &self.handlers.iter().map(|(p, _)| *p).collect::<Vec<_>>())
            .finish()
    }
}

impl ContextResolver {
    /// A resolver with the built-in object and map handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver with no handlers at all.
    pub fn empty() -> Self {
        ContextResolver {
            handlers: Vec::new(),
        }
    }

    /// Add a handler after every other handler of the same band.
    pub fn install(&mut self, handler: impl ContextHandler + 'static, priority: Priority) {
        let at = self
            .handlers
            .iter()
            .position(|(p, _)| *p < priority)
            .unwrap_or(self.handlers.len());
        self.handlers.insert(at, (priority, Box::new(handler)));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// The handler owning `context`.
    pub fn handler_for(&self, context: &Value) -> Option<&dyn ContextHandler> {
        self.handlers
            .iter()
            .find(|(_, h)| h.can_handle(context))
            .map(|(_, h)| h.as_ref())
    }

    /// Read a single (undotted) member of `context`.
    pub fn get(&self, context: &Value, name: &str) -> Option<Value> {
        if !is_identifier(name) {
            return None;
        }
        let accessor = self.handler_for(context)?.accessor(context, name)?;
        match accessor() {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("cannot read '{name}' from {}: {e}", context.type_name());
                None
            }
        }
    }

    /// Resolve a possibly dotted path such as `order.customer.name`.
    /// Every intermediate value must itself be a map or an object.
    pub fn resolve(&self, context: &Value, path: &str) -> Option<Value> {
        let mut segments = path.split(VARIABLE_SEPARATOR);
        let mut value = self.get(context, segments.next()?)?;
        for segment in segments {
            if !value.is_structured() {
                return None;
            }
            value = self.get(&value, segment)?;
        }
        Some(value)
    }

    pub fn key_value(&self, context: &Value) -> Option<(Value, String)> {
        self.handler_for(context)?.key_value(context)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
