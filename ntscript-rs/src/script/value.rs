//! Runtime value type for template expressions.
//!
//! Script output is text at heart, but a single `$var` or `#func()` can
//! carry any host value (a list, a map, a host object) through to an
//! enclosing function's argument list.  Values are cheap to clone: the
//! structured variants are reference counted.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::error::AccessError;

// ── ScriptObject ──────────────────────────────────────────────────────────────

/// A host object whose members are exposed as script variables.
///
/// The object context resolves `$name` by calling the method `get<name>`;
/// implementors should compare method names case-insensitively and return
/// [`AccessError::NoSuchMethod`] for anything they do not expose.
pub trait ScriptObject: fmt::Debug + Send + Sync {
    /// Invoke a zero-argument method such as `getName`.
    fn call(&self, method: &str) -> Result<Value, AccessError>;

    /// Text used when the object is concatenated into output.
    fn to_text(&self) -> String {
        String::new()
    }
}

// ── ValueMap ──────────────────────────────────────────────────────────────────

/// Insertion-ordered key/value map used for map-like host data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap {
    entries: Vec<(String, Value)>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`, keeping the original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Exact-key lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Lookup trying the spellings from [`name_variants`] in order.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        name_variants(name).iter().find_map(|n| self.get(n))
    }

    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// The key spellings tried for a variable name, in priority order:
/// as given, `Capitalized`, `lowercase`, `UPPERCASE`.
pub fn name_variants(name: &str) -> [String; 4] {
    let lower = name.to_lowercase();
    let mut chars = lower.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    [name.to_owned(), capitalized, lower, name.to_uppercase()]
}

// ── Value ─────────────────────────────────────────────────────────────────────

/// A script runtime value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// "No result": unknown variables, empty trees, skipped logic branches.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Arc<Vec<Value>>),
    Map(Arc<ValueMap>),
    Object(Arc<dyn ScriptObject>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => f.write_str(if *b { "1" } else { "" }),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Map(map) => {
                for (i, value) in map.values().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                Ok(())
            }
            Value::Object(obj) => f.write_str(&obj.to_text()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Maps and host objects can be used as a variable context.
    pub fn is_structured(&self) -> bool {
        matches!(self, Value::Map(_) | Value::Object(_))
    }

    /// Coerce to boolean: null, `false`, `0`, `""`, `"0"` and empty
    /// collections are falsy.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty() && s != "0",
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Numeric view of the value, if it has one.  Strings must parse
    /// completely (after trimming) as an integer or a float.
    pub fn as_number(&self) -> Option<Value> {
        match self {
            Value::Int(_) | Value::Float(_) => Some(self.clone()),
            Value::Bool(b) => Some(Value::Int(*b as i64)),
            Value::Str(s) => {
                let s = s.trim();
                if let Ok(n) = s.parse::<i64>() {
                    Some(Value::Int(n))
                } else {
                    s.parse::<f64>().ok().filter(|x| x.is_finite()).map(Value::Float)
                }
            }
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_number().is_some()
    }

    /// Coerce to `i64` (0 when the value is not numeric).
    pub fn as_int(&self) -> i64 {
        match self.as_number() {
            Some(Value::Int(n)) => n,
            Some(Value::Float(x)) => x as i64,
            _ => 0,
        }
    }

    /// Coerce to `f64` (0.0 when the value is not numeric).
    pub fn as_float(&self) -> f64 {
        match self.as_number() {
            Some(Value::Int(n)) => n as f64,
            Some(Value::Float(x)) => x,
            _ => 0.0,
        }
    }

    /// Coerce to a string.
    pub fn as_str(&self) -> String {
        self.to_string()
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "real",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    // ── Arithmetic helpers ────────────────────────────────────────────────────

    /// Determine the common numeric type for a binary operation.
    fn numeric_promote(a: &Value, b: &Value) -> (f64, f64, bool) {
        let is_float = matches!(a.as_number(), Some(Value::Float(_)))
            || matches!(b.as_number(), Some(Value::Float(_)));
        (a.as_float(), b.as_float(), is_float)
    }

    fn make_numeric(f: f64, is_float: bool) -> Value {
        if is_float {
            Value::Float(f)
        } else {
            Value::Int(f as i64)
        }
    }

    pub fn arith_add(&self, rhs: &Value) -> Value {
        if let (Some(Value::Int(a)), Some(Value::Int(b))) = (self.as_number(), rhs.as_number()) {
            return Value::Int(a.wrapping_add(b));
        }
        let (a, b, is_float) = Self::numeric_promote(self, rhs);
        Self::make_numeric(a + b, is_float)
    }

    pub fn arith_sub(&self, rhs: &Value) -> Value {
        if let (Some(Value::Int(a)), Some(Value::Int(b))) = (self.as_number(), rhs.as_number()) {
            return Value::Int(a.wrapping_sub(b));
        }
        let (a, b, is_float) = Self::numeric_promote(self, rhs);
        Self::make_numeric(a - b, is_float)
    }

    pub fn arith_mul(&self, rhs: &Value) -> Value {
        if let (Some(Value::Int(a)), Some(Value::Int(b))) = (self.as_number(), rhs.as_number()) {
            return Value::Int(a.wrapping_mul(b));
        }
        let (a, b, is_float) = Self::numeric_promote(self, rhs);
        Self::make_numeric(a * b, is_float)
    }

    /// Division yields an integer only when it is exact.
    pub fn arith_div(&self, rhs: &Value) -> Result<Value, String> {
        let (a, b, is_float) = Self::numeric_promote(self, rhs);
        if b == 0.0 {
            return Err("division by zero".into());
        }
        let q = a / b;
        Ok(Self::make_numeric(q, is_float || q.fract() != 0.0))
    }

    /// Integer remainder; `i64::MIN % -1` wraps to 0.
    pub fn arith_rem(&self, rhs: &Value) -> Result<Value, String> {
        let (a, b) = (self.as_int(), rhs.as_int());
        if b == 0 {
            return Err("modulo by zero".into());
        }
        Ok(Value::Int(a.wrapping_rem(b)))
    }

    /// Loose comparison: numeric when both sides are numeric, otherwise by
    /// string form.
    pub fn loose_cmp(&self, rhs: &Value) -> Ordering {
        match (self.as_number(), rhs.as_number()) {
            (Some(a), Some(b)) => {
                let (a, b, _) = Self::numeric_promote(&a, &b);
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            }
            _ => self.to_string().cmp(&rhs.to_string()),
        }
    }

    pub fn loose_eq(&self, rhs: &Value) -> bool {
        self.loose_cmp(rhs) == Ordering::Equal
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Map(Arc::new(map))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(0.0)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::from(items.into_iter().map(Value::from).collect::<Vec<_>>())
            }
            serde_json::Value::Object(obj) => Value::from(obj.into_iter().collect::<ValueMap>()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
