//! Script evaluator.
//!
//! A [`Script`] walks a [`Token`] tree depth first and produces a
//! [`Value`].  It owns all per-evaluation state: the active context, the
//! saved-context stack, the iteration state and the context resolver.  The
//! function [`Registry`] is shared.
//!
//! Evaluation never fails.  Unknown variables and functions, accessor
//! failures and handler errors all degrade to "no result" (or to the
//! original source text when `keep_unknown` is set).  Only misuse of the
//! context stack is reported, as a [`ScriptError`].

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use super::context::{ContextHandler, ContextResolver, Priority};
use super::error::ScriptError;
use super::iter::{ContextIterator, ContextSource};
use super::parser::Parser;
use super::registry::Registry;
use super::token::{Token, TokenKind};
use super::value::Value;

/// Variable values resolved during one evaluation.
type VarCache = HashMap<String, Value>;

// ── Script ────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Script {
    registry: Arc<Registry>,
    resolver: ContextResolver,
    context: Option<Value>,
    stack: Vec<Value>,
    iterator: Option<ContextIterator>,
    keep_unknown: bool,
    notify: bool,
}

impl Script {
    pub fn new(registry: Arc<Registry>) -> Self {
        Script {
            registry,
            resolver: ContextResolver::new(),
            context: None,
            stack: Vec::new(),
            iterator: None,
            keep_unknown: false,
            notify: true,
        }
    }

    /// Keep the source text of unknown variables and functions instead of
    /// dropping them.
    pub fn with_keep_unknown(mut self, keep: bool) -> Self {
        self.keep_unknown = keep;
        self
    }

    /// Whether [`each`](Self::each) notifies registry listeners.
    pub fn with_notify(mut self, notify: bool) -> Self {
        self.notify = notify;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn keep_unknown(&self) -> bool {
        self.keep_unknown
    }

    pub fn set_keep_unknown(&mut self, keep: bool) {
        self.keep_unknown = keep;
    }

    pub fn resolver(&self) -> &ContextResolver {
        &self.resolver
    }

    /// Install a custom context handler for this script.
    pub fn install_handler(&mut self, handler: impl ContextHandler + 'static, priority: Priority) {
        self.resolver.install(handler, priority);
    }

    // ── Active context ────────────────────────────────────────────────────────

    pub fn context(&self) -> Option<&Value> {
        self.context.as_ref()
    }

    pub fn set_context(&mut self, context: impl Into<Value>) -> &mut Self {
        self.context = Some(context.into());
        self
    }

    pub fn clear_context(&mut self) -> Option<Value> {
        self.context.take()
    }

    /// Save the active context on the stack.
    pub fn push_context(&mut self) -> Result<(), ScriptError> {
        let context = self.context.clone().ok_or(ScriptError::NoContext)?;
        self.stack.push(context);
        Ok(())
    }

    /// Restore the most recently saved context.
    pub fn pop_context(&mut self) -> Result<(), ScriptError> {
        let context = self.stack.pop().ok_or(ScriptError::EmptyContextStack)?;
        self.context = Some(context);
        Ok(())
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Run `f` with `context` active, then restore the previous context.
    pub fn with_context<R>(&mut self, context: impl Into<Value>, f: impl FnOnce(&mut Script) -> R) -> R {
        let saved = self.context.replace(context.into());
        let result = f(self);
        self.context = saved;
        result
    }

    /// Resolve `name` (possibly dotted) against the active context.
    pub fn get_var(&self, name: &str) -> Option<Value> {
        let context = self.context.as_ref()?;
        self.resolver.resolve(context, name)
    }

    /// Key and label of the active context.
    pub fn key_value(&self) -> Option<(Value, String)> {
        self.resolver.key_value(self.context.as_ref()?)
    }

    // ── Iteration ─────────────────────────────────────────────────────────────

    pub fn set_objects(&mut self, source: impl Into<ContextSource>) -> &mut Self {
        self.iterator = Some(ContextIterator::new(source));
        self
    }

    pub fn iterator(&self) -> Option<&ContextIterator> {
        self.iterator.as_ref()
    }

    /// Run `f` once per element of the current objects, with that element
    /// as the active context.
    pub fn each(&mut self, f: impl FnMut(&mut Script)) -> &mut Self {
        let notify = self.notify;
        self.each_with(notify, f)
    }

    pub fn each_with(&mut self, notify: bool, mut f: impl FnMut(&mut Script)) -> &mut Self {
        let count = match &self.iterator {
            Some(it) => it.source().elements().len(),
            None => return self,
        };
        for i in 0..count {
            let Some(element) = self.iterator.as_mut().and_then(|it| it.seek(i)).cloned() else {
                break;
            };
            self.context = Some(element);
            if notify {
                self.notify_context_change();
            }
            f(self);
        }
        self
    }

    fn notify_context_change(&self) {
        let registry = Arc::clone(&self.registry);
        for listener in registry.listeners() {
            listener.on_context_change(self);
        }
    }

    /// Current 1-based record number; 0 outside iteration.
    pub fn recno(&self) -> usize {
        self.iterator.as_ref().map_or(0, ContextIterator::recno)
    }

    pub fn rec_count(&self) -> usize {
        self.iterator.as_ref().map_or(0, ContextIterator::rec_count)
    }

    /// Run `f` on a fresh script sharing this one's registry and context
    /// handlers, with listener notification off.
    pub fn sub_script<R>(&mut self, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut sub = Script::new(Arc::clone(&self.registry))
            .with_keep_unknown(self.keep_unknown)
            .with_notify(false);
        std::mem::swap(&mut sub.resolver, &mut self.resolver);
        let result = f(&mut sub);
        std::mem::swap(&mut sub.resolver, &mut self.resolver);
        result
    }

    // ── Evaluation ────────────────────────────────────────────────────────────

    /// Tokenize and evaluate `text` against the active context.
    pub fn evaluate(&mut self, text: &str) -> Value {
        match Parser::parse(text).token() {
            Some(tree) => self.evaluate_token(tree),
            None => Value::Null,
        }
    }

    /// Evaluate `text` against `context`, leaving the active context as is.
    pub fn evaluate_with(&mut self, text: &str, context: impl Into<Value>) -> Value {
        self.with_context(context, |script| script.evaluate(text))
    }

    /// Evaluate an already tokenized tree against the active context.
    pub fn evaluate_token(&mut self, tree: &Token) -> Value {
        let mut cache = VarCache::new();
        self.eval_node(tree, &mut cache)
    }

    /// Evaluate `tree` against an explicit context and unknown-name policy.
    pub fn evaluate_tree(&mut self, tree: &Token, context: Option<Value>, keep_unknown: bool) -> Value {
        let saved_context = std::mem::replace(&mut self.context, context);
        let saved_keep = std::mem::replace(&mut self.keep_unknown, keep_unknown);
        let result = self.evaluate_token(tree);
        self.context = saved_context;
        self.keep_unknown = saved_keep;
        result
    }

    fn eval_node(&mut self, token: &Token, cache: &mut VarCache) -> Value {
        match token.kind() {
            TokenKind::Text => Value::Str(token.content().to_owned()),
            TokenKind::Group => self.eval_group(token.children(), cache),
            TokenKind::Variable => self.eval_variable(token, cache),
            TokenKind::Function => self.eval_function(token, cache),
        }
    }

    fn eval_group(&mut self, children: &[Token], cache: &mut VarCache) -> Value {
        let mut result: Option<Value> = None;
        for child in children {
            let value = self.eval_node(child, cache);
            if value.is_null() {
                continue;
            }
            result = Some(match result {
                None => value,
                Some(Value::Str(mut text)) => {
                    text.push_str(&value.to_string());
                    Value::Str(text)
                }
                Some(prev) => Value::Str(format!("{prev}{value}")),
            });
        }
        result.unwrap_or_default()
    }

    fn eval_variable(&mut self, token: &Token, cache: &mut VarCache) -> Value {
        let name = token.name().unwrap_or_default();
        if let Some(value) = cache.get(name) {
            return value.clone();
        }
        match self.get_var(name) {
            Some(value) => {
                cache.insert(name.to_owned(), value.clone());
                value
            }
            None if self.keep_unknown => Value::Str(token.content().to_owned()),
            None => Value::Null,
        }
    }

    fn eval_function(&mut self, token: &Token, cache: &mut VarCache) -> Value {
        let name = token.name().unwrap_or_default();
        let logic = self.registry.is_logic(name);
        let mut args: Vec<Value> = Vec::with_capacity(token.children().len());
        for (i, param) in token.children().iter().enumerate() {
            let skip = logic
                && match i {
                    1 => !args[0].as_bool(),
                    2 => args[0].as_bool(),
                    _ => false,
                };
            let value = if skip { Value::Null } else { self.eval_node(param, cache) };
            args.push(value);
        }

        let registry = Arc::clone(&self.registry);
        match registry.call(self, name, &args) {
            Some(Ok(value)) => value,
            Some(Err(e)) => {
                debug!("#{name}: {e}");
                Value::Null
            }
            None if self.keep_unknown => Value::Str(token.content().to_owned()),
            None => Value::Str(String::new()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::script::error::FunctionError;
    use crate::script::iter::PartialObject;
    use crate::script::registry::{FunctionDescriptor, Module};
    use crate::script::value::ValueMap;

    fn registry(log: Arc<Mutex<Vec<String>>>) -> Arc<Registry> {
        let mut r = Registry::new();
        let calls = Arc::clone(&log);
        r.register_module(
            Module::new("test", "Test")
                .function(FunctionDescriptor::new("test", |_, _| Ok(Value::from("TEST"))))
                .function(FunctionDescriptor::new("mark", move |_, args| {
                    let mut calls = calls.lock().map_err(|e| FunctionError::Failed(e.to_string()))?;
                    calls.push(args.first().map(Value::to_string).unwrap_or_default());
                    Ok(Value::Null)
                }))
                .function(
                    FunctionDescriptor::new("if", |_, args| {
                        let pick = if args[0].as_bool() { 1 } else { 2 };
                        Ok(args.get(pick).cloned().unwrap_or_default())
                    })
                    .min_params(2)
                    .logic(),
                )
                .function(FunctionDescriptor::new("len", |_, args| {
                    Ok(Value::from(args[0].to_string().chars().count()))
                }).min_params(1))
                .function(FunctionDescriptor::new("list", |_, _| {
                    Ok(Value::from(vec![Value::Int(1), Value::Int(2)]))
                }))
                .function(FunctionDescriptor::new("first", |_, args| match &args[0] {
                    Value::List(items) => Ok(items.first().cloned().unwrap_or_default()),
                    other => Err(format!("not a list: {}", other.type_name()).into()),
                }).min_params(1))
                .function(FunctionDescriptor::new("recno", |s, _| Ok(Value::from(s.recno())))),
        );
        Arc::new(r)
    }

    fn script() -> Script {
        Script::new(registry(Arc::default()))
    }

    fn ctx() -> Value {
        Value::from(ValueMap::new().with("var", "something").with("VAR3", "VAR3"))
    }

    #[test]
    fn plain_text_is_identity() {
        let mut s = script();
        assert_eq!(s.evaluate("this text is indeed not long."), Value::from("this text is indeed not long."));
        assert_eq!(s.evaluate("123"), Value::from("123"));
        assert_eq!(s.evaluate(""), Value::Null);
    }

    #[test]
    fn variables() {
        let mut s = script();
        s.set_context(ctx());
        assert_eq!(s.evaluate("$var"), Value::from("something"));
        assert_eq!(s.evaluate("$VAR3"), Value::from("VAR3"));
        assert_eq!(s.evaluate("$notexist"), Value::Null);
        assert_eq!(s.evaluate("[$notexist]"), Value::from("[]"));
    }

    #[test]
    fn keep_unknown() {
        let mut s = script().with_keep_unknown(true);
        s.set_context(ctx());
        assert_eq!(s.evaluate("$nope #nope(a, b); $var"), Value::from("$nope #nope(a, b); something"));
        s.set_keep_unknown(false);
        assert_eq!(s.evaluate("$nope #nope(a) $var"), Value::from("  something"));
    }

    #[test]
    fn nested_calls() {
        let mut s = script();
        assert_eq!(s.evaluate("#len(#test())"), Value::Int(4));
        assert_eq!(s.evaluate("#len(\"#test()\")"), Value::Int(4));
        assert_eq!(s.evaluate("#len(\"something(with) to #test()\")"), Value::Int(23));
    }

    #[test]
    fn raw_values_flow_into_arguments() {
        let mut s = script();
        assert_eq!(s.evaluate("#first(#list())"), Value::Int(1));
        assert_eq!(s.evaluate("#first( #list())"), Value::Int(1));
        assert_eq!(s.evaluate("#first(x#list())"), Value::Null);
        assert_eq!(s.evaluate("#list()!"), Value::from("1, 2!"));
    }

    #[test]
    fn arity_shortfall_is_unknown() {
        let mut s = script();
        assert_eq!(s.evaluate("<#len()>"), Value::from("<>"));
        s.set_keep_unknown(true);
        assert_eq!(s.evaluate("<#len()>"), Value::from("<#len()>"));
    }

    #[test]
    fn logic_branches_short_circuit() {
        let log: Arc<Mutex<Vec<String>>> = Arc::default();
        let mut s = Script::new(registry(Arc::clone(&log)));
        assert_eq!(s.evaluate("#if(0,\"ME\")"), Value::Null);
        assert_eq!(s.evaluate("#if(1,\"ME\",\"YOU\")"), Value::from("ME"));
        assert_eq!(s.evaluate("#if(0,\"ME\",\"YOU\")"), Value::from("YOU"));
        s.evaluate("#if(1,#mark(yes),#mark(no))#if(0,#mark(a),#mark(b))");
        assert_eq!(*log.lock().unwrap(), vec!["yes", "b"]);
    }

    #[test]
    fn context_stack() {
        let mut s = script();
        assert_eq!(s.push_context(), Err(ScriptError::NoContext));
        assert_eq!(s.pop_context(), Err(ScriptError::EmptyContextStack));
        s.set_context(ctx());
        s.push_context().unwrap();
        s.set_context(ValueMap::new().with("var", "other"));
        assert_eq!(s.evaluate("$var"), Value::from("other"));
        s.pop_context().unwrap();
        assert_eq!(s.evaluate("$var"), Value::from("something"));
        assert_eq!(s.stack_depth(), 0);
    }

    #[test]
    fn clear_context_hands_back_the_value() {
        let mut s = script();
        s.set_context(ctx());
        assert_eq!(s.clear_context(), Some(ctx()));
        assert!(s.context().is_none());
        assert_eq!(s.evaluate("[$var]"), Value::from("[]"));
        assert_eq!(s.clear_context(), None);
    }

    #[test]
    fn with_context_restores() {
        let mut s = script();
        let out = s.evaluate_with("$var!", ctx());
        assert_eq!(out, Value::from("something!"));
        assert!(s.context().is_none());
    }

    #[test]
    fn evaluate_tree_explicit() {
        let mut s = script();
        let parsed = Parser::parse("$var $x");
        let tree = parsed.token().unwrap();
        assert_eq!(s.evaluate_tree(tree, Some(ctx()), true), Value::from("something $x"));
        assert!(s.context().is_none());
        assert!(!s.keep_unknown());
    }

    #[test]
    fn iteration_numbers_records() {
        let mut s = script();
        let items: Vec<Value> = ["A1", "A2", "A3"]
            .iter()
            .map(|v| Value::from(ValueMap::new().with("var", *v)))
            .collect();
        let mut seen = Vec::new();
        s.set_objects(items).each(|s| {
            seen.push((s.evaluate("$Var"), s.evaluate("#recno()")));
        });
        assert_eq!(
            seen,
            vec![
                (Value::from("A1"), Value::Int(1)),
                (Value::from("A2"), Value::Int(2)),
                (Value::from("A3"), Value::Int(3)),
            ]
        );
        assert_eq!(s.rec_count(), 3);
    }

    #[test]
    fn partial_window() {
        let mut s = script();
        let items = vec![Value::from("B1"), Value::from("B2"), Value::from("B3")];
        let mut recnos = Vec::new();
        s.set_objects(PartialObject::new(items, 5, 10)).each(|s| recnos.push(s.recno()));
        assert_eq!(recnos, vec![6, 7, 8]);
        assert_eq!(s.rec_count(), 10);
    }

    /// Answers every name with its uppercase form.
    struct Shout;

    impl ContextHandler for Shout {
        fn can_handle(&self, context: &Value) -> bool {
            matches!(context, Value::Map(_))
        }

        fn accessor(&self, _context: &Value, name: &str) -> Option<crate::script::context::Accessor> {
            let out = name.to_uppercase();
            Some(Box::new(move || Ok(Value::Str(out))))
        }
    }

    #[test]
    fn installed_handler_takes_precedence() {
        let mut s = script();
        s.set_context(ctx());
        assert_eq!(s.evaluate("$x"), Value::Null);
        s.install_handler(Shout, Priority::High);
        assert_eq!(s.resolver().len(), 3);
        assert_eq!(s.evaluate("$x"), Value::from("X"));
        assert_eq!(s.evaluate("$var"), Value::from("VAR"));
        let out = s.sub_script(|sub| sub.evaluate_with("$y", ValueMap::new()));
        assert_eq!(out, Value::from("Y"));
    }

    #[test]
    fn substituted_text_is_not_rescanned() {
        let mut s = script();
        s.set_context(ValueMap::new().with("a", "#test() $b").with("b", "no"));
        assert_eq!(s.evaluate("[$a]"), Value::from("[#test() $b]"));
        assert_eq!(s.evaluate("#len($a)"), Value::Int(10));
    }

    #[test]
    fn sub_script_shares_registry() {
        let mut s = script();
        s.set_context(ctx());
        let out = s.sub_script(|sub| {
            assert!(sub.context().is_none());
            sub.evaluate("#test()")
        });
        assert_eq!(out, Value::from("TEST"));
        assert_eq!(s.resolver().len(), 2);
    }
}
