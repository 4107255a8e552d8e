//! End-to-end evaluation against host objects, maps and a registry that
//! mixes the system modules with a module contributed by a listener.

use std::sync::{Arc, Mutex};

use ntscript::script::builtins::SystemProvider;
use ntscript::script::{
    AccessError, FunctionDescriptor, Listener, Module, PartialObject, Registry, Script, ScriptObject, Value,
    ValueMap,
};

// ── Host objects ──────────────────────────────────────────────────────────────

/// Object exposing a few getters; anything else falls through to its map.
#[derive(Debug)]
struct Record {
    var: Option<String>,
    extra: ValueMap,
}

impl Record {
    fn new(var: Option<&str>) -> Value {
        Value::Object(Arc::new(Record {
            var: var.map(str::to_owned),
            extra: ValueMap::new().with("test1", "TEST1").with("TEST2", "TEST2"),
        }))
    }
}

impl ScriptObject for Record {
    fn call(&self, method: &str) -> Result<Value, AccessError> {
        match method.to_lowercase().as_str() {
            "gettest" => Ok(Value::from("something")),
            "getvar" => Ok(Value::from(self.var.clone())),
            _ => method
                .get(3..)
                .and_then(|key| self.extra.lookup(key))
                .cloned()
                .ok_or_else(|| AccessError::NoSuchMethod(method.to_owned())),
        }
    }
}

#[derive(Debug)]
struct Document;

impl ScriptObject for Document {
    fn call(&self, method: &str) -> Result<Value, AccessError> {
        let records = || {
            Value::from(vec![
                Record::new(Some("X1")),
                Record::new(Some("X2")),
                Record::new(Some("X3")),
            ])
        };
        match method.to_lowercase().as_str() {
            "getvar" => Ok(Value::from("something")),
            "getvar2" => Ok(Record::new(None)),
            "getvar3" => Ok(Value::from("VAR3")),
            "getvar4" | "getvar5" => Ok(records()),
            _ => Err(AccessError::NoSuchMethod(method.to_owned())),
        }
    }
}

// ── Listener-contributed module ───────────────────────────────────────────────

struct TestModules;

impl Listener for TestModules {
    fn on_modules_registered(&self, registry: &mut Registry) {
        let calls: Arc<Mutex<Vec<&'static str>>> = Arc::default();
        let (record, report) = (Arc::clone(&calls), calls);
        registry.register_module(
            Module::new("test.core", "Test functions")
                .function(
                    FunctionDescriptor::new("callme", move |_, _| {
                        record.lock().map_err(|e| e.to_string())?.push("CALL");
                        Ok(Value::Null)
                    })
                    .description("Call me function."),
                )
                .function(
                    FunctionDescriptor::new("callres", move |_, _| {
                        Ok(Value::Str(report.lock().map_err(|e| e.to_string())?.concat()))
                    })
                    .description("Call me result function."),
                )
                .function(
                    FunctionDescriptor::new("test", |_, _| Ok(Value::from("TEST"))).description("Test function."),
                ),
        );
    }
}

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.bootstrap(&[&SystemProvider::new()], vec![Arc::new(TestModules) as Arc<dyn Listener>]);
    registry
}

fn script() -> Script {
    Script::new(Arc::new(registry()))
}

fn text(script: &mut Script, src: &str) -> String {
    script.evaluate(src).to_string()
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[test]
fn modules_and_functions_registered() {
    let modules: &[(&str, &[&str])] = &[
        ("system.array", &["each", "lcreate", "ladd", "lconcat"]),
        ("system.context", &["recno", "reccnt"]),
        ("system.core", &["func", "var", "null"]),
        ("system.counter", &["cget", "cset", "creset", "cinc", "cdec", "series"]),
        (
            "system.logic",
            &["if", "cmp", "eq", "neq", "leq", "geq", "ls", "gr", "and", "or", "not", "isnull"],
        ),
        ("system.math", &["sum", "sub", "mul", "div", "mod", "inc", "dec", "int", "numonly"]),
        ("system.stack", &["sclr", "sexist", "spush", "spop"]),
        ("system.date", &["fmtdate", "dtafter", "dtbefore", "dtpart", "time"]),
        (
            "system.string",
            &[
                "split", "ucfirst", "ucwords", "upper", "lower", "trim", "concat", "concatw", "concatall",
                "spaceconcat", "repeat", "pos", "strpos", "len", "ch", "space", "crlf", "splitdel", "left",
                "right", "substr", "p", "q", "empty", "notempty",
            ],
        ),
        ("test.core", &["callme", "callres", "test"]),
    ];
    let registry = registry();
    for (module, functions) in modules {
        assert!(registry.module(module).is_some(), "module {module}");
        for f in *functions {
            assert!(registry.has(f), "function {f}");
        }
    }
}

#[test]
fn alias_requires_existing_target() {
    let mut registry = registry();
    assert!(registry.add_alias("somefunc", "test"));
    assert!(!registry.add_alias("somefunc2", "function_not_exist"));
    assert!(registry.has("somefunc"));
    assert!(!registry.has("somefunc2"));

    let mut s = Script::new(Arc::new(registry));
    assert_eq!(text(&mut s, "#somefunc()"), "TEST");
}

// ── Contexts ──────────────────────────────────────────────────────────────────

fn assert_context(context: Value) {
    let mut s = script();
    s.set_context(context);
    assert_eq!(s.evaluate("$var"), Value::from("something"));
    assert_eq!(s.evaluate("$VAR3"), Value::from("VAR3"));
    assert_eq!(s.evaluate("$var2.test"), Value::from("something"));
    assert_eq!(s.evaluate("$var2.test1"), Value::from("TEST1"));
    assert_eq!(s.evaluate("$var2.TEST2"), Value::from("TEST2"));
    assert_eq!(s.evaluate("$notexist"), Value::Null);
}

#[test]
fn non_script_text() {
    let mut s = script();
    assert_eq!(text(&mut s, "something"), "something");
    assert_eq!(text(&mut s, "123"), "123");
    assert_eq!(text(&mut s, "this text is indeed not long."), "this text is indeed not long.");
}

#[test]
fn map_context() {
    assert_context(Value::from(
        ValueMap::new()
            .with("var", "something")
            .with("Var2", Record::new(None))
            .with("VAR3", "VAR3"),
    ));
}

#[test]
fn object_context() {
    assert_context(Value::Object(Arc::new(Document)));
}

// ── Scripts ───────────────────────────────────────────────────────────────────

#[test]
fn scripts() {
    let mut s = script();
    s.set_context(Value::Object(Arc::new(Document)));

    assert_eq!(text(&mut s, "#func(test,a,b)#func(test2,c,d)"), "#test(a,b)#test2(c,d)");
    assert_eq!(text(&mut s, "#callme()#test()#callme()#callres()"), "TESTCALLCALL");
    assert_eq!(text(&mut s, "#ch(13)#concatw(#ch(13),\"A\",\"B\")"), "\rA\rB");
    assert_eq!(text(&mut s, "#len(#test())"), "4");
    assert_eq!(text(&mut s, "#len(\"#test()\")"), "4");
    assert_eq!(text(&mut s, "#len(\"something(with) to #test()\")"), "23");
    assert_eq!(text(&mut s, "#func(test,#var(var))"), "#test($var)");
    assert_eq!(text(&mut s, "#len($var)"), "9");

    assert_eq!(text(&mut s, "#if(1,\"ME\",\"YOU\")"), "ME");
    assert_eq!(text(&mut s, "#if(0,\"ME\",\"YOU\")"), "YOU");
    assert_eq!(s.evaluate("#if(0,\"ME\")"), Value::Null);
    assert_eq!(text(&mut s, "#if(#gr(2,1),\"YES\")"), "YES");
    assert_eq!(text(&mut s, "#if(1,\"#len($var) test: $var\")"), "9 test: something");
    assert_eq!(text(&mut s, "#isnull(#null())"), "1");

    assert_eq!(
        text(&mut s, "#lcreate(x);#each($var5,\"#func(ladd,x,#var(var))\");#lconcat(x,\", \")"),
        "X1, X2, X3"
    );

    assert_eq!(
        text(
            &mut s,
            "First if: #if(#eq($var,something),\"it's something\",\"it's not something\")\n\
             Second if: #if(#eq($var,something),\"it's something too\",\"no, it's not something\")"
        ),
        "First if: it's something\nSecond if: it's something too"
    );
}

#[test]
fn each_leaves_outer_context_alone() {
    let mut s = script();
    s.set_context(Value::Object(Arc::new(Document)));
    s.evaluate("#lcreate(y)#each($var4,\"#func(ladd,y,#var(var))\")");
    assert_eq!(text(&mut s, "$var #lconcat(y,-)"), "something X1-X2-X3");
}

// ── Iteration ─────────────────────────────────────────────────────────────────

#[test]
fn iterator() {
    let values = ["A1", "A2", "A3"];
    let objects: Vec<Value> = values.iter().map(|v| Record::new(Some(v))).collect();
    let mut seq = 0;
    let mut s = script();
    s.set_objects(objects).each(|script| {
        seq += 1;
        assert_eq!(text(script, "$Var"), values[seq - 1]);
        assert_eq!(text(script, "#recno()"), seq.to_string());
    });
    assert_eq!(seq, 3);
    assert_eq!(text(&mut s, "#reccnt()"), "3");
}

#[test]
fn partial() {
    let values = ["B1", "B2", "B3"];
    let objects: Vec<Value> = values.iter().map(|v| Record::new(Some(v))).collect();
    let mut seq = 5;
    let mut idx = 0;
    let mut s = script();
    s.set_objects(PartialObject::new(objects, 5, 10)).each(|script| {
        seq += 1;
        assert_eq!(text(script, "$Var"), values[idx]);
        assert_eq!(text(script, "#recno()"), seq.to_string());
        idx += 1;
    });
    assert_eq!(idx, 3);
    assert_eq!(text(&mut s, "#reccnt()"), "10");
}

struct Watcher(Mutex<Vec<String>>);

impl Listener for Watcher {
    fn on_context_change(&self, script: &Script) {
        if let Ok(mut seen) = self.0.lock() {
            seen.push(format!("{}:{}", script.recno(), script.get_var("var").unwrap_or_default()));
        }
    }
}

#[test]
fn listeners_see_each_record() {
    let watcher = Arc::new(Watcher(Mutex::default()));
    let mut registry = Registry::new();
    registry.bootstrap(&[&SystemProvider::new()], vec![watcher.clone() as Arc<dyn Listener>]);
    let registry = Arc::new(registry);

    let objects = vec![Record::new(Some("a")), Record::new(Some("b"))];
    Script::new(Arc::clone(&registry)).set_objects(objects.clone()).each(|_| {});
    assert_eq!(*watcher.0.lock().unwrap(), vec!["1:a", "2:b"]);

    Script::new(registry).with_notify(false).set_objects(objects).each(|_| {});
    assert_eq!(watcher.0.lock().unwrap().len(), 2);
}
