use std::io::Read;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser as ClapParser;
use log::{debug, info};

use ntscript::cli::{self, CliArgs};
use ntscript::config::EngineConfig;
use ntscript::script::{Parser, PartialObject, Value};

// ── Input helpers ─────────────────────────────────────────────────────────────

/// Read `path`, or stdin when it is `-`.
fn read_input(path: &Path) -> Result<String, String> {
    if path == Path::new("-") {
        let mut s = String::new();
        std::io::stdin()
            .read_to_string(&mut s)
            .map_err(|e| format!("cannot read stdin: {e}"))?;
        return Ok(s);
    }
    std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))
}

fn load_context(path: &Path) -> Result<Value, String> {
    let text = read_input(path)?;
    let json: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| format!("invalid JSON in {}: {e}", path.display()))?;
    Ok(Value::from(json))
}

fn records(context: Value) -> Vec<Value> {
    match context {
        Value::List(items) => Arc::unwrap_or_clone(items),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn run(args: &CliArgs) -> Result<(), String> {
    let mut config = match cli::resolve_config(args.config.as_ref()) {
        Some(path) => EngineConfig::load_file(&path).map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };
    config.keep_unknown |= args.keep_unknown;
    let registry = Arc::new(config.build_registry());
    debug!("{registry:?}");

    if let Some(filter) = args.list_filter() {
        if let Some(id) = filter.filter(|id| registry.module(id).is_none()) {
            return Err(format!("unknown module '{id}'"));
        }
        for line in registry.dump(filter, config.dump_width) {
            println!("{line}");
        }
        return Ok(());
    }

    let template = match (&args.template, &args.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => read_input(path)?,
        (None, None) => return Err("no template given (try --help)".to_owned()),
    };
    let context = args.context.as_deref().map(load_context).transpose()?;

    let mut script = config.script(registry);

    if !args.iterates() {
        if let Some(context) = context {
            script.set_context(context);
        }
        println!("{}", script.evaluate(&template));
        return Ok(());
    }

    let elements = records(context.unwrap_or_default());
    match args.window {
        Some(w) => {
            if !w.holds(elements.len()) {
                return Err(format!(
                    "window {}:{} cannot hold {} records",
                    w.start,
                    w.total,
                    elements.len()
                ));
            }
            script.set_objects(PartialObject::new(elements, w.start, w.total));
        }
        None => {
            script.set_objects(elements);
        }
    }
    info!("iterating {} records", script.rec_count());

    let Some(tree) = Parser::parse(&template).into_token() else {
        return Ok(());
    };
    script.each(|s| println!("{}", s.evaluate_token(&tree)));
    Ok(())
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ntscript: {e}");
            ExitCode::FAILURE
        }
    }
}
