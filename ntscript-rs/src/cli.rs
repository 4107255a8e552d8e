//! Command-line argument parsing.
//!
//! Usage:
//!   ntscript [-c <json>] [-k] [--each | --window <start:total>] <template>
//!   ntscript [-c <json>] -f <file>
//!   ntscript --list [<module>]

use std::path::PathBuf;

use clap::Parser as ClapParser;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(ClapParser, Debug, Default)]
#[command(name = "ntscript", version, about = "Evaluate #function / $variable templates")]
pub struct CliArgs {
    /// Template text to evaluate.
    #[arg(conflicts_with = "file")]
    pub template: Option<String>,

    /// Read the template from a file (`-` for stdin).
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// JSON document used as the context (`-` for stdin).
    #[arg(short, long, value_name = "FILE")]
    pub context: Option<PathBuf>,

    /// Evaluate once per element of the context array.
    #[arg(long, conflicts_with = "window")]
    pub each: bool,

    /// Like --each, treating the array as a window of a larger set.
    #[arg(long, value_name = "START:TOTAL", value_parser = parse_window)]
    pub window: Option<Window>,

    /// Keep the source text of unknown functions.
    #[arg(short, long)]
    pub keep_unknown: bool,

    /// List registered functions, optionally for a single module.
    #[arg(long, value_name = "MODULE", num_args = 0..=1, default_missing_value = "")]
    pub list: Option<String>,

    /// Engine configuration file (TOML).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More logging (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// `--window START:TOTAL`: the context array starts at record `start`
/// (zero-based) of `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    pub total: usize,
}

impl Window {
    /// Whether `records` records starting at `start` fit within `total`.
    pub fn holds(&self, records: usize) -> bool {
        self.start
            .checked_add(records)
            .is_some_and(|end| end <= self.total)
    }
}

impl CliArgs {
    /// Module filter for `--list`; `Some(None)` lists everything.
    pub fn list_filter(&self) -> Option<Option<&str>> {
        self.list
            .as_deref()
            .map(|m| if m.is_empty() { None } else { Some(m) })
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    /// True when the context should be iterated record by record.
    pub fn iterates(&self) -> bool {
        self.each || self.window.is_some()
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    CliArgs::try_parse_from(std::iter::once("ntscript".to_owned()).chain(argv.iter().cloned()))
        .map_err(|e| e.to_string())
}

fn parse_window(s: &str) -> Result<Window, String> {
    let (start, total) = s
        .split_once(':')
        .ok_or_else(|| format!("expected START:TOTAL, got '{s}'"))?;
    let start: usize = start
        .trim()
        .parse()
        .map_err(|_| format!("invalid window start: {start}"))?;
    let total: usize = total
        .trim()
        .parse()
        .map_err(|_| format!("invalid window total: {total}"))?;
    Ok(Window { start, total })
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Determine the configuration file.
///
/// Priority: `--config` flag → `NTSCRIPT_CONFIG` env var → `./ntscript.toml`
/// when it exists.
pub fn resolve_config(cli_override: Option<&PathBuf>) -> Option<PathBuf> {
    if let Some(p) = cli_override {
        return Some(p.clone());
    }
    if let Ok(p) = std::env::var("NTSCRIPT_CONFIG") {
        return Some(PathBuf::from(p));
    }
    Some(PathBuf::from("ntscript.toml")).filter(|p| p.exists())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|&s| s.to_owned()).collect()
    }

    #[test]
    fn empty_args() {
        let a = parse_argv(&argv(&[])).unwrap();
        assert!(a.template.is_none());
        assert!(!a.iterates());
        assert_eq!(a.list_filter(), None);
        assert_eq!(a.log_level(), log::LevelFilter::Warn);
    }

    #[test]
    fn template_positional() {
        let a = parse_argv(&argv(&["#upper($name)", "-c", "ctx.json", "-k"])).unwrap();
        assert_eq!(a.template.as_deref(), Some("#upper($name)"));
        assert_eq!(a.context, Some(PathBuf::from("ctx.json")));
        assert!(a.keep_unknown);
    }

    #[test]
    fn template_file_conflicts_with_text() {
        assert!(parse_argv(&argv(&["-f", "t.txt"])).is_ok());
        assert!(parse_argv(&argv(&["-f", "t.txt", "text"])).is_err());
    }

    #[test]
    fn window() {
        let a = parse_argv(&argv(&["--window", "10:250", "$recno"])).unwrap();
        assert_eq!(a.window, Some(Window { start: 10, total: 250 }));
        assert!(a.iterates());
        assert!(parse_argv(&argv(&["--window", "10", "x"])).is_err());
        assert!(parse_argv(&argv(&["--window", "a:2", "x"])).is_err());
        assert!(parse_argv(&argv(&["--window", "1:2", "--each", "x"])).is_err());
    }

    #[test]
    fn window_capacity() {
        let w = Window { start: 5, total: 10 };
        assert!(w.holds(5));
        assert!(!w.holds(6));
        let huge = parse_argv(&argv(&["--window", "18446744073709551615:1", "x"]))
            .unwrap()
            .window
            .unwrap();
        assert!(!huge.holds(0));
        assert!(!huge.holds(1));
    }

    #[test]
    fn list_with_and_without_module() {
        let a = parse_argv(&argv(&["--list"])).unwrap();
        assert_eq!(a.list_filter(), Some(None));
        let a = parse_argv(&argv(&["--list", "system.math"])).unwrap();
        assert_eq!(a.list_filter(), Some(Some("system.math")));
    }

    #[test]
    fn verbosity() {
        assert_eq!(parse_argv(&argv(&["-v"])).unwrap().log_level(), log::LevelFilter::Info);
        assert_eq!(parse_argv(&argv(&["-vv"])).unwrap().log_level(), log::LevelFilter::Debug);
        assert_eq!(parse_argv(&argv(&["-vvvv"])).unwrap().log_level(), log::LevelFilter::Trace);
    }

    #[test]
    fn config_override_wins() {
        let p = PathBuf::from("/tmp/custom.toml");
        assert_eq!(resolve_config(Some(&p)), Some(p.clone()));
    }

    #[test]
    fn unknown_flag() {
        assert!(parse_argv(&argv(&["--bogus"])).is_err());
    }
}
