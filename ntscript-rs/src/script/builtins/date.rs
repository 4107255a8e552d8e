//! `system.date`: date parsing, arithmetic and formatting.
//!
//! Dates are read as a unix timestamp when numeric, otherwise as
//! `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, RFC 3339, `now` or `today`.  All
//! times are UTC.  A date that cannot be read gives null.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};

use crate::script::registry::{FunctionDescriptor, Module};
use crate::script::value::Value;

use super::{int_arg, str_arg};

const DEFAULT_FORMAT: &str = "d-m-Y";

fn parse_date(value: &Value) -> Option<NaiveDateTime> {
    if let Some(n) = value.as_number() {
        return DateTime::from_timestamp(n.as_int(), 0).map(|dt| dt.naive_utc());
    }
    let text = value.to_string();
    let text = text.trim();
    match text {
        "now" => return Some(Utc::now().naive_utc()),
        "today" => return Utc::now().date_naive().and_hms_opt(0, 0, 0),
        _ => {}
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Translate a `d-m-Y` style pattern into a strftime pattern.  A
/// backslash makes the next character literal; unknown letters are kept.
fn strftime_pattern(format: &str) -> String {
    let mut out = String::with_capacity(format.len() * 2);
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        let spec = match c {
            'd' => "%d",
            'j' => "%-d",
            'm' => "%m",
            'n' => "%-m",
            'Y' => "%Y",
            'y' => "%y",
            'H' => "%H",
            'G' => "%-H",
            'i' => "%M",
            's' => "%S",
            'D' => "%a",
            'l' => "%A",
            'M' => "%b",
            'F' => "%B",
            'N' => "%u",
            'U' => "%s",
            '\\' => {
                if let Some(next) = chars.next() {
                    push_literal(&mut out, next);
                }
                continue;
            }
            other => {
                push_literal(&mut out, other);
                continue;
            }
        };
        out.push_str(spec);
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

fn shifted(args: &[Value], sign: i64) -> Value {
    parse_date(&args[0])
        .zip(TimeDelta::try_days(int_arg(args, 1).saturating_mul(sign)))
        .and_then(|(date, delta)| date.checked_add_signed(delta))
        .map_or(Value::Null, |date| Value::Str(date.format("%Y-%m-%d").to_string()))
}

pub fn module() -> Module {
    Module::new("system.date", "Date functions")
        .function(
            FunctionDescriptor::new("fmtdate", |_, args| {
                let format = match args.get(1) {
                    Some(Value::Null) | None => DEFAULT_FORMAT.to_owned(),
                    Some(f) => f.to_string(),
                };
                Ok(parse_date(&args[0]).map_or(Value::Null, |date| {
                    Value::Str(date.format(&strftime_pattern(&format)).to_string())
                }))
            })
            .min_params(1)
            .syntax("date, format='d-m-Y'")
            .description("Format date using d, m, Y, H, i, s and similar letters."),
        )
        .function(
            FunctionDescriptor::new("dtafter", |_, args| Ok(shifted(args, 1)))
                .min_params(2)
                .syntax("date, days")
                .description("The date days after date, as YYYY-MM-DD."),
        )
        .function(
            FunctionDescriptor::new("dtbefore", |_, args| Ok(shifted(args, -1)))
                .min_params(2)
                .syntax("date, days")
                .description("The date days before date, as YYYY-MM-DD."),
        )
        .function(
            FunctionDescriptor::new("dtpart", |_, args| {
                let spec = match str_arg(args, 1).as_str() {
                    "d" | "1" => "%d",
                    "m" | "2" => "%m",
                    "Y" | "y" | "3" => "%Y",
                    _ => return Ok(Value::Null),
                };
                Ok(parse_date(&args[0]).map_or(Value::Null, |date| Value::Str(date.format(spec).to_string())))
            })
            .min_params(2)
            .syntax("date, part")
            .description("Day (d or 1), month (m or 2) or year (Y or 3) of date."),
        )
        .function(
            FunctionDescriptor::new("time", |_, _| Ok(Value::Int(Utc::now().timestamp())))
                .syntax("")
                .description("Current unix timestamp."),
        )
}
