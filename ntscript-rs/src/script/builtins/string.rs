//! `system.string`: text functions.
//!
//! Positions and lengths count characters, not bytes.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::script::error::FunctionError;
use crate::script::registry::{FunctionDescriptor, Module};
use crate::script::value::Value;

use super::{flag, int_arg, str_arg};

static WORD_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)(\S)").expect("word start pattern"));

/// Substring by character position.  A negative `start` counts from the
/// end; a negative `count` leaves that many characters off the end.
fn char_slice(s: &str, start: i64, count: Option<i64>) -> String {
    let chars: Vec<char> = s.chars().collect();
    let n = chars.len() as i64;
    let begin = if start < 0 { (n + start).max(0) } else { start.min(n) };
    let end = match count {
        None => n,
        Some(c) if c < 0 => n + c,
        Some(c) => begin.saturating_add(c).min(n),
    };
    if end <= begin {
        return String::new();
    }
    chars[begin as usize..end as usize].iter().collect()
}

/// Character index of `needle` in `haystack`, or `false`.
fn position(haystack: &str, needle: &str) -> Value {
    match haystack.find(needle) {
        Some(byte) if !needle.is_empty() => Value::from(haystack[..byte].chars().count()),
        _ => Value::Bool(false),
    }
}

/// Longest text `repeat` and `space` will build, in bytes.
const MAX_REPEAT_LEN: usize = 16 * 1024 * 1024;

/// `text` repeated `count` times, refusing results over [`MAX_REPEAT_LEN`].
fn repeated(function: &str, index: usize, text: &str, count: i64) -> Result<Value, FunctionError> {
    let count = usize::try_from(count.max(0)).unwrap_or(usize::MAX);
    text.len()
        .checked_mul(count)
        .filter(|len| *len <= MAX_REPEAT_LEN)
        .map(|_| Value::Str(text.repeat(count)))
        .ok_or_else(|| FunctionError::invalid_argument(function, index, format!("{count} repetitions is too long")))
}

/// Join the truthy values with `delim`; `null` when none is truthy.
fn join_truthy(delim: &str, values: &[Value]) -> Value {
    let parts: Vec<String> = values
        .iter()
        .filter(|v| v.as_bool())
        .map(Value::to_string)
        .collect();
    if parts.is_empty() {
        Value::Null
    } else {
        Value::Str(parts.join(delim))
    }
}

fn text_fn<F>(name: &'static str, description: &str, f: F) -> FunctionDescriptor
where
    F: Fn(String) -> String + Send + Sync + 'static,
{
    FunctionDescriptor::new(name, move |_, args| Ok(Value::Str(f(str_arg(args, 0)))))
        .min_params(1)
        .syntax("s")
        .description(description)
}

pub fn module() -> Module {
    Module::new("system.string", "String functions")
        .function(
            FunctionDescriptor::new("split", |_, args| {
                let s = str_arg(args, 0);
                let size = int_arg(args, 1);
                if s.is_empty() {
                    return Ok(Value::Null);
                }
                if size <= 0 {
                    return Ok(Value::Str(s));
                }
                let sep = args.get(2).map_or_else(|| " ".to_owned(), Value::to_string);
                let chars: Vec<char> = s.chars().collect();
                let parts: Vec<String> = chars
                    .chunks(usize::try_from(size).unwrap_or(usize::MAX))
                    .map(|chunk| chunk.iter().collect())
                    .collect();
                Ok(Value::Str(parts.join(&sep)))
            })
            .min_params(2)
            .syntax("s, count, separator")
            .description("Split text into parts of count characters, joined with separator (default a space)."),
        )
        .function(text_fn("ucfirst", "Uppercase the first character.", |s| {
            let mut chars = s.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }))
        .function(text_fn("ucwords", "Uppercase the first character of each word.", |s| {
            WORD_START
                .replace_all(&s, |caps: &Captures| format!("{}{}", &caps[1], caps[2].to_uppercase()))
                .into_owned()
        }))
        .function(text_fn("upper", "Uppercase text.", |s| s.to_uppercase()))
        .function(text_fn("lower", "Lowercase text.", |s| s.to_lowercase()))
        .function(text_fn("trim", "Strip whitespace from both ends.", |s| s.trim().to_owned()))
        .function(
            FunctionDescriptor::new("concat", |_, args| {
                Ok(Value::Str(format!("{}{}{}", str_arg(args, 0), str_arg(args, 2), str_arg(args, 1))))
            })
            .min_params(2)
            .syntax("s1, s2, delimiter")
            .description("Concatenate s1 and s2, separated by delimiter."),
        )
        .function(
            FunctionDescriptor::new("concatw", |_, args| Ok(join_truthy(&str_arg(args, 0), &args[1..])))
                .min_params(1)
                .syntax("delimiter, s1, s2, ...")
                .description("Concatenate the non empty texts, separated by delimiter."),
        )
        .function(
            FunctionDescriptor::new("concatall", |_, args| {
                if args.is_empty() {
                    return Ok(Value::Null);
                }
                Ok(Value::Str(args.iter().map(Value::to_string).collect()))
            })
            .syntax("s1, s2, ...")
            .description("Concatenate all texts."),
        )
        .function(
            FunctionDescriptor::new("spaceconcat", |_, args| Ok(join_truthy(" ", args)))
                .syntax("s1, s2, ...")
                .description("Concatenate the non empty texts, separated by a space."),
        )
        .function(
            FunctionDescriptor::new("repeat", |_, args| {
                repeated("repeat", 1, &str_arg(args, 0), int_arg(args, 1))
            })
            .min_params(2)
            .syntax("s, count")
            .description("Repeat text count times."),
        )
        .function(
            FunctionDescriptor::new("pos", |_, args| Ok(position(&str_arg(args, 1), &str_arg(args, 0))))
                .min_params(2)
                .syntax("search, s")
                .description("Position of search in s, starting at 0."),
        )
        .function(
            FunctionDescriptor::new("strpos", |_, args| Ok(position(&str_arg(args, 0), &str_arg(args, 1))))
                .min_params(2)
                .syntax("s, search")
                .description("Position of search in s, starting at 0."),
        )
        .function(
            FunctionDescriptor::new("len", |_, args| Ok(Value::from(str_arg(args, 0).chars().count())))
                .min_params(1)
                .syntax("s")
                .description("Length of text."),
        )
        .function(
            FunctionDescriptor::new("ch", |_, args| {
                let code = int_arg(args, 0);
                u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .map(|c| Value::Str(c.to_string()))
                    .ok_or_else(|| FunctionError::invalid_argument("ch", 0, format!("{code} is not a character code")))
            })
            .min_params(1)
            .syntax("code")
            .description("Character of code."),
        )
        .function(
            FunctionDescriptor::new("space", |_, args| repeated("space", 0, " ", int_arg(args, 0)))
                .min_params(1)
                .syntax("count")
                .description("A text of count spaces."),
        )
        .function(
            FunctionDescriptor::new("crlf", |_, _| Ok(Value::from("\r\n")))
                .description("Carriage return and line feed."),
        )
        .function(
            FunctionDescriptor::new("splitdel", |_, args| {
                let delim = str_arg(args, 1);
                if delim.is_empty() {
                    return Err(FunctionError::invalid_argument("splitdel", 1, "empty delimiter"));
                }
                let index = int_arg(args, 2);
                let s = str_arg(args, 0);
                let part = usize::try_from(index).ok().and_then(|i| s.split(delim.as_str()).nth(i));
                Ok(Value::from(part))
            })
            .min_params(3)
            .syntax("s, delimiter, element")
            .description("Split text by delimiter and return the part at position element, starting at 0."),
        )
        .function(
            FunctionDescriptor::new("left", |_, args| {
                Ok(Value::Str(char_slice(&str_arg(args, 0), 0, Some(int_arg(args, 1)))))
            })
            .min_params(2)
            .syntax("s, count")
            .description("The first count characters of text."),
        )
        .function(
            FunctionDescriptor::new("right", |_, args| {
                let count = int_arg(args, 1);
                if count <= 0 {
                    return Ok(Value::Str(String::new()));
                }
                Ok(Value::Str(char_slice(&str_arg(args, 0), -count, None)))
            })
            .min_params(2)
            .syntax("s, count")
            .description("The last count characters of text."),
        )
        .function(
            FunctionDescriptor::new("substr", |_, args| {
                let count = args.get(2).filter(|v| !v.is_null()).map(Value::as_int);
                Ok(Value::Str(char_slice(&str_arg(args, 0), int_arg(args, 1), count)))
            })
            .min_params(2)
            .syntax("s, start, count")
            .description("Part of text from start, at most count characters long."),
        )
        .function(text_fn("firstw", "First word of text.", |s| {
            s.split(' ').next().unwrap_or_default().to_owned()
        }))
        .function(text_fn("lastw", "Last word of text.", |s| {
            s.rsplit(' ').next().unwrap_or_default().to_owned()
        }))
        .function(
            FunctionDescriptor::new("p", |_, args| Ok(Value::Str(format!("({})", str_arg(args, 0)))))
                .syntax("s")
                .description("Enclose text in parentheses."),
        )
        .function(
            FunctionDescriptor::new("q", |_, args| Ok(Value::Str(format!("'{}'", str_arg(args, 0)))))
                .syntax("s")
                .description("Enclose text in single quotes."),
        )
        .function(
            FunctionDescriptor::new("dq", |_, args| Ok(Value::Str(format!("\"{}\"", str_arg(args, 0)))))
                .syntax("s")
                .description("Enclose text in double quotes."),
        )
        .function(
            FunctionDescriptor::new("empty", |_, args| Ok(flag(str_arg(args, 0).is_empty())))
                .min_params(1)
                .syntax("s")
                .description("Check if text is empty."),
        )
        .function(
            FunctionDescriptor::new("notempty", |_, args| Ok(flag(!str_arg(args, 0).is_empty())))
                .min_params(1)
                .syntax("s")
                .description("Check if text is not empty."),
        )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::char_slice;
    use crate::script::builtins::system_registry;
    use crate::script::value::Value;
    use crate::script::Script;

    fn eval(text: &str) -> Value {
        Script::new(Arc::new(system_registry())).evaluate(text)
    }

    fn text(text: &str) -> String {
        eval(text).to_string()
    }

    #[test]
    fn slicing() {
        assert_eq!(char_slice("abcdef", 1, Some(3)), "bcd");
        assert_eq!(char_slice("abcdef", -2, None), "ef");
        assert_eq!(char_slice("abcdef", 1, Some(-2)), "bcd");
        assert_eq!(char_slice("abc", 5, Some(1)), "");
        assert_eq!(char_slice("héllo", 1, Some(2)), "él");
    }

    #[test]
    fn case_and_trim() {
        assert_eq!(text("#ucfirst(hello world)"), "Hello world");
        assert_eq!(text("#ucwords(hello  big world)"), "Hello  Big World");
        assert_eq!(text("#upper(abc)#lower(DEF)"), "ABCdef");
        assert_eq!(text("[#trim(\"  x  \")]"), "[x]");
    }

    #[test]
    fn concatenation() {
        assert_eq!(eval("#ch(13)#concatw(#ch(13),\"A\",\"B\")"), Value::from("\rA\rB"));
        assert_eq!(text("#concat(a,b,-)"), "a-b");
        assert_eq!(text("#concat(a,b)"), "ab");
        assert_eq!(text("#concatw(\", \",a,,0,b)"), "a, b");
        assert_eq!(eval("#concatw(-)"), Value::Null);
        assert_eq!(text("#concatall(a,,b,c)"), "abc");
        assert_eq!(text("#spaceconcat(a,#null(),b)"), "a b");
    }

    #[test]
    fn measuring() {
        assert_eq!(eval("#len(\"something(with) to \")"), Value::Int(19));
        assert_eq!(eval("#pos(c,abcabc)"), Value::Int(2));
        assert_eq!(eval("#strpos(abcabc,c)"), Value::Int(2));
        assert_eq!(eval("#strpos(abc,z)"), Value::Bool(false));
        assert_eq!(eval("#empty(\"\")"), Value::Int(1));
        assert_eq!(eval("#notempty(x)"), Value::Int(1));
    }

    #[test]
    fn splitting() {
        assert_eq!(text("#split(abcdefg,3)"), "abc def g");
        assert_eq!(text("#split(abcdefg,3,-)"), "abc-def-g");
        assert_eq!(text("#splitdel(a;b;c,;,1)"), "b");
        assert_eq!(eval("#splitdel(a;b;c,;,5)"), Value::Null);
        assert_eq!(text("#firstw(one two three)#lastw(one two three)"), "onethree");
    }

    #[test]
    fn picking() {
        assert_eq!(text("#left(abcdef,2)#right(abcdef,2)"), "abef");
        assert_eq!(text("#substr(abcdef,2,2)"), "cd");
        assert_eq!(text("#substr(abcdef,-3)"), "def");
        assert_eq!(text("#repeat(ab,3)#space(2)|"), "ababab  |");
        assert_eq!(text("[#repeat(ab,-2)#space(-1)]"), "[]");
        assert_eq!(text("#p(x)#q(y)#dq(z)"), "(x)'y'\"z\"");
        assert_eq!(text("#crlf()"), "\r\n");
    }

    #[test]
    fn oversized_repetition_is_no_result() {
        assert_eq!(text("[#repeat(ab,9223372036854775807)]"), "[]");
        assert_eq!(text("[#space(9223372036854775807)]"), "[]");
        assert_eq!(text("[#space(20000000)]"), "[]");
        assert_eq!(eval("#len(#space(1000))"), Value::Int(1000));
    }

    #[test]
    fn bad_character_code() {
        assert_eq!(eval("#ch(-1)"), Value::Null);
    }
}
