//! printf-style rendering of message templates.
//!
//! [`sprintf`] substitutes `%` directives in a template with values from an
//! argument list. Rendering never fails and never panics: a verb that does not
//! fit its argument, a missing argument or a trailing `%` is rendered inline
//! as a marker so the caller still gets a (visibly malformed) message.
//!
//! # Directives
//!
//! `%[flags][width][.precision]verb`
//!
//! | Verb | Accepts | Output |
//! |---|---|---|
//! | `%v` | anything | natural form |
//! | `%s` | string | the string |
//! | `%q` | string, integer | quoted string, quoted char |
//! | `%d` | integer | decimal |
//! | `%x` `%X` | integer, string | hex |
//! | `%o` `%b` | integer | octal, binary |
//! | `%c` | integer | char |
//! | `%f` `%e` `%g` | float | fixed, exponent, shortest |
//! | `%t` | bool | `true` / `false` |
//! | `%%` | nothing | `%` |
//!
//! Flags: `-` left-justify, `+` always sign, `0` zero-pad numbers, space
//! pads the sign of positive numbers, `#` adds `0x`/`0X` to hex.
//!
//! Arrays render as `[a b]` and objects as `map[k:v]`, with the verb applied
//! to each element.
//!
//! # Malformed directives
//!
//! | Case | Marker |
//! |---|---|
//! | wrong type | `%!d(string=Foo)` |
//! | missing argument | `%!s(MISSING)` |
//! | unused arguments | `%!(EXTRA int=1, string=x)` |
//! | `%` at end of template | `%!(NOVERB)` |
//! | unknown verb | `%!z(int=1)` |
//! | width/precision over 1e6 | `%!(BADWIDTH)` / `%!(BADPREC)` |

use serde_json::{Number, Value};
use std::fmt::Write;
use std::iter::Peekable;
use std::str::Chars;

/// Largest width or precision honored before `BADWIDTH`/`BADPREC`.
const MAX_PADDING: usize = 1_000_000;

#[derive(Debug, Clone, Copy, Default)]
struct Directive {
    minus: bool,
    plus: bool,
    zero: bool,
    space: bool,
    sharp: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

/// Render `template` with `args`.
///
/// ```rust
/// use stamped_errors::format::sprintf;
/// use serde_json::json;
///
/// assert_eq!(sprintf("msg: %s", &[json!("Foo")]), "msg: Foo");
/// assert_eq!(sprintf("%05.1f|%-4d|", &[json!(3.14259), json!(7)]), "003.1|7   |");
/// assert_eq!(sprintf("%d", &[json!("Foo")]), "%!d(string=Foo)");
/// ```
pub fn sprintf(template: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut next_arg = 0;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut directive = Directive::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => directive.minus = true,
                '+' => directive.plus = true,
                '0' => directive.zero = true,
                ' ' => directive.space = true,
                '#' => directive.sharp = true,
                _ => break,
            }
            chars.next();
        }

        directive.width = parse_number(&mut chars);
        if directive.width.is_some_and(|w| w > MAX_PADDING) {
            out.push_str("%!(BADWIDTH)");
            directive.width = None;
        }
        if chars.peek() == Some(&'.') {
            chars.next();
            directive.precision = Some(parse_number(&mut chars).unwrap_or(0));
            if directive.precision.is_some_and(|p| p > MAX_PADDING) {
                out.push_str("%!(BADPREC)");
                directive.precision = None;
            }
        }

        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }

        match args.get(next_arg) {
            Some(arg) => {
                next_arg += 1;
                render(&mut out, verb, &directive, arg);
            }
            None => {
                let _ = write!(out, "%!{verb}(MISSING)");
            }
        }
    }

    if let Some(extra) = args.get(next_arg..).filter(|rest| !rest.is_empty()) {
        out.push_str("%!(EXTRA ");
        for (i, arg) in extra.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            describe(&mut out, arg);
        }
        out.push(')');
    }

    out
}

fn parse_number(chars: &mut Peekable<Chars<'_>>) -> Option<usize> {
    let mut value: Option<usize> = None;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        chars.next();
        value = Some(
            value
                .unwrap_or(0)
                .saturating_mul(10)
                .saturating_add(digit as usize),
        );
    }
    value
}

// ============================================================================
// Values
// ============================================================================

fn render(out: &mut String, verb: char, directive: &Directive, arg: &Value) {
    match arg {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                render(out, verb, directive, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push_str("map[");
            for (i, (key, value)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                out.push_str(key);
                out.push(':');
                render(out, verb, directive, value);
            }
            out.push(']');
        }
        scalar => match format_scalar(verb, directive, scalar) {
            Some(body) => pad(out, &body, directive, scalar.is_number() && is_numeric_verb(verb)),
            None => bad_verb(out, verb, scalar),
        },
    }
}

fn format_scalar(verb: char, directive: &Directive, arg: &Value) -> Option<String> {
    match (verb, arg) {
        ('v', Value::Null) => Some("<nil>".to_owned()),
        ('v' | 't', Value::Bool(b)) => Some(b.to_string()),
        ('v' | 's', Value::String(s)) => Some(match directive.precision {
            Some(p) => s.chars().take(p).collect(),
            None => s.clone(),
        }),
        ('q', Value::String(s)) => Some(format!("{s:?}")),
        ('x', Value::String(s)) => Some(hex_bytes(s, false)),
        ('X', Value::String(s)) => Some(hex_bytes(s, true)),
        (_, Value::Number(n)) => format_number(verb, directive, n),
        _ => None,
    }
}

fn format_number(verb: char, directive: &Directive, n: &Number) -> Option<String> {
    if let Some(i) = n.as_i64() {
        format_int(verb, directive, i128::from(i))
    } else if let Some(u) = n.as_u64() {
        format_int(verb, directive, i128::from(u))
    } else {
        n.as_f64().and_then(|f| format_float(verb, directive, f))
    }
}

fn format_int(verb: char, directive: &Directive, value: i128) -> Option<String> {
    let magnitude = value.unsigned_abs();
    let digits = match verb {
        'v' | 'd' => magnitude.to_string(),
        'x' => format!("{magnitude:x}"),
        'X' => format!("{magnitude:X}"),
        'o' => format!("{magnitude:o}"),
        'b' => format!("{magnitude:b}"),
        'c' | 'q' => {
            let c = u32::try_from(value).ok().and_then(char::from_u32)?;
            return Some(if verb == 'q' {
                format!("{c:?}")
            } else {
                c.to_string()
            });
        }
        _ => return None,
    };

    let mut body = String::with_capacity(digits.len() + 4);
    push_sign(&mut body, value < 0, directive);
    if directive.sharp {
        match verb {
            'x' => body.push_str("0x"),
            'X' => body.push_str("0X"),
            _ => {}
        }
    }
    if let Some(min_digits) = directive.precision {
        for _ in digits.len()..min_digits {
            body.push('0');
        }
    }
    body.push_str(&digits);
    Some(body)
}

fn format_float(verb: char, directive: &Directive, value: f64) -> Option<String> {
    let formatted = match verb {
        'v' | 'g' => format_general(value, directive.precision),
        'G' => format_general(value, directive.precision).to_uppercase(),
        'f' | 'F' => format!("{:.*}", directive.precision.unwrap_or(6), value),
        'e' => format_exponent(value, directive.precision.unwrap_or(6)),
        'E' => format_exponent(value, directive.precision.unwrap_or(6)).to_uppercase(),
        _ => return None,
    };

    let (negative, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, formatted.as_str()),
    };
    let mut body = String::with_capacity(formatted.len() + 1);
    push_sign(&mut body, negative, directive);
    body.push_str(unsigned);
    Some(body)
}

/// `%e`: mantissa with `precision` decimals, exponent signed and at least two
/// digits wide (`1.500000e+00`).
fn format_exponent(value: f64, precision: usize) -> String {
    let raw = format!("{:.*e}", precision, value);
    let (mantissa, exponent) = split_exponent(&raw);
    join_exponent(mantissa, exponent)
}

/// `%g` / `%v`: exponent form for very large or very small magnitudes, the
/// shortest fixed form otherwise.
fn format_general(value: f64, precision: Option<usize>) -> String {
    let significant = precision.map(|p| p.max(1));
    let raw = match significant {
        Some(p) => format!("{:.*e}", p - 1, value),
        None => format!("{value:e}"),
    };
    let (mantissa, exponent) = split_exponent(&raw);
    let limit = significant.map_or(6, |p| i32::try_from(p).unwrap_or(i32::MAX));

    if exponent < -4 || exponent >= limit {
        return join_exponent(&trim_fraction(mantissa), exponent);
    }
    match significant {
        None => value.to_string(),
        Some(p) => {
            let decimals = (p as i64 - 1 - i64::from(exponent)).max(0) as usize;
            trim_fraction(&format!("{:.*}", decimals, value))
        }
    }
}

fn split_exponent(raw: &str) -> (&str, i32) {
    match raw.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse().unwrap_or(0)),
        None => (raw, 0),
    }
}

fn join_exponent(mantissa: &str, exponent: i32) -> String {
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
}

fn trim_fraction(s: &str) -> String {
    if !s.contains('.') {
        return s.to_owned();
    }
    s.trim_end_matches('0').trim_end_matches('.').to_owned()
}

fn hex_bytes(s: &str, upper: bool) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    for byte in s.bytes() {
        let _ = if upper {
            write!(out, "{byte:02X}")
        } else {
            write!(out, "{byte:02x}")
        };
    }
    out
}

fn push_sign(body: &mut String, negative: bool, directive: &Directive) {
    if negative {
        body.push('-');
    } else if directive.plus {
        body.push('+');
    } else if directive.space {
        body.push(' ');
    }
}

#[inline]
fn is_numeric_verb(verb: char) -> bool {
    matches!(
        verb,
        'v' | 'd' | 'x' | 'X' | 'o' | 'b' | 'f' | 'F' | 'e' | 'E' | 'g' | 'G'
    )
}

fn pad(out: &mut String, body: &str, directive: &Directive, numeric: bool) {
    let len = body.chars().count();
    let fill = directive.width.map_or(0, |w| w.saturating_sub(len));
    if fill == 0 {
        out.push_str(body);
    } else if directive.minus {
        out.push_str(body);
        out.extend(std::iter::repeat_n(' ', fill));
    } else if directive.zero && numeric {
        let sign_len = body
            .chars()
            .next()
            .filter(|c| matches!(c, '-' | '+' | ' '))
            .map_or(0, char::len_utf8);
        let (sign, digits) = body.split_at(sign_len);
        out.push_str(sign);
        out.extend(std::iter::repeat_n('0', fill));
        out.push_str(digits);
    } else {
        out.extend(std::iter::repeat_n(' ', fill));
        out.push_str(body);
    }
}

// ============================================================================
// Markers
// ============================================================================

fn bad_verb(out: &mut String, verb: char, arg: &Value) {
    let _ = write!(out, "%!{verb}(");
    describe(out, arg);
    out.push(')');
}

/// `type=value`, or `<nil>` for null.
fn describe(out: &mut String, arg: &Value) {
    if arg.is_null() {
        out.push_str("<nil>");
        return;
    }
    out.push_str(type_name(arg));
    out.push('=');
    render(out, 'v', &Directive::default(), arg);
}

fn type_name(arg: &Value) -> &'static str {
    match arg {
        Value::Null => "<nil>",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() => "int",
        Value::Number(n) if n.is_u64() => "uint",
        Value::Number(_) => "float64",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Number of argument-consuming directives in `template`.
///
/// `%%` consumes nothing; a trailing `%` is not counted.
pub fn directive_count(template: &str) -> usize {
    let mut count = 0;
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        while let Some(&next) = chars.peek() {
            if matches!(next, '-' | '+' | '0' | ' ' | '#' | '.') || next.is_ascii_digit() {
                chars.next();
            } else {
                break;
            }
        }
        match chars.next() {
            Some('%') | None => {}
            Some(_) => count += 1,
        }
    }
    count
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn f(template: &str, args: &[Value]) -> String {
        sprintf(template, args)
    }

    #[test]
    fn plain_substitution() {
        assert_eq!(f("msg: %s", &[json!("Foo")]), "msg: Foo");
        assert_eq!(f("no directives", &[]), "no directives");
        assert_eq!(f("héllo %s ✓", &[json!("wörld")]), "héllo wörld ✓");
        assert_eq!(f("%d%%", &[json!(50)]), "50%");
    }

    #[test]
    fn mismatch_markers() {
        assert_eq!(f("%d", &[json!("Foo")]), "%!d(string=Foo)");
        assert_eq!(f("%s %s", &[json!("a")]), "a %!s(MISSING)");
        assert_eq!(
            f("%d", &[json!(1), json!(1), json!("x")]),
            "1%!(EXTRA int=1, string=x)"
        );
        assert_eq!(f("100%", &[]), "100%!(NOVERB)");
        assert_eq!(f("%z", &[json!(1)]), "%!z(int=1)");
        assert_eq!(f("%d", &[json!(1.5)]), "%!d(float64=1.5)");
        assert_eq!(f("%f", &[json!(1)]), "%!f(int=1)");
        assert_eq!(f("%t", &[json!(1)]), "%!t(int=1)");
        assert_eq!(f("%s", &[Value::Null]), "%!s(<nil>)");
        assert_eq!(f("", &[Value::Null]), "%!(EXTRA <nil>)");
    }

    #[test]
    fn integers() {
        assert_eq!(f("%5d|%-5d|%05d", &[json!(42), json!(42), json!(42)]), "   42|42   |00042");
        assert_eq!(f("%+d % d", &[json!(5), json!(5)]), "+5  5");
        assert_eq!(f("%05d", &[json!(-42)]), "-0042");
        assert_eq!(f("%x %X %#x", &[json!(255), json!(255), json!(255)]), "ff FF 0xff");
        assert_eq!(f("%x", &[json!(-255)]), "-ff");
        assert_eq!(f("%o %b", &[json!(8), json!(5)]), "10 101");
        assert_eq!(f("%.3d", &[json!(7)]), "007");
        assert_eq!(f("%v", &[json!(u64::MAX)]), "18446744073709551615");
    }

    #[test]
    fn chars_and_quotes() {
        assert_eq!(f("%c %q", &[json!(65), json!(65)]), "A 'A'");
        assert_eq!(f("%q", &[json!("a\"b")]), "\"a\\\"b\"");
        assert_eq!(f("%x", &[json!("hi")]), "6869");
    }

    #[test]
    fn floats() {
        assert_eq!(f("%.2f", &[json!(3.14259)]), "3.14");
        assert_eq!(f("%8.3f", &[json!(3.14259)]), "   3.143");
        assert_eq!(f("%f", &[json!(1.5)]), "1.500000");
        assert_eq!(f("%e", &[json!(1234.5678)]), "1.234568e+03");
        assert_eq!(f("%E", &[json!(0.00015)]), "1.500000E-04");
        assert_eq!(f("%g", &[json!(1e6)]), "1e+06");
        assert_eq!(f("%g", &[json!(0.00001)]), "1e-05");
        assert_eq!(f("%v", &[json!(100000.0)]), "100000");
        assert_eq!(f("%v", &[json!(1.5)]), "1.5");
        assert_eq!(f("%.3g", &[json!(3.14259)]), "3.14");
        assert_eq!(f("%+.1f", &[json!(2.26)]), "+2.3");
        assert_eq!(f("%08.2f", &[json!(-1.5)]), "-0001.50");
    }

    #[test]
    fn strings_and_padding() {
        assert_eq!(f("%.2s", &[json!("hello")]), "he");
        assert_eq!(f("%3s|%-3s|", &[json!("é"), json!("é")]), "  é|é  |");
        assert_eq!(f("%05s", &[json!("ab")]), "   ab");
        assert_eq!(f("%t %v", &[json!(true), json!(false)]), "true false");
        assert_eq!(f("%v", &[Value::Null]), "<nil>");
    }

    #[test]
    fn collections_apply_verb_per_element() {
        assert_eq!(f("%v", &[json!([1, "a"])]), "[1 a]");
        assert_eq!(f("%v", &[json!({"a": 1, "b": "x"})]), "map[a:1 b:x]");
        assert_eq!(f("%d", &[json!([1, "a"])]), "[1 %!d(string=a)]");
        assert_eq!(f("", &[json!([1])]), "%!(EXTRA array=[1])");
    }

    #[test]
    fn oversized_padding_is_rejected() {
        assert_eq!(f("%9999999d", &[json!(1)]), "%!(BADWIDTH)1");
        assert_eq!(f("%.9999999d", &[json!(1)]), "%!(BADPREC)1");
        assert_eq!(
            f("%99999999999999999999999d", &[json!(1)]),
            "%!(BADWIDTH)1"
        );
    }

    #[test]
    fn counts_directives() {
        assert_eq!(directive_count("msg: %s"), 1);
        assert_eq!(directive_count("%d%% of %-5.2f"), 2);
        assert_eq!(directive_count("100%"), 0);
        assert_eq!(directive_count("plain"), 0);
    }
}
