//! Packages a formula may import, and the functions they export.

use crate::runtime::{ExecutionError, RuntimeValue};
use crate::types::{Signature, Type};
use crate::value::format_float;
use rand::Rng;
use std::fmt::Write as _;

pub const PACKAGES: &[&str] = &["fmt", "strings", "math", "math/rand"];

/// Largest string, in bytes, a package function will build.
pub const MAX_STRING_LEN: usize = 64 << 20;

/// Widths and precisions stop being read once they exceed this.
const MAX_FORMAT_NUMBER: usize = 1_000_000;

/// A package-level function implemented natively.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Native {
    Sprintf,
    Sprint,
    Sprintln,
    ToUpper,
    ToLower,
    TrimSpace,
    Contains,
    HasPrefix,
    HasSuffix,
    Repeat,
    ReplaceAll,
    Sqrt,
    Pow,
    Abs,
    Floor,
    Ceil,
    Round,
    Max,
    Min,
    Intn,
    RandomInt,
    Float64,
}

const MEMBERS: &[(&str, &str, Native)] = &[
    ("fmt", "Sprintf", Native::Sprintf),
    ("fmt", "Sprint", Native::Sprint),
    ("fmt", "Sprintln", Native::Sprintln),
    ("strings", "ToUpper", Native::ToUpper),
    ("strings", "ToLower", Native::ToLower),
    ("strings", "TrimSpace", Native::TrimSpace),
    ("strings", "Contains", Native::Contains),
    ("strings", "HasPrefix", Native::HasPrefix),
    ("strings", "HasSuffix", Native::HasSuffix),
    ("strings", "Repeat", Native::Repeat),
    ("strings", "ReplaceAll", Native::ReplaceAll),
    ("math", "Sqrt", Native::Sqrt),
    ("math", "Pow", Native::Pow),
    ("math", "Abs", Native::Abs),
    ("math", "Floor", Native::Floor),
    ("math", "Ceil", Native::Ceil),
    ("math", "Round", Native::Round),
    ("math", "Max", Native::Max),
    ("math", "Min", Native::Min),
    ("math/rand", "Intn", Native::Intn),
    ("math/rand", "RandomInt", Native::RandomInt),
    ("math/rand", "Float64", Native::Float64),
];

pub fn package_exists(path: &str) -> bool {
    PACKAGES.contains(&path)
}

pub fn lookup(path: &str, member: &str) -> Option<Native> {
    MEMBERS
        .iter()
        .find(|(package, name, _)| *package == path && *name == member)
        .map(|(_, _, native)| *native)
}

pub fn member_signature(path: &str, member: &str) -> Option<Signature> {
    lookup(path, member).map(Native::signature)
}

impl Native {
    pub fn name(self) -> &'static str {
        MEMBERS
            .iter()
            .find(|(_, _, native)| *native == self)
            .map_or("native", |(_, name, _)| name)
    }

    pub fn signature(self) -> Signature {
        use Type::{Bool, Float, Int, String};
        match self {
            Native::Sprintf => Signature::variadic(vec![String], Type::Any, String),
            Native::Sprint | Native::Sprintln => Signature::variadic(vec![], Type::Any, String),
            Native::ToUpper | Native::ToLower | Native::TrimSpace => {
                Signature::new(vec![String], String)
            }
            Native::Contains | Native::HasPrefix | Native::HasSuffix => {
                Signature::new(vec![String, String], Bool)
            }
            Native::Repeat => Signature::new(vec![String, Int], String),
            Native::ReplaceAll => Signature::new(vec![String, String, String], String),
            Native::Sqrt | Native::Abs | Native::Floor | Native::Ceil | Native::Round => {
                Signature::new(vec![Float], Float)
            }
            Native::Pow | Native::Max | Native::Min => Signature::new(vec![Float, Float], Float),
            Native::Intn => Signature::new(vec![Int], Int),
            Native::RandomInt => Signature::new(vec![Int, Int], Int),
            Native::Float64 => Signature::new(vec![], Float),
        }
    }

    pub fn call<'a>(self, args: &[RuntimeValue<'a>]) -> Result<RuntimeValue<'a>, ExecutionError> {
        let value = match self {
            Native::Sprintf => {
                let (format, rest) = args
                    .split_first()
                    .ok_or_else(|| self.bad_arguments())?;
                RuntimeValue::String(sprintf(self.string_arg(format)?, rest))
            }
            Native::Sprint => RuntimeValue::String(sprint(args)),
            Native::Sprintln => {
                let mut out = args
                    .iter()
                    .map(|arg| arg.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                out.push('\n');
                RuntimeValue::String(out)
            }
            Native::ToUpper => RuntimeValue::String(self.string_at(args, 0)?.to_uppercase()),
            Native::ToLower => RuntimeValue::String(self.string_at(args, 0)?.to_lowercase()),
            Native::TrimSpace => RuntimeValue::String(self.string_at(args, 0)?.trim().to_string()),
            Native::Contains => {
                RuntimeValue::Bool(self.string_at(args, 0)?.contains(self.string_at(args, 1)?))
            }
            Native::HasPrefix => {
                RuntimeValue::Bool(self.string_at(args, 0)?.starts_with(self.string_at(args, 1)?))
            }
            Native::HasSuffix => {
                RuntimeValue::Bool(self.string_at(args, 0)?.ends_with(self.string_at(args, 1)?))
            }
            Native::Repeat => {
                let count = self.int_at(args, 1)?;
                let count = usize::try_from(count)
                    .map_err(|_| ExecutionError::runtime("strings: negative Repeat count"))?;
                let s = self.string_at(args, 0)?;
                match s.len().checked_mul(count) {
                    Some(len) if len <= MAX_STRING_LEN => RuntimeValue::String(s.repeat(count)),
                    _ => return Err(ExecutionError::runtime("strings: Repeat output length overflow")),
                }
            }
            Native::ReplaceAll => {
                let (s, old, new) = (
                    self.string_at(args, 0)?,
                    self.string_at(args, 1)?,
                    self.string_at(args, 2)?,
                );
                RuntimeValue::String(replace_all(s, old, new))
            }
            Native::Sqrt => RuntimeValue::Float(self.float_at(args, 0)?.sqrt()),
            Native::Pow => RuntimeValue::Float(self.float_at(args, 0)?.powf(self.float_at(args, 1)?)),
            Native::Abs => RuntimeValue::Float(self.float_at(args, 0)?.abs()),
            Native::Floor => RuntimeValue::Float(self.float_at(args, 0)?.floor()),
            Native::Ceil => RuntimeValue::Float(self.float_at(args, 0)?.ceil()),
            Native::Round => RuntimeValue::Float(self.float_at(args, 0)?.round()),
            Native::Max | Native::Min => {
                let (a, b) = (self.float_at(args, 0)?, self.float_at(args, 1)?);
                let picked = if a.is_nan() || b.is_nan() {
                    f64::NAN
                } else if self == Native::Max {
                    a.max(b)
                } else {
                    a.min(b)
                };
                RuntimeValue::Float(picked)
            }
            Native::Intn => {
                let n = self.int_at(args, 0)?;
                if n <= 0 {
                    return Err(ExecutionError::runtime("invalid argument to Intn"));
                }
                RuntimeValue::Int(rand::thread_rng().gen_range(0..n))
            }
            Native::RandomInt => {
                let (min, max) = (self.int_at(args, 0)?, self.int_at(args, 1)?);
                if max <= min {
                    return Err(ExecutionError::runtime("invalid argument to RandomInt"));
                }
                RuntimeValue::Int(rand::thread_rng().gen_range(min..max))
            }
            Native::Float64 => RuntimeValue::Float(rand::thread_rng().gen::<f64>()),
        };
        Ok(value)
    }

    fn bad_arguments(self) -> ExecutionError {
        ExecutionError::runtime(format!("bad arguments in call to {}", self.name()))
    }

    fn string_arg<'v>(self, value: &'v RuntimeValue<'_>) -> Result<&'v str, ExecutionError> {
        match value {
            RuntimeValue::String(s) => Ok(s),
            _ => Err(self.bad_arguments()),
        }
    }

    fn string_at<'v>(self, args: &'v [RuntimeValue<'_>], index: usize) -> Result<&'v str, ExecutionError> {
        args.get(index)
            .ok_or_else(|| self.bad_arguments())
            .and_then(|value| self.string_arg(value))
    }

    fn int_at(self, args: &[RuntimeValue<'_>], index: usize) -> Result<i64, ExecutionError> {
        match args.get(index) {
            Some(RuntimeValue::Int(v)) => Ok(*v),
            _ => Err(self.bad_arguments()),
        }
    }

    fn float_at(self, args: &[RuntimeValue<'_>], index: usize) -> Result<f64, ExecutionError> {
        match args.get(index) {
            Some(RuntimeValue::Float(v)) => Ok(*v),
            _ => Err(self.bad_arguments()),
        }
    }
}

fn replace_all(s: &str, old: &str, new: &str) -> String {
    if !old.is_empty() {
        return s.replace(old, new);
    }
    // An empty pattern matches before every character and at the end.
    let mut out = String::with_capacity(s.len() + new.len() * (s.chars().count() + 1));
    out.push_str(new);
    for ch in s.chars() {
        out.push(ch);
        out.push_str(new);
    }
    out
}

/// Operands are separated by a space when neither side is a string.
fn sprint(args: &[RuntimeValue<'_>]) -> String {
    let mut out = String::new();
    for (index, arg) in args.iter().enumerate() {
        let is_string = matches!(arg, RuntimeValue::String(_));
        let prev_string = index > 0 && matches!(args[index - 1], RuntimeValue::String(_));
        if index > 0 && !is_string && !prev_string {
            out.push(' ');
        }
        let _ = write!(out, "{arg}");
    }
    out
}

#[derive(Default)]
struct Spec {
    minus: bool,
    plus: bool,
    space: bool,
    zero: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

impl Spec {
    fn pad(&self, out: &mut String, body: &str) {
        let len = body.chars().count();
        let fill = self.width.map_or(0, |w| w.saturating_sub(len));
        if fill == 0 {
            out.push_str(body);
        } else if self.minus {
            out.push_str(body);
            out.extend(std::iter::repeat(' ').take(fill));
        } else if self.zero {
            let (sign, digits) = match body.strip_prefix(['-', '+']) {
                Some(rest) => (&body[..1], rest),
                None => ("", body),
            };
            out.push_str(sign);
            out.extend(std::iter::repeat('0').take(fill));
            out.push_str(digits);
        } else {
            out.extend(std::iter::repeat(' ').take(fill));
            out.push_str(body);
        }
    }

    fn sign(&self, negative: bool) -> &'static str {
        if negative {
            "-"
        } else if self.plus {
            "+"
        } else if self.space {
            " "
        } else {
            ""
        }
    }
}

/// Formats according to a Go-style format string.
pub fn sprintf(format: &str, args: &[RuntimeValue<'_>]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();
    let mut next_arg = 0;

    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.minus = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                '0' => spec.zero = true,
                _ => break,
            }
            chars.next();
        }
        let Ok(width) = take_number(&mut chars) else {
            out.push_str("%!(NOVERB)");
            break;
        };
        spec.width = width;
        if chars.peek() == Some(&'.') {
            chars.next();
            let Ok(precision) = take_number(&mut chars) else {
                out.push_str("%!(NOVERB)");
                break;
            };
            spec.precision = Some(precision.unwrap_or(0));
        }
        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }
        let Some(arg) = args.get(next_arg) else {
            let _ = write!(out, "%!{verb}(MISSING)");
            continue;
        };
        next_arg += 1;
        format_arg(&mut out, &spec, verb, arg);
    }

    if next_arg < args.len() {
        out.push_str("%!(EXTRA ");
        let extra = args[next_arg..]
            .iter()
            .map(|arg| format!("{}={arg}", arg.type_name()))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&extra);
        out.push(')');
    }
    out
}

/// A width or precision too long to be meant; the rest of the format is
/// dropped, as Go does.
struct NumberTooLarge;

fn take_number(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<Option<usize>, NumberTooLarge> {
    let mut number: Option<usize> = None;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        let current = number.unwrap_or(0);
        if current > MAX_FORMAT_NUMBER {
            return Err(NumberTooLarge);
        }
        number = Some(current * 10 + digit as usize);
        chars.next();
    }
    Ok(number)
}

fn format_arg(out: &mut String, spec: &Spec, verb: char, arg: &RuntimeValue<'_>) {
    let body = match (verb, arg) {
        ('v', RuntimeValue::Float(v)) if spec.precision.is_none() => {
            format!("{}{}", spec.sign(v.is_sign_negative() && *v != 0.0), format_float(v.abs()))
        }
        ('v', RuntimeValue::Int(v)) | ('d', RuntimeValue::Int(v)) => {
            format!("{}{}", spec.sign(*v < 0), v.unsigned_abs())
        }
        ('v', _) if !matches!(arg, RuntimeValue::Float(_)) => {
            let text = arg.to_string();
            match spec.precision {
                Some(p) if matches!(arg, RuntimeValue::String(_)) => text.chars().take(p).collect(),
                _ => text,
            }
        }
        ('s', RuntimeValue::String(s)) => match spec.precision {
            Some(p) => s.chars().take(p).collect(),
            None => s.clone(),
        },
        ('q', RuntimeValue::String(s)) => format!("{s:?}"),
        ('t', RuntimeValue::Bool(b)) => b.to_string(),
        ('x', RuntimeValue::Int(v)) => format!("{}{:x}", spec.sign(*v < 0), v.unsigned_abs()),
        ('X', RuntimeValue::Int(v)) => format!("{}{:X}", spec.sign(*v < 0), v.unsigned_abs()),
        ('x', RuntimeValue::String(s)) => s.bytes().map(|b| format!("{b:02x}")).collect(),
        ('f' | 'F' | 'v', RuntimeValue::Float(v)) => {
            let precision = spec.precision.unwrap_or(6);
            format!("{}{:.*}", spec.sign(v.is_sign_negative()), precision, v.abs())
        }
        ('e', RuntimeValue::Float(v)) => {
            let precision = spec.precision.unwrap_or(6);
            let raw = format!("{:.*e}", precision, v.abs());
            format!("{}{}", spec.sign(v.is_sign_negative()), go_exponent(&raw))
        }
        ('g', RuntimeValue::Float(v)) => {
            format!("{}{}", spec.sign(v.is_sign_negative() && *v != 0.0), format_float(v.abs()))
        }
        _ => {
            let _ = write!(out, "%!{verb}({}={arg})", arg.type_name());
            return;
        }
    };
    spec.pad(out, &body);
}

fn go_exponent(raw: &str) -> String {
    match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => raw.to_string(),
    }
}
