//! Builtin function table.
//!
//! Builtins are called with prefix syntax, `name arg1 arg2 ...`, and receive
//! their arguments already evaluated, left to right.

use crate::value::Value;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Between(usize, usize),
    AtLeast(usize),
}

impl Arity {
    fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::Between(lo, hi) => (lo..=hi).contains(&count),
            Arity::AtLeast(n) => count >= n,
        }
    }

    fn describe(&self) -> String {
        let plural = |n: usize| if n == 1 { "argument" } else { "arguments" };
        match *self {
            Arity::Exact(n) => format!("exactly {} {}", n, plural(n)),
            Arity::Between(lo, hi) => format!("{} to {} arguments", lo, hi),
            Arity::AtLeast(n) => format!("at least {} {}", n, plural(n)),
        }
    }
}

type BuiltinFn = fn(&mut StdRng, &[Value]) -> Value;

pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    pub usage: &'static str,
    func: BuiltinFn,
}

impl Builtin {
    /// Checks the argument count and runs the builtin. The error is the
    /// arity message; builtins themselves never fail.
    pub fn call(&self, rng: &mut StdRng, args: &[Value]) -> Result<Value, String> {
        if !self.arity.accepts(args.len()) {
            return Err(format!(
                "{}() takes {}, got {}",
                self.name,
                self.arity.describe(),
                args.len()
            ));
        }
        tracing::trace!(builtin = self.name, argc = args.len(), "calling builtin");
        Ok((self.func)(rng, args))
    }
}

static BUILTINS: &[Builtin] = &[
    Builtin { name: "len", arity: Arity::Exact(1), usage: "len value", func: len },
    Builtin { name: "int", arity: Arity::Exact(1), usage: "int value", func: to_int },
    Builtin { name: "str", arity: Arity::Exact(1), usage: "str value", func: to_str },
    Builtin { name: "bool", arity: Arity::Exact(1), usage: "bool value", func: to_bool },
    Builtin { name: "not", arity: Arity::Exact(1), usage: "not value", func: negate },
    Builtin { name: "random", arity: Arity::Exact(2), usage: "random low high", func: random },
    Builtin { name: "randint", arity: Arity::Exact(2), usage: "randint low high", func: random },
    Builtin { name: "sleep", arity: Arity::Exact(1), usage: "sleep seconds", func: sleep },
    Builtin { name: "inlist", arity: Arity::Exact(2), usage: "inlist value \"a,b,c\"", func: inlist },
    Builtin { name: "contains", arity: Arity::Exact(2), usage: "contains text part", func: contains },
    Builtin { name: "startswith", arity: Arity::Exact(2), usage: "startswith text prefix", func: startswith },
    Builtin { name: "endswith", arity: Arity::Exact(2), usage: "endswith text suffix", func: endswith },
    Builtin { name: "choice", arity: Arity::AtLeast(1), usage: "choice a b ...", func: choice },
    Builtin { name: "capitalize", arity: Arity::Exact(1), usage: "capitalize text", func: capitalize },
    Builtin { name: "slice", arity: Arity::Between(2, 3), usage: "slice text start [end]", func: slice },
];

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

fn len(_: &mut StdRng, args: &[Value]) -> Value {
    Value::Number(args[0].to_string().chars().count() as f64)
}

fn to_int(_: &mut StdRng, args: &[Value]) -> Value {
    let n = args[0].to_number();
    Value::Number(if n.is_finite() { n.trunc() } else { f64::NAN })
}

fn to_str(_: &mut StdRng, args: &[Value]) -> Value {
    Value::String(args[0].to_string())
}

fn to_bool(_: &mut StdRng, args: &[Value]) -> Value {
    Value::Bool(args[0].is_truthy())
}

fn negate(_: &mut StdRng, args: &[Value]) -> Value {
    Value::Bool(!args[0].is_truthy())
}

/// `lo + (u32 % (hi - lo + 1))`. Whole bounds give an inclusive integer
/// range; fractional bounds keep their fraction.
fn random(rng: &mut StdRng, args: &[Value]) -> Value {
    let (a, b) = (args[0].to_number(), args[1].to_number());
    let lo = a.min(b);
    let span = a.max(b) - lo + 1.0;
    Value::Number(lo + f64::from(rng.gen::<u32>()) % span)
}

fn sleep(_: &mut StdRng, args: &[Value]) -> Value {
    let millis = (args[0].to_number() * 1000.0).floor();
    if millis.is_finite() && millis > 0.0 {
        thread::sleep(Duration::from_millis(millis as u64));
    }
    Value::Bool(true)
}

fn inlist(_: &mut StdRng, args: &[Value]) -> Value {
    let needle = args[0].to_string();
    let list = args[1].to_string();
    Value::Bool(list.split(',').any(|item| item.trim() == needle))
}

fn contains(_: &mut StdRng, args: &[Value]) -> Value {
    Value::Bool(args[0].to_string().contains(&args[1].to_string()))
}

fn startswith(_: &mut StdRng, args: &[Value]) -> Value {
    Value::Bool(args[0].to_string().starts_with(&args[1].to_string()))
}

fn endswith(_: &mut StdRng, args: &[Value]) -> Value {
    Value::Bool(args[0].to_string().ends_with(&args[1].to_string()))
}

fn choice(rng: &mut StdRng, args: &[Value]) -> Value {
    args.choose(rng)
        .cloned()
        .unwrap_or_else(|| Value::String(String::new()))
}

fn capitalize(_: &mut StdRng, args: &[Value]) -> Value {
    let text = args[0].to_string();
    let mut chars = text.chars();
    let capitalized = match chars.next() {
        Some(first) => {
            let mut out: String = first.to_uppercase().collect();
            out.push_str(&chars.as_str().to_lowercase());
            out
        }
        None => String::new(),
    };
    Value::String(capitalized)
}

/// Char-indexed slice. Negative indices count from the end, NaN reads as 0.
fn slice(_: &mut StdRng, args: &[Value]) -> Value {
    let chars: Vec<char> = args[0].to_string().chars().collect();
    let len = chars.len() as f64;
    let clamp = |value: &Value| {
        let n = value.to_number();
        let n = if n.is_nan() { 0.0 } else { n.trunc() };
        let n = if n < 0.0 { len + n } else { n };
        n.clamp(0.0, len) as usize
    };

    let start = clamp(&args[1]);
    let end = args.get(2).map_or(chars.len(), clamp);
    if start >= end {
        return Value::String(String::new());
    }
    Value::String(chars[start..end].iter().collect())
}
