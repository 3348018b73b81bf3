//! Textual variable substitution.
//!
//! Rewrites every identifier-shaped piece of an expression into the literal
//! text of the value it names, before the expression is tokenized. Pieces are
//! separated by whitespace runs and single operator/parenthesis characters;
//! quote characters are not separators, so a quoted word surrounded by spaces
//! inside a string literal is rewritten too.

use crate::environment::{Binding, Environment, Resolved};
use crate::value::quote;

fn is_separator(c: char) -> bool {
    matches!(
        c,
        '(' | ')' | '!' | '<' | '>' | '=' | '&' | '|' | '+' | '-' | '*' | '/' | '%'
    )
}

/// Returns `expr` with resolvable identifiers replaced by literals.
pub fn substitute(expr: &str, env: &Environment) -> String {
    let mut out = String::with_capacity(expr.len());
    let mut piece = String::new();
    let mut chars = expr.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            flush(&mut piece, &mut out, env);
            out.push(c);
            while let Some(&ws) = chars.peek() {
                if !ws.is_whitespace() {
                    break;
                }
                out.push(ws);
                chars.next();
            }
        } else if is_separator(c) {
            flush(&mut piece, &mut out, env);
            out.push(c);
        } else {
            piece.push(c);
        }
    }
    flush(&mut piece, &mut out, env);

    out
}

fn flush(piece: &mut String, out: &mut String, env: &Environment) {
    if piece.is_empty() {
        return;
    }
    match env.resolve(piece) {
        Resolved::Value(value) => out.push_str(&value.to_literal()),
        Resolved::Object(object) => {
            out.push_str(&quote(&Binding::Object(object.clone()).to_string()))
        }
        Resolved::Unresolved => out.push_str(piece),
    }
    piece.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn env() -> Environment {
        let mut env = Environment::new();
        env.assign("x", Value::Number(5.0));
        env.assign("name", Value::from("Al \"the\" Pal"));
        env.assign("flag", Value::Bool(true));
        env.assign_field("user", "age", Value::Number(30.0));
        env
    }

    #[test]
    fn replaces_variables_and_fields() {
        let env = env();
        assert_eq!(substitute("x+1", &env), "5+1");
        assert_eq!(substitute("user.age >= 18", &env), "30 >= 18");
        assert_eq!(substitute("!flag", &env), "!true");
        assert_eq!(substitute("name", &env), r#""Al \"the\" Pal""#);
    }

    #[test]
    fn leaves_unknown_words_and_layout() {
        let env = env();
        assert_eq!(substitute("  y  *  (x)", &env), "  y  *  (5)");
        assert_eq!(substitute("user.email", &env), "user.email");
        assert_eq!(substitute("\"x\"", &env), "\"x\"");
    }

    #[test]
    fn words_inside_strings_are_not_protected() {
        let env = env();
        assert_eq!(substitute("\"a x b\"", &env), "\"a 5 b\"");
    }
}
