use crate::builtins;
use crate::environment::{Binding, Environment, Resolved};
use crate::error::{PnaError, Span};
use crate::lexer::{Lexer, Operator, Token};
use crate::options::SubstitutionMode;
use crate::substitute::substitute;
use crate::value::Value;
use rand::rngs::StdRng;

/// Evaluates one expression line against the environment.
///
/// Parsing and evaluation happen in the same pass: each precedence level
/// pulls tokens from the lexer and combines values directly, rewinding when
/// the next token is not one of its operators. Tokens left over after the
/// outermost level are ignored.
pub struct Evaluator<'a> {
    env: &'a Environment,
    rng: &'a mut StdRng,
    mode: SubstitutionMode,
}

impl<'a> Evaluator<'a> {
    pub fn new(env: &'a Environment, rng: &'a mut StdRng, mode: SubstitutionMode) -> Self {
        Self { env, rng, mode }
    }

    /// Evaluates `expr`. The only failure is a builtin called with the wrong
    /// number of arguments; every other malformed input degrades to a value.
    pub fn evaluate(&mut self, expr: &str, span: &Span) -> Result<Value, PnaError> {
        let trimmed = expr.trim();
        let first_word = trimmed.split_whitespace().next().unwrap_or("");

        if let Some(builtin) = builtins::lookup(first_word) {
            let mut args = Vec::new();
            for arg in split_args(&trimmed[first_word.len()..]) {
                args.push(self.evaluate(&arg, span)?);
            }
            return builtin.call(self.rng, &args).map_err(|message| {
                PnaError::runtime_error_with_help(
                    span.clone(),
                    message,
                    format!("Usage: {}", builtin.usage),
                )
            });
        }

        tracing::trace!(expr = trimmed, "evaluating expression");
        let value = match self.mode {
            SubstitutionMode::Deferred => self.or(&mut Lexer::new(trimmed)),
            SubstitutionMode::Textual => {
                let text = substitute(expr, self.env);
                self.or(&mut Lexer::new(&text))
            }
        };
        Ok(value)
    }

    fn or(&mut self, lexer: &mut Lexer) -> Value {
        let mut left = self.and(lexer);
        loop {
            let checkpoint = lexer.checkpoint();
            match lexer.next_token() {
                Token::Operator(Operator::Or) => {
                    let right = self.and(lexer);
                    left = Value::Bool(left.as_bool() || right.as_bool());
                }
                _ => {
                    lexer.rewind(checkpoint);
                    return left;
                }
            }
        }
    }

    fn and(&mut self, lexer: &mut Lexer) -> Value {
        let mut left = self.comparison(lexer);
        loop {
            let checkpoint = lexer.checkpoint();
            match lexer.next_token() {
                Token::Operator(Operator::And) => {
                    let right = self.comparison(lexer);
                    left = Value::Bool(left.as_bool() && right.as_bool());
                }
                _ => {
                    lexer.rewind(checkpoint);
                    return left;
                }
            }
        }
    }

    fn comparison(&mut self, lexer: &mut Lexer) -> Value {
        let mut left = self.term(lexer);
        loop {
            let checkpoint = lexer.checkpoint();
            match lexer.next_token() {
                Token::Operator(
                    op @ (Operator::EqualEqual
                    | Operator::BangEqual
                    | Operator::Less
                    | Operator::Greater
                    | Operator::LessEqual
                    | Operator::GreaterEqual),
                ) => {
                    let right = self.term(lexer);
                    left = binary(op, left, right);
                }
                _ => {
                    lexer.rewind(checkpoint);
                    return left;
                }
            }
        }
    }

    fn term(&mut self, lexer: &mut Lexer) -> Value {
        let mut left = self.factor(lexer);
        loop {
            let checkpoint = lexer.checkpoint();
            match lexer.next_token() {
                Token::Operator(op @ (Operator::Plus | Operator::Minus)) => {
                    let right = self.factor(lexer);
                    left = binary(op, left, right);
                }
                _ => {
                    lexer.rewind(checkpoint);
                    return left;
                }
            }
        }
    }

    fn factor(&mut self, lexer: &mut Lexer) -> Value {
        let mut left = self.primary(lexer);
        loop {
            let checkpoint = lexer.checkpoint();
            match lexer.next_token() {
                Token::Operator(op @ (Operator::Star | Operator::Slash | Operator::Percent)) => {
                    let right = self.primary(lexer);
                    left = binary(op, left, right);
                }
                _ => {
                    lexer.rewind(checkpoint);
                    return left;
                }
            }
        }
    }

    fn primary(&mut self, lexer: &mut Lexer) -> Value {
        match lexer.next_token() {
            Token::Number(n) => Value::Number(n),
            Token::String(s) => Value::String(s),
            Token::Bool(b) => Value::Bool(b),
            Token::Word(word) => self.word(word),
            Token::LeftParen => {
                let value = self.or(lexer);
                // closing paren; whatever sits there is taken
                lexer.next_token();
                value
            }
            Token::Operator(Operator::Bang) => Value::Bool(!self.primary(lexer).as_bool()),
            Token::RightParen | Token::Operator(_) | Token::End => Value::String(String::new()),
        }
    }

    fn word(&self, word: String) -> Value {
        if self.mode == SubstitutionMode::Textual {
            return Value::String(word);
        }
        match self.env.resolve(&word) {
            Resolved::Value(value) => value.clone(),
            Resolved::Object(object) => Value::String(Binding::Object(object.clone()).to_string()),
            Resolved::Unresolved => Value::String(word),
        }
    }
}

fn binary(op: Operator, left: Value, right: Value) -> Value {
    match op {
        Operator::Plus => {
            if left.is_string() || right.is_string() {
                Value::String(format!("{}{}", left, right))
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        Operator::Minus => Value::Number(left.to_number() - right.to_number()),
        Operator::Star => Value::Number(left.to_number() * right.to_number()),
        Operator::Slash => {
            let divisor = right.to_number();
            if divisor == 0.0 {
                Value::Number(0.0)
            } else {
                Value::Number(left.to_number() / divisor)
            }
        }
        Operator::Percent => Value::Number(left.to_number() % right.to_number()),
        Operator::EqualEqual => Value::Bool(left.to_string() == right.to_string()),
        Operator::BangEqual => Value::Bool(left.to_string() != right.to_string()),
        Operator::Less => Value::Bool(left.to_number() < right.to_number()),
        Operator::Greater => Value::Bool(left.to_number() > right.to_number()),
        Operator::LessEqual => Value::Bool(left.to_number() <= right.to_number()),
        Operator::GreaterEqual => Value::Bool(left.to_number() >= right.to_number()),
        Operator::And => Value::Bool(left.as_bool() && right.as_bool()),
        Operator::Or => Value::Bool(left.as_bool() || right.as_bool()),
        Operator::Bang => Value::Bool(!right.as_bool()),
    }
}

/// Splits builtin arguments on whitespace outside quoted spans. Quotes and
/// escapes are kept in the pieces so each one evaluates as written.
pub fn split_args(text: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                current.push(c);
            }
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        args.push(current);
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;

    fn eval_with(env: &Environment, mode: SubstitutionMode, expr: &str) -> Value {
        let mut rng = StdRng::seed_from_u64(1);
        Evaluator::new(env, &mut rng, mode)
            .evaluate(expr, &Span::new(0, expr.len()))
            .expect("expression evaluates")
    }

    fn eval(expr: &str) -> Value {
        eval_with(&Environment::new(), SubstitutionMode::Deferred, expr)
    }

    #[test]
    fn literals() {
        assert_eq!(eval("3.14"), Value::Number(3.14));
        assert_eq!(eval("42"), Value::Number(42.0));
        assert_eq!(eval("\"hi\""), Value::from("hi"));
        assert_eq!(eval("true"), Value::Bool(true));
        assert_eq!(eval("hello"), Value::from("hello"));
    }

    #[test]
    fn equality_compares_display_strings() {
        assert_eq!(eval("1 == \"1\""), Value::Bool(true));
        assert_eq!(eval("1 == \"1.0\""), Value::Bool(false));
        assert_eq!(eval("true != \"true\""), Value::Bool(false));
    }

    #[test]
    fn arithmetic_leniency() {
        assert_eq!(eval("10 / 0"), Value::Number(0.0));
        assert_eq!(eval("10 / \"zero\"").to_string(), "NaN");
        assert_eq!(eval("\"a\" + 1"), Value::from("a1"));
        assert_eq!(eval("true + 1"), Value::Number(2.0));
        assert_eq!(eval("7 % 4"), Value::Number(3.0));
        assert_eq!(eval("\"3\" * 2"), Value::Number(6.0));
    }

    #[test]
    fn precedence_and_grouping() {
        assert_eq!(eval("1 + 2 * 3"), Value::Number(7.0));
        assert_eq!(eval("(1 + 2) * 3"), Value::Number(9.0));
        assert_eq!(eval("10 + 4 * 2 % 3"), Value::Number(12.0));
        assert_eq!(eval("1 < 2 && 3 > 4 || true"), Value::Bool(true));
        assert_eq!(eval("!false && !0"), Value::Bool(true));
        assert_eq!(eval("!1 == false"), Value::Bool(true));
    }

    #[test]
    fn garbage_degrades_instead_of_failing() {
        assert_eq!(eval(""), Value::from(""));
        assert_eq!(eval("* 3"), Value::from(""));
        assert_eq!(eval("1 2 3"), Value::Number(1.0));
        assert_eq!(eval("(1 + 2"), Value::Number(3.0));
        assert_eq!(eval("\"a\" + @"), Value::from("a"));
    }

    #[test]
    fn identifiers_resolve_at_evaluation_time() {
        let mut env = Environment::new();
        env.assign("x", Value::Number(5.0));
        env.assign_field("user", "name", Value::from("Bob"));

        let deferred = |expr| eval_with(&env, SubstitutionMode::Deferred, expr);
        assert_eq!(deferred("x + 1"), Value::Number(6.0));
        assert_eq!(deferred("x + 1 == 6"), Value::Bool(true));
        assert_eq!(deferred("user.name + \"!\""), Value::from("Bob!"));
        assert_eq!(deferred("user.age"), Value::from("user.age"));
        assert_eq!(deferred("\"x marks\""), Value::from("x marks"));
        assert_eq!(deferred("user"), Value::from("{name: \"Bob\"}"));
    }

    #[test]
    fn minus_reads_as_a_sign_not_an_operator() {
        let mut env = Environment::new();
        env.assign("x", Value::Number(10.0));

        for mode in [SubstitutionMode::Deferred, SubstitutionMode::Textual] {
            assert_eq!(eval_with(&env, mode, "10 - 4"), Value::Number(10.0));
            assert_eq!(eval_with(&env, mode, "x-1"), Value::Number(10.0));
            assert_eq!(eval_with(&env, mode, "x - -1"), Value::Number(10.0));
        }
        assert_eq!(eval("-3 * 2"), Value::Number(-6.0));
        assert_eq!(eval_with(&env, SubstitutionMode::Deferred, "-x"), Value::from("-"));
        // the substituted text "-10" lexes as one number
        assert_eq!(eval_with(&env, SubstitutionMode::Textual, "-x"), Value::Number(-10.0));
    }

    #[test]
    fn textual_mode_rewrites_before_lexing() {
        let mut env = Environment::new();
        env.assign("x", Value::Number(5.0));
        env.assign("quote", Value::from("say \"hi\""));

        let textual = |expr| eval_with(&env, SubstitutionMode::Textual, expr);
        assert_eq!(textual("x * 2"), Value::Number(10.0));
        assert_eq!(textual("quote"), Value::from("say \"hi\""));
        // words inside string literals are rewritten in this mode
        assert_eq!(textual("\"a x b\""), Value::from("a 5 b"));
    }

    #[test]
    fn builtin_calls_evaluate_arguments() {
        let mut env = Environment::new();
        env.assign("word", Value::from("hello"));

        assert_eq!(
            eval_with(&env, SubstitutionMode::Deferred, "len word"),
            Value::Number(5.0)
        );
        assert_eq!(eval("contains \"hello world\" \"o w\""), Value::Bool(true));
        assert_eq!(eval("capitalize 'rUST'"), Value::from("Rust"));
    }

    #[test]
    fn builtin_arity_errors_carry_usage() {
        let env = Environment::new();
        let mut rng = StdRng::seed_from_u64(1);
        let error = Evaluator::new(&env, &mut rng, SubstitutionMode::Deferred)
            .evaluate("len", &Span::new(4, 7))
            .expect_err("len needs an argument");
        assert_eq!(error.message, "len() takes exactly 1 argument, got 0");
        assert_eq!(error.help.as_deref(), Some("Usage: len value"));
        assert_eq!(error.span, Span::new(4, 7));
    }

    #[test]
    fn splits_arguments_outside_quotes() {
        assert_eq!(
            split_args(r#" "a b" c 'd \' e'  f"#),
            vec![
                "\"a b\"".to_string(),
                "c".to_string(),
                r"'d \' e'".to_string(),
                "f".to_string(),
            ]
        );
    }
}
