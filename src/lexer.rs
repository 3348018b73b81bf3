/// Expression operators, in the order they are tried (longest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    EqualEqual,
    BangEqual,
    LessEqual,
    GreaterEqual,
    And,
    Or,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Less,
    Greater,
    Bang,
}

const OPERATORS: [(&str, Operator); 14] = [
    ("==", Operator::EqualEqual),
    ("!=", Operator::BangEqual),
    ("<=", Operator::LessEqual),
    (">=", Operator::GreaterEqual),
    ("&&", Operator::And),
    ("||", Operator::Or),
    ("+", Operator::Plus),
    ("-", Operator::Minus),
    ("*", Operator::Star),
    ("/", Operator::Slash),
    ("%", Operator::Percent),
    ("<", Operator::Less),
    (">", Operator::Greater),
    ("!", Operator::Bang),
];

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    String(String),
    Bool(bool),
    /// An identifier-shaped run (`name`, `name.field`, ...) whose meaning is
    /// decided when the expression is evaluated.
    Word(String),
    LeftParen,
    RightParen,
    Operator(Operator),
    End,
}

/// Saved lexer position, see [`Lexer::checkpoint`].
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
    current: usize,
}

/// Pull-based tokenizer over a single expression line. Never fails: any input
/// yields some token sequence, and `End` repeats once the input is exhausted.
pub struct Lexer<'a> {
    source: &'a str,
    current: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            current: 0,
        }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            current: self.current,
        }
    }

    pub fn rewind(&mut self, checkpoint: Checkpoint) {
        self.current = checkpoint.current;
    }

    pub fn next_token(&mut self) -> Token {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }

        let Some(c) = self.peek() else {
            return Token::End;
        };

        match c {
            '(' => {
                self.advance();
                Token::LeftParen
            }
            ')' => {
                self.advance();
                Token::RightParen
            }
            '"' | '\'' => self.string(c),
            // the number rule runs before the operator table, so a `-` is
            // always read as a sign; a lone one comes back as the text "-"
            c if c.is_ascii_digit() || c == '-' => self.number(),
            _ => match self.operator() {
                Some(op) => Token::Operator(op),
                None => self.word(),
            },
        }
    }

    /// Collects every remaining token, `End` excluded.
    pub fn tokens(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            match self.next_token() {
                Token::End => return tokens,
                token => tokens.push(token),
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.current..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.current += c.len_utf8();
        Some(c)
    }

    fn string(&mut self, quote: char) -> Token {
        self.advance();

        let mut buffer = String::new();
        let mut escaped = false;
        while let Some(c) = self.advance() {
            if escaped {
                buffer.push(if c == 'n' { '\n' } else { c });
                escaped = false;
                continue;
            }
            if c == '\\' {
                escaped = true;
                continue;
            }
            if c == quote {
                return Token::String(buffer);
            }
            buffer.push(c);
        }

        // unterminated: keep a dangling backslash as written
        if escaped {
            buffer.push('\\');
        }
        Token::String(buffer)
    }

    fn number(&mut self) -> Token {
        let start = self.current;
        if self.peek() == Some('-') {
            self.advance();
        }

        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.source[start..self.current];
        match text.parse::<f64>() {
            Ok(n) if is_number_literal(text) => Token::Number(n),
            // "1." and friends read as plain text
            _ => Token::String(text.to_string()),
        }
    }

    fn operator(&mut self) -> Option<Operator> {
        let rest = &self.source[self.current..];
        let (symbol, op) = OPERATORS
            .iter()
            .find(|(symbol, _)| rest.starts_with(symbol))?;
        self.current += symbol.len();
        Some(*op)
    }

    fn word(&mut self) -> Token {
        let start = self.current;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            self.advance();
        }

        if self.current == start {
            // not part of any token: swallow it
            self.advance();
            return Token::String(String::new());
        }

        match &self.source[start..self.current] {
            "true" => Token::Bool(true),
            "false" => Token::Bool(false),
            text => Token::Word(text.to_string()),
        }
    }
}

/// `-?\d+(\.\d+)?`
pub fn is_number_literal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    all_digits(whole) && fraction.map_or(true, all_digits)
}
