use crate::{
    ast::{
        Token, TokenInfo,
        query::{is_name_char, is_name_first},
    },
    config::Config,
};

/// Turns a query string into a flat list of positioned tokens.
///
/// The lexer never fails. Anything it cannot tokenize becomes a
/// [`Token::Illegal`] token so the parser can report it in context.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    config: Config,
    tokens: Vec<TokenInfo>,
    stack: Vec<Token>,
}

impl Lexer {
    pub fn new(input: &str, config: Config) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 0,
            config,
            tokens: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
        self.column += 1;
    }

    fn skip_whitespace(&mut self) {
        // B = %x20 / %x09 / %x0A / %x0D
        while let Some(ch) = self.current_char() {
            match ch {
                '\n' => {
                    self.position += 1;
                    self.line += 1;
                    self.column = 0;
                }
                ' ' | '\t' | '\r' => self.advance(),
                _ => break,
            }
        }
    }

    /// Pushes a token that started at `column` and ends at the current
    /// position.
    fn push(&mut self, token: Token, column: usize, literal: String) {
        self.tokens.push(TokenInfo {
            token,
            line: self.line,
            column,
            len: self.column - column,
            literal,
        });
    }

    /// Consumes `len` characters and pushes them as one token.
    fn single(&mut self, token: Token, len: usize) {
        let column = self.column;
        let literal: String = self.input[self.position..self.position + len].iter().collect();
        for _ in 0..len {
            self.advance();
        }
        self.push(token, column, literal);
    }

    /// Marks everything from `column` to the end of input as illegal.
    fn illegal_rest(&mut self, start: usize, column: usize) {
        let literal: String = self.input[start..].iter().collect();
        while self.position < self.input.len() {
            self.advance();
        }
        self.push(Token::Illegal, column, literal);
    }

    pub fn tokenize(mut self) -> Vec<TokenInfo> {
        loop {
            self.skip_whitespace();
            let Some(ch) = self.current_char() else {
                break;
            };

            match ch {
                '$' => self.single(Token::Root, 1),
                '@' => self.single(Token::Current, 1),
                '*' => self.single(Token::Wildcard, 1),
                ',' => self.single(Token::Comma, 1),
                ':' => self.single(Token::ArraySlice, 1),
                '?' => self.single(Token::Filter, 1),
                '.' => {
                    if self.peek_char(1) == Some('.') {
                        self.single(Token::Recursive, 2);
                    } else {
                        self.single(Token::Child, 1);
                    }
                }
                '(' => {
                    self.stack.push(Token::ParenLeft);
                    self.single(Token::ParenLeft, 1);
                }
                '[' => {
                    self.stack.push(Token::BracketLeft);
                    self.single(Token::BracketLeft, 1);
                }
                ')' => self.close(Token::ParenLeft, Token::ParenRight),
                ']' => self.close(Token::BracketLeft, Token::BracketRight),
                '&' => self.pair('&', Token::And, None),
                '|' => self.pair('|', Token::Or, None),
                '!' => self.pair('=', Token::Ne, Some(Token::Not)),
                '>' => self.pair('=', Token::Ge, Some(Token::Gt)),
                '<' => self.pair('=', Token::Le, Some(Token::Lt)),
                '=' => {
                    if self.peek_char(1) == Some('~') {
                        self.single(Token::Matches, 2);
                    } else {
                        self.pair('=', Token::Eq, None);
                    }
                }
                '~' => self.read_property_name(),
                '\'' | '"' => self.read_string(ch),
                '-' if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => self.read_number(),
                c if c.is_ascii_digit() => self.read_number(),
                c if is_name_first(c) => self.read_identifier(),
                _ => self.single(Token::Illegal, 1),
            }
        }

        self.tokens
    }

    /// Two-character operator whose first character is the current one.
    /// Without the expected continuation the single-character fallback is
    /// used, or the character is illegal when there is none.
    fn pair(&mut self, second: char, token: Token, fallback: Option<Token>) {
        if self.peek_char(1) == Some(second) {
            self.single(token, 2);
        } else {
            self.single(fallback.unwrap_or(Token::Illegal), 1);
        }
    }

    fn close(&mut self, open: Token, token: Token) {
        if self.stack.last() == Some(&open) {
            self.stack.pop();
            self.single(token, 1);
        } else {
            self.single(Token::Illegal, 1);
        }
    }

    fn read_property_name(&mut self) {
        let follows_name = self.tokens.last().is_some_and(|prev| {
            (prev.token.is_member_name()
                || prev.token == Token::BracketRight
                || prev.token == Token::Current)
                && prev.line == self.line
                && prev.end_column() == self.column
        });

        if self.config.property_name_extension() && follows_name {
            self.single(Token::PropertyName, 1);
        } else {
            self.single(Token::Illegal, 1);
        }
    }

    fn read_identifier(&mut self) {
        let column = self.column;
        let mut ident = String::new();
        while let Some(ch) = self.current_char() {
            if is_name_char(ch) {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let token = match ident.as_str() {
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            _ if self.current_char() == Some('(') => Token::FunctionName,
            _ => Token::String,
        };
        self.push(token, column, ident);
    }

    fn read_number(&mut self) {
        let start = self.position;
        let column = self.column;
        let mut is_float = false;

        if self.current_char() == Some('-') {
            self.advance();
        }

        // int = "0" / DIGIT1 *DIGIT
        if self.current_char() == Some('0') && self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) {
            self.illegal_number(start, column);
            return;
        }
        self.skip_digits();

        if self.current_char() == Some('.') && self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            self.skip_digits();
        }

        if matches!(self.current_char(), Some('e' | 'E')) {
            let digits_at = match self.peek_char(1) {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if self.peek_char(digits_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                for _ in 0..digits_at {
                    self.advance();
                }
                self.skip_digits();
            }
        }

        let literal: String = self.input[start..self.position].iter().collect();
        let token = if is_float { Token::Float } else { Token::Integer };
        self.push(token, column, literal);
    }

    fn illegal_number(&mut self, start: usize, column: usize) {
        self.skip_digits();
        let literal: String = self.input[start..self.position].iter().collect();
        self.push(Token::Illegal, column, literal);
    }

    fn skip_digits(&mut self) {
        while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn read_string(&mut self, quote: char) {
        let start = self.position;
        let column = self.column;
        self.advance(); // opening quote

        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    self.push(Token::StringLiteral, column, result);
                    return;
                }
                '\\' => {
                    self.advance();
                    match self.read_escape() {
                        Some(c) => result.push(c),
                        None => {
                            self.illegal_rest(start, column);
                            return;
                        }
                    }
                }
                c if (c as u32) < 0x20 => {
                    self.illegal_rest(start, column);
                    return;
                }
                c => {
                    result.push(c);
                    self.advance();
                }
            }
        }

        // unterminated
        self.illegal_rest(start, column);
    }

    /// Decodes the escape following a backslash, leaving the cursor after it.
    fn read_escape(&mut self) -> Option<char> {
        let decoded = match self.current_char()? {
            'b' => '\u{0008}',
            't' => '\t',
            'n' => '\n',
            'f' => '\u{000C}',
            'r' => '\r',
            '/' => '/',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            'u' => {
                self.advance();
                return self.read_unicode_escape();
            }
            _ => return None,
        };
        self.advance();
        Some(decoded)
    }

    fn read_unicode_escape(&mut self) -> Option<char> {
        let high = self.read_hex4()?;
        match high {
            0xD800..=0xDBFF => {
                if self.current_char() != Some('\\') || self.peek_char(1) != Some('u') {
                    return None;
                }
                self.advance();
                self.advance();
                let low = self.read_hex4()?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return None;
                }
                char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
            }
            0xDC00..=0xDFFF => None,
            code => char::from_u32(code),
        }
    }

    fn read_hex4(&mut self) -> Option<u32> {
        let mut value = 0;
        for _ in 0..4 {
            let digit = self.current_char()?.to_digit(16)?;
            value = value * 16 + digit;
            self.advance();
        }
        Some(value)
    }
}

/// Renders a diagnostic pointing at `target` inside `input`:
///
/// ```text
/// Error at line 1, column 6: expected ']'
/// $.a[0 ,
///       ^
/// ```
pub fn render_error(input: &str, target: &TokenInfo, message: &str) -> String {
    let line = input.split('\n').nth(target.line.saturating_sub(1)).unwrap_or("");
    let dots = ".".repeat(target.len.saturating_sub(1));
    format!(
        "Error at line {}, column {}: {}\n{}\n{}^{}",
        target.line,
        target.column,
        message,
        line.trim_end_matches('\r'),
        " ".repeat(target.column),
        dots
    )
}
