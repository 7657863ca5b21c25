use std::fmt;

/// Lexical token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// Anything the lexer could not make sense of: an unterminated string,
    /// an invalid escape, an unmatched bracket, a stray operator character,
    /// or `~` while the property-name extension is disabled.
    Illegal,

    // Literals
    /// Quoted string, `'...'` or `"..."`. The literal holds the decoded text.
    ///
    /// # Examples
    /// ```text
    /// 'child'
    /// "it's"
    /// ```
    StringLiteral,

    /// Integer number
    ///
    /// # Examples
    /// ```text
    /// 0
    /// -3
    /// ```
    Integer,

    /// Number with a fraction or exponent
    ///
    /// # Examples
    /// ```text
    /// 9.99
    /// 1e10
    /// ```
    Float,

    /// `true`
    True,

    /// `false`
    False,

    /// `null`
    Null,

    // Names
    /// Bare member name, as in `$.store`.
    String,

    /// Identifier immediately followed by `(`.
    ///
    /// # Examples
    /// ```text
    /// length(@)
    /// match(@.name, 'a.*')
    /// ```
    FunctionName,

    // Structure
    /// Root node identifier `$`
    Root,

    /// Current node identifier `@`, valid inside filters
    Current,

    /// `*`
    Wildcard,

    /// Descendant segment `..`
    Recursive,

    /// Child segment `.`
    Child,

    /// `:` inside a slice selector
    ArraySlice,

    /// Filter selector `?`
    Filter,

    /// `,` separating selectors or function arguments
    Comma,

    /// `(`
    ParenLeft,

    /// `)`
    ParenRight,

    /// `[`
    BracketLeft,

    /// `]`
    BracketRight,

    /// Property-name extension `~`
    ///
    /// # Examples
    /// ```text
    /// $.paths~
    /// $.items[?(@~ == 'a')]
    /// ```
    PropertyName,

    // Logical
    /// `&&`
    And,

    /// `||`
    Or,

    /// `!`
    Not,

    // Comparison
    /// `==`
    Eq,

    /// `!=`
    Ne,

    /// `>`
    Gt,

    /// `>=`
    Ge,

    /// `<`
    Lt,

    /// `<=`
    Le,

    /// `=~`. Recognized so it can be reported, never accepted by the parser.
    Matches,
}

impl Token {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Token::Eq | Token::Ne | Token::Gt | Token::Ge | Token::Lt | Token::Le
        )
    }

    /// Tokens that can stand for a member name after `.` or `..`.
    pub fn is_member_name(&self) -> bool {
        matches!(
            self,
            Token::String | Token::True | Token::False | Token::Null
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Token::Illegal => "ILLEGAL",
            Token::StringLiteral => "STRING_LITERAL",
            Token::Integer => "INTEGER",
            Token::Float => "FLOAT",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::String => "STRING",
            Token::FunctionName => "FUNCTION",
            Token::Root => "$",
            Token::Current => "@",
            Token::Wildcard => "*",
            Token::Recursive => "..",
            Token::Child => ".",
            Token::ArraySlice => ":",
            Token::Filter => "?",
            Token::Comma => ",",
            Token::ParenLeft => "(",
            Token::ParenRight => ")",
            Token::BracketLeft => "[",
            Token::BracketRight => "]",
            Token::PropertyName => "~",
            Token::And => "&&",
            Token::Or => "||",
            Token::Not => "!",
            Token::Eq => "==",
            Token::Ne => "!=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Matches => "=~",
        };
        f.write_str(s)
    }
}

/// A token together with where it was found.
///
/// `line` is 1-based, `column` is a 0-based character offset into that line,
/// and `len` counts characters of source text covered by the token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenInfo {
    pub token: Token,
    pub line: usize,
    pub column: usize,
    pub len: usize,
    pub literal: String,
}

impl TokenInfo {
    /// Column one past the last character of the token.
    pub fn end_column(&self) -> usize {
        self.column + self.len
    }
}
