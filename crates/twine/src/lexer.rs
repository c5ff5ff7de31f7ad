//! Hand-written tokenizer for the scanned scripting language.
//!
//! Produces byte-span annotated tokens for the recursive-descent parser.
//! Comments are skipped entirely (so a directive inside a comment can never
//! be scanned), and each token records whether a line terminator preceded it,
//! which the parser needs for automatic semicolon insertion.

use crate::error::ParseError;

/// Reserved words recognized by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kw {
    Var,
    Function,
    If,
    Else,
    For,
    While,
    Do,
    Switch,
    Case,
    Default,
    Try,
    Catch,
    Finally,
    Throw,
    Return,
    Break,
    Continue,
    New,
    Delete,
    Typeof,
    Instanceof,
    In,
    Void,
    This,
    Null,
    True,
    False,
    With,
    Debugger,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Keyword(Kw),
    Number(f64),
    Str(String),
    Regex(String),
    Punct(&'static str),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    /// Whether at least one line terminator occurred before this token.
    pub newline_before: bool,
}

/// Multi-character operators first so the longest match wins.
const PUNCTS: &[&str] = &[
    ">>>=", "===", "!==", ">>>", "<<=", ">>=", "&&", "||", "==", "!=", "<=", ">=", "++", "--",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "{", "}", "(", ")", "[", "]", ";",
    ",", "<", ">", "+", "-", "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", "=", ".",
];

fn keyword(word: &str) -> Option<Kw> {
    let kw = match word {
        "var" => Kw::Var,
        "function" => Kw::Function,
        "if" => Kw::If,
        "else" => Kw::Else,
        "for" => Kw::For,
        "while" => Kw::While,
        "do" => Kw::Do,
        "switch" => Kw::Switch,
        "case" => Kw::Case,
        "default" => Kw::Default,
        "try" => Kw::Try,
        "catch" => Kw::Catch,
        "finally" => Kw::Finally,
        "throw" => Kw::Throw,
        "return" => Kw::Return,
        "break" => Kw::Break,
        "continue" => Kw::Continue,
        "new" => Kw::New,
        "delete" => Kw::Delete,
        "typeof" => Kw::Typeof,
        "instanceof" => Kw::Instanceof,
        "in" => Kw::In,
        "void" => Kw::Void,
        "this" => Kw::This,
        "null" => Kw::Null,
        "true" => Kw::True,
        "false" => Kw::False,
        "with" => Kw::With,
        "debugger" => Kw::Debugger,
        _ => return None,
    };
    Some(kw)
}

/// Convert a byte offset into 1-based line/column coordinates.
pub(crate) fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut last_newline = 0;
    for (i, b) in source.bytes().enumerate() {
        if i >= offset {
            break;
        }
        if b == b'\n' {
            line += 1;
            last_newline = i + 1;
        }
    }
    (line, offset - last_newline + 1)
}

struct Lexer<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    i: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().collect(),
            i: 0,
        }
    }

    fn offset(&self) -> usize {
        self.chars.get(self.i).map_or(self.src.len(), |&(o, _)| o)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.i).map(|&(_, c)| c)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.i + ahead).map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.i += 1;
        }
        c
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> ParseError {
        let (line, column) = offset_to_line_col(self.src, offset);
        ParseError {
            offset,
            line,
            column,
            message: message.into(),
        }
    }

    /// Skip whitespace and comments, reporting whether a line terminator was
    /// crossed.
    fn skip_trivia(&mut self) -> Result<bool, ParseError> {
        let mut saw_newline = false;
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    if c == '\n' || c == '\r' || c == '\u{2028}' || c == '\u{2029}' {
                        saw_newline = true;
                    }
                    self.bump();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    let start = self.offset();
                    self.bump();
                    self.bump();
                    let mut closed = false;
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            saw_newline = true;
                        }
                        if c == '*' && self.peek() == Some('/') {
                            self.bump();
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        return Err(self.error(start, "unterminated block comment"));
                    }
                }
                _ => return Ok(saw_newline),
            }
        }
    }

    fn read_ident(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }
        word
    }

    fn read_number(&mut self) -> Result<f64, ParseError> {
        let start = self.offset();
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X')) {
            self.bump();
            self.bump();
            let digits_start = self.offset();
            while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
                self.bump();
            }
            let digits = &self.src[digits_start..self.offset()];
            if digits.is_empty() {
                return Err(self.error(start, "missing hexadecimal digits"));
            }
            let value = u64::from_str_radix(digits, 16)
                .map_err(|_| self.error(start, "invalid hexadecimal literal"))?;
            return Ok(value as f64);
        }

        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') {
            self.bump();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            if !matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                return Err(self.error(start, "missing exponent digits"));
            }
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        self.src[start..self.offset()]
            .parse::<f64>()
            .map_err(|_| self.error(start, "invalid number literal"))
    }

    fn read_string(&mut self, quote: char) -> Result<String, ParseError> {
        let start = self.offset();
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(start, "unterminated string literal")),
                Some(c) if c == quote => return Ok(value),
                Some('\n') => return Err(self.error(start, "unterminated string literal")),
                Some('\\') => match self.bump() {
                    None => return Err(self.error(start, "unterminated string literal")),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('b') => value.push('\u{8}'),
                    Some('f') => value.push('\u{c}'),
                    Some('v') => value.push('\u{b}'),
                    Some('0') => value.push('\0'),
                    Some('x') => value.push(self.read_hex_escape(2)?),
                    Some('u') => value.push(self.read_hex_escape(4)?),
                    // Escaped line terminator is a line continuation.
                    Some('\r') => {
                        if self.peek() == Some('\n') {
                            self.bump();
                        }
                    }
                    Some('\n') => {}
                    Some(other) => value.push(other),
                },
                Some(other) => value.push(other),
            }
        }
    }

    fn read_hex_escape(&mut self, len: usize) -> Result<char, ParseError> {
        let start = self.offset();
        let mut code = 0u32;
        for _ in 0..len {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error(start, "invalid escape sequence"))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| self.error(start, "invalid escape sequence"))
    }

    fn read_regex(&mut self) -> Result<String, ParseError> {
        let start = self.offset();
        self.bump();
        let mut in_class = false;
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(self.error(start, "unterminated regular expression"));
                }
                Some('\\') => {
                    if self.bump().is_none() {
                        return Err(self.error(start, "unterminated regular expression"));
                    }
                }
                Some('[') => in_class = true,
                Some(']') => in_class = false,
                Some('/') if !in_class => break,
                Some(_) => {}
            }
        }
        while matches!(self.peek(), Some(c) if c.is_alphanumeric()) {
            self.bump();
        }
        Ok(self.src[start..self.offset()].to_owned())
    }
}

/// Whether a `/` at this point starts a regular expression rather than a
/// division operator, judged from the previous significant token.
fn regex_allowed(prev: Option<&TokenKind>) -> bool {
    match prev {
        None => true,
        Some(TokenKind::Keyword(Kw::This | Kw::Null | Kw::True | Kw::False)) => false,
        Some(TokenKind::Keyword(_)) => true,
        Some(TokenKind::Punct(")" | "]" | "++" | "--")) => false,
        Some(TokenKind::Punct(_)) => true,
        Some(_) => false,
    }
}

/// Tokenize a whole source fragment.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer::new(source);
    let mut tokens: Vec<Token> = Vec::new();

    loop {
        let newline_before = lexer.skip_trivia()? || tokens.is_empty();
        let start = lexer.offset();
        let Some(c) = lexer.peek() else {
            tokens.push(Token {
                kind: TokenKind::Eof,
                start,
                end: start,
                newline_before,
            });
            return Ok(tokens);
        };

        let kind = if c.is_alphabetic() || c == '_' || c == '$' {
            let word = lexer.read_ident();
            match keyword(&word) {
                Some(kw) => TokenKind::Keyword(kw),
                None => TokenKind::Ident(word),
            }
        } else if c.is_ascii_digit() || (c == '.' && matches!(lexer.peek_at(1), Some(d) if d.is_ascii_digit()))
        {
            TokenKind::Number(lexer.read_number()?)
        } else if c == '"' || c == '\'' {
            TokenKind::Str(lexer.read_string(c)?)
        } else if c == '/' && regex_allowed(tokens.last().map(|t| &t.kind)) {
            TokenKind::Regex(lexer.read_regex()?)
        } else {
            let rest = &lexer.src[start..];
            let punct = PUNCTS
                .iter()
                .find(|p| rest.starts_with(**p))
                .copied()
                .ok_or_else(|| lexer.error(start, format!("unexpected character `{c}`")))?;
            for _ in 0..punct.len() {
                lexer.bump();
            }
            TokenKind::Punct(punct)
        };

        tokens.push(Token {
            kind,
            start,
            end: lexer.offset(),
            newline_before,
        });
    }
}
