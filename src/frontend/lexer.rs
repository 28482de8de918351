//! Lexer for Go source
//!
//! Converts source code into a stream of tokens, inserting the semicolons
//! Go leaves implicit at line ends.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result, Span};

/// The lexer state
pub struct Lexer {
    /// Source code as characters
    source: Vec<char>,
    /// Current position in source
    pos: usize,
    /// Start position of current token
    start: usize,
    /// File ID for span tracking
    file_id: usize,
    /// Whether a newline after the previous token ends a statement
    insert_semi: bool,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str, file_id: usize) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            start: 0,
            file_id,
            insert_semi: false,
        }
    }

    /// Get the current character without advancing
    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    /// Get the next character without advancing
    fn peek_next(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    /// Advance to the next character
    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    /// Consume `expected` if it is the current character
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Check if we've reached the end of input
    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Create a span from start to current position
    fn make_span(&self) -> Span {
        Span::new(self.start, self.pos, self.file_id)
    }

    /// Create a token with the current span
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.make_span())
    }

    fn text(&self) -> String {
        self.source[self.start..self.pos].iter().collect()
    }

    /// Skip whitespace and comments.
    /// Returns true if a line break was crossed.
    fn skip_whitespace(&mut self) -> bool {
        let mut newline = false;
        while let Some(c) = self.peek() {
            match c {
                '\n' => {
                    newline = true;
                    self.advance();
                }
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                // Line comment
                '/' if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                // Block comment; Go does not nest them
                '/' if self.peek_next() == Some('*') => {
                    self.advance();
                    self.advance();
                    while !self.is_at_end() {
                        if self.peek() == Some('*') && self.peek_next() == Some('/') {
                            self.advance();
                            self.advance();
                            break;
                        }
                        if self.advance() == Some('\n') {
                            newline = true;
                        }
                    }
                }
                _ => break,
            }
        }
        newline
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text = self.text();
        let kind = TokenKind::keyword_from_str(&text).unwrap_or(TokenKind::Ident(text));
        self.make_token(kind)
    }

    fn read_digits(&mut self, radix: u32) {
        while let Some(c) = self.peek() {
            if c.is_digit(radix) || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read a number literal (integer, float or imaginary), kept as written
    fn read_number(&mut self) -> Token {
        let mut is_float = false;

        if self.peek() == Some('0') && matches!(self.peek_next(), Some('x' | 'X' | 'b' | 'B' | 'o' | 'O')) {
            self.advance();
            let radix = match self.advance() {
                Some('x' | 'X') => 16,
                Some('b' | 'B') => 2,
                _ => 8,
            };
            self.read_digits(radix);
        } else {
            self.read_digits(10);

            if self.peek() == Some('.') {
                is_float = true;
                self.advance();
                self.read_digits(10);
            }

            if matches!(self.peek(), Some('e' | 'E')) {
                is_float = true;
                self.advance();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
                self.read_digits(10);
            }
        }

        let text = self.text();
        if self.eat('i') {
            return self.make_token(TokenKind::ImagLit(self.text()));
        }
        if is_float {
            self.make_token(TokenKind::FloatLit(text))
        } else {
            self.make_token(TokenKind::IntLit(text))
        }
    }

    fn read_hex_escape(&mut self, digits: usize) -> Option<char> {
        let mut value = 0u32;
        for _ in 0..digits {
            value = value * 16 + self.advance()?.to_digit(16)?;
        }
        char::from_u32(value)
    }

    /// Read the character after a backslash
    fn read_escape(&mut self, quote: char) -> Option<char> {
        let c = self.advance()?;
        let escaped = match c {
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{0B}',
            '\\' => '\\',
            'x' => return self.read_hex_escape(2),
            'u' => return self.read_hex_escape(4),
            'U' => return self.read_hex_escape(8),
            '0'..='7' => {
                let mut value = c.to_digit(8)?;
                for _ in 0..2 {
                    value = value * 8 + self.advance()?.to_digit(8)?;
                }
                return char::from_u32(value);
            }
            c if c == quote => quote,
            other => other,
        };
        Some(escaped)
    }

    /// Read an interpreted string literal
    fn read_string(&mut self) -> Result<Token> {
        self.advance(); // opening quote
        let mut value = String::new();

        loop {
            match self.advance() {
                Some('"') => break,
                Some('\\') => {
                    if let Some(c) = self.read_escape('"') {
                        value.push(c);
                    }
                }
                Some('\n') | None => {
                    return Err(Error::UnterminatedLiteral { what: "string", span: self.make_span() });
                }
                Some(c) => value.push(c),
            }
        }

        Ok(self.make_token(TokenKind::StringLit(value)))
    }

    /// Read a raw string literal
    fn read_raw_string(&mut self) -> Result<Token> {
        self.advance(); // opening backquote
        let mut value = String::new();

        loop {
            match self.advance() {
                Some('`') => break,
                // carriage returns are discarded from raw strings
                Some('\r') => {}
                Some(c) => value.push(c),
                None => {
                    return Err(Error::UnterminatedLiteral { what: "raw string", span: self.make_span() });
                }
            }
        }

        Ok(self.make_token(TokenKind::StringLit(value)))
    }

    /// Read a rune literal
    fn read_char(&mut self) -> Result<Token> {
        self.advance(); // opening quote

        let c = match self.advance() {
            Some('\\') => self.read_escape('\''),
            Some('\n') | Some('\'') | None => None,
            other => other,
        };

        match c {
            Some(c) if self.eat('\'') => Ok(self.make_token(TokenKind::CharLit(c))),
            _ => Err(Error::UnterminatedLiteral { what: "rune", span: self.make_span() }),
        }
    }

    /// Pick `with_eq` when the next character is `=`
    fn with_eq(&mut self, plain: TokenKind, with_eq: TokenKind) -> TokenKind {
        if self.eat('=') {
            with_eq
        } else {
            plain
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token> {
        let newline = self.skip_whitespace();
        self.start = self.pos;

        if self.insert_semi && (newline || self.is_at_end()) {
            self.insert_semi = false;
            return Ok(self.make_token(TokenKind::Semicolon));
        }

        if self.is_at_end() {
            return Ok(Token::eof(self.make_span()));
        }

        let token = self.scan()?;
        self.insert_semi = token.kind.ends_statement();
        Ok(token)
    }

    fn scan(&mut self) -> Result<Token> {
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(Token::eof(self.make_span())),
        };

        // Identifiers and keywords
        if c.is_alphabetic() || c == '_' {
            return Ok(self.read_identifier());
        }

        // Numbers
        if c.is_ascii_digit() || (c == '.' && self.peek_next().map_or(false, |n| n.is_ascii_digit())) {
            return Ok(self.read_number());
        }

        match c {
            '"' => return self.read_string(),
            '`' => return self.read_raw_string(),
            '\'' => return self.read_char(),
            _ => {}
        }

        self.advance();

        // Operators and punctuation
        let kind = match c {
            '+' => {
                if self.eat('+') {
                    TokenKind::Inc
                } else {
                    self.with_eq(TokenKind::Plus, TokenKind::AssignOp)
                }
            }
            '-' => {
                if self.eat('-') {
                    TokenKind::Dec
                } else {
                    self.with_eq(TokenKind::Minus, TokenKind::AssignOp)
                }
            }
            '*' => self.with_eq(TokenKind::Star, TokenKind::AssignOp),
            '/' => self.with_eq(TokenKind::Slash, TokenKind::AssignOp),
            '%' => self.with_eq(TokenKind::Percent, TokenKind::AssignOp),
            '^' => self.with_eq(TokenKind::Caret, TokenKind::AssignOp),
            '&' => {
                if self.eat('&') {
                    TokenKind::AndAnd
                } else if self.eat('^') {
                    self.with_eq(TokenKind::AndNot, TokenKind::AssignOp)
                } else {
                    self.with_eq(TokenKind::And, TokenKind::AssignOp)
                }
            }
            '|' => {
                if self.eat('|') {
                    TokenKind::OrOr
                } else {
                    self.with_eq(TokenKind::Or, TokenKind::AssignOp)
                }
            }
            '<' => {
                if self.eat('-') {
                    TokenKind::Arrow
                } else if self.eat('<') {
                    self.with_eq(TokenKind::Shl, TokenKind::AssignOp)
                } else {
                    self.with_eq(TokenKind::Lt, TokenKind::Le)
                }
            }
            '>' => {
                if self.eat('>') {
                    self.with_eq(TokenKind::Shr, TokenKind::AssignOp)
                } else {
                    self.with_eq(TokenKind::Gt, TokenKind::Ge)
                }
            }
            '=' => self.with_eq(TokenKind::Eq, TokenKind::EqEq),
            '!' => self.with_eq(TokenKind::Not, TokenKind::Ne),
            ':' => self.with_eq(TokenKind::Colon, TokenKind::Define),
            '.' => {
                if self.peek() == Some('.') && self.peek_next() == Some('.') {
                    self.advance();
                    self.advance();
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Dot
                }
            }
            '~' => TokenKind::Tilde,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            _ => TokenKind::Unknown(c),
        };

        Ok(self.make_token(kind))
    }

    /// Tokenize the entire source and return all tokens
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source, 0)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = kinds("func main() { }");

        assert!(matches!(tokens[0], TokenKind::Func));
        assert!(matches!(tokens[1], TokenKind::Ident(ref s) if s == "main"));
        assert!(matches!(tokens[2], TokenKind::LParen));
        assert!(matches!(tokens[3], TokenKind::RParen));
        assert!(matches!(tokens[4], TokenKind::LBrace));
        assert!(matches!(tokens[5], TokenKind::RBrace));
        assert!(matches!(tokens[6], TokenKind::Semicolon));
        assert!(matches!(tokens[7], TokenKind::Eof));
    }

    #[test]
    fn test_numbers() {
        let tokens = kinds("42 3.14 0xFF_FF 1e3 2i .5");

        assert!(matches!(tokens[0], TokenKind::IntLit(ref s) if s == "42"));
        assert!(matches!(tokens[1], TokenKind::FloatLit(ref s) if s == "3.14"));
        assert!(matches!(tokens[2], TokenKind::IntLit(ref s) if s == "0xFF_FF"));
        assert!(matches!(tokens[3], TokenKind::FloatLit(ref s) if s == "1e3"));
        assert!(matches!(tokens[4], TokenKind::ImagLit(ref s) if s == "2i"));
        assert!(matches!(tokens[5], TokenKind::FloatLit(ref s) if s == ".5"));
    }

    #[test]
    fn test_strings_and_runes() {
        let tokens = kinds(r#""hello\nworld" `raw\n` 'a' '\x41' '\n'"#);

        assert!(matches!(tokens[0], TokenKind::StringLit(ref s) if s == "hello\nworld"));
        assert!(matches!(tokens[1], TokenKind::StringLit(ref s) if s == "raw\\n"));
        assert!(matches!(tokens[2], TokenKind::CharLit('a')));
        assert!(matches!(tokens[3], TokenKind::CharLit('A')));
        assert!(matches!(tokens[4], TokenKind::CharLit('\n')));
    }

    #[test]
    fn test_semicolon_insertion() {
        let tokens = kinds("const (\n\tA int = 1\n\tB\n)\n");

        assert_eq!(
            tokens,
            vec![
                TokenKind::Const,
                TokenKind::LParen,
                TokenKind::Ident("A".to_string()),
                TokenKind::Ident("int".to_string()),
                TokenKind::Eq,
                TokenKind::IntLit("1".to_string()),
                TokenKind::Semicolon,
                TokenKind::Ident("B".to_string()),
                TokenKind::Semicolon,
                TokenKind::RParen,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_no_semicolon_after_operator() {
        let tokens = kinds("x +\n y");
        assert!(!tokens[..3].contains(&TokenKind::Semicolon));
    }

    #[test]
    fn test_comment_newline_inserts_semicolon() {
        let tokens = kinds("a /* one\ntwo */ b // tail\nc");
        assert_eq!(tokens[1], TokenKind::Semicolon);
        assert_eq!(tokens[3], TokenKind::Semicolon);
    }

    #[test]
    fn test_operators() {
        let tokens = kinds("<- &^ := ... += &&");
        assert_eq!(
            &tokens[..6],
            &[
                TokenKind::Arrow,
                TokenKind::AndNot,
                TokenKind::Define,
                TokenKind::Ellipsis,
                TokenKind::AssignOp,
                TokenKind::AndAnd,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("\"abc\n", 0).tokenize().unwrap_err();
        assert!(matches!(err, Error::UnterminatedLiteral { what: "string", .. }));
    }
}
