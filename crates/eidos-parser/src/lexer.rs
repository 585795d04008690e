use eidos_core::{EidosError, EidosResult, Span, Token, TokenKind};
use std::sync::Arc;

const SITE_LEX: &str = "Lexer::tokenize";

/// Character-stream lexer. Every token records both the byte range and the
/// UTF-16 code-unit range of its source span; both are computed here during
/// the scan and never derived on demand.
pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    byte_pos: usize,
    utf16_pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            byte_pos: 0,
            utf16_pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(&mut self) -> EidosResult<Vec<Token>> {
        let mut tokens = Vec::with_capacity(self.source.len() / 4 + 1);

        loop {
            self.skip_whitespace_and_comments();

            if self.is_at_end() {
                let span = Span::new(
                    self.byte_pos,
                    self.byte_pos,
                    self.utf16_pos,
                    self.utf16_pos,
                    self.line,
                    self.column,
                );
                tokens.push(Token::new(TokenKind::Eof, span));
                break;
            }

            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.current()?;
        self.pos += 1;
        self.byte_pos += c.len_utf8();
        self.utf16_pos += c.len_utf16();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.current() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek() == Some('/') => {
                    while let Some(c) = self.current() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn span_from(&self, start: &(usize, usize, usize, usize)) -> Span {
        Span::new(start.0, self.byte_pos, start.1, self.utf16_pos, start.2, start.3)
    }

    fn mark(&self) -> (usize, usize, usize, usize) {
        (self.byte_pos, self.utf16_pos, self.line, self.column)
    }

    fn next_token(&mut self) -> EidosResult<Token> {
        let start = self.mark();

        let c = match self.current() {
            Some(c) => c,
            None => {
                return Ok(Token::new(TokenKind::Eof, self.span_from(&start)));
            }
        };

        let kind = match c {
            '(' => {
                self.advance();
                TokenKind::LParen
            }
            ')' => {
                self.advance();
                TokenKind::RParen
            }
            '{' => {
                self.advance();
                TokenKind::LBrace
            }
            '}' => {
                self.advance();
                TokenKind::RBrace
            }
            '[' => {
                self.advance();
                TokenKind::LBracket
            }
            ']' => {
                self.advance();
                TokenKind::RBracket
            }
            ',' => {
                self.advance();
                TokenKind::Comma
            }
            ';' => {
                self.advance();
                TokenKind::Semicolon
            }
            ':' => {
                self.advance();
                TokenKind::Colon
            }
            '.' => {
                self.advance();
                TokenKind::Dot
            }
            '?' => {
                self.advance();
                TokenKind::Question
            }
            '+' => {
                self.advance();
                TokenKind::Plus
            }
            '-' => {
                self.advance();
                TokenKind::Minus
            }
            '*' => {
                self.advance();
                TokenKind::Star
            }
            '/' => {
                self.advance();
                TokenKind::Slash
            }
            '%' => {
                self.advance();
                TokenKind::Percent
            }
            '^' => {
                self.advance();
                TokenKind::Caret
            }
            '&' => {
                self.advance();
                TokenKind::Amp
            }
            '|' => {
                self.advance();
                TokenKind::Pipe
            }
            '=' => {
                self.advance();
                if self.current() == Some('=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                self.advance();
                if self.current() == Some('=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                self.advance();
                if self.current() == Some('=') {
                    self.advance();
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                self.advance();
                if self.current() == Some('=') {
                    self.advance();
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '"' => return self.lex_string(start),
            c if c.is_ascii_digit() => return self.lex_number(start),
            c if c.is_alphabetic() || c == '_' => return Ok(self.lex_identifier(start)),
            c => {
                self.advance();
                return Err(EidosError::lex(
                    SITE_LEX,
                    format!("unrecognized character '{}'.", c),
                    self.span_from(&start),
                ));
            }
        };

        Ok(Token::new(kind, self.span_from(&start)))
    }

    fn lex_identifier(&mut self, start: (usize, usize, usize, usize)) -> Token {
        let mut ident = String::new();
        while let Some(c) = self.current() {
            if c.is_alphanumeric() || c == '_' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let kind = match TokenKind::keyword(&ident) {
            Some(keyword) => keyword,
            None => TokenKind::Identifier(Arc::new(ident)),
        };
        Token::new(kind, self.span_from(&start))
    }

    fn lex_number(&mut self, start: (usize, usize, usize, usize)) -> EidosResult<Token> {
        let mut text = String::new();
        let mut is_float = false;

        while let Some(c) = self.current() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if self.current() == Some('.') && self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            is_float = true;
            text.push('.');
            self.advance();
            while let Some(c) = self.current() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        if matches!(self.current(), Some('e') | Some('E')) {
            let mut lookahead = self.pos + 1;
            if matches!(self.source.get(lookahead), Some('+') | Some('-')) {
                lookahead += 1;
            }
            if self
                .source
                .get(lookahead)
                .map(|c| c.is_ascii_digit())
                .unwrap_or(false)
            {
                is_float = true;
                text.push(self.advance().unwrap_or('e'));
                if matches!(self.current(), Some('+') | Some('-')) {
                    text.push(self.advance().unwrap_or('+'));
                }
                while let Some(c) = self.current() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        let span = self.span_from(&start);
        if is_float {
            match text.parse::<f64>() {
                Ok(x) => Ok(Token::new(TokenKind::Float(x), span)),
                Err(_) => Err(EidosError::lex(
                    SITE_LEX,
                    format!("malformed float literal \"{}\".", text),
                    span,
                )),
            }
        } else {
            match text.parse::<i64>() {
                Ok(n) => Ok(Token::new(TokenKind::Integer(n), span)),
                Err(_) => Err(EidosError::lex(
                    SITE_LEX,
                    format!("integer literal \"{}\" is out of range.", text),
                    span,
                )),
            }
        }
    }

    fn lex_string(&mut self, start: (usize, usize, usize, usize)) -> EidosResult<Token> {
        self.advance(); // opening quote

        let mut value = String::new();
        loop {
            match self.current() {
                None | Some('\n') => {
                    return Err(EidosError::lex(
                        SITE_LEX,
                        "unterminated string literal.",
                        self.span_from(&start),
                    ));
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.current() {
                        Some('"') => value.push('"'),
                        Some('\\') => value.push('\\'),
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some(c) => {
                            self.advance();
                            return Err(EidosError::lex(
                                SITE_LEX,
                                format!("illegal escape sequence \"\\{}\" in string literal.", c),
                                self.span_from(&start),
                            ));
                        }
                        None => {
                            return Err(EidosError::lex(
                                SITE_LEX,
                                "unterminated string literal.",
                                self.span_from(&start),
                            ));
                        }
                    }
                    self.advance();
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        Ok(Token::new(
            TokenKind::String(Arc::new(value)),
            self.span_from(&start),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_operators_and_keywords() {
        assert_eq!(
            kinds("if (x <= 3) x = x + 1; else next;"),
            vec![
                TokenKind::If,
                TokenKind::LParen,
                TokenKind::Identifier(Arc::new("x".to_string())),
                TokenKind::LtEq,
                TokenKind::Integer(3),
                TokenKind::RParen,
                TokenKind::Identifier(Arc::new("x".to_string())),
                TokenKind::Assign,
                TokenKind::Identifier(Arc::new("x".to_string())),
                TokenKind::Plus,
                TokenKind::Integer(1),
                TokenKind::Semicolon,
                TokenKind::Else,
                TokenKind::Next,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(
            kinds("3 3.5 1e3 2.5e-2"),
            vec![
                TokenKind::Integer(3),
                TokenKind::Float(3.5),
                TokenKind::Float(1000.0),
                TokenKind::Float(0.025),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_member_vs_float() {
        // `x.size` must lex as identifier, dot, identifier.
        assert_eq!(
            kinds("x.size"),
            vec![
                TokenKind::Identifier(Arc::new("x".to_string())),
                TokenKind::Dot,
                TokenKind::Identifier(Arc::new("size".to_string())),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\"b\n""#),
            vec![
                TokenKind::String(Arc::new("a\"b\n".to_string())),
                TokenKind::Eof,
            ]
        );
        assert!(Lexer::new("\"unterminated").tokenize().is_err());
        assert!(Lexer::new(r#""bad \q escape""#).tokenize().is_err());
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("1; // trailing comment\n2;"),
            vec![
                TokenKind::Integer(1),
                TokenKind::Semicolon,
                TokenKind::Integer(2),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_dual_encoding_offsets() {
        // "π" is 2 bytes in UTF-8 but 1 code unit in UTF-16; the string
        // literal containing it shifts byte and UTF-16 offsets differently.
        let tokens = Lexer::new("\"π\" + 1").tokenize().unwrap();
        let plus = &tokens[1];
        assert_eq!(plus.kind, TokenKind::Plus);
        assert_eq!(plus.span.start, 5); // quote + 2-byte π + quote + space
        assert_eq!(plus.span.utf16_start, 4);

        let one = &tokens[2];
        assert_eq!(one.span.start, 7);
        assert_eq!(one.span.utf16_start, 6);
    }

    #[test]
    fn test_unrecognized_character() {
        assert!(Lexer::new("x @ y").tokenize().is_err());
    }
}
