use crate::diagnostics::{CompileError, CompileResult, Diagnostic};
use crate::source::SourceFile;
use crate::tokens::{Keyword, Symbol, Token, TokenKind};

#[derive(Debug, Clone)]
struct Cursor<'a> {
    source: &'a str,
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, offset: 0 }
    }

    #[inline]
    fn peek_char(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    #[inline]
    fn peek_is(&self, ch: char) -> bool {
        matches!(self.peek_char(), Some(c) if c == ch)
    }

    #[inline]
    fn peek_n(&self, n: usize) -> Option<char> {
        self.source[self.offset..].chars().nth(n)
    }

    #[inline]
    fn advance(&mut self) -> Option<(usize, char)> {
        let ch = self.peek_char()?;
        let current = self.offset;
        self.offset += ch.len_utf8();
        Some((current, ch))
    }

    #[inline]
    fn eat(&mut self, ch: char) -> bool {
        if self.peek_is(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    #[inline]
    fn slice_from(&self, start: usize) -> &'a str {
        &self.source[start..self.offset]
    }

    fn take_while<F>(&mut self, mut pred: F)
    where
        F: FnMut(char) -> bool,
    {
        while let Some(ch) = self.peek_char() {
            if pred(ch) {
                self.advance();
            } else {
                break;
            }
        }
    }
}

struct Lexer<'a> {
    file: &'a SourceFile,
    cursor: Cursor<'a>,
    tokens: Vec<Token>,
    /// Open `(` and `{` in nesting order.
    groups: Vec<char>,
}

/// Lex a formula source file into tokens. Line breaks become
/// [`TokenKind::Newline`] terminators when they follow a token that can end a
/// statement and the innermost open bracket is not a parenthesis.
pub fn lex(file: &SourceFile) -> CompileResult<Vec<Token>> {
    let mut lexer = Lexer {
        file,
        cursor: Cursor::new(&file.text),
        tokens: Vec::new(),
        groups: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

impl<'a> Lexer<'a> {
    fn run(&mut self) -> CompileResult<()> {
        while let Some((start, ch)) = self.cursor.advance() {
            let kind = match ch {
                '\n' => {
                    self.terminate_line(start);
                    continue;
                }
                c if c.is_whitespace() => continue,
                '/' if self.cursor.peek_is('/') => {
                    self.cursor.take_while(|c| c != '\n');
                    continue;
                }
                '/' if self.cursor.peek_is('*') => {
                    self.block_comment(start)?;
                    continue;
                }
                '0'..='9' => self.number(start)?,
                '.' if matches!(self.cursor.peek_char(), Some('0'..='9')) => self.number(start)?,
                'a'..='z' | 'A'..='Z' | '_' => {
                    self.cursor.take_while(|c| c.is_alphanumeric() || c == '_');
                    let ident = self.cursor.slice_from(start);
                    match Keyword::from_ident(ident) {
                        Some(Keyword::True) => TokenKind::BoolLiteral(true),
                        Some(Keyword::False) => TokenKind::BoolLiteral(false),
                        Some(keyword) => TokenKind::Keyword(keyword),
                        None => TokenKind::Identifier(ident.into()),
                    }
                }
                '"' => self.string(start)?,
                '`' => self.raw_string(start)?,
                '(' => {
                    self.groups.push('(');
                    TokenKind::Symbol(Symbol::LParen)
                }
                ')' => {
                    self.close_group('(');
                    TokenKind::Symbol(Symbol::RParen)
                }
                '{' => {
                    self.groups.push('{');
                    TokenKind::Symbol(Symbol::LBrace)
                }
                '}' => {
                    self.close_group('{');
                    TokenKind::Symbol(Symbol::RBrace)
                }
                ',' => TokenKind::Symbol(Symbol::Comma),
                '.' => TokenKind::Symbol(Symbol::Dot),
                ';' => TokenKind::Symbol(Symbol::Semicolon),
                ':' if self.cursor.eat('=') => TokenKind::Symbol(Symbol::Define),
                '=' if self.cursor.eat('=') => TokenKind::Symbol(Symbol::EqEq),
                '=' => TokenKind::Symbol(Symbol::Equals),
                '!' if self.cursor.eat('=') => TokenKind::Symbol(Symbol::NotEq),
                '!' => TokenKind::Symbol(Symbol::Bang),
                '<' if self.cursor.eat('=') => TokenKind::Symbol(Symbol::Le),
                '<' => TokenKind::Symbol(Symbol::Lt),
                '>' if self.cursor.eat('=') => TokenKind::Symbol(Symbol::Ge),
                '>' => TokenKind::Symbol(Symbol::Gt),
                '&' if self.cursor.eat('&') => TokenKind::Symbol(Symbol::AmpAmp),
                '|' if self.cursor.eat('|') => TokenKind::Symbol(Symbol::PipePipe),
                '+' if self.cursor.eat('+') => TokenKind::Symbol(Symbol::PlusPlus),
                '+' if self.cursor.eat('=') => TokenKind::Symbol(Symbol::PlusEquals),
                '+' => TokenKind::Symbol(Symbol::Plus),
                '-' if self.cursor.eat('-') => TokenKind::Symbol(Symbol::MinusMinus),
                '-' if self.cursor.eat('=') => TokenKind::Symbol(Symbol::MinusEquals),
                '-' => TokenKind::Symbol(Symbol::Minus),
                '*' if self.cursor.eat('=') => TokenKind::Symbol(Symbol::StarEquals),
                '*' => TokenKind::Symbol(Symbol::Star),
                '/' if self.cursor.eat('=') => TokenKind::Symbol(Symbol::SlashEquals),
                '/' => TokenKind::Symbol(Symbol::Slash),
                '%' if self.cursor.eat('=') => TokenKind::Symbol(Symbol::PercentEquals),
                '%' => TokenKind::Symbol(Symbol::Percent),
                other => {
                    return Err(self.error(start, format!("unexpected character `{other}`")));
                }
            };
            let span = self.file.span(start, self.cursor.offset);
            self.tokens.push(Token::new(kind, span));
        }

        let end = self.file.len();
        self.terminate_line(end);
        self.tokens
            .push(Token::new(TokenKind::Eof, self.file.span(end, end)));
        Ok(())
    }

    fn close_group(&mut self, open: char) {
        if self.groups.last() == Some(&open) {
            self.groups.pop();
        }
    }

    fn terminate_line(&mut self, at: usize) {
        if self.groups.last() == Some(&'(') {
            return;
        }
        let ends_statement = self
            .tokens
            .last()
            .map_or(false, |token| token.kind.terminates_line());
        if ends_statement {
            let span = self.file.span(at, (at + 1).min(self.file.len()));
            self.tokens.push(Token::new(TokenKind::Newline, span));
        }
    }

    fn block_comment(&mut self, start: usize) -> CompileResult<()> {
        self.cursor.advance();
        let mut saw_newline = false;
        loop {
            match self.cursor.advance() {
                Some((_, '*')) if self.cursor.eat('/') => break,
                Some((_, '\n')) => saw_newline = true,
                Some(_) => {}
                None => return Err(self.error(start, "comment not terminated")),
            }
        }
        // A multi-line comment acts like a newline.
        if saw_newline {
            self.terminate_line(start);
        }
        Ok(())
    }

    fn number(&mut self, start: usize) -> CompileResult<TokenKind> {
        let mut is_float = self.cursor.slice_from(start) == ".";
        self.cursor.take_while(|c| c.is_ascii_digit() || c == '_');
        if !is_float && self.cursor.peek_is('.') && !matches!(self.cursor.peek_n(1), Some('.')) {
            is_float = true;
            self.cursor.advance();
            self.cursor.take_while(|c| c.is_ascii_digit() || c == '_');
        }
        if matches!(self.cursor.peek_char(), Some('e' | 'E')) {
            let signed = matches!(self.cursor.peek_n(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if matches!(self.cursor.peek_n(digit_at), Some('0'..='9')) {
                is_float = true;
                self.cursor.advance();
                if signed {
                    self.cursor.advance();
                }
                self.cursor.take_while(|c| c.is_ascii_digit());
            }
        }
        let literal = self.cursor.slice_from(start);
        let sanitized = literal.replace('_', "");
        if is_float {
            sanitized
                .parse::<f64>()
                .map(TokenKind::FloatLiteral)
                .map_err(|_| self.error(start, format!("invalid float literal `{literal}`")))
        } else {
            sanitized
                .parse::<i64>()
                .map(TokenKind::IntLiteral)
                .map_err(|_| self.error(start, format!("integer literal `{literal}` overflows int")))
        }
    }

    fn string(&mut self, start: usize) -> CompileResult<TokenKind> {
        let mut value = String::new();
        loop {
            match self.cursor.advance() {
                Some((_, '"')) => return Ok(TokenKind::StringLiteral(value)),
                Some((_, '\n')) | None => {
                    return Err(self.error(start, "string literal not terminated"));
                }
                Some((at, '\\')) => {
                    let escaped = match self.cursor.advance() {
                        Some((_, 'n')) => '\n',
                        Some((_, 'r')) => '\r',
                        Some((_, 't')) => '\t',
                        Some((_, '\\')) => '\\',
                        Some((_, '"')) => '"',
                        Some((_, '\'')) => '\'',
                        Some((_, '0')) => '\0',
                        Some((_, other)) => {
                            return Err(self.error(at, format!("unknown escape sequence `\\{other}`")));
                        }
                        None => return Err(self.error(start, "string literal not terminated")),
                    };
                    value.push(escaped);
                }
                Some((_, ch)) => value.push(ch),
            }
        }
    }

    fn raw_string(&mut self, start: usize) -> CompileResult<TokenKind> {
        let body_start = self.cursor.offset;
        self.cursor.take_while(|c| c != '`');
        let body = self.cursor.slice_from(body_start).to_string();
        if !self.cursor.eat('`') {
            return Err(self.error(start, "raw string literal not terminated"));
        }
        Ok(TokenKind::StringLiteral(body))
    }

    fn error(&self, at: usize, message: impl Into<String>) -> CompileError {
        let end = (at + 1).min(self.file.len());
        Diagnostic::error(message)
            .with_code("E0001")
            .with_primary(self.file.span(at, end), None)
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::FileId;

    fn kinds(text: &str) -> Vec<TokenKind> {
        let file = SourceFile::new(FileId(0), "test", text);
        lex(&file)
            .expect("lexing should succeed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn newline_terminates_only_after_statement_end() {
        let tokens = kinds("x := a +\n  b\nreturn x\n");
        let newlines = tokens
            .iter()
            .filter(|k| matches!(k, TokenKind::Newline))
            .count();
        assert_eq!(newlines, 2);
    }

    #[test]
    fn newlines_inside_parens_are_ignored() {
        let tokens = kinds("f(\n1,\n2\n)");
        assert!(!tokens[..tokens.len() - 2]
            .iter()
            .any(|k| matches!(k, TokenKind::Newline)));
    }

    #[test]
    fn function_literal_body_inside_call_keeps_newlines() {
        let tokens = kinds("f(func() int {\nx := 1\nreturn x\n})");
        let newlines = tokens
            .iter()
            .filter(|k| matches!(k, TokenKind::Newline))
            .count();
        assert_eq!(newlines, 3);
    }

    #[test]
    fn numbers_and_operators() {
        let tokens = kinds("a := 1_000 + 2.5e1 - .5");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Symbol(Symbol::Define),
                TokenKind::IntLiteral(1000),
                TokenKind::Symbol(Symbol::Plus),
                TokenKind::FloatLiteral(25.0),
                TokenKind::Symbol(Symbol::Minus),
                TokenKind::FloatLiteral(0.5),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn strings_and_comments() {
        let tokens = kinds("s := \"a\\tb\" // trailing\n/* block */ r := `raw\\n`");
        assert!(tokens.contains(&TokenKind::StringLiteral("a\tb".into())));
        assert!(tokens.contains(&TokenKind::StringLiteral("raw\\n".into())));
    }

    #[test]
    fn unterminated_string_is_reported() {
        let file = SourceFile::new(FileId(0), "test", "x := \"oops\n");
        let err = lex(&file).expect_err("lexing should fail");
        assert_eq!(err.message(), "string literal not terminated");
    }

    #[test]
    fn integer_overflow_is_reported() {
        let file = SourceFile::new(FileId(0), "test", "99999999999999999999");
        assert!(lex(&file).is_err());
    }
}
