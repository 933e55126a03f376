use crate::error::{Error, ErrorCode};
use crate::syntax::token::{Token, TokenKind, keyword_or_ident};

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self { source: source.chars().collect(), pos: 0, line: 1, column: 1 }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<Error>> {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, self.line, self.column));
                break;
            }

            match self.next_token() {
                Ok(Some(tok)) => tokens.push(tok),
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() { Ok(tokens) } else { Err(errors) }
    }

    fn next_token(&mut self) -> Result<Option<Token>, Error> {
        let line = self.line;
        let col = self.column;
        let ch = self.advance();

        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '%' => TokenKind::Percent,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,

            '/' => {
                if self.peek() == '/' { self.skip_line(); return Ok(None); }
                else if self.peek() == '*' { self.skip_block_comment(); return Ok(None); }
                else { TokenKind::Slash }
            }
            '=' => {
                if self.peek() == '=' { self.advance(); TokenKind::EqEq }
                else { TokenKind::Eq }
            }
            '!' => {
                if self.peek() == '=' { self.advance(); TokenKind::BangEq }
                else { TokenKind::Bang }
            }
            '<' => {
                if self.peek() == '=' { self.advance(); TokenKind::LtEq }
                else { TokenKind::Lt }
            }
            '>' => {
                if self.peek() == '=' { self.advance(); TokenKind::GtEq }
                else { TokenKind::Gt }
            }
            '&' => {
                if self.peek() == '&' { self.advance(); TokenKind::AmpAmp }
                else {
                    return Err(Error::new(ErrorCode::L001, line, col,
                        "expected `&&`, bare `&` is not valid"));
                }
            }
            '|' => {
                if self.peek() == '|' { self.advance(); TokenKind::PipePipe }
                else {
                    return Err(Error::new(ErrorCode::L001, line, col,
                        "expected `||`, bare `|` is not valid"));
                }
            }

            '#' => TokenKind::HexColor(self.read_hex_color()),
            '"' => TokenKind::StringLit(self.read_string(line, col)?),
            '0'..='9' => self.read_number(ch, line, col)?,
            c if c.is_ascii_alphabetic() || c == '_' => keyword_or_ident(self.read_ident(ch)),

            other => {
                return Err(Error::new(ErrorCode::L001, line, col,
                    format!("unexpected character `{other}`")));
            }
        };

        Ok(Some(Token::new(kind, line, col)))
    }

    // ─── Primitives ──────────────────────────────────────────────────────────

    fn advance(&mut self) -> char {
        let ch = self.source[self.pos];
        self.pos += 1;
        if ch == '\n' { self.line += 1; self.column = 1; }
        else { self.column += 1; }
        ch
    }

    fn peek(&self) -> char {
        self.source.get(self.pos).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.source.get(self.pos + 1).copied().unwrap_or('\0')
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.advance();
        }
    }

    fn skip_line(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' { self.advance(); }
    }

    fn skip_block_comment(&mut self) {
        self.advance(); // consume *
        while !self.is_at_end() {
            if self.peek() == '*' && self.peek_next() == '/' {
                self.advance(); // *
                self.advance(); // /
                break;
            }
            self.advance();
        }
    }

    // ─── Readers ─────────────────────────────────────────────────────────────

    /// Everything alphanumeric after `#`. Whether it is exactly six hex digits
    /// is checked when the literal is evaluated.
    fn read_hex_color(&mut self) -> String {
        let mut s = String::new();
        while !self.is_at_end() && self.peek().is_ascii_alphanumeric() {
            s.push(self.advance());
        }
        s
    }

    fn read_string(&mut self, start_line: usize, start_col: usize) -> Result<String, Error> {
        let mut s = String::new();
        let mut error: Option<Error> = None;
        loop {
            if self.is_at_end() || self.peek() == '\n' {
                return Err(Error::new(ErrorCode::L002, start_line, start_col,
                    "unterminated string literal"));
            }
            let ch = self.advance();
            if ch == '"' { break; }
            if ch == '\\' {
                let esc_line = self.line;
                let esc_col  = self.column;
                if self.is_at_end() { continue; }
                match self.advance() {
                    'n'  => s.push('\n'),
                    't'  => s.push('\t'),
                    'r'  => s.push('\r'),
                    '0'  => s.push('\0'),
                    '"'  => s.push('"'),
                    '\'' => s.push('\''),
                    '\\' => s.push('\\'),
                    other => {
                        // Keep consuming so the rest of the string does not
                        // produce cascading errors.
                        if error.is_none() {
                            error = Some(Error::new(ErrorCode::L003, esc_line, esc_col,
                                format!("unknown escape sequence `\\{other}`")));
                        }
                    }
                }
            } else {
                s.push(ch);
            }
        }
        if let Some(e) = error { return Err(e); }
        Ok(s)
    }

    /// Integer unless a `.` followed by a digit appears; `shape.x` style
    /// access after a number is left to the parser.
    fn read_number(&mut self, first: char, line: usize, col: usize) -> Result<TokenKind, Error> {
        let mut s = String::new();
        s.push(first);
        while !self.is_at_end() && self.peek().is_ascii_digit() {
            s.push(self.advance());
        }
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            s.push(self.advance());
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                s.push(self.advance());
            }
            return s.parse().map(TokenKind::Float).map_err(|_| {
                Error::new(ErrorCode::L004, line, col, format!("malformed number `{s}`"))
            });
        }
        s.parse().map(TokenKind::Int).map_err(|_| {
            Error::new(ErrorCode::L004, line, col, format!("integer literal `{s}` is too large"))
        })
    }

    fn read_ident(&mut self, first: char) -> String {
        let mut s = String::new();
        s.push(first);
        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == '_') {
            s.push(self.advance());
        }
        s
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn lex_err(src: &str) -> Vec<Error> {
        Lexer::new(src).tokenize().unwrap_err()
    }

    #[test]
    fn empty() {
        assert_eq!(lex(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn integer_stays_integer() {
        assert_eq!(lex("42"), vec![TokenKind::Int(42), TokenKind::Eof]);
    }

    #[test]
    fn float_literal() {
        assert_eq!(lex("3.25"), vec![TokenKind::Float(3.25), TokenKind::Eof]);
    }

    #[test]
    fn dot_not_consumed_by_number() {
        assert_eq!(
            lex("s.x"),
            vec![TokenKind::Ident("s".into()), TokenKind::Dot, TokenKind::Ident("x".into()), TokenKind::Eof]
        );
        assert_eq!(
            lex("1.x"),
            vec![TokenKind::Int(1), TokenKind::Dot, TokenKind::Ident("x".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn keywords() {
        assert_eq!(lex("let"),      vec![TokenKind::Let,      TokenKind::Eof]);
        assert_eq!(lex("set"),      vec![TokenKind::Set,      TokenKind::Eof]);
        assert_eq!(lex("function"), vec![TokenKind::Function, TokenKind::Eof]);
        assert_eq!(lex("on"),       vec![TokenKind::On,       TokenKind::Eof]);
        assert_eq!(lex("break"),    vec![TokenKind::Break,    TokenKind::Eof]);
        assert_eq!(lex("continue"), vec![TokenKind::Continue, TokenKind::Eof]);
        assert_eq!(lex("circle"),   vec![TokenKind::Circle,   TokenKind::Eof]);
    }

    #[test]
    fn bool_literals() {
        assert_eq!(lex("true"),  vec![TokenKind::Bool(true),  TokenKind::Eof]);
        assert_eq!(lex("false"), vec![TokenKind::Bool(false), TokenKind::Eof]);
    }

    #[test]
    fn logical_operators_both_spellings() {
        assert_eq!(lex("&& ||"), vec![TokenKind::AmpAmp, TokenKind::PipePipe, TokenKind::Eof]);
        assert_eq!(lex("and or"), vec![TokenKind::And, TokenKind::Or, TokenKind::Eof]);
        assert_eq!(lex("! not"), vec![TokenKind::Bang, TokenKind::Not, TokenKind::Eof]);
    }

    #[test]
    fn two_char_operators() {
        assert_eq!(lex("=="), vec![TokenKind::EqEq,   TokenKind::Eof]);
        assert_eq!(lex("!="), vec![TokenKind::BangEq, TokenKind::Eof]);
        assert_eq!(lex("<="), vec![TokenKind::LtEq,   TokenKind::Eof]);
        assert_eq!(lex(">="), vec![TokenKind::GtEq,   TokenKind::Eof]);
    }

    #[test]
    fn line_comment_skipped() {
        assert_eq!(lex("// comment\n42"), vec![TokenKind::Int(42), TokenKind::Eof]);
    }

    #[test]
    fn block_comment_skipped() {
        assert_eq!(lex("/* a\nb */42"), vec![TokenKind::Int(42), TokenKind::Eof]);
    }

    #[test]
    fn hex_color_keeps_raw_run() {
        assert_eq!(lex("#ff0000"), vec![TokenKind::HexColor("ff0000".into()), TokenKind::Eof]);
        assert_eq!(lex("#fff"), vec![TokenKind::HexColor("fff".into()), TokenKind::Eof]);
    }

    #[test]
    fn string_escapes_decoded() {
        assert_eq!(lex(r#""a\nb\t\"c\"""#), vec![TokenKind::StringLit("a\nb\t\"c\"".into()), TokenKind::Eof]);
    }

    #[test]
    fn string_keeps_unicode() {
        assert_eq!(lex("\"zażółć\""), vec![TokenKind::StringLit("zażółć".into()), TokenKind::Eof]);
    }

    #[test]
    fn unterminated_string_error() {
        let errs = lex_err(r#""oops"#);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::L002);
    }

    #[test]
    fn invalid_escape_error() {
        let errs = lex_err(r#""\q""#);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::L003);
    }

    #[test]
    fn oversized_integer_error() {
        let errs = lex_err("99999999999999999999999");
        assert_eq!(errs[0].code, ErrorCode::L004);
    }

    #[test]
    fn bare_ampersand_error() {
        let errs = lex_err("a & b");
        assert_eq!(errs[0].code, ErrorCode::L001);
    }

    #[test]
    fn line_and_column_tracking() {
        let tokens = Lexer::new("a\n  b").tokenize().unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 3));
    }

    #[test]
    fn variable_declaration() {
        assert_eq!(
            lex("let x = 3;"),
            vec![TokenKind::Let, TokenKind::Ident("x".into()), TokenKind::Eq, TokenKind::Int(3), TokenKind::Semicolon, TokenKind::Eof]
        );
    }

    #[test]
    fn token_kind_helpers() {
        assert!(TokenKind::EqEq.is_comparison());
        assert!(TokenKind::Int(1).is_literal());
        assert!(TokenKind::Triangle.is_shape_kind());
        assert!(TokenKind::Function.is_keyword());
        assert!(!TokenKind::Ident("x".into()).is_keyword());
    }
}
