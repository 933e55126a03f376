#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    Bool(bool),
    Ident(String),
    StringLit(String),
    HexColor(String), // raw run after `#`, validated at evaluation time

    // Keywords
    Let,
    Set,
    Function,
    On,
    If,
    Else,
    While,
    For,
    In,
    Return,
    Break,
    Continue,
    And,
    Or,
    Not,
    Rgb,

    // Shape constructors
    Rect,
    Circle,
    Triangle,
    Line,

    // Operators
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    Eq,         // =
    EqEq,       // ==
    BangEq,     // !=
    Lt,         // <
    LtEq,       // <=
    Gt,         // >
    GtEq,       // >=
    Bang,       // !
    AmpAmp,     // &&
    PipePipe,   // ||

    // Punctuation
    Colon,      // :
    Comma,      // ,
    Semicolon,  // ;
    Dot,        // .
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    LBracket,   // [
    RBracket,   // ]

    Eof,
}

impl TokenKind {
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::Int(_) | Self::Float(_) | Self::Bool(_) | Self::StringLit(_) | Self::HexColor(_)
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(self, Self::EqEq | Self::BangEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq)
    }

    pub fn is_shape_kind(&self) -> bool {
        matches!(self, Self::Rect | Self::Circle | Self::Triangle | Self::Line)
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Self::Let | Self::Set | Self::Function | Self::On | Self::If | Self::Else
            | Self::While | Self::For | Self::In | Self::Return | Self::Break | Self::Continue
            | Self::And | Self::Or | Self::Not | Self::Rgb
            | Self::Rect | Self::Circle | Self::Triangle | Self::Line
        )
    }

    /// Human-readable form used in parser diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::Int(n) => format!("integer `{n}`"),
            Self::Float(x) => format!("number `{x}`"),
            Self::Bool(b) => format!("`{b}`"),
            Self::Ident(s) => format!("identifier `{s}`"),
            Self::StringLit(_) => "string literal".into(),
            Self::HexColor(s) => format!("color `#{s}`"),
            Self::Eof => "end of input".into(),
            other => format!("`{}`", other.lexeme()),
        }
    }

    fn lexeme(&self) -> &'static str {
        match self {
            Self::Let => "let",
            Self::Set => "set",
            Self::Function => "function",
            Self::On => "on",
            Self::If => "if",
            Self::Else => "else",
            Self::While => "while",
            Self::For => "for",
            Self::In => "in",
            Self::Return => "return",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Rgb => "rgb",
            Self::Rect => "rect",
            Self::Circle => "circle",
            Self::Triangle => "triangle",
            Self::Line => "line",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Eq => "=",
            Self::EqEq => "==",
            Self::BangEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Bang => "!",
            Self::AmpAmp => "&&",
            Self::PipePipe => "||",
            Self::Colon => ":",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Dot => ".",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Int(_) | Self::Float(_) | Self::Bool(_) | Self::Ident(_)
            | Self::StringLit(_) | Self::HexColor(_) | Self::Eof => "",
        }
    }
}

/// Maps an identifier string to its keyword token, or returns `Ident`.
pub fn keyword_or_ident(s: String) -> TokenKind {
    match s.as_str() {
        "let"      => TokenKind::Let,
        "set"      => TokenKind::Set,
        "function" => TokenKind::Function,
        "on"       => TokenKind::On,
        "if"       => TokenKind::If,
        "else"     => TokenKind::Else,
        "while"    => TokenKind::While,
        "for"      => TokenKind::For,
        "in"       => TokenKind::In,
        "return"   => TokenKind::Return,
        "break"    => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "and"      => TokenKind::And,
        "or"       => TokenKind::Or,
        "not"      => TokenKind::Not,
        "rgb"      => TokenKind::Rgb,
        "rect"     => TokenKind::Rect,
        "circle"   => TokenKind::Circle,
        "triangle" => TokenKind::Triangle,
        "line"     => TokenKind::Line,
        "true"     => TokenKind::Bool(true),
        "false"    => TokenKind::Bool(false),
        _          => TokenKind::Ident(s),
    }
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}
