use thiserror::Error;

use crate::syntax::ast::Span;

/// Syntax error codes prefixed by phase: L = lexer, P = parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    // Lexer
    L001, // unexpected character
    L002, // unterminated string literal
    L003, // invalid escape sequence
    L004, // malformed number literal

    // Parser
    P001, // unexpected token
    P002, // missing expected token
    P003, // invalid assignment target
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L001 => "L001",
            Self::L002 => "L002",
            Self::L003 => "L003",
            Self::L004 => "L004",
            Self::P001 => "P001",
            Self::P002 => "P002",
            Self::P003 => "P003",
        }
    }
}

/// A lexer or parser diagnostic. Any of these halts the pipeline before
/// interpretation begins.
#[derive(Debug, Clone, Error)]
#[error("[{}] {line}:{column} — {message}", .code.as_str())]
pub struct Error {
    pub code: ErrorCode,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self { code, line, column, message: message.into() }
    }
}

// ─── Runtime ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// Undefined variable, function, property, or a name already taken.
    #[error("name")]
    Name,
    /// Wrong operand, argument, index or target type.
    #[error("type")]
    Type,
    /// Division or modulo by zero, integer overflow, math domain errors.
    #[error("arithmetic")]
    Arithmetic,
    #[error("arity")]
    Arity { expected: usize, actual: usize },
    #[error("index")]
    Index { index: i64, len: usize },
    /// Invalid shape or color arguments.
    #[error("construction")]
    Construction,
    /// `break`/`continue` escaping to a function or program boundary.
    #[error("control")]
    Control,
    #[error("limit")]
    Limit,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("[{kind}] {line}:{column} — {message}")]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, span: &Span, message: impl Into<String>) -> Self {
        Self { kind, line: span.line, column: span.column, message: message.into() }
    }

    pub fn name(span: &Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Name, span, message)
    }

    pub fn type_error(span: &Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, span, message)
    }

    pub fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }
}

/// Failure raised by a native callable or property setter. Carries no position;
/// the evaluator attaches the call site and the callable's name.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct BuiltinError {
    pub kind: ErrorKind,
    pub message: String,
}

impl BuiltinError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    /// Attach a position without naming a callable; used for operator and
    /// property failures.
    pub fn located(self, span: &Span) -> RuntimeError {
        RuntimeError::new(self.kind, span, self.message)
    }

    /// Attach a call site and the name of the failing callable.
    pub fn at(self, span: &Span, callable: &str) -> RuntimeError {
        RuntimeError::new(self.kind, span, format!("`{callable}`: {}", self.message))
    }
}

// ─── Warnings ─────────────────────────────────────────────────────────────────

/// Non-fatal diagnostic. Never changes control flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[warn] {line}:{column} — {message}")]
pub struct Warning {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Warning {
    pub fn new(span: &Span, message: impl Into<String>) -> Self {
        Self { line: span.line, column: span.column, message: message.into() }
    }
}
