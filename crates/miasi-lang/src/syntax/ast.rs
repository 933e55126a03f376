use std::sync::Arc;

/// Source location attached to every node for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

// ─── Top level ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

// ─── Functions ───────────────────────────────────────────────────────────────

/// Shared by `function` and `on` definitions. Held behind an `Arc` so the
/// symbol table can keep a handle without cloning the body.
#[derive(Debug, Clone)]
pub struct FnDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub span: Span,
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `let x = 3;`
    VarDecl(VarDecl),
    /// `x = 1;`, `arr[0] = 1;`, `shape.radius = 4;`
    Assign(Assign),
    /// `set bg_color = #102030;`
    SetProperty {
        name: String,
        value: Expr,
        span: Span,
    },
    /// `function add(a, b) { ... }`
    FnDef(Arc<FnDef>),
    /// `on update(dt) { ... }`
    EventDef(Arc<FnDef>),
    If(IfStmt),
    While(WhileStmt),
    /// `for (x in xs) ...`
    For(ForStmt),
    Block(Vec<Stmt>, Span),
    /// `return expr;` or bare `return;`
    Return(Option<Expr>, Span),
    Break(Span),
    Continue(Span),
    /// A standalone expression used as a statement (e.g. a function call).
    Expr(Expr),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::VarDecl(v) => v.span,
            Stmt::Assign(a) => a.span,
            Stmt::SetProperty { span, .. } => *span,
            Stmt::FnDef(f) | Stmt::EventDef(f) => f.span,
            Stmt::If(i) => i.span,
            Stmt::While(w) => w.span,
            Stmt::For(f) => f.span,
            Stmt::Block(_, s) | Stmt::Return(_, s) | Stmt::Break(s) | Stmt::Continue(s) => *s,
            Stmt::Expr(e) => e.span(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub initializer: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Assign {
    pub target: AssignTarget,
    pub value: Expr,
    pub span: Span,
}

/// Where an assignment writes. The base expressions are evaluated exactly
/// once, before the right-hand side.
#[derive(Debug, Clone)]
pub enum AssignTarget {
    Ident(String, Span),
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    Property {
        base: Box<Expr>,
        name: String,
        span: Span,
    },
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForStmt {
    pub var_name: String,
    pub iterable: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

// ─── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Expr {
    Int(i64, Span),
    Float(f64, Span),
    Bool(bool, Span),
    StringLit(String, Span),
    /// Raw text after `#`; must be exactly six hex digits when evaluated.
    HexColor(String, Span),
    Ident(String, Span),

    /// `rgb(r, g, b)`
    Rgb {
        r: Box<Expr>,
        g: Box<Expr>,
        b: Box<Expr>,
        span: Span,
    },

    /// `(x, y)`
    Point {
        x: Box<Expr>,
        y: Box<Expr>,
        span: Span,
    },

    /// `a or b`, `a && b`
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
        span: Span,
    },

    /// `a < b`. Never chains.
    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
        span: Span,
    },

    /// `a + b - c` or `a * b / c`, folded left to right.
    Arith {
        first: Box<Expr>,
        rest: Vec<(ArithOp, Expr)>,
        span: Span,
    },

    /// `not x`, `!x`, `-x`
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },

    /// `expr[index]`
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },

    /// `callee(args)`
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },

    /// `expr.name`
    Property {
        base: Box<Expr>,
        name: String,
        span: Span,
    },

    /// `[1, 2, 3]`
    Array(Vec<Expr>, Span),

    /// `[x * 2 for x in xs if x > 1]`
    Comprehension {
        output: Box<Expr>,
        var_name: String,
        iterable: Box<Expr>,
        filter: Option<Box<Expr>>,
        span: Span,
    },

    /// `circle(radius: 5, color: #ff0000)`
    Shape {
        kind: ShapeKind,
        args: Vec<NamedArg>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Int(_, s)
            | Expr::Float(_, s)
            | Expr::Bool(_, s)
            | Expr::StringLit(_, s)
            | Expr::HexColor(_, s)
            | Expr::Ident(_, s)
            | Expr::Array(_, s) => *s,
            Expr::Rgb { span, .. }
            | Expr::Point { span, .. }
            | Expr::Logical { span, .. }
            | Expr::Compare { span, .. }
            | Expr::Arith { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Index { span, .. }
            | Expr::Call { span, .. }
            | Expr::Property { span, .. }
            | Expr::Comprehension { span, .. }
            | Expr::Shape { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NamedArg {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

// ─── Operators ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq, NotEq,
    Lt, LtEq, Gt, GtEq,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add, Sub, Mul, Div, Mod,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

// ─── Shapes ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Triangle,
    Line,
}

impl ShapeKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Rectangle => "rect",
            Self::Circle => "circle",
            Self::Triangle => "triangle",
            Self::Line => "line",
        }
    }
}
