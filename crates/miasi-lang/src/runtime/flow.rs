use crate::runtime::value::Value;
use crate::syntax::ast::Span;

/// How a statement finished. Blocks stop at the first non-`Next` signal and
/// hand it to their parent; loops consume `Break`/`Continue`, calls consume
/// `Return`.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Next,
    /// Carries the position of the `break` for error reporting if no loop
    /// catches it.
    Break(Span),
    Continue(Span),
    Return(Value),
}

impl Flow {
    pub fn is_next(&self) -> bool {
        matches!(self, Flow::Next)
    }
}
