use mzn_ast::Span;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalErrorKind {
    UndeclaredIdentifier,
    /// The value of a declaration is not known.
    CannotEvaluate,
    /// Expression of the wrong kind reached an evaluator; the type checker
    /// should have ruled this out.
    NotAnExpressionOfKind,
    DivisionByZero,
    Overflow,
    OutOfBounds,
    OutOfDomain,
    StackOverflow,
    MissingBuiltin,
}

/// One step of the evaluation chain an error unwound through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub span: Span,
    pub what: String,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}] {}", self.span.start, self.span.end, self.what)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("[{}:{}] {}", .span.start, .span.end, .message)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub message: String,
    pub span: Span,
    /// Innermost first.
    pub trace: Vec<Frame>,
}

impl EvalError {
    pub(crate) fn new(kind: EvalErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            trace: Vec::new(),
        }
    }

    pub(crate) fn not_kind(what: &str, span: Span) -> Self {
        Self::new(
            EvalErrorKind::NotAnExpressionOfKind,
            format!("not {} expression", what),
            span,
        )
    }

    pub(crate) fn division_by_zero(span: Span) -> Self {
        Self::new(EvalErrorKind::DivisionByZero, "division by zero", span)
    }

    pub(crate) fn overflow(span: Span) -> Self {
        Self::new(EvalErrorKind::Overflow, "integer overflow", span)
    }

    /// Record that the error unwound through `what` at `span`.
    pub(crate) fn within(mut self, span: Span, what: impl Into<String>) -> Self {
        self.trace.push(Frame {
            span,
            what: what.into(),
        });
        self
    }

    /// The error followed by its evaluation chain, one frame per line.
    pub fn report(&self) -> String {
        let mut out = self.to_string();
        for frame in &self.trace {
            out.push_str("\n  in ");
            out.push_str(&frame.to_string());
        }
        out
    }
}
