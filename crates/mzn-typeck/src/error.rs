use mzn_ast::Span;
use smol_str::SmolStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeErrorKind {
    DuplicateIdentifier,
    UndefinedIdentifier,
    CircularDefinition,
    Type,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("[{}:{}] {}", .span.start, .span.end, .message)]
pub struct TypeError {
    pub kind: TypeErrorKind,
    pub message: String,
    pub span: Span,
    /// Offending identifier, for resolver errors.
    pub ident: Option<SmolStr>,
}

impl TypeError {
    pub(crate) fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: TypeErrorKind::Type,
            message: message.into(),
            span,
            ident: None,
        }
    }

    pub(crate) fn duplicate(name: &SmolStr, span: Span) -> Self {
        Self {
            kind: TypeErrorKind::DuplicateIdentifier,
            message: format!("identifier `{}' already defined", name),
            span,
            ident: Some(name.clone()),
        }
    }

    pub(crate) fn undefined(name: &SmolStr, span: Span) -> Self {
        Self {
            kind: TypeErrorKind::UndefinedIdentifier,
            message: format!("undefined identifier `{}'", name),
            span,
            ident: Some(name.clone()),
        }
    }

    pub(crate) fn circular(name: &SmolStr, span: Span) -> Self {
        Self {
            kind: TypeErrorKind::CircularDefinition,
            message: format!("circular definition of `{}'", name),
            span,
            ident: Some(name.clone()),
        }
    }

    /// Resolver errors, which abort checking of the whole model.
    pub fn is_structural(&self) -> bool {
        self.kind != TypeErrorKind::Type
    }
}
