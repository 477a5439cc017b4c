use mzn_ast::DeclId;

use crate::error::TypeError;

/// Outcome of checking a model. Structural errors are returned as `Err` by
/// [`crate::typecheck`] instead; everything here was collected per item.
#[derive(Debug, Default)]
pub struct TypeCheckResult {
    pub errors: Vec<TypeError>,
    /// Declarations in dependency order: every declaration comes after the
    /// declarations its type-inst and initializer refer to.
    pub decl_order: Vec<DeclId>,
}

impl TypeCheckResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}
