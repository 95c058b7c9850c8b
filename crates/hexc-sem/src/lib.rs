//! Type-checked single-pass lowering from the [`hexc_par`] AST to LLVM IR,
//! via a lexically scoped symbol table.

mod lower;
mod scope;
mod types;

pub use lower::Lowerer;
pub use scope::{Binding, IrValue, ScopeGuard, SymbolTable};
