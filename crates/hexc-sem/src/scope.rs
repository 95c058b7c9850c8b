//! Lexically scoped symbol table: a stack of frames mapping names to
//! `(IR value handle, Type)` bindings.

use hexc_par::ast::Type;
use hexc_util::Symbol;
use inkwell::values::{BasicValueEnum, FunctionValue};
use rustc_hash::FxHashMap;

/// An IR value handle. Ordinary values (`let`-bound locals, parameters,
/// expression results) are `Value`; function names bind to `Function`,
/// since LLVM represents a function with a distinct value kind from a
/// basic value. `Void` carries no LLVM value at all: it is what an empty
/// scope, a `void`-returning call, or a `void`-typed `if` arm lowers to,
/// since LLVM has no `void`-typed `BasicValueEnum`.
#[derive(Debug, Clone, Copy)]
pub enum IrValue<'ctx> {
    Value(BasicValueEnum<'ctx>),
    Function(FunctionValue<'ctx>),
    Void,
}

impl<'ctx> IrValue<'ctx> {
    /// The handle's value as a basic LLVM value. Panics on `Void`, which
    /// callers must check for (via the handle's `Type`) before calling
    /// this, and on `Function`, for which it returns the function's
    /// address rather than calling it.
    pub fn as_basic_value(&self) -> BasicValueEnum<'ctx> {
        match self {
            IrValue::Value(v) => *v,
            IrValue::Function(f) => f.as_global_value().as_pointer_value().into(),
            IrValue::Void => panic!("a Void handle carries no LLVM value"),
        }
    }
}

/// One symbol-table slot: a handle plus its semantic type.
#[derive(Debug, Clone)]
pub struct Binding<'ctx> {
    pub value: IrValue<'ctx>,
    pub ty: Type,
}

type Frame<'ctx> = FxHashMap<Symbol, Binding<'ctx>>;

/// A stack of frames. `frame[0]` is the global/builtin frame; lookup scans
/// top to bottom and insertion always targets the top frame, so an inner
/// frame's binding shadows an outer one of the same name.
pub struct SymbolTable<'ctx> {
    frames: Vec<Frame<'ctx>>,
}

impl<'ctx> SymbolTable<'ctx> {
    /// Creates a table with just the empty global frame. The lowerer seeds
    /// builtins like `printf` into it right after construction, once the
    /// module has a function value to bind the name to.
    pub fn new() -> Self {
        Self { frames: vec![Frame::default()] }
    }

    pub fn enter(&mut self) {
        self.frames.push(Frame::default());
    }

    pub fn exit(&mut self) {
        self.frames.pop();
        debug_assert!(!self.frames.is_empty(), "the global frame must never be popped");
    }

    pub fn lookup(&self, name: Symbol) -> Option<&Binding<'ctx>> {
        self.frames.iter().rev().find_map(|frame| frame.get(&name))
    }

    /// Binds `name` in the current (top) frame, shadowing any binding of
    /// the same name from an outer frame.
    pub fn define_here(&mut self, name: Symbol, binding: Binding<'ctx>) {
        self.frames.last_mut().expect("at least the global frame exists").insert(name, binding);
    }

    /// Removes any binding for `name` from the current (top) frame. Used
    /// when a `FnDef` whose body fails to lower erases its own (now
    /// dangling) function from the module, so a later top-level statement
    /// never calls through a stale handle.
    pub fn forget(&mut self, name: Symbol) {
        self.frames.last_mut().expect("at least the global frame exists").remove(&name);
    }

    /// Binds `name` directly in the global (bottom) frame. Used once, at
    /// construction, for `printf`.
    pub fn define_global(&mut self, name: Symbol, binding: Binding<'ctx>) {
        self.frames[0].insert(name, binding);
    }
}

impl<'ctx> Default for SymbolTable<'ctx> {
    fn default() -> Self {
        Self::new()
    }
}

/// Pairs `enter()`/`exit()`: constructing one enters a new frame, dropping
/// it exits. Guarantees the matching `exit()` on every path out of scope,
/// including an early return.
pub struct ScopeGuard<'a, 'ctx> {
    table: &'a mut SymbolTable<'ctx>,
}

impl<'a, 'ctx> ScopeGuard<'a, 'ctx> {
    pub fn new(table: &'a mut SymbolTable<'ctx>) -> Self {
        table.enter();
        Self { table }
    }

    pub fn table(&mut self) -> &mut SymbolTable<'ctx> {
        self.table
    }
}

impl Drop for ScopeGuard<'_, '_> {
    fn drop(&mut self) {
        self.table.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwell::context::Context;

    fn dummy_binding(context: &Context, ty: Type) -> Binding<'_> {
        let value = context.i32_type().const_int(0, false);
        Binding { value: IrValue::Value(value.into()), ty }
    }

    #[test]
    fn lookup_finds_innermost_binding() {
        let context = Context::create();
        let mut table = SymbolTable::new();
        let x = Symbol::intern("scope_test_x");
        table.define_global(x, dummy_binding(&context, Type::Int32));
        {
            let mut guard = ScopeGuard::new(&mut table);
            guard.table().define_here(x, dummy_binding(&context, Type::Double));
            assert_eq!(guard.table().lookup(x).unwrap().ty, Type::Double);
        }
        assert_eq!(table.lookup(x).unwrap().ty, Type::Int32);
    }

    #[test]
    fn exit_forgets_inner_bindings() {
        let context = Context::create();
        let mut table = SymbolTable::new();
        let y = Symbol::intern("scope_test_y");
        {
            let mut guard = ScopeGuard::new(&mut table);
            guard.table().define_here(y, dummy_binding(&context, Type::Bool));
        }
        assert!(table.lookup(y).is_none());
    }

    #[test]
    fn absent_name_resolves_to_nothing() {
        let table = SymbolTable::new();
        assert!(table.lookup(Symbol::intern("scope_test_never_bound")).is_none());
    }
}
