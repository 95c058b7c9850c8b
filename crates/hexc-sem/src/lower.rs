//! AST to IR. A single traversal producing `(ir_value, type)` handles
//! (see [`crate::scope::Binding`]); a handle that fails to lower
//! short-circuits up to the enclosing function body, which is then
//! erased from the module.

use hexc_par::ast::{BinOp, Expr, ExprKind, Scope, Statement, StatementKind, Type};
use hexc_util::{Diagnostic, Handler, Span, Symbol};
use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::values::FunctionValue;
use inkwell::AddressSpace;

use crate::scope::{Binding, IrValue, SymbolTable};
use crate::types::{self, is_arithmetic};

/// Owns the IR builder, module and symbol table for one compile. Performs
/// the single AST traversal that produces typed IR, sharing the driver's
/// [`Handler`] with the lexer and parser so diagnostics from every phase
/// interleave in source order.
pub struct Lowerer<'ctx, 'a> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    symbols: SymbolTable<'ctx>,
    handler: &'a Handler,
    /// The function currently being lowered, so `If` can append basic
    /// blocks to it. `None` outside of a `FnDef` body.
    current_function: Option<FunctionValue<'ctx>>,
}

impl<'ctx, 'a> Lowerer<'ctx, 'a> {
    /// Creates a fresh module named `module_name` and seeds the symbol
    /// table's global frame with the builtin variadic `printf`.
    pub fn new(context: &'ctx Context, module_name: &str, handler: &'a Handler) -> Self {
        let module = context.create_module(module_name);
        let builder = context.create_builder();
        let mut symbols = SymbolTable::new();

        let printf_ty = context.i32_type().fn_type(
            &[context.ptr_type(AddressSpace::default()).into()],
            true,
        );
        let printf = module.add_function("printf", printf_ty, Some(Linkage::External));
        symbols.define_global(
            Symbol::intern("printf"),
            Binding {
                value: IrValue::Function(printf),
                ty: Type::Function {
                    params: vec![Type::StrLit],
                    ret: Box::new(Type::Int32),
                    variadic: true,
                },
            },
        );

        Self { context, module, builder, symbols, handler, current_function: None }
    }

    pub fn module(&self) -> &Module<'ctx> {
        &self.module
    }

    fn error(&self, message: impl Into<String>, span: Span) {
        Diagnostic::error(message).span(span).emit(self.handler);
    }

    /// Lowers one top-level statement. The only top-level construct is
    /// `fn`, so the parser only ever hands this a `FnDecl` or a `FnDef`.
    pub fn lower_top_level(&mut self, stmt: &Statement) {
        match &stmt.kind {
            StatementKind::FnDecl { name, params, ret } => {
                self.lower_fn_decl(*name, params, ret, stmt.span);
            }
            StatementKind::FnDef { decl, body } => {
                self.lower_fn_def(decl, body, stmt.span);
            }
            _ => unreachable!("the parser only produces FnDecl/FnDef at top level"),
        }
    }

    // -- Declarations and definitions ------------------------------------

    fn fn_type_of(
        &self,
        params: &[hexc_par::ast::Param],
        ret: &Type,
        span: Span,
    ) -> Option<(inkwell::types::FunctionType<'ctx>, Vec<Type>)> {
        let mut param_types = Vec::with_capacity(params.len());
        let mut llvm_params = Vec::with_capacity(params.len());
        for param in params {
            match types::basic_type(self.context, &param.ty) {
                Some(llvm_ty) => {
                    llvm_params.push(llvm_ty.into());
                    param_types.push(param.ty.clone());
                }
                None => {
                    self.error(format!("'{}' is not a valid parameter type", param.ty), span);
                    return None;
                }
            }
        }
        let fn_ty = match ret {
            Type::Void => self.context.void_type().fn_type(&llvm_params, false),
            other => match types::basic_type(self.context, other) {
                Some(llvm_ret) => llvm_ret.fn_type(&llvm_params, false),
                None => {
                    self.error(format!("'{other}' is not a valid return type"), span);
                    return None;
                }
            },
        };
        Some((fn_ty, param_types))
    }

    /// Declares `name` as an external function. A name may be declared at
    /// most once at the current scope; this is checked against the
    /// current (and only, at top level) symbol frame.
    fn lower_fn_decl(
        &mut self,
        name: Symbol,
        params: &[hexc_par::ast::Param],
        ret: &Type,
        span: Span,
    ) -> Option<FunctionValue<'ctx>> {
        if self.symbols.lookup(name).is_some() {
            self.error(format!("function '{name}' is already declared"), span);
            return None;
        }
        let (fn_ty, param_types) = self.fn_type_of(params, ret, span)?;
        let function = self.module.add_function(name.as_str(), fn_ty, Some(Linkage::External));
        for (i, param) in params.iter().enumerate() {
            if let Some(arg) = function.get_nth_param(i as u32) {
                arg.set_name(param.name.as_str());
            }
        }
        self.symbols.define_here(
            name,
            Binding {
                value: IrValue::Function(function),
                ty: Type::Function { params: param_types, ret: Box::new(ret.clone()), variadic: false },
            },
        );
        Some(function)
    }

    /// Defines `name`'s body. A function name may be defined at most once
    /// globally: if a `Function`-typed binding already exists, this
    /// redefines it, which is an error; if no binding exists at all, the
    /// inner `FnDecl` is lowered first.
    fn lower_fn_def(&mut self, decl: &Statement, body: &Scope, span: Span) {
        let (name, params, ret) = match &decl.kind {
            StatementKind::FnDecl { name, params, ret } => (*name, params, ret),
            _ => unreachable!("FnDef always wraps a FnDecl"),
        };

        if let Some(existing) = self.symbols.lookup(name) {
            if let IrValue::Function(existing_fn) = existing.value {
                if existing_fn.count_basic_blocks() > 0 {
                    self.error(format!("function '{name}' is already defined"), span);
                    return;
                }
            }
        }

        let function = match self.symbols.lookup(name) {
            Some(binding) => match binding.value {
                IrValue::Function(f) => f,
                _ => unreachable!("a Function-typed binding always carries IrValue::Function"),
            },
            None => match self.lower_fn_decl(name, params, ret, span) {
                Some(f) => f,
                None => return,
            },
        };

        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);
        let previous_function = self.current_function.replace(function);

        let param_bindings: Vec<(Symbol, Type, inkwell::values::BasicValueEnum<'ctx>)> = params
            .iter()
            .enumerate()
            .filter_map(|(i, param)| function.get_nth_param(i as u32).map(|v| (param.name, param.ty.clone(), v)))
            .collect();

        let result = self.with_scope(|this| {
            for (name, ty, value) in &param_bindings {
                this.symbols.define_here(*name, Binding { value: IrValue::Value(*value), ty: ty.clone() });
            }
            this.lower_scope_body(body)
        });

        self.current_function = previous_function;

        let body_ok = match result {
            None => false,
            Some(value) => {
                if *ret == Type::Void {
                    let _ = self.builder.build_return(None);
                    true
                } else if value.ty != *ret {
                    self.error(
                        format!("function '{name}' declares return type '{ret}' but its body has type '{}'", value.ty),
                        span,
                    );
                    false
                } else {
                    let basic = value.value.as_basic_value();
                    let _ = self.builder.build_return(Some(&basic));
                    true
                }
            }
        };

        if !body_ok {
            unsafe {
                function.delete();
            }
            self.symbols.forget(name);
            return;
        }

        if !function.verify(false) {
            self.error(format!("function '{name}' failed LLVM verification"), span);
        }
    }

    // -- Scopes -----------------------------------------------------------

    /// Enters a new frame, runs `f`, then exits the frame. This is the
    /// closure-based analogue of [`crate::scope::ScopeGuard`]: a plain
    /// RAII guard can't be used here because `f` itself needs `&mut self`
    /// (to keep lowering further expressions), which a guard borrowing
    /// `&mut self.symbols` would conflict with. The frame still exits on
    /// every path out of `f`, success or failure.
    fn with_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.symbols.enter();
        let result = f(self);
        self.symbols.exit();
        result
    }

    fn lower_scope_body(&mut self, scope: &Scope) -> Option<Binding<'ctx>> {
        if scope.body.is_empty() {
            return Some(Binding { value: IrValue::Void, ty: Type::Void });
        }
        let mut last = None;
        for stmt in &scope.body {
            last = Some(self.lower_stmt_in_scope(stmt)?);
        }
        last
    }

    fn lower_scope(&mut self, scope: &Scope) -> Option<Binding<'ctx>> {
        self.with_scope(|this| this.lower_scope_body(scope))
    }

    /// `VarDecl` and `Expr` are the only statement forms the grammar
    /// permits inside a scope body; nested `FnDecl`/`FnDef` have no
    /// surface syntax there.
    fn lower_stmt_in_scope(&mut self, stmt: &Statement) -> Option<Binding<'ctx>> {
        match &stmt.kind {
            StatementKind::Expr(expr) => self.lower_expr(expr),
            StatementKind::VarDecl { name, rhs } => {
                let value = self.lower_expr(rhs)?;
                if let IrValue::Value(v) = value.value {
                    v.set_name(name.as_str());
                }
                self.symbols.define_here(*name, value.clone());
                Some(value)
            }
            StatementKind::FnDecl { .. } | StatementKind::FnDef { .. } => {
                unreachable!("the grammar admits only 'let' and expressions inside a scope")
            }
        }
    }

    // -- Expressions --------------------------------------------------------

    fn lower_expr(&mut self, expr: &Expr) -> Option<Binding<'ctx>> {
        match &expr.kind {
            ExprKind::LitInt32(v) => Some(Binding {
                value: IrValue::Value(self.context.i32_type().const_int(*v as u64, true).into()),
                ty: Type::Int32,
            }),
            ExprKind::LitDouble(v) => Some(Binding {
                value: IrValue::Value(self.context.f64_type().const_float(*v).into()),
                ty: Type::Double,
            }),
            ExprKind::LitStr(s) => {
                let global = self
                    .builder
                    .build_global_string_ptr(s.as_str(), "str")
                    .expect("building a constant string global cannot fail");
                Some(Binding { value: IrValue::Value(global.as_pointer_value().into()), ty: Type::StrLit })
            }
            ExprKind::Id(name) => match self.symbols.lookup(*name) {
                Some(binding) => Some(binding.clone()),
                None => {
                    self.error(format!("unbound identifier '{name}'"), expr.span);
                    None
                }
            },
            ExprKind::Binary { op, lhs, rhs } => self.lower_binary(*op, lhs, rhs, expr.span),
            ExprKind::Call { callee, args } => self.lower_call(*callee, args, expr.span),
            ExprKind::Scope(scope) => self.lower_scope(scope),
            ExprKind::If { cond, then_scope, else_scope } => {
                self.lower_if(cond, then_scope, else_scope, expr.span)
            }
        }
    }

    fn lower_binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr, span: Span) -> Option<Binding<'ctx>> {
        let lhs = self.lower_expr(lhs)?;
        let rhs = self.lower_expr(rhs)?;

        // `=` parses as an operator but has no lowering: Hexenwerk has no
        // mutable locals for it to assign into. Reject it here rather than
        // falling into the arithmetic cases below.
        if op == BinOp::Assign {
            self.error("'=' is not a supported expression; use 'let' to bind a name", span);
            return None;
        }

        if !is_arithmetic(&lhs.ty) || !is_arithmetic(&rhs.ty) {
            self.error(
                format!("operands of '{:?}' must be arithmetic (bool, i32 or double), got '{}' and '{}'", op, lhs.ty, rhs.ty),
                span,
            );
            return None;
        }

        let result_ty = types::join(&lhs.ty, &rhs.ty);
        let lhs_val = types::cast_to(self.context, &self.builder, lhs.value.as_basic_value(), &lhs.ty, &result_ty);
        let rhs_val = types::cast_to(self.context, &self.builder, rhs.value.as_basic_value(), &rhs.ty, &result_ty);

        if op == BinOp::Lt {
            let value = if result_ty == Type::Double {
                self.builder
                    .build_float_compare(
                        inkwell::FloatPredicate::ULT,
                        lhs_val.into_float_value(),
                        rhs_val.into_float_value(),
                        "lttmp",
                    )
                    .ok()?
            } else if result_ty == Type::Int32 {
                self.builder
                    .build_int_compare(
                        inkwell::IntPredicate::SLT,
                        lhs_val.into_int_value(),
                        rhs_val.into_int_value(),
                        "lttmp",
                    )
                    .ok()?
            } else {
                self.builder
                    .build_int_compare(
                        inkwell::IntPredicate::ULT,
                        lhs_val.into_int_value(),
                        rhs_val.into_int_value(),
                        "lttmp",
                    )
                    .ok()?
            };
            return Some(Binding { value: IrValue::Value(value.into()), ty: Type::Bool });
        }

        let value = if result_ty == Type::Double {
            let (a, b) = (lhs_val.into_float_value(), rhs_val.into_float_value());
            match op {
                BinOp::Add => self.builder.build_float_add(a, b, "addtmp"),
                BinOp::Sub => self.builder.build_float_sub(a, b, "subtmp"),
                BinOp::Mul => self.builder.build_float_mul(a, b, "multmp"),
                BinOp::Div => self.builder.build_float_div(a, b, "divtmp"),
                BinOp::Assign | BinOp::Lt => unreachable!("handled above / not arithmetic"),
            }
            .ok()?
            .into()
        } else {
            let (a, b) = (lhs_val.into_int_value(), rhs_val.into_int_value());
            match op {
                BinOp::Add => self.builder.build_int_add(a, b, "addtmp"),
                BinOp::Sub => self.builder.build_int_sub(a, b, "subtmp"),
                BinOp::Mul => self.builder.build_int_mul(a, b, "multmp"),
                BinOp::Div => self.builder.build_int_signed_div(a, b, "divtmp"),
                BinOp::Assign | BinOp::Lt => unreachable!("handled above / not arithmetic"),
            }
            .ok()?
            .into()
        };
        Some(Binding { value: IrValue::Value(value), ty: result_ty })
    }

    fn lower_call(&mut self, callee: Symbol, args: &[Expr], span: Span) -> Option<Binding<'ctx>> {
        let binding = match self.symbols.lookup(callee) {
            Some(b) => b.clone(),
            None => {
                self.error(format!("unbound identifier '{callee}'"), span);
                return None;
            }
        };
        let (params, ret, variadic, function) = match (&binding.ty, binding.value) {
            (Type::Function { params, ret, variadic }, IrValue::Function(f)) => {
                (params.clone(), (**ret).clone(), *variadic, f)
            }
            _ => {
                self.error(format!("'{callee}' is not callable"), span);
                return None;
            }
        };

        let arity_ok = if variadic { args.len() >= params.len() } else { args.len() == params.len() };
        if !arity_ok {
            self.error(
                format!(
                    "'{callee}' expects {}{} argument{}, got {}",
                    if variadic { "at least " } else { "" },
                    params.len(),
                    if params.len() == 1 { "" } else { "s" },
                    args.len()
                ),
                span,
            );
            return None;
        }

        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            let value = self.lower_expr(arg)?;
            if value.ty == Type::Void {
                self.error("cannot pass a void-typed expression as an argument", arg.span);
                return None;
            }
            arg_values.push(value.value.as_basic_value().into());
        }

        let call = self.builder.build_call(function, &arg_values, "calltmp").ok()?;
        let value = if ret == Type::Void {
            IrValue::Void
        } else {
            IrValue::Value(call.try_as_basic_value().left()?)
        };
        Some(Binding { value, ty: ret })
    }

    fn lower_if(&mut self, cond: &Expr, then_scope: &Scope, else_scope: &Scope, span: Span) -> Option<Binding<'ctx>> {
        let cond_handle = self.lower_expr(cond)?;
        if cond_handle.ty != Type::Bool {
            self.error(format!("condition of 'if' must be bool, got '{}'", cond_handle.ty), span);
            return None;
        }

        let function = self.current_function.expect("'if' is only ever lowered inside a function body");
        let then_bb = self.context.append_basic_block(function, "then");
        let else_bb = self.context.append_basic_block(function, "else");
        let merge_bb = self.context.append_basic_block(function, "merge");

        self.builder
            .build_conditional_branch(cond_handle.value.as_basic_value().into_int_value(), then_bb, else_bb)
            .ok()?;

        self.builder.position_at_end(then_bb);
        let then_value = self.lower_scope(then_scope);
        let then_exit: BasicBlock<'ctx> =
            self.builder.get_insert_block().expect("the builder is always positioned somewhere after lowering a scope");
        if then_value.is_some() {
            self.builder.build_unconditional_branch(merge_bb).ok()?;
        }

        self.builder.position_at_end(else_bb);
        let else_value = self.lower_scope(else_scope);
        let else_exit: BasicBlock<'ctx> =
            self.builder.get_insert_block().expect("the builder is always positioned somewhere after lowering a scope");
        if else_value.is_some() {
            self.builder.build_unconditional_branch(merge_bb).ok()?;
        }

        let (then_value, else_value) = (then_value?, else_value?);
        if then_value.ty != else_value.ty {
            self.error("Types of then and else scope do not match".to_string(), span);
            return None;
        }

        self.builder.position_at_end(merge_bb);
        if then_value.ty == Type::Void {
            return Some(Binding { value: IrValue::Void, ty: Type::Void });
        }

        let llvm_ty = types::basic_type(self.context, &then_value.ty)
            .expect("non-Void arm types always have a BasicTypeEnum");
        let phi = self.builder.build_phi(llvm_ty, "iftmp").ok()?;
        phi.add_incoming(&[
            (&then_value.value.as_basic_value(), then_exit),
            (&else_value.value.as_basic_value(), else_exit),
        ]);
        Some(Binding { value: IrValue::Value(phi.as_basic_value()), ty: then_value.ty })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexc_par::Parser;

    /// Parses and lowers every top-level statement in `source`, returning
    /// the resulting module's textual IR alongside the diagnostic handler.
    fn lower(source: &str) -> (String, Handler) {
        let handler = Handler::new();
        let context = Context::create();
        let mut lowerer = Lowerer::new(&context, "Hexenwerk", &handler);
        let mut parser = Parser::new(source, &handler);
        while let Some(stmt) = parser.parse() {
            lowerer.lower_top_level(&stmt);
        }
        (lowerer.module().print_to_string().to_string(), handler)
    }

    #[test]
    fn identity_function_returns_its_parameter() {
        let (ir, handler) = lower("fn id(x: i32) -> i32 { x };");
        assert!(!handler.has_errors());
        assert!(ir.contains("define i32 @id(i32 %x)"));
        assert!(ir.contains("ret i32 %x"));
    }

    #[test]
    fn double_constant_return() {
        let (ir, handler) = lower("fn two() -> double { 2. };");
        assert!(!handler.has_errors());
        assert!(ir.contains("define double @two()"));
        assert!(ir.contains("ret double"));
    }

    #[test]
    fn addition_of_two_parameters_verifies() {
        let (ir, handler) = lower("fn add(a: i32, b: i32) -> i32 { a + b };");
        assert!(!handler.has_errors());
        assert!(ir.contains("define i32 @add(i32 %a, i32 %b)"));
        assert!(ir.contains("add i32"));
    }

    #[test]
    fn if_else_lowers_to_a_phi_of_matching_type() {
        let (ir, handler) = lower("fn pick(c: bool) -> i32 { if c { 1 } else { 0 } };");
        assert!(!handler.has_errors());
        assert!(ir.contains("phi i32"));
        assert!(ir.contains("define i32 @pick(i1 %c)"));
    }

    #[test]
    fn mismatched_if_arms_are_erased_and_reported() {
        let (ir, handler) = lower("fn bad(c: bool) -> i32 { if c { 1 } else { 2. } };");
        assert!(handler.has_errors());
        assert!(handler
            .diagnostics()
            .iter()
            .any(|d| d.message.contains("Types of then and else scope do not match")));
        assert!(!ir.contains("@bad("));
    }

    #[test]
    fn variadic_printf_call_succeeds() {
        let (ir, handler) = lower(r#"fn hi() -> i32 { printf("x\n") };"#);
        assert!(!handler.has_errors());
        assert!(ir.contains("define i32 @hi()"));
        assert!(ir.contains("call i32 (ptr, ...) @printf"));
    }

    #[test]
    fn unbound_identifier_is_an_error() {
        let (_, handler) = lower("fn f() -> i32 { y };");
        assert!(handler.has_errors());
    }

    #[test]
    fn arity_mismatch_is_an_error() {
        let (_, handler) = lower("fn add(a: i32, b: i32) -> i32 { a + b }; fn f() -> i32 { add(1) };");
        assert!(handler.has_errors());
    }

    #[test]
    fn redefining_a_function_is_an_error() {
        let (_, handler) = lower("fn f() -> i32 { 1 }; fn f() -> i32 { 2 };");
        assert!(handler.has_errors());
    }

    #[test]
    fn redeclaring_is_an_error_but_declare_then_define_is_not() {
        let (_, handler) = lower("fn f() -> i32;\nfn f() -> i32;");
        assert!(handler.has_errors());

        let (ir, handler) = lower("fn f() -> i32;\nfn f() -> i32 { 1 };");
        assert!(!handler.has_errors());
        assert!(ir.contains("define i32 @f()"));
    }

    #[test]
    fn shadowing_in_a_nested_scope_does_not_leak_out() {
        let (ir, handler) = lower("fn f() -> i32 { let x = 1; { let x = 2; x }; x };");
        assert!(!handler.has_errors());
        assert!(ir.contains("define i32 @f()"));
    }

    #[test]
    fn mixed_bool_int32_double_arithmetic_promotes_to_double() {
        let (ir, handler) = lower("fn f(c: bool) -> double { c + 1 + 2.0 };");
        assert!(!handler.has_errors());
        assert!(ir.contains("fadd double"));
    }

    #[test]
    fn assign_operator_has_no_lowering() {
        let (_, handler) = lower("fn f() -> i32 { 1 = 2 };");
        assert!(handler.has_errors());
    }

    #[test]
    fn void_typed_argument_is_an_error_not_a_panic() {
        let (_, handler) = lower(
            "fn v() -> void { };\nfn add(a: i32, b: i32) -> i32 { a + b };\nfn f() -> i32 { add(v(), 1) };",
        );
        assert!(handler.has_errors());
    }
}
