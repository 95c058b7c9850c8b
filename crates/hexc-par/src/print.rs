//! AST to diagnostic string.
//!
//! A pseudo-source rendering used when a diagnostic needs to show the
//! statement or expression it refers to. This is not a source formatter;
//! it exists to make diagnostics legible, not to round-trip whitespace.

use crate::ast::{Expr, ExprKind, Scope, Statement, StatementKind};
use std::fmt::Write;

pub fn print_statement(stmt: &Statement) -> String {
    let mut out = String::new();
    write_statement(&mut out, stmt);
    out
}

pub fn print_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

fn write_statement(out: &mut String, stmt: &Statement) {
    match &stmt.kind {
        StatementKind::Expr(expr) => write_expr(out, expr),
        StatementKind::VarDecl { name, rhs } => {
            let _ = write!(out, "let {name} = ");
            write_expr(out, rhs);
        }
        StatementKind::FnDecl { name, params, .. } => {
            let _ = write!(out, "fn {name}(");
            write_param_names(out, params);
            let _ = write!(out, ");");
        }
        StatementKind::FnDef { decl, body } => {
            let (name, params) = match &decl.kind {
                StatementKind::FnDecl { name, params, .. } => (name, params),
                _ => unreachable!("FnDef always wraps a FnDecl"),
            };
            let _ = write!(out, "fn {name}(");
            write_param_names(out, params);
            let _ = write!(out, ") ");
            write_scope(out, body);
        }
    }
}

fn write_param_names(out: &mut String, params: &[crate::ast::Param]) {
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            let _ = write!(out, ", ");
        }
        let _ = write!(out, "{}", p.name);
    }
}

fn write_scope(out: &mut String, scope: &Scope) {
    out.push('{');
    for (i, stmt) in scope.body.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        } else {
            out.push(' ');
        }
        write_statement(out, stmt);
    }
    if !scope.body.is_empty() {
        out.push(' ');
    }
    out.push('}');
}

fn write_expr(out: &mut String, expr: &Expr) {
    match &expr.kind {
        ExprKind::LitInt32(v) => {
            let _ = write!(out, "{v}");
        }
        ExprKind::LitDouble(v) => {
            let _ = write!(out, "{v}");
        }
        ExprKind::LitStr(s) => {
            let _ = write!(out, "\"{s}\"");
        }
        ExprKind::Id(name) => {
            let _ = write!(out, "{name}");
        }
        ExprKind::Binary { op, lhs, rhs } => {
            out.push('(');
            write_expr(out, lhs);
            let _ = write!(out, " [Operator {}] ", op.code());
            write_expr(out, rhs);
            out.push(')');
        }
        ExprKind::Call { callee, args } => {
            let _ = write!(out, "{callee}(");
            for (i, a) in args.iter().enumerate() {
                if i > 0 {
                    let _ = write!(out, ", ");
                }
                write_expr(out, a);
            }
            out.push(')');
        }
        ExprKind::Scope(scope) => write_scope(out, scope),
        ExprKind::If { cond, then_scope, else_scope } => {
            let _ = write!(out, "if ");
            write_expr(out, cond);
            out.push(' ');
            write_scope(out, then_scope);
            let _ = write!(out, " else ");
            write_scope(out, else_scope);
        }
    }
}
