//! Mapping from the surface [`Type`] to LLVM types, and the arithmetic
//! promotion/cast rules between `Bool`, `Int32` and `Double`.

use hexc_par::ast::Type;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::types::BasicTypeEnum;
use inkwell::values::BasicValueEnum;
use inkwell::AddressSpace;

/// `true` for the three types arithmetic operators and comparisons accept.
pub fn is_arithmetic(ty: &Type) -> bool {
    matches!(ty, Type::Bool | Type::Int32 | Type::Double)
}

/// Position in the **Bool < Int32 < Double** order, used to pick the
/// result type of a binary operator as the join of its operands.
fn order(ty: &Type) -> u8 {
    match ty {
        Type::Bool => 0,
        Type::Int32 => 1,
        Type::Double => 2,
        _ => u8::MAX,
    }
}

/// The join of two arithmetic types on the Bool < Int32 < Double order.
pub fn join(a: &Type, b: &Type) -> Type {
    if order(a) >= order(b) {
        a.clone()
    } else {
        b.clone()
    }
}

/// The LLVM representation of a surface type that can appear as a value
/// (a parameter, a local, an expression result). `Void` and `Function`
/// have no `BasicTypeEnum` of their own: `Void` is handled separately by
/// callers (it is never the type of an actual LLVM value), and a
/// first-class `Function` value is represented as its pointer type.
pub fn basic_type<'ctx>(context: &'ctx Context, ty: &Type) -> Option<BasicTypeEnum<'ctx>> {
    match ty {
        Type::Bool => Some(context.bool_type().into()),
        Type::Int32 => Some(context.i32_type().into()),
        Type::Double => Some(context.f64_type().into()),
        Type::StrLit => Some(context.ptr_type(AddressSpace::default()).into()),
        Type::Void | Type::Function { .. } => None,
    }
}

/// Casts `value` (of type `from`) to `to`, both arithmetic types, via the
/// six Bool/Int32/Double conversions below. A no-op when `from == to`.
pub fn cast_to<'ctx>(
    context: &'ctx Context,
    builder: &Builder<'ctx>,
    value: BasicValueEnum<'ctx>,
    from: &Type,
    to: &Type,
) -> BasicValueEnum<'ctx> {
    if from == to {
        return value;
    }
    match (from, to) {
        (Type::Bool, Type::Int32) => builder
            .build_int_z_extend(value.into_int_value(), context.i32_type(), "bool_to_i32")
            .expect("zero-extend of i1 to i32 cannot fail")
            .into(),
        (Type::Bool, Type::Double) => builder
            .build_unsigned_int_to_float(value.into_int_value(), context.f64_type(), "bool_to_double")
            .expect("unsigned-int-to-fp of i1 cannot fail")
            .into(),
        (Type::Int32, Type::Bool) => builder
            .build_int_truncate(value.into_int_value(), context.bool_type(), "i32_to_bool")
            .expect("truncate of i32 to i1 cannot fail")
            .into(),
        (Type::Int32, Type::Double) => builder
            .build_signed_int_to_float(value.into_int_value(), context.f64_type(), "i32_to_double")
            .expect("signed-int-to-fp of i32 cannot fail")
            .into(),
        (Type::Double, Type::Int32) => builder
            .build_float_to_signed_int(value.into_float_value(), context.i32_type(), "double_to_i32")
            .expect("fp-to-signed-int of double cannot fail")
            .into(),
        (Type::Double, Type::Bool) => builder
            .build_float_to_unsigned_int(value.into_float_value(), context.bool_type(), "double_to_bool")
            .expect("fp-to-unsigned-int of double cannot fail")
            .into(),
        _ => unreachable!("cast_to is only ever called between Bool/Int32/Double"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_picks_the_higher_type_either_order() {
        assert_eq!(join(&Type::Bool, &Type::Int32), Type::Int32);
        assert_eq!(join(&Type::Int32, &Type::Bool), Type::Int32);
        assert_eq!(join(&Type::Int32, &Type::Double), Type::Double);
        assert_eq!(join(&Type::Double, &Type::Bool), Type::Double);
    }

    #[test]
    fn join_is_identity_for_equal_types() {
        assert_eq!(join(&Type::Int32, &Type::Int32), Type::Int32);
    }

    #[test]
    fn only_arithmetic_types_are_arithmetic() {
        assert!(is_arithmetic(&Type::Bool));
        assert!(is_arithmetic(&Type::Int32));
        assert!(is_arithmetic(&Type::Double));
        assert!(!is_arithmetic(&Type::Void));
        assert!(!is_arithmetic(&Type::StrLit));
        assert!(!is_arithmetic(&Type::Function {
            params: vec![],
            ret: Box::new(Type::Void),
            variadic: false,
        }));
    }

    #[test]
    fn basic_type_resolves_the_value_bearing_types() {
        let context = Context::create();
        assert!(basic_type(&context, &Type::Bool).is_some());
        assert!(basic_type(&context, &Type::Int32).is_some());
        assert!(basic_type(&context, &Type::Double).is_some());
        assert!(basic_type(&context, &Type::StrLit).is_some());
        assert!(basic_type(&context, &Type::Void).is_none());
    }
}
