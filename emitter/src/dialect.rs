// dialect.rs — Dialect-dependent naming of symbols
//
// `DialectContext` is the rendering state that varies with the target
// dialect. The name prefix is never stored on a long-lived context: callers
// obtain a transient copy with the prefix applied (`scalar_names`) for the
// section that needs it, so nothing has to be reset afterwards.
//
// Preconditions: none.
// Postconditions: declaration names and access expressions agree for every
//                 symbol under the same context.
// Failure modes: none.
// Side effects: none.

use crate::options::Dialect;
use crate::symbol::{Aggregate, Array, Kind, ScalarVar};

/// Prefix given to ordinary scalars on the host side of offload programs.
const OFFLOAD_HOST_PREFIX: &str = "app_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectContext {
    pub dialect: Dialect,
    prefix: &'static str,
}

impl DialectContext {
    pub fn new(dialect: Dialect) -> Self {
        DialectContext { dialect, prefix: "" }
    }

    /// Context for sections that name ordinary scalars (declarations,
    /// externs, checksum, parameters).
    pub fn scalar_names(self) -> Self {
        let prefix = if self.dialect == Dialect::Sycl {
            OFFLOAD_HOST_PREFIX
        } else {
            ""
        };
        DialectContext { prefix, ..self }
    }

    /// Name used where the scalar is declared.
    pub fn var_decl_name(&self, var: &ScalarVar) -> String {
        match var.kind {
            Kind::Ordinary => format!("{}{}", self.prefix, var.name),
            _ => var.name.clone(),
        }
    }

    /// Expression reading or writing the scalar's value from namespace scope.
    pub fn var_access(&self, var: &ScalarVar) -> String {
        match var.kind {
            Kind::Ordinary => self.var_decl_name(var),
            Kind::Pointer(_) => format!("(*{})", var.name),
            Kind::StructMember => member_access(Aggregate::Struct, &var.name),
            Kind::ClassPublicMember => member_access(Aggregate::Class, &var.name),
            Kind::ClassPrivateMember => {
                format!("{}()", member_access(Aggregate::Class, &var.name))
            }
            Kind::DynamicStructMember => member_access(Aggregate::DynamicStruct, &var.name),
            Kind::DynamicClassMember => member_access(Aggregate::DynamicClass, &var.name),
        }
    }

    /// Expression naming the array object from namespace scope.
    pub fn array_access(&self, array: &Array) -> String {
        match array.kind.aggregate() {
            Some(agg) => member_access(agg, &array.name),
            None => array.name.clone(),
        }
    }
}

fn member_access(agg: Aggregate, name: &str) -> String {
    format!("{}{}{}", agg.instance(), agg.accessor(), name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{IntType, IrValue};
    use crate::symbol::{ArrayKind, PtrKind};

    fn var(kind: Kind) -> ScalarVar {
        ScalarVar::new("var_4", IntType::Int, IrValue::from_u64(1)).with_kind(kind)
    }

    #[test]
    fn access_expressions_per_kind() {
        let ctx = DialectContext::new(Dialect::Cxx);
        assert_eq!(ctx.var_access(&var(Kind::Ordinary)), "var_4");
        assert_eq!(ctx.var_access(&var(Kind::Pointer(PtrKind::Raw))), "(*var_4)");
        assert_eq!(ctx.var_access(&var(Kind::StructMember)), "struct_1.var_4");
        assert_eq!(ctx.var_access(&var(Kind::DynamicStructMember)), "struct_2->var_4");
        assert_eq!(ctx.var_access(&var(Kind::ClassPublicMember)), "object_1.var_4");
        assert_eq!(ctx.var_access(&var(Kind::ClassPrivateMember)), "object_1.var_4()");
        assert_eq!(ctx.var_access(&var(Kind::DynamicClassMember)), "object_2->var_4");
    }

    #[test]
    fn offload_prefix_applies_to_ordinary_scalars_only() {
        let ctx = DialectContext::new(Dialect::Sycl);
        assert_eq!(ctx.var_access(&var(Kind::Ordinary)), "var_4");
        let named = ctx.scalar_names();
        assert_eq!(named.var_access(&var(Kind::Ordinary)), "app_var_4");
        assert_eq!(named.var_access(&var(Kind::Pointer(PtrKind::Shared))), "(*var_4)");
        assert_eq!(named.var_access(&var(Kind::StructMember)), "struct_1.var_4");
        assert_eq!(ctx.var_decl_name(&var(Kind::Ordinary)), "var_4");
    }

    #[test]
    fn no_prefix_outside_offload() {
        let named = DialectContext::new(Dialect::Cxx).scalar_names();
        assert_eq!(named.var_decl_name(&var(Kind::Ordinary)), "var_4");
    }

    #[test]
    fn array_access_qualifies_members() {
        let ctx = DialectContext::new(Dialect::Cxx);
        let arr = Array::new("arr_2", IntType::Int, vec![2], IrValue::from_u64(0), IrValue::from_u64(0));
        assert_eq!(ctx.array_access(&arr), "arr_2");
        let member = arr.with_kind(ArrayKind::DynamicStructMember);
        assert_eq!(ctx.array_access(&member), "struct_2->arr_2");
    }
}
