// classify.rs — Partition of symbols into aggregate member buffers
//
// Declaration rendering hands every rendered symbol to `MemberBuffers`, which
// files aggregate members into the buffer of their aggregate and reports how
// the symbol must be declared. Buffer order is insertion order; every later
// pass that touches members (aggregate bodies, init, checksum) walks these
// buffers, so they must be filled exactly once per run. The buffers live in
// the per-run context, which is what makes a second run start empty.
//
// Preconditions: symbols are offered once each, in table order.
// Postconditions: each member symbol sits in exactly one buffer.
// Failure modes: none.
// Side effects: none beyond the buffers themselves.

use crate::symbol::{Aggregate, Array, ArrayKind, Kind, PtrKind, ScalarVar};

/// How a classified symbol is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// A namespace-scope variable or array, rendered immediately.
    Standalone,
    /// A heap-owned scalar, rendered with the pointer declarations.
    Pointer(PtrKind),
    /// Buffered for the body of an aggregate type.
    Member(Aggregate),
}

#[derive(Debug, Default)]
pub struct MemberBuffers<'a> {
    struct_vars: Vec<&'a ScalarVar>,
    class_vars: Vec<&'a ScalarVar>,
    class_private_vars: Vec<&'a ScalarVar>,
    dyn_struct_vars: Vec<&'a ScalarVar>,
    dyn_class_vars: Vec<&'a ScalarVar>,
    struct_arrays: Vec<&'a Array>,
    class_arrays: Vec<&'a Array>,
    dyn_struct_arrays: Vec<&'a Array>,
    dyn_class_arrays: Vec<&'a Array>,
}

impl<'a> MemberBuffers<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify_var(&mut self, var: &'a ScalarVar) -> Placement {
        let (buffer, agg) = match var.kind {
            Kind::Ordinary => return Placement::Standalone,
            Kind::Pointer(ptr) => return Placement::Pointer(ptr),
            Kind::StructMember => (&mut self.struct_vars, Aggregate::Struct),
            Kind::ClassPublicMember => (&mut self.class_vars, Aggregate::Class),
            Kind::ClassPrivateMember => (&mut self.class_private_vars, Aggregate::Class),
            Kind::DynamicStructMember => (&mut self.dyn_struct_vars, Aggregate::DynamicStruct),
            Kind::DynamicClassMember => (&mut self.dyn_class_vars, Aggregate::DynamicClass),
        };
        buffer.push(var);
        Placement::Member(agg)
    }

    pub fn classify_array(&mut self, array: &'a Array) -> Placement {
        let (buffer, agg) = match array.kind {
            ArrayKind::Ordinary => return Placement::Standalone,
            ArrayKind::StructMember => (&mut self.struct_arrays, Aggregate::Struct),
            ArrayKind::ClassPublicMember => (&mut self.class_arrays, Aggregate::Class),
            ArrayKind::DynamicStructMember => {
                (&mut self.dyn_struct_arrays, Aggregate::DynamicStruct)
            }
            ArrayKind::DynamicClassMember => (&mut self.dyn_class_arrays, Aggregate::DynamicClass),
        };
        buffer.push(array);
        Placement::Member(agg)
    }

    /// Public scalar members of `agg`, in classification order.
    pub fn vars(&self, agg: Aggregate) -> &[&'a ScalarVar] {
        match agg {
            Aggregate::Struct => &self.struct_vars,
            Aggregate::DynamicStruct => &self.dyn_struct_vars,
            Aggregate::Class => &self.class_vars,
            Aggregate::DynamicClass => &self.dyn_class_vars,
        }
    }

    /// Private scalar members of the static class.
    pub fn private_vars(&self) -> &[&'a ScalarVar] {
        &self.class_private_vars
    }

    pub fn arrays(&self, agg: Aggregate) -> &[&'a Array] {
        match agg {
            Aggregate::Struct => &self.struct_arrays,
            Aggregate::DynamicStruct => &self.dyn_struct_arrays,
            Aggregate::Class => &self.class_arrays,
            Aggregate::DynamicClass => &self.dyn_class_arrays,
        }
    }

    /// Total number of buffered symbols.
    pub fn len(&self) -> usize {
        Aggregate::ALL
            .iter()
            .map(|&agg| self.vars(agg).len() + self.arrays(agg).len())
            .sum::<usize>()
            + self.class_private_vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of buffers (out of the nine) holding a symbol with this name.
    #[cfg(test)]
    fn occurrences(&self, name: &str) -> usize {
        let var_hits = Aggregate::ALL
            .iter()
            .flat_map(|&agg| self.vars(agg).iter())
            .chain(self.class_private_vars.iter())
            .filter(|v| v.name == name)
            .count();
        let array_hits = Aggregate::ALL
            .iter()
            .flat_map(|&agg| self.arrays(agg).iter())
            .filter(|a| a.name == name)
            .count();
        var_hits + array_hits
    }
}
