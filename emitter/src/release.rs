// release.rs — Owned-resource registry and the `Release` routine
//
// Raw pointers are registered as their declarations are rendered; `Release`
// deletes them in registration order, then the two heap-allocated aggregate
// instances. Shared and unique pointers own themselves and never register.

use crate::program::EmitCtx;
use crate::symbol::{Aggregate, Kind, PtrKind, ScalarVar};

#[derive(Debug, Default)]
pub struct ReleaseRegistry<'a> {
    raw: Vec<&'a ScalarVar>,
}

impl<'a> ReleaseRegistry<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a declared pointer; only raw pointers need an explicit delete.
    pub fn register(&mut self, var: &'a ScalarVar) {
        if var.kind == Kind::Pointer(PtrKind::Raw) {
            self.raw.push(var);
        }
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.raw.iter().map(|v| v.name.as_str())
    }
}

impl EmitCtx<'_> {
    pub(crate) fn emit_release(&mut self) {
        self.out.push_str("void Release() {\n");
        for name in self.releases.names() {
            self.out.push_str("    delete ");
            self.out.push_str(name);
            self.out.push_str(";\n");
        }
        for agg in Aggregate::ALL.iter().filter(|a| a.is_dynamic()) {
            self.out.push_str("    delete ");
            self.out.push_str(agg.instance());
            self.out.push_str(";\n");
        }
        self.out.push_str("}\n\n");
        tracing::debug!(raw_pointers = self.releases.len(), "rendered release");
    }
}
