// init.rs — The `init` routine
//
// Fills every kept array and assigns every public aggregate member scalar.
// Dynamic class members are skipped: its constructor already initializes
// them. Private class members keep their default initializers.
//
// Preconditions: declarations rendered (member buffers filled).
// Postconditions: none.
// Failure modes: none.
// Side effects: none.

use std::fmt::Write as _;

use crate::program::EmitCtx;
use crate::render::emit_array_fill;
use crate::stmt::INDENT;
use crate::symbol::{Aggregate, ArrayKind, Kind};

impl EmitCtx<'_> {
    pub(crate) fn emit_init(&mut self) {
        let program = self.program;
        self.out.push_str("void init() {\n");

        let _ = writeln!(self.out, "{}/* -- Arrays -- */", INDENT);
        let mut filled = 0usize;
        for array in program.inputs.arrays.iter().chain(&program.outputs.arrays) {
            if !self.keeps(array.dead) || array.kind == ArrayKind::DynamicClassMember {
                continue;
            }
            let target = self.dialect.array_access(array);
            emit_array_fill(&mut self.out, INDENT, array, &target);
            filled += 1;
        }

        let _ = writeln!(self.out, "\n{}/* -- Structs -- */", INDENT);
        self.emit_member_init(Aggregate::Struct);
        self.emit_member_init(Aggregate::DynamicStruct);
        let _ = writeln!(self.out, "\n{}/* -- Classes -- */", INDENT);
        self.emit_member_init(Aggregate::Class);
        self.emit_member_init(Aggregate::DynamicClass);

        self.out.push_str("}\n\n");
        tracing::debug!(arrays = filled, "rendered init");
    }

    fn emit_member_init(&mut self, agg: Aggregate) {
        let dialect = self.dialect;
        for var in self.buffers.vars(agg) {
            if var.kind == Kind::DynamicClassMember {
                continue;
            }
            let _ = writeln!(
                self.out,
                "{}{} = {};",
                INDENT,
                dialect.var_access(var),
                var.init.literal(var.ty)
            );
        }
    }
}
