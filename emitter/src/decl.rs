// decl.rs — Declarations: variables, pointers, arrays and the aggregates
//
// Walks both symbol tables once, in table order (inputs first). Standalone
// symbols are written as they are met; pointers are collected for their own
// section; aggregate members are handed to the member buffers and written
// afterwards as the bodies of the four aggregate types.
//
// Preconditions: the call plan is complete (array alignments are known).
// Postconditions: member buffers are filled; every raw pointer declared here
//                 is in the release registry.
// Failure modes: none.
// Side effects: none.

use std::fmt::Write as _;

use crate::call_surface::{align_attr, scalar_type};
use crate::classify::Placement;
use crate::program::EmitCtx;
use crate::render::emit_array_fill;
use crate::stmt::INDENT;
use crate::symbol::{Aggregate, Array, PtrKind, ScalarVar};

fn member_decl(out: &mut String, var: &ScalarVar, with_init: bool) {
    let prefix = var.modifier.map_or("", |m| m.member_prefix());
    let _ = write!(out, "{}{}{} {}", INDENT, prefix, var.ty.cpp_name(), var.name);
    if with_init {
        let _ = write!(out, " = {}", var.init.literal(var.ty));
    }
    out.push_str(";\n");
}

fn member_array_decl(out: &mut String, array: &Array) {
    let _ = writeln!(
        out,
        "{}{} {}{}{};",
        INDENT,
        array.ty.cpp_name(),
        array.name,
        array.dims_suffix(),
        align_attr(array.alignment)
    );
}

fn private_field(var: &ScalarVar) -> String {
    format!("private_mbr_{}", var.number_in_name())
}

impl<'a> EmitCtx<'a> {
    pub(crate) fn emit_decl(&mut self) {
        let program = self.program;
        let names = self.dialect.scalar_names();

        self.out.push_str("/* -- Variables -- */\n");
        let mut pointers = Vec::new();
        for var in program.inputs.vars.iter().chain(&program.outputs.vars) {
            if !self.keeps(var.dead) {
                continue;
            }
            match self.buffers.classify_var(var) {
                Placement::Standalone => {
                    let prefix = var.modifier.map_or("", |m| m.standalone_prefix());
                    let _ = writeln!(
                        self.out,
                        "{}{} {} = {};",
                        prefix,
                        var.ty.cpp_name(),
                        names.var_decl_name(var),
                        var.init.literal(var.ty)
                    );
                }
                Placement::Pointer(_) => pointers.push(var),
                Placement::Member(_) => {}
            }
        }

        self.out.push_str("\n/* -- Pointers -- */\n");
        for var in pointers {
            self.emit_pointer_decl(var);
        }

        self.out.push_str("\n/* -- Arrays -- */\n");
        for array in program.inputs.arrays.iter().chain(&program.outputs.arrays) {
            if !self.keeps(array.dead) {
                continue;
            }
            if self.buffers.classify_array(array) == Placement::Standalone {
                let _ = writeln!(
                    self.out,
                    "{} {}{}{};",
                    array.ty.cpp_name(),
                    array.name,
                    array.dims_suffix(),
                    align_attr(self.plan.alignment(array))
                );
            }
        }

        self.out.push_str("\n/* -- Structs -- */\n");
        self.emit_struct(Aggregate::Struct);
        self.emit_struct(Aggregate::DynamicStruct);
        self.out.push_str("/* -- Classes -- */\n");
        self.emit_class();
        self.emit_dynamic_class();

        tracing::debug!(
            members = self.buffers.len(),
            raw_pointers = self.releases.len(),
            "rendered declarations"
        );
    }

    fn emit_pointer_decl(&mut self, var: &'a ScalarVar) {
        let ty = var.ty.cpp_name();
        let lit = var.init.literal(var.ty);
        let decl = scalar_type(var);
        match var.kind.ptr_kind() {
            Some(PtrKind::Raw) => {
                let _ = writeln!(self.out, "{} {} = new {}({});", decl, var.name, ty, lit);
                self.releases.register(var);
            }
            Some(PtrKind::Shared) => {
                let _ = writeln!(
                    self.out,
                    "{} {} = std::make_shared<{}>({});",
                    decl, var.name, ty, lit
                );
            }
            Some(PtrKind::Unique) => {
                let _ = writeln!(self.out, "{} {}(new {}({}));", decl, var.name, ty, lit);
            }
            None => {}
        }
    }

    /// Static and dynamic struct: public members with default initializers.
    fn emit_struct(&mut self, agg: Aggregate) {
        let _ = writeln!(self.out, "struct {} {{", agg.type_name());
        for var in self.buffers.vars(agg) {
            member_decl(&mut self.out, var, true);
        }
        for array in self.buffers.arrays(agg) {
            member_array_decl(&mut self.out, array);
        }
        if agg.is_dynamic() {
            self.out.push_str("};\n");
            let _ = writeln!(
                self.out,
                "{0}* {1} = new {0};\n",
                agg.type_name(),
                agg.instance()
            );
        } else {
            let _ = writeln!(self.out, "}} {};\n", agg.instance());
        }
    }

    /// Static class: private members are reached through reference accessors.
    fn emit_class(&mut self) {
        let agg = Aggregate::Class;
        let _ = writeln!(self.out, "class {} {{", agg.type_name());
        self.out.push_str("  public:\n");
        for var in self.buffers.vars(agg) {
            member_decl(&mut self.out, var, true);
        }
        for array in self.buffers.arrays(agg) {
            member_array_decl(&mut self.out, array);
        }
        for var in self.buffers.private_vars() {
            let _ = writeln!(
                self.out,
                "{}{}& {}() {{ return {}; }}",
                INDENT,
                var.ty.cpp_name(),
                var.name,
                private_field(var)
            );
        }
        self.out.push_str("\n  private:\n");
        for var in self.buffers.private_vars() {
            let prefix = var.modifier.map_or("", |m| m.member_prefix());
            let _ = writeln!(
                self.out,
                "{}{}{} {} = {};",
                INDENT,
                prefix,
                var.ty.cpp_name(),
                private_field(var),
                var.init.literal(var.ty)
            );
        }
        let _ = writeln!(self.out, "}} {};\n", agg.instance());
    }

    /// Dynamic class: the constructor assigns every member and fills every
    /// array; `init` leaves this aggregate alone.
    fn emit_dynamic_class(&mut self) {
        let agg = Aggregate::DynamicClass;
        let body = INDENT.repeat(2);
        let _ = writeln!(self.out, "class {} {{", agg.type_name());
        self.out.push_str("  public:\n");
        for var in self.buffers.vars(agg) {
            member_decl(&mut self.out, var, false);
        }
        for array in self.buffers.arrays(agg) {
            member_array_decl(&mut self.out, array);
        }
        let _ = writeln!(self.out, "{}{}() {{", INDENT, agg.type_name());
        for var in self.buffers.vars(agg) {
            let _ = writeln!(
                self.out,
                "{}{} = {};",
                body,
                var.name,
                var.init.literal(var.ty)
            );
        }
        for array in self.buffers.arrays(agg) {
            emit_array_fill(&mut self.out, &body, array, &array.name);
        }
        let _ = writeln!(self.out, "{}}}", INDENT);
        self.out.push_str("};\n");
        let _ = writeln!(
            self.out,
            "{0}* {1} = new {0};\n",
            agg.type_name(),
            agg.instance()
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::ir::{IntType, IrValue};
    use crate::options::Options;
    use crate::program::{emit, Program};
    use crate::symbol::{Array, ArrayKind, DeclModifier, Kind, PtrKind, ScalarVar};

    fn v(n: u64) -> IrValue {
        IrValue::from_u64(n)
    }

    fn section<'s>(src: &'s str, start: &str, end: &str) -> &'s str {
        let s = src.find(start).unwrap();
        let e = s + src[s..].find(end).unwrap();
        &src[s..e]
    }

    #[test]
    fn standalone_variables_honor_modifiers() {
        let mut p = Program::default();
        p.inputs
            .add_var(ScalarVar::new("var_1", IntType::Short, v(3)).with_modifier(DeclModifier::Static))
            .unwrap();
        p.inputs
            .add_var(ScalarVar::new("var_2", IntType::Ulong, v(4)).with_modifier(DeclModifier::Alignas16))
            .unwrap();
        p.outputs
            .add_var(ScalarVar::new("var_3", IntType::Llong, IrValue::from_i64(-2)))
            .unwrap();
        let emitted = emit(&p, &Options::default()).unwrap();
        let vars = section(&emitted.source, "/* -- Variables -- */", "/* -- Pointers -- */");
        assert_eq!(
            vars,
            "/* -- Variables -- */\n\
             static short var_1 = 3;\n\
             alignas(16) unsigned long int var_2 = 4UL;\n\
             long long int var_3 = -2LL;\n\n"
        );
    }

    #[test]
    fn pointers_by_ownership() {
        let mut p = Program::default();
        for (name, kind) in [
            ("var_1", PtrKind::Raw),
            ("var_2", PtrKind::Shared),
            ("var_3", PtrKind::Unique),
        ] {
            p.inputs
                .add_var(ScalarVar::new(name, IntType::Int, v(7)).with_kind(Kind::Pointer(kind)))
                .unwrap();
        }
        let emitted = emit(&p, &Options::default()).unwrap();
        let ptrs = section(&emitted.source, "/* -- Pointers -- */", "/* -- Arrays -- */");
        assert_eq!(
            ptrs,
            "/* -- Pointers -- */\n\
             int* var_1 = new int(7);\n\
             std::shared_ptr<int> var_2 = std::make_shared<int>(7);\n\
             std::unique_ptr<int> var_3(new int(7));\n\n"
        );
    }

    #[test]
    fn aggregates_layout() {
        let mut p = Program::default();
        p.inputs
            .add_var(ScalarVar::new("var_1", IntType::Int, v(1)).with_kind(Kind::StructMember))
            .unwrap();
        p.inputs
            .add_var(
                ScalarVar::new("var_2", IntType::Uchar, v(2))
                    .with_kind(Kind::DynamicStructMember)
                    .with_modifier(DeclModifier::Mutable),
            )
            .unwrap();
        p.outputs
            .add_var(ScalarVar::new("var_3", IntType::Int, v(3)).with_kind(Kind::ClassPublicMember))
            .unwrap();
        p.outputs
            .add_var(ScalarVar::new("var_14", IntType::Int, v(4)).with_kind(Kind::ClassPrivateMember))
            .unwrap();
        p.outputs
            .add_var(ScalarVar::new("var_5", IntType::Int, v(5)).with_kind(Kind::DynamicClassMember))
            .unwrap();
        p.outputs
            .add_array(
                Array::new("arr_6", IntType::Int, vec![2, 2], v(6), v(6))
                    .with_kind(ArrayKind::DynamicClassMember)
                    .with_alignment(16),
            )
            .unwrap();
        let emitted = emit(&p, &Options::default()).unwrap();
        let src = &emitted.source;

        assert!(src.contains("struct GlobalStruct {\n    int var_1 = 1;\n} struct_1;\n"));
        assert!(src.contains(
            "struct DynamicStruct {\n    mutable unsigned char var_2 = 2;\n};\nDynamicStruct* struct_2 = new DynamicStruct;\n"
        ));
        let class = section(src, "class GlobalClass {", "} object_1;");
        assert_eq!(
            class,
            "class GlobalClass {\n  public:\n    int var_3 = 3;\n    int& var_14() { return private_mbr_14; }\n\n  private:\n    int private_mbr_14 = 4;\n"
        );
        let dyn_class = section(src, "class DynamicClass {", "DynamicClass* object_2 = new DynamicClass;");
        assert_eq!(
            dyn_class,
            "class DynamicClass {\n\
             \x20 public:\n\
             \x20   int var_5;\n\
             \x20   int arr_6[2][2] __attribute__((aligned(16)));\n\
             \x20   DynamicClass() {\n\
             \x20       var_5 = 5;\n\
             \x20       for (size_t i_0 = 0; i_0 < 2; ++i_0)\n\
             \x20           for (size_t i_1 = 0; i_1 < 2; ++i_1)\n\
             \x20               arr_6[i_0][i_1] = 6;\n\
             \x20   }\n\
             };\n"
        );
    }

    #[test]
    fn dead_symbols_follow_retention_policy() {
        let mut p = Program::default();
        p.inputs
            .add_var(ScalarVar::new("var_1", IntType::Int, v(1)).dead())
            .unwrap();
        p.inputs
            .add_var(ScalarVar::new("var_2", IntType::Int, v(1)).with_kind(Kind::StructMember).dead())
            .unwrap();
        p.inputs
            .add_array(Array::new("arr_3", IntType::Int, vec![2], v(1), v(1)).dead())
            .unwrap();

        let dropped = emit(&p, &Options::default()).unwrap();
        for name in ["var_1", "var_2", "arr_3"] {
            assert!(!dropped.source.contains(name), "{name} leaked");
        }

        let opts = Options {
            allow_dead_data: true,
            ..Options::default()
        };
        let kept = emit(&p, &opts).unwrap();
        assert!(kept.source.contains("int var_1 = 1;\n"));
        assert!(kept.source.contains("    int var_2 = 1;\n"));
        assert!(kept.source.contains("int arr_3[2];\n"));
    }

    #[test]
    fn empty_aggregates_still_exist() {
        let emitted = emit(&Program::default(), &Options::default()).unwrap();
        assert!(emitted.source.contains("struct GlobalStruct {\n} struct_1;\n"));
        assert!(emitted.source.contains("DynamicClass* object_2 = new DynamicClass;\n"));
    }
}
