// call_surface.rs — Parameter passing, extern declarations and `test`
//
// One plan decides, before anything is written, which input symbols reach
// `test` as arguments and which arrays carry an alignment attribute. The
// signature, the extern block and the call site in `main` all read the same
// plan: a symbol is a parameter iff it is in the passed list, and receives
// an extern iff it is not. Aggregate members never take part; the four
// aggregate instances always trail the argument list.
//
// Preconditions: the program passed validation.
// Postconditions: every kept standalone input is either passed or extern,
//                 never both; every kept standalone output is extern.
// Failure modes: an alignment size without a byte width.
// Side effects: draws from the run RNG in table order.

use std::collections::HashMap;
use std::fmt::Write as _;

use rand::Rng;

use crate::error::EmitError;
use crate::options::{AlignmentSize, Dialect, OptionLevel};
use crate::program::EmitCtx;
use crate::stmt::{emit_block, INDENT};
use crate::symbol::{Aggregate, Array, ArrayKind, Kind, PtrKind, ScalarVar};

#[derive(Debug, Default)]
pub struct CallPlan<'a> {
    passed_vars: Vec<&'a ScalarVar>,
    passed_arrays: Vec<&'a Array>,
    extern_vars: Vec<&'a ScalarVar>,
    extern_arrays: Vec<&'a Array>,
    alignments: HashMap<&'a str, u32>,
}

impl<'a> CallPlan<'a> {
    /// Alignment an array is declared with: the one chosen for this run, or
    /// the one the program carries.
    pub fn alignment(&self, array: &Array) -> u32 {
        self.alignments
            .get(array.name.as_str())
            .copied()
            .unwrap_or(array.alignment)
    }

    pub fn passed_names(&self) -> Vec<String> {
        self.passed_vars
            .iter()
            .map(|v| v.name.clone())
            .chain(self.passed_arrays.iter().map(|a| a.name.clone()))
            .collect()
    }
}

fn is_standalone(kind: Kind) -> bool {
    matches!(kind, Kind::Ordinary | Kind::Pointer(_))
}

/// `T`, `T*`, `std::shared_ptr<T>` or `std::unique_ptr<T>`.
pub(crate) fn scalar_type(var: &ScalarVar) -> String {
    let ty = var.ty.cpp_name();
    match var.kind.ptr_kind() {
        Some(PtrKind::Raw) => format!("{}*", ty),
        Some(PtrKind::Shared) => format!("std::shared_ptr<{}>", ty),
        Some(PtrKind::Unique) => format!("std::unique_ptr<{}>", ty),
        None => ty.to_string(),
    }
}

pub(crate) fn align_attr(alignment: u32) -> String {
    if alignment == 0 {
        String::new()
    } else {
        format!(" __attribute__((aligned({})))", alignment)
    }
}

impl<'a> EmitCtx<'a> {
    // ── Planning ────────────────────────────────────────────────────────

    pub(crate) fn plan_call_surface(&mut self) -> Result<(), EmitError> {
        let program = self.program;
        if self.options.unique_align_size && self.options.align_size == AlignmentSize::Max {
            let pick = self.rng.gen_range(0..AlignmentSize::CONCRETE.len());
            self.align_size = AlignmentSize::CONCRETE[pick];
        }

        for var in &program.inputs.vars {
            if !self.keeps(var.dead) || !is_standalone(var.kind) {
                continue;
            }
            if self.pass_as_param() {
                self.plan.passed_vars.push(var);
            } else {
                self.plan.extern_vars.push(var);
            }
        }
        for var in &program.outputs.vars {
            if self.keeps(var.dead) && is_standalone(var.kind) {
                self.plan.extern_vars.push(var);
            }
        }

        for array in &program.inputs.arrays {
            if !self.keeps(array.dead) || array.kind != ArrayKind::Ordinary {
                continue;
            }
            if self.pass_as_param() {
                self.plan.passed_arrays.push(array);
            } else {
                self.plan_alignment(array)?;
                self.plan.extern_arrays.push(array);
            }
        }
        for array in &program.outputs.arrays {
            if self.keeps(array.dead) && array.kind == ArrayKind::Ordinary {
                self.plan_alignment(array)?;
                self.plan.extern_arrays.push(array);
            }
        }

        tracing::debug!(
            passed = self.plan.passed_vars.len() + self.plan.passed_arrays.len(),
            externs = self.plan.extern_vars.len() + self.plan.extern_arrays.len(),
            aligned = self.plan.alignments.len(),
            "planned call surface"
        );
        Ok(())
    }

    fn pass_as_param(&mut self) -> bool {
        match self.options.inp_as_args {
            OptionLevel::None => false,
            OptionLevel::Some => self.rng.gen_bool(0.5),
            OptionLevel::All => true,
        }
    }

    fn plan_alignment(&mut self, array: &'a Array) -> Result<(), EmitError> {
        if !self.options.std.is_cxx() {
            return Ok(());
        }
        let emit = match self.options.emit_align_attr {
            OptionLevel::None => false,
            OptionLevel::Some => self.rng.gen_bool(0.5),
            OptionLevel::All => true,
        };
        if !emit {
            return Ok(());
        }
        let size = if self.options.unique_align_size {
            self.align_size
        } else {
            AlignmentSize::CONCRETE[self.rng.gen_range(0..AlignmentSize::CONCRETE.len())]
        };
        self.plan.alignments.insert(array.name.as_str(), size.bytes()?);
        Ok(())
    }

    // ── Rendering ───────────────────────────────────────────────────────

    fn emit_externs(&mut self) {
        let names = self.dialect.scalar_names();
        let plan = &self.plan;
        let out = &mut self.out;
        for var in &plan.extern_vars {
            let prefix = match (var.kind, var.modifier) {
                (Kind::Ordinary, Some(m)) => m.extern_prefix(),
                _ => "",
            };
            let _ = writeln!(
                out,
                "extern {}{} {};",
                prefix,
                scalar_type(var),
                names.var_decl_name(var)
            );
        }
        for array in &plan.extern_arrays {
            let _ = writeln!(
                out,
                "extern {} {}{}{};",
                array.ty.cpp_name(),
                array.name,
                array.dims_suffix(),
                align_attr(plan.alignment(array))
            );
        }
        if !plan.extern_vars.is_empty() || !plan.extern_arrays.is_empty() {
            out.push('\n');
        }
    }

    fn test_params(&self) -> Vec<String> {
        let names = self.dialect.scalar_names();
        let vars = self
            .plan
            .passed_vars
            .iter()
            .map(|v| format!("{} {}", scalar_type(v), names.var_decl_name(v)));
        let arrays = self
            .plan
            .passed_arrays
            .iter()
            .map(|a| format!("{} {}{}", a.ty.cpp_name(), a.name, a.dims_suffix()));
        vars.chain(arrays)
            .chain(Aggregate::ALL.iter().map(|agg| agg.param_decl()))
            .collect()
    }

    /// Arguments of the `test` call in `main`, in signature order.
    pub(crate) fn call_args(&self) -> Vec<String> {
        let names = self.dialect.scalar_names();
        let vars = self.plan.passed_vars.iter().map(|v| match v.kind {
            Kind::Pointer(PtrKind::Unique) => format!("std::move({})", v.name),
            _ => names.var_decl_name(v),
        });
        let arrays = self.plan.passed_arrays.iter().map(|a| a.name.clone());
        vars.chain(arrays)
            .chain(Aggregate::ALL.iter().map(|agg| agg.instance().to_string()))
            .collect()
    }

    pub(crate) fn emit_test(&mut self) {
        let program = self.program;
        for function in &program.functions {
            function.emit(&mut self.out);
        }
        self.emit_externs();

        let params = self.test_params().join(", ");
        if self.options.std == Dialect::Ispc {
            let _ = writeln!(self.out, "extern \"C\" {{ void test({}); }}\n", params);
        }
        let _ = writeln!(self.out, "void test({}) {{", params);
        if self.options.std == Dialect::Sycl {
            self.emit_offload_body();
        } else {
            emit_block(&program.test, &mut self.out, INDENT);
        }
        self.out.push_str("}\n\n");
        tracing::debug!(
            params = self.plan.passed_vars.len() + self.plan.passed_arrays.len(),
            functions = program.functions.len(),
            "rendered test"
        );
    }

    /// Offload wrapper: one host buffer per kept ordinary scalar, read
    /// accessors for inputs, write accessors for outputs, and the body as a
    /// single kernel task.
    fn emit_offload_body(&mut self) {
        let program = self.program;
        let names = self.dialect.scalar_names();
        let mut offset = INDENT.repeat(2);
        let ordinary = |vars: &'a [ScalarVar]| -> Vec<&'a ScalarVar> {
            vars.iter()
                .filter(|v| v.kind == Kind::Ordinary && self.keeps(v.dead))
                .collect()
        };
        let inputs = ordinary(&program.inputs.vars);
        let outputs = ordinary(&program.outputs.vars);

        let _ = writeln!(self.out, "{}{{", INDENT);
        let _ = writeln!(self.out, "{}queue app_q;", offset);
        for var in inputs.iter().chain(outputs.iter()) {
            let _ = writeln!(
                self.out,
                "{}buffer<{}, 1> {}_buf {{ &{}, range<1>(1) }};",
                offset,
                var.ty.cpp_name(),
                var.name,
                names.var_decl_name(var)
            );
        }
        let _ = writeln!(self.out, "{}app_q.submit([&](handler &cgh) {{", offset);
        offset.push_str(INDENT);
        for (vars, mode) in [(&inputs, "read"), (&outputs, "write")] {
            for var in vars {
                let _ = writeln!(
                    self.out,
                    "{}auto {} = {}_buf.get_access<access::mode::{}>(cgh);",
                    offset, var.name, var.name, mode
                );
            }
        }
        let _ = writeln!(
            self.out,
            "{}cgh.single_task<class test_kernel>([=]() {{",
            offset
        );
        emit_block(&program.test, &mut self.out, &format!("{}{}", offset, INDENT));
        let _ = writeln!(self.out, "{}}});", offset);
        offset.truncate(offset.len() - INDENT.len());
        let _ = writeln!(self.out, "{}}});", offset);
        let _ = writeln!(self.out, "{}}}", INDENT);
    }
}
