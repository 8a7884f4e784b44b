// program.rs — Abstract program model and the per-run emission context
//
// `emit` renders one abstract program into one C++ source artifact with a
// fixed section order: header comment, mixing function, declarations, init,
// checksum, test, Release, main. All mutable accumulation state of a run
// (member buffers, release registry, call plan, checksum accumulator, RNG)
// lives in `EmitCtx`, created fresh by every call, so independent runs never
// observe each other.
//
// Preconditions: the program passes `Program::validate`.
// Postconditions: returns the artifact text plus the oracle literal (for
//                 precompute) and the call plan summary.
// Failure modes: invalid program, unsupported alignment.
// Side effects: none (`emit_to_file` writes the artifact).

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::call_surface::CallPlan;
use crate::checksum::HashState;
use crate::classify::MemberBuffers;
use crate::dialect::DialectContext;
use crate::error::EmitError;
use crate::functions::ExternalFunction;
use crate::ir::{IntType, IrValue};
use crate::options::{AlignmentSize, CheckAlgo, Dialect, Options};
use crate::release::ReleaseRegistry;
use crate::stmt::Stmt;
use crate::symbol::{Kind, ScalarVar, SymbolTable};

/// Name of the always-live input scalar holding 0 that the `test` body uses
/// to hide constants from the compiler.
pub const ZERO_VAR: &str = "zero";

// ── Abstract program ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub inputs: SymbolTable,
    #[serde(default)]
    pub outputs: SymbolTable,
    #[serde(default)]
    pub test: Vec<Stmt>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<ExternalFunction>,
}

impl Program {
    /// Load a program from its JSON form.
    pub fn from_path(path: &Path) -> Result<Program, EmitError> {
        let text = std::fs::read_to_string(path).map_err(|source| EmitError::Input {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| EmitError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Append the `zero` input scalar unless a table already has it.
    pub fn with_zero_var(mut self) -> Self {
        if !self.inputs.contains(ZERO_VAR) && !self.outputs.contains(ZERO_VAR) {
            self.inputs
                .vars
                .push(ScalarVar::new(ZERO_VAR, IntType::Int, IrValue::from_u64(0)));
        }
        self
    }

    /// Check every invariant the emission passes rely on.
    pub fn validate(&self) -> Result<(), EmitError> {
        for (label, table) in [("input", &self.inputs), ("output", &self.outputs)] {
            if let Some(name) = table.duplicate_name() {
                return Err(EmitError::invalid(format!(
                    "duplicate symbol '{}' in {} table",
                    name, label
                )));
            }
            for var in &table.vars {
                for (what, value) in [("init", var.init), ("current", var.current)] {
                    if !value.fits(var.ty) {
                        return Err(EmitError::invalid(format!(
                            "{} value {} of '{}' does not fit {}",
                            what,
                            value.as_i128(),
                            var.name,
                            var.ty.cpp_name()
                        )));
                    }
                }
            }
            for array in &table.arrays {
                validate_array(array)?;
            }
        }
        let mut names = HashSet::new();
        let all_names = [&self.inputs, &self.outputs].into_iter().flat_map(|t| {
            t.vars
                .iter()
                .map(|v| v.name.as_str())
                .chain(t.arrays.iter().map(|a| a.name.as_str()))
        });
        for name in all_names {
            if !names.insert(name) {
                return Err(EmitError::invalid(format!(
                    "symbol '{}' is declared in both tables",
                    name
                )));
            }
        }
        let mut private_fields = HashSet::new();
        for var in self.inputs.vars.iter().chain(&self.outputs.vars) {
            if var.kind == Kind::ClassPrivateMember && !private_fields.insert(var.number_in_name()) {
                return Err(EmitError::invalid(format!(
                    "private member '{}' reuses field number {}",
                    var.name,
                    var.number_in_name()
                )));
            }
        }
        Ok(())
    }

    /// SHA-256 of the canonical JSON form, as lowercase hex.
    pub fn fingerprint(&self) -> Result<String, EmitError> {
        let canonical = serde_json::to_string(self).map_err(EmitError::Fingerprint)?;
        let digest = Sha256::digest(canonical.as_bytes());
        Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
    }
}

fn validate_array(array: &crate::symbol::Array) -> Result<(), EmitError> {
    let bad = |msg: String| Err(EmitError::invalid(format!("array '{}': {}", array.name, msg)));
    if array.dims.is_empty() || array.dims.contains(&0) {
        return bad(format!("dimensions {:?} must be non-empty and non-zero", array.dims));
    }
    if array.dims.iter().try_fold(1usize, |n, &d| n.checked_mul(d)).is_none() {
        return bad(format!("element count of {:?} overflows", array.dims));
    }
    let streams = [
        ("init", &array.init),
        ("current", &array.current),
    ];
    for (what, s) in streams {
        for value in std::iter::once(s.main).chain(s.alt) {
            if !value.fits(array.ty) {
                return bad(format!(
                    "{} value {} does not fit {}",
                    what,
                    value.as_i128(),
                    array.ty.cpp_name()
                ));
            }
        }
    }
    if let Some(axis) = array.mul_vals_axis {
        if axis >= array.rank() {
            return bad(format!("multi-value axis {} out of rank {}", axis, array.rank()));
        }
        if array.init.alt.is_none() || array.current.alt.is_none() {
            return bad("multi-value axis requires alternate streams".to_string());
        }
    }
    if let Some(fp) = &array.footprint {
        if fp.extents.len() != array.rank() || fp.steps.len() != array.rank() {
            return bad("footprint rank differs from array rank".to_string());
        }
        if fp.steps.contains(&0) {
            return bad("footprint steps must be non-zero".to_string());
        }
    }
    Ok(())
}

// ── Result ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct EmittedProgram {
    pub source: String,
    /// Literal embedded for the precompute algorithm.
    pub expected_seed: Option<u64>,
    /// Input symbols passed to `test` as arguments, in order.
    pub passed: Vec<String>,
}

// ── Public entry points ─────────────────────────────────────────────────────

pub fn emit(program: &Program, options: &Options) -> Result<EmittedProgram, EmitError> {
    program.validate()?;
    let fingerprint = program.fingerprint()?;
    let mut ctx = EmitCtx::new(program, options);
    ctx.emit_all(&fingerprint)?;
    Ok(ctx.build_result())
}

/// Emit and write the artifact to `path`.
pub fn emit_to_file(
    program: &Program,
    options: &Options,
    path: &Path,
) -> Result<EmittedProgram, EmitError> {
    let emitted = emit(program, options)?;
    std::fs::write(path, &emitted.source).map_err(|source| EmitError::Output {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), bytes = emitted.source.len(), "wrote test program");
    Ok(emitted)
}

// ── Internal context ────────────────────────────────────────────────────────

pub(crate) struct EmitCtx<'a> {
    pub(crate) program: &'a Program,
    pub(crate) options: &'a Options,
    pub(crate) dialect: DialectContext,
    pub(crate) buffers: MemberBuffers<'a>,
    pub(crate) releases: ReleaseRegistry<'a>,
    pub(crate) plan: CallPlan<'a>,
    pub(crate) hash: HashState,
    pub(crate) rng: StdRng,
    /// Alignment for arrays when one size is used for the whole run.
    pub(crate) align_size: AlignmentSize,
    pub(crate) out: String,
}

impl<'a> EmitCtx<'a> {
    pub(crate) fn new(program: &'a Program, options: &'a Options) -> Self {
        EmitCtx {
            program,
            options,
            dialect: DialectContext::new(options.std),
            buffers: MemberBuffers::new(),
            releases: ReleaseRegistry::new(),
            plan: CallPlan::default(),
            hash: HashState::new(),
            rng: StdRng::seed_from_u64(options.seed),
            align_size: options.align_size,
            out: String::with_capacity(16 * 1024),
        }
    }

    fn build_result(self) -> EmittedProgram {
        EmittedProgram {
            expected_seed: (self.options.check_algo == CheckAlgo::Precompute)
                .then_some(self.hash.value()),
            passed: self.plan.passed_names(),
            source: self.out,
        }
    }

    /// Whether a symbol with this dead flag is rendered anywhere.
    pub(crate) fn keeps(&self, dead: bool) -> bool {
        self.options.keeps(dead)
    }

    // ── Top-level emit ──────────────────────────────────────────────────

    fn emit_all(&mut self, fingerprint: &str) -> Result<(), EmitError> {
        // Parameter and alignment decisions come first: declarations need the
        // alignment, and the decision order fixes the RNG stream.
        self.plan_call_surface()?;

        self.emit_header(fingerprint);
        self.emit_check_func();
        self.emit_decl();
        self.emit_init();
        self.emit_check();
        self.emit_test();
        self.emit_release();
        self.emit_main();
        Ok(())
    }

    fn emit_header(&mut self, fingerprint: &str) {
        // The dump shows the alignment size actually used by this run.
        let effective = Options {
            align_size: self.align_size,
            ..self.options.clone()
        };
        self.out.push_str("/*\n");
        let _ = writeln!(self.out, "progemit {}", env!("CARGO_PKG_VERSION"));
        effective.dump(&mut self.out);
        let _ = writeln!(self.out, "program-fingerprint: {}", fingerprint);
        self.out.push_str("*/\n");
        self.out.push_str("#include <stdio.h>\n#include <algorithm>\n#include <memory>\n");
        if self.options.std == Dialect::Sycl {
            self.out.push_str("#include <CL/sycl.hpp>\nusing namespace cl::sycl;\n");
        }
        self.out.push('\n');
    }

    // ── main() ──────────────────────────────────────────────────────────

    fn emit_main(&mut self) {
        self.out.push_str("int main() {\n");
        self.out.push_str("    init();\n");
        let args = self.call_args();
        let _ = writeln!(self.out, "    test({});", args.join(", "));
        self.out.push_str("    checksum();\n");
        self.out.push_str("    Release();\n");
        self.out.push_str("    printf(\"%llu\\n\", seed);\n");
        match self.options.check_algo {
            CheckAlgo::Precompute => {
                let _ = writeln!(self.out, "    if (seed != {}ULL)", self.hash.value());
                self.out
                    .push_str("        printf(\"ERROR: hash mismatch\\n\");\n");
            }
            CheckAlgo::Asserts => {
                self.out.push_str("    if (value_mismatch)\n");
                self.out
                    .push_str("        printf(\"ERROR: value mismatch\\n\");\n");
            }
            CheckAlgo::Hash => {}
        }
        self.out.push_str("}\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{Array, PtrKind};

    fn small_program() -> Program {
        let mut p = Program::default();
        p.inputs
            .add_var(ScalarVar::new("var_1", IntType::Int, IrValue::from_u64(3)))
            .unwrap();
        p.outputs
            .add_var(
                ScalarVar::new("var_2", IntType::Int, IrValue::from_u64(0))
                    .with_current(IrValue::from_u64(5)),
            )
            .unwrap();
        p.test.push(Stmt::expr("var_2 = var_1 + 2"));
        p.with_zero_var()
    }

    #[test]
    fn section_order_is_fixed() {
        let emitted = emit(&small_program(), &Options::default()).unwrap();
        let src = &emitted.source;
        let positions: Vec<usize> = [
            "/*\nprogemit",
            "void hash(",
            "/* -- Variables -- */",
            "void init() {",
            "void checksum() {",
            "void test(",
            "void Release() {",
            "int main() {",
        ]
        .iter()
        .map(|marker| src.find(marker).unwrap_or_else(|| panic!("missing {marker}")))
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
    }

    #[test]
    fn main_calls_in_order_and_checks_literal() {
        let emitted = emit(&small_program(), &Options::default()).unwrap();
        let main = &emitted.source[emitted.source.find("int main()").unwrap()..];
        let init = main.find("init();").unwrap();
        let test = main.find("test(").unwrap();
        let check = main.find("checksum();").unwrap();
        let release = main.find("Release();").unwrap();
        assert!(init < test && test < check && check < release);
        let seed = emitted.expected_seed.unwrap();
        assert!(main.contains(&format!("if (seed != {}ULL)", seed)));
        assert!(main.contains("ERROR: hash mismatch"));
    }

    #[test]
    fn asserts_main_reports_value_mismatch() {
        let opts = Options {
            check_algo: CheckAlgo::Asserts,
            ..Options::default()
        };
        let emitted = emit(&small_program(), &opts).unwrap();
        assert!(emitted.expected_seed.is_none());
        assert!(emitted.source.contains("    if (value_mismatch)\n"));
        assert!(!emitted.source.contains("hash mismatch"));
    }

    #[test]
    fn zero_var_added_once() {
        let p = small_program().with_zero_var();
        assert_eq!(p.inputs.vars.iter().filter(|v| v.name == ZERO_VAR).count(), 1);
    }

    #[test]
    fn validate_rejects_out_of_range_literal() {
        let mut p = Program::default();
        p.outputs.vars.push(ScalarVar::new("var_1", IntType::Uchar, IrValue::from_u64(300)));
        let err = p.validate().unwrap_err();
        assert!(format!("{err}").contains("does not fit unsigned char"));
    }

    #[test]
    fn validate_rejects_bad_arrays() {
        let base = Array::new("arr_1", IntType::Int, vec![4, 4], IrValue::from_u64(0), IrValue::from_u64(1));

        let mut p = Program::default();
        p.outputs.arrays.push(Array {
            mul_vals_axis: Some(2),
            ..base.clone()
        });
        assert!(p.validate().is_err());

        let mut p = Program::default();
        p.outputs.arrays.push(base.clone().with_footprint(vec![4], vec![1]));
        assert!(p.validate().is_err());

        let mut p = Program::default();
        p.outputs.arrays.push(base.clone().with_footprint(vec![4, 4], vec![1, 0]));
        assert!(p.validate().is_err());

        let mut p = Program::default();
        p.outputs.arrays.push(Array {
            dims: vec![4, 0],
            ..base
        });
        assert!(p.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicates() {
        let mut p = Program::default();
        p.inputs.vars.push(ScalarVar::new("var_1", IntType::Int, IrValue::from_u64(0)));
        p.inputs.vars.push(
            ScalarVar::new("var_1", IntType::Int, IrValue::from_u64(0))
                .with_kind(Kind::Pointer(PtrKind::Raw)),
        );
        assert!(matches!(p.validate(), Err(EmitError::InvalidProgram { .. })));
    }

    #[test]
    fn validate_rejects_name_shared_across_tables() {
        let mut p = Program::default();
        p.inputs.vars.push(ScalarVar::new("var_1", IntType::Int, IrValue::from_u64(3)));
        p.outputs.vars.push(ScalarVar::new("var_1", IntType::Int, IrValue::from_u64(4)));
        let err = p.validate().unwrap_err();
        assert!(format!("{err}").contains("'var_1' is declared in both tables"));
        assert!(emit(&p, &Options::default()).is_err());

        let mut p = Program::default();
        p.inputs.vars.push(ScalarVar::new("sym_2", IntType::Int, IrValue::from_u64(0)));
        p.outputs.arrays.push(Array::new(
            "sym_2",
            IntType::Int,
            vec![2],
            IrValue::from_u64(0),
            IrValue::from_u64(1),
        ));
        assert!(matches!(p.validate(), Err(EmitError::InvalidProgram { .. })));
    }

    #[test]
    fn validate_rejects_overflowing_element_count() {
        let mut p = Program::default();
        p.outputs.arrays.push(Array::new(
            "arr_1",
            IntType::Int,
            vec![1 << 32, 1 << 32, 2],
            IrValue::from_u64(0),
            IrValue::from_u64(1),
        ));
        let opts = Options {
            check_algo: CheckAlgo::Asserts,
            ..Options::default()
        };
        let err = emit(&p, &opts).unwrap_err();
        assert!(format!("{err}").contains("overflows"));
    }

    #[test]
    fn validate_rejects_private_field_collision() {
        let mut p = Program::default();
        p.inputs.vars.push(
            ScalarVar::new("in_3", IntType::Int, IrValue::from_u64(0)).with_kind(Kind::ClassPrivateMember),
        );
        p.outputs.vars.push(
            ScalarVar::new("out_3", IntType::Int, IrValue::from_u64(0)).with_kind(Kind::ClassPrivateMember),
        );
        let err = p.validate().unwrap_err();
        assert!(format!("{err}").contains("reuses field number 3"));
    }

    #[test]
    fn fingerprint_is_stable_and_sensitive() {
        let a = small_program();
        let mut b = small_program();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_eq!(a.fingerprint().unwrap().len(), 64);
        b.test.push(Stmt::expr("var_2 += 1"));
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn unwritable_output_is_fatal() {
        let err = emit_to_file(
            &small_program(),
            &Options::default(),
            Path::new("/nonexistent/dir/driver.cpp"),
        )
        .unwrap_err();
        assert!(matches!(err, EmitError::Output { .. }));
    }
}
