// checksum.rs — Generation-time checksum replica and the runtime `checksum`
//
// The emitted `checksum` routine feeds every kept output scalar (table order)
// and every element of every kept output array (row-major) through `hash`.
// `HashState` replays the same mixing over the values those elements will
// hold after a correct run, so the two results agree bit for bit. For the
// asserts algorithm no hashing happens; each element is compared against the
// literals it may legitimately hold.
//
// Preconditions: declarations and init have been rendered (member buffers
//                are complete).
// Postconditions: `ctx.hash` holds the literal `main` compares against.
// Failure modes: none.
// Side effects: none.

use std::fmt::Write as _;

use crate::ir::IrValue;
use crate::options::{CheckAlgo, MAIN_VAL_IDX, VALS_NUMBER};
use crate::program::EmitCtx;
use crate::render::emit_loop_nest;
use crate::symbol::{Array, ArrayKind, Kind};

/// The mixing step; must match the `hash` function written into the artifact.
pub fn mix(seed: u64, v: u64) -> u64 {
    seed ^ v
        .wrapping_add(0x9e37_79b9)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HashState {
    seed: u64,
}

impl HashState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, value: IrValue) {
        self.seed = mix(self.seed, value.hash_input());
    }

    pub fn value(&self) -> u64 {
        self.seed
    }
}

// ── Array walk ──────────────────────────────────────────────────────────────

/// Row-major walk over an array yielding the value each element holds after
/// `test`. Each axis keeps its index and a "use initial" flag: the flag is
/// inherited from the enclosing axis and additionally set when the axis
/// index lies outside the written footprint.
pub struct ArrayWalk<'a> {
    array: &'a Array,
    idx: Vec<usize>,
    use_init: Vec<bool>,
    done: bool,
}

impl<'a> ArrayWalk<'a> {
    pub fn new(array: &'a Array) -> Self {
        let rank = array.rank();
        let mut walk = ArrayWalk {
            array,
            idx: vec![0; rank],
            use_init: vec![false; rank],
            done: rank == 0 || array.element_count() == 0,
        };
        walk.refresh_from(0);
        walk
    }

    fn axis_outside_footprint(&self, axis: usize) -> bool {
        match &self.array.footprint {
            Some(fp) => {
                let i = self.idx[axis];
                i >= fp.extents[axis] || i % fp.steps[axis] != 0
            }
            None => false,
        }
    }

    fn refresh_from(&mut self, axis: usize) {
        for a in axis..self.idx.len() {
            let inherited = a > 0 && self.use_init[a - 1];
            self.use_init[a] = inherited || self.axis_outside_footprint(a);
        }
    }

    fn current_value(&self) -> IrValue {
        let use_main = match self.array.mul_vals_axis {
            Some(axis) => self.idx[axis] % VALS_NUMBER == MAIN_VAL_IDX,
            None => true,
        };
        let innermost = self.use_init.last().copied().unwrap_or(false);
        let streams = if innermost {
            &self.array.init
        } else {
            &self.array.current
        };
        streams.pick(use_main)
    }

    fn advance(&mut self) {
        let mut axis = self.idx.len();
        while axis > 0 {
            axis -= 1;
            self.idx[axis] += 1;
            if self.idx[axis] < self.array.dims[axis] {
                self.refresh_from(axis);
                return;
            }
            self.idx[axis] = 0;
        }
        self.done = true;
    }
}

impl Iterator for ArrayWalk<'_> {
    type Item = IrValue;

    fn next(&mut self) -> Option<IrValue> {
        if self.done {
            return None;
        }
        let value = self.current_value();
        self.advance();
        Some(value)
    }
}

// ── Emission ────────────────────────────────────────────────────────────────

impl EmitCtx<'_> {
    /// The runtime mixing function and the oracle state it updates.
    pub(crate) fn emit_check_func(&mut self) {
        if self.options.check_algo == CheckAlgo::Asserts {
            let c = self.options.std == crate::options::Dialect::C;
            let _ = writeln!(
                self.out,
                "static {} value_mismatch = {};",
                if c { "_Bool" } else { "bool" },
                if c { "0" } else { "false" }
            );
        }
        self.out.push_str("unsigned long long int seed = 0;\n");
        self.out.push_str(
            "void hash(unsigned long long int *seed, unsigned long long int const v) {\n",
        );
        self.out
            .push_str("    *seed ^= v + 0x9e3779b9 + ((*seed)<<6) + ((*seed)>>2);\n");
        self.out.push_str("}\n\n");
    }

    pub(crate) fn emit_check(&mut self) {
        let names = self.dialect.scalar_names();
        let algo = self.options.check_algo;
        let program = self.program;
        self.out.push_str("void checksum() {\n");

        let mut hashed = 0usize;
        for var in &program.outputs.vars {
            if !self.keeps(var.dead) || var.kind == Kind::DynamicClassMember {
                continue;
            }
            let access = names.var_access(var);
            match algo {
                CheckAlgo::Hash | CheckAlgo::Precompute => {
                    let _ = writeln!(self.out, "    hash(&seed, {});", access);
                    self.hash.feed(var.current);
                }
                CheckAlgo::Asserts => {
                    let _ = writeln!(
                        self.out,
                        "    value_mismatch |= {} != {};",
                        access,
                        var.current.literal(var.ty)
                    );
                }
            }
            hashed += 1;
        }

        for array in &program.outputs.arrays {
            if !self.keeps(array.dead) || array.kind == ArrayKind::DynamicClassMember {
                continue;
            }
            let (indent, subscripts) = emit_loop_nest(&mut self.out, "    ", &array.dims);
            let element = format!("{}{}", names.array_access(array), subscripts);
            match algo {
                CheckAlgo::Hash | CheckAlgo::Precompute => {
                    let _ = writeln!(self.out, "{}hash(&seed, {});", indent, element);
                    for value in ArrayWalk::new(array) {
                        self.hash.feed(value);
                    }
                }
                CheckAlgo::Asserts => {
                    let cmp: Vec<String> = allowed_values(array)
                        .iter()
                        .map(|lit| format!("{} != {}", element, lit))
                        .collect();
                    let _ = writeln!(
                        self.out,
                        "{}value_mismatch |= {};",
                        indent,
                        cmp.join(" && ")
                    );
                }
            }
            hashed = hashed.saturating_add(array.element_count());
        }

        self.out.push_str("}\n\n");
        tracing::debug!(
            algo = algo.as_str(),
            values = hashed,
            seed = self.hash.value(),
            "rendered checksum"
        );
    }
}

/// Literals an element may hold after `test`: current, then initial, then
/// the alternate streams; duplicates dropped.
fn allowed_values(array: &Array) -> Vec<String> {
    let mut values = vec![array.current.main, array.init.main];
    if array.mul_vals_axis.is_some() {
        values.extend(array.current.alt);
        values.extend(array.init.alt);
    }
    let mut literals: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let lit = value.literal(array.ty);
        if !literals.contains(&lit) {
            literals.push(lit);
        }
    }
    literals
}
