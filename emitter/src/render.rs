// render.rs — Shared rendering helpers for array loop nests
//
// Array initialization (in `init` and in the dynamic class constructor) and
// the runtime checksum all visit elements with the same row-major loop nest
// over `i_0 .. i_{rank-1}`. Keeping the nest in one place keeps the visiting
// order of the emitted code identical to the generation-time walk.
//
// Preconditions: `dims` is non-empty.
// Postconditions: the innermost statement is written at the returned indent.
// Failure modes: none.
// Side effects: none.

use std::fmt::Write as _;

use crate::options::{MAIN_VAL_IDX, VALS_NUMBER};
use crate::stmt::INDENT;
use crate::symbol::{Array, ValueStreams};

/// Write one `for` header per axis and return the indent of the innermost
/// statement together with the subscript suffix (`[i_0][i_1]`).
pub fn emit_loop_nest(out: &mut String, offset: &str, dims: &[usize]) -> (String, String) {
    let mut indent = offset.to_string();
    let mut subscripts = String::new();
    for (idx, dim) in dims.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}for (size_t i_{idx} = 0; i_{idx} < {dim}; ++i_{idx})",
            indent
        );
        let _ = write!(subscripts, "[i_{}]", idx);
        indent.push_str(INDENT);
    }
    (indent, subscripts)
}

/// Runtime condition selecting the main stream on the multi-value axis.
pub fn main_stream_cond(axis: usize) -> String {
    format!("(i_{} % {} == {})", axis, VALS_NUMBER, MAIN_VAL_IDX)
}

/// Right-hand side assigning an element from `streams`: a ternary between
/// the main and alternate streams when the array has a multi-value axis.
pub fn stream_value_expr(array: &Array, streams: &ValueStreams) -> String {
    let main = streams.pick(true).literal(array.ty);
    match array.mul_vals_axis {
        Some(axis) => format!(
            "{} ? {} : {}",
            main_stream_cond(axis),
            main,
            streams.pick(false).literal(array.ty)
        ),
        None => main,
    }
}

/// The whole initialization nest for one array, addressed by `target`.
pub fn emit_array_fill(out: &mut String, offset: &str, array: &Array, target: &str) {
    let (indent, subscripts) = emit_loop_nest(out, offset, &array.dims);
    let _ = writeln!(
        out,
        "{}{}{} = {};",
        indent,
        target,
        subscripts,
        stream_value_expr(array, &array.init)
    );
}
