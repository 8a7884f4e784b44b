// functions.rs — Externally authored helper functions
//
// A side channel lets an outside tool hand over complete function
// definitions that the `test` body may call. They are rendered ahead of
// `test`. Loading is best-effort: a missing or malformed file means
// "no functions" and never stops the run.
//
// Preconditions: none.
// Postconditions: `load_functions` always returns (possibly empty).
// Failure modes: none surfaced; problems are logged at warn level.
// Side effects: reads the given file.

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalFunction {
    pub name: String,
    pub return_type: String,
    #[serde(default)]
    pub parameter_types: Vec<String>,
    /// Statements between the braces, verbatim.
    pub body: String,
    /// Lines placed before the definition (includes, helper macros).
    #[serde(default)]
    pub misc: Vec<String>,
}

impl ExternalFunction {
    pub fn emit(&self, out: &mut String) {
        for line in &self.misc {
            let _ = writeln!(out, "{}", line);
        }
        let params: Vec<String> = self
            .parameter_types
            .iter()
            .enumerate()
            .map(|(i, ty)| format!("{} a{}", ty, i))
            .collect();
        let _ = writeln!(
            out,
            "{} {}({}) {{",
            self.return_type,
            self.name,
            params.join(", ")
        );
        for line in self.body.lines() {
            let _ = writeln!(out, "    {}", line.trim_end());
        }
        out.push_str("}\n\n");
    }
}

/// Read a JSON array of functions. Any failure yields an empty list.
pub fn load_functions(path: &Path) -> Vec<ExternalFunction> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(path = %path.display(), "external functions unavailable: {e}");
            return Vec::new();
        }
    };
    match serde_json::from_str::<Vec<ExternalFunction>>(&text) {
        Ok(functions) => {
            tracing::debug!(count = functions.len(), "loaded external functions");
            functions
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring malformed external functions: {e}");
            Vec::new()
        }
    }
}
