// stmt.rs — Statement tree of the `test` body
//
// The body of `test` is built by the external generation policy; the emitter
// only lays it out. Expressions are opaque text.
//
// Preconditions: none.
// Postconditions: every statement ends with a newline; nesting adds four
//                 spaces per level.
// Failure modes: none.
// Side effects: none.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

pub const INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Stmt {
    /// An expression statement; `;` is appended.
    Expr { text: String },
    /// A nested `{ ... }` block.
    Scope { body: Vec<Stmt> },
    /// A loop whose header (`for (...)`, `while (...)`) is given verbatim.
    Loop { header: String, body: Vec<Stmt> },
    IfElse {
        cond: String,
        then: Vec<Stmt>,
        #[serde(default, rename = "else", skip_serializing_if = "Option::is_none")]
        otherwise: Option<Vec<Stmt>>,
    },
}

impl Stmt {
    pub fn expr(text: impl Into<String>) -> Self {
        Stmt::Expr { text: text.into() }
    }

    pub fn emit(&self, out: &mut String, offset: &str) {
        match self {
            Stmt::Expr { text } => {
                let _ = writeln!(out, "{}{};", offset, text);
            }
            Stmt::Scope { body } => {
                let _ = writeln!(out, "{}{{", offset);
                emit_block(body, out, &format!("{}{}", offset, INDENT));
                let _ = writeln!(out, "{}}}", offset);
            }
            Stmt::Loop { header, body } => {
                let _ = writeln!(out, "{}{} {{", offset, header);
                emit_block(body, out, &format!("{}{}", offset, INDENT));
                let _ = writeln!(out, "{}}}", offset);
            }
            Stmt::IfElse {
                cond,
                then,
                otherwise,
            } => {
                let inner = format!("{}{}", offset, INDENT);
                let _ = writeln!(out, "{}if ({}) {{", offset, cond);
                emit_block(then, out, &inner);
                match otherwise {
                    Some(els) => {
                        let _ = writeln!(out, "{}}}", offset);
                        let _ = writeln!(out, "{}else {{", offset);
                        emit_block(els, out, &inner);
                        let _ = writeln!(out, "{}}}", offset);
                    }
                    None => {
                        let _ = writeln!(out, "{}}}", offset);
                    }
                }
            }
        }
    }
}

pub fn emit_block(stmts: &[Stmt], out: &mut String, offset: &str) {
    for stmt in stmts {
        stmt.emit(out, offset);
    }
}
