// progemit — emission and checksum-oracle layer of a random test generator
//
// Library root. `program::emit` is the entry point; the remaining modules
// are the model types and the emission passes it drives.

pub mod call_surface;
pub mod checksum;
pub mod classify;
pub mod decl;
pub mod dialect;
pub mod error;
pub mod functions;
pub mod init;
pub mod ir;
pub mod options;
pub mod program;
pub mod release;
pub mod render;
pub mod stmt;
pub mod symbol;
