// options.rs — Run configuration
//
// Read-only settings for one emission run: target dialect, checksum algorithm,
// dead-data policy, parameter-passing policy, alignment policy and the seed of
// the per-run RNG. `dump` renders them into the header comment of the
// artifact so that a failing test program documents how it was produced.
//
// Preconditions: none.
// Postconditions: none.
// Failure modes: unknown checksum algorithm names, byte size of `max`.
// Side effects: none.

use std::fmt::Write as _;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EmitError;

/// Period of the multi-value axis: element `i` on that axis belongs to the
/// main stream iff `i % VALS_NUMBER == MAIN_VAL_IDX`.
pub const VALS_NUMBER: usize = 2;
pub const MAIN_VAL_IDX: usize = 0;

/// Target source flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    C,
    #[default]
    Cxx,
    Ispc,
    Sycl,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::C => "c",
            Dialect::Cxx => "cxx",
            Dialect::Ispc => "ispc",
            Dialect::Sycl => "sycl",
        }
    }

    /// Dialects whose host side is written as C++ proper.
    pub fn is_cxx(self) -> bool {
        matches!(self, Dialect::Cxx | Dialect::Sycl)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckAlgo {
    Asserts,
    Hash,
    #[default]
    Precompute,
}

impl CheckAlgo {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckAlgo::Asserts => "asserts",
            CheckAlgo::Hash => "hash",
            CheckAlgo::Precompute => "precompute",
        }
    }

    /// Whether `checksum` feeds values through the mixing function.
    pub fn hashes(self) -> bool {
        matches!(self, CheckAlgo::Hash | CheckAlgo::Precompute)
    }
}

impl FromStr for CheckAlgo {
    type Err = EmitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asserts" => Ok(CheckAlgo::Asserts),
            "hash" => Ok(CheckAlgo::Hash),
            "precompute" => Ok(CheckAlgo::Precompute),
            other => Err(EmitError::UnsupportedCheckAlgo(other.to_string())),
        }
    }
}

/// none / some (random per symbol) / all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OptionLevel {
    #[default]
    None,
    Some,
    All,
}

impl OptionLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            OptionLevel::None => "none",
            OptionLevel::Some => "some",
            OptionLevel::All => "all",
        }
    }
}

/// Array alignment in bytes; `Max` means "not chosen yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentSize {
    A16,
    A32,
    A64,
    #[default]
    Max,
}

impl AlignmentSize {
    pub const CONCRETE: [AlignmentSize; 3] =
        [AlignmentSize::A16, AlignmentSize::A32, AlignmentSize::A64];

    pub fn as_str(self) -> &'static str {
        match self {
            AlignmentSize::A16 => "a16",
            AlignmentSize::A32 => "a32",
            AlignmentSize::A64 => "a64",
            AlignmentSize::Max => "max",
        }
    }

    pub fn bytes(self) -> Result<u32, EmitError> {
        match self {
            AlignmentSize::A16 => Ok(16),
            AlignmentSize::A32 => Ok(32),
            AlignmentSize::A64 => Ok(64),
            AlignmentSize::Max => Err(EmitError::UnsupportedAlignment(self.as_str())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Options {
    pub std: Dialect,
    pub check_algo: CheckAlgo,
    pub allow_dead_data: bool,
    pub inp_as_args: OptionLevel,
    pub emit_align_attr: OptionLevel,
    pub align_size: AlignmentSize,
    pub unique_align_size: bool,
    pub seed: u64,
}

impl Options {
    /// Whether a symbol with the given dead flag is rendered at all.
    pub fn keeps(&self, dead: bool) -> bool {
        !dead || self.allow_dead_data
    }

    /// One `key: value` line per option.
    pub fn dump(&self, out: &mut String) {
        let _ = writeln!(out, "seed: {}", self.seed);
        let _ = writeln!(out, "std: {}", self.std.as_str());
        let _ = writeln!(out, "check-algo: {}", self.check_algo.as_str());
        let _ = writeln!(out, "allow-dead-data: {}", self.allow_dead_data);
        let _ = writeln!(out, "inp-as-args: {}", self.inp_as_args.as_str());
        let _ = writeln!(out, "emit-align-attr: {}", self.emit_align_attr.as_str());
        let _ = writeln!(out, "unique-align-size: {}", self.unique_align_size);
        let _ = writeln!(out, "align-size: {}", self.align_size.as_str());
    }
}
