// symbol.rs — Scalars, arrays, ownership kinds and symbol tables
//
// Symbols arrive fully built from the external generation policy. Each one
// carries exactly one ownership `Kind`, fixed upstream; the emitter reads
// symbols and never mutates them.
//
// Preconditions: none (types only).
// Postconditions: `SymbolTable::add_*` keeps names unique within a table.
// Failure modes: duplicate names are rejected with `EmitError::InvalidProgram`.
// Side effects: none.

use serde::{Deserialize, Serialize};

use crate::error::EmitError;
use crate::ir::{IntType, IrValue};

// ── Ownership kinds ─────────────────────────────────────────────────────────

/// Allocation strategy of a pointer-kind scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PtrKind {
    Raw,
    Shared,
    Unique,
}

/// Where and how a scalar is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    #[default]
    Ordinary,
    Pointer(PtrKind),
    StructMember,
    ClassPublicMember,
    ClassPrivateMember,
    DynamicStructMember,
    DynamicClassMember,
}

/// Where an array is declared. Arrays are never pointers or private members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayKind {
    #[default]
    Ordinary,
    StructMember,
    ClassPublicMember,
    DynamicStructMember,
    DynamicClassMember,
}

/// One of the four generated composite types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Struct,
    DynamicStruct,
    Class,
    DynamicClass,
}

impl Aggregate {
    /// Trailing argument order of `test`.
    pub const ALL: [Aggregate; 4] = [
        Aggregate::Struct,
        Aggregate::DynamicStruct,
        Aggregate::Class,
        Aggregate::DynamicClass,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            Aggregate::Struct => "GlobalStruct",
            Aggregate::DynamicStruct => "DynamicStruct",
            Aggregate::Class => "GlobalClass",
            Aggregate::DynamicClass => "DynamicClass",
        }
    }

    pub fn instance(self) -> &'static str {
        match self {
            Aggregate::Struct => "struct_1",
            Aggregate::DynamicStruct => "struct_2",
            Aggregate::Class => "object_1",
            Aggregate::DynamicClass => "object_2",
        }
    }

    pub fn is_dynamic(self) -> bool {
        matches!(self, Aggregate::DynamicStruct | Aggregate::DynamicClass)
    }

    /// Member access operator through the singleton instance.
    pub fn accessor(self) -> &'static str {
        if self.is_dynamic() {
            "->"
        } else {
            "."
        }
    }

    /// Parameter declaration in the `test` signature. Static instances are
    /// taken by reference so that writes reach the globals `checksum` reads.
    pub fn param_decl(self) -> String {
        if self.is_dynamic() {
            format!("{}* {}", self.type_name(), self.instance())
        } else {
            format!("{}& {}", self.type_name(), self.instance())
        }
    }
}

impl Kind {
    /// The aggregate a member kind belongs to; `None` for standalone symbols.
    pub fn aggregate(self) -> Option<Aggregate> {
        match self {
            Kind::Ordinary | Kind::Pointer(_) => None,
            Kind::StructMember => Some(Aggregate::Struct),
            Kind::ClassPublicMember | Kind::ClassPrivateMember => Some(Aggregate::Class),
            Kind::DynamicStructMember => Some(Aggregate::DynamicStruct),
            Kind::DynamicClassMember => Some(Aggregate::DynamicClass),
        }
    }

    pub fn ptr_kind(self) -> Option<PtrKind> {
        match self {
            Kind::Pointer(p) => Some(p),
            _ => None,
        }
    }
}

impl ArrayKind {
    pub fn aggregate(self) -> Option<Aggregate> {
        match self {
            ArrayKind::Ordinary => None,
            ArrayKind::StructMember => Some(Aggregate::Struct),
            ArrayKind::ClassPublicMember => Some(Aggregate::Class),
            ArrayKind::DynamicStructMember => Some(Aggregate::DynamicStruct),
            ArrayKind::DynamicClassMember => Some(Aggregate::DynamicClass),
        }
    }
}

/// Declaration keyword or attribute chosen by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclModifier {
    Static,
    ThreadLocal,
    Alignas8,
    Alignas16,
    Const,
    Constexpr,
    Mutable,
}

impl DeclModifier {
    /// Prefix for a namespace-scope variable. `mutable` is member-only.
    pub fn standalone_prefix(self) -> &'static str {
        match self {
            DeclModifier::Static => "static ",
            DeclModifier::ThreadLocal => "thread_local ",
            DeclModifier::Alignas8 => "alignas(8) ",
            DeclModifier::Alignas16 => "alignas(16) ",
            DeclModifier::Const => "const ",
            DeclModifier::Constexpr => "constexpr ",
            DeclModifier::Mutable => "",
        }
    }

    /// Prefix for a data member. Storage and cv keywords do not apply there.
    pub fn member_prefix(self) -> &'static str {
        match self {
            DeclModifier::Alignas8 => "alignas(8) ",
            DeclModifier::Alignas16 => "alignas(16) ",
            DeclModifier::Mutable => "mutable ",
            _ => "",
        }
    }

    /// Prefix an `extern` redeclaration must repeat to match the definition.
    pub fn extern_prefix(self) -> &'static str {
        match self {
            DeclModifier::ThreadLocal => "thread_local ",
            DeclModifier::Const | DeclModifier::Constexpr => "const ",
            _ => "",
        }
    }
}

// ── Scalars ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarVar {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: IntType,
    pub init: IrValue,
    pub current: IrValue,
    #[serde(default)]
    pub dead: bool,
    #[serde(default)]
    pub kind: Kind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<DeclModifier>,
}

impl ScalarVar {
    /// A live ordinary scalar whose value is not changed by `test`.
    pub fn new(name: impl Into<String>, ty: IntType, value: IrValue) -> Self {
        ScalarVar {
            name: name.into(),
            ty,
            init: value,
            current: value,
            dead: false,
            kind: Kind::Ordinary,
            modifier: None,
        }
    }

    pub fn with_kind(mut self, kind: Kind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_current(mut self, current: IrValue) -> Self {
        self.current = current;
        self
    }

    pub fn with_modifier(mut self, modifier: DeclModifier) -> Self {
        self.modifier = Some(modifier);
        self
    }

    pub fn dead(mut self) -> Self {
        self.dead = true;
        self
    }

    /// Trailing digits of the name (`var_12` → `12`), used to derive the
    /// opaque private field name; names without digits are used whole.
    pub fn number_in_name(&self) -> &str {
        let digits = self
            .name
            .bytes()
            .rev()
            .take_while(u8::is_ascii_digit)
            .count();
        if digits == 0 {
            &self.name
        } else {
            &self.name[self.name.len() - digits..]
        }
    }
}

// ── Arrays ──────────────────────────────────────────────────────────────────

/// The pair of value streams an array alternates between along its
/// multi-value axis. Arrays without such an axis only use `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueStreams {
    pub main: IrValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<IrValue>,
}

impl ValueStreams {
    pub fn uniform(value: IrValue) -> Self {
        ValueStreams {
            main: value,
            alt: None,
        }
    }

    pub fn pick(&self, use_main: bool) -> IrValue {
        match self.alt {
            Some(alt) if !use_main => alt,
            _ => self.main,
        }
    }
}

/// The regular section of an array written by `test`: index `i` on axis `a`
/// holds the post-computation value iff `i < extents[a]` and
/// `i % steps[a] == 0` on every axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub extents: Vec<usize>,
    pub steps: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Array {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: IntType,
    pub dims: Vec<usize>,
    pub init: ValueStreams,
    pub current: ValueStreams,
    #[serde(default)]
    pub dead: bool,
    #[serde(default)]
    pub kind: ArrayKind,
    #[serde(default)]
    pub alignment: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mul_vals_axis: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footprint: Option<Footprint>,
}

impl Array {
    /// A live ordinary array filled with `init` and entirely rewritten to
    /// `current` by `test`.
    pub fn new(
        name: impl Into<String>,
        ty: IntType,
        dims: Vec<usize>,
        init: IrValue,
        current: IrValue,
    ) -> Self {
        Array {
            name: name.into(),
            ty,
            dims,
            init: ValueStreams::uniform(init),
            current: ValueStreams::uniform(current),
            dead: false,
            kind: ArrayKind::Ordinary,
            alignment: 0,
            mul_vals_axis: None,
            footprint: None,
        }
    }

    pub fn with_kind(mut self, kind: ArrayKind) -> Self {
        self.kind = kind;
        self
    }

    /// Designate `axis` as the multi-value axis with alternate streams.
    pub fn with_mul_vals(mut self, axis: usize, init_alt: IrValue, current_alt: IrValue) -> Self {
        self.mul_vals_axis = Some(axis);
        self.init.alt = Some(init_alt);
        self.current.alt = Some(current_alt);
        self
    }

    pub fn with_footprint(mut self, extents: Vec<usize>, steps: Vec<usize>) -> Self {
        self.footprint = Some(Footprint { extents, steps });
        self
    }

    pub fn with_alignment(mut self, alignment: u32) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn dead(mut self) -> Self {
        self.dead = true;
        self
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn element_count(&self) -> usize {
        self.dims.iter().product()
    }

    /// `[10][20]` declarator suffix.
    pub fn dims_suffix(&self) -> String {
        self.dims.iter().map(|d| format!("[{}]", d)).collect()
    }
}

// ── Symbol table ────────────────────────────────────────────────────────────

/// Ordered scalars and arrays; order is the emission and checksum order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    #[serde(default)]
    pub vars: Vec<ScalarVar>,
    #[serde(default)]
    pub arrays: Vec<Array>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.iter().any(|v| v.name == name) || self.arrays.iter().any(|a| a.name == name)
    }

    pub fn add_var(&mut self, var: ScalarVar) -> Result<(), EmitError> {
        if self.contains(&var.name) {
            return Err(EmitError::invalid(format!(
                "duplicate symbol '{}'",
                var.name
            )));
        }
        self.vars.push(var);
        Ok(())
    }

    pub fn add_array(&mut self, array: Array) -> Result<(), EmitError> {
        if self.contains(&array.name) {
            return Err(EmitError::invalid(format!(
                "duplicate symbol '{}'",
                array.name
            )));
        }
        self.arrays.push(array);
        Ok(())
    }

    /// First name that occurs twice, if any.
    pub fn duplicate_name(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        self.vars
            .iter()
            .map(|v| v.name.as_str())
            .chain(self.arrays.iter().map(|a| a.name.as_str()))
            .find(|name| !seen.insert(*name))
    }
}
