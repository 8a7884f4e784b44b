// ir.rs — Integral types and literal values of the abstract program
//
// The generator only deals in integral scalars. `IrValue` stores a value as
// sign + magnitude so that every type from `bool` to `unsigned long long` fits
// without loss, and knows how to render itself as a C++ literal and how the
// emitted program converts it to the `unsigned long long` fed to `hash`.
//
// Preconditions: none.
// Postconditions: `literal` output is a valid C++ expression of the value.
// Failure modes: none (range checks are reported by `fits`).
// Side effects: none.

use serde::{Deserialize, Serialize};

// ── Integral types ──────────────────────────────────────────────────────────

/// The integral types a symbol may carry (LP64 data model).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntType {
    Bool,
    Schar,
    Uchar,
    Short,
    Ushort,
    Int,
    Uint,
    Long,
    Ulong,
    Llong,
    Ullong,
}

impl IntType {
    pub fn cpp_name(self) -> &'static str {
        match self {
            IntType::Bool => "bool",
            IntType::Schar => "signed char",
            IntType::Uchar => "unsigned char",
            IntType::Short => "short",
            IntType::Ushort => "unsigned short",
            IntType::Int => "int",
            IntType::Uint => "unsigned int",
            IntType::Long => "long int",
            IntType::Ulong => "unsigned long int",
            IntType::Llong => "long long int",
            IntType::Ullong => "unsigned long long int",
        }
    }

    pub fn min(self) -> i128 {
        match self {
            IntType::Bool
            | IntType::Uchar
            | IntType::Ushort
            | IntType::Uint
            | IntType::Ulong
            | IntType::Ullong => 0,
            IntType::Schar => i128::from(i8::MIN),
            IntType::Short => i128::from(i16::MIN),
            IntType::Int => i128::from(i32::MIN),
            IntType::Long | IntType::Llong => i128::from(i64::MIN),
        }
    }

    pub fn max(self) -> i128 {
        match self {
            IntType::Bool => 1,
            IntType::Schar => i128::from(i8::MAX),
            IntType::Uchar => i128::from(u8::MAX),
            IntType::Short => i128::from(i16::MAX),
            IntType::Ushort => i128::from(u16::MAX),
            IntType::Int => i128::from(i32::MAX),
            IntType::Uint => i128::from(u32::MAX),
            IntType::Long | IntType::Llong => i128::from(i64::MAX),
            IntType::Ulong | IntType::Ullong => i128::from(u64::MAX),
        }
    }

    /// Literal suffix that gives an integer literal exactly this type.
    /// Types narrower than `int` have none; the literal is converted on use.
    fn literal_suffix(self) -> &'static str {
        match self {
            IntType::Uint => "U",
            IntType::Long => "L",
            IntType::Ulong => "UL",
            IntType::Llong => "LL",
            IntType::Ullong => "ULL",
            _ => "",
        }
    }
}

// ── Values ──────────────────────────────────────────────────────────────────

/// An integral value as sign + magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IrValue {
    #[serde(default)]
    pub negative: bool,
    pub value: u64,
}

impl IrValue {
    pub fn from_i64(v: i64) -> Self {
        IrValue {
            negative: v < 0,
            value: v.unsigned_abs(),
        }
    }

    pub fn from_u64(v: u64) -> Self {
        IrValue {
            negative: false,
            value: v,
        }
    }

    pub fn as_i128(self) -> i128 {
        let magnitude = i128::from(self.value);
        if self.negative {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Whether the value is representable in `ty`.
    pub fn fits(self, ty: IntType) -> bool {
        let v = self.as_i128();
        v >= ty.min() && v <= ty.max()
    }

    /// The value the emitted program passes to `hash`: the implicit C++
    /// conversion to `unsigned long long` (sign extension, then modulo 2^64).
    pub fn hash_input(self) -> u64 {
        if self.negative {
            self.value.wrapping_neg()
        } else {
            self.value
        }
    }

    /// Render as a C++ literal of type `ty`.
    pub fn literal(self, ty: IntType) -> String {
        if ty == IntType::Bool {
            return if self.value != 0 { "true" } else { "false" }.to_string();
        }
        let suffix = ty.literal_suffix();
        if !self.negative || self.value == 0 {
            return format!("{}{}", self.value, suffix);
        }
        // The magnitude of the most negative value does not fit the positive
        // literal of its own type.
        if self.as_i128() == ty.min() && matches!(ty, IntType::Int | IntType::Long | IntType::Llong)
        {
            return format!("(-{}{} - 1{})", self.value - 1, suffix, suffix);
        }
        format!("-{}{}", self.value, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_input_sign_extends_negatives() {
        assert_eq!(IrValue::from_i64(-1).hash_input(), u64::MAX);
        assert_eq!(IrValue::from_i64(-2).hash_input(), u64::MAX - 1);
        assert_eq!(IrValue::from_u64(5).hash_input(), 5);
    }

    #[test]
    fn negative_zero_is_zero() {
        let v = IrValue {
            negative: true,
            value: 0,
        };
        assert_eq!(v.hash_input(), 0);
        assert_eq!(v.literal(IntType::Int), "0");
    }

    #[test]
    fn literal_suffixes() {
        let five = IrValue::from_u64(5);
        assert_eq!(five.literal(IntType::Int), "5");
        assert_eq!(five.literal(IntType::Uint), "5U");
        assert_eq!(five.literal(IntType::Ullong), "5ULL");
        assert_eq!(IrValue::from_i64(-7).literal(IntType::Llong), "-7LL");
        assert_eq!(IrValue::from_u64(1).literal(IntType::Bool), "true");
        assert_eq!(IrValue::from_u64(0).literal(IntType::Bool), "false");
    }

    #[test]
    fn literal_most_negative() {
        assert_eq!(
            IrValue::from_i64(i64::from(i32::MIN)).literal(IntType::Int),
            "(-2147483647 - 1)"
        );
        assert_eq!(
            IrValue::from_i64(i64::MIN).literal(IntType::Llong),
            "(-9223372036854775807LL - 1LL)"
        );
        assert_eq!(IrValue::from_i64(-128).literal(IntType::Schar), "-128");
    }

    #[test]
    fn fits_ranges() {
        assert!(IrValue::from_u64(255).fits(IntType::Uchar));
        assert!(!IrValue::from_u64(256).fits(IntType::Uchar));
        assert!(!IrValue::from_i64(-1).fits(IntType::Uint));
        assert!(IrValue::from_i64(i64::MIN).fits(IntType::Long));
        assert!(!IrValue::from_u64(2).fits(IntType::Bool));
    }
}
