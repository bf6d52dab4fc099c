//! Opcode identifiers.
//!
//! An opcode is a plain integer key into the operator table (spec §4.3:
//! "a dense map from opcode -> ..."), not a closed Rust enum, because
//! dialect variants (§9) must be able to re-register a *different*
//! check/eval pair under the *same* numeric opcode after construction.
//! The predefined opcodes below are just well-known constants over that
//! integer space.

/// An operator identifier. Newtype over `u32` so the stack's public API
/// can't be confused with a plain argument count or index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Opcode(pub u32);

impl Opcode {
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match PREDEFINED_NAMES.iter().find(|(op, _)| *op == *self) {
            Some((_, name)) => write!(f, "{}", name),
            None => write!(f, "opcode#{}", self.0),
        }
    }
}

macro_rules! opcodes {
    ( $( $name:ident = $num:expr ),+ $(,)? ) => {
        impl Opcode {
            $( pub const $name: Opcode = Opcode($num); )+
        }

        const PREDEFINED_NAMES: &[(Opcode, &str)] = &[
            $( (Opcode::$name, stringify!($name)) ),+
        ];

        /// Number of predefined opcodes; `new(capacity)` must be called
        /// with a capacity at least this large.
        pub const PREDEFINED_COUNT: usize = opcodes!(@count $($name),+);
    };

    (@count $($name:ident),+) => {
        <[()]>::len(&[ $( opcodes!(@unit $name) ),+ ])
    };

    (@unit $name:ident) => { () };
}

opcodes! {
    NO_OP = 0,

    // Definitions
    DEFINE_TYPE = 1,
    DEFINE_TERM = 2,

    // Scoped binding
    BIND = 3,
    LET = 4,
    DECLARE_VAR = 5,
    DECLARE_TYPE_VAR = 6,

    // Type constructors
    MK_BV_TYPE = 7,
    MK_SCALAR_TYPE = 8,
    MK_TUPLE_TYPE = 9,
    MK_FUN_TYPE = 10,
    MK_APP_TYPE = 11,

    // Propositional
    MK_NOT = 12,
    MK_OR = 13,
    MK_AND = 14,
    MK_XOR = 15,
    MK_IFF = 16,
    MK_IMPLIES = 17,
    MK_ITE = 18,
    MK_EQ = 19,
    MK_DISEQ = 20,
    MK_DISTINCT = 21,

    // Polymorphic term
    MK_APPLY = 22,
    MK_TUPLE = 23,
    MK_SELECT = 24,
    MK_TUPLE_UPDATE = 25,
    MK_UPDATE = 26,
    MK_FORALL = 27,
    MK_EXISTS = 28,
    MK_LAMBDA = 29,

    // Arithmetic
    MK_ADD = 30,
    MK_SUB = 31,
    MK_NEG = 32,
    MK_MUL = 33,
    MK_DIVISION = 34,
    MK_POW = 35,
    MK_GE = 36,
    MK_GT = 37,
    MK_LE = 38,
    MK_LT = 39,

    // BV arithmetic
    MK_BV_CONST = 40,
    MK_BV_ADD = 41,
    MK_BV_SUB = 42,
    MK_BV_MUL = 43,
    MK_BV_NEG = 44,
    MK_BV_POW = 45,
    MK_BV_DIV = 46,
    MK_BV_REM = 47,
    MK_BV_SDIV = 48,
    MK_BV_SREM = 49,
    MK_BV_SMOD = 50,

    // BV logic
    MK_BV_NOT = 51,
    MK_BV_AND = 52,
    MK_BV_OR = 53,
    MK_BV_XOR = 54,
    MK_BV_NAND = 55,
    MK_BV_NOR = 56,
    MK_BV_XNOR = 57,
    MK_BV_SHIFT_LEFT0 = 58,
    MK_BV_SHIFT_LEFT1 = 59,
    MK_BV_SHIFT_RIGHT0 = 60,
    MK_BV_SHIFT_RIGHT1 = 61,
    MK_BV_ASHIFT_RIGHT = 62,
    MK_BV_ROTATE_LEFT = 63,
    MK_BV_ROTATE_RIGHT = 64,
    MK_BV_SHL = 65,
    MK_BV_LSHR = 66,
    MK_BV_ASHR = 67,
    MK_BV_EXTRACT = 68,
    MK_BV_CONCAT = 69,
    MK_BV_REPEAT = 70,
    MK_BV_SIGN_EXTEND = 71,
    MK_BV_ZERO_EXTEND = 72,
    MK_BV_REDAND = 73,
    MK_BV_REDOR = 74,
    MK_BV_COMP = 75,

    // BV atoms
    MK_BV_GE = 76,
    MK_BV_GT = 77,
    MK_BV_LE = 78,
    MK_BV_LT = 79,
    MK_BV_SGE = 80,
    MK_BV_SGT = 81,
    MK_BV_SLE = 82,
    MK_BV_SLT = 83,

    // Extract
    BUILD_TERM = 84,
    BUILD_TYPE = 85,
}

/// Recommended minimum table capacity: room for every predefined opcode
/// plus headroom for a dialect to register new ones.
pub const DEFAULT_CAPACITY: usize = 128;

/// Opcodes for which the associative-fold optimization (spec §4.4/§4.5)
/// applies. `MK_BV_SUB` is deliberately excluded: it is non-associative
/// (left-fold, n >= 2).
pub const ASSOCIATIVE_OPCODES: &[Opcode] = &[
    Opcode::MK_OR,
    Opcode::MK_AND,
    Opcode::MK_XOR,
    Opcode::MK_BV_ADD,
    Opcode::MK_BV_MUL,
    Opcode::MK_BV_AND,
    Opcode::MK_BV_OR,
    Opcode::MK_BV_XOR,
    Opcode::MK_BV_NAND,
    Opcode::MK_BV_NOR,
    Opcode::MK_BV_XNOR,
    Opcode::MK_BV_CONCAT,
];

pub fn is_associative(op: Opcode) -> bool {
    ASSOCIATIVE_OPCODES.contains(&op)
}
