//! Operator vocabulary.
//!
//! This module defines the canonical operator set (symbol operators like `+` and word operators like `and`) along
//! with precedence, associativity and fixity.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive**.
//! - Word operators are lexed as keywords; their entries have [`OperatorInfo::is_keyword_spelling`] set.
//! - [`OPERATORS`] is ordered like [`OperatorId`].
//!
//! ## Examples
//! ```rust
//! use mapforge_core::lang::operators::{self, OperatorId};
//!
//! assert_eq!(operators::from_str("+"), Some(OperatorId::Plus));
//! assert_eq!(operators::info_for(OperatorId::Plus).precedence, 50);
//! ```

use super::registry::{Since, Stability};

/// How operators associate when chained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
    None,
}

/// Whether an operator is infix (binary) or prefix (unary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixity {
    Infix,
    Prefix,
}

/// Stable identifier for every operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorId {
    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Comparison
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Assignment
    Eq,

    // Word operators
    And,
    Or,
    Not,
}

/// Metadata for an operator.
///
/// ## Notes
/// - `precedence` is relative: higher binds tighter.
#[derive(Debug, Clone, Copy)]
pub struct OperatorInfo {
    pub id: OperatorId,
    pub spellings: &'static [&'static str],
    pub precedence: u8,
    pub associativity: Associativity,
    pub fixity: Fixity,
    pub is_keyword_spelling: bool,
    pub since: Since,
    pub stability: Stability,
}

/// Registry of all operators, in [`OperatorId`] declaration order.
pub const OPERATORS: &[OperatorInfo] = &[
    // Arithmetic
    op(OperatorId::Plus, &["+"], 50, Associativity::Left, Fixity::Infix, false),
    op(OperatorId::Minus, &["-"], 50, Associativity::Left, Fixity::Infix, false),
    op(OperatorId::Star, &["*"], 60, Associativity::Left, Fixity::Infix, false),
    op(OperatorId::Slash, &["/"], 60, Associativity::Left, Fixity::Infix, false),
    op(OperatorId::Percent, &["%"], 60, Associativity::Left, Fixity::Infix, false),
    // Comparison
    op(OperatorId::EqEq, &["=="], 40, Associativity::None, Fixity::Infix, false),
    op(OperatorId::NotEq, &["!="], 40, Associativity::None, Fixity::Infix, false),
    op(OperatorId::Lt, &["<"], 40, Associativity::None, Fixity::Infix, false),
    op(OperatorId::LtEq, &["<="], 40, Associativity::None, Fixity::Infix, false),
    op(OperatorId::Gt, &[">"], 40, Associativity::None, Fixity::Infix, false),
    op(OperatorId::GtEq, &[">="], 40, Associativity::None, Fixity::Infix, false),
    // Assignment
    op(OperatorId::Eq, &["="], 10, Associativity::Right, Fixity::Infix, false),
    // Word operators (keyword spellings)
    op(OperatorId::And, &["and"], 30, Associativity::Left, Fixity::Infix, true),
    op(OperatorId::Or, &["or"], 25, Associativity::Left, Fixity::Infix, true),
    op(OperatorId::Not, &["not"], 35, Associativity::Right, Fixity::Prefix, true),
];

/// Return the full metadata entry for an operator.
pub fn info_for(id: OperatorId) -> &'static OperatorInfo {
    &OPERATORS[id as usize]
}

/// Return the canonical (first) spelling of an operator.
pub fn as_str(id: OperatorId) -> &'static str {
    info_for(id).spellings.first().copied().unwrap_or("")
}

/// Resolve an operator spelling to its identifier.
pub fn from_str(spelling: &str) -> Option<OperatorId> {
    OPERATORS
        .iter()
        .find(|o| {
            let spellings: &[&str] = o.spellings;
            spellings.contains(&spelling)
        })
        .map(|o| o.id)
}

// --- helpers -----------------------------------------------------------------

const fn op(
    id: OperatorId,
    spellings: &'static [&'static str],
    precedence: u8,
    associativity: Associativity,
    fixity: Fixity,
    is_keyword_spelling: bool,
) -> OperatorInfo {
    OperatorInfo {
        id,
        spellings,
        precedence,
        associativity,
        fixity,
        is_keyword_spelling,
        since: Since(0, 1),
        stability: Stability::Stable,
    }
}
