//! Builtin type vocabulary.
//!
//! Builtin types resolve without an import and live in the empty namespace. `List` and `Option` are generic and take
//! one type argument each; every other builtin is a scalar.
//!
//! ## Examples
//! ```rust
//! use mapforge_core::lang::types::{self, BuiltinTypeId};
//!
//! assert_eq!(types::from_str("str"), Some(BuiltinTypeId::Str));
//! assert_eq!(types::from_str("string"), Some(BuiltinTypeId::Str));
//! assert_eq!(types::type_param_count(BuiltinTypeId::List), 1);
//! ```

use super::registry::{self, Example, LangItemInfo, Since, Stability};

/// Stable identifier for a builtin type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTypeId {
    Str,
    Int,
    Float,
    Bool,
    Any,
    List,
    Option,
}

/// Metadata for a builtin type.
pub type BuiltinTypeInfo = LangItemInfo<BuiltinTypeId>;

/// Registry of builtin types, in [`BuiltinTypeId`] declaration order.
pub const BUILTIN_TYPES: &[BuiltinTypeInfo] = &[
    info(BuiltinTypeId::Str, "str", &["string"], "Unicode text.", &[]),
    info(BuiltinTypeId::Int, "int", &["i64"], "64-bit signed integer.", &[]),
    info(BuiltinTypeId::Float, "float", &["f64"], "64-bit float.", &[]),
    info(BuiltinTypeId::Bool, "bool", &[], "Boolean.", &[]),
    info(
        BuiltinTypeId::Any,
        "any",
        &[],
        "Dynamically typed value; the fallback when inference has nothing better.",
        &[],
    ),
    info(
        BuiltinTypeId::List,
        "List",
        &["list"],
        "Ordered sequence.",
        &[Example {
            code: "tags: List[str]",
            note: None,
        }],
    ),
    info(
        BuiltinTypeId::Option,
        "Option",
        &[],
        "Optional value.",
        &[Example {
            code: "nickname: Option[str]",
            note: None,
        }],
    ),
];

/// Canonical spelling.
pub fn as_str(id: BuiltinTypeId) -> &'static str {
    info_for(id).canonical
}

/// Full metadata.
pub fn info_for(id: BuiltinTypeId) -> &'static BuiltinTypeInfo {
    &BUILTIN_TYPES[id as usize]
}

/// Lookup by spelling (canonical or alias).
pub fn from_str(s: &str) -> Option<BuiltinTypeId> {
    registry::lookup(BUILTIN_TYPES, s)
}

/// Number of type parameters a builtin type takes.
pub fn type_param_count(id: BuiltinTypeId) -> usize {
    match id {
        BuiltinTypeId::List | BuiltinTypeId::Option => 1,
        _ => 0,
    }
}

/// Return `true` for the numeric builtins.
pub fn is_numeric(id: BuiltinTypeId) -> bool {
    matches!(id, BuiltinTypeId::Int | BuiltinTypeId::Float)
}

const fn info(
    id: BuiltinTypeId,
    canonical: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
    examples: &'static [Example],
) -> BuiltinTypeInfo {
    LangItemInfo {
        id,
        canonical,
        aliases,
        description,
        since: Since(0, 1),
        stability: Stability::Stable,
        examples,
    }
}
