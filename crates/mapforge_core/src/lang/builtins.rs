//! Builtin method vocabulary.
//!
//! Factory bodies may only call methods the translatable expression tree knows how to represent. This registry is
//! that closed set: the analyzer rejects any other call, the runtime evaluator implements exactly these, and the
//! typing pass reads the return kinds from here.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive**; aliases exist for habits carried over from other languages.
//! - [`BUILTIN_METHODS`] is ordered like [`BuiltinMethodId`].
//!
//! ## Examples
//! ```rust
//! use mapforge_core::lang::builtins::{self, BuiltinMethodId};
//!
//! assert_eq!(builtins::from_str("upper"), Some(BuiltinMethodId::Upper));
//! assert_eq!(builtins::from_str("startswith"), Some(BuiltinMethodId::StartsWith));
//! assert_eq!(builtins::info_for(BuiltinMethodId::Replace).arity, 2);
//! ```

use super::registry::{Since, Stability};

/// Stable identifier for a builtin method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinMethodId {
    Upper,
    Lower,
    Trim,
    Len,
    Contains,
    StartsWith,
    EndsWith,
    Replace,
    ToStr,
    Abs,
}

impl BuiltinMethodId {
    /// The variant's own name, for code that spells `BuiltinMethodId::<Variant>` paths.
    pub fn variant_name(self) -> &'static str {
        match self {
            BuiltinMethodId::Upper => "Upper",
            BuiltinMethodId::Lower => "Lower",
            BuiltinMethodId::Trim => "Trim",
            BuiltinMethodId::Len => "Len",
            BuiltinMethodId::Contains => "Contains",
            BuiltinMethodId::StartsWith => "StartsWith",
            BuiltinMethodId::EndsWith => "EndsWith",
            BuiltinMethodId::Replace => "Replace",
            BuiltinMethodId::ToStr => "ToStr",
            BuiltinMethodId::Abs => "Abs",
        }
    }
}

/// Which receiver values a builtin method accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodReceiver {
    Str,
    Number,
    Any,
}

/// Result type of a builtin method, used by the typing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodReturn {
    Str,
    Int,
    Bool,
    /// Same type as the receiver (`abs`).
    Receiver,
}

/// Metadata for a builtin method.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinMethodInfo {
    pub id: BuiltinMethodId,
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    /// Number of arguments, excluding the receiver.
    pub arity: usize,
    pub receiver: MethodReceiver,
    pub returns: MethodReturn,
    pub since: Since,
    pub stability: Stability,
}

/// Registry of all builtin methods, in [`BuiltinMethodId`] declaration order.
pub const BUILTIN_METHODS: &[BuiltinMethodInfo] = &[
    info(
        BuiltinMethodId::Upper,
        "upper",
        &["to_upper"],
        "Uppercase a string.",
        0,
        MethodReceiver::Str,
        MethodReturn::Str,
    ),
    info(
        BuiltinMethodId::Lower,
        "lower",
        &["to_lower"],
        "Lowercase a string.",
        0,
        MethodReceiver::Str,
        MethodReturn::Str,
    ),
    info(
        BuiltinMethodId::Trim,
        "trim",
        &["strip"],
        "Strip leading and trailing whitespace.",
        0,
        MethodReceiver::Str,
        MethodReturn::Str,
    ),
    info(
        BuiltinMethodId::Len,
        "len",
        &[],
        "Length of a string in Unicode scalar values.",
        0,
        MethodReceiver::Str,
        MethodReturn::Int,
    ),
    info(
        BuiltinMethodId::Contains,
        "contains",
        &[],
        "Substring test.",
        1,
        MethodReceiver::Str,
        MethodReturn::Bool,
    ),
    info(
        BuiltinMethodId::StartsWith,
        "starts_with",
        &["startswith"],
        "Prefix test.",
        1,
        MethodReceiver::Str,
        MethodReturn::Bool,
    ),
    info(
        BuiltinMethodId::EndsWith,
        "ends_with",
        &["endswith"],
        "Suffix test.",
        1,
        MethodReceiver::Str,
        MethodReturn::Bool,
    ),
    info(
        BuiltinMethodId::Replace,
        "replace",
        &[],
        "Replace every occurrence of the first argument with the second.",
        2,
        MethodReceiver::Str,
        MethodReturn::Str,
    ),
    info(
        BuiltinMethodId::ToStr,
        "to_str",
        &["str", "to_string"],
        "Render any value as a string.",
        0,
        MethodReceiver::Any,
        MethodReturn::Str,
    ),
    info(
        BuiltinMethodId::Abs,
        "abs",
        &[],
        "Absolute value of a number.",
        0,
        MethodReceiver::Number,
        MethodReturn::Receiver,
    ),
];

/// Canonical spelling.
pub fn as_str(id: BuiltinMethodId) -> &'static str {
    info_for(id).canonical
}

/// Full metadata.
pub fn info_for(id: BuiltinMethodId) -> &'static BuiltinMethodInfo {
    &BUILTIN_METHODS[id as usize]
}

/// Lookup by spelling (canonical or alias).
pub fn from_str(s: &str) -> Option<BuiltinMethodId> {
    if let Some(m) = BUILTIN_METHODS.iter().find(|m| m.canonical == s) {
        return Some(m.id);
    }
    BUILTIN_METHODS
        .iter()
        .find(|m| {
            let aliases: &[&str] = m.aliases;
            aliases.contains(&s)
        })
        .map(|m| m.id)
}

const fn info(
    id: BuiltinMethodId,
    canonical: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
    arity: usize,
    receiver: MethodReceiver,
    returns: MethodReturn,
) -> BuiltinMethodInfo {
    BuiltinMethodInfo {
        id,
        canonical,
        aliases,
        description,
        arity,
        receiver,
        returns,
        since: Since(0, 1),
        stability: Stability::Stable,
    }
}
